// ==============================================================================
// Tree Transformer: Owned, Order-Preserving Rewrites
// ==============================================================================
//
// A `Transformer` consumes a tree and rebuilds it, giving implementors a hook
// at every statement and expression. Statements return a `Rewrite`, so a
// transform can drop a statement from its enclosing body; expressions are
// always replaced one-for-one.
//
// The `walk_*` functions rebuild a node from its transformed children. They
// visit child fields strictly in declaration order (see `ast.rs`), one `let`
// per field, so that transforms which allocate state on first visit (the
// canonicalizers) see nodes in a stable, documented order.

use super::ast::{
    Arg, Arguments, ClassDef, Comprehension, ExceptHandler, Expr, ExprKind, FunctionDef, Keyword,
    MatchCase, Module, Pattern, PatternKind, Stmt, StmtKind, TypeParam, WithItem,
};

/// The result of transforming a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite<T> {
    /// Keep this node (possibly rewritten) in place.
    Keep(T),
    /// Remove the node from its enclosing statement list.
    Removed,
}

pub trait Transformer {
    fn fold_stmt(&mut self, stmt: Stmt) -> Rewrite<Stmt> {
        walk_stmt(self, stmt)
    }

    fn fold_expr(&mut self, expr: Expr) -> Expr {
        walk_expr(self, expr)
    }
}

pub fn fold_module<T: Transformer + ?Sized>(t: &mut T, module: Module) -> Module {
    Module {
        body: fold_body(t, module.body),
    }
}

/// Transform each statement of a body in order, dropping removed ones.
pub fn fold_body<T: Transformer + ?Sized>(t: &mut T, body: Vec<Stmt>) -> Vec<Stmt> {
    body.into_iter()
        .filter_map(|stmt| match t.fold_stmt(stmt) {
            Rewrite::Keep(stmt) => Some(stmt),
            Rewrite::Removed => None,
        })
        .collect()
}

fn fold_boxed<T: Transformer + ?Sized>(t: &mut T, expr: Box<Expr>) -> Box<Expr> {
    Box::new(t.fold_expr(*expr))
}

fn fold_opt<T: Transformer + ?Sized>(t: &mut T, expr: Option<Expr>) -> Option<Expr> {
    expr.map(|e| t.fold_expr(e))
}

fn fold_opt_boxed<T: Transformer + ?Sized>(t: &mut T, expr: Option<Box<Expr>>) -> Option<Box<Expr>> {
    expr.map(|e| fold_boxed(t, e))
}

fn fold_exprs<T: Transformer + ?Sized>(t: &mut T, exprs: Vec<Expr>) -> Vec<Expr> {
    exprs.into_iter().map(|e| t.fold_expr(e)).collect()
}

// ==============================================================================
// Statements
// ==============================================================================

pub fn walk_stmt<T: Transformer + ?Sized>(t: &mut T, stmt: Stmt) -> Rewrite<Stmt> {
    let kind = match stmt.kind {
        StmtKind::FunctionDef(def) => StmtKind::FunctionDef(Box::new(walk_function_def(t, *def))),
        StmtKind::ClassDef(class) => {
            let ClassDef {
                name,
                bases,
                keywords,
                body,
                decorator_list,
                type_params,
            } = *class;
            let bases = fold_exprs(t, bases);
            let keywords = walk_keywords(t, keywords);
            let body = fold_body(t, body);
            let decorator_list = fold_exprs(t, decorator_list);
            let type_params = walk_type_params(t, type_params);
            StmtKind::ClassDef(Box::new(ClassDef {
                name,
                bases,
                keywords,
                body,
                decorator_list,
                type_params,
            }))
        }
        StmtKind::Return { value } => StmtKind::Return {
            value: fold_opt(t, value),
        },
        StmtKind::Delete { targets } => StmtKind::Delete {
            targets: fold_exprs(t, targets),
        },
        StmtKind::Assign { targets, value } => {
            let targets = fold_exprs(t, targets);
            let value = t.fold_expr(value);
            StmtKind::Assign { targets, value }
        }
        StmtKind::TypeAlias {
            name,
            type_params,
            value,
        } => {
            let name = t.fold_expr(name);
            let type_params = walk_type_params(t, type_params);
            let value = t.fold_expr(value);
            StmtKind::TypeAlias {
                name,
                type_params,
                value,
            }
        }
        StmtKind::AugAssign { target, op, value } => {
            let target = t.fold_expr(target);
            let value = t.fold_expr(value);
            StmtKind::AugAssign { target, op, value }
        }
        StmtKind::AnnAssign {
            target,
            annotation,
            value,
            simple,
        } => {
            let target = t.fold_expr(target);
            let annotation = t.fold_expr(annotation);
            let value = fold_opt(t, value);
            StmtKind::AnnAssign {
                target,
                annotation,
                value,
                simple,
            }
        }
        StmtKind::For {
            is_async,
            target,
            iter,
            body,
            orelse,
        } => {
            let target = t.fold_expr(target);
            let iter = t.fold_expr(iter);
            let body = fold_body(t, body);
            let orelse = fold_body(t, orelse);
            StmtKind::For {
                is_async,
                target,
                iter,
                body,
                orelse,
            }
        }
        StmtKind::While { test, body, orelse } => {
            let test = t.fold_expr(test);
            let body = fold_body(t, body);
            let orelse = fold_body(t, orelse);
            StmtKind::While { test, body, orelse }
        }
        StmtKind::If { test, body, orelse } => {
            let test = t.fold_expr(test);
            let body = fold_body(t, body);
            let orelse = fold_body(t, orelse);
            StmtKind::If { test, body, orelse }
        }
        StmtKind::With {
            is_async,
            items,
            body,
        } => {
            let items = items
                .into_iter()
                .map(|item| {
                    let context_expr = t.fold_expr(item.context_expr);
                    let optional_vars = fold_opt(t, item.optional_vars);
                    WithItem {
                        context_expr,
                        optional_vars,
                    }
                })
                .collect();
            let body = fold_body(t, body);
            StmtKind::With {
                is_async,
                items,
                body,
            }
        }
        StmtKind::Match { subject, cases } => {
            let subject = t.fold_expr(subject);
            let cases = cases
                .into_iter()
                .map(|case| {
                    let pattern = walk_pattern(t, case.pattern);
                    let guard = fold_opt(t, case.guard);
                    let body = fold_body(t, case.body);
                    MatchCase {
                        pattern,
                        guard,
                        body,
                    }
                })
                .collect();
            StmtKind::Match { subject, cases }
        }
        StmtKind::Raise { exc, cause } => {
            let exc = fold_opt(t, exc);
            let cause = fold_opt(t, cause);
            StmtKind::Raise { exc, cause }
        }
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
            is_star,
        } => {
            let body = fold_body(t, body);
            let handlers = handlers
                .into_iter()
                .map(|handler| {
                    let exc_type = fold_opt(t, handler.exc_type);
                    let body = fold_body(t, handler.body);
                    ExceptHandler {
                        exc_type,
                        name: handler.name,
                        body,
                        span: handler.span,
                    }
                })
                .collect();
            let orelse = fold_body(t, orelse);
            let finalbody = fold_body(t, finalbody);
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
                is_star,
            }
        }
        StmtKind::Assert { test, msg } => {
            let test = t.fold_expr(test);
            let msg = fold_opt(t, msg);
            StmtKind::Assert { test, msg }
        }
        StmtKind::Expr { value } => StmtKind::Expr {
            value: t.fold_expr(value),
        },
        kind @ (StmtKind::Import { .. }
        | StmtKind::ImportFrom { .. }
        | StmtKind::Global { .. }
        | StmtKind::Nonlocal { .. }
        | StmtKind::Pass
        | StmtKind::Break
        | StmtKind::Continue) => kind,
    };
    Rewrite::Keep(Stmt::new(kind, stmt.span))
}

/// Rebuild a function definition: parameters, body, decorators, the return
/// annotation, then type parameters.
pub fn walk_function_def<T: Transformer + ?Sized>(t: &mut T, def: FunctionDef) -> FunctionDef {
    let FunctionDef {
        is_async,
        name,
        args,
        body,
        decorator_list,
        returns,
        type_params,
    } = def;
    let args = walk_arguments(t, args);
    let body = fold_body(t, body);
    let decorator_list = fold_exprs(t, decorator_list);
    let returns = fold_opt(t, returns);
    let type_params = walk_type_params(t, type_params);
    FunctionDef {
        is_async,
        name,
        args,
        body,
        decorator_list,
        returns,
        type_params,
    }
}

fn walk_type_params<T: Transformer + ?Sized>(t: &mut T, params: Vec<TypeParam>) -> Vec<TypeParam> {
    params
        .into_iter()
        .map(|param| match param {
            TypeParam::TypeVar { name, bound } => TypeParam::TypeVar {
                name,
                bound: fold_opt(t, bound),
            },
            other => other,
        })
        .collect()
}

fn walk_patterns<T: Transformer + ?Sized>(t: &mut T, patterns: Vec<Pattern>) -> Vec<Pattern> {
    patterns.into_iter().map(|p| walk_pattern(t, p)).collect()
}

/// Rebuild a pattern. Only the expressions inside it (values, mapping keys,
/// class names) reach `fold_expr`; capture names are left as they are.
fn walk_pattern<T: Transformer + ?Sized>(t: &mut T, pattern: Pattern) -> Pattern {
    let kind = match pattern.kind {
        PatternKind::MatchValue { value } => PatternKind::MatchValue {
            value: t.fold_expr(value),
        },
        PatternKind::MatchSequence { patterns } => PatternKind::MatchSequence {
            patterns: walk_patterns(t, patterns),
        },
        PatternKind::MatchMapping {
            keys,
            patterns,
            rest,
        } => {
            let keys = fold_exprs(t, keys);
            let patterns = walk_patterns(t, patterns);
            PatternKind::MatchMapping {
                keys,
                patterns,
                rest,
            }
        }
        PatternKind::MatchClass {
            cls,
            patterns,
            kwd_attrs,
            kwd_patterns,
        } => {
            let cls = t.fold_expr(cls);
            let patterns = walk_patterns(t, patterns);
            let kwd_patterns = walk_patterns(t, kwd_patterns);
            PatternKind::MatchClass {
                cls,
                patterns,
                kwd_attrs,
                kwd_patterns,
            }
        }
        PatternKind::MatchAs { pattern, name } => PatternKind::MatchAs {
            pattern: pattern.map(|p| Box::new(walk_pattern(t, *p))),
            name,
        },
        PatternKind::MatchOr { patterns } => PatternKind::MatchOr {
            patterns: walk_patterns(t, patterns),
        },
        kind @ (PatternKind::MatchSingleton { .. } | PatternKind::MatchStar { .. }) => kind,
    };
    Pattern::new(kind, pattern.span)
}

pub fn walk_arguments<T: Transformer + ?Sized>(t: &mut T, args: Arguments) -> Arguments {
    let Arguments {
        posonlyargs,
        args,
        vararg,
        kwonlyargs,
        kw_defaults,
        kwarg,
        defaults,
    } = args;
    let posonlyargs = walk_args(t, posonlyargs);
    let args = walk_args(t, args);
    let vararg = vararg.map(|a| walk_arg(t, a));
    let kwonlyargs = walk_args(t, kwonlyargs);
    let kw_defaults = kw_defaults.into_iter().map(|d| fold_opt(t, d)).collect();
    let kwarg = kwarg.map(|a| walk_arg(t, a));
    let defaults = fold_exprs(t, defaults);
    Arguments {
        posonlyargs,
        args,
        vararg,
        kwonlyargs,
        kw_defaults,
        kwarg,
        defaults,
    }
}

fn walk_args<T: Transformer + ?Sized>(t: &mut T, args: Vec<Arg>) -> Vec<Arg> {
    args.into_iter().map(|a| walk_arg(t, a)).collect()
}

fn walk_arg<T: Transformer + ?Sized>(t: &mut T, arg: Arg) -> Arg {
    Arg {
        name: arg.name,
        annotation: fold_opt(t, arg.annotation),
        span: arg.span,
    }
}

fn walk_keywords<T: Transformer + ?Sized>(t: &mut T, keywords: Vec<Keyword>) -> Vec<Keyword> {
    keywords
        .into_iter()
        .map(|k| Keyword {
            arg: k.arg,
            value: t.fold_expr(k.value),
            span: k.span,
        })
        .collect()
}

fn walk_generators<T: Transformer + ?Sized>(
    t: &mut T,
    generators: Vec<Comprehension>,
) -> Vec<Comprehension> {
    generators
        .into_iter()
        .map(|g| {
            let target = t.fold_expr(g.target);
            let iter = t.fold_expr(g.iter);
            let ifs = fold_exprs(t, g.ifs);
            Comprehension {
                target,
                iter,
                ifs,
                is_async: g.is_async,
            }
        })
        .collect()
}

// ==============================================================================
// Expressions
// ==============================================================================

pub fn walk_expr<T: Transformer + ?Sized>(t: &mut T, expr: Expr) -> Expr {
    let kind = match expr.kind {
        ExprKind::BoolOp { op, values } => ExprKind::BoolOp {
            op,
            values: fold_exprs(t, values),
        },
        ExprKind::NamedExpr { target, value } => {
            let target = fold_boxed(t, target);
            let value = fold_boxed(t, value);
            ExprKind::NamedExpr { target, value }
        }
        ExprKind::BinOp { left, op, right } => {
            let left = fold_boxed(t, left);
            let right = fold_boxed(t, right);
            ExprKind::BinOp { left, op, right }
        }
        ExprKind::UnaryOp { op, operand } => ExprKind::UnaryOp {
            op,
            operand: fold_boxed(t, operand),
        },
        ExprKind::Lambda { args, body } => {
            let args = Box::new(walk_arguments(t, *args));
            let body = fold_boxed(t, body);
            ExprKind::Lambda { args, body }
        }
        ExprKind::IfExp { test, body, orelse } => {
            let test = fold_boxed(t, test);
            let body = fold_boxed(t, body);
            let orelse = fold_boxed(t, orelse);
            ExprKind::IfExp { test, body, orelse }
        }
        ExprKind::Dict { keys, values } => {
            let keys = keys.into_iter().map(|k| fold_opt(t, k)).collect();
            let values = fold_exprs(t, values);
            ExprKind::Dict { keys, values }
        }
        ExprKind::Set { elts } => ExprKind::Set {
            elts: fold_exprs(t, elts),
        },
        ExprKind::ListComp { elt, generators } => {
            let elt = fold_boxed(t, elt);
            let generators = walk_generators(t, generators);
            ExprKind::ListComp { elt, generators }
        }
        ExprKind::SetComp { elt, generators } => {
            let elt = fold_boxed(t, elt);
            let generators = walk_generators(t, generators);
            ExprKind::SetComp { elt, generators }
        }
        ExprKind::DictComp {
            key,
            value,
            generators,
        } => {
            let key = fold_boxed(t, key);
            let value = fold_boxed(t, value);
            let generators = walk_generators(t, generators);
            ExprKind::DictComp {
                key,
                value,
                generators,
            }
        }
        ExprKind::GeneratorExp { elt, generators } => {
            let elt = fold_boxed(t, elt);
            let generators = walk_generators(t, generators);
            ExprKind::GeneratorExp { elt, generators }
        }
        ExprKind::Await { value } => ExprKind::Await {
            value: fold_boxed(t, value),
        },
        ExprKind::Yield { value } => ExprKind::Yield {
            value: fold_opt_boxed(t, value),
        },
        ExprKind::YieldFrom { value } => ExprKind::YieldFrom {
            value: fold_boxed(t, value),
        },
        ExprKind::Compare {
            left,
            ops,
            comparators,
        } => {
            let left = fold_boxed(t, left);
            let comparators = fold_exprs(t, comparators);
            ExprKind::Compare {
                left,
                ops,
                comparators,
            }
        }
        ExprKind::Call {
            func,
            args,
            keywords,
        } => {
            let func = fold_boxed(t, func);
            let args = fold_exprs(t, args);
            let keywords = walk_keywords(t, keywords);
            ExprKind::Call {
                func,
                args,
                keywords,
            }
        }
        ExprKind::FormattedValue {
            value,
            conversion,
            format_spec,
        } => {
            let value = fold_boxed(t, value);
            let format_spec = fold_opt_boxed(t, format_spec);
            ExprKind::FormattedValue {
                value,
                conversion,
                format_spec,
            }
        }
        ExprKind::JoinedStr { values } => ExprKind::JoinedStr {
            values: fold_exprs(t, values),
        },
        ExprKind::Attribute { value, attr } => ExprKind::Attribute {
            value: fold_boxed(t, value),
            attr,
        },
        ExprKind::Subscript { value, slice } => {
            let value = fold_boxed(t, value);
            let slice = fold_boxed(t, slice);
            ExprKind::Subscript { value, slice }
        }
        ExprKind::Starred { value } => ExprKind::Starred {
            value: fold_boxed(t, value),
        },
        ExprKind::List { elts } => ExprKind::List {
            elts: fold_exprs(t, elts),
        },
        ExprKind::Tuple { elts } => ExprKind::Tuple {
            elts: fold_exprs(t, elts),
        },
        ExprKind::Slice { lower, upper, step } => {
            let lower = fold_opt_boxed(t, lower);
            let upper = fold_opt_boxed(t, upper);
            let step = fold_opt_boxed(t, step);
            ExprKind::Slice { lower, upper, step }
        }
        kind @ (ExprKind::Constant { .. } | ExprKind::Name { .. }) => kind,
    };
    Expr::new(kind, expr.span)
}
