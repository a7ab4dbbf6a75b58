// ==============================================================================
// Unparse: Syntax Tree to Canonical Source Text
// ==============================================================================
//
// Renders a module back to Python source in one fixed layout, so that two
// trees which differ only in formatting, comments or redundant parentheses
// produce identical text:
//
//   - statements are separated by `\n` with four-space indentation, and the
//     text has no trailing newline;
//   - every `def` and `class` gets a blank line before it unless it is the
//     very first thing written;
//   - parentheses are emitted only where operator precedence needs them;
//   - literals are written in their shortest conventional spelling
//     (`'text'`, `1.0`, `1e+16`, `b'\x00'`);
//   - a leading string statement of a module, class or function body is
//     written as a triple-quoted docstring;
//   - f-strings use only the quoting that older Python versions accept: an
//     outer quote that no replacement field contains, and no backslashes
//     inside replacement fields.
//
// Precedence is threaded top-down: each node is rendered with the precedence
// its parent requires, and wraps itself in parentheses when its own binding
// is weaker.

use std::fmt::Write as _;

use unicode_general_category::{GeneralCategory, get_general_category};

use super::ast::{
    Alias, Arg, Arguments, BoolOp, Comprehension, Constant, Expr, ExprKind, Keyword, Module,
    Operator, Pattern, PatternKind, Stmt, StmtKind, TypeParam, UnaryOp, WithItem,
    stood_in_surrogate,
};

const ALL_QUOTES: &[&str] = &["'", "\"", "\"\"\"", "'''"];
const MULTI_QUOTES: &[&str] = &["\"\"\"", "'''"];

/// An out-of-range float literal, which reads back as infinity.
const INFINITY_LITERAL: &str = "1e309";

/// Render a module to canonical source text.
pub fn unparse(module: &Module) -> String {
    let mut unparser = Unparser::default();
    unparser.body_with_docstring(&module.body);
    unparser.out
}

/// Render a single expression as it would appear at statement level.
pub fn unparse_expr(expr: &Expr) -> String {
    let mut unparser = Unparser::default();
    unparser.expr(expr, Precedence::Test);
    unparser.out
}

/// Binding strength, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    NamedExpr,
    Tuple,
    Yield,
    Test,
    Or,
    And,
    Not,
    Cmp,
    /// Also the level of `|`.
    Expr,
    BitXor,
    BitAnd,
    Shift,
    Arith,
    Term,
    Factor,
    Power,
    Await,
    Atom,
}

impl Precedence {
    fn next(self) -> Precedence {
        use Precedence::*;
        match self {
            NamedExpr => Tuple,
            Tuple => Yield,
            Yield => Test,
            Test => Or,
            Or => And,
            And => Not,
            Not => Cmp,
            Cmp => Expr,
            Expr => BitXor,
            BitXor => BitAnd,
            BitAnd => Shift,
            Shift => Arith,
            Arith => Term,
            Term => Factor,
            Factor => Power,
            Power => Await,
            Await | Atom => Atom,
        }
    }

    fn of_binary(op: Operator) -> Precedence {
        match op {
            Operator::BitOr => Precedence::Expr,
            Operator::BitXor => Precedence::BitXor,
            Operator::BitAnd => Precedence::BitAnd,
            Operator::LShift | Operator::RShift => Precedence::Shift,
            Operator::Add | Operator::Sub => Precedence::Arith,
            Operator::Mult
            | Operator::MatMult
            | Operator::Div
            | Operator::Mod
            | Operator::FloorDiv => Precedence::Term,
            Operator::Pow => Precedence::Power,
        }
    }
}

#[derive(Default)]
struct Unparser {
    out: String,
    indent: usize,
    /// Set inside f-string replacement fields, where string literals must be
    /// written without backslashes.
    avoid_backslashes: bool,
}

impl Unparser {
    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn maybe_newline(&mut self) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
    }

    /// Start a new line at the current indentation and write `text`.
    fn fill(&mut self, text: &str) {
        self.maybe_newline();
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
    }

    fn open_if(&mut self, condition: bool) {
        if condition {
            self.out.push('(');
        }
    }

    fn close_if(&mut self, condition: bool) {
        if condition {
            self.out.push(')');
        }
    }

    /// Write `items` separated by `", "`.
    fn interleave<T>(&mut self, items: &[T], mut each: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            each(self, item);
        }
    }

    /// Like `interleave`, but a single item gets a trailing comma.
    fn items_view(&mut self, items: &[Expr]) {
        if let [only] = items {
            self.expr(only, Precedence::Test);
            self.write(",");
        } else {
            self.interleave(items, |u, e| u.expr(e, Precedence::Test));
        }
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    fn stmts(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.stmt(stmt);
        }
    }

    fn block(&mut self, body: &[Stmt]) {
        self.write(":");
        self.indent += 1;
        self.stmts(body);
        self.indent -= 1;
    }

    fn block_with_docstring(&mut self, body: &[Stmt]) {
        self.write(":");
        self.indent += 1;
        self.body_with_docstring(body);
        self.indent -= 1;
    }

    fn body_with_docstring(&mut self, body: &[Stmt]) {
        match body.first().and_then(Stmt::docstring) {
            Some(doc) => {
                self.docstring(doc);
                self.stmts(&body[1..]);
            }
            None => self.stmts(body),
        }
    }

    fn docstring(&mut self, doc: &str) {
        self.fill("");
        self.str_avoiding_backslashes(doc, MULTI_QUOTES);
    }

    /// Write `string` in the first of `quote_types` that needs no escaped
    /// quotes, keeping newlines and tabs literal.
    fn str_avoiding_backslashes(&mut self, string: &str, quote_types: &[&'static str]) {
        let (text, quotes) = str_literal_helper(string, quote_types, false);
        let quote = quotes.first().copied().unwrap_or("'");
        self.write(quote);
        self.write(&text);
        self.write(quote);
    }

    fn type_params(&mut self, params: &[TypeParam]) {
        if params.is_empty() {
            return;
        }
        self.write("[");
        self.interleave(params, |u, param| match param {
            TypeParam::TypeVar { name, bound } => {
                u.write(name);
                if let Some(bound) = bound {
                    u.write(": ");
                    u.expr(bound, Precedence::Test);
                }
            }
            TypeParam::TypeVarTuple { name } => {
                u.write("*");
                u.write(name);
            }
            TypeParam::ParamSpec { name } => {
                u.write("**");
                u.write(name);
            }
        });
        self.write("]");
    }

    fn else_block(&mut self, orelse: &[Stmt]) {
        if !orelse.is_empty() {
            self.fill("else");
            self.block(orelse);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::FunctionDef(def) => {
                self.maybe_newline();
                for decorator in &def.decorator_list {
                    self.fill("@");
                    self.expr(decorator, Precedence::Test);
                }
                self.fill(if def.is_async { "async def " } else { "def " });
                self.write(&def.name);
                self.type_params(&def.type_params);
                self.write("(");
                self.arguments(&def.args);
                self.write(")");
                if let Some(returns) = &def.returns {
                    self.write(" -> ");
                    self.expr(returns, Precedence::Test);
                }
                self.block_with_docstring(&def.body);
            }
            StmtKind::ClassDef(class) => {
                self.maybe_newline();
                for decorator in &class.decorator_list {
                    self.fill("@");
                    self.expr(decorator, Precedence::Test);
                }
                self.fill("class ");
                self.write(&class.name);
                self.type_params(&class.type_params);
                let parens = !class.bases.is_empty() || !class.keywords.is_empty();
                self.open_if(parens);
                self.call_arguments(&class.bases, &class.keywords);
                self.close_if(parens);
                self.block_with_docstring(&class.body);
            }
            StmtKind::Return { value } => {
                self.fill("return");
                if let Some(value) = value {
                    self.write(" ");
                    self.expr(value, Precedence::Test);
                }
            }
            StmtKind::Delete { targets } => {
                self.fill("del ");
                self.interleave(targets, |u, t| u.expr(t, Precedence::Test));
            }
            StmtKind::Assign { targets, value } => {
                self.fill("");
                for target in targets {
                    self.expr(target, Precedence::Tuple);
                    self.write(" = ");
                }
                self.expr(value, Precedence::Test);
            }
            StmtKind::TypeAlias {
                name,
                type_params,
                value,
            } => {
                self.fill("type ");
                self.expr(name, Precedence::Test);
                self.type_params(type_params);
                self.write(" = ");
                self.expr(value, Precedence::Test);
            }
            StmtKind::AugAssign { target, op, value } => {
                self.fill("");
                self.expr(target, Precedence::Test);
                self.write(" ");
                self.write(op.as_str());
                self.write("= ");
                self.expr(value, Precedence::Test);
            }
            StmtKind::AnnAssign {
                target,
                annotation,
                value,
                simple,
            } => {
                self.fill("");
                let parens = !simple && matches!(target.kind, ExprKind::Name { .. });
                self.open_if(parens);
                self.expr(target, Precedence::Test);
                self.close_if(parens);
                self.write(": ");
                self.expr(annotation, Precedence::Test);
                if let Some(value) = value {
                    self.write(" = ");
                    self.expr(value, Precedence::Test);
                }
            }
            StmtKind::For {
                is_async,
                target,
                iter,
                body,
                orelse,
            } => {
                self.fill(if *is_async { "async for " } else { "for " });
                self.expr(target, Precedence::Tuple);
                self.write(" in ");
                self.expr(iter, Precedence::Test);
                self.block(body);
                self.else_block(orelse);
            }
            StmtKind::While { test, body, orelse } => {
                self.fill("while ");
                self.expr(test, Precedence::Test);
                self.block(body);
                self.else_block(orelse);
            }
            StmtKind::If { test, body, orelse } => {
                self.fill("if ");
                self.expr(test, Precedence::Test);
                self.block(body);
                // A lone nested `if` in the else branch is written as `elif`.
                let mut orelse: &[Stmt] = orelse;
                while let [
                    Stmt {
                        kind:
                            StmtKind::If {
                                test,
                                body,
                                orelse: rest,
                            },
                        ..
                    },
                ] = orelse
                {
                    self.fill("elif ");
                    self.expr(test, Precedence::Test);
                    self.block(body);
                    orelse = rest;
                }
                self.else_block(orelse);
            }
            StmtKind::With {
                is_async,
                items,
                body,
            } => {
                self.fill(if *is_async { "async with " } else { "with " });
                self.interleave(items, Self::with_item);
                self.block(body);
            }
            StmtKind::Match { subject, cases } => {
                self.fill("match ");
                self.expr(subject, Precedence::Test);
                self.write(":");
                self.indent += 1;
                for case in cases {
                    self.fill("case ");
                    self.pattern(&case.pattern, Precedence::Test);
                    if let Some(guard) = &case.guard {
                        self.write(" if ");
                        self.expr(guard, Precedence::Test);
                    }
                    self.block(&case.body);
                }
                self.indent -= 1;
            }
            StmtKind::Raise { exc, cause } => {
                self.fill("raise");
                if let Some(exc) = exc {
                    self.write(" ");
                    self.expr(exc, Precedence::Test);
                    if let Some(cause) = cause {
                        self.write(" from ");
                        self.expr(cause, Precedence::Test);
                    }
                }
            }
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
                is_star,
            } => {
                self.fill("try");
                self.block(body);
                for handler in handlers {
                    self.fill(if *is_star { "except*" } else { "except" });
                    if let Some(exc_type) = &handler.exc_type {
                        self.write(" ");
                        self.expr(exc_type, Precedence::Test);
                    }
                    if let Some(name) = &handler.name {
                        self.write(" as ");
                        self.write(name);
                    }
                    self.block(&handler.body);
                }
                self.else_block(orelse);
                if !finalbody.is_empty() {
                    self.fill("finally");
                    self.block(finalbody);
                }
            }
            StmtKind::Assert { test, msg } => {
                self.fill("assert ");
                self.expr(test, Precedence::Test);
                if let Some(msg) = msg {
                    self.write(", ");
                    self.expr(msg, Precedence::Test);
                }
            }
            StmtKind::Import { names } => {
                self.fill("import ");
                self.interleave(names, Self::alias);
            }
            StmtKind::ImportFrom {
                module,
                names,
                level,
            } => {
                self.fill("from ");
                self.write(&".".repeat(*level));
                if let Some(module) = module {
                    self.write(module);
                }
                self.write(" import ");
                self.interleave(names, Self::alias);
            }
            StmtKind::Global { names } => {
                self.fill("global ");
                self.write(&names.join(", "));
            }
            StmtKind::Nonlocal { names } => {
                self.fill("nonlocal ");
                self.write(&names.join(", "));
            }
            StmtKind::Expr { value } => {
                self.fill("");
                self.expr(value, Precedence::Yield);
            }
            StmtKind::Pass => self.fill("pass"),
            StmtKind::Break => self.fill("break"),
            StmtKind::Continue => self.fill("continue"),
        }
    }

    // ==========================================================================
    // Patterns
    // ==========================================================================

    fn pattern(&mut self, pattern: &Pattern, precedence: Precedence) {
        match &pattern.kind {
            PatternKind::MatchValue { value } => self.expr(value, Precedence::Test),
            PatternKind::MatchSingleton { value } => self.constant(value),
            PatternKind::MatchSequence { patterns } => {
                self.write("[");
                self.interleave(patterns, |u, p| u.pattern(p, Precedence::Test));
                self.write("]");
            }
            PatternKind::MatchMapping {
                keys,
                patterns,
                rest,
            } => {
                self.write("{");
                let entries: Vec<_> = keys.iter().zip(patterns).collect();
                self.interleave(&entries, |u, (key, pattern)| {
                    u.expr(key, Precedence::Test);
                    u.write(": ");
                    u.pattern(pattern, Precedence::Test);
                });
                if let Some(rest) = rest {
                    if !keys.is_empty() {
                        self.write(", ");
                    }
                    self.write("**");
                    self.write(rest);
                }
                self.write("}");
            }
            PatternKind::MatchClass {
                cls,
                patterns,
                kwd_attrs,
                kwd_patterns,
            } => {
                self.expr(cls, Precedence::Atom);
                self.write("(");
                self.interleave(patterns, |u, p| u.pattern(p, Precedence::Test));
                if !kwd_attrs.is_empty() {
                    if !patterns.is_empty() {
                        self.write(", ");
                    }
                    let entries: Vec<_> = kwd_attrs.iter().zip(kwd_patterns).collect();
                    self.interleave(&entries, |u, (attr, pattern)| {
                        u.write(attr);
                        u.write("=");
                        u.pattern(pattern, Precedence::Test);
                    });
                }
                self.write(")");
            }
            PatternKind::MatchStar { name } => {
                self.write("*");
                self.write(name.as_deref().unwrap_or("_"));
            }
            PatternKind::MatchAs { pattern, name } => match (pattern, name) {
                (_, None) => self.write("_"),
                (None, Some(name)) => self.write(name),
                (Some(inner), Some(name)) => {
                    let parens = precedence > Precedence::Test;
                    self.open_if(parens);
                    self.pattern(inner, Precedence::Expr);
                    self.write(" as ");
                    self.write(name);
                    self.close_if(parens);
                }
            },
            PatternKind::MatchOr { patterns } => {
                let parens = precedence > Precedence::Expr;
                self.open_if(parens);
                for (i, p) in patterns.iter().enumerate() {
                    if i > 0 {
                        self.write(" | ");
                    }
                    self.pattern(p, Precedence::Expr.next());
                }
                self.close_if(parens);
            }
        }
    }

    fn alias(&mut self, alias: &Alias) {
        self.write(&alias.name);
        if let Some(asname) = &alias.asname {
            self.write(" as ");
            self.write(asname);
        }
    }

    fn with_item(&mut self, item: &WithItem) {
        self.expr(&item.context_expr, Precedence::Test);
        if let Some(vars) = &item.optional_vars {
            self.write(" as ");
            self.expr(vars, Precedence::Test);
        }
    }

    fn arg(&mut self, arg: &Arg) {
        self.write(&arg.name);
        if let Some(annotation) = &arg.annotation {
            self.write(": ");
            self.expr(annotation, Precedence::Test);
        }
    }

    fn arguments(&mut self, args: &Arguments) {
        let mut first = true;
        let mut separator = |u: &mut Self| {
            if !std::mem::take(&mut first) {
                u.write(", ");
            }
        };

        let positional: Vec<&Arg> = args.posonlyargs.iter().chain(&args.args).collect();
        let defaults_from = positional.len().saturating_sub(args.defaults.len());
        for (index, arg) in positional.iter().enumerate() {
            separator(self);
            self.arg(arg);
            if let Some(default) = index
                .checked_sub(defaults_from)
                .and_then(|i| args.defaults.get(i))
            {
                self.write("=");
                self.expr(default, Precedence::Test);
            }
            if index + 1 == args.posonlyargs.len() {
                self.write(", /");
            }
        }

        if args.vararg.is_some() || !args.kwonlyargs.is_empty() {
            separator(self);
            self.write("*");
            if let Some(vararg) = &args.vararg {
                self.arg(vararg);
            }
        }

        for (arg, default) in args.kwonlyargs.iter().zip(&args.kw_defaults) {
            self.write(", ");
            self.arg(arg);
            if let Some(default) = default {
                self.write("=");
                self.expr(default, Precedence::Test);
            }
        }

        if let Some(kwarg) = &args.kwarg {
            separator(self);
            self.write("**");
            self.arg(kwarg);
        }
    }

    fn call_arguments(&mut self, args: &[Expr], keywords: &[Keyword]) {
        self.interleave(args, |u, e| u.expr(e, Precedence::Test));
        if !args.is_empty() && !keywords.is_empty() {
            self.write(", ");
        }
        self.interleave(keywords, |u, k| {
            match &k.arg {
                Some(name) => {
                    u.write(name);
                    u.write("=");
                }
                None => u.write("**"),
            }
            u.expr(&k.value, Precedence::Test);
        });
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn expr(&mut self, expr: &Expr, precedence: Precedence) {
        match &expr.kind {
            ExprKind::BoolOp { op, values } => {
                let own = match op {
                    BoolOp::And => Precedence::And,
                    BoolOp::Or => Precedence::Or,
                };
                let parens = precedence > own;
                self.open_if(parens);
                // Each successive operand binds one level tighter, so a
                // nested chain of the same operator keeps its grouping.
                let mut level = own;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.write(" ");
                        self.write(op.as_str());
                        self.write(" ");
                    }
                    level = level.next();
                    self.expr(value, level);
                }
                self.close_if(parens);
            }
            ExprKind::NamedExpr { target, value } => {
                let parens = precedence > Precedence::NamedExpr;
                self.open_if(parens);
                self.expr(target, Precedence::Atom);
                self.write(" := ");
                self.expr(value, Precedence::Atom);
                self.close_if(parens);
            }
            ExprKind::BinOp { left, op, right } => {
                let own = Precedence::of_binary(*op);
                let (left_precedence, right_precedence) = if *op == Operator::Pow {
                    (own.next(), own)
                } else {
                    (own, own.next())
                };
                let parens = precedence > own;
                self.open_if(parens);
                self.expr(left, left_precedence);
                self.write(" ");
                self.write(op.as_str());
                self.write(" ");
                self.expr(right, right_precedence);
                self.close_if(parens);
            }
            ExprKind::UnaryOp { op, operand } => {
                let own = match op {
                    UnaryOp::Not => Precedence::Not,
                    _ => Precedence::Factor,
                };
                let parens = precedence > own;
                self.open_if(parens);
                self.write(op.as_str());
                if *op == UnaryOp::Not {
                    self.write(" ");
                }
                self.expr(operand, own);
                self.close_if(parens);
            }
            ExprKind::Lambda { args, body } => {
                let parens = precedence > Precedence::Test;
                self.open_if(parens);
                self.write("lambda");
                let mark = self.out.len();
                self.write(" ");
                self.arguments(args);
                if self.out.len() == mark + 1 {
                    self.out.truncate(mark);
                }
                self.write(": ");
                self.expr(body, Precedence::Test);
                self.close_if(parens);
            }
            ExprKind::IfExp { test, body, orelse } => {
                let parens = precedence > Precedence::Test;
                self.open_if(parens);
                self.expr(body, Precedence::Test.next());
                self.write(" if ");
                self.expr(test, Precedence::Test.next());
                self.write(" else ");
                self.expr(orelse, Precedence::Test);
                self.close_if(parens);
            }
            ExprKind::Dict { keys, values } => {
                self.write("{");
                let entries: Vec<_> = keys.iter().zip(values).collect();
                self.interleave(&entries, |u, (key, value)| match key {
                    Some(key) => {
                        u.expr(key, Precedence::Test);
                        u.write(": ");
                        u.expr(value, Precedence::Test);
                    }
                    None => {
                        u.write("**");
                        u.expr(value, Precedence::Expr);
                    }
                });
                self.write("}");
            }
            ExprKind::Set { elts } => {
                if elts.is_empty() {
                    // `{}` is an empty dict.
                    self.write("{*()}");
                } else {
                    self.write("{");
                    self.interleave(elts, |u, e| u.expr(e, Precedence::Test));
                    self.write("}");
                }
            }
            ExprKind::ListComp { elt, generators } => {
                self.write("[");
                self.expr(elt, Precedence::Test);
                self.generators(generators);
                self.write("]");
            }
            ExprKind::SetComp { elt, generators } => {
                self.write("{");
                self.expr(elt, Precedence::Test);
                self.generators(generators);
                self.write("}");
            }
            ExprKind::DictComp {
                key,
                value,
                generators,
            } => {
                self.write("{");
                self.expr(key, Precedence::Test);
                self.write(": ");
                self.expr(value, Precedence::Test);
                self.generators(generators);
                self.write("}");
            }
            ExprKind::GeneratorExp { elt, generators } => {
                self.write("(");
                self.expr(elt, Precedence::Test);
                self.generators(generators);
                self.write(")");
            }
            ExprKind::Await { value } => {
                let parens = precedence > Precedence::Await;
                self.open_if(parens);
                self.write("await ");
                self.expr(value, Precedence::Atom);
                self.close_if(parens);
            }
            ExprKind::Yield { value } => {
                let parens = precedence > Precedence::Yield;
                self.open_if(parens);
                self.write("yield");
                if let Some(value) = value {
                    self.write(" ");
                    self.expr(value, Precedence::Atom);
                }
                self.close_if(parens);
            }
            ExprKind::YieldFrom { value } => {
                let parens = precedence > Precedence::Yield;
                self.open_if(parens);
                self.write("yield from ");
                self.expr(value, Precedence::Atom);
                self.close_if(parens);
            }
            ExprKind::Compare {
                left,
                ops,
                comparators,
            } => {
                let parens = precedence > Precedence::Cmp;
                self.open_if(parens);
                self.expr(left, Precedence::Cmp.next());
                for (op, comparator) in ops.iter().zip(comparators) {
                    self.write(" ");
                    self.write(op.as_str());
                    self.write(" ");
                    self.expr(comparator, Precedence::Cmp.next());
                }
                self.close_if(parens);
            }
            ExprKind::Call {
                func,
                args,
                keywords,
            } => {
                self.expr(func, Precedence::Atom);
                self.write("(");
                self.call_arguments(args, keywords);
                self.write(")");
            }
            ExprKind::FormattedValue {
                value,
                conversion,
                format_spec,
            } => self.formatted_value(value, *conversion, format_spec.as_deref()),
            ExprKind::JoinedStr { values } => self.joined_str(values),
            ExprKind::Constant { value } => self.constant(value),
            ExprKind::Attribute { value, attr } => {
                self.expr(value, Precedence::Atom);
                // `1.real` would lex as a float; `1 .real` does not.
                if matches!(
                    value.kind,
                    ExprKind::Constant {
                        value: Constant::Int(_) | Constant::Bool(_)
                    }
                ) {
                    self.write(" ");
                }
                self.write(".");
                self.write(attr);
            }
            ExprKind::Subscript { value, slice } => {
                self.expr(value, Precedence::Atom);
                self.write("[");
                match &slice.kind {
                    ExprKind::Tuple { elts } if !elts.is_empty() => self.items_view(elts),
                    _ => self.expr(slice, Precedence::Test),
                }
                self.write("]");
            }
            ExprKind::Starred { value } => {
                self.write("*");
                self.expr(value, Precedence::Expr);
            }
            ExprKind::Name { id } => self.write(id),
            ExprKind::List { elts } => {
                self.write("[");
                self.interleave(elts, |u, e| u.expr(e, Precedence::Test));
                self.write("]");
            }
            ExprKind::Tuple { elts } => {
                let parens = elts.is_empty() || precedence > Precedence::Tuple;
                self.open_if(parens);
                self.items_view(elts);
                self.close_if(parens);
            }
            ExprKind::Slice { lower, upper, step } => {
                if let Some(lower) = lower {
                    self.expr(lower, Precedence::Test);
                }
                self.write(":");
                if let Some(upper) = upper {
                    self.expr(upper, Precedence::Test);
                }
                if let Some(step) = step {
                    self.write(":");
                    self.expr(step, Precedence::Test);
                }
            }
        }
    }

    fn generators(&mut self, generators: &[Comprehension]) {
        for generator in generators {
            self.write(if generator.is_async {
                " async for "
            } else {
                " for "
            });
            self.expr(&generator.target, Precedence::Tuple);
            self.write(" in ");
            self.expr(&generator.iter, Precedence::Test.next());
            for condition in &generator.ifs {
                self.write(" if ");
                self.expr(condition, Precedence::Test.next());
            }
        }
    }

    fn constant(&mut self, value: &Constant) {
        match value {
            Constant::None => self.write("None"),
            Constant::Bool(true) => self.write("True"),
            Constant::Bool(false) => self.write("False"),
            Constant::Ellipsis => self.write("..."),
            Constant::Int(digits) => self.write(digits),
            Constant::Float(value) => self.write(&float_repr(*value, true)),
            Constant::Complex(imaginary) => {
                self.write(&float_repr(*imaginary, false));
                self.write("j");
            }
            Constant::Str(s) if self.avoid_backslashes => {
                self.str_avoiding_backslashes(s, ALL_QUOTES);
            }
            Constant::Str(s) => self.write(&str_repr(s)),
            Constant::Bytes(b) => self.write(&bytes_repr(b)),
        }
    }

    // ==========================================================================
    // F-Strings
    // ==========================================================================

    fn joined_str(&mut self, values: &[Expr]) {
        self.write("f");

        if self.avoid_backslashes {
            let mut inner = Unparser::default();
            for value in values {
                inner.fstring_inner(value);
            }
            self.str_avoiding_backslashes(&inner.out, ALL_QUOTES);
            return;
        }

        // Every piece narrows the quotes the whole literal may use, so a
        // quote that appears inside a replacement field is never the outer
        // one. Escapes for newlines and tabs apply to literal text only.
        let mut quote_types: Vec<&'static str> = ALL_QUOTES.to_vec();
        let mut body = String::new();
        for value in values {
            let mut inner = Unparser::default();
            inner.fstring_inner(value);
            let is_text = matches!(value.kind, ExprKind::Constant { .. });
            let (escaped, usable) = str_literal_helper(&inner.out, &quote_types, is_text);
            quote_types = usable;
            body.push_str(&escaped);
        }

        let quote = quote_types.first().copied().unwrap_or("'");
        self.write(quote);
        self.write(&body);
        self.write(quote);
    }

    fn fstring_inner(&mut self, node: &Expr) {
        match &node.kind {
            ExprKind::JoinedStr { values } => {
                for value in values {
                    self.fstring_inner(value);
                }
            }
            ExprKind::Constant {
                value: Constant::Str(text),
            } => self.write(&text.replace('{', "{{").replace('}', "}}")),
            ExprKind::FormattedValue {
                value,
                conversion,
                format_spec,
            } => self.formatted_value(value, *conversion, format_spec.as_deref()),
            _ => self.expr(node, Precedence::Test.next()),
        }
    }

    fn formatted_value(&mut self, value: &Expr, conversion: Option<char>, spec: Option<&Expr>) {
        self.write("{");
        let mut inner = Unparser {
            avoid_backslashes: true,
            ..Unparser::default()
        };
        inner.expr(value, Precedence::Test.next());
        if inner.out.starts_with('{') {
            // `{{` would read as an escaped brace.
            self.write(" ");
        }
        self.write(&inner.out);
        if let Some(conversion) = conversion {
            self.out.push('!');
            self.out.push(conversion);
        }
        if let Some(spec) = spec {
            self.write(":");
            self.fstring_inner(spec);
        }
        self.write("}");
    }
}

// ==============================================================================
// Literal Spelling
// ==============================================================================

/// Whether `c` is written as-is inside a string literal: everything but
/// the "Other" and "Separator" general categories, plus the ASCII space.
fn is_printable(c: char) -> bool {
    c == ' '
        || !matches!(
            get_general_category(c),
            GeneralCategory::Control
                | GeneralCategory::Format
                | GeneralCategory::Surrogate
                | GeneralCategory::PrivateUse
                | GeneralCategory::Unassigned
                | GeneralCategory::SpaceSeparator
                | GeneralCategory::LineSeparator
                | GeneralCategory::ParagraphSeparator
        )
}

/// The backslash escape for `c`, with lowercase hex digits. A surrogate
/// stand-in is written as the surrogate it holds.
fn escape_char(c: char, out: &mut String) {
    let code = stood_in_surrogate(c).unwrap_or(u32::from(c));
    // Writing to a String cannot fail.
    let _ = match c {
        '\\' => write!(out, "\\\\"),
        '\t' => write!(out, "\\t"),
        '\n' => write!(out, "\\n"),
        '\r' => write!(out, "\\r"),
        _ if code < 0x100 => write!(out, "\\x{code:02x}"),
        _ if code < 0x10000 => write!(out, "\\u{code:04x}"),
        _ => write!(out, "\\U{code:08x}"),
    };
}

/// The conventional spelling of a string: single quotes unless the text
/// contains a single quote and no double quote.
fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        if c == quote {
            out.push('\\');
            out.push(c);
        } else if c == '\\' || !is_printable(c) {
            escape_char(c, &mut out);
        } else {
            out.push(c);
        }
    }
    out.push(quote);
    out
}

fn bytes_repr(bytes: &[u8]) -> String {
    let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') {
        b'"'
    } else {
        b'\''
    };
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push('b');
    out.push(char::from(quote));
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            _ if b == quote => {
                out.push('\\');
                out.push(char::from(b));
            }
            0x20..=0x7e => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\x{b:02x}");
            }
        }
    }
    out.push(char::from(quote));
    out
}

/// Escape `string` for a literal delimited by one of `quote_types`, returning
/// the escaped text and the quotes it may be wrapped in (best first).
///
/// Backslashes and unprintable characters are always escaped; newlines and
/// tabs only when `escape_whitespace` is set. Quotes are never escaped:
/// instead, quote styles that occur in the text are ruled out.
fn str_literal_helper(
    string: &str,
    quote_types: &[&'static str],
    escape_whitespace: bool,
) -> (String, Vec<&'static str>) {
    let mut escaped = String::with_capacity(string.len());
    for c in string.chars() {
        if !escape_whitespace && (c == '\n' || c == '\t') {
            escaped.push(c);
        } else if c == '\\' || !is_printable(c) {
            escape_char(c, &mut escaped);
        } else {
            escaped.push(c);
        }
    }

    let multiline = escaped.contains('\n');
    let mut possible: Vec<&'static str> = quote_types
        .iter()
        .copied()
        .filter(|q| !multiline || MULTI_QUOTES.contains(q))
        .filter(|q| !escaped.contains(q))
        .collect();

    if possible.is_empty() {
        let repr = str_repr(string);
        let quote = if repr.starts_with('"') { "\"" } else { "'" };
        let quote = quote_types
            .iter()
            .copied()
            .find(|q| q.contains(quote))
            .unwrap_or(quote);
        return (repr[1..repr.len() - 1].to_string(), vec![quote]);
    }

    if let Some(last) = escaped.chars().last() {
        // Prefer a quote that differs from the final character; if none
        // does, escape that character.
        possible.sort_by_key(|q| q.starts_with(last));
        if possible[0].starts_with(last) {
            escaped.pop();
            escaped.push('\\');
            escaped.push(last);
        }
    }
    (escaped, possible)
}

/// The shortest text that reads back as `value`: fixed notation for
/// exponents in `-4..16`, scientific (`1e+16`, `1.5e-05`) otherwise.
/// `add_dot_zero` marks integral floats with a trailing `.0`; imaginary
/// parts are written without it.
fn float_repr(value: f64, add_dot_zero: bool) -> String {
    if value.is_nan() {
        return format!("({INFINITY_LITERAL}-{INFINITY_LITERAL})");
    }
    let sign = if value.is_sign_negative() { "-" } else { "" };
    if value.is_infinite() {
        return format!("{sign}{INFINITY_LITERAL}");
    }

    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    let body = if !(-4..16).contains(&exponent) {
        let mut mantissa = digits[..1].to_string();
        if digits.len() > 1 {
            mantissa.push('.');
            mantissa.push_str(&digits[1..]);
        }
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{exponent_sign}{:02}", exponent.unsigned_abs())
    } else if exponent < 0 {
        let zeros = "0".repeat(exponent.unsigned_abs() as usize - 1);
        format!("0.{zeros}{digits}")
    } else {
        let point = exponent.unsigned_abs() as usize + 1;
        if digits.len() <= point {
            let mut integral = digits.clone();
            integral.push_str(&"0".repeat(point - digits.len()));
            if add_dot_zero {
                integral.push_str(".0");
            }
            integral
        } else {
            format!("{}.{}", &digits[..point], &digits[point..])
        }
    };
    format!("{sign}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_module;
    use pretty_assertions::assert_eq;

    fn normalize(source: &str) -> String {
        unparse(&parse_module(source).expect("test source should parse"))
    }

    #[test]
    fn redundant_parentheses_and_spacing_are_dropped() {
        assert_eq!(normalize("x = ( a+b )*c\n"), "x = (a + b) * c");
        assert_eq!(normalize("x=(a*b)+c\n"), "x = a * b + c");
    }

    #[test]
    fn comments_and_blank_lines_disappear() {
        assert_eq!(normalize("# lead\n\nx = 1  # trailing\n\n\ny = 2\n"), "x = 1\ny = 2");
    }

    #[test]
    fn definitions_are_preceded_by_a_blank_line() {
        assert_eq!(
            normalize("import os\ndef f():\n  pass\nclass A:\n  def m(self): return 1\n"),
            "import os\n\ndef f():\n    pass\n\nclass A:\n\n    def m(self):\n        return 1"
        );
    }

    #[test]
    fn first_definition_has_no_leading_newline() {
        assert_eq!(normalize("def f(): pass\n"), "def f():\n    pass");
    }

    #[test]
    fn tuples_are_parenthesized_outside_targets() {
        assert_eq!(normalize("a, b = c, d\n"), "a, b = (c, d)");
        assert_eq!(normalize("def f():\n    return 1, 2\n"), "def f():\n    return (1, 2)");
        assert_eq!(normalize("x = 1,\n"), "x = (1,)");
        assert_eq!(normalize("x = ()\n"), "x = ()");
        assert_eq!(normalize("a[1, 2]\n"), "a[1, 2]");
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(normalize("x = (a ** b) ** c\n"), "x = (a ** b) ** c");
        assert_eq!(normalize("x = a ** (b ** c)\n"), "x = a ** b ** c");
        assert_eq!(normalize("x = -a ** -b\n"), "x = -a ** (-b)");
    }

    #[test]
    fn boolean_chains_keep_their_grouping() {
        assert_eq!(normalize("x = a or (b or c)\n"), "x = a or (b or c)");
        assert_eq!(normalize("x = (a or b) or c\n"), "x = (a or b) or c");
        assert_eq!(normalize("x = not a and b\n"), "x = not a and b");
    }

    #[test]
    fn conditional_and_lambda() {
        assert_eq!(normalize("x = (a if b else c)\n"), "x = a if b else c");
        assert_eq!(normalize("f = lambda: 0\n"), "f = lambda: 0");
        assert_eq!(
            normalize("f = lambda a, *b, c=1, **d: a\n"),
            "f = lambda a, *b, c=1, **d: a"
        );
    }

    #[test]
    fn parameters_are_written_compactly() {
        assert_eq!(
            normalize("def f(a, /, b: int = 2, *, c, d=4, **e) -> None:\n    pass\n"),
            "def f(a, /, b: int=2, *, c, d=4, **e) -> None:\n    pass"
        );
    }

    #[test]
    fn generator_arguments_get_their_own_parentheses() {
        assert_eq!(normalize("sum(x for x in y)\n"), "sum((x for x in y))");
    }

    #[test]
    fn walrus_and_yield_are_parenthesized() {
        assert_eq!(normalize("if x := f():\n    pass\n"), "if (x := f()):\n    pass");
        assert_eq!(normalize("def g():\n    x = yield 1\n"), "def g():\n    x = (yield 1)");
    }

    #[test]
    fn elif_chains_are_collapsed() {
        assert_eq!(
            normalize("if a:\n    x\nelse:\n    if b:\n        y\n    else:\n        z\n"),
            "if a:\n    x\nelif b:\n    y\nelse:\n    z"
        );
    }

    #[test]
    fn try_statement_layout() {
        assert_eq!(
            normalize(
                "try:\n    a\nexcept (E, F) as e:\n    b\nelse:\n    c\nfinally:\n    d\n"
            ),
            "try:\n    a\nexcept (E, F) as e:\n    b\nelse:\n    c\nfinally:\n    d"
        );
    }

    #[test]
    fn imports() {
        assert_eq!(
            normalize("from ..pkg import (a as b, c,)\nimport os.path as p\n"),
            "from ..pkg import a as b, c\nimport os.path as p"
        );
    }

    #[test]
    fn string_literals_use_conventional_quotes() {
        assert_eq!(normalize("x = \"hi\"\n"), "x = 'hi'");
        assert_eq!(normalize("x = \"it's\"\n"), "x = \"it's\"");
        assert_eq!(normalize("x = 'tab\\there'\n"), "x = 'tab\\there'");
        assert_eq!(normalize("x = b\"\\x00a\"\n"), "x = b'\\x00a'");
    }

    #[test]
    fn numbers_use_shortest_spelling() {
        assert_eq!(normalize("x = 0x10\n"), "x = 16");
        assert_eq!(normalize("x = 1.50\n"), "x = 1.5");
        assert_eq!(normalize("x = 10.\n"), "x = 10.0");
        assert_eq!(normalize("x = 1e16\n"), "x = 1e+16");
        assert_eq!(normalize("x = 0.00001\n"), "x = 1e-05");
        assert_eq!(normalize("x = 2J\n"), "x = 2j");
        assert_eq!(normalize("x = 1e999\n"), "x = 1e309");
        assert_eq!(normalize("x = 1 .real\n"), "x = 1 .real");
    }

    #[test]
    fn docstrings_use_triple_quotes() {
        assert_eq!(
            normalize("def f():\n    'Doc.'\n    return 1\n"),
            "def f():\n    \"\"\"Doc.\"\"\"\n    return 1"
        );
        assert_eq!(normalize("'''a\nb'''\n"), "\"\"\"a\nb\"\"\"");
    }

    #[test]
    fn sets_and_dicts() {
        assert_eq!(normalize("x = {**a, 'k': v}\n"), "x = {**a, 'k': v}");
        assert_eq!(normalize("x = {1, 2}\n"), "x = {1, 2}");
        assert_eq!(normalize("x = {k: v for k, v in items}\n"), "x = {k: v for k, v in items}");
    }

    #[test]
    fn fstrings() {
        assert_eq!(normalize("x = f\"a{b!r:>{w}}c\"\n"), "x = f'a{b!r:>{w}}c'");
        assert_eq!(normalize("x = f'{{lit}} {y}'\n"), "x = f'{{lit}} {y}'");
        assert_eq!(normalize("x = f'{ {1: 2}[1] }'\n"), "x = f'{ {1: 2}[1]}'");
        assert_eq!(normalize("x = f'{y=}'\n"), "x = f'y={y!r}'");
        assert_eq!(normalize("x = f'line\\n{y}'\n"), "x = f'line\\n{y}'");
    }

    #[test]
    fn fstring_quote_avoids_quotes_inside_fields() {
        assert_eq!(
            normalize("x = f\"{', '.join(a)}\"\n"),
            "x = f\"{', '.join(a)}\""
        );
        assert_eq!(normalize("x = f'{d[\"k\"]}'\n"), "x = f\"{d['k']}\"");
        assert_eq!(
            normalize("x = f'''{\"it's\" + d[\"k\"]}'''\n"),
            "x = f\"\"\"{\"it's\" + d['k']}\"\"\""
        );
    }

    #[test]
    fn match_statements() {
        assert_eq!(
            normalize(
                "match p:\n    case Point(0, y=1) | [_, *_]:\n        pass\n    case {'k': v, **kw} if v:\n        pass\n    case (1 | 2) as n:\n        pass\n    case None:\n        pass\n    case _:\n        pass\n"
            ),
            "match p:\n    case Point(0, y=1) | [_, *_]:\n        pass\n    case {'k': v, **kw} if v:\n        pass\n    case 1 | 2 as n:\n        pass\n    case None:\n        pass\n    case _:\n        pass"
        );
        assert_eq!(normalize("match a, b:\n    case x:\n        pass\n"), "match (a, b):\n    case x:\n        pass");
    }

    #[test]
    fn soft_keywords_remain_usable_as_names() {
        assert_eq!(normalize("match = 1\ncase = match\ntype = 2\n"), "match = 1\ncase = match\ntype = 2");
    }

    #[test]
    fn type_parameters_and_aliases() {
        assert_eq!(
            normalize("type Pairs[T: int, *Ts, **P] = list[T]\nclass Box[T]:\n    pass\ndef first[T](xs: list[T]) -> T:\n    pass\n"),
            "type Pairs[T: int, *Ts, **P] = list[T]\n\nclass Box[T]:\n    pass\n\ndef first[T](xs: list[T]) -> T:\n    pass"
        );
    }

    #[test]
    fn unprintable_code_points_are_escaped() {
        assert_eq!(str_repr("\u{378}"), "'\\u0378'");
        assert_eq!(str_repr("\u{fffe}"), "'\\ufffe'");
        assert_eq!(str_repr("\u{d7a4}"), "'\\ud7a4'");
        assert_eq!(str_repr("\u{a0}\u{2028}"), "'\\xa0\\u2028'");
        assert_eq!(str_repr("é中\u{1f600}"), "'é中\u{1f600}'");
    }

    #[test]
    fn lone_surrogates_are_written_as_escapes() {
        assert_eq!(normalize("x = '\\ud800'\n"), "x = '\\ud800'");
        assert_eq!(normalize("x = \"a\\udcff\"\n"), "x = 'a\\udcff'");
        assert_eq!(normalize("x = '\\U0000dfff'\n"), "x = '\\udfff'");
        assert_eq!(normalize("x = r'\\ud800'\n"), "x = '\\\\ud800'");
    }

    #[test]
    fn named_escapes_are_decoded() {
        assert_eq!(normalize("x = '\\N{LATIN SMALL LETTER E WITH ACUTE}'\n"), "x = 'é'");
    }

    #[test]
    fn float_repr_boundaries() {
        assert_eq!(float_repr(0.0, true), "0.0");
        assert_eq!(float_repr(0.0001, true), "0.0001");
        assert_eq!(float_repr(1e15, true), "1000000000000000.0");
        assert_eq!(float_repr(1.5e-7, true), "1.5e-07");
        assert_eq!(float_repr(123456789012345678.0, true), "1.2345678901234568e+17");
        assert_eq!(float_repr(3.0, false), "3");
    }

    #[test]
    fn docstring_ending_in_quote_is_escaped() {
        let (text, quotes) = str_literal_helper("say \"hi\"", MULTI_QUOTES, false);
        assert_eq!(quotes[0], "'''");
        assert_eq!(text, "say \"hi\"");

        let (text, quotes) = str_literal_helper("a\"\"\"b'''", MULTI_QUOTES, false);
        assert_eq!(quotes, vec!["'''"]);
        assert_eq!(text, "a\"\"\"b\\'\\'\\'");
    }
}
