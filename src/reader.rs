// ==============================================================================
// Python Reader
// ==============================================================================
//
// Turns Python source into the syntax tree in `model::ast`. Tokenizing and
// parsing are done by `rustpython-parser`, which accepts the full Python 3
// grammar including `match` statements and type-parameter syntax. This
// module sits between its token stream and parser, then lowers the
// resulting tree into our own node types.
//
// Two adjustments happen on the token stream before parsing:
//
//   - Bracket nesting is capped, so pathological input is rejected with a
//     diagnostic rather than recursing without bound.
//   - `\uD800`-style escapes in text literals are rewritten to private-use
//     stand-ins (see `model::ast::surrogate_stand_in`), since a Rust `String`
//     cannot hold a lone surrogate. The serializer maps them back.
//
// Lowering counts how deeply statements, expressions and patterns nest and
// fails past a fixed limit, which keeps every later recursive pass over the
// tree within a normal thread stack. The parse itself runs on a dedicated
// thread with a large stack.
//
// Errors carry a byte span into the normalized source (line endings folded
// to `\n`, leading BOM removed) and are converted to a `ParseDiagnostic` at
// the public boundary so callers can render them with miette.

use std::{io, panic, thread};

use miette::NamedSource;
use rustpython_parser::ast::{self, Ranged};
use rustpython_parser::lexer::{LexResult, lex};
use rustpython_parser::{Mode, ParseError, ParseErrorType, StringKind, Tok, parse_tokens};

use crate::error::ParseDiagnostic;
use crate::model::ast::{
    Alias, Arg, Arguments, BoolOp, ClassDef, CmpOp, Comprehension, Constant, ExceptHandler, Expr,
    ExprKind, FunctionDef, Keyword, MatchCase, Module, Operator, Pattern, PatternKind, Span, Stmt,
    StmtKind, TypeParam, UnaryOp, WithItem, surrogate_stand_in,
};

/// Deepest bracket nesting accepted, as in CPython's tokenizer.
const MAX_BRACKET_DEPTH: usize = 200;

/// Deepest nesting of statements, expressions and patterns accepted.
const MAX_TREE_DEPTH: usize = 300;

const PARSER_STACK_SIZE: usize = 64 * 1024 * 1024;

// ==========================================================================
// Public API
// ==========================================================================

/// Parse Python source into a module. Diagnostics name the source `<input>`.
pub fn parse_module(source: &str) -> Result<Module, ParseDiagnostic> {
    parse_module_named(source, "<input>")
}

/// Parse Python source into a module, naming the source `name` in any
/// diagnostic (usually the file path).
pub fn parse_module_named(source: &str, name: &str) -> Result<Module, ParseDiagnostic> {
    let source = normalize_source(source);
    let text = source.clone();
    let parsed = on_parser_stack(move || parse(&text)).unwrap_or_else(|e| {
        Err(SyntaxError::new(Span::default(), "cannot start the Python parser")
            .with_help(e.to_string()))
    });
    parsed.map_err(|e| e.into_diagnostic(name, source))
}

fn normalize_source(source: &str) -> String {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    source.replace("\r\n", "\n").replace('\r', "\n")
}

/// Run `work` on a thread whose stack fits the parser's deepest recursion.
/// A panic in `work` is resumed on the calling thread.
fn on_parser_stack<T, F>(work: F) -> io::Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = thread::Builder::new()
        .name("python-parser".to_string())
        .stack_size(PARSER_STACK_SIZE)
        .spawn(work)?;
    Ok(handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
}

fn parse(source: &str) -> PResult<Module> {
    let tokens = tokenize(source)?;
    let parsed = parse_tokens(tokens, Mode::Module, "<input>")
        .map_err(|e| SyntaxError::from_parse_error(e, source))?;
    let ast::Mod::Module(module) = parsed else {
        return Err(SyntaxError::new(Span::default(), "expected a module"));
    };
    Lower::default().module(module.body)
}

// ==========================================================================
// Syntax Errors
// ==========================================================================

type PResult<T> = Result<T, SyntaxError>;

/// A parse failure before it is attached to its source text.
#[derive(Debug, Clone, PartialEq)]
struct SyntaxError {
    span: Span,
    message: String,
    label: Option<String>,
    help: Option<String>,
}

impl SyntaxError {
    fn new(span: Span, message: impl Into<String>) -> Self {
        SyntaxError {
            span,
            message: message.into(),
            label: None,
            help: None,
        }
    }

    fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn from_parse_error(error: ParseError, source: &str) -> Self {
        // Underline the character the parser stopped at.
        let start = usize::from(error.offset).min(source.len());
        let width = source
            .get(start..)
            .and_then(|rest| rest.chars().next())
            .map_or(0, char::len_utf8);
        let span = Span::new(start, start + width);

        match error.error {
            ParseErrorType::Eof => SyntaxError::new(span, "unexpected end of file")
                .with_help("check for an unclosed bracket or an unfinished block"),
            ParseErrorType::UnrecognizedToken(token, _) | ParseErrorType::ExtraToken(token) => {
                SyntaxError::new(span, "invalid syntax").with_label(format!("unexpected {token}"))
            }
            ParseErrorType::InvalidToken => SyntaxError::new(span, "invalid token"),
            ParseErrorType::Lexical(error) => SyntaxError::new(span, error.to_string()),
        }
    }

    fn into_diagnostic(self, name: &str, source: String) -> ParseDiagnostic {
        // End-of-file errors point one past the last byte; keep them in range.
        let start = self.span.start.min(source.len());
        let len = self.span.len().min(source.len() - start);
        ParseDiagnostic {
            src: NamedSource::new(name, source),
            span: (start, len).into(),
            message: self.message,
            label: self.label,
            help: self.help,
        }
    }
}

// ==========================================================================
// Token Stream
// ==========================================================================

/// Collect the tokens of `source`, stopping after the first lexical error
/// so the parser reports it at the right place.
fn tokenize(source: &str) -> PResult<Vec<LexResult>> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    for result in lex(source, Mode::Module) {
        let result = result.map(|(token, range)| (with_surrogate_stand_ins(token), range));
        match &result {
            Ok((Tok::Lpar | Tok::Lsqb | Tok::Lbrace, range)) => {
                depth += 1;
                if depth > MAX_BRACKET_DEPTH {
                    let span = Span::new(usize::from(range.start()), usize::from(range.end()));
                    return Err(SyntaxError::new(span, "too many nested parentheses"));
                }
            }
            Ok((Tok::Rpar | Tok::Rsqb | Tok::Rbrace, _)) => depth = depth.saturating_sub(1),
            Ok(_) | Err(_) => {}
        }
        let failed = result.is_err();
        tokens.push(result);
        if failed {
            break;
        }
    }
    Ok(tokens)
}

/// Rewrite surrogate escapes in the body of a text literal. Raw strings
/// keep their backslashes and bytes have no `\u` escapes, so both pass
/// through untouched.
fn with_surrogate_stand_ins(token: Tok) -> Tok {
    match token {
        Tok::String {
            value,
            kind: kind @ (StringKind::String | StringKind::FString | StringKind::Unicode),
            triple_quoted,
        } => Tok::String {
            value: replace_surrogate_escapes(&value),
            kind,
            triple_quoted,
        },
        other => other,
    }
}

/// Replace `\uXXXX` and `\UXXXXXXXX` escapes naming a surrogate with a
/// `\U` escape of its stand-in. An escaped backslash is skipped as a pair,
/// so `\\ud800` stays literal text.
fn replace_surrogate_escapes(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        out.push(c);
        if c != '\\' {
            continue;
        }
        let rest = &body[i + 1..];
        let digits = match rest.chars().next() {
            Some('u') => 4,
            Some('U') => 8,
            Some(next) => {
                out.push(next);
                chars.next();
                continue;
            }
            None => break,
        };
        let stand_in = rest
            .get(1..=digits)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(surrogate_stand_in);
        match stand_in {
            Some(stand_in) => {
                out.push_str(&format!("U{:08x}", u32::from(stand_in)));
                for _ in 0..=digits {
                    chars.next();
                }
            }
            None => {
                out.push_str(&rest[..1]);
                chars.next();
            }
        }
    }
    out
}

// ==========================================================================
// Lowering
// ==========================================================================

fn span_of(node: &impl Ranged) -> Span {
    Span::new(usize::from(node.start()), usize::from(node.end()))
}

fn ident(id: ast::Identifier) -> String {
    id.to_string()
}

/// Converts the parser's tree into `model::ast`, tracking nesting depth.
#[derive(Default)]
struct Lower {
    depth: usize,
}

impl Lower {
    fn enter(&mut self, span: Span) -> PResult<()> {
        self.depth += 1;
        if self.depth > MAX_TREE_DEPTH {
            return Err(SyntaxError::new(span, "code is nested too deeply")
                .with_label("nesting limit reached here")
                .with_help("split the expression or block into smaller pieces"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn module(&mut self, body: Vec<ast::Stmt>) -> PResult<Module> {
        Ok(Module {
            body: self.body(body)?,
        })
    }

    fn body(&mut self, stmts: Vec<ast::Stmt>) -> PResult<Vec<Stmt>> {
        stmts.into_iter().map(|s| self.stmt(s)).collect()
    }

    fn stmt(&mut self, stmt: ast::Stmt) -> PResult<Stmt> {
        let span = span_of(&stmt);
        self.enter(span)?;
        let kind = self.stmt_kind(stmt)?;
        self.leave();
        Ok(Stmt::new(kind, span))
    }

    fn stmt_kind(&mut self, stmt: ast::Stmt) -> PResult<StmtKind> {
        Ok(match stmt {
            ast::Stmt::FunctionDef(s) => StmtKind::FunctionDef(Box::new(FunctionDef {
                is_async: false,
                name: ident(s.name),
                args: self.arguments(*s.args)?,
                body: self.body(s.body)?,
                decorator_list: self.exprs(s.decorator_list)?,
                returns: self.opt_expr(s.returns)?,
                type_params: self.type_params(s.type_params)?,
            })),
            ast::Stmt::AsyncFunctionDef(s) => StmtKind::FunctionDef(Box::new(FunctionDef {
                is_async: true,
                name: ident(s.name),
                args: self.arguments(*s.args)?,
                body: self.body(s.body)?,
                decorator_list: self.exprs(s.decorator_list)?,
                returns: self.opt_expr(s.returns)?,
                type_params: self.type_params(s.type_params)?,
            })),
            ast::Stmt::ClassDef(s) => StmtKind::ClassDef(Box::new(ClassDef {
                name: ident(s.name),
                bases: self.exprs(s.bases)?,
                keywords: self.keywords(s.keywords)?,
                body: self.body(s.body)?,
                decorator_list: self.exprs(s.decorator_list)?,
                type_params: self.type_params(s.type_params)?,
            })),
            ast::Stmt::Return(s) => StmtKind::Return {
                value: self.opt_expr(s.value)?,
            },
            ast::Stmt::Delete(s) => StmtKind::Delete {
                targets: self.exprs(s.targets)?,
            },
            ast::Stmt::Assign(s) => StmtKind::Assign {
                targets: self.exprs(s.targets)?,
                value: self.expr(*s.value)?,
            },
            ast::Stmt::TypeAlias(s) => StmtKind::TypeAlias {
                name: self.expr(*s.name)?,
                type_params: self.type_params(s.type_params)?,
                value: self.expr(*s.value)?,
            },
            ast::Stmt::AugAssign(s) => StmtKind::AugAssign {
                target: self.expr(*s.target)?,
                op: operator(s.op),
                value: self.expr(*s.value)?,
            },
            ast::Stmt::AnnAssign(s) => StmtKind::AnnAssign {
                target: self.expr(*s.target)?,
                annotation: self.expr(*s.annotation)?,
                value: self.opt_expr(s.value)?,
                simple: s.simple,
            },
            ast::Stmt::For(s) => StmtKind::For {
                is_async: false,
                target: self.expr(*s.target)?,
                iter: self.expr(*s.iter)?,
                body: self.body(s.body)?,
                orelse: self.body(s.orelse)?,
            },
            ast::Stmt::AsyncFor(s) => StmtKind::For {
                is_async: true,
                target: self.expr(*s.target)?,
                iter: self.expr(*s.iter)?,
                body: self.body(s.body)?,
                orelse: self.body(s.orelse)?,
            },
            ast::Stmt::While(s) => StmtKind::While {
                test: self.expr(*s.test)?,
                body: self.body(s.body)?,
                orelse: self.body(s.orelse)?,
            },
            ast::Stmt::If(s) => StmtKind::If {
                test: self.expr(*s.test)?,
                body: self.body(s.body)?,
                orelse: self.body(s.orelse)?,
            },
            ast::Stmt::With(s) => StmtKind::With {
                is_async: false,
                items: self.with_items(s.items)?,
                body: self.body(s.body)?,
            },
            ast::Stmt::AsyncWith(s) => StmtKind::With {
                is_async: true,
                items: self.with_items(s.items)?,
                body: self.body(s.body)?,
            },
            ast::Stmt::Match(s) => StmtKind::Match {
                subject: self.expr(*s.subject)?,
                cases: s
                    .cases
                    .into_iter()
                    .map(|case| self.match_case(case))
                    .collect::<PResult<_>>()?,
            },
            ast::Stmt::Raise(s) => StmtKind::Raise {
                exc: self.opt_expr(s.exc)?,
                cause: self.opt_expr(s.cause)?,
            },
            ast::Stmt::Try(s) => StmtKind::Try {
                body: self.body(s.body)?,
                handlers: self.handlers(s.handlers)?,
                orelse: self.body(s.orelse)?,
                finalbody: self.body(s.finalbody)?,
                is_star: false,
            },
            ast::Stmt::TryStar(s) => StmtKind::Try {
                body: self.body(s.body)?,
                handlers: self.handlers(s.handlers)?,
                orelse: self.body(s.orelse)?,
                finalbody: self.body(s.finalbody)?,
                is_star: true,
            },
            ast::Stmt::Assert(s) => StmtKind::Assert {
                test: self.expr(*s.test)?,
                msg: self.opt_expr(s.msg)?,
            },
            ast::Stmt::Import(s) => StmtKind::Import {
                names: s.names.into_iter().map(alias).collect(),
            },
            ast::Stmt::ImportFrom(s) => StmtKind::ImportFrom {
                module: s.module.map(ident),
                names: s.names.into_iter().map(alias).collect(),
                level: s.level.map_or(0, |level| level.to_u32() as usize),
            },
            ast::Stmt::Global(s) => StmtKind::Global {
                names: s.names.into_iter().map(ident).collect(),
            },
            ast::Stmt::Nonlocal(s) => StmtKind::Nonlocal {
                names: s.names.into_iter().map(ident).collect(),
            },
            ast::Stmt::Expr(s) => StmtKind::Expr {
                value: self.expr(*s.value)?,
            },
            ast::Stmt::Pass(_) => StmtKind::Pass,
            ast::Stmt::Break(_) => StmtKind::Break,
            ast::Stmt::Continue(_) => StmtKind::Continue,
        })
    }

    fn arguments(&mut self, args: ast::Arguments) -> PResult<Arguments> {
        let mut defaults = Vec::new();
        let mut posonlyargs = Vec::new();
        for param in args.posonlyargs {
            posonlyargs.push(self.arg(param.def)?);
            if let Some(default) = param.default {
                defaults.push(self.expr(*default)?);
            }
        }
        let mut positional = Vec::new();
        for param in args.args {
            positional.push(self.arg(param.def)?);
            if let Some(default) = param.default {
                defaults.push(self.expr(*default)?);
            }
        }
        let vararg = args.vararg.map(|a| self.arg(*a)).transpose()?;
        let mut kwonlyargs = Vec::new();
        let mut kw_defaults = Vec::new();
        for param in args.kwonlyargs {
            kwonlyargs.push(self.arg(param.def)?);
            kw_defaults.push(self.opt_expr(param.default)?);
        }
        let kwarg = args.kwarg.map(|a| self.arg(*a)).transpose()?;

        Ok(Arguments {
            posonlyargs,
            args: positional,
            vararg,
            kwonlyargs,
            kw_defaults,
            kwarg,
            defaults,
        })
    }

    fn arg(&mut self, arg: ast::Arg) -> PResult<Arg> {
        let span = span_of(&arg);
        Ok(Arg {
            name: ident(arg.arg),
            annotation: self.opt_expr(arg.annotation)?,
            span,
        })
    }

    fn keywords(&mut self, keywords: Vec<ast::Keyword>) -> PResult<Vec<Keyword>> {
        keywords
            .into_iter()
            .map(|keyword| {
                let span = span_of(&keyword);
                Ok(Keyword {
                    arg: keyword.arg.map(ident),
                    value: self.expr(keyword.value)?,
                    span,
                })
            })
            .collect()
    }

    fn with_items(&mut self, items: Vec<ast::WithItem>) -> PResult<Vec<WithItem>> {
        items
            .into_iter()
            .map(|item| {
                Ok(WithItem {
                    context_expr: self.expr(item.context_expr)?,
                    optional_vars: self.opt_expr(item.optional_vars)?,
                })
            })
            .collect()
    }

    fn handlers(&mut self, handlers: Vec<ast::ExceptHandler>) -> PResult<Vec<ExceptHandler>> {
        handlers
            .into_iter()
            .map(|handler| {
                let span = span_of(&handler);
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                Ok(ExceptHandler {
                    exc_type: self.opt_expr(handler.type_)?,
                    name: handler.name.map(ident),
                    body: self.body(handler.body)?,
                    span,
                })
            })
            .collect()
    }

    fn type_params(&mut self, params: Vec<ast::TypeParam>) -> PResult<Vec<TypeParam>> {
        params
            .into_iter()
            .map(|param| {
                Ok(match param {
                    ast::TypeParam::TypeVar(p) => TypeParam::TypeVar {
                        name: ident(p.name),
                        bound: self.opt_expr(p.bound)?,
                    },
                    ast::TypeParam::ParamSpec(p) => TypeParam::ParamSpec { name: ident(p.name) },
                    ast::TypeParam::TypeVarTuple(p) => {
                        TypeParam::TypeVarTuple { name: ident(p.name) }
                    }
                })
            })
            .collect()
    }

    fn match_case(&mut self, case: ast::MatchCase) -> PResult<MatchCase> {
        Ok(MatchCase {
            pattern: self.pattern(case.pattern)?,
            guard: self.opt_expr(case.guard)?,
            body: self.body(case.body)?,
        })
    }

    fn patterns(&mut self, patterns: Vec<ast::Pattern>) -> PResult<Vec<Pattern>> {
        patterns.into_iter().map(|p| self.pattern(p)).collect()
    }

    fn pattern(&mut self, pattern: ast::Pattern) -> PResult<Pattern> {
        let span = span_of(&pattern);
        self.enter(span)?;
        let kind = match pattern {
            ast::Pattern::MatchValue(p) => PatternKind::MatchValue {
                value: self.expr(*p.value)?,
            },
            ast::Pattern::MatchSingleton(p) => PatternKind::MatchSingleton {
                // Only `None`, `True` and `False` reach here.
                value: match p.value {
                    ast::Constant::Bool(b) => Constant::Bool(b),
                    _ => Constant::None,
                },
            },
            ast::Pattern::MatchSequence(p) => PatternKind::MatchSequence {
                patterns: self.patterns(p.patterns)?,
            },
            ast::Pattern::MatchMapping(p) => PatternKind::MatchMapping {
                keys: self.exprs(p.keys)?,
                patterns: self.patterns(p.patterns)?,
                rest: p.rest.map(ident),
            },
            ast::Pattern::MatchClass(p) => PatternKind::MatchClass {
                cls: self.expr(*p.cls)?,
                patterns: self.patterns(p.patterns)?,
                kwd_attrs: p.kwd_attrs.into_iter().map(ident).collect(),
                kwd_patterns: self.patterns(p.kwd_patterns)?,
            },
            ast::Pattern::MatchStar(p) => PatternKind::MatchStar {
                name: p.name.map(ident),
            },
            ast::Pattern::MatchAs(p) => PatternKind::MatchAs {
                pattern: p
                    .pattern
                    .map(|inner| self.pattern(*inner).map(Box::new))
                    .transpose()?,
                name: p.name.map(ident),
            },
            ast::Pattern::MatchOr(p) => PatternKind::MatchOr {
                patterns: self.patterns(p.patterns)?,
            },
        };
        self.leave();
        Ok(Pattern::new(kind, span))
    }

    fn comprehensions(&mut self, generators: Vec<ast::Comprehension>) -> PResult<Vec<Comprehension>> {
        generators
            .into_iter()
            .map(|g| {
                Ok(Comprehension {
                    target: self.expr(g.target)?,
                    iter: self.expr(g.iter)?,
                    ifs: self.exprs(g.ifs)?,
                    is_async: g.is_async,
                })
            })
            .collect()
    }

    fn exprs(&mut self, exprs: Vec<ast::Expr>) -> PResult<Vec<Expr>> {
        exprs.into_iter().map(|e| self.expr(e)).collect()
    }

    fn opt_expr(&mut self, expr: Option<Box<ast::Expr>>) -> PResult<Option<Expr>> {
        expr.map(|e| self.expr(*e)).transpose()
    }

    fn boxed(&mut self, expr: ast::Expr) -> PResult<Box<Expr>> {
        self.expr(expr).map(Box::new)
    }

    fn opt_boxed(&mut self, expr: Option<Box<ast::Expr>>) -> PResult<Option<Box<Expr>>> {
        expr.map(|e| self.boxed(*e)).transpose()
    }

    fn expr(&mut self, expr: ast::Expr) -> PResult<Expr> {
        let span = span_of(&expr);
        self.enter(span)?;
        let kind = self.expr_kind(expr, span)?;
        self.leave();
        Ok(Expr::new(kind, span))
    }

    fn expr_kind(&mut self, expr: ast::Expr, span: Span) -> PResult<ExprKind> {
        Ok(match expr {
            ast::Expr::BoolOp(e) => ExprKind::BoolOp {
                op: match e.op {
                    ast::BoolOp::And => BoolOp::And,
                    ast::BoolOp::Or => BoolOp::Or,
                },
                values: self.exprs(e.values)?,
            },
            ast::Expr::NamedExpr(e) => ExprKind::NamedExpr {
                target: self.boxed(*e.target)?,
                value: self.boxed(*e.value)?,
            },
            ast::Expr::BinOp(e) => ExprKind::BinOp {
                left: self.boxed(*e.left)?,
                op: operator(e.op),
                right: self.boxed(*e.right)?,
            },
            ast::Expr::UnaryOp(e) => ExprKind::UnaryOp {
                op: match e.op {
                    ast::UnaryOp::Invert => UnaryOp::Invert,
                    ast::UnaryOp::Not => UnaryOp::Not,
                    ast::UnaryOp::UAdd => UnaryOp::UAdd,
                    ast::UnaryOp::USub => UnaryOp::USub,
                },
                operand: self.boxed(*e.operand)?,
            },
            ast::Expr::Lambda(e) => ExprKind::Lambda {
                args: Box::new(self.arguments(*e.args)?),
                body: self.boxed(*e.body)?,
            },
            ast::Expr::IfExp(e) => ExprKind::IfExp {
                test: self.boxed(*e.test)?,
                body: self.boxed(*e.body)?,
                orelse: self.boxed(*e.orelse)?,
            },
            ast::Expr::Dict(e) => ExprKind::Dict {
                keys: e
                    .keys
                    .into_iter()
                    .map(|key| key.map(|k| self.expr(k)).transpose())
                    .collect::<PResult<_>>()?,
                values: self.exprs(e.values)?,
            },
            ast::Expr::Set(e) => ExprKind::Set {
                elts: self.exprs(e.elts)?,
            },
            ast::Expr::ListComp(e) => ExprKind::ListComp {
                elt: self.boxed(*e.elt)?,
                generators: self.comprehensions(e.generators)?,
            },
            ast::Expr::SetComp(e) => ExprKind::SetComp {
                elt: self.boxed(*e.elt)?,
                generators: self.comprehensions(e.generators)?,
            },
            ast::Expr::DictComp(e) => ExprKind::DictComp {
                key: self.boxed(*e.key)?,
                value: self.boxed(*e.value)?,
                generators: self.comprehensions(e.generators)?,
            },
            ast::Expr::GeneratorExp(e) => ExprKind::GeneratorExp {
                elt: self.boxed(*e.elt)?,
                generators: self.comprehensions(e.generators)?,
            },
            ast::Expr::Await(e) => ExprKind::Await {
                value: self.boxed(*e.value)?,
            },
            ast::Expr::Yield(e) => ExprKind::Yield {
                value: self.opt_boxed(e.value)?,
            },
            ast::Expr::YieldFrom(e) => ExprKind::YieldFrom {
                value: self.boxed(*e.value)?,
            },
            ast::Expr::Compare(e) => ExprKind::Compare {
                left: self.boxed(*e.left)?,
                ops: e.ops.into_iter().map(compare_op).collect(),
                comparators: self.exprs(e.comparators)?,
            },
            ast::Expr::Call(e) => ExprKind::Call {
                func: self.boxed(*e.func)?,
                args: self.exprs(e.args)?,
                keywords: self.keywords(e.keywords)?,
            },
            ast::Expr::FormattedValue(e) => ExprKind::FormattedValue {
                value: self.boxed(*e.value)?,
                conversion: match e.conversion {
                    ast::ConversionFlag::None => None,
                    ast::ConversionFlag::Str => Some('s'),
                    ast::ConversionFlag::Ascii => Some('a'),
                    ast::ConversionFlag::Repr => Some('r'),
                },
                format_spec: self.opt_boxed(e.format_spec)?,
            },
            ast::Expr::JoinedStr(e) => ExprKind::JoinedStr {
                values: self.exprs(e.values)?,
            },
            ast::Expr::Constant(e) => constant(e.value, span),
            ast::Expr::Attribute(e) => ExprKind::Attribute {
                value: self.boxed(*e.value)?,
                attr: ident(e.attr),
            },
            ast::Expr::Subscript(e) => ExprKind::Subscript {
                value: self.boxed(*e.value)?,
                slice: self.boxed(*e.slice)?,
            },
            ast::Expr::Starred(e) => ExprKind::Starred {
                value: self.boxed(*e.value)?,
            },
            ast::Expr::Name(e) => ExprKind::Name { id: ident(e.id) },
            ast::Expr::List(e) => ExprKind::List {
                elts: self.exprs(e.elts)?,
            },
            ast::Expr::Tuple(e) => ExprKind::Tuple {
                elts: self.exprs(e.elts)?,
            },
            ast::Expr::Slice(e) => ExprKind::Slice {
                lower: self.opt_boxed(e.lower)?,
                upper: self.opt_boxed(e.upper)?,
                step: self.opt_boxed(e.step)?,
            },
        })
    }
}

/// A literal. Tuples of constants only come from constant folding and are
/// written back as tuple displays.
fn constant(value: ast::Constant, span: Span) -> ExprKind {
    let value = match value {
        ast::Constant::None => Constant::None,
        ast::Constant::Bool(b) => Constant::Bool(b),
        ast::Constant::Str(s) => Constant::Str(s),
        ast::Constant::Bytes(b) => Constant::Bytes(b),
        ast::Constant::Int(i) => Constant::Int(i.to_string()),
        ast::Constant::Float(f) => Constant::Float(f),
        ast::Constant::Complex { imag, .. } => Constant::Complex(imag),
        ast::Constant::Ellipsis => Constant::Ellipsis,
        ast::Constant::Tuple(items) => {
            return ExprKind::Tuple {
                elts: items
                    .into_iter()
                    .map(|item| Expr::new(constant(item, span), span))
                    .collect(),
            };
        }
    };
    ExprKind::Constant { value }
}

fn alias(alias: ast::Alias) -> Alias {
    let span = span_of(&alias);
    Alias {
        name: ident(alias.name),
        asname: alias.asname.map(ident),
        span,
    }
}

fn operator(op: ast::Operator) -> Operator {
    match op {
        ast::Operator::Add => Operator::Add,
        ast::Operator::Sub => Operator::Sub,
        ast::Operator::Mult => Operator::Mult,
        ast::Operator::MatMult => Operator::MatMult,
        ast::Operator::Div => Operator::Div,
        ast::Operator::Mod => Operator::Mod,
        ast::Operator::Pow => Operator::Pow,
        ast::Operator::LShift => Operator::LShift,
        ast::Operator::RShift => Operator::RShift,
        ast::Operator::BitOr => Operator::BitOr,
        ast::Operator::BitXor => Operator::BitXor,
        ast::Operator::BitAnd => Operator::BitAnd,
        ast::Operator::FloorDiv => Operator::FloorDiv,
    }
}

fn compare_op(op: ast::CmpOp) -> CmpOp {
    match op {
        ast::CmpOp::Eq => CmpOp::Eq,
        ast::CmpOp::NotEq => CmpOp::NotEq,
        ast::CmpOp::Lt => CmpOp::Lt,
        ast::CmpOp::LtE => CmpOp::LtE,
        ast::CmpOp::Gt => CmpOp::Gt,
        ast::CmpOp::GtE => CmpOp::GtE,
        ast::CmpOp::Is => CmpOp::Is,
        ast::CmpOp::IsNot => CmpOp::IsNot,
        ast::CmpOp::In => CmpOp::In,
        ast::CmpOp::NotIn => CmpOp::NotIn,
    }
}
