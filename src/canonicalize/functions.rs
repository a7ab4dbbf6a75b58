use crate::model::ast::{FunctionDef, Stmt, StmtKind};
use crate::model::transform::{Rewrite, Transformer, walk_stmt};

use super::rename::{RenameMap, parameter_name};

/// Renames function definitions and their parameters, optionally keeping
/// only the definitions with one particular name.
///
/// A rewritten definition is not searched further: a `def` nested directly
/// inside another function's body keeps its original name. `async def` is
/// left as is, though definitions inside it are still visited.
pub struct FunctionCanonicalizer<'a> {
    names: &'a mut RenameMap,
    filter: Option<&'a str>,
}

impl<'a> FunctionCanonicalizer<'a> {
    /// An empty filter is the same as no filter.
    pub fn new(names: &'a mut RenameMap, filter: Option<&'a str>) -> Self {
        FunctionCanonicalizer {
            names,
            filter: filter.filter(|f| !f.is_empty()),
        }
    }

    fn rewrite(&mut self, def: FunctionDef) -> FunctionDef {
        let FunctionDef {
            is_async,
            name,
            mut args,
            mut body,
            decorator_list,
            returns: _,
            type_params,
        } = def;

        let name = self.names.canonical(&name);
        for (i, arg) in args.args.iter_mut().enumerate() {
            arg.name = parameter_name(i);
        }
        if body.first().is_some_and(Stmt::is_doc_statement) {
            body.remove(0);
        }

        FunctionDef {
            is_async,
            name,
            args,
            body,
            decorator_list,
            returns: None,
            type_params,
        }
    }
}

impl Transformer for FunctionCanonicalizer<'_> {
    fn fold_stmt(&mut self, stmt: Stmt) -> Rewrite<Stmt> {
        match stmt.kind {
            StmtKind::FunctionDef(def) if !def.is_async => {
                if self.filter.is_some_and(|wanted| wanted != def.name) {
                    return Rewrite::Removed;
                }
                let def = self.rewrite(*def);
                Rewrite::Keep(Stmt::new(StmtKind::FunctionDef(Box::new(def)), stmt.span))
            }
            kind => walk_stmt(self, Stmt::new(kind, stmt.span)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::transform::fold_module;
    use crate::model::unparse::unparse;
    use crate::reader::parse_module;
    use pretty_assertions::assert_eq;

    fn rewrite(source: &str, filter: Option<&str>) -> String {
        let module = parse_module(source).expect("test source should parse");
        let mut names = RenameMap::functions();
        unparse(&fold_module(
            &mut FunctionCanonicalizer::new(&mut names, filter),
            module,
        ))
    }

    #[test]
    fn names_and_parameters_are_replaced() {
        assert_eq!(
            rewrite("def add(a, b):\n    return a + b\n", None),
            "def func0(arg0, arg1):\n    return a + b"
        );
    }

    #[test]
    fn repeated_names_reuse_their_canonical_name() {
        assert_eq!(
            rewrite("def f(): pass\ndef g(): pass\ndef f(): pass\n", None),
            "def func0():\n    pass\n\ndef func1():\n    pass\n\ndef func0():\n    pass"
        );
    }

    #[test]
    fn leading_literal_statement_is_stripped() {
        assert_eq!(
            rewrite("def f():\n    '''Doc.'''\n    return 1\n", None),
            "def func0():\n    return 1"
        );
        assert_eq!(rewrite("def f():\n    ...\n", None), "def func0():");
        assert_eq!(
            rewrite("def f():\n    42\n    'second'\n", None),
            "def func0():\n    \"\"\"second\"\"\""
        );
    }

    #[test]
    fn only_regular_parameters_are_renamed() {
        assert_eq!(
            rewrite("def f(p, /, a: int = 1, *rest, k, **kw) -> int:\n    pass\n", None),
            "def func0(p, /, arg0: int=1, *rest, k, **kw):\n    pass"
        );
    }

    #[test]
    fn decorators_survive() {
        assert_eq!(
            rewrite("@cache\ndef f(x):\n    return x\n", None),
            "@cache\ndef func0(arg0):\n    return x"
        );
    }

    #[test]
    fn nested_definitions_inside_functions_are_untouched() {
        assert_eq!(
            rewrite("def outer():\n    def inner(y):\n        pass\n", None),
            "def func0():\n\n    def inner(y):\n        pass"
        );
    }

    #[test]
    fn methods_share_the_function_map() {
        assert_eq!(
            rewrite("def f(): pass\nclass A:\n    def m(self): pass\n", None),
            "def func0():\n    pass\n\nclass A:\n\n    def func1(arg0):\n        pass"
        );
    }

    #[test]
    fn async_definitions_are_left_alone() {
        assert_eq!(
            rewrite("async def fetch(url):\n    'doc'\n", None),
            "async def fetch(url):\n    \"\"\"doc\"\"\""
        );
    }

    #[test]
    fn filter_keeps_only_the_named_function() {
        assert_eq!(
            rewrite("x = 1\ndef a(): pass\ndef b(q): pass\n", Some("b")),
            "x = 1\n\ndef func0(arg0):\n    pass"
        );
    }

    #[test]
    fn filter_for_missing_function_removes_every_definition() {
        assert_eq!(
            rewrite("import os\ndef a(): pass\nclass C:\n    def m(self): pass\n", Some("zzz")),
            "import os\n\nclass C:"
        );
    }

    #[test]
    fn empty_filter_means_no_filter() {
        assert_eq!(rewrite("def a(): pass\n", Some("")), "def func0():\n    pass");
    }
}
