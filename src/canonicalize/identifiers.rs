use crate::model::ast::{Expr, ExprKind};
use crate::model::transform::{Transformer, walk_expr};

use super::rename::RenameMap;

/// Renames every `Name` reference to its position-of-first-use canonical
/// name. Scopes are not tracked: the same spelling gets the same canonical
/// name wherever it appears.
pub struct IdentifierCanonicalizer<'a> {
    names: &'a mut RenameMap,
}

impl<'a> IdentifierCanonicalizer<'a> {
    pub fn new(names: &'a mut RenameMap) -> Self {
        IdentifierCanonicalizer { names }
    }
}

impl Transformer for IdentifierCanonicalizer<'_> {
    fn fold_expr(&mut self, expr: Expr) -> Expr {
        match expr.kind {
            ExprKind::Name { id } => Expr::name(self.names.canonical(&id), expr.span),
            kind => walk_expr(self, Expr::new(kind, expr.span)),
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

    fn rename(source: &str) -> (String, RenameMap) {
        let module = parse_module(source).expect("test source should parse");
        let mut names = RenameMap::identifiers();
        let module = fold_module(&mut IdentifierCanonicalizer::new(&mut names), module);
        (unparse(&module), names)
    }

    #[test]
    fn names_follow_first_use() {
        let (text, _) = rename("total = 0\nfor x in xs:\n    total += x\n");
        assert_eq!(text, "id0 = 0\nfor id1 in id2:\n    id0 += id1");
    }

    #[test]
    fn attributes_and_keywords_are_not_references() {
        let (text, names) = rename("obj.attr = f(key=value)\n");
        assert_eq!(text, "id0.attr = id1(key=id2)");
        assert_eq!(names.get("attr"), None);
        assert_eq!(names.get("key"), None);
    }

    #[test]
    fn same_spelling_in_different_scopes_shares_a_name() {
        let (text, _) = rename("def f():\n    x = 1\ndef g():\n    x = 2\n");
        assert_eq!(text, "def f():\n    id0 = 1\n\ndef g():\n    id0 = 2");
    }

    #[test]
    fn fstring_fields_are_renamed() {
        let (text, _) = rename("msg = f'{count} items'\n");
        assert_eq!(text, "id0 = f'{id1} items'");
    }

    #[test]
    fn builtins_are_renamed_like_any_name() {
        let (text, names) = rename("print(len(xs))\n");
        assert_eq!(text, "id0(id1(id2))");
        assert_eq!(names.len(), 3);
    }
}
