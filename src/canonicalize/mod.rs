// ==============================================================================
// Canonicalization Pipeline
// ==============================================================================
//
// Two passes over a parsed module erase naming choices while keeping
// structure:
//
//   1. `FunctionCanonicalizer` renames `def`s to `func0`, `func1`, ... and
//      their positional parameters to `arg0`, `arg1`, ..., drops a leading
//      literal statement from each rewritten body, and applies the optional
//      function-name filter.
//   2. `IdentifierCanonicalizer` renames every name reference to `id0`,
//      `id1`, ... in order of first use.
//
// The function pass must run first: it renames parameters by position, and
// the identifier pass would otherwise have already consumed the original
// parameter spellings from references in the body.
//
// Each call builds fresh rename maps, so canonicalizing the same source twice
// gives the same text, and the two files of a pair never influence each other.

mod functions;
mod identifiers;
mod rename;

pub use functions::FunctionCanonicalizer;
pub use identifiers::IdentifierCanonicalizer;
pub use rename::{NameScheme, RenameMap, parameter_name};

use crate::error::ParseDiagnostic;
use crate::model::ast::Module;
use crate::model::transform::fold_module;
use crate::model::unparse::unparse;
use crate::reader::parse_module_named;

/// Canonicalize a parsed module and render it as canonical text.
///
/// `filter`, when set to a non-empty name, removes every function
/// definition with a different name.
pub fn canonicalize(module: Module, filter: Option<&str>) -> String {
    let mut functions = RenameMap::functions();
    let module = fold_module(&mut FunctionCanonicalizer::new(&mut functions, filter), module);

    let mut identifiers = RenameMap::identifiers();
    let module = fold_module(&mut IdentifierCanonicalizer::new(&mut identifiers), module);

    unparse(&module)
}

/// Parse `source` and canonicalize it. `name` labels the source in
/// diagnostics.
pub fn canonicalize_source(
    source: &str,
    name: &str,
    filter: Option<&str>,
) -> Result<String, ParseDiagnostic> {
    let module = parse_module_named(source, name)?;
    Ok(canonicalize(module, filter))
}
