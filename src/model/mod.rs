pub mod ast;
pub mod transform;
pub mod unparse;
