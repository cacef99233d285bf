pub mod ast;
pub mod parser;

pub use ast::{Decl, Expr, Stmt, TypeRef};
pub use parser::{ParseError, Parser};
