pub mod decl;
pub mod expr;
pub mod stmt;

pub use decl::{ConstDecl, Decl, FuncDecl, Param, StructureDecl};
pub use expr::Expr;
pub use stmt::{IfBranch, Stmt};

/// A type expression: either a builtin/structure name or a list of one.
/// Two `TypeRef`s are equal iff their shape and names match; this is the
/// parse-time counterpart of the runtime `TypeDescriptor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
  Named(String),
  List(Box<TypeRef>),
}

impl std::fmt::Display for TypeRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TypeRef::Named(name) => write!(f, "{}", name),
      TypeRef::List(elem) => write!(f, "{}[]", elem),
    }
  }
}
