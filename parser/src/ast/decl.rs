use std::fmt;

use scanner::token::Token;

use crate::ast::{Expr, Stmt, TypeRef};

#[derive(Debug, Clone)]
pub struct Param {
  pub name: Token,
  pub type_ref: TypeRef,
}

#[derive(Debug, Clone)]
pub struct ConstDecl {
  pub name: Token,
  pub initializer: Expr,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
  pub name: Token,
  pub params: Vec<Param>,
  pub return_type: Option<TypeRef>,
  pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct StructureDecl {
  pub name: Token,
  /// Ordered mapping from field name to declared type, in declaration order.
  pub fields: Vec<(Token, TypeRef)>,
}

#[derive(Debug, Clone)]
pub enum Decl {
  Const(ConstDecl),
  Func(FuncDecl),
  Structure(StructureDecl),
}

impl Decl {
  pub fn name(&self) -> &Token {
    match self {
      Decl::Const(d) => &d.name,
      Decl::Func(d) => &d.name,
      Decl::Structure(d) => &d.name,
    }
  }
}

impl fmt::Display for Decl {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Decl::Const(d) => write!(f, "ConstDecl({}, {})", d.name.lexeme, d.initializer),
      Decl::Func(d) => {
        let params = d
          .params
          .iter()
          .map(|p| format!("{} {}", p.name.lexeme, p.type_ref))
          .collect::<Vec<_>>()
          .join(", ");
        let ret = d.return_type.as_ref().map(|t| format!(" -> {}", t)).unwrap_or_default();
        write!(f, "FuncDecl({}({}){})", d.name.lexeme, params, ret)
      },
      Decl::Structure(d) => {
        let fields = d
          .fields
          .iter()
          .map(|(name, ty)| format!("{} {}", name.lexeme, ty))
          .collect::<Vec<_>>()
          .join("; ");
        write!(f, "StructureDecl({} {{{}}})", d.name.lexeme, fields)
      },
    }
  }
}

impl Decl {
  pub fn print_tree(&self) {
    match self {
      Decl::Const(d) => {
        println!("ConstDecl({})", d.name.lexeme);
        d.initializer.build_tree("", true);
      },
      Decl::Func(d) => {
        let params = d
          .params
          .iter()
          .map(|p| format!("{} {}", p.name.lexeme, p.type_ref))
          .collect::<Vec<_>>()
          .join(", ");
        println!("FuncDecl({}({}))", d.name.lexeme, params);
        for (i, stmt) in d.body.iter().enumerate() {
          stmt.build_tree("", i == d.body.len() - 1);
        }
      },
      Decl::Structure(d) => {
        println!("StructureDecl({})", d.name.lexeme);
        for (i, (name, ty)) in d.fields.iter().enumerate() {
          let connector = if i == d.fields.len() - 1 { "└── " } else { "├── " };
          println!("{}{} {}", connector, name.lexeme, ty);
        }
      },
    }
  }
}
