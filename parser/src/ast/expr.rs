use std::fmt;

use scanner::token::Token;

use crate::ast::TypeRef;

#[derive(Debug, Clone)]
pub enum Expr {
  Number(Token, f64),
  Str(Token, String),
  Boolean(Token, bool),
  Nothing(Token),
  Identifier(Token),
  /// A bare type reference used as a value position, e.g. `Number` with no
  /// trailing `[`/`(`/`{`.
  TypeRefExpr(Token, TypeRef),
  ListLiteral {
    bracket: Token,
    element_type: TypeRef,
    elements: Vec<Expr>,
  },
  StructureLiteral {
    type_name: Token,
    fields: Vec<(Token, Expr)>,
  },
  Call {
    callee: Token,
    paren: Token,
    arguments: Vec<Expr>,
  },
  Binary {
    left: Box<Expr>,
    operator: Token,
    right: Box<Expr>,
  },
  Unary {
    operator: Token,
    operand: Box<Expr>,
  },
  TypeCast {
    keyword: Token,
    type_ref: TypeRef,
    operand: Box<Expr>,
  },
  Subscript {
    bracket: Token,
    target: Box<Expr>,
    index: Box<Expr>,
  },
  FieldAccess {
    field: Token,
    parent: Box<Expr>,
  },
}

impl Expr {
  /// The token most representative of this expression's source position,
  /// used for diagnostics that don't have a more specific anchor.
  pub fn anchor(&self) -> &Token {
    match self {
      Expr::Number(t, _) => t,
      Expr::Str(t, _) => t,
      Expr::Boolean(t, _) => t,
      Expr::Nothing(t) => t,
      Expr::Identifier(t) => t,
      Expr::TypeRefExpr(t, _) => t,
      Expr::ListLiteral { bracket, .. } => bracket,
      Expr::StructureLiteral { type_name, .. } => type_name,
      Expr::Call { callee, .. } => callee,
      Expr::Binary { operator, .. } => operator,
      Expr::Unary { operator, .. } => operator,
      Expr::TypeCast { keyword, .. } => keyword,
      Expr::Subscript { bracket, .. } => bracket,
      Expr::FieldAccess { field, .. } => field,
    }
  }
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expr::Number(_, value) => write!(f, "{}", value),
      Expr::Str(_, value) => write!(f, "\"{}\"", value),
      Expr::Boolean(_, value) => write!(f, "{}", value),
      Expr::Nothing(_) => write!(f, "Nothing"),
      Expr::Identifier(token) => write!(f, "{}", token.lexeme),
      Expr::TypeRefExpr(_, type_ref) => write!(f, "{}", type_ref),
      Expr::ListLiteral { element_type, elements, .. } => {
        let items = elements.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ");
        write!(f, "{}[{}]", element_type, items)
      },
      Expr::StructureLiteral { type_name, fields } => {
        let items = fields
          .iter()
          .map(|(name, expr)| format!("{}: {}", name.lexeme, expr))
          .collect::<Vec<_>>()
          .join(", ");
        write!(f, "{}{{{}}}", type_name.lexeme, items)
      },
      Expr::Call { callee, arguments, .. } => {
        let args = arguments.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
        write!(f, "{}({})", callee.lexeme, args)
      },
      Expr::Binary { left, operator, right } => write!(f, "({} {} {})", left, operator.lexeme, right),
      Expr::Unary { operator, operand } => write!(f, "({}{})", operator.lexeme, operand),
      Expr::TypeCast { type_ref, operand, .. } => write!(f, "{}({})", type_ref, operand),
      Expr::Subscript { target, index, .. } => write!(f, "{}[{}]", target, index),
      Expr::FieldAccess { parent, field } => write!(f, "{}.{}", parent, field.lexeme),
    }
  }
}

impl Expr {
  /// Prints this expression as an ASCII tree, for the `print-ast` command.
  pub fn print_tree(&self) {
    self.build_tree("", true);
  }

  pub(crate) fn build_tree(&self, prefix: &str, is_last: bool) {
    let connector = if is_last { "└── " } else { "├── " };
    let extension = if is_last { "    " } else { "│   " };
    let child_prefix = format!("{}{}", prefix, extension);

    match self {
      Expr::Number(_, value) => println!("{}{}Number({})", prefix, connector, value),
      Expr::Str(_, value) => println!("{}{}String({:?})", prefix, connector, value),
      Expr::Boolean(_, value) => println!("{}{}Boolean({})", prefix, connector, value),
      Expr::Nothing(_) => println!("{}{}Nothing", prefix, connector),
      Expr::Identifier(token) => println!("{}{}Identifier({})", prefix, connector, token.lexeme),
      Expr::TypeRefExpr(_, type_ref) => println!("{}{}TypeRef({})", prefix, connector, type_ref),
      Expr::ListLiteral { element_type, elements, .. } => {
        println!("{}{}ListLiteral({})", prefix, connector, element_type);
        for (i, elem) in elements.iter().enumerate() {
          elem.build_tree(&child_prefix, i == elements.len() - 1);
        }
      },
      Expr::StructureLiteral { type_name, fields } => {
        println!("{}{}StructureLiteral({})", prefix, connector, type_name.lexeme);
        for (i, (name, value)) in fields.iter().enumerate() {
          println!("{}{}field {}:", child_prefix, if i == fields.len() - 1 { "└── " } else { "├── " }, name.lexeme);
          value.build_tree(&child_prefix, i == fields.len() - 1);
        }
      },
      Expr::Call { callee, arguments, .. } => {
        println!("{}{}Call({})", prefix, connector, callee.lexeme);
        for (i, arg) in arguments.iter().enumerate() {
          arg.build_tree(&child_prefix, i == arguments.len() - 1);
        }
      },
      Expr::Binary { left, operator, right } => {
        println!("{}{}Binary({})", prefix, connector, operator.lexeme);
        left.build_tree(&child_prefix, false);
        right.build_tree(&child_prefix, true);
      },
      Expr::Unary { operator, operand } => {
        println!("{}{}Unary({})", prefix, connector, operator.lexeme);
        operand.build_tree(&child_prefix, true);
      },
      Expr::TypeCast { type_ref, operand, .. } => {
        println!("{}{}TypeCast({})", prefix, connector, type_ref);
        operand.build_tree(&child_prefix, true);
      },
      Expr::Subscript { target, index, .. } => {
        println!("{}{}Subscript", prefix, connector);
        target.build_tree(&child_prefix, false);
        index.build_tree(&child_prefix, true);
      },
      Expr::FieldAccess { parent, field } => {
        println!("{}{}FieldAccess({})", prefix, connector, field.lexeme);
        parent.build_tree(&child_prefix, true);
      },
    }
  }
}
