use std::fmt;

use scanner::token::Token;

use crate::ast::Expr;

/// One arm of an `if`/`else if`/`else` chain.
#[derive(Debug, Clone)]
pub struct IfBranch {
  pub condition: Expr,
  pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
  VarDecl {
    name: Token,
    expr: Expr,
    is_constant: bool,
  },
  Assign {
    name: Token,
    expr: Expr,
  },
  Bare(Expr),
  Return {
    keyword: Token,
    expr: Option<Expr>,
  },
  Break(Token),
  Continue(Token),
  ConditionalChain {
    if_branch: IfBranch,
    else_ifs: Vec<IfBranch>,
    else_branch: Option<Vec<Stmt>>,
  },
  While {
    condition: Expr,
    body: Vec<Stmt>,
  },
  For {
    index_name: Token,
    element_name: Token,
    iterable: Expr,
    body: Vec<Stmt>,
  },
}

impl Stmt {
  pub fn var_decl(name: Token, expr: Expr) -> Self {
    Stmt::VarDecl {
      name,
      expr,
      is_constant: false,
    }
  }
}

impl fmt::Display for Stmt {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Stmt::VarDecl { name, expr, .. } => write!(f, "VarDecl({}, {})", name.lexeme, expr),
      Stmt::Assign { name, expr } => write!(f, "Assign({}, {})", name.lexeme, expr),
      Stmt::Bare(expr) => write!(f, "BareStmt({})", expr),
      Stmt::Return { expr: Some(expr), .. } => write!(f, "Return({})", expr),
      Stmt::Return { expr: None, .. } => write!(f, "Return"),
      Stmt::Break(_) => write!(f, "Break"),
      Stmt::Continue(_) => write!(f, "Continue"),
      Stmt::ConditionalChain { if_branch, .. } => write!(f, "If({})", if_branch.condition),
      Stmt::While { condition, .. } => write!(f, "While({})", condition),
      Stmt::For {
        index_name,
        element_name,
        iterable,
        ..
      } => write!(f, "For({}, {} in {})", index_name.lexeme, element_name.lexeme, iterable),
    }
  }
}

impl Stmt {
  pub fn print_tree(&self) {
    self.build_tree("", true);
  }

  pub(crate) fn build_tree(&self, prefix: &str, is_last: bool) {
    let connector = if is_last { "└── " } else { "├── " };
    let extension = if is_last { "    " } else { "│   " };
    let child_prefix = format!("{}{}", prefix, extension);

    match self {
      Stmt::VarDecl { name, expr, is_constant } => {
        let kind = if *is_constant { "ConstDecl" } else { "VarDecl" };
        println!("{}{}{}({})", prefix, connector, kind, name.lexeme);
        expr.build_tree(&child_prefix, true);
      },
      Stmt::Assign { name, expr } => {
        println!("{}{}Assign({})", prefix, connector, name.lexeme);
        expr.build_tree(&child_prefix, true);
      },
      Stmt::Bare(expr) => {
        println!("{}{}BareStmt", prefix, connector);
        expr.build_tree(&child_prefix, true);
      },
      Stmt::Return { expr, .. } => {
        println!("{}{}Return", prefix, connector);
        if let Some(expr) = expr {
          expr.build_tree(&child_prefix, true);
        }
      },
      Stmt::Break(_) => println!("{}{}Break", prefix, connector),
      Stmt::Continue(_) => println!("{}{}Continue", prefix, connector),
      Stmt::ConditionalChain {
        if_branch,
        else_ifs,
        else_branch,
      } => {
        println!("{}{}If", prefix, connector);
        print_branch(&child_prefix, "condition", if_branch);
        for else_if in else_ifs {
          print_branch(&child_prefix, "else if", else_if);
        }
        if let Some(body) = else_branch {
          println!("{}└── else:", child_prefix);
          let body_prefix = format!("{}    ", child_prefix);
          for (i, stmt) in body.iter().enumerate() {
            stmt.build_tree(&body_prefix, i == body.len() - 1);
          }
        }
      },
      Stmt::While { condition, body } => {
        println!("{}{}While", prefix, connector);
        println!("{}├── condition:", child_prefix);
        condition.build_tree(&format!("{}│   ", child_prefix), true);
        println!("{}└── body:", child_prefix);
        let body_prefix = format!("{}    ", child_prefix);
        for (i, stmt) in body.iter().enumerate() {
          stmt.build_tree(&body_prefix, i == body.len() - 1);
        }
      },
      Stmt::For {
        index_name,
        element_name,
        iterable,
        body,
      } => {
        println!("{}{}For({}, {})", prefix, connector, index_name.lexeme, element_name.lexeme);
        println!("{}├── iterable:", child_prefix);
        iterable.build_tree(&format!("{}│   ", child_prefix), true);
        println!("{}└── body:", child_prefix);
        let body_prefix = format!("{}    ", child_prefix);
        for (i, stmt) in body.iter().enumerate() {
          stmt.build_tree(&body_prefix, i == body.len() - 1);
        }
      },
    }
  }
}

fn print_branch(prefix: &str, label: &str, branch: &IfBranch) {
  println!("{}├── {}:", prefix, label);
  let inner = format!("{}│   ", prefix);
  branch.condition.build_tree(&inner, false);
  for (i, stmt) in branch.body.iter().enumerate() {
    stmt.build_tree(&inner, i == branch.body.len() - 1);
  }
}
