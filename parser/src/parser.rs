use diagnostic::{
  diagnostic::{Diagnostic, Label},
  diagnostic_code::DiagnosticCode,
  DiagnosticEngine,
};
use scanner::token::{types::TokenType, Token};

use crate::ast::{ConstDecl, Decl, Expr, FuncDecl, IfBranch, Param, Stmt, StructureDecl, TypeRef};

/// A parse failure has already been emitted to the `DiagnosticEngine` by the
/// time this is returned; it carries no payload of its own.
#[derive(Debug)]
pub struct ParseError;

pub type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser with a single mutable index and one-token
/// bounded lookahead over the token sequence produced by the scanner.
pub struct Parser {
  tokens: Vec<Token>,
  current: usize,
}

impl Parser {
  pub fn new(tokens: Vec<Token>) -> Self {
    Self { tokens, current: 0 }
  }

  /// Parses the whole token stream into top-level declarations. Stops at
  /// the first parse error (already emitted to `engine`), returning
  /// whatever declarations parsed successfully before it.
  pub fn parse(&mut self, engine: &mut DiagnosticEngine) -> Vec<Decl> {
    let mut decls = Vec::new();
    while !self.is_at_end() {
      match self.parse_decl(engine) {
        Ok(decl) => decls.push(decl),
        Err(_) => break,
      }
    }
    decls
  }

  fn parse_decl(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Decl> {
    match self.peek().token_type {
      TokenType::Constant => self.parse_const_decl(engine),
      TokenType::Function => self.parse_func_decl(engine),
      TokenType::Structure => self.parse_struct_decl(engine),
      _ => Err(self.error(
        engine,
        DiagnosticCode::UnexpectedToken,
        format!("expected a declaration, found {}", self.peek().token_type),
      )),
    }
  }

  fn parse_const_decl(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Decl> {
    self.advance();
    let name = self.consume(TokenType::Identifier, engine, "constant name")?;
    self.consume(TokenType::Equal, engine, "'=' after constant name")?;
    let initializer = self.parse_expr(engine)?;
    self.consume(TokenType::SemiColon, engine, "';' after constant declaration")?;
    Ok(Decl::Const(ConstDecl { name, initializer }))
  }

  fn parse_func_decl(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Decl> {
    self.advance();
    let name = self.consume(TokenType::Identifier, engine, "function name")?;
    self.consume(TokenType::LeftParen, engine, "'(' after function name")?;
    let params = self.parse_params(engine)?;
    self.consume(TokenType::RightParen, engine, "closing ')'")?;
    let return_type = if self.check(TokenType::Arrow) {
      self.advance();
      Some(self.parse_type_ref(engine)?)
    } else {
      None
    };
    let body = self.parse_block(engine)?;
    Ok(Decl::Func(FuncDecl {
      name,
      params,
      return_type,
      body,
    }))
  }

  fn parse_struct_decl(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Decl> {
    self.advance();
    let name = self.consume(TokenType::TypeName, engine, "structure name")?;
    self.consume(TokenType::LeftBrace, engine, "'{' to begin structure body")?;
    let mut fields = Vec::new();
    while !self.check(TokenType::RightBrace) && !self.is_at_end() {
      let field_name = self.consume(TokenType::Identifier, engine, "field name")?;
      let field_type = self.parse_type_ref(engine)?;
      self.consume(TokenType::SemiColon, engine, "';' after field declaration")?;
      fields.push((field_name, field_type));
    }
    self.consume(TokenType::RightBrace, engine, "closing '}'")?;
    Ok(Decl::Structure(StructureDecl { name, fields }))
  }

  fn parse_params(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Vec<Param>> {
    let mut params = Vec::new();
    if !self.check(TokenType::RightParen) {
      loop {
        let name = self.consume(TokenType::Identifier, engine, "parameter name")?;
        let type_ref = self.parse_type_ref(engine)?;
        params.push(Param { name, type_ref });
        if self.check(TokenType::Comma) {
          self.advance();
          if self.check(TokenType::RightParen) {
            break;
          }
        } else {
          break;
        }
      }
    }
    Ok(params)
  }

  /// Parses a type reference: a type name, optionally followed by one or
  /// more empty `[]` suffixes denoting a list type.
  fn parse_type_ref(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<TypeRef> {
    let name = self.consume(TokenType::TypeName, engine, "type name")?;
    let mut type_ref = TypeRef::Named(name.lexeme);
    while self.check(TokenType::LeftBracket) {
      self.advance();
      self.consume(TokenType::RightBracket, engine, "closing ']' in list type")?;
      type_ref = TypeRef::List(Box::new(type_ref));
    }
    Ok(type_ref)
  }

  fn parse_block(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Vec<Stmt>> {
    self.consume(TokenType::LeftBrace, engine, "'{' to begin block")?;
    let mut stmts = Vec::new();
    while !self.check(TokenType::RightBrace) && !self.is_at_end() {
      stmts.push(self.parse_stmt(engine)?);
    }
    self.consume(TokenType::RightBrace, engine, "closing '}'")?;
    Ok(stmts)
  }

  fn parse_stmt(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    match self.peek().token_type {
      TokenType::If => self.parse_if_chain(engine),
      TokenType::While => self.parse_while(engine),
      TokenType::For => self.parse_for(engine),
      TokenType::Break => {
        let token = self.advance();
        self.consume(TokenType::SemiColon, engine, "';' after 'break'")?;
        Ok(Stmt::Break(token))
      },
      TokenType::Continue => {
        let token = self.advance();
        self.consume(TokenType::SemiColon, engine, "';' after 'continue'")?;
        Ok(Stmt::Continue(token))
      },
      TokenType::Return => self.parse_return(engine),
      TokenType::Variable => self.parse_var_decl(engine),
      TokenType::Identifier if self.peek_at(1).token_type == TokenType::Equal => self.parse_assign(engine),
      _ => self.parse_expr_stmt(engine),
    }
  }

  fn parse_if_chain(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    self.advance();
    let condition = self.parse_expr(engine)?;
    let body = self.parse_block(engine)?;
    let if_branch = IfBranch { condition, body };

    let mut else_ifs = Vec::new();
    let mut else_branch = None;
    while self.check(TokenType::Else) {
      self.advance();
      if self.check(TokenType::If) {
        self.advance();
        let condition = self.parse_expr(engine)?;
        let body = self.parse_block(engine)?;
        else_ifs.push(IfBranch { condition, body });
      } else {
        else_branch = Some(self.parse_block(engine)?);
        break;
      }
    }

    Ok(Stmt::ConditionalChain {
      if_branch,
      else_ifs,
      else_branch,
    })
  }

  fn parse_while(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    self.advance();
    let condition = self.parse_expr(engine)?;
    let body = self.parse_block(engine)?;
    Ok(Stmt::While { condition, body })
  }

  fn parse_for(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    self.advance();
    let index_name = self.consume(TokenType::Identifier, engine, "loop index name")?;
    self.consume(TokenType::Comma, engine, "',' between index and element names")?;
    let element_name = self.consume(TokenType::Identifier, engine, "loop element name")?;
    self.consume(TokenType::In, engine, "'in'")?;
    let iterable = self.parse_expr(engine)?;
    let body = self.parse_block(engine)?;
    Ok(Stmt::For {
      index_name,
      element_name,
      iterable,
      body,
    })
  }

  fn parse_return(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    let keyword = self.advance();
    let expr = if self.check(TokenType::SemiColon) { None } else { Some(self.parse_expr(engine)?) };
    self.consume(TokenType::SemiColon, engine, "';' after return statement")?;
    Ok(Stmt::Return { keyword, expr })
  }

  fn parse_var_decl(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    self.advance();
    let name = self.consume(TokenType::Identifier, engine, "variable name")?;
    self.consume(TokenType::Equal, engine, "'=' after variable name")?;
    let expr = self.parse_expr(engine)?;
    self.consume(TokenType::SemiColon, engine, "';' after variable declaration")?;
    Ok(Stmt::var_decl(name, expr))
  }

  fn parse_assign(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    let name = self.advance();
    self.consume(TokenType::Equal, engine, "'=' in assignment")?;
    let expr = self.parse_expr(engine)?;
    self.consume(TokenType::SemiColon, engine, "';' after assignment")?;
    Ok(Stmt::Assign { name, expr })
  }

  fn parse_expr_stmt(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    let expr = self.parse_expr(engine)?;
    self.consume(TokenType::SemiColon, engine, "';' after expression statement")?;
    Ok(Stmt::Bare(expr))
  }

  fn parse_expr(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    self.parse_equality(engine)
  }

  fn parse_equality(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.parse_comparison(engine)?;
    while matches!(self.peek().token_type, TokenType::EqualEqual | TokenType::BangEqual) {
      let operator = self.advance();
      let right = self.parse_comparison(engine)?;
      expr = Expr::Binary {
        left: Box::new(expr),
        operator,
        right: Box::new(right),
      };
    }
    Ok(expr)
  }

  fn parse_comparison(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.parse_term(engine)?;
    while matches!(
      self.peek().token_type,
      TokenType::Less | TokenType::LessEqual | TokenType::Greater | TokenType::GreaterEqual
    ) {
      let operator = self.advance();
      let right = self.parse_term(engine)?;
      expr = Expr::Binary {
        left: Box::new(expr),
        operator,
        right: Box::new(right),
      };
    }
    Ok(expr)
  }

  fn parse_term(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.parse_factor(engine)?;
    while matches!(self.peek().token_type, TokenType::Plus | TokenType::Minus) {
      let operator = self.advance();
      let right = self.parse_factor(engine)?;
      expr = Expr::Binary {
        left: Box::new(expr),
        operator,
        right: Box::new(right),
      };
    }
    Ok(expr)
  }

  /// Left-associative: the accumulator is reassigned in a loop rather than
  /// recursing into `factor` on the right, so `6 / 3 / 2` parses as
  /// `(6 / 3) / 2`.
  fn parse_factor(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.parse_unary(engine)?;
    while matches!(self.peek().token_type, TokenType::Star | TokenType::Divide | TokenType::Modulus) {
      let operator = self.advance();
      let right = self.parse_unary(engine)?;
      expr = Expr::Binary {
        left: Box::new(expr),
        operator,
        right: Box::new(right),
      };
    }
    Ok(expr)
  }

  fn parse_unary(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    if matches!(self.peek().token_type, TokenType::Bang | TokenType::Minus) {
      let operator = self.advance();
      let operand = self.parse_unary(engine)?;
      return Ok(Expr::Unary {
        operator,
        operand: Box::new(operand),
      });
    }
    self.parse_call(engine)
  }

  /// A call's callee must be a bare name: Sol has no first-class functions,
  /// so `(...)` is only meaningful directly after an identifier. Subscript
  /// and field-access postfixes compose freely with each other and with a
  /// preceding call's result.
  fn parse_call(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.parse_primary(engine)?;
    loop {
      if self.check(TokenType::LeftParen) {
        match expr {
          Expr::Identifier(callee) => {
            self.advance();
            let arguments = self.parse_args(engine)?;
            let paren = self.tokens[self.current - 1].clone();
            expr = Expr::Call { callee, paren, arguments };
          },
          _ => {
            return Err(self.error(
              engine,
              DiagnosticCode::ExpectedIdentifier,
              "only a named function can be called".to_string(),
            ));
          },
        }
      } else if self.check(TokenType::Dot) {
        self.advance();
        let field = self.consume(TokenType::Identifier, engine, "field name")?;
        expr = Expr::FieldAccess {
          parent: Box::new(expr),
          field,
        };
      } else if self.check(TokenType::LeftBracket) {
        let bracket = self.advance();
        let index = self.parse_expr(engine)?;
        self.consume(TokenType::RightBracket, engine, "closing ']'")?;
        expr = Expr::Subscript {
          bracket,
          target: Box::new(expr),
          index: Box::new(index),
        };
      } else {
        break;
      }
    }
    Ok(expr)
  }

  fn parse_args(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Vec<Expr>> {
    let mut args = Vec::new();
    if !self.check(TokenType::RightParen) {
      loop {
        args.push(self.parse_expr(engine)?);
        if self.check(TokenType::Comma) {
          self.advance();
          if self.check(TokenType::RightParen) {
            break;
          }
        } else {
          break;
        }
      }
    }
    self.consume(TokenType::RightParen, engine, "closing ')'")?;
    Ok(args)
  }

  fn parse_list_body(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Vec<Expr>> {
    let mut elements = Vec::new();
    if !self.check(TokenType::RightBracket) {
      loop {
        elements.push(self.parse_expr(engine)?);
        if self.check(TokenType::Comma) {
          self.advance();
          if self.check(TokenType::RightBracket) {
            break;
          }
        } else {
          break;
        }
      }
    }
    Ok(elements)
  }

  fn parse_struct_body(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Vec<(Token, Expr)>> {
    let mut fields = Vec::new();
    if !self.check(TokenType::RightBrace) {
      loop {
        let name = self.consume(TokenType::Identifier, engine, "field name")?;
        self.consume(TokenType::Colon, engine, "':' after field name")?;
        let value = self.parse_expr(engine)?;
        fields.push((name, value));
        if self.check(TokenType::Comma) {
          self.advance();
          if self.check(TokenType::RightBrace) {
            break;
          }
        } else {
          break;
        }
      }
    }
    Ok(fields)
  }

  fn parse_primary(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let token = self.peek().clone();
    match token.token_type {
      TokenType::String => {
        self.advance();
        let text = token.lexeme.clone();
        Ok(Expr::Str(token, text))
      },
      TokenType::Number => {
        self.advance();
        let value = match token.literal {
          scanner::token::types::Literal::Number(v) => v,
          _ => 0.0,
        };
        Ok(Expr::Number(token, value))
      },
      TokenType::Boolean => {
        self.advance();
        let value = token.lexeme == "true";
        Ok(Expr::Boolean(token, value))
      },
      TokenType::LeftParen => {
        self.advance();
        let inner = self.parse_expr(engine)?;
        self.consume(TokenType::RightParen, engine, "closing ')'")?;
        Ok(inner)
      },
      TokenType::TypeName => {
        self.advance();
        let type_ref = TypeRef::Named(token.lexeme.clone());
        if self.check(TokenType::LeftBracket) {
          let bracket = self.advance();
          let elements = self.parse_list_body(engine)?;
          self.consume(TokenType::RightBracket, engine, "closing ']'")?;
          Ok(Expr::ListLiteral {
            bracket,
            element_type: type_ref,
            elements,
          })
        } else if self.check(TokenType::LeftParen) {
          self.advance();
          let operand = self.parse_expr(engine)?;
          self.consume(TokenType::RightParen, engine, "closing ')'")?;
          Ok(Expr::TypeCast {
            keyword: token,
            type_ref,
            operand: Box::new(operand),
          })
        } else if self.check(TokenType::LeftBrace) {
          self.advance();
          let fields = self.parse_struct_body(engine)?;
          self.consume(TokenType::RightBrace, engine, "closing '}'")?;
          Ok(Expr::StructureLiteral {
            type_name: token,
            fields,
          })
        } else {
          Ok(Expr::TypeRefExpr(token, type_ref))
        }
      },
      TokenType::Identifier => {
        self.advance();
        Ok(Expr::Identifier(token))
      },
      _ => Err(self.error(
        engine,
        DiagnosticCode::ExpectedExpression,
        format!("expected an expression, found {}", token.token_type),
      )),
    }
  }

  fn peek(&self) -> &Token {
    &self.tokens[self.current]
  }

  fn peek_at(&self, offset: usize) -> &Token {
    let idx = (self.current + offset).min(self.tokens.len() - 1);
    &self.tokens[idx]
  }

  fn check(&self, token_type: TokenType) -> bool {
    self.peek().token_type == token_type
  }

  fn is_at_end(&self) -> bool {
    self.peek().token_type == TokenType::Eof
  }

  fn advance(&mut self) -> Token {
    let token = self.tokens[self.current].clone();
    if !self.is_at_end() {
      self.current += 1;
    }
    token
  }

  fn consume(&mut self, token_type: TokenType, engine: &mut DiagnosticEngine, what: &str) -> ParseResult<Token> {
    if self.check(token_type) {
      Ok(self.advance())
    } else {
      Err(self.error(
        engine,
        DiagnosticCode::ExpectedToken,
        format!("expected {}, found {}", what, self.peek().token_type),
      ))
    }
  }

  fn error(&self, engine: &mut DiagnosticEngine, code: DiagnosticCode, message: String) -> ParseError {
    let token = self.peek();
    let mut diagnostic = Diagnostic::new(code, message).with_label(Label::primary(token.to_span(), None));
    if self.current > 0 {
      let previous = &self.tokens[self.current - 1];
      diagnostic = diagnostic.with_note(format!("previous token was {}", previous.token_type));
    }
    engine.emit(diagnostic);
    ParseError
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use scanner::Scanner;

  fn parse(source: &str) -> (Vec<Decl>, DiagnosticEngine) {
    let mut engine = DiagnosticEngine::new();
    let mut scanner = Scanner::new(source);
    scanner.scan(&mut engine);
    let mut parser = Parser::new(scanner.tokens.clone());
    let decls = parser.parse(&mut engine);
    (decls, engine)
  }

  #[test]
  fn parses_hello_world() {
    let (decls, engine) = parse(r#"function main() { print("Hello, world!"); }"#);
    assert!(!engine.has_errors());
    assert_eq!(decls.len(), 1);
    match &decls[0] {
      Decl::Func(f) => {
        assert_eq!(f.name.lexeme, "main");
        assert_eq!(f.body.len(), 1);
      },
      _ => panic!("expected a function declaration"),
    }
  }

  #[test]
  fn factor_chain_is_left_associative() {
    let (decls, engine) = parse("function main() { variable x = 6 / 3 / 2; }");
    assert!(!engine.has_errors());
    let Decl::Func(f) = &decls[0] else { panic!("expected function") };
    let Stmt::VarDecl { expr, .. } = &f.body[0] else { panic!("expected var decl") };
    // (6 / 3) / 2, not 6 / (3 / 2).
    match expr {
      Expr::Binary { left, operator, .. } => {
        assert_eq!(operator.token_type, TokenType::Divide);
        assert!(matches!(**left, Expr::Binary { .. }));
      },
      _ => panic!("expected a binary expression"),
    }
  }

  #[test]
  fn parses_structure_declaration() {
    let (decls, engine) = parse("structure Student { name String; grade Number; }");
    assert!(!engine.has_errors());
    match &decls[0] {
      Decl::Structure(s) => {
        assert_eq!(s.name.lexeme, "Student");
        assert_eq!(s.fields.len(), 2);
        assert_eq!(s.fields[0].0.lexeme, "name");
      },
      _ => panic!("expected a structure declaration"),
    }
  }

  #[test]
  fn parses_list_literal_with_trailing_comma() {
    let (decls, engine) = parse("function main() { variable xs = Number[1, 7, 3,]; }");
    assert!(!engine.has_errors());
    let Decl::Func(f) = &decls[0] else { panic!("expected function") };
    let Stmt::VarDecl { expr, .. } = &f.body[0] else { panic!("expected var decl") };
    match expr {
      Expr::ListLiteral { elements, .. } => assert_eq!(elements.len(), 3),
      _ => panic!("expected a list literal"),
    }
  }

  #[test]
  fn parses_if_else_if_else_chain() {
    let (decls, engine) = parse(
      r#"
      function main() {
        if 1 < 2 { print("a"); } else if 2 < 1 { print("b"); } else { print("c"); }
      }
      "#,
    );
    assert!(!engine.has_errors());
    let Decl::Func(f) = &decls[0] else { panic!("expected function") };
    match &f.body[0] {
      Stmt::ConditionalChain { else_ifs, else_branch, .. } => {
        assert_eq!(else_ifs.len(), 1);
        assert!(else_branch.is_some());
      },
      _ => panic!("expected a conditional chain"),
    }
  }

  #[test]
  fn parses_for_loop_over_a_list_literal() {
    let (decls, engine) = parse("function main() { for i, n in Number[1, 2, 3] { print(String(n)); } }");
    assert!(!engine.has_errors());
    let Decl::Func(f) = &decls[0] else { panic!("expected function") };
    match &f.body[0] {
      Stmt::For { index_name, element_name, .. } => {
        assert_eq!(index_name.lexeme, "i");
        assert_eq!(element_name.lexeme, "n");
      },
      _ => panic!("expected a for loop"),
    }
  }

  #[test]
  fn parses_function_with_params_and_return_type() {
    let (decls, engine) = parse("function add(a Number, b Number) -> Number { return a + b; }");
    assert!(!engine.has_errors());
    match &decls[0] {
      Decl::Func(f) => {
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.return_type, Some(TypeRef::Named("Number".to_string())));
      },
      _ => panic!("expected a function declaration"),
    }
  }

  #[test]
  fn unexpected_token_at_top_level_is_reported() {
    let (_, engine) = parse("42;");
    assert!(engine.has_errors());
  }

  #[test]
  fn missing_closing_brace_is_reported() {
    let (_, engine) = parse("function main() { print(\"x\");");
    assert!(engine.has_errors());
  }

  #[test]
  fn deeply_nested_if_else_if_chain_parses() {
    let mut source = String::from("function main() {\n");
    for i in 0..64 {
      source.push_str(&format!("if x == {} {{ print(\"{}\");}} else ", i, i));
    }
    source.push_str("{ print(\"none\"); }\n}\n");
    let (decls, engine) = parse(&source);
    assert!(!engine.has_errors());
    let Decl::Func(f) = &decls[0] else { panic!("expected function") };
    assert_eq!(f.body.len(), 1);
  }
}
