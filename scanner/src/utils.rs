use diagnostic::{
  diagnostic::{Diagnostic, Label, Span},
  diagnostic_code::DiagnosticCode,
  DiagnosticEngine,
};

use crate::{
  token::{
    types::{Literal, TokenType},
    Token,
  },
  Scanner,
};

impl Scanner {
  /// Drives the scanner to completion, pushing tokens (and emitting
  /// diagnostics for unrecognized input) until the source is exhausted.
  pub fn get_tokens(&mut self, engine: &mut DiagnosticEngine) {
    while !self.is_at_end() {
      self.start = self.current;
      let token_line = self.line;
      let token_column = self.column;
      let c = self.advance();

      let token = match c {
        '(' => Some(TokenType::LeftParen),
        ')' => Some(TokenType::RightParen),
        '[' => Some(TokenType::LeftBracket),
        ']' => Some(TokenType::RightBracket),
        '{' => Some(TokenType::LeftBrace),
        '}' => Some(TokenType::RightBrace),
        ',' => Some(TokenType::Comma),
        ';' => Some(TokenType::SemiColon),
        ':' => Some(TokenType::Colon),
        '.' => Some(TokenType::Dot),
        '+' => Some(TokenType::Plus),
        '*' => Some(TokenType::Star),
        '/' => Some(TokenType::Divide),
        '%' => Some(TokenType::Modulus),

        // `->` is matched before the bare `-` prefix it shares.
        '-' => {
          if self.match_char(&'>') {
            self.advance();
            Some(TokenType::Arrow)
          } else {
            Some(TokenType::Minus)
          }
        },

        '!' => {
          if self.match_char(&'=') {
            self.advance();
            Some(TokenType::BangEqual)
          } else {
            Some(TokenType::Bang)
          }
        },
        '=' => {
          if self.match_char(&'=') {
            self.advance();
            Some(TokenType::EqualEqual)
          } else {
            Some(TokenType::Equal)
          }
        },
        '<' => {
          if self.match_char(&'=') {
            self.advance();
            Some(TokenType::LessEqual)
          } else {
            Some(TokenType::Less)
          }
        },
        '>' => {
          if self.match_char(&'=') {
            self.advance();
            Some(TokenType::GreaterEqual)
          } else {
            Some(TokenType::Greater)
          }
        },

        '"' => Some(self.tokenize_string(engine, token_line, token_column)),

        // `#` consumes through (but not past) the next newline.
        '#' => {
          while let Some(ch) = self.peek() {
            if ch == '\n' {
              break;
            }
            self.advance();
          }
          None
        },

        ' ' | '\t' | '\r' => None,

        '\n' => {
          self.line += 1;
          self.column = 1;
          None
        },

        'a'..='z' => Some(self.tokenize_identifier()),
        'A'..='Z' => Some(self.tokenize_type_name()),
        '0'..='9' => Some(self.tokenize_number()),

        _ => {
          let diagnostic = Diagnostic::new(
            DiagnosticCode::InvalidCharacter,
            format!("unexpected character: {:?}", c),
          )
          .with_label(Label::primary(
            Span {
              file: "input".to_string(),
              line: token_line,
              column: token_column,
              length: 1,
            },
            None,
          ));

          engine.emit(diagnostic);
          None
        },
      };

      if let Some(token_type) = token {
        self.add_token(token_type, token_line, token_column);
      }
    }

    self.tokens.push(Token::new(
      TokenType::Eof,
      String::new(),
      Literal::Nothing,
      (self.line, self.column),
    ));
  }

  /// Tokenizes `[a-z][a-zA-Z0-9_]*`, classifying it as a keyword, a boolean
  /// literal, or a plain identifier.
  fn tokenize_identifier(&mut self) -> TokenType {
    while let Some(ch) = self.peek() {
      if ch.is_ascii_alphanumeric() || ch == '_' {
        self.advance();
      } else {
        break;
      }
    }

    match self.get_current_lexeme() {
      "constant" => TokenType::Constant,
      "function" => TokenType::Function,
      "structure" => TokenType::Structure,
      "variable" => TokenType::Variable,
      "return" => TokenType::Return,
      "if" => TokenType::If,
      "else" => TokenType::Else,
      "while" => TokenType::While,
      "for" => TokenType::For,
      "in" => TokenType::In,
      "break" => TokenType::Break,
      "continue" => TokenType::Continue,
      "true" | "false" => TokenType::Boolean,
      _ => TokenType::Identifier,
    }
  }

  /// Tokenizes `[A-Z][a-zA-Z0-9_]*`, Sol's type-name lexical class.
  fn tokenize_type_name(&mut self) -> TokenType {
    while let Some(ch) = self.peek() {
      if ch.is_ascii_alphanumeric() || ch == '_' {
        self.advance();
      } else {
        break;
      }
    }

    TokenType::TypeName
  }

  /// Tokenizes a decimal integer sequence. Fractional and exponent forms
  /// are not part of the grammar.
  fn tokenize_number(&mut self) -> TokenType {
    while let Some(ch) = self.peek() {
      if ch.is_ascii_digit() {
        self.advance();
      } else {
        break;
      }
    }

    TokenType::Number
  }

  /// Tokenizes a double-quoted string literal. No escape processing; a
  /// newline before the closing quote is a lexical error.
  fn tokenize_string(&mut self, engine: &mut DiagnosticEngine, start_line: usize, start_column: usize) -> TokenType {
    loop {
      match self.peek() {
        None => {
          let diagnostic = Diagnostic::new(DiagnosticCode::UnterminatedString, "unterminated string literal".to_string())
            .with_label(Label::primary(
              Span {
                file: "input".to_string(),
                line: start_line,
                column: start_column,
                length: self.current - self.start,
              },
              Some("reached end of file before the closing '\"'".to_string()),
            ));
          engine.emit(diagnostic);
          break;
        },
        Some('"') => {
          self.advance();
          break;
        },
        Some('\n') => {
          let diagnostic = Diagnostic::new(DiagnosticCode::UnterminatedString, "unterminated string literal".to_string())
            .with_label(Label::primary(
              Span {
                file: "input".to_string(),
                line: start_line,
                column: start_column,
                length: self.current - self.start,
              },
              Some("newline is not allowed inside a string literal".to_string()),
            ));
          engine.emit(diagnostic);
          break;
        },
        Some(_) => {
          self.advance();
        },
      }
    }

    TokenType::String
  }

  /// Builds and pushes the token for `token_type`, deriving its lexeme
  /// (and, for numbers/booleans, its parsed value) from the scanned span.
  fn add_token(&mut self, token_type: TokenType, line: usize, column: usize) {
    let raw = self.get_current_lexeme().to_string();

    let (lexeme, literal) = match token_type {
      TokenType::String => {
        let inner = if raw.len() >= 2 {
          raw[1..raw.len() - 1].to_string()
        } else {
          String::new()
        };
        (inner, Literal::String)
      },
      TokenType::Number => {
        let value: f64 = raw.parse().unwrap_or(0.0);
        (raw, Literal::Number(value))
      },
      TokenType::Boolean => {
        let value = raw == "true";
        (raw, Literal::Boolean(value))
      },
      _ => (raw, Literal::Nothing),
    };

    self.tokens.push(Token::new(token_type, lexeme, literal, (line, column)));
  }

  fn is_at_end(&self) -> bool {
    self.current == self.source.len()
  }

  /// Returns the next char and advances the cursor and column counter.
  fn advance(&mut self) -> char {
    let ch = self.peek().unwrap();
    self.current += ch.len_utf8();
    self.column += 1;
    ch
  }

  fn peek(&self) -> Option<char> {
    if self.is_at_end() {
      return None;
    }
    self.source[self.current..].chars().next()
  }

  fn peek_next(&self) -> Option<char> {
    let mut chars = self.source[self.current..].chars();
    chars.next()?;
    chars.next()
  }

  fn get_current_lexeme(&self) -> &str {
    &self.source[self.start..self.current]
  }

  /// Checks the next char without consuming it.
  fn match_char(&self, expected: &char) -> bool {
    match self.peek() {
      Some(ch) => &ch == expected,
      None => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scan(source: &str) -> (Vec<Token>, DiagnosticEngine) {
    let mut scanner = Scanner::new(source);
    let mut engine = DiagnosticEngine::new();
    scanner.get_tokens(&mut engine);
    (scanner.tokens, engine)
  }

  fn kinds(tokens: &[Token]) -> Vec<TokenType> {
    tokens.iter().map(|t| t.token_type).collect()
  }

  #[test]
  fn scans_keywords_and_identifiers() {
    let (tokens, engine) = scan("function main variable x");
    assert!(!engine.has_errors());
    assert_eq!(
      kinds(&tokens),
      vec![
        TokenType::Function,
        TokenType::Identifier,
        TokenType::Variable,
        TokenType::Identifier,
        TokenType::Eof,
      ]
    );
  }

  #[test]
  fn distinguishes_identifiers_from_type_names() {
    let (tokens, _) = scan("Number count");
    assert_eq!(kinds(&tokens), vec![TokenType::TypeName, TokenType::Identifier, TokenType::Eof]);
  }

  #[test]
  fn scans_two_char_operators_before_their_prefix() {
    let (tokens, _) = scan("-> != == <= >=");
    assert_eq!(
      kinds(&tokens),
      vec![
        TokenType::Arrow,
        TokenType::BangEqual,
        TokenType::EqualEqual,
        TokenType::LessEqual,
        TokenType::GreaterEqual,
        TokenType::Eof,
      ]
    );
  }

  #[test]
  fn strips_quotes_from_string_literals() {
    let (tokens, engine) = scan(r#""hello""#);
    assert!(!engine.has_errors());
    assert_eq!(tokens[0].lexeme, "hello");
  }

  #[test]
  fn parses_number_literals_as_integers() {
    let (tokens, _) = scan("42");
    assert_eq!(tokens[0].literal, Literal::Number(42.0));
  }

  #[test]
  fn skips_hash_comments_to_end_of_line() {
    let (tokens, _) = scan("variable x # trailing remark\nvariable y");
    assert_eq!(
      kinds(&tokens),
      vec![
        TokenType::Variable,
        TokenType::Identifier,
        TokenType::Variable,
        TokenType::Identifier,
        TokenType::Eof,
      ]
    );
  }

  #[test]
  fn hash_at_eof_with_no_trailing_newline_is_well_defined() {
    let (tokens, engine) = scan("variable x #no newline at end");
    assert!(!engine.has_errors());
    assert_eq!(kinds(&tokens), vec![TokenType::Variable, TokenType::Identifier, TokenType::Eof]);
  }

  #[test]
  fn unterminated_string_emits_a_diagnostic() {
    let (_, engine) = scan("\"unterminated");
    assert!(engine.has_errors());
  }

  #[test]
  fn newline_inside_string_is_an_error() {
    let (_, engine) = scan("\"broken\nstring\"");
    assert!(engine.has_errors());
  }

  #[test]
  fn token_positions_point_at_the_start_of_the_lexeme() {
    let (tokens, _) = scan("variable\n  count");
    let ident = &tokens[1];
    assert_eq!(ident.position, (2, 3));
  }

  #[test]
  fn unrecognized_byte_is_reported() {
    let (_, engine) = scan("variable x = @;");
    assert!(engine.has_errors());
  }

  #[test]
  fn empty_program_scans_to_just_eof() {
    let (tokens, engine) = scan("");
    assert!(!engine.has_errors());
    assert_eq!(kinds(&tokens), vec![TokenType::Eof]);
  }
}
