/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Error,
  Warning,
  Note,
  Help,
}

/// Unique identifier for each type of diagnostic. Grouped by the three Sol
/// error taxa: scan, parse, runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
  // Scan errors
  UnterminatedString,
  InvalidCharacter,

  // Parse errors
  UnexpectedToken,
  ExpectedExpression,
  ExpectedIdentifier,
  ExpectedToken,
  MissingClosingParen,
  MissingClosingBrace,
  MissingClosingBracket,

  // Runtime errors
  UndefinedIdentifier,
  TypeMismatch,
  DuplicateDeclaration,
  DuplicateField,
  DuplicateBinding,
  ReassignConstant,
  ReassignUnknownVariable,
  ReadNothing,
  IndexOutOfBounds,
  MissingMain,
  CastNotImplemented,
  FieldNotFound,
  UnknownFunction,
  WrongArgumentCount,
  NotAList,
  NotAStructure,
  UnknownType,
  BreakOutsideLoop,
  ContinueOutsideLoop,
  ReturnOutsideFunction,
  SubprocessFailed,
  IoError,
}

impl DiagnosticCode {
  pub fn code(&self) -> String {
    match self {
      Self::UnterminatedString => "E0001".to_string(),
      Self::InvalidCharacter => "E0002".to_string(),

      Self::UnexpectedToken => "E0100".to_string(),
      Self::ExpectedExpression => "E0101".to_string(),
      Self::ExpectedIdentifier => "E0102".to_string(),
      Self::ExpectedToken => "E0103".to_string(),
      Self::MissingClosingParen => "E0104".to_string(),
      Self::MissingClosingBrace => "E0105".to_string(),
      Self::MissingClosingBracket => "E0106".to_string(),

      Self::UndefinedIdentifier => "E0200".to_string(),
      Self::TypeMismatch => "E0201".to_string(),
      Self::DuplicateDeclaration => "E0202".to_string(),
      Self::DuplicateField => "E0203".to_string(),
      Self::DuplicateBinding => "E0204".to_string(),
      Self::ReassignConstant => "E0205".to_string(),
      Self::ReassignUnknownVariable => "E0206".to_string(),
      Self::ReadNothing => "E0207".to_string(),
      Self::IndexOutOfBounds => "E0208".to_string(),
      Self::MissingMain => "E0209".to_string(),
      Self::CastNotImplemented => "E0210".to_string(),
      Self::FieldNotFound => "E0211".to_string(),
      Self::UnknownFunction => "E0212".to_string(),
      Self::WrongArgumentCount => "E0213".to_string(),
      Self::NotAList => "E0214".to_string(),
      Self::NotAStructure => "E0215".to_string(),
      Self::UnknownType => "E0220".to_string(),
      Self::BreakOutsideLoop => "E0216".to_string(),
      Self::ContinueOutsideLoop => "E0217".to_string(),
      Self::ReturnOutsideFunction => "E0218".to_string(),
      Self::SubprocessFailed => "E0219".to_string(),
      Self::IoError => "E0400".to_string(),
    }
  }

  pub fn severity(&self) -> Severity {
    Severity::Error
  }
}
