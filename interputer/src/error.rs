use diagnostic::{
  diagnostic::{Diagnostic, Label, Span},
  diagnostic_code::DiagnosticCode,
};

/// A runtime error is always a fully-formed `Diagnostic`: undefined
/// identifier, type mismatch, duplicate declaration, reassignment of a
/// constant or unknown variable, index out of bounds, missing `main`,
/// subprocess failure, cast not implemented, field not found, and so on
/// (§7's `RuntimeError` taxon). No error is caught inside the evaluator;
/// each is raised at detection and walks the call stack via `?` until the
/// CLI catches it at the top level.
#[derive(Debug, Clone)]
pub struct RuntimeError(pub Diagnostic);

impl RuntimeError {
  pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
    Self(Diagnostic::new(code, message.into()))
  }

  pub fn at(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
    Self(Diagnostic::new(code, message.into()).with_label(Label::primary(span, None)))
  }

  pub fn with_note(mut self, note: impl Into<String>) -> Self {
    self.0 = self.0.with_note(note.into());
    self
  }

  pub fn diagnostic(self) -> Diagnostic {
    self.0
  }
}

impl std::fmt::Display for RuntimeError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: {}", self.0.code.code(), self.0.message)
  }
}

impl std::error::Error for RuntimeError {}

pub type EvalResult<T> = Result<T, RuntimeError>;
