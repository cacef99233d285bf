use std::collections::HashMap;

use diagnostic::{
  diagnostic::{Diagnostic, Label},
  diagnostic_code::DiagnosticCode,
  DiagnosticEngine,
};
use parser::{Decl, TypeRef};
use scanner::token::Token;

/// Reserved built-in names; user declarations cannot shadow them.
pub const BUILTIN_NAMES: &[&str] = &["print", "run"];

/// A pre-interpretation static pass over the parse tree: global
/// declaration-name uniqueness, structure field-name uniqueness, and
/// built-in name reservation (the evaluator assumes all of this already
/// holds and does not re-check it at call time).
pub struct Registrar<'a> {
  decls: &'a [Decl],
}

impl<'a> Registrar<'a> {
  pub fn new(decls: &'a [Decl]) -> Self {
    Self { decls }
  }

  /// Runs every check, emitting a diagnostic for each violation found.
  /// Callers should consult `engine.has_errors()` afterward rather than any
  /// return value here.
  pub fn analyze(&self, engine: &mut DiagnosticEngine) {
    self.check_global_names(engine);
    self.check_structure_fields(engine);
    self.check_type_references(engine);
  }

  fn check_global_names(&self, engine: &mut DiagnosticEngine) {
    let mut seen: HashMap<String, Option<&Token>> = HashMap::new();
    for name in BUILTIN_NAMES {
      seen.insert((*name).to_string(), None);
    }

    for decl in self.decls {
      let token = decl.name();
      if let Some(previous) = seen.get(&token.lexeme) {
        let mut diagnostic = Diagnostic::new(
          DiagnosticCode::DuplicateDeclaration,
          format!("'{}' is already declared", token.lexeme),
        )
        .with_label(Label::primary(token.to_span(), None));
        if let Some(previous_token) = previous {
          diagnostic = diagnostic.with_label(Label::secondary(previous_token.to_span(), Some("first declared here".to_string())));
        } else {
          diagnostic = diagnostic.with_note(format!("'{}' is a reserved built-in name", token.lexeme));
        }
        engine.emit(diagnostic);
      } else {
        seen.insert(token.lexeme.clone(), Some(token));
      }
    }
  }

  fn check_structure_fields(&self, engine: &mut DiagnosticEngine) {
    for decl in self.decls {
      let Decl::Structure(structure) = decl else { continue };
      let mut seen: HashMap<&str, &Token> = HashMap::new();
      for (field_name, _) in &structure.fields {
        if let Some(previous) = seen.get(field_name.lexeme.as_str()) {
          let diagnostic = Diagnostic::new(
            DiagnosticCode::DuplicateField,
            format!("field '{}' is already declared in structure '{}'", field_name.lexeme, structure.name.lexeme),
          )
          .with_label(Label::primary(field_name.to_span(), None))
          .with_label(Label::secondary(previous.to_span(), Some("first declared here".to_string())));
          engine.emit(diagnostic);
        } else {
          seen.insert(field_name.lexeme.as_str(), field_name);
        }
      }
    }
  }

  /// Every type reference used in a parameter, return type, or structure
  /// field must name one of the built-in scalar types or a declared
  /// structure.
  fn check_type_references(&self, engine: &mut DiagnosticEngine) {
    let structure_names: std::collections::HashSet<&str> = self
      .decls
      .iter()
      .filter_map(|d| match d {
        Decl::Structure(s) => Some(s.name.lexeme.as_str()),
        _ => None,
      })
      .collect();

    let is_known = |type_ref: &TypeRef| -> bool {
      let mut current = type_ref;
      loop {
        match current {
          TypeRef::List(elem) => current = elem,
          TypeRef::Named(name) => {
            return matches!(name.as_str(), "Nothing" | "Number" | "String" | "Boolean") || structure_names.contains(name.as_str());
          },
        }
      }
    };

    for decl in self.decls {
      match decl {
        Decl::Func(func) => {
          for param in &func.params {
            if !is_known(&param.type_ref) {
              self.report_unknown_type(engine, &param.name, &param.type_ref);
            }
          }
          if let Some(return_type) = &func.return_type {
            if !is_known(return_type) {
              self.report_unknown_type(engine, &func.name, return_type);
            }
          }
        },
        Decl::Structure(structure) => {
          for (field_name, field_type) in &structure.fields {
            if !is_known(field_type) {
              self.report_unknown_type(engine, field_name, field_type);
            }
          }
        },
        Decl::Const(_) => {},
      }
    }
  }

  fn report_unknown_type(&self, engine: &mut DiagnosticEngine, anchor: &Token, type_ref: &TypeRef) {
    let diagnostic = Diagnostic::new(DiagnosticCode::UnknownType, format!("unknown type '{}'", type_ref))
      .with_label(Label::primary(anchor.to_span(), None));
    engine.emit(diagnostic);
  }
}

#[cfg(test)]
mod tests {
  use diagnostic::DiagnosticEngine;
  use parser::Parser;
  use scanner::Scanner;

  use super::*;

  fn analyze(source: &str) -> DiagnosticEngine {
    let mut engine = DiagnosticEngine::new();
    let mut scanner = Scanner::new(source);
    scanner.scan(&mut engine);
    let mut parser = Parser::new(scanner.tokens.clone());
    let decls = parser.parse(&mut engine);
    Registrar::new(&decls).analyze(&mut engine);
    engine
  }

  #[test]
  fn accepts_a_well_formed_program() {
    let engine = analyze("function main() { print(\"hi\"); }");
    assert!(!engine.has_errors());
  }

  #[test]
  fn rejects_duplicate_function_names() {
    let engine = analyze("function main() { } function main() { }");
    assert!(engine.has_errors());
  }

  #[test]
  fn rejects_a_declaration_named_like_a_builtin() {
    let engine = analyze("function print() { }");
    assert!(engine.has_errors());
  }

  #[test]
  fn rejects_duplicate_structure_fields() {
    let engine = analyze("structure Student { name String; name Number; } function main() { }");
    assert!(engine.has_errors());
  }

  #[test]
  fn rejects_unknown_parameter_types() {
    let engine = analyze("function main(x Widget) { }");
    assert!(engine.has_errors());
  }

  #[test]
  fn accepts_a_user_structure_as_a_type() {
    let engine = analyze("structure Student { name String; } function main(s Student) { }");
    assert!(!engine.has_errors());
  }

  #[test]
  fn accepts_list_of_known_element_type() {
    let engine = analyze("function main(xs Number[]) { }");
    assert!(!engine.has_errors());
  }
}
