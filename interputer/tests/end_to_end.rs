use std::{cell::RefCell, rc::Rc};

use diagnostic::DiagnosticEngine;
use interputer::{builtins::OutputSink, context::InterpreterContext, evaluator::Evaluator};
use parser::Parser;
use scanner::Scanner;
use semantic_analysis::Registrar;

struct CaptureSink(Rc<RefCell<Vec<String>>>);

impl OutputSink for CaptureSink {
  fn print_line(&mut self, line: &str) {
    self.0.borrow_mut().push(line.to_string());
  }
}

fn test_context() -> InterpreterContext {
  InterpreterContext {
    working_directory: std::env::current_dir().unwrap(),
    environment: std::collections::HashMap::new(),
  }
}

/// Scans, parses, registers, and interprets `source`, returning the lines
/// written through `print` or an error message.
fn run(source: &str) -> Result<Vec<String>, String> {
  let mut engine = DiagnosticEngine::new();

  let mut scanner = Scanner::new(source);
  scanner.scan(&mut engine);
  if engine.has_errors() {
    return Err(engine.format_all_plain(source));
  }

  let mut parser = Parser::new(scanner.tokens.clone());
  let decls = parser.parse(&mut engine);
  if engine.has_errors() {
    return Err(engine.format_all_plain(source));
  }

  Registrar::new(&decls).analyze(&mut engine);
  if engine.has_errors() {
    return Err(engine.format_all_plain(source));
  }

  let captured = Rc::new(RefCell::new(Vec::new()));
  let sink = CaptureSink(captured.clone());
  let mut evaluator = Evaluator::new(&decls, Box::new(sink), test_context()).map_err(|err| err.to_string())?;
  evaluator.interpret().map_err(|err| err.to_string())?;
  let lines = captured.borrow().clone();
  Ok(lines)
}

#[test]
fn hello_world() {
  let lines = run(r#"function main() { print("Hello, world!"); }"#).unwrap();
  assert_eq!(lines, vec!["Hello, world!".to_string()]);
}

#[test]
fn arithmetic_and_casts() {
  let source = r#"
    function main() {
      print(String(1 + 2));
      print(String(2 * 3));
      print(String(7 / 2));
      print(String(7 % 2));
    }
  "#;
  let lines = run(source).unwrap();
  assert_eq!(lines, vec!["3", "6", "3.5", "1"]);
}

#[test]
fn conditionals_and_comparison() {
  let source = r#"
    function main() {
      if 1 < 2 { print("reachable 1"); }
      if 2 <= 2 { print("reachable 2"); }
      if 3 > 2 { print("reachable 3"); }
      if 3 >= 3 { print("reachable 4"); }
    }
  "#;
  let lines = run(source).unwrap();
  assert_eq!(lines, vec!["reachable 1", "reachable 2", "reachable 3", "reachable 4"]);
}

#[test]
fn while_loop_counts_up() {
  let source = r#"
    function main() {
      variable i = 0;
      while i < 3 { print(String(i)); i = i + 1; }
    }
  "#;
  let lines = run(source).unwrap();
  assert_eq!(lines, vec!["0", "1", "2"]);
}

#[test]
fn for_loop_over_a_list_finds_the_max() {
  let source = r#"
    function main() {
      variable numbers = Number[1, 7, 3];
      variable biggest = numbers[0];
      for i, n in numbers {
        if n > biggest { biggest = n; }
      }
      print("The biggest number is " + String(biggest));
    }
  "#;
  let lines = run(source).unwrap();
  assert_eq!(lines, vec!["The biggest number is 7"]);
}

#[test]
fn recursive_fibonacci() {
  let source = r#"
    function fibonacci(n Number) -> Number {
      if n < 2 { return n; }
      return fibonacci(n - 1) + fibonacci(n - 2);
    }
    function main() {
      print(String(fibonacci(20)));
    }
  "#;
  let lines = run(source).unwrap();
  assert_eq!(lines, vec!["6765"]);
}

#[test]
fn structures_and_field_access() {
  let source = r#"
    structure Student { name String; }
    structure Class { subject String; }

    function main() {
      variable bob = Student{name: "Bob"};
      variable alice = Student{name: "Alice"};
      variable calculus = Class{subject: "Calculus"};
      print("Hello " + bob.name + " and " + alice.name + "!");
      print(bob.name + " is enrolled in " + calculus.subject);
    }
  "#;
  let lines = run(source).unwrap();
  assert_eq!(lines, vec!["Hello Bob and Alice!", "Bob is enrolled in Calculus"]);
}

#[test]
fn early_return_suppresses_dead_code() {
  let source = r#"
    function greet() {
      return;
      print("never reached");
    }
    function main() {
      greet();
    }
  "#;
  let lines = run(source).unwrap();
  assert!(lines.is_empty());
}

#[test]
fn type_mismatch_return_is_a_runtime_error() {
  let source = r#"
    function broken() -> Nothing {
      return 42;
    }
    function main() {
      broken();
    }
  "#;
  let err = run(source).unwrap_err();
  assert!(err.contains("broken"));
  assert!(err.contains("Nothing"), "should name the declared return type: {err}");
  assert!(err.contains("Number"), "should name the actual return type: {err}");
}

#[test]
fn empty_program_errors_with_no_main() {
  let err = run("").unwrap_err();
  assert!(err.to_lowercase().contains("main"));
}

#[test]
fn trailing_comma_list_literal_matches_one_without() {
  let with_comma = run("function main() { variable xs = Number[1, 2, 3,]; print(String(xs[2])); }").unwrap();
  let without_comma = run("function main() { variable xs = Number[1, 2, 3]; print(String(xs[2])); }").unwrap();
  assert_eq!(with_comma, without_comma);
}

#[test]
fn comment_at_eof_with_no_trailing_newline_is_well_defined() {
  let lines = run("function main() { print(\"ok\"); } # trailing comment").unwrap();
  assert_eq!(lines, vec!["ok".to_string()]);
}

#[test]
fn deeply_nested_if_else_if_chain_of_depth_64_evaluates_correctly() {
  let mut source = String::from("function main() {\n");
  for i in 0..64 {
    source.push_str(&format!("if x == {} {{ print(\"{}\");}} else ", i, i));
  }
  source.push_str("{ print(\"none\"); }\n}\nconstant x = 40;\n");
  // `x` must resolve from the global constants frame, not a local.
  let source = source.replacen("function main() {", "function main() {\n  ", 1);
  let lines = run(&source).unwrap();
  assert_eq!(lines, vec!["40".to_string()]);
}
