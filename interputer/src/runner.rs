use diagnostic::DiagnosticEngine;
use logger::{LogType, Logger};
use parser::Parser;
use scanner::Scanner;
use semantic_analysis::Registrar;

use crate::{builtins::StdoutSink, context::InterpreterContext, evaluator::Evaluator};

/// Orchestrates scan → parse → register → interpret for the CLI's three
/// subcommands. Pipeline milestones are logged through the `logger` crate;
/// the interpreter core itself never writes to stdout/stderr directly.
pub struct Runner;

impl Runner {
  /// `run <file> [--debug]` — scan, parse, interpret.
  pub fn run(source: &str, debug: bool) -> i32 {
    let mut engine = DiagnosticEngine::new();

    Logger::log(LogType::Info("scanning source"), 0);
    let mut scanner = Scanner::new(source);
    let tokens = scanner.scan(&mut engine).to_vec();
    if debug {
      for token in &tokens {
        println!("{}", token);
      }
    }
    if engine.has_errors() {
      engine.print_all(source);
      return 1;
    }

    Logger::log(LogType::Info("parsing tokens"), 0);
    let mut parser = Parser::new(tokens);
    let decls = parser.parse(&mut engine);
    if debug {
      for decl in &decls {
        decl.print_tree();
      }
    }
    if engine.has_errors() {
      engine.print_all(source);
      return 1;
    }

    Logger::log(LogType::Info("checking declarations"), 0);
    Registrar::new(&decls).analyze(&mut engine);
    if engine.has_errors() {
      engine.print_all(source);
      return 1;
    }

    Logger::log(LogType::Info("interpreting"), 0);
    let context = match InterpreterContext::from_process() {
      Ok(context) => context,
      Err(err) => {
        Logger::log(LogType::Error(&format!("failed to read process context: {}", err)), 0);
        return 1;
      },
    };
    let mut evaluator = match Evaluator::new(&decls, Box::new(StdoutSink), context) {
      Ok(evaluator) => evaluator,
      Err(err) => {
        engine.emit(err.diagnostic());
        engine.print_all(source);
        return 1;
      },
    };
    match evaluator.interpret() {
      Ok(_) => {
        Logger::log(LogType::Info("interpretation finished"), 0);
        0
      },
      Err(err) => {
        engine.emit(err.diagnostic());
        engine.print_all(source);
        1
      },
    }
  }

  /// `scan <file>` — scan and print tokens one per line.
  pub fn scan(source: &str) -> i32 {
    let mut engine = DiagnosticEngine::new();
    let mut scanner = Scanner::new(source);
    let tokens = scanner.scan(&mut engine);
    for token in tokens {
      println!("{}", token);
    }
    if engine.has_errors() {
      engine.print_all(source);
      return 1;
    }
    0
  }

  /// `print-ast <file>` — scan, parse, and print the tree dump.
  pub fn print_ast(source: &str) -> i32 {
    let mut engine = DiagnosticEngine::new();
    let mut scanner = Scanner::new(source);
    let tokens = scanner.scan(&mut engine).to_vec();
    if engine.has_errors() {
      engine.print_all(source);
      return 1;
    }

    let mut parser = Parser::new(tokens);
    let decls = parser.parse(&mut engine);
    if engine.has_errors() {
      engine.print_all(source);
      return 1;
    }

    for decl in &decls {
      decl.print_tree();
    }
    0
  }
}
