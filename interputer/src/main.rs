use colored::*;
use interputer::runner::Runner;
use logger::{LogType, Logger};

// `class.rs`, `function/`, `lox_value/`, `interpreter.rs`/`interpreter/mod.rs`,
// and `env.rs`/`env/mod.rs` are intentionally left undeclared by the
// `interputer` lib: they are the prior generation's closure/inheritance
// machinery, cross-reference each other and the now-superseded
// `Interpreter`/`Env` types, and have no counterpart in SPEC_FULL.md. They
// stay on disk as reference until the final trim pass; see DESIGN.md.

const USAGE: &str = "Usage: sol run <file> [--debug] | sol scan <file> | sol print-ast <file>";

fn main() {
  let args: Vec<String> = std::env::args().collect();

  let (subcommand, rest) = match args.get(1) {
    Some(subcommand) => (subcommand.as_str(), &args[2..]),
    None => {
      Logger::log(LogType::Error(USAGE), 0);
      std::process::exit(64);
    },
  };

  let path = match rest.first() {
    Some(path) => path,
    None => {
      Logger::log(LogType::Error(USAGE), 0);
      std::process::exit(64);
    },
  };

  let source = match std::fs::read_to_string(path) {
    Ok(source) => source,
    Err(err) => {
      Logger::log(LogType::Error(&format!("could not read '{}': {}", path, err)), 0);
      std::process::exit(66);
    },
  };

  let exit_code = match subcommand {
    "run" => {
      let debug = rest.iter().any(|arg| arg == "--debug");
      println!("{}", format!("running {}", path).cyan().bold());
      Runner::run(&source, debug)
    },
    "scan" => Runner::scan(&source),
    "print-ast" => Runner::print_ast(&source),
    other => {
      Logger::log(LogType::Error(&format!("unknown subcommand '{}'. {}", other, USAGE)), 0);
      std::process::exit(64);
    },
  };

  std::process::exit(exit_code);
}
