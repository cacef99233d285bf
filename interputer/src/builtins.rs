use std::process::Stdio;

use diagnostic::diagnostic_code::DiagnosticCode;
use tokio::{
  io::{AsyncBufReadExt, BufReader},
  process::Command,
};

use crate::{
  context::InterpreterContext,
  error::{EvalResult, RuntimeError},
  value::{TypeDescriptor, Value},
};

/// Reserved built-in names; the `Registrar` refuses to let a user
/// declaration shadow these.
pub const NAMES: &[&str] = &["print", "run"];

/// Where `print` output goes. The evaluator never calls `println!` itself —
/// it always goes through this sink, so embedders can capture output
/// without scraping stdout.
pub trait OutputSink {
  fn print_line(&mut self, line: &str);
}

pub struct StdoutSink;

impl OutputSink for StdoutSink {
  fn print_line(&mut self, line: &str) {
    println!("{}", line);
  }
}

/// `print(msg String)` — write `msg` to the sink with a trailing newline.
pub fn print(args: &[Value], sink: &mut dyn OutputSink) -> EvalResult<Value> {
  match args {
    [Value::String(text)] => {
      sink.print_line(text);
      Ok(Value::Nothing)
    },
    [other] => Err(RuntimeError::new(
      DiagnosticCode::TypeMismatch,
      format!("'print' expects a String argument, found {}", other.type_descriptor()),
    )),
    _ => Err(RuntimeError::new(
      DiagnosticCode::WrongArgumentCount,
      format!("'print' expects 1 argument, found {}", args.len()),
    )),
  }
}

/// `run(command String[])` — start a subprocess with `command[0]` as the
/// executable and the rest as arguments, streaming its stdout/stderr to the
/// sink line-by-line as they arrive, then waiting and raising a
/// `RuntimeError` on a nonzero exit code. The streaming itself is genuinely
/// asynchronous (concurrent reads of both pipes); the Sol program resumes
/// only after the subprocess exits, so this blocks on a dedicated runtime
/// rather than exposing asynchrony to Sol code.
pub fn run(args: &[Value], sink: &mut dyn OutputSink, context: &InterpreterContext, runtime: &tokio::runtime::Runtime) -> EvalResult<Value> {
  let command = match args {
    [Value::List(TypeDescriptor::String, items)] => items,
    [other] => {
      return Err(RuntimeError::new(
        DiagnosticCode::TypeMismatch,
        format!("'run' expects a String[] argument, found {}", other.type_descriptor()),
      ));
    },
    _ => {
      return Err(RuntimeError::new(
        DiagnosticCode::WrongArgumentCount,
        format!("'run' expects 1 argument, found {}", args.len()),
      ));
    },
  };

  let program = match command.first() {
    Some(Value::String(program)) => program.clone(),
    _ => return Err(RuntimeError::new(DiagnosticCode::WrongArgumentCount, "'run' requires a non-empty command list")),
  };
  let arguments: Vec<String> = command[1..]
    .iter()
    .map(|value| match value {
      Value::String(text) => Ok(text.clone()),
      other => Err(RuntimeError::new(
        DiagnosticCode::TypeMismatch,
        format!("'run' expects every command element to be a String, found {}", other.type_descriptor()),
      )),
    })
    .collect::<EvalResult<Vec<String>>>()?;

  let status = runtime
    .block_on(stream_subprocess(&program, &arguments, context, sink))
    .map_err(|err| RuntimeError::new(DiagnosticCode::IoError, format!("failed to run '{}': {}", program, err)))?;

  if !status.success() {
    return Err(RuntimeError::new(
      DiagnosticCode::SubprocessFailed,
      format!("'{}' exited with status {}", program, status.code().map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string())),
    ));
  }
  Ok(Value::Nothing)
}

async fn stream_subprocess(program: &str, arguments: &[String], context: &InterpreterContext, sink: &mut dyn OutputSink) -> std::io::Result<std::process::ExitStatus> {
  let mut child = Command::new(program)
    .args(arguments)
    .current_dir(&context.working_directory)
    .envs(&context.environment)
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()?;

  let mut stdout = BufReader::new(child.stdout.take().expect("piped stdout")).lines();
  let mut stderr = BufReader::new(child.stderr.take().expect("piped stderr")).lines();

  loop {
    tokio::select! {
      line = stdout.next_line() => {
        match line? {
          Some(line) => sink.print_line(&line),
          None => break,
        }
      }
      line = stderr.next_line() => {
        match line? {
          Some(line) => sink.print_line(&line),
          None => continue,
        }
      }
    }
  }

  while let Some(line) = stderr.next_line().await? {
    sink.print_line(&line);
  }

  child.wait().await
}
