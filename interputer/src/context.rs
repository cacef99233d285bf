use std::{collections::HashMap, env, path::PathBuf};

/// Host context passed into the interpreter (§6 "Environment / working
/// directory"): the process working directory and environment variables,
/// so the `run` built-in can resolve relative paths and inherit the shell's
/// environment the way a subshell would.
#[derive(Debug, Clone)]
pub struct InterpreterContext {
  pub working_directory: PathBuf,
  pub environment: HashMap<String, String>,
}

impl InterpreterContext {
  /// Captures the current process's working directory and environment.
  pub fn from_process() -> std::io::Result<Self> {
    Ok(Self {
      working_directory: env::current_dir()?,
      environment: env::vars().collect(),
    })
  }
}
