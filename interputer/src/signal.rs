use crate::value::Value;

/// What a block tells its enclosing construct to do once it finishes
/// running. Modeled as an ordinary return value threaded explicitly through
/// `exec_block`/`exec_stmt`, not as a thrown sentinel: `while`/`for` absorb
/// `Break`/`Continue`, a function call absorbs `Return`, and every other
/// nesting level is transparent.
#[derive(Debug, Clone)]
pub enum Signal {
  None,
  Break,
  Continue,
  Return(Value),
}

impl Signal {
  pub fn is_none(&self) -> bool {
    matches!(self, Signal::None)
  }
}
