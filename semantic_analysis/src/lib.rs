pub mod registrar;

pub use registrar::{Registrar, BUILTIN_NAMES};
