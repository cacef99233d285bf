use std::collections::HashMap;

use parser::{ConstDecl, Decl, FuncDecl, StructureDecl};

/// The global declaration table built by `interpret()`'s registration pass.
/// Global-name uniqueness has already been checked by `semantic_analysis`'s
/// `Registrar`; this just sorts declarations into their tables by kind.
#[derive(Debug, Default)]
pub struct Declarations {
  pub functions: HashMap<String, FuncDecl>,
  pub structures: HashMap<String, StructureDecl>,
  /// Evaluated once, in declaration order, before `main` runs.
  pub constants: Vec<ConstDecl>,
}

impl Declarations {
  pub fn register(decls: &[Decl]) -> Self {
    let mut table = Declarations::default();
    for decl in decls {
      match decl.clone() {
        Decl::Func(func) => {
          table.functions.insert(func.name.lexeme.clone(), func);
        },
        Decl::Structure(structure) => {
          table.structures.insert(structure.name.lexeme.clone(), structure);
        },
        Decl::Const(constant) => table.constants.push(constant),
      }
    }
    table
  }
}
