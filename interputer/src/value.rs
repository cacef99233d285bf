use std::fmt;

use indexmap::IndexMap;
use parser::TypeRef;

/// The runtime representation of a Sol type; used for dynamic type checks.
/// Two descriptors are equal iff their shape and arguments are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
  Nothing,
  Boolean,
  Number,
  String,
  List(Box<TypeDescriptor>),
  Structure(String),
}

impl TypeDescriptor {
  pub fn from_type_ref(type_ref: &TypeRef) -> Self {
    match type_ref {
      TypeRef::Named(name) => match name.as_str() {
        "Nothing" => TypeDescriptor::Nothing,
        "Number" => TypeDescriptor::Number,
        "String" => TypeDescriptor::String,
        "Boolean" => TypeDescriptor::Boolean,
        other => TypeDescriptor::Structure(other.to_string()),
      },
      TypeRef::List(elem) => TypeDescriptor::List(Box::new(TypeDescriptor::from_type_ref(elem))),
    }
  }
}

impl fmt::Display for TypeDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TypeDescriptor::Nothing => write!(f, "Nothing"),
      TypeDescriptor::Boolean => write!(f, "Boolean"),
      TypeDescriptor::Number => write!(f, "Number"),
      TypeDescriptor::String => write!(f, "String"),
      TypeDescriptor::List(elem) => write!(f, "{}[]", elem),
      TypeDescriptor::Structure(name) => write!(f, "{}", name),
    }
  }
}

/// A Sol runtime value. None of these kinds are mutable, so sharing is
/// never observable beyond identity, which the language does not expose.
#[derive(Debug, Clone)]
pub enum Value {
  Nothing,
  Boolean(bool),
  Number(f64),
  String(String),
  List(TypeDescriptor, Vec<Value>),
  /// Field insertion order is preserved; `StructureDecl` defines the
  /// canonical order new literals are checked against.
  Structure(String, IndexMap<String, Value>),
}

impl Value {
  pub fn type_descriptor(&self) -> TypeDescriptor {
    match self {
      Value::Nothing => TypeDescriptor::Nothing,
      Value::Boolean(_) => TypeDescriptor::Boolean,
      Value::Number(_) => TypeDescriptor::Number,
      Value::String(_) => TypeDescriptor::String,
      Value::List(elem, _) => TypeDescriptor::List(Box::new(elem.clone())),
      Value::Structure(name, _) => TypeDescriptor::Structure(name.clone()),
    }
  }

  /// Two values are comparable only if their type descriptors are equal.
  /// Comparing `Nothing` is a runtime error, so this returns `None` for it
  /// rather than panicking — callers decide how to surface that.
  pub fn equals(&self, other: &Value) -> Option<bool> {
    if self.type_descriptor() != other.type_descriptor() {
      return Some(false);
    }
    match (self, other) {
      (Value::Nothing, Value::Nothing) => None,
      (Value::Boolean(a), Value::Boolean(b)) => Some(a == b),
      (Value::Number(a), Value::Number(b)) => Some(a == b),
      (Value::String(a), Value::String(b)) => Some(a == b),
      (Value::List(_, a), Value::List(_, b)) => {
        if a.len() != b.len() {
          return Some(false);
        }
        for (x, y) in a.iter().zip(b.iter()) {
          match x.equals(y) {
            Some(true) => continue,
            _ => return Some(false),
          }
        }
        Some(true)
      },
      (Value::Structure(name_a, fields_a), Value::Structure(name_b, fields_b)) => {
        if name_a != name_b || fields_a.len() != fields_b.len() {
          return Some(false);
        }
        for (key, value_a) in fields_a {
          match fields_b.get(key).and_then(|value_b| value_a.equals(value_b)) {
            Some(true) => continue,
            _ => return Some(false),
          }
        }
        Some(true)
      },
      _ => Some(false),
    }
  }

  /// The unquoted form used by the `print` built-in: strings lose their
  /// quotes, everything else matches the diagnostic `Display` form.
  pub fn display_value(&self) -> String {
    match self {
      Value::String(text) => text.clone(),
      other => other.to_string(),
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Nothing => write!(f, "Nothing"),
      Value::Boolean(value) => write!(f, "{}", value),
      Value::Number(value) => {
        if value.fract() == 0.0 && value.is_finite() {
          write!(f, "{}", *value as i64)
        } else {
          write!(f, "{}", value)
        }
      },
      Value::String(text) => write!(f, "\"{}\"", text),
      Value::List(_, items) => {
        let items = items.iter().map(|item| item.to_string()).collect::<Vec<_>>().join(", ");
        write!(f, "[{}]", items)
      },
      Value::Structure(name, fields) => {
        let fields = fields.iter().map(|(name, value)| format!("{}: {}", name, value)).collect::<Vec<_>>().join(", ");
        write!(f, "{}{{{}}}", name, fields)
      },
    }
  }
}
