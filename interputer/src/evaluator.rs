use diagnostic::{diagnostic::Span, diagnostic_code::DiagnosticCode};
use indexmap::IndexMap;
use parser::{Decl, Expr, Stmt, TypeRef};
use scanner::token::{types::TokenType, Token};

use crate::{
  builtins::{self, OutputSink},
  context::InterpreterContext,
  declarations::Declarations,
  environment::{CallStack, Frame},
  error::{EvalResult, RuntimeError},
  signal::Signal,
  value::{TypeDescriptor, Value},
};

fn synthetic_span() -> Span {
  Span {
    file: "input".to_string(),
    line: 1,
    column: 1,
    length: 1,
  }
}

/// Walks the AST: dispatches on node kind, manages the call stack, evaluates
/// expressions, executes statements, and threads block-exit signals up to
/// the construct that absorbs them.
pub struct Evaluator {
  declarations: Declarations,
  call_stack: CallStack,
  sink: Box<dyn OutputSink>,
  context: InterpreterContext,
  runtime: tokio::runtime::Runtime,
}

impl Evaluator {
  pub fn new(decls: &[Decl], sink: Box<dyn OutputSink>, context: InterpreterContext) -> EvalResult<Self> {
    let declarations = Declarations::register(decls);
    let runtime = tokio::runtime::Runtime::new().map_err(|err| RuntimeError::new(DiagnosticCode::IoError, format!("failed to start the async runtime: {}", err)))?;

    let mut evaluator = Self {
      declarations,
      call_stack: CallStack::new(),
      sink,
      context,
      runtime,
    };
    evaluator.call_stack.push(Frame::new());
    evaluator.register_constants()?;
    Ok(evaluator)
  }

  fn register_constants(&mut self) -> EvalResult<()> {
    let constants = self.declarations.constants.clone();
    for constant in &constants {
      let value = self.eval_expr(&constant.initializer)?;
      self.call_stack.set_constant(constant.name.lexeme.clone(), value);
    }
    Ok(())
  }

  /// Registers declarations, then calls `main` with an empty argument list.
  /// Absence of `main` is a runtime error.
  pub fn interpret(&mut self) -> EvalResult<Value> {
    if !self.declarations.functions.contains_key("main") {
      return Err(RuntimeError::new(DiagnosticCode::MissingMain, "no 'main' function is declared"));
    }
    self.call_function("main", Vec::new(), synthetic_span())
  }

  fn run_block_with_frame(&mut self, frame: Frame, stmts: &[Stmt]) -> EvalResult<Signal> {
    self.call_stack.push(frame);
    let result = self.exec_stmts(stmts);
    self.call_stack.pop();
    result
  }

  fn exec_block(&mut self, stmts: &[Stmt]) -> EvalResult<Signal> {
    self.run_block_with_frame(Frame::new(), stmts)
  }

  fn exec_stmts(&mut self, stmts: &[Stmt]) -> EvalResult<Signal> {
    for stmt in stmts {
      let signal = self.exec_stmt(stmt)?;
      if !signal.is_none() {
        return Ok(signal);
      }
    }
    Ok(Signal::None)
  }

  fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<Signal> {
    match stmt {
      Stmt::Bare(expr) => {
        self.eval_expr(expr)?;
        Ok(Signal::None)
      },
      Stmt::VarDecl { name, expr, is_constant } => {
        let value = self.eval_expr(expr)?;
        let declared = if *is_constant {
          self.call_stack.set_constant(name.lexeme.clone(), value);
          true
        } else {
          self.call_stack.set_var(name.lexeme.clone(), value)
        };
        if !declared {
          return Err(RuntimeError::at(DiagnosticCode::DuplicateBinding, format!("'{}' is already declared in this scope", name.lexeme), name.to_span()));
        }
        Ok(Signal::None)
      },
      Stmt::Assign { name, expr } => {
        let value = self.eval_expr(expr)?;
        let new_type = value.type_descriptor();
        match self.call_stack.reassign_var(&name.lexeme, value) {
          Some(old) if old.type_descriptor() == new_type => Ok(Signal::None),
          Some(old) => Err(RuntimeError::at(
            DiagnosticCode::TypeMismatch,
            format!("cannot reassign '{}': expected {}, found {}", name.lexeme, old.type_descriptor(), new_type),
            name.to_span(),
          )),
          None if self.call_stack.get_val(&name.lexeme).is_some() => Err(RuntimeError::at(
            DiagnosticCode::ReassignConstant,
            format!("'{}' is not a variable and cannot be reassigned", name.lexeme),
            name.to_span(),
          )),
          None => Err(RuntimeError::at(DiagnosticCode::ReassignUnknownVariable, format!("undefined variable '{}'", name.lexeme), name.to_span())),
        }
      },
      Stmt::Return { expr, .. } => {
        let value = match expr {
          Some(expr) => self.eval_expr(expr)?,
          None => Value::Nothing,
        };
        Ok(Signal::Return(value))
      },
      Stmt::Break(_) => Ok(Signal::Break),
      Stmt::Continue(_) => Ok(Signal::Continue),
      Stmt::ConditionalChain {
        if_branch,
        else_ifs,
        else_branch,
      } => {
        if self.eval_condition(&if_branch.condition)? {
          return self.exec_block(&if_branch.body);
        }
        for branch in else_ifs {
          if self.eval_condition(&branch.condition)? {
            return self.exec_block(&branch.body);
          }
        }
        match else_branch {
          Some(body) => self.exec_block(body),
          None => Ok(Signal::None),
        }
      },
      Stmt::While { condition, body } => self.exec_while(condition, body),
      Stmt::For {
        index_name,
        element_name,
        iterable,
        body,
      } => self.exec_for(index_name, element_name, iterable, body),
    }
  }

  fn eval_condition(&mut self, condition: &Expr) -> EvalResult<bool> {
    match self.eval_expr(condition)? {
      Value::Boolean(value) => Ok(value),
      other => Err(RuntimeError::at(
        DiagnosticCode::TypeMismatch,
        format!("condition must be a Boolean, found {}", other.type_descriptor()),
        condition.anchor().to_span(),
      )),
    }
  }

  fn exec_while(&mut self, condition: &Expr, body: &[Stmt]) -> EvalResult<Signal> {
    loop {
      if !self.eval_condition(condition)? {
        return Ok(Signal::None);
      }
      match self.exec_block(body)? {
        Signal::None | Signal::Continue => continue,
        Signal::Break => return Ok(Signal::None),
        Signal::Return(value) => return Ok(Signal::Return(value)),
      }
    }
  }

  fn exec_for(&mut self, index_name: &Token, element_name: &Token, iterable: &Expr, body: &[Stmt]) -> EvalResult<Signal> {
    let items = match self.eval_expr(iterable)? {
      Value::List(_, items) => items,
      other => {
        return Err(RuntimeError::at(
          DiagnosticCode::NotAList,
          format!("'for' requires a List, found {}", other.type_descriptor()),
          iterable.anchor().to_span(),
        ));
      },
    };

    for (index, element) in items.into_iter().enumerate() {
      let mut frame = Frame::new();
      frame.declare_var(index_name.lexeme.clone(), Value::Number(index as f64));
      frame.declare_var(element_name.lexeme.clone(), element);
      match self.run_block_with_frame(frame, body)? {
        Signal::None | Signal::Continue => continue,
        Signal::Break => return Ok(Signal::None),
        Signal::Return(value) => return Ok(Signal::Return(value)),
      }
    }
    Ok(Signal::None)
  }

  fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
    match expr {
      Expr::Number(_, value) => Ok(Value::Number(*value)),
      Expr::Str(_, value) => Ok(Value::String(value.clone())),
      Expr::Boolean(_, value) => Ok(Value::Boolean(*value)),
      Expr::Nothing(_) => Ok(Value::Nothing),
      Expr::Identifier(token) => self
        .call_stack
        .get_val(&token.lexeme)
        .cloned()
        .ok_or_else(|| RuntimeError::at(DiagnosticCode::UndefinedIdentifier, format!("undefined identifier '{}'", token.lexeme), token.to_span())),
      Expr::TypeRefExpr(token, _) => Err(RuntimeError::at(
        DiagnosticCode::TypeMismatch,
        "a bare type name cannot be used as a value".to_string(),
        token.to_span(),
      )),
      Expr::ListLiteral {
        element_type, elements, ..
      } => self.eval_list_literal(element_type, elements),
      Expr::StructureLiteral { type_name, fields } => self.eval_structure_literal(type_name, fields),
      Expr::Call { callee, arguments, .. } => {
        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
          args.push(self.eval_expr(arg)?);
        }
        self.call_function(&callee.lexeme, args, callee.to_span())
      },
      Expr::Binary { left, operator, right } => {
        let left = self.eval_expr(left)?;
        let right = self.eval_expr(right)?;
        self.eval_binary(&left, operator, &right)
      },
      Expr::Unary { operator, operand } => {
        let value = self.eval_expr(operand)?;
        self.eval_unary(operator, &value)
      },
      Expr::TypeCast { keyword, type_ref, operand } => {
        let value = self.eval_expr(operand)?;
        self.eval_cast(keyword, type_ref, value)
      },
      Expr::Subscript { bracket, target, index } => {
        let target_value = self.eval_expr(target)?;
        let index_value = self.eval_expr(index)?;
        self.eval_subscript(bracket, target_value, index_value)
      },
      Expr::FieldAccess { field, parent } => {
        let parent_value = self.eval_expr(parent)?;
        self.eval_field_access(field, parent_value)
      },
    }
  }

  fn eval_binary(&self, left: &Value, operator: &Token, right: &Value) -> EvalResult<Value> {
    let left_type = left.type_descriptor();
    let right_type = right.type_descriptor();
    if left_type != right_type {
      return Err(RuntimeError::at(
        DiagnosticCode::TypeMismatch,
        format!("'{}' requires operands of the same type, found {} and {}", operator.lexeme, left_type, right_type),
        operator.to_span(),
      ));
    }

    match operator.token_type {
      TokenType::EqualEqual | TokenType::BangEqual => {
        let equal = left.equals(right).ok_or_else(|| RuntimeError::at(DiagnosticCode::ReadNothing, "comparing Nothing is a runtime error".to_string(), operator.to_span()))?;
        Ok(Value::Boolean(if operator.token_type == TokenType::EqualEqual { equal } else { !equal }))
      },
      TokenType::Plus => match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        _ => Err(self.numeric_or_string_error(operator, left_type)),
      },
      TokenType::Minus | TokenType::Star | TokenType::Divide | TokenType::Modulus => match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(match operator.token_type {
          TokenType::Minus => a - b,
          TokenType::Star => a * b,
          TokenType::Divide => a / b,
          TokenType::Modulus => a % b,
          _ => unreachable!(),
        })),
        _ => Err(self.numeric_error(operator, left_type)),
      },
      TokenType::Less | TokenType::LessEqual | TokenType::Greater | TokenType::GreaterEqual => match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(match operator.token_type {
          TokenType::Less => a < b,
          TokenType::LessEqual => a <= b,
          TokenType::Greater => a > b,
          TokenType::GreaterEqual => a >= b,
          _ => unreachable!(),
        })),
        _ => Err(self.numeric_error(operator, left_type)),
      },
      _ => Err(RuntimeError::at(DiagnosticCode::TypeMismatch, format!("'{}' is not a binary operator", operator.lexeme), operator.to_span())),
    }
  }

  fn numeric_error(&self, operator: &Token, found: TypeDescriptor) -> RuntimeError {
    RuntimeError::at(DiagnosticCode::TypeMismatch, format!("'{}' requires Number operands, found {}", operator.lexeme, found), operator.to_span())
  }

  fn numeric_or_string_error(&self, operator: &Token, found: TypeDescriptor) -> RuntimeError {
    RuntimeError::at(DiagnosticCode::TypeMismatch, format!("'{}' requires Number or String operands, found {}", operator.lexeme, found), operator.to_span())
  }

  fn eval_unary(&self, operator: &Token, value: &Value) -> EvalResult<Value> {
    match (operator.token_type, value) {
      (TokenType::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
      (TokenType::Bang, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
      (TokenType::Minus, other) => Err(RuntimeError::at(DiagnosticCode::TypeMismatch, format!("unary '-' requires a Number, found {}", other.type_descriptor()), operator.to_span())),
      (TokenType::Bang, other) => Err(RuntimeError::at(DiagnosticCode::TypeMismatch, format!("unary '!' requires a Boolean, found {}", other.type_descriptor()), operator.to_span())),
      _ => Err(RuntimeError::at(DiagnosticCode::TypeMismatch, format!("'{}' is not a unary operator", operator.lexeme), operator.to_span())),
    }
  }

  /// Only `String(expr)` is defined: `String -> String` is a no-op,
  /// `Number -> String` uses the Number formatting rule; every other source
  /// type, and every other target type, is not implemented.
  fn eval_cast(&self, keyword: &Token, type_ref: &TypeRef, value: Value) -> EvalResult<Value> {
    if *type_ref != TypeRef::Named("String".to_string()) {
      return Err(RuntimeError::at(DiagnosticCode::CastNotImplemented, format!("casting to {} is not implemented", type_ref), keyword.to_span()));
    }
    match value {
      Value::String(text) => Ok(Value::String(text)),
      Value::Number(number) => Ok(Value::String(Value::Number(number).to_string())),
      other => Err(RuntimeError::at(
        DiagnosticCode::CastNotImplemented,
        format!("casting {} to String is not implemented", other.type_descriptor()),
        keyword.to_span(),
      )),
    }
  }

  fn eval_subscript(&self, bracket: &Token, target: Value, index: Value) -> EvalResult<Value> {
    let items = match target {
      Value::List(_, items) => items,
      other => return Err(RuntimeError::at(DiagnosticCode::NotAList, format!("cannot index into {}", other.type_descriptor()), bracket.to_span())),
    };
    let index = match index {
      Value::Number(n) => n.floor() as i64,
      other => return Err(RuntimeError::at(DiagnosticCode::TypeMismatch, format!("subscript must be a Number, found {}", other.type_descriptor()), bracket.to_span())),
    };
    if index < 0 || index as usize >= items.len() {
      return Err(RuntimeError::at(DiagnosticCode::IndexOutOfBounds, format!("index {} is out of bounds for a list of length {}", index, items.len()), bracket.to_span()));
    }
    Ok(items[index as usize].clone())
  }

  fn eval_field_access(&self, field: &Token, parent: Value) -> EvalResult<Value> {
    match parent {
      Value::Structure(name, fields) => fields
        .get(&field.lexeme)
        .cloned()
        .ok_or_else(|| RuntimeError::at(DiagnosticCode::FieldNotFound, format!("structure '{}' has no field '{}'", name, field.lexeme), field.to_span())),
      other => Err(RuntimeError::at(DiagnosticCode::NotAStructure, format!("cannot access field '{}' on {}", field.lexeme, other.type_descriptor()), field.to_span())),
    }
  }

  fn eval_list_literal(&mut self, element_type: &TypeRef, elements: &[Expr]) -> EvalResult<Value> {
    let expected = TypeDescriptor::from_type_ref(element_type);
    let mut items = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
      let value = self.eval_expr(element)?;
      let actual = value.type_descriptor();
      if actual != expected {
        return Err(RuntimeError::at(
          DiagnosticCode::TypeMismatch,
          format!("list element {} expects {}, found {}", index, expected, actual),
          element.anchor().to_span(),
        ));
      }
      items.push(value);
    }
    Ok(Value::List(expected, items))
  }

  fn eval_structure_literal(&mut self, type_name: &Token, fields: &[(Token, Expr)]) -> EvalResult<Value> {
    let structure = self
      .declarations
      .structures
      .get(&type_name.lexeme)
      .cloned()
      .ok_or_else(|| RuntimeError::at(DiagnosticCode::UnknownType, format!("unknown structure '{}'", type_name.lexeme), type_name.to_span()))?;

    let mut provided: IndexMap<String, Value> = IndexMap::new();
    for (name, expr) in fields {
      let value = self.eval_expr(expr)?;
      if provided.contains_key(&name.lexeme) {
        return Err(RuntimeError::at(DiagnosticCode::DuplicateField, format!("field '{}' is already specified", name.lexeme), name.to_span()));
      }
      provided.insert(name.lexeme.clone(), value);
    }

    let mut ordered = IndexMap::new();
    for (field_name, field_type) in &structure.fields {
      let value = provided
        .shift_remove(&field_name.lexeme)
        .ok_or_else(|| RuntimeError::at(DiagnosticCode::FieldNotFound, format!("structure '{}' is missing field '{}'", structure.name.lexeme, field_name.lexeme), type_name.to_span()))?;
      let expected = TypeDescriptor::from_type_ref(field_type);
      let actual = value.type_descriptor();
      if actual != expected {
        return Err(RuntimeError::at(
          DiagnosticCode::TypeMismatch,
          format!("field '{}' of '{}' expects {}, found {}", field_name.lexeme, structure.name.lexeme, expected, actual),
          type_name.to_span(),
        ));
      }
      ordered.insert(field_name.lexeme.clone(), value);
    }
    if let Some((extra_name, _)) = provided.into_iter().next() {
      return Err(RuntimeError::at(
        DiagnosticCode::FieldNotFound,
        format!("'{}' has no field '{}'", structure.name.lexeme, extra_name),
        type_name.to_span(),
      ));
    }

    Ok(Value::Structure(structure.name.lexeme.clone(), ordered))
  }

  fn call_function(&mut self, name: &str, args: Vec<Value>, span: Span) -> EvalResult<Value> {
    if name == "print" {
      return builtins::print(&args, self.sink.as_mut());
    }
    if name == "run" {
      return builtins::run(&args, self.sink.as_mut(), &self.context, &self.runtime);
    }

    let func = self
      .declarations
      .functions
      .get(name)
      .cloned()
      .ok_or_else(|| RuntimeError::at(DiagnosticCode::UnknownFunction, format!("undefined function '{}'", name), span.clone()))?;

    if func.params.len() != args.len() {
      return Err(RuntimeError::at(
        DiagnosticCode::WrongArgumentCount,
        format!("'{}' expects {} argument(s), found {}", name, func.params.len(), args.len()),
        span,
      ));
    }

    let mut frame = Frame::new();
    for (param, arg) in func.params.iter().zip(args.into_iter()) {
      let expected = TypeDescriptor::from_type_ref(&param.type_ref);
      let actual = arg.type_descriptor();
      if expected != actual {
        return Err(RuntimeError::at(
          DiagnosticCode::TypeMismatch,
          format!("argument '{}' of '{}' expects {}, found {}", param.name.lexeme, name, expected, actual),
          param.name.to_span(),
        ));
      }
      frame.set_arg(param.name.lexeme.clone(), arg);
    }

    self.call_stack.push(frame);
    let body_result = self.exec_block(&func.body);
    self.call_stack.pop();
    let signal = body_result?;

    let value = match signal {
      Signal::Return(value) => value,
      Signal::None => Value::Nothing,
      Signal::Break => return Err(RuntimeError::at(DiagnosticCode::BreakOutsideLoop, "'break' used outside of a loop".to_string(), span)),
      Signal::Continue => return Err(RuntimeError::at(DiagnosticCode::ContinueOutsideLoop, "'continue' used outside of a loop".to_string(), span)),
    };

    let expected_return = func.return_type.as_ref().map(TypeDescriptor::from_type_ref).unwrap_or(TypeDescriptor::Nothing);
    let actual_return = value.type_descriptor();
    if actual_return != expected_return {
      return Err(RuntimeError::at(
        DiagnosticCode::TypeMismatch,
        format!("function '{}' declared to return {}, but returned {}", name, expected_return, actual_return),
        span,
      ));
    }
    Ok(value)
  }

  #[cfg(test)]
  pub(crate) fn call_stack_depth(&self) -> usize {
    self.call_stack.depth()
  }
}
