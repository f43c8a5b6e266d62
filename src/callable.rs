use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::interpreter::{Flow, Interpreter, RuntimeError, RuntimeErrorKind};
use crate::value::Value;
use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;

/// Anything a call expression can invoke.
pub trait Callable {
    fn arity(&self) -> usize;
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError>;
}

/// A user function: its declaration plus the environment it was declared in.
/// Clones share one function object.
#[derive(Clone)]
pub struct LoxFunction {
    data: Rc<LoxFunctionImpl>,
}

struct LoxFunctionImpl {
    declaration: Rc<FunctionDecl>,
    closure: Environment,
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish()
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Environment) -> LoxFunction {
        LoxFunction {
            data: Rc::new(LoxFunctionImpl {
                declaration,
                closure,
            }),
        }
    }
    pub fn name(&self) -> &str {
        &self.data.declaration.name.lexeme
    }
    pub fn equals(&self, other: &LoxFunction) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.data.declaration.params.len()
    }
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        trace!(function = self.name(), line, "call");
        // Parent is the closure, never the caller's environment.
        let declaration = &self.data.declaration;
        let mut environment = self.data.closure.new_child();
        for (param, argument) in declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }
        match interpreter.execute_block(&declaration.body, environment)? {
            Flow::Normal => Ok(Value::Nil),
            Flow::Return { value, .. } => Ok(value),
            Flow::Break { line } => Err(RuntimeError::new(
                line,
                RuntimeErrorKind::StraySignal("break"),
            )),
        }
    }
}

/// A primitive implemented in Rust.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub function: fn(&[Value]) -> Value,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}

impl NativeFunction {
    pub fn equals(&self, other: &NativeFunction) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }
    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _line: usize,
    ) -> Result<Value, RuntimeError> {
        Ok((self.function)(&arguments))
    }
}

/// The primitives every fresh interpreter defines globally.
pub fn natives() -> Vec<NativeFunction> {
    vec![NativeFunction {
        name: "clock",
        arity: 0,
        function: clock,
    }]
}

fn clock(_arguments: &[Value]) -> Value {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0);
    Value::Number(seconds)
}
