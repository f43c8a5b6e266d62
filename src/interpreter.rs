use crate::ast::{Expr, Stmt};
use crate::callable::{self, LoxFunction};
use crate::environment::Environment;
use crate::token::{Token, TokenType};
use crate::value::Value;
use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    OperandMustBeNumber,
    OperandsMustBeNumbers,
    OperandsMustBeNumbersOrStrings,
    UndefinedVariable(String),
    NotCallable,
    ArityMismatch { expected: usize, found: usize },
    StraySignal(&'static str),
    Output(String),
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeErrorKind::OperandMustBeNumber => write!(f, "Operand must be a number."),
            RuntimeErrorKind::OperandsMustBeNumbers => write!(f, "Operands must be numbers."),
            RuntimeErrorKind::OperandsMustBeNumbersOrStrings => {
                write!(f, "Operands must be two numbers or two strings.")
            }
            RuntimeErrorKind::UndefinedVariable(name) => {
                write!(f, "Undefined variable '{}'.", name)
            }
            RuntimeErrorKind::NotCallable => write!(f, "Can only call functions."),
            RuntimeErrorKind::ArityMismatch { expected, found } => write!(
                f,
                "Expected {} arguments but got {}.",
                expected, found
            ),
            RuntimeErrorKind::StraySignal(what) => {
                write!(f, "'{}' escaped its enclosing construct.", what)
            }
            RuntimeErrorKind::Output(message) => write!(f, "Failed to write output: {}", message),
        }
    }
}

/// A fatal evaluation error. It aborts the current run but leaves the
/// interpreter usable for the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub line: usize,
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(line: usize, kind: RuntimeErrorKind) -> RuntimeError {
        RuntimeError { line, kind }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Runtime error: {}", self.line, self.kind)
    }
}

impl Error for RuntimeError {}

/// How a statement finished. Anything but `Normal` must be handed straight
/// back to the caller until the construct that owns it is reached.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return { value: Value, line: usize },
    Break { line: usize },
}

pub struct Interpreter {
    globals: Environment,
    environment: Environment,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter::with_output(Box::new(io::stdout()))
    }
    pub fn with_output(output: Box<dyn Write>) -> Interpreter {
        let mut globals = Environment::new();
        for native in callable::natives() {
            globals.define(native.name, Value::Native(native));
        }
        Interpreter {
            environment: globals.clone(),
            globals,
            output,
        }
    }
    pub fn globals(&self) -> &Environment {
        &self.globals
    }
    pub fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }
    /// Runs a whole program. Statements before a failing one keep their
    /// effects; globals survive for the next call.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        let result = self.run(statements);
        if let Err(err) = &result {
            debug!(%err, "aborting run");
        }
        result
    }
    fn run(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => (),
                Flow::Return { line, .. } => {
                    return Err(RuntimeError::new(
                        line,
                        RuntimeErrorKind::StraySignal("return"),
                    ))
                }
                Flow::Break { line } => {
                    return Err(RuntimeError::new(
                        line,
                        RuntimeErrorKind::StraySignal("break"),
                    ))
                }
            }
        }
        Ok(())
    }
    /// Executes `statements` with `environment` as the current scope, then
    /// restores the previous scope whichever way the block finished.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Environment,
    ) -> Result<Flow, RuntimeError> {
        trace!(depth = environment.depth(), "enter block");
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }
    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => (),
                signal => return Ok(signal),
            }
        }
        Ok(Flow::Normal)
    }
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expression(e) => {
                self.evaluate(e)?;
            }
            Stmt::Print { keyword, value } => {
                let value = self.evaluate(value)?;
                writeln!(self.output, "{}", value).map_err(|err| {
                    RuntimeError::new(keyword.line, RuntimeErrorKind::Output(err.to_string()))
                })?;
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Value::Nil,
                };
                self.environment.define(&name.lexeme, value);
            }
            Stmt::Block(stmts) => {
                let environment = self.environment.new_child();
                return self.execute_block(stmts, environment);
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => (),
                        Flow::Break { .. } => break,
                        signal => return Ok(signal),
                    }
                }
            }
            Stmt::Function(decl) => {
                let function = LoxFunction::new(Rc::clone(decl), self.environment.clone());
                self.environment
                    .define(&decl.name.lexeme, Value::Function(function));
            }
            Stmt::Return { keyword, value } => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return {
                    value,
                    line: keyword.line,
                });
            }
            Stmt::Break(keyword) => return Ok(Flow::Break { line: keyword.line }),
        }
        Ok(Flow::Normal)
    }
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(x) => Ok(Value::from(x)),
            Expr::Grouping(x) => self.evaluate(x),
            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.tokentype {
                    TokenType::Minus => match right {
                        Value::Number(r) => Ok(Value::Number(-r)),
                        _ => Err(RuntimeError::new(
                            operator.line,
                            RuntimeErrorKind::OperandMustBeNumber,
                        )),
                    },
                    TokenType::Bang => Ok(Value::Boolean(!right.is_truthy())),
                    _ => unreachable!("unary operator {}", operator.tokentype),
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }
            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                match operator.tokentype {
                    TokenType::Or if left.is_truthy() => Ok(left),
                    TokenType::And if !left.is_truthy() => Ok(left),
                    _ => self.evaluate(right),
                }
            }
            Expr::Variable(name) => self.environment.get(name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.assign(name, value.clone())?;
                Ok(value)
            }
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }
                let function = callee.as_callable().ok_or_else(|| {
                    RuntimeError::new(paren.line, RuntimeErrorKind::NotCallable)
                })?;
                if function.arity() != values.len() {
                    return Err(RuntimeError::new(
                        paren.line,
                        RuntimeErrorKind::ArityMismatch {
                            expected: function.arity(),
                            found: values.len(),
                        },
                    ));
                }
                function.call(self, values, paren.line)
            }
        }
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
        _ => Err(RuntimeError::new(
            operator.line,
            RuntimeErrorKind::OperandsMustBeNumbers,
        )),
    }
}

fn binary(operator: &Token, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match operator.tokentype {
        TokenType::Plus => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::String(mut l), Value::String(r)) => {
                l.push_str(&r);
                Ok(Value::String(l))
            }
            _ => Err(RuntimeError::new(
                operator.line,
                RuntimeErrorKind::OperandsMustBeNumbersOrStrings,
            )),
        },
        TokenType::EqualEqual => Ok(Value::Boolean(left.equals(&right))),
        TokenType::BangEqual => Ok(Value::Boolean(!left.equals(&right))),
        _ => {
            let (l, r) = number_operands(operator, &left, &right)?;
            Ok(match operator.tokentype {
                TokenType::Minus => Value::Number(l - r),
                TokenType::Star => Value::Number(l * r),
                TokenType::Slash => Value::Number(l / r),
                TokenType::Greater => Value::Boolean(l > r),
                TokenType::GreaterEqual => Value::Boolean(l >= r),
                TokenType::Less => Value::Boolean(l < r),
                TokenType::LessEqual => Value::Boolean(l <= r),
                _ => unreachable!("binary operator {}", operator.tokentype),
            })
        }
    }
}
