use crate::ast::AstPrinter;
use crate::interpreter::{Interpreter, RuntimeError};
use crate::parser::{self, ParseErrors};
use crate::scanner::{self, ScanError};
use num_enum::IntoPrimitive;
use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use tracing::debug;

/// Process exit statuses, following `sysexits.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    DataError = 65,
    Software = 70,
    IoError = 74,
}

#[derive(Debug)]
pub enum LoxError {
    Scan(Vec<ScanError>),
    Parse(ParseErrors),
    Runtime(RuntimeError),
    Io(io::Error),
}

impl LoxError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            LoxError::Scan(_) | LoxError::Parse(_) => ExitCode::DataError,
            LoxError::Runtime(_) => ExitCode::Software,
            LoxError::Io(_) => ExitCode::IoError,
        }
    }
}

impl fmt::Display for LoxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoxError::Scan(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            LoxError::Parse(errors) => write!(f, "{}", errors),
            LoxError::Runtime(err) => write!(f, "{}", err),
            LoxError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for LoxError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoxError::Scan(_) => None,
            LoxError::Parse(errors) => Some(errors),
            LoxError::Runtime(err) => Some(err),
            LoxError::Io(err) => Some(err),
        }
    }
}

/// Runs source text against one long-lived interpreter, so definitions made
/// by one run are visible to the next (as in a prompt).
pub struct Session {
    interpreter: Interpreter,
    print_ast: bool,
}

impl Session {
    pub fn new() -> Session {
        Session::with_output(Box::new(io::stdout()))
    }
    pub fn with_output(output: Box<dyn Write>) -> Session {
        Session {
            interpreter: Interpreter::with_output(output),
            print_ast: false,
        }
    }
    /// Print each parsed statement instead of executing it.
    pub fn print_ast(mut self, enabled: bool) -> Session {
        self.print_ast = enabled;
        self
    }
    pub fn run(&mut self, source: &str) -> Result<(), LoxError> {
        let tokens = scanner::scan_tokens(source).map_err(LoxError::Scan)?;
        let statements = parser::parse(&tokens).map_err(LoxError::Parse)?;
        debug!(statements = statements.len(), "parsed");
        if self.print_ast {
            let printer = AstPrinter {};
            let output = self.interpreter.output();
            for stmt in &statements {
                writeln!(output, "{}", printer.print_stmt(stmt)).map_err(LoxError::Io)?;
            }
            return Ok(());
        }
        self.interpreter
            .interpret(&statements)
            .map_err(LoxError::Runtime)
    }
}
