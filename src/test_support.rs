use crate::interpreter::{Interpreter, RuntimeError};
use crate::{parser, scanner};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// An output sink tests can read back after handing a clone to the interpreter.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Scans, parses and runs `source` on a fresh interpreter. Panics on scan or
/// parse errors; returns what was printed and how the run ended.
pub fn interpret(source: &str) -> (String, Result<(), RuntimeError>) {
    let tokens = scanner::scan_tokens(source).unwrap();
    let statements = parser::parse(&tokens).unwrap();
    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(Box::new(buffer.clone()));
    let result = interpreter.interpret(&statements);
    (buffer.contents(), result)
}
