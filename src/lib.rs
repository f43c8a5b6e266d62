//! A tree-walking interpreter for the Lox language.
//!
//! Source text is scanned into tokens, parsed into `ast::Stmt`s (reporting
//! every independent syntax error in one pass) and evaluated by
//! `interpreter::Interpreter`. `session::Session` ties the stages together
//! for the command line and the prompt.

pub mod ast;
pub mod callable;
pub mod environment;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod session;
pub mod shared_list;
pub mod token;
pub mod value;

#[cfg(test)]
mod test_support;
