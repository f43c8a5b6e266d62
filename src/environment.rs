use crate::interpreter::{RuntimeError, RuntimeErrorKind};
use crate::shared_list::SharedList;
use crate::token::Token;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A chain of scopes, innermost first. Cloning an environment shares the
/// scopes, which is how closures keep their defining scope alive.
#[derive(Clone)]
pub struct Environment {
    scopes: SharedList<BTreeMap<String, Value>>,
}

impl fmt::Debug for Environment {
    // Scopes can hold closures that point back at them, so only summarize.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("depth", &self.depth())
            .finish()
    }
}

impl Environment {
    pub fn new() -> Environment {
        let mut scopes = SharedList::new();
        scopes.push(BTreeMap::new());
        Environment { scopes }
    }
    pub fn new_child(&self) -> Environment {
        let mut scopes = self.scopes.clone();
        scopes.push(BTreeMap::new());
        Environment { scopes }
    }
    /// Binds `name` in the innermost scope, replacing any binding it already
    /// had there.
    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(mut scope) = self.scopes.peek_mut() {
            scope.insert(name.to_string(), value);
        }
    }
    pub fn get(&self, token: &Token) -> Result<Value, RuntimeError> {
        self.scopes
            .find_map(|scope| scope.get(&token.lexeme).cloned())
            .ok_or_else(|| undefined(token))
    }
    /// Rebinds the nearest existing `name`. Never creates a binding.
    pub fn assign(&mut self, token: &Token, value: Value) -> Result<(), RuntimeError> {
        let mut pending = Some(value);
        self.scopes
            .find_map_mut(|scope| {
                scope.get_mut(&token.lexeme).map(|slot| {
                    if let Some(value) = pending.take() {
                        *slot = value;
                    }
                })
            })
            .ok_or_else(|| undefined(token))
    }
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

fn undefined(token: &Token) -> RuntimeError {
    RuntimeError::new(
        token.line,
        RuntimeErrorKind::UndefinedVariable(token.lexeme.clone()),
    )
}
