use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope frame.  Closures and bound methods keep frames
/// alive past the block or call that created them.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope frame: its own bindings plus a link to the enclosing frame.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}

impl Environment {
    /// A fresh frame already wrapped in a shared handle.
    pub fn new_ref(enclosing: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing,
        }))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind `name` in this frame, shadowing nothing above and replacing any
    /// previous binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define {} = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Binding held by this frame itself, ignoring enclosing frames.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Dynamic lookup, innermost frame first.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Update the nearest existing binding.  Never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Walk exactly `distance` parent links from `env`.
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut frame: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let parent: EnvRef = frame.borrow().enclosing.clone()?;
            frame = parent;
        }

        Some(frame)
    }

    /// Read a binding the resolver placed `distance` frames up.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value, RuntimeError> {
        let frame: EnvRef = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let value: Option<Value> = frame.borrow().values.get(&name.lexeme).cloned();

        value.ok_or_else(|| undefined(name))
    }

    /// Write a binding the resolver placed `distance` frames up.
    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let frame: EnvRef = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn lookup_walks_upward_only() {
        let globals: EnvRef = Environment::new_ref(None);
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner: EnvRef = Environment::new_ref(Some(Rc::clone(&globals)));
        inner.borrow_mut().define("b", Value::Number(2.0));

        assert_eq!(inner.borrow().get(&ident("a")).unwrap(), Value::Number(1.0));
        assert!(globals.borrow().get(&ident("b")).is_err());
    }

    #[test]
    fn assign_updates_defining_frame() {
        let globals: EnvRef = Environment::new_ref(None);
        globals.borrow_mut().define("a", Value::Number(1.0));
        let inner: EnvRef = Environment::new_ref(Some(Rc::clone(&globals)));

        inner
            .borrow_mut()
            .assign(&ident("a"), Value::Number(5.0))
            .unwrap();

        assert_eq!(globals.borrow().get(&ident("a")).unwrap(), Value::Number(5.0));
        assert!(inner
            .borrow_mut()
            .assign(&ident("missing"), Value::Nil)
            .is_err());
    }

    #[test]
    fn distance_lookup_skips_shadowing_frames() {
        let outer: EnvRef = Environment::new_ref(None);
        outer.borrow_mut().define("x", Value::String("outer".into()));
        let middle: EnvRef = Environment::new_ref(Some(Rc::clone(&outer)));
        middle.borrow_mut().define("x", Value::String("middle".into()));
        let inner: EnvRef = Environment::new_ref(Some(Rc::clone(&middle)));

        assert_eq!(
            Environment::get_at(&inner, 2, &ident("x")).unwrap(),
            Value::String("outer".into())
        );
        assert_eq!(
            Environment::get_at(&inner, 1, &ident("x")).unwrap(),
            Value::String("middle".into())
        );

        Environment::assign_at(&inner, 2, &ident("x"), Value::Bool(true)).unwrap();
        assert_eq!(outer.borrow().get(&ident("x")).unwrap(), Value::Bool(true));
        assert!(Environment::get_at(&inner, 5, &ident("x")).is_err());
    }
}
