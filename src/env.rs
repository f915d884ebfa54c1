use crate::error::{Result, SchemeError};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One frame in the lexical environment chain: a mapping from identifier to
/// value, plus an optional link to the enclosing frame. The outer link is
/// fixed at construction (frames are structurally immutable); bindings
/// themselves are mutable through `define`/`assign`.
#[derive(Debug, Clone)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    parent: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    pub fn new_child(parent: Rc<RefCell<Environment>>) -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Builds a fresh child frame binding `names` to `values` pairwise.
    /// Fails if the two slices have different lengths (SPEC_FULL.md §4.1).
    pub fn extend(
        parent: Rc<RefCell<Environment>>,
        names: &[String],
        values: Vec<Value>,
    ) -> Result<Environment> {
        if names.len() != values.len() {
            return Err(SchemeError::ArityMismatch {
                expected: names.len().to_string(),
                got: values.len(),
            });
        }
        let mut bindings = HashMap::with_capacity(names.len());
        for (name, value) in names.iter().cloned().zip(values) {
            bindings.insert(name, value);
        }
        Ok(Environment {
            bindings,
            parent: Some(parent),
        })
    }

    /// Inserts or overwrites a binding in the current frame only.
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    pub fn lookup_local(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }

    /// Walks outer links until the name is found or the chain is exhausted.
    pub fn lookup(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.bindings.get(name) {
            Ok(value.clone())
        } else if let Some(parent_env) = &self.parent {
            parent_env.borrow().lookup(name)
        } else {
            Err(SchemeError::UndefinedIdentifier(name.to_string()))
        }
    }

    /// Mutates the nearest enclosing binding that defines `name`; fails if
    /// no frame in the chain defines it.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<()> {
        if self.bindings.contains_key(name) {
            self.bindings.insert(name.to_string(), value);
            Ok(())
        } else if let Some(parent_env) = &self.parent {
            parent_env.borrow_mut().assign(name, value)
        } else {
            Err(SchemeError::UndefinedIdentifier(name.to_string()))
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
