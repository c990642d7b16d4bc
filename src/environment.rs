use crate::error::{HandlerError, ScriptError, Span};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Native implementation behind a registered function name.
pub trait NativeFunction {
    fn call(&self, args: Vec<Value>) -> Result<Value, HandlerError>;
}

impl<F> NativeFunction for F
where
    F: Fn(Vec<Value>) -> Result<Value, HandlerError>,
{
    fn call(&self, args: Vec<Value>) -> Result<Value, HandlerError> {
        self(args)
    }
}

/// Accepted argument counts of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Variadic with a minimum; `AtLeast(0)` takes anything.
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

pub struct Function {
    pub name: String,
    pub arity: Arity,
    handler: Rc<dyn NativeFunction>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, arity: Arity, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, HandlerError> + 'static,
    {
        Self::from_native(name, arity, Rc::new(handler))
    }

    pub fn from_native(
        name: impl Into<String>,
        arity: Arity,
        handler: Rc<dyn NativeFunction>,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            handler,
        }
    }

    /// Check the argument count, then run the handler.
    pub fn invoke(&self, args: Vec<Value>, span: Span) -> Result<Value, ScriptError> {
        self.check_arity(args.len(), span)?;
        self.handler
            .call(args)
            .map_err(|error| ScriptError::Handler {
                span,
                name: self.name.clone(),
                message: error.message,
            })
    }

    pub fn check_arity(&self, got: usize, span: Span) -> Result<(), ScriptError> {
        if self.arity.accepts(got) {
            Ok(())
        } else {
            Err(ScriptError::Arity {
                span,
                name: self.name.clone(),
                expected: self.arity.to_string(),
                got,
            })
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Binding {
    Variable(Value),
    Function(Rc<Function>),
}

/// Single namespace of variables and functions for one script run.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Binding>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing whatever was there, variable or function.
    pub fn define(&mut self, name: &str, binding: Binding) {
        if let Some(previous) = self.values.insert(name.to_string(), binding) {
            tracing::trace!(name, replaced = binding_kind(&previous), "rebound name");
        }
    }

    pub fn define_variable(&mut self, name: &str, value: Value) {
        self.define(name, Binding::Variable(value));
    }

    pub fn register<F>(&mut self, name: &str, arity: Arity, handler: F)
    where
        F: Fn(Vec<Value>) -> Result<Value, HandlerError> + 'static,
    {
        self.define(name, Binding::Function(Rc::new(Function::new(name, arity, handler))));
    }

    /// Register a handler that is shared with, or owned by, the engine.
    pub fn register_native(&mut self, name: &str, arity: Arity, handler: Rc<dyn NativeFunction>) {
        self.define(
            name,
            Binding::Function(Rc::new(Function::from_native(name, arity, handler))),
        );
    }

    pub fn resolve(&self, name: &str, span: Span) -> Result<&Binding, ScriptError> {
        self.values.get(name).ok_or_else(|| ScriptError::Name {
            span,
            name: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.values.get(name)
    }

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        match self.values.get(name) {
            Some(Binding::Variable(value)) => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn binding_kind(binding: &Binding) -> &'static str {
    match binding {
        Binding::Variable(_) => "variable",
        Binding::Function(_) => "function",
    }
}
