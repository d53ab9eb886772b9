//! Deterministic cache keys built from explicit call material.

use std::collections::BTreeMap;

use serde_json::Value;

/// Identity of a cached call: a function name plus its positional and
/// keyword arguments.
///
/// Keyword arguments are kept in a sorted map, so the order in which they
/// are supplied never changes the key.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSignature {
    function: String,
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
}

impl CallSignature {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// The cache key: `function:<args json>:<sorted kwargs json>`.
    pub fn key(&self) -> String {
        let args = Value::Array(self.args.clone());
        let kwargs = serde_json::to_string(&self.kwargs).unwrap_or_default();
        format!("{}:{}:{}", self.function, args, kwargs)
    }
}
