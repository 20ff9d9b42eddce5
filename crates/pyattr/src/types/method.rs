use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Static adapter created by `staticmethod(func)`.
///
/// Fetching it through a class or an instance yields `func` unchanged, with no
/// receiver injected. The wrapper itself is not callable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticMethod {
    func: Value,
}

impl StaticMethod {
    #[must_use]
    pub fn new(func: impl Into<Value>) -> Self {
        Self { func: func.into() }
    }

    /// The wrapped callable (`__func__`).
    #[must_use]
    pub fn func(&self) -> &Value {
        &self.func
    }
}

/// A function paired with the receiver it was fetched through.
///
/// Calling it calls `func(self_arg, *args)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundMethod {
    func: Value,
    self_arg: Value,
}

impl BoundMethod {
    #[must_use]
    pub fn new(func: Value, self_arg: Value) -> Self {
        Self { func, self_arg }
    }

    /// The underlying function (`__func__`).
    #[must_use]
    pub fn func(&self) -> &Value {
        &self.func
    }

    /// The receiver (`__self__`).
    #[must_use]
    pub fn self_arg(&self) -> &Value {
        &self.self_arg
    }
}
