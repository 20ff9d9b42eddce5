use serde::{Deserialize, Serialize};

use crate::value::Value;

/// User-defined property descriptor created by `property(...)`.
///
/// Stores optional getter, setter and deleter callables. When accessed through an
/// instance:
/// - `obj.prop` calls the getter
/// - `obj.prop = val` calls the setter (if defined)
/// - `del obj.prop` calls the deleter (if defined)
///
/// The property type itself always exposes all three operations, so a property
/// is always a data descriptor. A missing callable surfaces as a dedicated
/// failure when the operation is attempted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProperty {
    /// The getter function (called on attribute access).
    fget: Option<Value>,
    /// The setter function (called on attribute assignment).
    fset: Option<Value>,
    /// The deleter function (called on attribute deletion).
    fdel: Option<Value>,
    /// Explicit property docstring. When absent, `__doc__` falls back to the getter's docstring.
    doc: Option<String>,
}

impl UserProperty {
    /// Creates a new UserProperty with only a getter.
    #[must_use]
    pub fn new(fget: impl Into<Value>) -> Self {
        Self {
            fget: Some(fget.into()),
            ..Self::default()
        }
    }

    /// Returns the getter function, if any.
    #[must_use]
    pub fn fget(&self) -> Option<&Value> {
        self.fget.as_ref()
    }

    /// Returns the setter function, if any.
    #[must_use]
    pub fn fset(&self) -> Option<&Value> {
        self.fset.as_ref()
    }

    /// Returns the deleter function, if any.
    #[must_use]
    pub fn fdel(&self) -> Option<&Value> {
        self.fdel.as_ref()
    }

    /// The getter, setter and deleter that are present, in that order.
    pub(crate) fn callables(&self) -> impl Iterator<Item = &Value> {
        [self.fget.as_ref(), self.fset.as_ref(), self.fdel.as_ref()].into_iter().flatten()
    }

    /// Returns the explicit docstring, if provided.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Returns a copy of this property with the getter replaced (`@prop.getter`).
    #[must_use]
    pub fn with_getter(self, fget: impl Into<Value>) -> Self {
        Self {
            fget: Some(fget.into()),
            ..self
        }
    }

    /// Returns a copy of this property with the setter replaced (`@prop.setter`).
    #[must_use]
    pub fn with_setter(self, fset: impl Into<Value>) -> Self {
        Self {
            fset: Some(fset.into()),
            ..self
        }
    }

    /// Returns a copy of this property with the deleter replaced (`@prop.deleter`).
    #[must_use]
    pub fn with_deleter(self, fdel: impl Into<Value>) -> Self {
        Self {
            fdel: Some(fdel.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_doc(self, doc: impl Into<String>) -> Self {
        Self {
            doc: Some(doc.into()),
            ..self
        }
    }
}
