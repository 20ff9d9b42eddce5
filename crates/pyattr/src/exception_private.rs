use std::{
    borrow::Cow,
    fmt::{self, Display},
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Python exception classes the engine (or a host callable) can raise.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `TypeError` -> "TypeError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ExcType {
    /// primary exception class - matches any exception in isinstance checks.
    Exception,
    AttributeError,
    TypeError,
    ValueError,
    KeyError,
    LookupError,
    /// Intermediate class for runtime errors.
    RuntimeError,
    /// Subclass of RuntimeError.
    RecursionError,
    /// Subclass of RuntimeError.
    NotImplementedError,
    MemoryError,
}

impl ExcType {
    /// Checks if this exception type is a subclass of another exception type.
    ///
    /// Returns true if `self` would be caught by `except handler_type:`.
    #[must_use]
    pub fn is_subclass_of(self, handler_type: Self) -> bool {
        if self == handler_type {
            return true;
        }
        match handler_type {
            Self::Exception => true,
            Self::LookupError => matches!(self, Self::KeyError),
            Self::RuntimeError => matches!(self, Self::RecursionError | Self::NotImplementedError),
            _ => false,
        }
    }

    /// Creates an AttributeError for an attribute found nowhere on an object.
    ///
    /// Matches CPython's format: `'A' object has no attribute 'x'`.
    #[must_use]
    pub(crate) fn attribute_error(type_name: impl Display, attr: &str) -> RunError {
        let type_name = type_name.to_string();
        SimpleException::new_msg(
            Self::AttributeError,
            format!("'{type_name}' object has no attribute '{attr}'"),
        )
        .with_failure(AttrFailure::Missing {
            type_name,
            attr: attr.to_owned(),
        })
        .into()
    }

    /// Creates an AttributeError for an attribute missing on a class object.
    ///
    /// Matches CPython's format: `type object 'A' has no attribute 'x'`.
    #[must_use]
    pub(crate) fn attribute_error_type_object(class_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("type object '{class_name}' has no attribute '{attr}'"),
        )
        .with_failure(AttrFailure::Missing {
            type_name: class_name.to_owned(),
            attr: attr.to_owned(),
        })
        .into()
    }

    /// Creates an AttributeError for reading a property that has no getter.
    #[must_use]
    pub(crate) fn attribute_error_no_getter(type_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("property '{attr}' of '{type_name}' object has no getter"),
        )
        .with_failure(AttrFailure::NotReadable {
            type_name: type_name.to_owned(),
            attr: attr.to_owned(),
        })
        .into()
    }

    /// Creates an AttributeError for assigning to a property that has no setter.
    ///
    /// Matches CPython 3.11+: `property 'x' of 'A' object has no setter`.
    #[must_use]
    pub(crate) fn attribute_error_no_setter(type_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("property '{attr}' of '{type_name}' object has no setter"),
        )
        .with_failure(AttrFailure::NotSettable {
            type_name: type_name.to_owned(),
            attr: attr.to_owned(),
        })
        .into()
    }

    /// Creates an AttributeError for deleting a property that has no deleter.
    #[must_use]
    pub(crate) fn attribute_error_no_deleter(type_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("property '{attr}' of '{type_name}' object has no deleter"),
        )
        .with_failure(AttrFailure::NotDeletable {
            type_name: type_name.to_owned(),
            attr: attr.to_owned(),
        })
        .into()
    }

    /// Creates an AttributeError for assigning through a user descriptor without `__set__`.
    #[must_use]
    pub(crate) fn attribute_error_read_only(type_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("'{type_name}' object attribute '{attr}' is read-only"),
        )
        .with_failure(AttrFailure::NotSettable {
            type_name: type_name.to_owned(),
            attr: attr.to_owned(),
        })
        .into()
    }

    /// Creates an AttributeError for deleting through a user descriptor without `__delete__`.
    #[must_use]
    pub(crate) fn attribute_error_cannot_delete(type_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("'{type_name}' object attribute '{attr}' cannot be deleted"),
        )
        .with_failure(AttrFailure::NotDeletable {
            type_name: type_name.to_owned(),
            attr: attr.to_owned(),
        })
        .into()
    }

    /// Creates an AttributeError for writing a host object attribute that rejects writes.
    #[must_use]
    pub(crate) fn attribute_error_not_settable(type_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(Self::AttributeError, format!("'{attr}' attribute is not settable"))
            .with_failure(AttrFailure::NotSettable {
                type_name: type_name.to_owned(),
                attr: attr.to_owned(),
            })
            .into()
    }

    /// Creates a TypeError for storing a value of the wrong type into a typed host field.
    #[must_use]
    pub(crate) fn type_error_not_assignable(type_name: &str, attr: &str, expected: &str, actual: &str) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("'{actual}' type is not assignable to '{expected}' type"),
        )
        .with_failure(AttrFailure::NotAssignable {
            type_name: type_name.to_owned(),
            attr: attr.to_owned(),
            expected: expected.to_owned(),
            actual: actual.to_owned(),
        })
        .into()
    }

    /// Creates an AttributeError for attribute assignment on values without attribute storage.
    ///
    /// Matches CPython's format for setting attributes on built-in types.
    #[must_use]
    pub(crate) fn attribute_error_no_setattr(type_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("'{type_name}' object has no attribute '{attr}' and no __dict__ for setting new attributes"),
        )
        .with_failure(AttrFailure::NotSettable {
            type_name: type_name.to_owned(),
            attr: attr.to_owned(),
        })
        .into()
    }

    /// Creates an AttributeError for attribute deletion on values without attribute storage.
    #[must_use]
    pub(crate) fn attribute_error_no_delattr(type_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("'{type_name}' object has no attribute '{attr}'"),
        )
        .with_failure(AttrFailure::NotDeletable {
            type_name: type_name.to_owned(),
            attr: attr.to_owned(),
        })
        .into()
    }

    /// Creates a TypeError for assigning to an attribute of a frozen class.
    ///
    /// Matches CPython's format: `cannot set 'x' attribute of immutable type 'A'`.
    #[must_use]
    pub(crate) fn type_error_immutable_set(class_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("cannot set '{attr}' attribute of immutable type '{class_name}'"),
        )
        .with_failure(AttrFailure::NotSettable {
            type_name: class_name.to_owned(),
            attr: attr.to_owned(),
        })
        .into()
    }

    /// Creates a TypeError for deleting an attribute of a frozen class.
    #[must_use]
    pub(crate) fn type_error_immutable_delete(class_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("cannot delete '{attr}' attribute of immutable type '{class_name}'"),
        )
        .with_failure(AttrFailure::NotDeletable {
            type_name: class_name.to_owned(),
            attr: attr.to_owned(),
        })
        .into()
    }

    /// Creates a TypeError for calling a value that does not support calls.
    ///
    /// Matches CPython's format: `'int' object is not callable`.
    #[must_use]
    pub(crate) fn type_error_not_callable(type_name: impl Display) -> RunError {
        let type_name = type_name.to_string();
        SimpleException::new_msg(Self::TypeError, format!("'{type_name}' object is not callable"))
            .with_failure(AttrFailure::NotCallable { type_name })
            .into()
    }

    /// Creates a TypeError for a positional argument count mismatch.
    ///
    /// Matches CPython's format: `f() takes 1 positional argument but 2 were given`.
    #[must_use]
    pub(crate) fn type_error_arg_count(name: &str, expected: usize, actual: usize) -> RunError {
        let plural = if expected == 1 { "argument" } else { "arguments" };
        let verb = if actual == 1 { "was" } else { "were" };
        SimpleException::new_msg(
            Self::TypeError,
            format!("{name}() takes {expected} positional {plural} but {actual} {verb} given"),
        )
        .into()
    }

    /// Creates a TypeError for instantiating a class without `__init__` with arguments.
    #[must_use]
    pub(crate) fn type_error_no_args(name: &str) -> RunError {
        SimpleException::new_msg(Self::TypeError, format!("{name}() takes no arguments")).into()
    }

    #[must_use]
    pub(crate) fn type_error(msg: impl Display) -> RunError {
        SimpleException::new_msg(Self::TypeError, msg).into()
    }
}

/// Discriminated attribute-protocol failure kinds.
///
/// Every failure the engine raises on its own carries one of these, with the
/// `(type_name, attr)` context a host needs to render its own message. Errors
/// raised by host callables carry none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrFailure {
    /// No member found in instance storage or anywhere along the class chain.
    Missing { type_name: String, attr: String },
    /// A property without a getter was read.
    NotReadable { type_name: String, attr: String },
    /// A data descriptor without a set capability was written.
    NotSettable { type_name: String, attr: String },
    /// A data descriptor without a delete capability was deleted.
    NotDeletable { type_name: String, attr: String },
    /// A typed host field was given a value of another type.
    NotAssignable {
        type_name: String,
        attr: String,
        expected: String,
        actual: String,
    },
    /// A value without call semantics was invoked.
    NotCallable { type_name: String },
}

impl AttrFailure {
    /// Returns the type name the failure refers to.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Missing { type_name, .. }
            | Self::NotReadable { type_name, .. }
            | Self::NotSettable { type_name, .. }
            | Self::NotDeletable { type_name, .. }
            | Self::NotAssignable { type_name, .. }
            | Self::NotCallable { type_name } => type_name,
        }
    }

    /// Returns the attribute name, if the failure concerns an attribute.
    #[must_use]
    pub fn attr(&self) -> Option<&str> {
        match self {
            Self::Missing { attr, .. }
            | Self::NotReadable { attr, .. }
            | Self::NotSettable { attr, .. }
            | Self::NotDeletable { attr, .. }
            | Self::NotAssignable { attr, .. } => Some(attr),
            Self::NotCallable { .. } => None,
        }
    }
}

/// A raised exception: class, optional message, and the failure kind when the
/// engine itself raised it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleException {
    exc_type: ExcType,
    arg: Option<String>,
    #[serde(default)]
    failure: Option<AttrFailure>,
}

impl SimpleException {
    /// Creates a new exception with the given type and optional argument message.
    #[must_use]
    pub fn new(exc_type: ExcType, arg: Option<String>) -> Self {
        Self {
            exc_type,
            arg,
            failure: None,
        }
    }

    /// Creates a new exception with the given type and argument message.
    #[must_use]
    pub fn new_msg(exc_type: ExcType, arg: impl Display) -> Self {
        Self::new(exc_type, Some(arg.to_string()))
    }

    #[must_use]
    pub(crate) fn with_failure(mut self, failure: AttrFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    #[must_use]
    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&AttrFailure> {
        self.failure.as_ref()
    }
}

impl fmt::Display for SimpleException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}: {arg}", self.exc_type),
            None => write!(f, "{}", self.exc_type),
        }
    }
}

/// Runtime error returned to the host evaluator.
#[derive(Debug, Clone)]
pub enum RunError {
    /// Internal engine error - indicates a bug in the engine or a misused handle, not user code.
    Internal(Cow<'static, str>),
    /// Catchable Python exception (e.g., AttributeError, TypeError).
    Exc(Box<SimpleException>),
    /// Exception from resource limits that user code must not be able to suppress.
    UncatchableExc(Box<SimpleException>),
}

impl From<SimpleException> for RunError {
    fn from(exc: SimpleException) -> Self {
        Self::Exc(Box::new(exc))
    }
}

impl RunError {
    pub fn internal(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the raised exception, if this is not an internal error.
    #[must_use]
    pub fn exception(&self) -> Option<&SimpleException> {
        match self {
            Self::Exc(exc) | Self::UncatchableExc(exc) => Some(exc),
            Self::Internal(_) => None,
        }
    }

    /// Returns the exception class, if this is not an internal error.
    #[must_use]
    pub fn exc_type(&self) -> Option<ExcType> {
        self.exception().map(SimpleException::exc_type)
    }

    /// Returns the attribute-protocol failure kind, if the engine raised this error.
    #[must_use]
    pub fn failure(&self) -> Option<&AttrFailure> {
        self.exception().and_then(SimpleException::failure)
    }

    /// Returns true if this error is a catchable exception of `exc_type`.
    #[must_use]
    pub fn is_exception_type(&self, exc_type: ExcType) -> bool {
        match self {
            Self::Exc(exc) => exc.exc_type() == exc_type,
            _ => false,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(msg) => write!(f, "internal error in pyattr: {msg}"),
            Self::Exc(exc) | Self::UncatchableExc(exc) => write!(f, "{exc}"),
        }
    }
}

impl std::error::Error for RunError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_count_message_agrees_in_number() {
        let err = ExcType::type_error_arg_count("foo", 0, 1);
        assert_eq!(
            err.to_string(),
            "TypeError: foo() takes 0 positional arguments but 1 was given"
        );
        let err = ExcType::type_error_arg_count("bar", 1, 2);
        assert_eq!(
            err.to_string(),
            "TypeError: bar() takes 1 positional argument but 2 were given"
        );
    }

    #[test]
    fn engine_errors_carry_failure_kind() {
        let err = ExcType::attribute_error("A", "x");
        assert_eq!(err.exc_type(), Some(ExcType::AttributeError));
        assert_eq!(
            err.failure(),
            Some(&AttrFailure::Missing {
                type_name: "A".to_owned(),
                attr: "x".to_owned()
            })
        );
        assert_eq!(ExcType::type_error("boom").failure(), None);
    }

    #[test]
    fn subclass_relationships() {
        assert!(ExcType::RecursionError.is_subclass_of(ExcType::RuntimeError));
        assert!(ExcType::AttributeError.is_subclass_of(ExcType::Exception));
        assert!(!ExcType::AttributeError.is_subclass_of(ExcType::TypeError));
    }
}
