use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Builtin type of a value, as it appears in error messages.
///
/// The string form matches the Python type name (`int`, `staticmethod`, ...).
/// User-defined instances are reported as `Object`; callers that need the
/// class name go through [`Value::type_name`](crate::Value::type_name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum Type {
    #[strum(serialize = "NoneType")]
    NoneType,
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "float")]
    Float,
    #[strum(serialize = "str")]
    Str,
    #[strum(serialize = "function")]
    Function,
    /// A bound method.
    #[strum(serialize = "method")]
    Method,
    #[strum(serialize = "staticmethod")]
    StaticMethod,
    #[strum(serialize = "property")]
    Property,
    /// A class object.
    #[strum(serialize = "type")]
    Type,
    #[strum(serialize = "object")]
    Object,
}
