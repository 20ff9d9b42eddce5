//! Host-native objects exposed with a fixed attribute surface.
//!
//! A [`HostObject`] stands for a struct owned by the embedding program. It has
//! no class and no `__dict__`: its attributes are a closed set of typed fields
//! plus accessors backed by host functions.
//!
//! | Attribute | Read | Write | Delete |
//! |-----------|------|-------|--------|
//! | settable field | value | type-checked store | `NotDeletable` |
//! | read-only field | value | `NotSettable` | `NotDeletable` |
//! | method accessor | bound method | `NotSettable` | `NotDeletable` |
//! | property accessor | result of calling it | `NotSettable` | `NotDeletable` |
//! | anything else | `Missing` | `Missing` | `Missing` |

use serde::{Deserialize, Serialize};

use crate::{function::FunctionId, types::AttrMap, types::Type, value::Value};

/// A data field of a [`HostObject`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostField {
    value: Value,
    /// Declared type. `None` accepts any value.
    ty: Option<Type>,
    settable: bool,
}

impl HostField {
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn ty(&self) -> Option<Type> {
        self.ty
    }

    #[must_use]
    pub fn settable(&self) -> bool {
        self.settable
    }
}

/// How a host accessor behaves on attribute read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessorKind {
    /// Read yields a bound method; the host function receives the object first.
    Method,
    /// Read calls the host function with the object and yields its result.
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAccessor {
    pub kind: AccessorKind,
    pub func: FunctionId,
}

/// A host-owned object with typed fields and function-backed accessors.
///
/// ```
/// use pyattr::{HostObject, Session, Value};
///
/// let mut session = Session::new();
/// let obj = session
///     .new_host_object(HostObject::new("Config").field("retries", 3).read_only_field("name", "prod"))
///     .unwrap();
/// session.set_attr(&obj, "retries", 5).unwrap();
/// assert_eq!(session.get_attr(&obj, "retries").unwrap(), Value::Int(5));
/// assert!(session.set_attr(&obj, "retries", "many").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostObject {
    type_name: String,
    fields: AttrMap<HostField>,
    accessors: AttrMap<HostAccessor>,
}

impl HostObject {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: AttrMap::default(),
            accessors: AttrMap::default(),
        }
    }

    /// Adds a settable field whose type is fixed by its initial value.
    ///
    /// `None` and heap references declare no type and accept any later value.
    #[must_use]
    pub fn field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = immediate_type(&value);
        self.typed_field(name, value, ty, true)
    }

    /// Adds a field that rejects writes.
    #[must_use]
    pub fn read_only_field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = immediate_type(&value);
        self.typed_field(name, value, ty, false)
    }

    /// Adds a field with an explicit declared type.
    #[must_use]
    pub fn typed_field(mut self, name: impl Into<String>, value: Value, ty: Option<Type>, settable: bool) -> Self {
        self.fields.insert(name.into(), HostField { value, ty, settable });
        self
    }

    #[must_use]
    pub fn method(mut self, name: impl Into<String>, func: FunctionId) -> Self {
        self.accessors.insert(
            name.into(),
            HostAccessor {
                kind: AccessorKind::Method,
                func,
            },
        );
        self
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>, func: FunctionId) -> Self {
        self.accessors.insert(
            name.into(),
            HostAccessor {
                kind: AccessorKind::Property,
                func,
            },
        );
        self
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn fields(&self) -> &AttrMap<HostField> {
        &self.fields
    }

    #[must_use]
    pub fn field_value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).map(HostField::value)
    }

    #[must_use]
    pub fn host_field(&self, name: &str) -> Option<&HostField> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn accessor(&self, name: &str) -> Option<HostAccessor> {
        self.accessors.get(name).copied()
    }

    /// True if `name` is a field or an accessor.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.fields.contains_key(name) || self.accessors.contains_key(name)
    }

    /// Stores into an existing field without any checks. Returns false if there is no such field.
    pub(crate) fn store_field(&mut self, name: &str, value: Value) -> bool {
        match self.fields.get_mut(name) {
            Some(field) => {
                field.value = value;
                true
            }
            None => false,
        }
    }
}

fn immediate_type(value: &Value) -> Option<Type> {
    match value {
        Value::Bool(_) => Some(Type::Bool),
        Value::Int(_) => Some(Type::Int),
        Value::Float(_) => Some(Type::Float),
        Value::Str(_) => Some(Type::Str),
        Value::DefFunction(_) => Some(Type::Function),
        Value::None | Value::Ref(_) => None,
    }
}
