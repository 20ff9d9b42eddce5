use serde::{Deserialize, Serialize};

use crate::{
    function::FunctionId,
    heap::{Heap, HeapData, HeapId},
    resource::ResourceTracker,
    types::Type,
};

/// Primary value type seen by the attribute engine.
///
/// Immediates are stored inline. Everything with identity (classes, instances,
/// descriptor wrappers, bound methods) lives on the [`Heap`] and is referenced
/// through `Ref`. Cloning a `Ref` copies the handle, not the object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A function owned by the host. The engine never looks inside it; calls
    /// are routed through [`CallHost`](crate::CallHost).
    DefFunction(FunctionId),
    /// Reference to a heap object.
    Ref(HeapId),
}

impl Value {
    /// Identity comparison, Python's `is`.
    ///
    /// Heap values are identical only when they share a `HeapId`; immediates
    /// compare by value.
    #[must_use]
    pub fn is(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ref(a), Self::Ref(b)) => a == b,
            (Self::Ref(_), _) | (_, Self::Ref(_)) => false,
            _ => self == other,
        }
    }

    /// Returns the heap id if this value is a heap reference.
    #[must_use]
    pub fn ref_id(&self) -> Option<HeapId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the builtin type of this value.
    ///
    /// User instances report [`Type::Object`]; use [`Value::type_name`] when
    /// the class name is needed.
    #[must_use]
    pub fn py_type(&self, heap: &Heap<impl ResourceTracker>) -> Type {
        match self {
            Self::None => Type::NoneType,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Str(_) => Type::Str,
            Self::DefFunction(_) => Type::Function,
            Self::Ref(id) => heap.get(*id).py_type(),
        }
    }

    /// Returns the name used for this value's type in error messages.
    ///
    /// Instances render as their class name and host objects as their host
    /// type name. Everything else uses the builtin type name (`int`,
    /// `staticmethod`, ...).
    #[must_use]
    pub fn type_name(&self, heap: &Heap<impl ResourceTracker>) -> String {
        if let Self::Ref(id) = self {
            match heap.get(*id) {
                HeapData::Instance(inst) => return heap.class_name(inst.class_id()).to_owned(),
                HeapData::HostObject(obj) => return obj.type_name().to_owned(),
                _ => {}
            }
        }
        self.py_type(heap).to_string()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<FunctionId> for Value {
    fn from(func: FunctionId) -> Self {
        Self::DefFunction(func)
    }
}

impl From<HeapId> for Value {
    fn from(id: HeapId) -> Self {
        Self::Ref(id)
    }
}
