//! Descriptor classification of class-body entries.

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::{
    function::FunctionId,
    heap::{Heap, HeapData, HeapId},
    resource::ResourceTracker,
    value::Value,
};

/// A class-level attribute, tagged with how it takes part in attribute access.
///
/// Computed once when the class is built; the class body is frozen afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Member {
    /// Ordinary class attribute, returned unchanged and shadowed by instance storage.
    PlainValue(Value),
    /// Exposes get and at least one of set/delete. Always wins over instance storage.
    ///
    /// `can_set` / `can_delete` record which optional capabilities the
    /// descriptor's type provides.
    DataDescriptor {
        descriptor: HeapId,
        can_set: bool,
        can_delete: bool,
    },
    /// Exposes get only. Yields to instance storage.
    NonDataDescriptor(HeapId),
    /// An ordinary function; binds to the receiver when fetched through an instance.
    PlainCallable(FunctionId),
}

/// Tag of a [`Member`] without its payload, used by tracers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize, Deserialize)]
pub enum MemberKind {
    PlainValue,
    DataDescriptor,
    NonDataDescriptor,
    PlainCallable,
}

impl Member {
    /// Classifies a class-body value.
    ///
    /// - properties are data descriptors
    /// - static adapters are non-data descriptors
    /// - host functions are plain callables
    /// - an instance whose class defines `__get__` is a descriptor, a data one if
    ///   it also defines `__set__` or `__delete__`
    /// - everything else is a plain value
    #[must_use]
    pub fn classify(value: Value, heap: &Heap<impl ResourceTracker>) -> Self {
        let id = match value {
            Value::DefFunction(func) => return Self::PlainCallable(func),
            Value::Ref(id) => id,
            other => return Self::PlainValue(other),
        };
        match heap.get(id) {
            HeapData::UserProperty(_) => Self::DataDescriptor {
                descriptor: id,
                can_set: true,
                can_delete: true,
            },
            HeapData::StaticMethod(_) => Self::NonDataDescriptor(id),
            HeapData::Instance(inst) => {
                let class_id = inst.class_id();
                if !heap.chain_has_attr(class_id, "__get__") {
                    return Self::PlainValue(value);
                }
                let can_set = heap.chain_has_attr(class_id, "__set__");
                let can_delete = heap.chain_has_attr(class_id, "__delete__");
                if can_set || can_delete {
                    Self::DataDescriptor {
                        descriptor: id,
                        can_set,
                        can_delete,
                    }
                } else {
                    Self::NonDataDescriptor(id)
                }
            }
            HeapData::ClassObject(_) | HeapData::BoundMethod(_) | HeapData::HostObject(_) => Self::PlainValue(value),
        }
    }

    #[must_use]
    pub fn kind(&self) -> MemberKind {
        match self {
            Self::PlainValue(_) => MemberKind::PlainValue,
            Self::DataDescriptor { .. } => MemberKind::DataDescriptor,
            Self::NonDataDescriptor(_) => MemberKind::NonDataDescriptor,
            Self::PlainCallable(_) => MemberKind::PlainCallable,
        }
    }

    /// The raw object stored in the class body, as `A.__dict__[name]` would return it.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::PlainValue(value) => value.clone(),
            Self::DataDescriptor { descriptor, .. } | Self::NonDataDescriptor(descriptor) => Value::Ref(*descriptor),
            Self::PlainCallable(func) => Value::DefFunction(*func),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        resource::NoLimitTracker,
        types::{ClassBuilder, StaticMethod, UserProperty},
    };

    fn heap() -> Heap<NoLimitTracker> {
        Heap::new(16, NoLimitTracker)
    }

    #[test]
    fn immediates_and_functions() {
        let heap = heap();
        assert_eq!(Member::classify(Value::Int(3), &heap), Member::PlainValue(Value::Int(3)));
        let func = FunctionId::new(0);
        assert_eq!(
            Member::classify(Value::DefFunction(func), &heap),
            Member::PlainCallable(func)
        );
    }

    #[test]
    fn property_is_always_data_descriptor() {
        let mut heap = heap();
        let id = heap
            .allocate(HeapData::UserProperty(UserProperty::new(FunctionId::new(0))))
            .unwrap();
        assert_eq!(
            Member::classify(Value::Ref(id), &heap),
            Member::DataDescriptor {
                descriptor: id,
                can_set: true,
                can_delete: true
            }
        );
    }

    #[test]
    fn static_adapter_is_non_data() {
        let mut heap = heap();
        let id = heap
            .allocate(HeapData::StaticMethod(StaticMethod::new(FunctionId::new(0))))
            .unwrap();
        assert_eq!(Member::classify(Value::Ref(id), &heap), Member::NonDataDescriptor(id));
    }

    /// Instances are classified by the hooks their class chain defines.
    #[test]
    fn user_descriptor_instances() {
        let mut heap = heap();
        let hook = FunctionId::new(0);

        let get_only = ClassBuilder::new("GetOnly").method("__get__", hook).build(&mut heap).unwrap();
        let get_set = ClassBuilder::new("GetSet")
            .parent(get_only)
            .method("__set__", hook)
            .build(&mut heap)
            .unwrap();
        let set_only = ClassBuilder::new("SetOnly").method("__set__", hook).build(&mut heap).unwrap();

        let a = heap.new_instance(get_only).unwrap();
        let b = heap.new_instance(get_set).unwrap();
        let c = heap.new_instance(set_only).unwrap();

        assert_eq!(Member::classify(Value::Ref(a), &heap).kind(), MemberKind::NonDataDescriptor);
        assert_eq!(
            Member::classify(Value::Ref(b), &heap),
            Member::DataDescriptor {
                descriptor: b,
                can_set: true,
                can_delete: false
            }
        );
        assert_eq!(Member::classify(Value::Ref(c), &heap).kind(), MemberKind::PlainValue);
        assert_eq!(
            Member::classify(Value::Ref(get_only), &heap).kind(),
            MemberKind::PlainValue
        );
    }
}
