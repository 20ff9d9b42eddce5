use std::{collections::BTreeMap, mem};

use serde::{Deserialize, Serialize};

use crate::{
    exception_private::{RunError, RunResult},
    resource::{ResourceError, ResourceTracker},
    types::{BoundMethod, ClassObject, HostObject, Instance, Member, StaticMethod, Type, UserProperty},
    value::Value,
};

/// Unique identifier for values stored inside the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeapId(usize);

impl HeapId {
    #[must_use]
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// HeapData captures every object with identity the engine manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HeapData {
    ClassObject(ClassObject),
    Instance(Instance),
    UserProperty(UserProperty),
    StaticMethod(StaticMethod),
    BoundMethod(BoundMethod),
    HostObject(HostObject),
}

impl HeapData {
    /// Returns the variant name, used as the key in [`HeapStats::objects_by_type`].
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::ClassObject(_) => "ClassObject",
            Self::Instance(_) => "Instance",
            Self::UserProperty(_) => "UserProperty",
            Self::StaticMethod(_) => "StaticMethod",
            Self::BoundMethod(_) => "BoundMethod",
            Self::HostObject(_) => "HostObject",
        }
    }

    #[must_use]
    pub fn py_type(&self) -> Type {
        match self {
            Self::ClassObject(_) => Type::Type,
            Self::Instance(_) => Type::Object,
            Self::UserProperty(_) => Type::Property,
            Self::StaticMethod(_) => Type::StaticMethod,
            Self::BoundMethod(_) => Type::Method,
            Self::HostObject(_) => Type::Object,
        }
    }

    /// Heap ids this object refers to, used to validate restored snapshots.
    pub(crate) fn refs(&self) -> Vec<HeapId> {
        let values: Vec<Value> = match self {
            Self::ClassObject(cls) => {
                let mut values: Vec<Value> = cls.namespace().values().map(Member::to_value).collect();
                values.extend(cls.parent().map(Value::Ref));
                values
            }
            Self::Instance(inst) => {
                let mut values: Vec<Value> = inst.attrs().values().cloned().collect();
                values.push(Value::Ref(inst.class_id()));
                values
            }
            Self::UserProperty(prop) => prop.callables().cloned().collect(),
            Self::StaticMethod(sm) => vec![sm.func().clone()],
            Self::BoundMethod(method) => vec![method.func().clone(), method.self_arg().clone()],
            Self::HostObject(obj) => obj.fields().values().map(|field| field.value().clone()).collect(),
        };
        values.iter().filter_map(Value::ref_id).collect()
    }

    /// Approximate size in bytes, charged against `max_memory`.
    fn py_estimate_size(&self) -> usize {
        let owned = match self {
            Self::ClassObject(cls) => cls.name().len() + cls.namespace().len() * mem::size_of::<(String, Member)>(),
            Self::Instance(inst) => inst.attrs().len() * mem::size_of::<(String, Value)>(),
            Self::UserProperty(prop) => prop.doc().map_or(0, str::len),
            Self::StaticMethod(_) | Self::BoundMethod(_) => 0,
            Self::HostObject(obj) => obj.type_name().len() + obj.fields().len() * mem::size_of::<(String, Value)>(),
        };
        mem::size_of::<Self>() + owned
    }
}

/// Snapshot of heap state at a point in time.
///
/// The `objects_by_type` map uses `BTreeMap` for deterministic iteration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of live objects on the heap.
    pub live_objects: usize,
    /// Breakdown of live objects by `HeapData` variant name.
    pub objects_by_type: BTreeMap<&'static str, usize>,
    /// Resource tracker allocation count, if using `LimitedTracker`.
    pub tracker_allocations: Option<usize>,
}

/// Arena holding every class, instance and descriptor object.
///
/// Objects are never freed: lifetime management belongs to the embedding
/// evaluator. Every allocation is charged to the resource tracker first.
#[derive(Debug)]
pub struct Heap<T: ResourceTracker> {
    entries: Vec<HeapData>,
    tracker: T,
}

impl<T: ResourceTracker> Heap<T> {
    pub fn new(capacity: usize, tracker: T) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            tracker,
        }
    }

    /// Rebuilds a heap from previously saved objects, charging each to `tracker`.
    ///
    /// Ids are positional, so `HeapId`s held by the restored objects stay valid.
    pub(crate) fn restore(entries: Vec<HeapData>, tracker: T) -> Result<Self, ResourceError> {
        let mut heap = Self::new(entries.len(), tracker);
        for data in entries {
            heap.allocate(data)?;
        }
        Ok(heap)
    }

    /// Returns a reference to the resource tracker.
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Allocates a new heap entry, returning its id.
    pub fn allocate(&mut self, data: HeapData) -> Result<HeapId, ResourceError> {
        self.tracker.on_allocate(|| data.py_estimate_size())?;
        let id = HeapId::new(self.entries.len());
        self.entries.push(data);
        Ok(id)
    }

    /// Returns an immutable reference to the heap data stored at the given ID.
    ///
    /// # Panics
    /// Panics if the id does not belong to this heap.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        self.entries.get(id.index()).expect("Heap::get: slot missing")
    }

    /// Returns an immutable reference to heap data if the id is valid.
    #[must_use]
    pub fn get_if_live(&self, id: HeapId) -> Option<&HeapData> {
        self.entries.get(id.index())
    }

    /// Returns a mutable reference to the heap data stored at the given ID.
    ///
    /// # Panics
    /// Panics if the id does not belong to this heap.
    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        self.entries.get_mut(id.index()).expect("Heap::get_mut: slot missing")
    }

    /// Fails if `value` refers to a heap id this heap never allocated.
    ///
    /// Entry points taking caller-supplied values check them here, so a handle
    /// from another heap is rejected instead of reaching [`Heap::get`].
    pub fn check_value(&self, value: &Value) -> RunResult<()> {
        match value {
            Value::Ref(id) if self.get_if_live(*id).is_none() => Err(RunError::internal(format!(
                "heap id {} does not belong to this heap",
                id.index()
            ))),
            _ => Ok(()),
        }
    }

    pub(crate) fn entries(&self) -> &[HeapData] {
        &self.entries
    }

    /// Allocates a fresh instance of `class_id` with empty attribute storage.
    pub fn new_instance(&mut self, class_id: HeapId) -> RunResult<HeapId> {
        if !matches!(self.get(class_id), HeapData::ClassObject(_)) {
            return Err(RunError::internal("new_instance: not a class"));
        }
        Ok(self.allocate(HeapData::Instance(Instance::new(class_id)))?)
    }

    /// Returns the class name for `class_id`, or `"object"` if it is not a class.
    #[must_use]
    pub fn class_name(&self, class_id: HeapId) -> &str {
        match self.get(class_id) {
            HeapData::ClassObject(cls) => cls.name(),
            _ => "object",
        }
    }

    /// Walks the single-parent chain from `class_id` upward; the first class
    /// whose body defines `name` wins.
    ///
    /// Returns the member and the id of the class that defines it.
    pub fn lookup_in_chain(&self, class_id: HeapId, name: &str) -> RunResult<Option<(Member, HeapId)>> {
        let mut current = class_id;
        for _ in 0..=self.tracker.max_inheritance_depth() {
            let HeapData::ClassObject(cls) = self.get(current) else {
                return Err(RunError::internal("lookup_in_chain: not a class"));
            };
            if let Some(member) = cls.namespace().get(name) {
                return Ok(Some((member.clone(), current)));
            }
            match cls.parent() {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
        Err(RunError::internal("lookup_in_chain: inheritance chain exceeds maximum depth"))
    }

    /// Returns true if `name` is defined anywhere in the chain of `class_id`.
    #[must_use]
    pub fn chain_has_attr(&self, class_id: HeapId, name: &str) -> bool {
        matches!(self.lookup_in_chain(class_id, name), Ok(Some(_)))
    }

    /// Reads `name` from an instance's own storage.
    #[must_use]
    pub fn instance_attr(&self, instance_id: HeapId, name: &str) -> Option<Value> {
        match self.get(instance_id) {
            HeapData::Instance(inst) => inst.get_attr(name).cloned(),
            _ => None,
        }
    }

    /// Writes `name` into an instance's own storage, bypassing the descriptor protocol.
    pub fn set_instance_attr(&mut self, instance_id: HeapId, name: &str, value: Value) -> RunResult<()> {
        match self.get_mut(instance_id) {
            HeapData::Instance(inst) => {
                inst.set_attr(name, value);
                Ok(())
            }
            _ => Err(RunError::internal("set_instance_attr: not an instance")),
        }
    }

    /// Removes `name` from an instance's own storage, returning the old value if present.
    pub fn delete_instance_attr(&mut self, instance_id: HeapId, name: &str) -> Option<Value> {
        match self.get_mut(instance_id) {
            HeapData::Instance(inst) => inst.del_attr(name),
            _ => None,
        }
    }

    /// Stores into an existing host object field without type or settability checks.
    pub(crate) fn store_host_field(&mut self, id: HeapId, name: &str, value: Value) -> RunResult<()> {
        match self.get_mut(id) {
            HeapData::HostObject(obj) => {
                if obj.store_field(name, value) {
                    Ok(())
                } else {
                    Err(RunError::internal("store_host_field: no such host field"))
                }
            }
            _ => Err(RunError::internal("store_host_field: no such host field")),
        }
    }

    /// Returns a snapshot of heap statistics.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let mut objects_by_type = BTreeMap::new();
        for data in &self.entries {
            *objects_by_type.entry(data.variant_name()).or_insert(0) += 1;
        }
        HeapStats {
            live_objects: self.entries.len(),
            objects_by_type,
            tracker_allocations: self.tracker.allocation_count(),
        }
    }
}
