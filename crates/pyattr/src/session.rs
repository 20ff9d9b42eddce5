//! High-level entry point bundling a heap, a function table and a tracer.

use serde::{Deserialize, Serialize};

use crate::{
    args::ArgValues,
    exception_private::{RunError, RunResult},
    function::{Function, FunctionId, FunctionTable},
    heap::{Heap, HeapData, HeapStats},
    resource::{LimitedTracker, NoLimitTracker, ResourceLimits, ResourceTracker},
    tracer::{NoopTracer, VmTracer},
    types::{ClassBuilder, HostObject, StaticMethod, UserProperty},
    value::Value,
    vm::VM,
};

/// Serializable representation of a session for disk persistence.
///
/// Heap ids are positions in `objects`, so they survive a round trip unchanged.
/// The tracer and tracker state are not saved; the caller supplies fresh ones
/// on load.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    functions: FunctionTable,
    objects: Vec<HeapData>,
}

/// An object store with the reference [`FunctionTable`] host.
///
/// Every operation creates a short-lived [`VM`] over the session's heap and
/// tracer, so host calls made while resolving an attribute share one call depth.
///
/// Values passed in are checked against the session's heap first: a
/// [`Value::Ref`] taken from another session fails with [`RunError::Internal`].
///
/// ```
/// use pyattr::{ArgValues, ClassBuilder, Function, FunctionBody, Session, UserProperty, Value};
///
/// let mut session = Session::new();
/// let get_x = session.define_function(Function::new(
///     "x",
///     1,
///     FunctionBody::LoadAttr { arg: 0, attr: "_x".to_owned() },
/// ));
/// let class = session
///     .define_class(ClassBuilder::new("Point").attr("_x", 3).property("x", UserProperty::new(get_x)))
///     .unwrap();
/// let point = session.call(&class, ArgValues::Empty).unwrap();
/// assert_eq!(session.get_attr(&point, "x").unwrap(), Value::Int(3));
/// ```
#[derive(Debug)]
pub struct Session<T: ResourceTracker = NoLimitTracker, Tr: VmTracer = NoopTracer> {
    heap: Heap<T>,
    functions: FunctionTable,
    tracer: Tr,
}

impl Session {
    /// Creates a session with no resource limits and no tracing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tracer(NoLimitTracker, NoopTracer)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session<LimitedTracker> {
    /// Creates a session that enforces `limits`.
    #[must_use]
    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self::with_tracer(LimitedTracker::new(limits), NoopTracer)
    }

    /// Restores a session from bytes previously produced by [`Session::save`].
    ///
    /// Every restored object is charged against `limits`.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails (corrupt or incompatible data),
    /// if the snapshot is internally inconsistent, or if it exceeds `limits`.
    pub fn load(bytes: &[u8], limits: ResourceLimits) -> Result<Self, String> {
        Self::load_with(bytes, LimitedTracker::new(limits), NoopTracer)
    }
}

impl<T: ResourceTracker, Tr: VmTracer> Session<T, Tr> {
    pub fn with_tracer(tracker: T, tracer: Tr) -> Self {
        Self {
            heap: Heap::new(64, tracker),
            functions: FunctionTable::new(),
            tracer,
        }
    }

    #[must_use]
    pub fn heap(&self) -> &Heap<T> {
        &self.heap
    }

    #[must_use]
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    #[must_use]
    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut Tr {
        &mut self.tracer
    }

    /// Adds a function to the session's function table.
    pub fn define_function(&mut self, function: Function) -> FunctionId {
        self.functions.define(function)
    }

    /// Builds and allocates a class, returning the class object.
    pub fn define_class(&mut self, builder: ClassBuilder) -> RunResult<Value> {
        builder.build(&mut self.heap).map(Value::Ref)
    }

    /// Allocates a standalone `staticmethod(func)` wrapper.
    pub fn new_static_method(&mut self, func: impl Into<Value>) -> RunResult<Value> {
        let func = func.into();
        self.heap.check_value(&func)?;
        let id = self.heap.allocate(HeapData::StaticMethod(StaticMethod::new(func)))?;
        Ok(Value::Ref(id))
    }

    /// Allocates a standalone property object.
    pub fn new_property(&mut self, property: UserProperty) -> RunResult<Value> {
        for callable in property.callables() {
            self.heap.check_value(callable)?;
        }
        let id = self.heap.allocate(HeapData::UserProperty(property))?;
        Ok(Value::Ref(id))
    }

    /// Allocates a host object.
    pub fn new_host_object(&mut self, obj: HostObject) -> RunResult<Value> {
        for field in obj.fields().values() {
            self.heap.check_value(field.value())?;
        }
        let id = self.heap.allocate(HeapData::HostObject(obj))?;
        Ok(Value::Ref(id))
    }

    /// Reads `obj.name` through the descriptor protocol.
    pub fn get_attr(&mut self, obj: &Value, name: &str) -> RunResult<Value> {
        self.heap.check_value(obj)?;
        let mut vm = VM::new(&mut self.heap, &mut self.tracer);
        vm.get_attr(&mut self.functions, obj, name)
    }

    /// Performs `obj.name = value` through the descriptor protocol.
    pub fn set_attr(&mut self, obj: &Value, name: &str, value: impl Into<Value>) -> RunResult<()> {
        let value = value.into();
        self.heap.check_value(obj)?;
        self.heap.check_value(&value)?;
        let mut vm = VM::new(&mut self.heap, &mut self.tracer);
        vm.set_attr(&mut self.functions, obj, name, value)
    }

    /// Performs `del obj.name` through the descriptor protocol.
    pub fn delete_attr(&mut self, obj: &Value, name: &str) -> RunResult<()> {
        self.heap.check_value(obj)?;
        let mut vm = VM::new(&mut self.heap, &mut self.tracer);
        vm.delete_attr(&mut self.functions, obj, name)
    }

    /// Calls `callable` with positional arguments.
    pub fn call(&mut self, callable: &Value, args: impl Into<ArgValues>) -> RunResult<Value> {
        let args = args.into();
        self.heap.check_value(callable)?;
        for arg in args.iter() {
            self.heap.check_value(arg)?;
        }
        let mut vm = VM::new(&mut self.heap, &mut self.tracer);
        vm.call(&mut self.functions, callable, args)
    }

    /// Returns the raw class body entry, as `A.__dict__[name]` would.
    ///
    /// Only the class itself is consulted, not its parents.
    #[must_use]
    pub fn class_dict_get(&self, class: &Value, name: &str) -> Option<Value> {
        match self.heap.get_if_live(class.ref_id()?)? {
            HeapData::ClassObject(cls) => cls.namespace().get(name).map(|member| member.to_value()),
            _ => None,
        }
    }

    /// Reads an instance's own storage, bypassing the descriptor protocol.
    #[must_use]
    pub fn instance_attr(&self, obj: &Value, name: &str) -> Option<Value> {
        let id = obj.ref_id()?;
        self.heap.get_if_live(id)?;
        self.heap.instance_attr(id, name)
    }

    /// Writes an instance's own storage, bypassing the descriptor protocol.
    pub fn set_instance_attr(&mut self, obj: &Value, name: &str, value: impl Into<Value>) -> RunResult<()> {
        let id = obj
            .ref_id()
            .ok_or_else(|| RunError::internal("set_instance_attr: not a heap object"))?;
        let value = value.into();
        self.heap.check_value(obj)?;
        self.heap.check_value(&value)?;
        self.heap.set_instance_attr(id, name, value)
    }

    /// Name of `value`'s type as it appears in error messages.
    pub fn type_name(&self, value: &Value) -> RunResult<String> {
        self.heap.check_value(value)?;
        Ok(value.type_name(&self.heap))
    }

    #[must_use]
    pub fn stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Serializes the function table and every heap object to bytes.
    ///
    /// Returns postcard-encoded bytes of a [`SessionSnapshot`].
    pub fn save(&self) -> Result<Vec<u8>, String> {
        let snapshot = SessionSnapshot {
            functions: self.functions.clone(),
            objects: self.heap.entries().to_vec(),
        };
        postcard::to_allocvec(&snapshot).map_err(|e| format!("session serialization failed: {e}"))
    }

    /// Restores a session with a caller-supplied tracker and tracer.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails, if an object refers to a heap
    /// id outside the snapshot, or if `tracker` rejects an allocation.
    pub fn load_with(bytes: &[u8], tracker: T, tracer: Tr) -> Result<Self, String> {
        let snapshot: SessionSnapshot =
            postcard::from_bytes(bytes).map_err(|e| format!("session deserialization failed: {e}"))?;

        let len = snapshot.objects.len();
        for (index, data) in snapshot.objects.iter().enumerate() {
            if let Some(bad) = data.refs().into_iter().find(|id| id.index() >= len) {
                return Err(format!(
                    "invalid snapshot: object {index} refers to missing heap id {}",
                    bad.index()
                ));
            }
        }

        let heap = Heap::restore(snapshot.objects, tracker).map_err(|e| format!("session restore failed: {e}"))?;
        Ok(Self {
            heap,
            functions: snapshot.functions,
            tracer,
        })
    }
}
