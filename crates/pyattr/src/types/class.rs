use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    exception_private::{ExcType, RunResult},
    function::FunctionId,
    heap::{Heap, HeapData, HeapId},
    resource::ResourceTracker,
    types::{Member, StaticMethod, UserProperty},
    value::Value,
};

/// Insertion-ordered attribute mapping used for class bodies and instance storage.
pub type AttrMap<V> = IndexMap<String, V, ahash::RandomState>;

/// A class object: name, at most one parent, and a frozen body of classified members.
///
/// When called (instantiated), creates an `Instance` with empty storage, then
/// calls `__init__` if the chain defines one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassObject {
    /// The class name (e.g., "Foo", "MyClass").
    name: String,
    /// Single parent class, `None` at the root of the chain.
    parent: Option<HeapId>,
    /// Class body, classified once when the class was built.
    namespace: AttrMap<Member>,
    /// Number of classes in the chain, this one included.
    depth: usize,
}

impl ClassObject {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<HeapId> {
        self.parent
    }

    #[must_use]
    pub fn namespace(&self) -> &AttrMap<Member> {
        &self.namespace
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// An instance of a user class with its own attribute storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    class_id: HeapId,
    attrs: AttrMap<Value>,
}

impl Instance {
    #[must_use]
    pub fn new(class_id: HeapId) -> Self {
        Self {
            class_id,
            attrs: AttrMap::default(),
        }
    }

    #[must_use]
    pub fn class_id(&self) -> HeapId {
        self.class_id
    }

    #[must_use]
    pub fn attrs(&self) -> &AttrMap<Value> {
        &self.attrs
    }

    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Creates or overwrites `name`. Always succeeds.
    pub fn set_attr(&mut self, name: &str, value: Value) {
        self.attrs.insert(name.to_owned(), value);
    }

    /// Removes `name`, returning the previous value if it was present.
    ///
    /// Uses `shift_remove` so the remaining attributes keep their insertion order.
    pub fn del_attr(&mut self, name: &str) -> Option<Value> {
        self.attrs.shift_remove(name)
    }
}

#[derive(Debug, Clone)]
enum BodyEntry {
    Value(Value),
    StaticMethod(Value),
    Property(UserProperty),
}

/// Collects a class definition and finalizes it into a frozen [`ClassObject`].
///
/// ```
/// use pyattr::{ClassBuilder, FunctionId, Heap, NoLimitTracker};
///
/// let mut heap = Heap::new(8, NoLimitTracker);
/// let base = ClassBuilder::new("Base").attr("x", 1).build(&mut heap).unwrap();
/// let derived = ClassBuilder::new("Derived")
///     .parent(base)
///     .method("run", FunctionId::new(0))
///     .build(&mut heap)
///     .unwrap();
/// assert_eq!(heap.class_name(derived), "Derived");
/// ```
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    parent: Option<HeapId>,
    body: Vec<(String, BodyEntry)>,
}

impl ClassBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn parent(mut self, parent: HeapId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Adds a class attribute. Its member kind is decided at [`build`](Self::build).
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.push((name.into(), BodyEntry::Value(value.into())));
        self
    }

    /// Adds a plain function, bound to the receiver on instance access.
    #[must_use]
    pub fn method(self, name: impl Into<String>, func: FunctionId) -> Self {
        self.attr(name, func)
    }

    /// Adds `name = staticmethod(func)`.
    #[must_use]
    pub fn static_method(mut self, name: impl Into<String>, func: impl Into<Value>) -> Self {
        self.body.push((name.into(), BodyEntry::StaticMethod(func.into())));
        self
    }

    /// Adds `name = property(...)`.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, property: UserProperty) -> Self {
        self.body.push((name.into(), BodyEntry::Property(property)));
        self
    }

    /// Allocates descriptor wrappers, classifies every body entry and allocates the class.
    ///
    /// Later entries with the same name replace earlier ones, as repeated
    /// assignments in a class body do.
    pub fn build<T: ResourceTracker>(self, heap: &mut Heap<T>) -> RunResult<HeapId> {
        let depth = match self.parent {
            Some(parent_id) => match heap.get_if_live(parent_id) {
                Some(HeapData::ClassObject(parent)) => parent.depth() + 1,
                Some(other) => {
                    return Err(ExcType::type_error(format!(
                        "class '{}' cannot inherit from '{}' object",
                        self.name,
                        other.py_type()
                    )));
                }
                None => return Err(ExcType::type_error("parent class does not exist")),
            },
            None => 1,
        };
        let max_depth = heap.tracker().max_inheritance_depth();
        if depth > max_depth {
            return Err(ExcType::type_error(format!(
                "inheritance chain too deep: '{}' would have {depth} classes (max {max_depth})",
                self.name
            )));
        }

        let mut namespace = AttrMap::default();
        for (name, entry) in self.body {
            let value = match entry {
                BodyEntry::Value(value) => {
                    heap.check_value(&value)?;
                    value
                }
                BodyEntry::StaticMethod(func) => {
                    heap.check_value(&func)?;
                    Value::Ref(heap.allocate(HeapData::StaticMethod(StaticMethod::new(func)))?)
                }
                BodyEntry::Property(property) => {
                    for callable in property.callables() {
                        heap.check_value(callable)?;
                    }
                    Value::Ref(heap.allocate(HeapData::UserProperty(property))?)
                }
            };
            namespace.insert(name, Member::classify(value, heap));
        }

        let class = ClassObject {
            name: self.name,
            parent: self.parent,
            namespace,
            depth,
        };
        Ok(heap.allocate(HeapData::ClassObject(class))?)
    }
}
