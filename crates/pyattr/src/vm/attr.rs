//! Attribute get/set/delete dispatch.
//!
//! Precedence on instance reads:
//! 1. data descriptor found in the class chain
//! 2. instance storage
//! 3. non-data descriptor, plain callable (bound) or plain class value
//!
//! Writes and deletes go through a data descriptor when one is found and
//! straight to instance storage otherwise.
//!
//! Host objects have no class chain; their fixed fields and accessors are
//! resolved directly.

use super::VM;
use crate::{
    args::ArgValues,
    exception_private::{ExcType, RunError, RunResult},
    heap::{HeapData, HeapId},
    host::CallHost,
    resource::ResourceTracker,
    tracer::{DescriptorAction, VmTracer},
    types::{AccessorKind, Member, MemberKind},
    value::Value,
};

/// What an attribute operation is applied to.
enum Target {
    Instance { id: HeapId, class_id: HeapId },
    Class(HeapId),
    Host(HeapId),
    /// Immediates and builtin heap objects (bound methods, properties, ...).
    Other,
}

/// Descriptor payload copied out of the heap before dispatch.
enum Descriptor {
    Property {
        fget: Option<Value>,
        fset: Option<Value>,
        fdel: Option<Value>,
    },
    Static(Value),
    /// An instance whose class defines the descriptor hooks.
    User { class_id: HeapId },
}

impl<T: ResourceTracker, Tr: VmTracer> VM<'_, T, Tr> {
    /// Reads `obj.name`.
    pub fn get_attr(&mut self, host: &mut impl CallHost, obj: &Value, name: &str) -> RunResult<Value> {
        match self.target(obj) {
            Target::Instance { id, class_id } => self.get_instance_attr(host, id, class_id, name),
            Target::Class(class_id) => self.get_class_attr(host, class_id, name),
            Target::Host(id) => self.get_host_attr(host, id, name),
            Target::Other => self.get_builtin_attr(&*host, obj, name),
        }
    }

    /// Performs `obj.name = value`.
    pub fn set_attr(&mut self, host: &mut impl CallHost, obj: &Value, name: &str, value: Value) -> RunResult<()> {
        match self.target(obj) {
            Target::Instance { id, class_id } => match self.lookup(class_id, name)? {
                Some(Member::DataDescriptor {
                    descriptor, can_set, ..
                }) => {
                    if can_set {
                        self.descriptor_set(host, descriptor, obj, value, name)
                    } else {
                        let err = ExcType::attribute_error_read_only(self.heap.class_name(class_id), name);
                        Err(self.fail(err))
                    }
                }
                _ => self.heap.set_instance_attr(id, name, value),
            },
            Target::Class(class_id) => {
                let err = ExcType::type_error_immutable_set(self.heap.class_name(class_id), name);
                Err(self.fail(err))
            }
            Target::Host(id) => self.set_host_attr(id, name, value),
            Target::Other => {
                let err = ExcType::attribute_error_no_setattr(&obj.type_name(self.heap()), name);
                Err(self.fail(err))
            }
        }
    }

    /// Performs `del obj.name`.
    pub fn delete_attr(&mut self, host: &mut impl CallHost, obj: &Value, name: &str) -> RunResult<()> {
        match self.target(obj) {
            Target::Instance { id, class_id } => match self.lookup(class_id, name)? {
                Some(Member::DataDescriptor {
                    descriptor, can_delete, ..
                }) => {
                    if can_delete {
                        self.descriptor_delete(host, descriptor, obj, name)
                    } else {
                        let err = ExcType::attribute_error_cannot_delete(self.heap.class_name(class_id), name);
                        Err(self.fail(err))
                    }
                }
                _ => {
                    if self.heap.delete_instance_attr(id, name).is_some() {
                        Ok(())
                    } else {
                        let err = ExcType::attribute_error(self.heap.class_name(class_id), name);
                        Err(self.fail(err))
                    }
                }
            },
            Target::Class(class_id) => {
                let err = ExcType::type_error_immutable_delete(self.heap.class_name(class_id), name);
                Err(self.fail(err))
            }
            Target::Host(id) => {
                let HeapData::HostObject(host_obj) = self.heap.get(id) else {
                    return Err(RunError::internal("delete_attr: not a host object"));
                };
                let err = if host_obj.has_attr(name) {
                    ExcType::attribute_error_cannot_delete(host_obj.type_name(), name)
                } else {
                    ExcType::attribute_error(host_obj.type_name(), name)
                };
                Err(self.fail(err))
            }
            Target::Other => {
                let err = ExcType::attribute_error_no_delattr(&obj.type_name(self.heap()), name);
                Err(self.fail(err))
            }
        }
    }

    fn target(&self, obj: &Value) -> Target {
        let Value::Ref(id) = obj else {
            return Target::Other;
        };
        match self.heap.get(*id) {
            HeapData::Instance(inst) => Target::Instance {
                id: *id,
                class_id: inst.class_id(),
            },
            HeapData::ClassObject(_) => Target::Class(*id),
            HeapData::HostObject(_) => Target::Host(*id),
            _ => Target::Other,
        }
    }

    /// Chain lookup with tracing.
    pub(super) fn lookup(&mut self, class_id: HeapId, name: &str) -> RunResult<Option<Member>> {
        let found = self.heap.lookup_in_chain(class_id, name)?.map(|(member, _)| member);
        self.tracer
            .on_lookup(self.heap.class_name(class_id), name, found.as_ref().map(Member::kind));
        Ok(found)
    }

    fn get_instance_attr(
        &mut self,
        host: &mut impl CallHost,
        inst_id: HeapId,
        class_id: HeapId,
        name: &str,
    ) -> RunResult<Value> {
        let member = self.lookup(class_id, name)?;
        if let Some(member @ Member::DataDescriptor { .. }) = member {
            return self.resolve_member(host, member, inst_id, class_id, name);
        }

        if let Some(value) = self.heap.instance_attr(inst_id, name) {
            self.tracer.on_instance_hit(name);
            return Ok(value);
        }

        match member {
            Some(member) => self.resolve_member(host, member, inst_id, class_id, name),
            None => {
                let err = ExcType::attribute_error(self.heap.class_name(class_id), name);
                Err(self.fail(err))
            }
        }
    }

    /// Turns a class member into the value an instance read yields: descriptors
    /// run their get, plain callables bind, plain values pass through.
    pub(super) fn resolve_member(
        &mut self,
        host: &mut impl CallHost,
        member: Member,
        inst_id: HeapId,
        class_id: HeapId,
        name: &str,
    ) -> RunResult<Value> {
        let receiver = Some(Value::Ref(inst_id));
        match member {
            Member::DataDescriptor { descriptor, .. } => {
                self.descriptor_get(host, descriptor, MemberKind::DataDescriptor, receiver, class_id, name)
            }
            Member::NonDataDescriptor(descriptor) => {
                self.descriptor_get(host, descriptor, MemberKind::NonDataDescriptor, receiver, class_id, name)
            }
            Member::PlainCallable(func) => {
                self.tracer.on_bind(name);
                self.bind(Value::DefFunction(func), Value::Ref(inst_id))
            }
            Member::PlainValue(value) => Ok(value),
        }
    }

    /// Class access: same chain walk, no instance storage, functions stay unbound.
    fn get_class_attr(&mut self, host: &mut impl CallHost, class_id: HeapId, name: &str) -> RunResult<Value> {
        match self.lookup(class_id, name)? {
            Some(Member::DataDescriptor { descriptor, .. }) => {
                self.descriptor_get(host, descriptor, MemberKind::DataDescriptor, None, class_id, name)
            }
            Some(Member::NonDataDescriptor(descriptor)) => {
                self.descriptor_get(host, descriptor, MemberKind::NonDataDescriptor, None, class_id, name)
            }
            Some(Member::PlainCallable(func)) => Ok(Value::DefFunction(func)),
            Some(Member::PlainValue(value)) => Ok(value),
            None => {
                let err = ExcType::attribute_error_type_object(self.heap.class_name(class_id), name);
                Err(self.fail(err))
            }
        }
    }

    /// Host object read: fields yield their value, method accessors bind,
    /// property accessors are called with the object.
    fn get_host_attr(&mut self, host: &mut impl CallHost, id: HeapId, name: &str) -> RunResult<Value> {
        let HeapData::HostObject(obj) = self.heap.get(id) else {
            return Err(RunError::internal("get_host_attr: not a host object"));
        };
        if let Some(value) = obj.field_value(name) {
            let value = value.clone();
            self.tracer.on_instance_hit(name);
            return Ok(value);
        }
        match obj.accessor(name) {
            Some(accessor) => match accessor.kind {
                AccessorKind::Method => {
                    self.tracer.on_bind(name);
                    self.bind(Value::DefFunction(accessor.func), Value::Ref(id))
                }
                AccessorKind::Property => {
                    self.tracer
                        .on_descriptor(DescriptorAction::Get, name, MemberKind::DataDescriptor);
                    self.call(host, &Value::DefFunction(accessor.func), ArgValues::One(Value::Ref(id)))
                }
            },
            None => {
                let err = ExcType::attribute_error(obj.type_name(), name);
                Err(self.fail(err))
            }
        }
    }

    /// Host object write: only settable fields accept values, and a typed
    /// field only accepts values of its declared type.
    fn set_host_attr(&mut self, id: HeapId, name: &str, value: Value) -> RunResult<()> {
        let HeapData::HostObject(obj) = self.heap.get(id) else {
            return Err(RunError::internal("set_host_attr: not a host object"));
        };
        let type_name = obj.type_name().to_owned();
        let Some(field) = obj.host_field(name) else {
            let err = if obj.has_attr(name) {
                ExcType::attribute_error_not_settable(&type_name, name)
            } else {
                ExcType::attribute_error(&type_name, name)
            };
            return Err(self.fail(err));
        };
        if !field.settable() {
            let err = ExcType::attribute_error_not_settable(&type_name, name);
            return Err(self.fail(err));
        }
        if let Some(expected) = field.ty() {
            let actual = value.py_type(self.heap());
            if actual != expected {
                let err = ExcType::type_error_not_assignable(
                    &type_name,
                    name,
                    &expected.to_string(),
                    &value.type_name(self.heap()),
                );
                return Err(self.fail(err));
            }
        }
        self.heap.store_host_field(id, name, value)
    }

    /// Attributes exposed by builtin objects.
    fn get_builtin_attr(&mut self, host: &impl CallHost, obj: &Value, name: &str) -> RunResult<Value> {
        let found = match obj {
            Value::Ref(id) => match (self.heap.get(*id), name) {
                (HeapData::BoundMethod(method), "__self__") => Some(method.self_arg().clone()),
                (HeapData::BoundMethod(method), "__func__") => Some(method.func().clone()),
                (HeapData::StaticMethod(sm), "__func__") => Some(sm.func().clone()),
                (HeapData::UserProperty(prop), "fget") => Some(prop.fget().cloned().unwrap_or(Value::None)),
                (HeapData::UserProperty(prop), "fset") => Some(prop.fset().cloned().unwrap_or(Value::None)),
                (HeapData::UserProperty(prop), "fdel") => Some(prop.fdel().cloned().unwrap_or(Value::None)),
                (HeapData::UserProperty(prop), "__doc__") => {
                    let doc = match (prop.doc(), prop.fget()) {
                        (Some(doc), _) => Some(doc),
                        (None, Some(Value::DefFunction(fget))) => host.function_doc(*fget),
                        (None, _) => None,
                    };
                    Some(doc.map_or(Value::None, Value::from))
                }
                _ => None,
            },
            _ => None,
        };
        match found {
            Some(value) => Ok(value),
            None => {
                let err = ExcType::attribute_error(obj.type_name(self.heap()), name);
                Err(self.fail(err))
            }
        }
    }

    fn descriptor(&self, id: HeapId) -> RunResult<Descriptor> {
        match self.heap.get(id) {
            HeapData::UserProperty(prop) => Ok(Descriptor::Property {
                fget: prop.fget().cloned(),
                fset: prop.fset().cloned(),
                fdel: prop.fdel().cloned(),
            }),
            HeapData::StaticMethod(sm) => Ok(Descriptor::Static(sm.func().clone())),
            HeapData::Instance(inst) => Ok(Descriptor::User {
                class_id: inst.class_id(),
            }),
            _ => Err(RunError::internal("member classified as descriptor is not a descriptor")),
        }
    }

    /// Invokes a descriptor's get. `receiver` is `None` for class access.
    fn descriptor_get(
        &mut self,
        host: &mut impl CallHost,
        descriptor: HeapId,
        kind: MemberKind,
        receiver: Option<Value>,
        owner: HeapId,
        name: &str,
    ) -> RunResult<Value> {
        self.tracer.on_descriptor(DescriptorAction::Get, name, kind);
        match self.descriptor(descriptor)? {
            Descriptor::Property { fget, .. } => {
                let Some(receiver) = receiver else {
                    return Ok(Value::Ref(descriptor));
                };
                match fget {
                    Some(fget) => self.call(host, &fget, ArgValues::One(receiver)),
                    None => {
                        let err = ExcType::attribute_error_no_getter(&receiver.type_name(self.heap()), name);
                        Err(self.fail(err))
                    }
                }
            }
            Descriptor::Static(func) => Ok(func),
            Descriptor::User { class_id } => {
                let args = ArgValues::Two(receiver.unwrap_or(Value::None), Value::Ref(owner));
                self.call_special(host, descriptor, class_id, "__get__", args)
            }
        }
    }

    fn descriptor_set(
        &mut self,
        host: &mut impl CallHost,
        descriptor: HeapId,
        instance: &Value,
        value: Value,
        name: &str,
    ) -> RunResult<()> {
        self.tracer
            .on_descriptor(DescriptorAction::Set, name, MemberKind::DataDescriptor);
        let args = ArgValues::Two(instance.clone(), value);
        match self.descriptor(descriptor)? {
            Descriptor::Property { fset: Some(fset), .. } => self.call(host, &fset, args)?,
            Descriptor::Property { fset: None, .. } => {
                let err = ExcType::attribute_error_no_setter(&instance.type_name(self.heap()), name);
                return Err(self.fail(err));
            }
            Descriptor::User { class_id } => self.call_special(host, descriptor, class_id, "__set__", args)?,
            Descriptor::Static(_) => return Err(RunError::internal("static adapter dispatched as data descriptor")),
        };
        Ok(())
    }

    fn descriptor_delete(
        &mut self,
        host: &mut impl CallHost,
        descriptor: HeapId,
        instance: &Value,
        name: &str,
    ) -> RunResult<()> {
        self.tracer
            .on_descriptor(DescriptorAction::Delete, name, MemberKind::DataDescriptor);
        let args = ArgValues::One(instance.clone());
        match self.descriptor(descriptor)? {
            Descriptor::Property { fdel: Some(fdel), .. } => self.call(host, &fdel, args)?,
            Descriptor::Property { fdel: None, .. } => {
                let err = ExcType::attribute_error_no_deleter(&instance.type_name(self.heap()), name);
                return Err(self.fail(err));
            }
            Descriptor::User { class_id } => self.call_special(host, descriptor, class_id, "__delete__", args)?,
            Descriptor::Static(_) => return Err(RunError::internal("static adapter dispatched as data descriptor")),
        };
        Ok(())
    }
}
