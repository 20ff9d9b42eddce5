//! Callable binding and call dispatch.

use super::VM;
use crate::{
    args::ArgValues,
    exception_private::{ExcType, RunResult},
    function::FunctionId,
    heap::{HeapData, HeapId},
    host::CallHost,
    resource::ResourceTracker,
    tracer::VmTracer,
    types::{BoundMethod, Member},
    value::Value,
};

enum CallTarget {
    Bound { func: Value, receiver: Value },
    Class(HeapId),
    Instance { id: HeapId, class_id: HeapId },
    NotCallable,
}

impl<T: ResourceTracker, Tr: VmTracer> VM<'_, T, Tr> {
    /// Calls `callable` with positional `args`.
    ///
    /// - host functions go to [`CallHost::call_function`]
    /// - bound methods prepend their receiver
    /// - classes are instantiated, running `__init__` when the chain defines it
    /// - instances are called through `__call__`
    ///
    /// Anything else, including a raw static adapter, fails with `TypeError`.
    pub fn call(&mut self, host: &mut impl CallHost, callable: &Value, args: ArgValues) -> RunResult<Value> {
        let target = match callable {
            Value::DefFunction(func) => return self.call_function(host, *func, args),
            Value::Ref(id) => match self.heap.get(*id) {
                HeapData::BoundMethod(method) => CallTarget::Bound {
                    func: method.func().clone(),
                    receiver: method.self_arg().clone(),
                },
                HeapData::ClassObject(_) => CallTarget::Class(*id),
                HeapData::Instance(inst) => CallTarget::Instance {
                    id: *id,
                    class_id: inst.class_id(),
                },
                _ => CallTarget::NotCallable,
            },
            _ => CallTarget::NotCallable,
        };

        match target {
            CallTarget::Bound { func, receiver } => self.call(host, &func, args.prepend(receiver)),
            CallTarget::Class(class_id) => self.instantiate(host, class_id, args),
            CallTarget::Instance { id, class_id } => match self.lookup(class_id, "__call__")? {
                // `__call__` can resolve back to this instance
                Some(member) => {
                    self.heap.tracker().check_recursion_depth(self.depth)?;
                    self.depth += 1;
                    let result = self.call_member(host, member, id, class_id, "__call__", args);
                    self.depth -= 1;
                    result
                }
                None => {
                    let err = ExcType::type_error_not_callable(callable.type_name(self.heap()));
                    Err(self.fail(err))
                }
            },
            CallTarget::NotCallable => {
                let err = ExcType::type_error_not_callable(callable.type_name(self.heap()));
                Err(self.fail(err))
            }
        }
    }

    /// Calls the special method `name` of an instance.
    ///
    /// The method is looked up on the class chain only, never in the
    /// instance's own storage.
    pub(super) fn call_special(
        &mut self,
        host: &mut impl CallHost,
        instance: HeapId,
        class_id: HeapId,
        name: &str,
        args: ArgValues,
    ) -> RunResult<Value> {
        let Some(member) = self.lookup(class_id, name)? else {
            let err = ExcType::attribute_error(self.heap.class_name(class_id), name);
            return Err(self.fail(err));
        };
        self.call_member(host, member, instance, class_id, name, args)
    }

    /// Calls a class member on behalf of `instance`.
    ///
    /// Plain callables receive the instance directly instead of going through a
    /// temporary bound method.
    fn call_member(
        &mut self,
        host: &mut impl CallHost,
        member: Member,
        instance: HeapId,
        class_id: HeapId,
        name: &str,
        args: ArgValues,
    ) -> RunResult<Value> {
        if let Member::PlainCallable(func) = member {
            return self.call_function(host, func, args.prepend(Value::Ref(instance)));
        }
        let callable = self.resolve_member(host, member, instance, class_id, name)?;
        self.call(host, &callable, args)
    }

    /// Binds `func` to `receiver`.
    ///
    /// A static adapter ignores the receiver and yields its wrapped callable;
    /// anything else becomes a new [`BoundMethod`].
    pub fn bind(&mut self, func: Value, receiver: Value) -> RunResult<Value> {
        if let Value::Ref(id) = &func
            && let HeapData::StaticMethod(sm) = self.heap.get(*id)
        {
            return Ok(sm.func().clone());
        }
        let id = self
            .heap
            .allocate(HeapData::BoundMethod(BoundMethod::new(func, receiver)))?;
        Ok(Value::Ref(id))
    }

    fn instantiate(&mut self, host: &mut impl CallHost, class_id: HeapId, args: ArgValues) -> RunResult<Value> {
        let Some(init) = self.lookup(class_id, "__init__")? else {
            args.check_zero_args(self.heap.class_name(class_id))?;
            return Ok(Value::Ref(self.heap.new_instance(class_id)?));
        };

        let instance = self.heap.new_instance(class_id)?;
        let result = self.call_member(host, init, instance, class_id, "__init__", args)?;
        if result != Value::None {
            return Err(ExcType::type_error(format!(
                "__init__() should return None, not '{}'",
                result.type_name(self.heap())
            )));
        }
        Ok(Value::Ref(instance))
    }

    /// Enters the host, checking the recursion limit first.
    fn call_function(&mut self, host: &mut impl CallHost, func: FunctionId, args: ArgValues) -> RunResult<Value> {
        self.heap.tracker().check_recursion_depth(self.depth)?;
        self.depth += 1;
        self.tracer.on_call(host.function_name(func), self.depth);
        let result = host.call_function(self, func, args);
        self.depth -= 1;
        self.tracer.on_return(self.depth);
        result
    }
}
