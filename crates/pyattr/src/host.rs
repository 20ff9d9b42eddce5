use crate::{
    args::ArgValues,
    exception_private::RunResult,
    function::FunctionId,
    resource::ResourceTracker,
    tracer::VmTracer,
    value::Value,
    vm::VM,
};

/// The call primitive the engine consumes from its embedding evaluator.
///
/// The engine never executes function bodies. Whenever resolution needs to run
/// user code (a property getter, a descriptor hook, `__init__`, a bound
/// method), it hands the [`FunctionId`] and the fully bound positional
/// arguments to the host. The host receives the VM back so that the function
/// body can itself read, write, or delete attributes.
pub trait CallHost {
    /// Invokes `func` with `args` (the receiver, if any, is already prepended).
    fn call_function<T: ResourceTracker, Tr: VmTracer>(
        &mut self,
        vm: &mut VM<'_, T, Tr>,
        func: FunctionId,
        args: ArgValues,
    ) -> RunResult<Value>;

    /// Name of the function for tracing and error messages.
    fn function_name(&self, _func: FunctionId) -> Option<&str> {
        None
    }

    /// Docstring of the function, used as a fallback for `property.__doc__`.
    fn function_doc(&self, _func: FunctionId) -> Option<&str> {
        None
    }
}
