//! Reference host: a table of functions with a closed set of bodies.
//!
//! Enough to drive getters, setters, deleters, methods and descriptor hooks end
//! to end without a bytecode evaluator.

use serde::{Deserialize, Serialize};

use crate::{
    args::ArgValues,
    exception_private::{ExcType, RunError, RunResult, SimpleException},
    host::CallHost,
    resource::ResourceTracker,
    tracer::VmTracer,
    value::Value,
    vm::VM,
};

/// Index of a function in the host's function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(u32);

impl FunctionId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("Invalid function id"))
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a reference function does when called.
///
/// Argument indexes are positional and include the receiver for methods, so
/// `LoadAttr { arg: 0, attr: "_x" }` is `return self._x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FunctionBody {
    /// `return <constant>`
    Return(Value),
    /// `return args[i]`
    ReturnArg(usize),
    /// `return args[arg].<attr>`
    LoadAttr { arg: usize, attr: String },
    /// `args[arg].<attr> = args[value_arg]`, returns `None`.
    StoreAttr { arg: usize, attr: String, value_arg: usize },
    /// `del args[arg].<attr>`, returns `None`.
    DeleteAttr { arg: usize, attr: String },
    /// `raise <exc_type>(<message>)`
    Raise { exc_type: ExcType, message: Option<String> },
}

/// A function definition in a [`FunctionTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// Number of positional parameters, receiver included.
    pub params: usize,
    pub doc: Option<String>,
    pub body: FunctionBody,
}

impl Function {
    #[must_use]
    pub fn new(name: impl Into<String>, params: usize, body: FunctionBody) -> Self {
        Self {
            name: name.into(),
            params,
            doc: None,
            body,
        }
    }

    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// Minimal [`CallHost`] backed by a vector of [`Function`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionTable {
    functions: Vec<Function>,
}

impl FunctionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function to the table and returns its id.
    pub fn define(&mut self, function: Function) -> FunctionId {
        let id = FunctionId::new(self.functions.len());
        self.functions.push(function);
        id
    }

    #[must_use]
    pub fn get(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl CallHost for FunctionTable {
    fn call_function<T: ResourceTracker, Tr: VmTracer>(
        &mut self,
        vm: &mut VM<'_, T, Tr>,
        func: FunctionId,
        args: ArgValues,
    ) -> RunResult<Value> {
        let Some(function) = self.get(func) else {
            return Err(RunError::internal("call to undefined function"));
        };
        let given = args.count();
        if given != function.params {
            return Err(ExcType::type_error_arg_count(&function.name, function.params, given));
        }
        let body = function.body.clone();
        let args = args.into_smallvec();
        let arg = |i: usize| {
            args.get(i)
                .cloned()
                .ok_or_else(|| RunError::internal("function body refers to a missing argument"))
        };

        match body {
            FunctionBody::Return(value) => Ok(value),
            FunctionBody::ReturnArg(i) => arg(i),
            FunctionBody::LoadAttr { arg: target, attr } => vm.get_attr(self, &arg(target)?, &attr),
            FunctionBody::StoreAttr {
                arg: target,
                attr,
                value_arg,
            } => {
                vm.set_attr(self, &arg(target)?, &attr, arg(value_arg)?)?;
                Ok(Value::None)
            }
            FunctionBody::DeleteAttr { arg: target, attr } => {
                vm.delete_attr(self, &arg(target)?, &attr)?;
                Ok(Value::None)
            }
            FunctionBody::Raise { exc_type, message } => Err(SimpleException::new(exc_type, message).into()),
        }
    }

    fn function_name(&self, func: FunctionId) -> Option<&str> {
        self.get(func).map(|f| f.name.as_str())
    }

    fn function_doc(&self, func: FunctionId) -> Option<&str> {
        self.get(func).and_then(|f| f.doc.as_deref())
    }
}
