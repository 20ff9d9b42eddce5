#![doc = include_str!("../../../README.md")]
// first so every other module can name heap ids
mod heap;

mod args;
mod exception_private;
mod function;
mod host;
mod resource;
mod session;
pub mod tracer;
mod types;
mod value;
mod vm;

pub use crate::{
    args::ArgValues,
    exception_private::{AttrFailure, ExcType, RunError, RunResult, SimpleException},
    function::{Function, FunctionBody, FunctionId, FunctionTable},
    heap::{Heap, HeapData, HeapId, HeapStats},
    host::CallHost,
    resource::{
        DEFAULT_MAX_RECURSION_DEPTH, LimitedTracker, MAX_INHERITANCE_DEPTH, NoLimitTracker, ResourceError,
        ResourceLimits, ResourceTracker,
    },
    session::{Session, SessionSnapshot},
    tracer::{
        DescriptorAction, NoopTracer, ProfilingReport, ProfilingTracer, RecordingTracer, StderrTracer, TraceEvent,
        VmTracer,
    },
    types::{
        AccessorKind, AttrMap, BoundMethod, ClassBuilder, ClassObject, HostAccessor, HostField, HostObject, Instance,
        Member, MemberKind, StaticMethod, Type, UserProperty,
    },
    value::Value,
    vm::VM,
};
