//! The attribute resolution engine.
//!
//! A [`VM`] borrows the heap and the tracer for the duration of one top-level
//! operation. Host functions receive the same VM back through
//! [`CallHost::call_function`](crate::CallHost::call_function), so nested
//! attribute access shares the call depth used for recursion limits.

mod attr;
mod call;

use crate::{
    exception_private::RunError,
    heap::Heap,
    resource::ResourceTracker,
    tracer::VmTracer,
};

pub struct VM<'a, T: ResourceTracker, Tr: VmTracer> {
    heap: &'a mut Heap<T>,
    tracer: &'a mut Tr,
    /// Number of host calls currently on the native stack.
    depth: usize,
}

impl<'a, T: ResourceTracker, Tr: VmTracer> VM<'a, T, Tr> {
    pub fn new(heap: &'a mut Heap<T>, tracer: &'a mut Tr) -> Self {
        Self { heap, tracer, depth: 0 }
    }

    #[must_use]
    pub fn heap(&self) -> &Heap<T> {
        self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap<T> {
        self.heap
    }

    #[must_use]
    pub fn tracer(&self) -> &Tr {
        self.tracer
    }

    /// Current host call depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Reports an engine-raised failure to the tracer and hands the error back.
    fn fail(&mut self, err: RunError) -> RunError {
        if let Some(failure) = err.failure() {
            self.tracer.on_failure(failure);
        }
        err
    }
}
