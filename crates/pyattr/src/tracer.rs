//! Attribute resolution tracing infrastructure.
//!
//! Provides a trait-based tracing system with zero-cost abstraction. When using
//! [`NoopTracer`], all trace methods compile away entirely via monomorphization,
//! the same way [`NoLimitTracker`](crate::resource::NoLimitTracker) eliminates
//! resource checking overhead.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`StderrTracer`] | Human-readable resolution log to stderr |
//! | [`ProfilingTracer`] | Lookup, descriptor and call counters |
//! | [`RecordingTracer`] | Full event recording for post-mortem inspection |
//!
//! The VM is parameterized as `VM<'a, T: ResourceTracker, Tr: VmTracer>`;
//! callers choose the tracer when building a [`Session`](crate::Session):
//!
//! ```
//! use pyattr::{NoLimitTracker, ProfilingTracer, Session};
//!
//! let mut session = Session::with_tracer(NoLimitTracker, ProfilingTracer::new());
//! // ... run ...
//! let report = session.tracer().report();
//! assert_eq!(report.total_lookups, 0);
//! ```

use std::{collections::HashMap, fmt};

use strum::{Display, IntoStaticStr};

use crate::{exception_private::AttrFailure, types::MemberKind};

/// Which descriptor operation was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DescriptorAction {
    Get,
    Set,
    Delete,
}

/// Trace event emitted during attribute resolution.
///
/// Used by [`RecordingTracer`] to capture a full trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A class chain lookup finished.
    Lookup {
        class_name: String,
        attr: String,
        /// Kind of the member found, `None` on a miss.
        found: Option<MemberKind>,
    },
    /// A read was satisfied from instance storage.
    InstanceHit { attr: String },
    /// A descriptor's get/set/delete was dispatched.
    Descriptor {
        action: DescriptorAction,
        attr: String,
        kind: MemberKind,
    },
    /// A plain callable was bound to its receiver.
    Bind { attr: String },
    /// A host function call was entered.
    Call {
        func_name: Option<String>,
        /// Host call depth after entering.
        depth: usize,
    },
    /// A host function call returned (normally or with an error).
    Return {
        /// Host call depth after leaving.
        depth: usize,
    },
    /// The engine raised a classified failure.
    Failure(AttrFailure),
}

/// Trait for attribute resolution tracing.
///
/// All methods have default no-op implementations, so [`NoopTracer`] requires
/// zero lines of code and compiles to zero instructions. Implementations only
/// override the hooks they care about.
pub trait VmTracer: fmt::Debug {
    /// Called after every class chain lookup.
    ///
    /// # Arguments
    /// * `class_name` - Class the walk started from
    /// * `attr` - Attribute name
    /// * `found` - Kind of the member found, `None` on a miss
    #[inline(always)]
    fn on_lookup(&mut self, _class_name: &str, _attr: &str, _found: Option<MemberKind>) {}

    /// Called when a read is answered by instance storage.
    #[inline(always)]
    fn on_instance_hit(&mut self, _attr: &str) {}

    /// Called before a descriptor's get, set or delete is dispatched.
    #[inline(always)]
    fn on_descriptor(&mut self, _action: DescriptorAction, _attr: &str, _kind: MemberKind) {}

    /// Called when a plain callable is bound into a bound method.
    #[inline(always)]
    fn on_bind(&mut self, _attr: &str) {}

    /// Called when a host function call is entered.
    ///
    /// # Arguments
    /// * `func_name` - Function name if the host provides one
    /// * `depth` - Host call depth after entering
    #[inline(always)]
    fn on_call(&mut self, _func_name: Option<&str>, _depth: usize) {}

    /// Called when a host function call returns.
    #[inline(always)]
    fn on_return(&mut self, _depth: usize) {}

    /// Called when the engine raises a classified failure.
    #[inline(always)]
    fn on_failure(&mut self, _failure: &AttrFailure) {}
}

/// Zero-cost tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl VmTracer for NoopTracer {}

// ============================================================================
// StderrTracer: human-readable resolution log
// ============================================================================

/// Tracer that prints a human-readable resolution log to stderr.
///
/// Output format:
/// ```text
///   ??? LOOKUP Point.x            -> DataDescriptor
///   --- DESC GET x                (DataDescriptor)
///   >>> CALL get_x                depth=1
///   ??? LOOKUP Point._x           -> miss
///   ... INSTANCE _x
///   <<< RETURN                    depth=0
/// ```
#[derive(Debug, Default)]
pub struct StderrTracer {
    /// Maximum number of lines to print before stopping. None = unlimited.
    limit: Option<usize>,
    /// Number of lines printed so far.
    count: usize,
    /// Whether we've stopped tracing (hit the limit).
    stopped: bool,
}

impl StderrTracer {
    /// Creates a new stderr tracer with no line limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new stderr tracer that stops after `limit` lines.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    fn emit(&mut self, line: fmt::Arguments<'_>) {
        if self.stopped {
            return;
        }
        eprintln!("{line}");
        self.count += 1;
        if let Some(limit) = self.limit
            && self.count >= limit
        {
            eprintln!("--- trace limit reached ({limit} lines) ---");
            self.stopped = true;
        }
    }
}

impl VmTracer for StderrTracer {
    fn on_lookup(&mut self, class_name: &str, attr: &str, found: Option<MemberKind>) {
        let target = format!("{class_name}.{attr}");
        match found {
            Some(kind) => self.emit(format_args!("  ??? LOOKUP {target:<20} -> {kind}")),
            None => self.emit(format_args!("  ??? LOOKUP {target:<20} -> miss")),
        }
    }

    fn on_instance_hit(&mut self, attr: &str) {
        self.emit(format_args!("  ... INSTANCE {attr}"));
    }

    fn on_descriptor(&mut self, action: DescriptorAction, attr: &str, kind: MemberKind) {
        self.emit(format_args!("  --- DESC {action} {attr:<20} ({kind})"));
    }

    fn on_bind(&mut self, attr: &str) {
        self.emit(format_args!("  +++ BIND {attr}"));
    }

    fn on_call(&mut self, func_name: Option<&str>, depth: usize) {
        let name = func_name.unwrap_or("<anonymous>");
        self.emit(format_args!("  >>> CALL {name:<20} depth={depth}"));
    }

    fn on_return(&mut self, depth: usize) {
        self.emit(format_args!("  <<< RETURN                    depth={depth}"));
    }

    fn on_failure(&mut self, failure: &AttrFailure) {
        self.emit(format_args!("  !!! FAIL {failure:?}"));
    }
}

// ============================================================================
// ProfilingTracer: lookup and call counters
// ============================================================================

/// Tracer that collects resolution statistics.
///
/// Retrieve results via [`ProfilingTracer::report`].
#[derive(Debug, Default)]
pub struct ProfilingTracer {
    /// Lookup hits per member kind.
    hits_by_kind: HashMap<MemberKind, u64>,
    total_lookups: u64,
    lookup_misses: u64,
    instance_hits: u64,
    descriptor_calls: HashMap<DescriptorAction, u64>,
    binds: u64,
    total_calls: u64,
    /// Maximum host call depth observed.
    max_depth: usize,
    failures: u64,
}

/// Summary report from a profiling trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilingReport {
    /// Lookup hits per member kind, sorted by frequency (highest first).
    pub hits_by_kind: Vec<(MemberKind, u64)>,
    pub total_lookups: u64,
    pub lookup_misses: u64,
    pub instance_hits: u64,
    /// Descriptor dispatches per action, sorted by frequency (highest first).
    pub descriptor_calls: Vec<(DescriptorAction, u64)>,
    pub binds: u64,
    pub total_calls: u64,
    pub max_depth: usize,
    pub failures: u64,
}

impl ProfilingTracer {
    /// Creates a new profiling tracer with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a profiling report from the collected data.
    #[must_use]
    pub fn report(&self) -> ProfilingReport {
        let mut hits_by_kind: Vec<_> = self.hits_by_kind.iter().map(|(&k, &v)| (k, v)).collect();
        hits_by_kind.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
        let mut descriptor_calls: Vec<_> = self.descriptor_calls.iter().map(|(&k, &v)| (k, v)).collect();
        descriptor_calls.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
        ProfilingReport {
            hits_by_kind,
            total_lookups: self.total_lookups,
            lookup_misses: self.lookup_misses,
            instance_hits: self.instance_hits,
            descriptor_calls,
            binds: self.binds,
            total_calls: self.total_calls,
            max_depth: self.max_depth,
            failures: self.failures,
        }
    }
}

impl VmTracer for ProfilingTracer {
    #[inline]
    fn on_lookup(&mut self, _class_name: &str, _attr: &str, found: Option<MemberKind>) {
        self.total_lookups += 1;
        match found {
            Some(kind) => *self.hits_by_kind.entry(kind).or_insert(0) += 1,
            None => self.lookup_misses += 1,
        }
    }

    fn on_instance_hit(&mut self, _attr: &str) {
        self.instance_hits += 1;
    }

    fn on_descriptor(&mut self, action: DescriptorAction, _attr: &str, _kind: MemberKind) {
        *self.descriptor_calls.entry(action).or_insert(0) += 1;
    }

    fn on_bind(&mut self, _attr: &str) {
        self.binds += 1;
    }

    #[inline]
    fn on_call(&mut self, _func_name: Option<&str>, depth: usize) {
        self.total_calls += 1;
        if depth > self.max_depth {
            self.max_depth = depth;
        }
    }

    fn on_failure(&mut self, _failure: &AttrFailure) {
        self.failures += 1;
    }
}

impl fmt::Display for ProfilingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Attribute Resolution Report ===")?;
        writeln!(f, "Lookups:        {}", self.total_lookups)?;
        writeln!(f, "Lookup misses:  {}", self.lookup_misses)?;
        writeln!(f, "Instance hits:  {}", self.instance_hits)?;
        writeln!(f, "Binds:          {}", self.binds)?;
        writeln!(f, "Host calls:     {}", self.total_calls)?;
        writeln!(f, "Max call depth: {}", self.max_depth)?;
        writeln!(f, "Failures:       {}", self.failures)?;
        writeln!(f)?;
        writeln!(f, "--- Lookup hits by kind ---")?;
        for (kind, count) in &self.hits_by_kind {
            writeln!(f, "  {kind:<20} {count:>10}")?;
        }
        writeln!(f, "--- Descriptor dispatch ---")?;
        for (action, count) in &self.descriptor_calls {
            writeln!(f, "  {action:<20} {count:>10}")?;
        }
        Ok(())
    }
}

// ============================================================================
// RecordingTracer: full event log
// ============================================================================

/// Tracer that records every event in order.
///
/// Useful in tests to assert the exact resolution path taken.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    /// All recorded events in chronological order.
    events: Vec<TraceEvent>,
    /// Optional limit on number of events recorded.
    limit: Option<usize>,
}

impl RecordingTracer {
    /// Creates a new recording tracer with no event limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new recording tracer that stops recording after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Consumes the tracer and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    /// Drops all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn record(&mut self, event: TraceEvent) {
        if self.limit.is_some_and(|l| self.events.len() >= l) {
            return;
        }
        self.events.push(event);
    }
}

impl VmTracer for RecordingTracer {
    fn on_lookup(&mut self, class_name: &str, attr: &str, found: Option<MemberKind>) {
        self.record(TraceEvent::Lookup {
            class_name: class_name.to_owned(),
            attr: attr.to_owned(),
            found,
        });
    }

    fn on_instance_hit(&mut self, attr: &str) {
        self.record(TraceEvent::InstanceHit { attr: attr.to_owned() });
    }

    fn on_descriptor(&mut self, action: DescriptorAction, attr: &str, kind: MemberKind) {
        self.record(TraceEvent::Descriptor {
            action,
            attr: attr.to_owned(),
            kind,
        });
    }

    fn on_bind(&mut self, attr: &str) {
        self.record(TraceEvent::Bind { attr: attr.to_owned() });
    }

    fn on_call(&mut self, func_name: Option<&str>, depth: usize) {
        self.record(TraceEvent::Call {
            func_name: func_name.map(String::from),
            depth,
        });
    }

    fn on_return(&mut self, depth: usize) {
        self.record(TraceEvent::Return { depth });
    }

    fn on_failure(&mut self, failure: &AttrFailure) {
        self.record(TraceEvent::Failure(failure.clone()));
    }
}
