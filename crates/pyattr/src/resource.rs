use std::fmt;

use crate::exception_private::{ExcType, RunError, SimpleException};

/// Error returned when a resource limit is exceeded while resolving attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// Maximum number of heap allocations exceeded.
    Allocation { limit: usize, count: usize },
    /// Maximum heap memory usage exceeded.
    Memory { limit: usize, used: usize },
    /// Maximum nested host call depth exceeded.
    Recursion { limit: usize, depth: usize },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { limit, count } => {
                write!(f, "allocation limit exceeded: {count} > {limit}")
            }
            Self::Memory { limit, used } => {
                write!(f, "memory limit exceeded: {used} bytes > {limit} bytes")
            }
            Self::Recursion { .. } => write!(f, "maximum recursion depth exceeded"),
        }
    }
}

impl std::error::Error for ResourceError {}

impl ResourceError {
    /// Converts this resource error to a Python exception.
    ///
    /// - `Allocation` → `MemoryError`
    /// - `Memory` → `MemoryError`
    /// - `Recursion` → `RecursionError`
    #[must_use]
    pub(crate) fn into_exception(self) -> SimpleException {
        let exc_type = match self {
            Self::Allocation { .. } | Self::Memory { .. } => ExcType::MemoryError,
            Self::Recursion { .. } => ExcType::RecursionError,
        };
        SimpleException::new_msg(exc_type, self)
    }
}

impl From<ResourceError> for RunError {
    fn from(err: ResourceError) -> Self {
        // RecursionError is catchable, the other limits are not
        if matches!(err, ResourceError::Recursion { .. }) {
            Self::Exc(Box::new(err.into_exception()))
        } else {
            Self::UncatchableExc(Box::new(err.into_exception()))
        }
    }
}

/// Trait for tracking resource usage of a heap and the VM driving it.
pub trait ResourceTracker: fmt::Debug {
    /// Called before each heap allocation.
    ///
    /// Returns `Ok(())` if the allocation should proceed, or `Err(ResourceError)`
    /// if a limit would be exceeded.
    ///
    /// # Arguments
    /// * `get_size` - Lazily computed approximate size in bytes of the allocation
    fn on_allocate(&mut self, get_size: impl FnOnce() -> usize) -> Result<(), ResourceError>;

    /// Called before every host call to check the nesting depth.
    ///
    /// # Arguments
    /// * `current_depth` - Current host call depth (before the new call is entered)
    fn check_recursion_depth(&self, current_depth: usize) -> Result<(), ResourceError>;

    /// Maximum number of classes in a single inheritance chain.
    fn max_inheritance_depth(&self) -> usize {
        MAX_INHERITANCE_DEPTH
    }

    /// Returns the total number of allocations tracked, if this tracker records them.
    ///
    /// `LimitedTracker` returns `Some(count)`; `NoLimitTracker` returns `None`.
    fn allocation_count(&self) -> Option<usize> {
        None
    }
}

/// A resource tracker with no allocation or memory limits.
///
/// Recursion is still bounded by [`DEFAULT_MAX_RECURSION_DEPTH`] so a
/// self-referencing getter fails with `RecursionError` instead of overflowing
/// the native stack.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct NoLimitTracker;

impl ResourceTracker for NoLimitTracker {
    #[inline]
    fn on_allocate(&mut self, _get_size: impl FnOnce() -> usize) -> Result<(), ResourceError> {
        Ok(())
    }

    /// The default value of 1000 matches CPython behavior.
    #[inline]
    fn check_recursion_depth(&self, current_depth: usize) -> Result<(), ResourceError> {
        if current_depth >= DEFAULT_MAX_RECURSION_DEPTH {
            Err(ResourceError::Recursion {
                limit: DEFAULT_MAX_RECURSION_DEPTH,
                depth: current_depth + 1,
            })
        } else {
            Ok(())
        }
    }
}

/// Configuration for resource limits.
///
/// All limits are optional - set to `None` to disable a specific limit.
/// Use `ResourceLimits::default()` for no limits, or build custom limits
/// with the builder pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of heap allocations allowed.
    pub max_allocations: Option<usize>,
    /// Maximum heap memory in bytes (approximate).
    pub max_memory: Option<usize>,
    /// Maximum nested host call depth.
    pub max_recursion_depth: Option<usize>,
    /// Maximum number of classes in one inheritance chain.
    pub max_inheritance_depth: Option<usize>,
}

/// Recommended maximum recursion depth if not otherwise specified.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

/// Maximum depth of single-path inheritance chains.
///
/// Bounds the parent-pointer walk performed by every class-level lookup.
pub const MAX_INHERITANCE_DEPTH: usize = 1000;

impl ResourceLimits {
    /// Creates a new ResourceLimits with all limits disabled, except max recursion which is set to 1000.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_recursion_depth: Some(DEFAULT_MAX_RECURSION_DEPTH),
            ..Default::default()
        }
    }

    /// Sets the maximum number of allocations.
    #[must_use]
    pub fn max_allocations(mut self, limit: usize) -> Self {
        self.max_allocations = Some(limit);
        self
    }

    /// Sets the maximum memory usage in bytes.
    #[must_use]
    pub fn max_memory(mut self, limit: usize) -> Self {
        self.max_memory = Some(limit);
        self
    }

    /// Sets the maximum recursion depth (host call nesting depth).
    #[must_use]
    pub fn max_recursion_depth(mut self, limit: Option<usize>) -> Self {
        self.max_recursion_depth = limit;
        self
    }

    /// Sets the maximum inheritance chain depth.
    #[must_use]
    pub fn max_inheritance_depth(mut self, limit: usize) -> Self {
        self.max_inheritance_depth = Some(limit);
        self
    }
}

/// A resource tracker that enforces configurable limits.
///
/// Tracks allocation count and approximate memory usage, returning errors
/// when limits are exceeded.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LimitedTracker {
    limits: ResourceLimits,
    /// Total number of allocations made.
    allocation_count: usize,
    /// Current approximate memory usage in bytes.
    current_memory: usize,
}

impl LimitedTracker {
    /// Creates a new LimitedTracker with the given limits.
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            allocation_count: 0,
            current_memory: 0,
        }
    }

    /// Returns the configured limits.
    #[must_use]
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Returns the current approximate memory usage.
    #[must_use]
    pub fn current_memory(&self) -> usize {
        self.current_memory
    }
}

impl ResourceTracker for LimitedTracker {
    fn on_allocate(&mut self, get_size: impl FnOnce() -> usize) -> Result<(), ResourceError> {
        if let Some(max) = self.limits.max_allocations
            && self.allocation_count >= max
        {
            return Err(ResourceError::Allocation {
                limit: max,
                count: self.allocation_count + 1,
            });
        }

        let size = get_size();
        if let Some(max) = self.limits.max_memory {
            let new_memory = self.current_memory + size;
            if new_memory > max {
                return Err(ResourceError::Memory {
                    limit: max,
                    used: new_memory,
                });
            }
        }

        self.allocation_count += 1;
        self.current_memory += size;
        Ok(())
    }

    fn check_recursion_depth(&self, current_depth: usize) -> Result<(), ResourceError> {
        if let Some(max) = self.limits.max_recursion_depth {
            // current_depth is before the call, so the new depth would be current_depth + 1
            if current_depth >= max {
                return Err(ResourceError::Recursion {
                    limit: max,
                    depth: current_depth + 1,
                });
            }
        }
        Ok(())
    }

    fn max_inheritance_depth(&self) -> usize {
        self.limits.max_inheritance_depth.unwrap_or(MAX_INHERITANCE_DEPTH)
    }

    fn allocation_count(&self) -> Option<usize> {
        Some(self.allocation_count)
    }
}
