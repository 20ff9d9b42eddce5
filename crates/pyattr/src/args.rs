use smallvec::SmallVec;

use crate::{
    exception_private::{ExcType, RunResult},
    value::Value,
};

/// Positional arguments for a call.
///
/// Uses specific variants for common cases (0-2 arguments). Descriptor hooks
/// take at most three arguments (`__get__(desc, inst, owner)`), so most calls
/// never allocate a `Vec`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ArgValues {
    Empty,
    One(Value),
    Two(Value, Value),
    Many(Vec<Value>),
}

impl ArgValues {
    /// Returns the number of positional arguments.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Two(_, _) => 2,
            Self::Many(args) => args.len(),
        }
    }

    /// Returns a new argument list with `first` in front, used to supply a bound receiver.
    #[must_use]
    pub fn prepend(self, first: Value) -> Self {
        match self {
            Self::Empty => Self::One(first),
            Self::One(a) => Self::Two(first, a),
            Self::Two(a, b) => Self::Many(vec![first, a, b]),
            Self::Many(mut args) => {
                args.insert(0, first);
                Self::Many(args)
            }
        }
    }

    /// Iterates the arguments in positional order without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        let none: &[Value] = &[];
        let (first, second, rest) = match self {
            Self::Empty => (None, None, none),
            Self::One(a) => (Some(a), None, none),
            Self::Two(a, b) => (Some(a), Some(b), none),
            Self::Many(args) => (None, None, args.as_slice()),
        };
        first.into_iter().chain(second).chain(rest)
    }

    /// Flattens the arguments into positional order.
    #[must_use]
    pub fn into_smallvec(self) -> SmallVec<[Value; 3]> {
        match self {
            Self::Empty => SmallVec::new(),
            Self::One(a) => smallvec::smallvec![a],
            Self::Two(a, b) => smallvec::smallvec![a, b],
            Self::Many(args) => SmallVec::from_vec(args),
        }
    }

    /// Checks that zero arguments were passed.
    pub fn check_zero_args(&self, name: &str) -> RunResult<()> {
        match self {
            Self::Empty => Ok(()),
            Self::Many(args) if args.is_empty() => Ok(()),
            _ => Err(ExcType::type_error_no_args(name)),
        }
    }
}

impl From<Vec<Value>> for ArgValues {
    fn from(mut args: Vec<Value>) -> Self {
        match args.len() {
            0 => Self::Empty,
            1 => Self::One(args.remove(0)),
            2 => {
                let b = args.remove(1);
                let a = args.remove(0);
                Self::Two(a, b)
            }
            _ => Self::Many(args),
        }
    }
}

impl From<Value> for ArgValues {
    fn from(arg: Value) -> Self {
        Self::One(arg)
    }
}
