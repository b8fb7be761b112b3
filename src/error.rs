use std::time::Duration;

use thiserror::Error;

use crate::reference::Ref;
use crate::types::Var;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddError {
    #[error("Node {0} is not a cube of positive literals")]
    InvalidCube(Ref),

    #[error("Node store exhausted: {live} live nodes, capacity {capacity}")]
    AllocationFailure { live: usize, capacity: usize },

    #[error("Operation aborted after exceeding the time limit of {limit:?}")]
    Timeout { limit: Duration },

    #[error("Variable {variable} does not precede the variables of its children")]
    OrderViolation { variable: Var },

    #[error("Invalid variable order: {0}")]
    InvalidOrder(String),

    #[error("Operation gave up after {attempts} attempts, each interrupted by reordering")]
    RetryLimitExceeded { attempts: usize },
}

pub type AddResult<T> = Result<T, AddError>;

/// Why an in-flight recursion stopped.
///
/// `Reordered` is not a failure: the public entry point restarts the whole
/// operation from scratch. Everything else is reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Interrupt {
    Reordered,
    Failed(AddError),
}

impl From<AddError> for Interrupt {
    fn from(error: AddError) -> Self {
        Interrupt::Failed(error)
    }
}

pub(crate) type Step<T> = Result<T, Interrupt>;
