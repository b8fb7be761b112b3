//! Operation cache (computed table).
//!
//! Every memoized recursion stores its results under an [`OpKey`]: an
//! operator tag plus the raw operands. Entries hold unprotected [`Ref`]s, so
//! the manager clears the whole cache whenever nodes may be reclaimed or
//! relabelled (garbage collection, reordering).

mod hashmap;

pub use hashmap::HashMapCache;

use crate::abstraction::Abstraction;
use crate::apply::BinaryOp;
use crate::reference::Ref;
use crate::representative::Extremum;

/// Default cache implementation.
pub type Cache<K, V> = HashMapCache<K, V>;

/// Cache key of a memoized operation.
///
/// Each abstraction operator and each representative operator has its own
/// tag, so results of different operators never alias.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OpKey {
    Apply(BinaryOp, Ref, Ref),
    Not(Ref),
    Ite(Ref, Ref, Ref),
    Abstract(Abstraction, Ref, Ref),
    Representative(Extremum, Ref, Ref),
}

impl OpKey {
    /// Key for a binary apply; commutative operators get their operands sorted.
    pub fn apply(op: BinaryOp, f: Ref, g: Ref) -> Self {
        if op.is_commutative() && g < f {
            OpKey::Apply(op, g, f)
        } else {
            OpKey::Apply(op, f, g)
        }
    }
}
