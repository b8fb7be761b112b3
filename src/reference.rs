use std::fmt::{Display, Formatter};

/// Raw handle to a node in the store.
///
/// A `Ref` does not keep its node alive; see [`Diagram`][crate::diagram::Diagram]
/// for the counted handle. Slots `0` and `1` hold the pinned `0.0` and `1.0`
/// terminals.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Ref(u32);

impl Ref {
    pub const ZERO: Ref = Ref(0);
    pub const ONE: Ref = Ref(1);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the slot index of the reference.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}
