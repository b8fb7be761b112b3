//! Type-safe wrappers for ADD variables and levels.
//!
//! A [`Var`] names a decision variable and never changes; a [`Level`] is the
//! variable's current position in the order and changes under reordering.
use std::fmt;

/// A variable identifier (1-indexed).
///
/// # Invariants
///
/// - Variable IDs must be >= 1 (0 is reserved)
/// - Variable IDs are independent of their position in the variable ordering
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Returns the raw variable ID.
    pub fn id(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A level in the variable ordering (0-indexed, 0 is the root side).
///
/// Terminals sit at [`Level::TERMINAL`], below every variable, so comparing
/// levels of arbitrary nodes picks the topmost variable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(usize);

impl Level {
    /// Level of terminal nodes.
    pub const TERMINAL: Level = Level(usize::MAX);

    pub fn new(index: usize) -> Self {
        Level(index)
    }

    /// Returns the raw level index.
    pub fn index(self) -> usize {
        self.0
    }

    /// Returns the next level down.
    pub fn next(self) -> Self {
        Level(self.0 + 1)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::TERMINAL
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "L⊥")
        } else {
            write!(f, "L{}", self.0)
        }
    }
}

impl From<Level> for usize {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl From<usize> for Level {
    fn from(index: usize) -> Self {
        Level(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert_eq!(v2.id(), 2);
        assert!(v1 < v2);
        assert_eq!(v2.to_string(), "x2");
    }

    #[test]
    #[should_panic(expected = "Variable IDs must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    fn test_terminal_level_is_below_everything() {
        let l0 = Level::new(0);
        assert!(l0 < l0.next());
        assert!(l0.next() < Level::TERMINAL);
        assert!(Level::TERMINAL.is_terminal());
        assert_eq!(Level::TERMINAL.to_string(), "L⊥");
    }
}
