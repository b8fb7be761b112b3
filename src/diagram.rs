//! Counted handles to diagrams.
//!
//! A [`Diagram`] is a [`Ref`] plus the manager it belongs to. Holding one
//! keeps its node (and everything below it) alive across garbage
//! collection; cloning takes another reference and dropping gives it back.
//! Every operation hands out its result as a fresh `Diagram`, and the
//! recursions keep their intermediate results in `Diagram`s too, so counts
//! stay balanced on every exit path.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

use crate::manager::AddManager;
use crate::reference::Ref;
use crate::types::Var;

pub struct Diagram<'m> {
    manager: &'m AddManager,
    node: Ref,
}

impl<'m> Diagram<'m> {
    /// Wraps `node`, whose count has already been incremented on behalf of this handle.
    pub(crate) fn from_owned(manager: &'m AddManager, node: Ref) -> Self {
        Self { manager, node }
    }

    pub fn node(&self) -> Ref {
        self.node
    }

    pub fn manager(&self) -> &'m AddManager {
        self.manager
    }

    pub fn is_zero(&self) -> bool {
        self.node == Ref::ZERO
    }

    pub fn is_one(&self) -> bool {
        self.node == Ref::ONE
    }

    pub fn is_terminal(&self) -> bool {
        self.manager.is_terminal(self.node)
    }

    /// Terminal value, or `None` for decision nodes.
    pub fn value(&self) -> Option<f64> {
        self.manager.value(self.node)
    }

    /// Top variable, or `None` for terminals.
    pub fn variable(&self) -> Option<Var> {
        self.manager.variable(self.node)
    }

    /// Then-child of a decision node.
    pub fn high(&self) -> Option<Diagram<'m>> {
        let (high, _) = self.manager.node(self.node).children()?;
        Some(self.manager.own(high))
    }

    /// Else-child of a decision node.
    pub fn low(&self) -> Option<Diagram<'m>> {
        let (_, low) = self.manager.node(self.node).children()?;
        Some(self.manager.own(low))
    }
}

impl Clone for Diagram<'_> {
    fn clone(&self) -> Self {
        self.manager.retain(self.node);
        Self {
            manager: self.manager,
            node: self.node,
        }
    }
}

impl Drop for Diagram<'_> {
    fn drop(&mut self) {
        self.manager.release(self.node);
    }
}

impl PartialEq for Diagram<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.manager, other.manager) && self.node == other.node
    }
}

impl Eq for Diagram<'_> {}

impl Hash for Diagram<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}

impl fmt::Debug for Diagram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Diagram({})", self.node)
    }
}

impl fmt::Display for Diagram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)
    }
}
