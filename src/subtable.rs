//! Unique tables.
//!
//! Decision nodes live in one [`Subtable`] per level, keyed by their
//! `(high, low)` children; the variable is implied by the table. Terminals are
//! hash-consed separately in a [`TerminalTable`] keyed by the bit pattern of
//! their canonical value.
//!
//! ```text
//! subtables[0] → nodes labelled with the variable at level 0
//! subtables[1] → nodes labelled with the variable at level 1
//! ...
//! terminals    → 0.0, 1.0, 2.5, ...
//! ```
//!
//! Swapping two adjacent levels only touches the two subtables involved.

use std::collections::HashMap;

use crate::node::value_key;
use crate::reference::Ref;
use crate::types::Var;

/// A subtable storing the decision nodes of a single variable.
#[derive(Debug, Clone)]
pub struct Subtable {
    /// The variable for all nodes in this subtable.
    pub variable: Var,

    /// Map from (high, low) to the node.
    nodes: HashMap<(Ref, Ref), Ref>,
}

impl Subtable {
    pub fn new(variable: Var) -> Self {
        Self {
            variable,
            nodes: HashMap::new(),
        }
    }

    /// Look up a node by its children.
    pub fn find(&self, high: Ref, low: Ref) -> Option<Ref> {
        self.nodes.get(&(high, low)).copied()
    }

    pub fn insert(&mut self, high: Ref, low: Ref, node: Ref) {
        let old = self.nodes.insert((high, low), node);
        debug_assert!(old.is_none(), "duplicate unique-table entry for ({}, {})", high, low);
    }

    pub fn remove(&mut self, high: Ref, low: Ref) -> Option<Ref> {
        self.nodes.remove(&(high, low))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all `(high, low, node)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (Ref, Ref, Ref)> + '_ {
        self.nodes.iter().map(|(&(high, low), &node)| (high, low, node))
    }

    /// Take every entry out, leaving the subtable empty.
    pub fn drain(&mut self) -> Vec<(Ref, Ref, Ref)> {
        self.nodes.drain().map(|((high, low), node)| (high, low, node)).collect()
    }
}

/// Hash-consing table for terminal values.
#[derive(Debug, Clone, Default)]
pub struct TerminalTable {
    nodes: HashMap<u64, Ref>,
}

impl TerminalTable {
    pub fn find(&self, value: f64) -> Option<Ref> {
        self.nodes.get(&value_key(value)).copied()
    }

    pub fn insert(&mut self, value: f64, node: Ref) {
        self.nodes.insert(value_key(value), node);
    }

    pub fn remove(&mut self, value: f64) -> Option<Ref> {
        self.nodes.remove(&value_key(value))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
