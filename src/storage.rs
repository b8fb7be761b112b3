//! Slot arena holding every node together with its reference count.
//!
//! Slots are reused after a node is freed. The arena never grows past its
//! capacity; [`Storage::alloc`] reports exhaustion instead of panicking so the
//! manager can sweep garbage and retry.

use std::cmp::min;

use crate::node::Node;
use crate::reference::Ref;

/// Count value at which a node becomes permanent.
pub const SATURATED: u32 = u32::MAX;

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    refs: u32,
    occupied: bool,
}

pub struct Storage {
    data: Vec<Entry>,
    /// Index of the first *possibly* free cell.
    min_free: usize,
    /// Number of occupied cells.
    real_size: usize,
    capacity: usize,
}

impl Storage {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "Storage must have room for both constant terminals");
        Self {
            data: Vec::with_capacity(min(capacity, 1 << 16)),
            min_free: 0,
            real_size: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots.
    pub fn real_size(&self) -> usize {
        self.real_size
    }

    /// Number of slots that can still be allocated.
    pub fn headroom(&self) -> usize {
        self.capacity - self.real_size
    }

    pub fn is_occupied(&self, r: Ref) -> bool {
        self.data.get(r.index()).is_some_and(|e| e.occupied)
    }

    pub fn node(&self, r: Ref) -> Node {
        let entry = &self.data[r.index()];
        assert!(entry.occupied, "Node {} is not occupied", r);
        entry.node
    }

    pub fn set_node(&mut self, r: Ref, node: Node) {
        let entry = &mut self.data[r.index()];
        assert!(entry.occupied, "Node {} is not occupied", r);
        entry.node = node;
    }

    /// Stores `node` with a zero count, or returns `None` when full.
    pub fn alloc(&mut self, node: Node) -> Option<Ref> {
        let index = match (self.min_free..self.data.len()).find(|&i| !self.data[i].occupied) {
            Some(i) => i,
            None if self.data.len() < self.capacity => {
                self.data.push(Entry {
                    node,
                    refs: 0,
                    occupied: false,
                });
                self.data.len() - 1
            }
            None => return None,
        };

        self.data[index] = Entry {
            node,
            refs: 0,
            occupied: true,
        };
        self.min_free = index + 1;
        self.real_size += 1;

        Some(Ref::new(index as u32))
    }

    pub fn free(&mut self, r: Ref) {
        let entry = &mut self.data[r.index()];
        assert!(entry.occupied, "Double free of node {}", r);
        assert_ne!(entry.refs, SATURATED, "Node {} is permanent", r);
        entry.occupied = false;
        self.min_free = min(self.min_free, r.index());
        self.real_size -= 1;
    }

    pub fn refs(&self, r: Ref) -> u32 {
        self.data[r.index()].refs
    }

    pub fn inc_ref(&mut self, r: Ref) {
        let entry = &mut self.data[r.index()];
        debug_assert!(entry.occupied, "inc_ref on free node {}", r);
        entry.refs = entry.refs.saturating_add(1);
    }

    /// Decrements the count of `r` and returns the new count.
    /// Saturated counts stay put.
    pub fn dec_ref(&mut self, r: Ref) -> u32 {
        let entry = &mut self.data[r.index()];
        debug_assert!(entry.occupied, "dec_ref on free node {}", r);
        if entry.refs != SATURATED {
            assert!(entry.refs > 0, "Reference count underflow on node {}", r);
            entry.refs -= 1;
        }
        entry.refs
    }

    pub fn pin(&mut self, r: Ref) {
        self.data[r.index()].refs = SATURATED;
    }

    /// Occupied slots with a zero count.
    pub fn dead(&self) -> Vec<Ref> {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, e)| e.occupied && e.refs == 0)
            .map(|(i, _)| Ref::new(i as u32))
            .collect()
    }
}
