//! Variable reordering and the invalidation protocol around it.
//!
//! # In-place adjacent swap
//!
//! Swapping the variables `x` (level `i`) and `y` (level `i + 1`) only
//! touches the nodes of those two levels. An `x`-node that does not depend on
//! `y` simply moves down with its variable. An `x`-node `n = x ? f1 : f0`
//! that does depend on `y` is relabelled in place as
//!
//! ```text
//! n = y ? (x ? f11 : f01) : (x ? f10 : f00)
//! ```
//!
//! where `fab` is `f` with `x = a, y = b`. The node keeps its slot and its
//! function, so every [`Diagram`][crate::diagram::Diagram] and every parent
//! edge stays valid. Nodes that lose their last parent this way are left for
//! the next sweep.
//!
//! # Invalidation
//!
//! A reorder changes which variable lives at which level, so every memoized
//! result and every in-flight recursion is stale. Each reorder clears the
//! operation cache and bumps the manager's generation; public operations
//! compare generations and restart when they differ.
//!
//! # Policies
//!
//! The manager never decides on an order by itself. A [`ReorderPolicy`] is
//! consulted after each automatic garbage collection and may ask for a new
//! order, which is then applied immediately.

use log::debug;

use crate::error::{AddError, AddResult, Step};
use crate::manager::AddManager;
use crate::node::Node;
use crate::reference::Ref;
use crate::types::{Level, Var};

/// Decides whether to reorder after an automatic garbage collection.
pub trait ReorderPolicy {
    /// Returns the desired order (top level first), or `None` to keep `order`.
    fn propose(&mut self, order: &[Var], live_nodes: usize) -> Option<Vec<Var>>;
}

impl<F> ReorderPolicy for F
where
    F: FnMut(&[Var], usize) -> Option<Vec<Var>>,
{
    fn propose(&mut self, order: &[Var], live_nodes: usize) -> Option<Vec<Var>> {
        self(order, live_nodes)
    }
}

/// Statistics collected during reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderStats {
    /// Number of adjacent swaps performed
    pub swaps: usize,
    /// Live nodes before reordering (after the initial sweep)
    pub initial_size: usize,
    /// Live nodes after reordering (after the final sweep)
    pub final_size: usize,
}

impl ReorderStats {
    /// Calculate the size reduction ratio.
    pub fn reduction_ratio(&self) -> f64 {
        if self.initial_size == 0 {
            return 0.0;
        }
        1.0 - (self.final_size as f64 / self.initial_size as f64)
    }
}

impl AddManager {
    pub fn set_reorder_policy(&self, policy: impl ReorderPolicy + 'static) {
        *self.reorder_policy.borrow_mut() = Some(Box::new(policy));
    }

    pub fn clear_reorder_policy(&self) {
        *self.reorder_policy.borrow_mut() = None;
    }

    /// Rearranges the variables into `order` (top level first).
    ///
    /// `order` must list every variable exactly once. Existing diagrams keep
    /// denoting the same functions. If a swap runs out of memory the order is
    /// left wherever it got to, still consistent, and the error is returned.
    pub fn reorder(&self, order: &[Var]) -> AddResult<ReorderStats> {
        debug!("reorder(order = {:?})", order);
        self.check_permutation(order)?;

        self.collect_garbage();
        let mut stats = ReorderStats {
            initial_size: self.num_nodes(),
            ..ReorderStats::default()
        };

        let mut outcome = Ok(());
        'outer: for (target, &v) in order.iter().enumerate() {
            let mut level = self.level_of(v).index();
            while level > target {
                if let Err(e) = self.swap_levels(Level::new(level - 1)) {
                    outcome = Err(e);
                    break 'outer;
                }
                stats.swaps += 1;
                level -= 1;
            }
        }

        if stats.swaps > 0 {
            self.invalidate();
            self.collect_garbage();
        }
        stats.final_size = self.num_nodes();
        debug!("reorder: {:?}", stats);
        outcome.map(|_| stats)
    }

    /// Swaps the variables at `level` and `level + 1`.
    pub fn swap_adjacent(&self, level: Level) -> AddResult<()> {
        if level.next().index() >= self.num_vars() {
            return Err(AddError::InvalidOrder(format!("no level below {}", level)));
        }
        self.swap_levels(level)?;
        self.invalidate();
        Ok(())
    }

    /// Asks the installed policy for a new order and applies it.
    ///
    /// Returns whether the order changed.
    pub(crate) fn consult_reorder_policy(&self) -> Step<bool> {
        let order = self.order();
        let live = self.num_nodes();
        let proposal = match self.reorder_policy.borrow_mut().as_mut() {
            Some(policy) => policy.propose(&order, live),
            None => None,
        };
        match proposal {
            Some(new_order) if new_order != order => {
                self.reorder(&new_order)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn invalidate(&self) {
        self.generation.set(self.generation.get() + 1);
        self.cache.borrow_mut().clear();
        self.stats.borrow_mut().reorders += 1;
    }

    fn check_permutation(&self, order: &[Var]) -> AddResult<()> {
        let n = self.num_vars();
        if order.len() != n {
            return Err(AddError::InvalidOrder(format!(
                "expected {} variables, got {}",
                n,
                order.len()
            )));
        }
        let mut seen = vec![false; n + 1];
        for &v in order {
            if v.index() > n {
                return Err(AddError::InvalidOrder(format!("unknown variable {}", v)));
            }
            if seen[v.index()] {
                return Err(AddError::InvalidOrder(format!("variable {} listed twice", v)));
            }
            seen[v.index()] = true;
        }
        Ok(())
    }

    /// In-place swap of two adjacent levels, without touching the cache or the generation.
    fn swap_levels(&self, level: Level) -> AddResult<()> {
        let i = level.index();
        {
            let storage = self.storage.borrow();
            let upper = self.subtables.borrow()[i].len();
            if storage.headroom() < 2 * upper {
                return Err(AddError::AllocationFailure {
                    live: storage.real_size(),
                    capacity: storage.capacity(),
                });
            }
        }

        let (x, y, x_nodes) = {
            let mut subtables = self.subtables.borrow_mut();
            let mut level_map = self.level_map.borrow_mut();
            let x = subtables[i].variable;
            let y = subtables[i + 1].variable;
            let x_nodes = subtables[i].drain();
            subtables.swap(i, i + 1);
            level_map[x.index()] = Level::new(i + 1);
            level_map[y.index()] = Level::new(i);
            (x, y, x_nodes)
        };
        debug!("swap_levels({}): {} <-> {}", level, x, y);

        let mut dependent = Vec::new();
        for (high, low, n) in x_nodes {
            if self.variable(high) == Some(y) || self.variable(low) == Some(y) {
                dependent.push((high, low, n));
            } else {
                self.subtables.borrow_mut()[i + 1].insert(high, low, n);
            }
        }

        for (f1, f0, n) in dependent {
            let (f11, f10) = self.cofactors_on(f1, y);
            let (f01, f00) = self.cofactors_on(f0, y);
            let high = self.swap_mk(x, Level::new(i + 1), f11, f01)?;
            let low = self.swap_mk(x, Level::new(i + 1), f10, f00)?;
            debug_assert_ne!(high, low);
            {
                let mut storage = self.storage.borrow_mut();
                storage.inc_ref(high);
                storage.inc_ref(low);
                storage.dec_ref(f1);
                storage.dec_ref(f0);
                storage.set_node(n, Node::Decision { variable: y, high, low });
            }
            self.subtables.borrow_mut()[i].insert(high, low, n);
        }
        Ok(())
    }

    fn cofactors_on(&self, r: Ref, v: Var) -> (Ref, Ref) {
        match self.node(r) {
            Node::Decision { variable, high, low } if variable == v => (high, low),
            _ => (r, r),
        }
    }

    /// Finds or creates `x ? high : low` during a swap. New nodes start with no references.
    fn swap_mk(&self, x: Var, level: Level, high: Ref, low: Ref) -> AddResult<Ref> {
        if high == low {
            return Ok(high);
        }
        let existing = self.subtables.borrow()[level.index()].find(high, low);
        if let Some(r) = existing {
            return Ok(r);
        }
        let mut storage = self.storage.borrow_mut();
        let r = storage
            .alloc(Node::Decision { variable: x, high, low })
            .ok_or(AddError::AllocationFailure {
                live: storage.real_size(),
                capacity: storage.capacity(),
            })?;
        storage.inc_ref(high);
        storage.inc_ref(low);
        drop(storage);
        self.subtables.borrow_mut()[level.index()].insert(high, low, r);
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AddConfig;
    use crate::diagram::Diagram;

    use test_log::test;

    fn table(mgr: &AddManager, f: &Diagram<'_>, n: usize) -> Vec<f64> {
        (0..1u32 << n)
            .map(|bits| mgr.eval(f, |v| bits >> (v.id() - 1) & 1 == 1))
            .collect()
    }

    fn weighted(a: &[bool]) -> f64 {
        a.iter().enumerate().filter(|&(_, &b)| b).map(|(i, _)| (i + 1) as f64).sum::<f64>() * 0.5
    }

    #[test]
    fn test_swap_preserves_functions() {
        let mgr = AddManager::default();
        let vars: Vec<Var> = (1..=3).map(Var::new).collect();
        let f = mgr.tabulate(&vars, weighted).unwrap();
        let g = mgr.tabulate(&vars, |a| if a[0] && !a[1] { 2.0 } else { a[2] as u8 as f64 }).unwrap();
        let before = (table(&mgr, &f, 3), table(&mgr, &g, 3));

        mgr.swap_adjacent(Level::new(0)).unwrap();
        assert_eq!(mgr.order(), vec![Var::new(2), Var::new(1), Var::new(3)]);
        assert_eq!(mgr.generation(), 1);
        assert_eq!((table(&mgr, &f, 3), table(&mgr, &g, 3)), before);

        // Rebuilding under the new order finds the same nodes.
        assert_eq!(mgr.tabulate(&vars, weighted).unwrap(), f);
        assert_eq!(mgr.variable(f.node()), Some(Var::new(2)));
    }

    #[test]
    fn test_reorder_reverse() {
        let mgr = AddManager::default();
        let vars: Vec<Var> = (1..=4).map(Var::new).collect();
        let f = mgr.tabulate(&vars, |a| if a[0] == a[3] { 3.0 } else { a[1] as u8 as f64 }).unwrap();
        let before = table(&mgr, &f, 4);

        let reversed: Vec<Var> = vars.iter().rev().copied().collect();
        let stats = mgr.reorder(&reversed).unwrap();
        assert_eq!(stats.swaps, 6);
        assert_eq!(mgr.order(), reversed);
        assert_eq!(table(&mgr, &f, 4), before);

        let stats = mgr.reorder(&vars).unwrap();
        assert_eq!(stats.swaps, 6);
        assert_eq!(mgr.order(), vars);
        assert_eq!(table(&mgr, &f, 4), before);
    }

    #[test]
    fn test_reorder_rejects_bad_orders() {
        let mgr = AddManager::default();
        mgr.ensure_var(Var::new(3));
        assert!(matches!(mgr.reorder(&[Var::new(1), Var::new(2)]), Err(AddError::InvalidOrder(_))));
        assert!(matches!(
            mgr.reorder(&[Var::new(1), Var::new(1), Var::new(2)]),
            Err(AddError::InvalidOrder(_))
        ));
        assert!(matches!(
            mgr.reorder(&[Var::new(1), Var::new(2), Var::new(4)]),
            Err(AddError::InvalidOrder(_))
        ));
        assert!(mgr.swap_adjacent(Level::new(2)).is_err());
        assert_eq!(mgr.generation(), 0);
    }

    #[test]
    fn test_swap_leaves_refcounts_balanced() {
        let mgr = AddManager::default();
        let vars: Vec<Var> = (1..=3).map(Var::new).collect();
        let base = mgr.num_nodes();
        {
            let f = mgr.tabulate(&vars, weighted).unwrap();
            mgr.swap_adjacent(Level::new(1)).unwrap();
            mgr.swap_adjacent(Level::new(0)).unwrap();
            assert_eq!(mgr.ref_count(f.node()), 1);
        }
        mgr.collect_garbage();
        assert_eq!(mgr.num_nodes(), base);
    }

    #[test]
    fn test_policy_fires_after_automatic_gc() {
        let mgr = AddManager::with_config(AddConfig {
            gc_threshold: 4,
            ..AddConfig::default()
        });
        mgr.ensure_var(Var::new(2));
        let mut fired = false;
        mgr.set_reorder_policy(move |order: &[Var], _live: usize| {
            if fired {
                None
            } else {
                fired = true;
                Some(order.iter().rev().copied().collect())
            }
        });

        let vars = [Var::new(1), Var::new(2)];
        let f = mgr.tabulate(&vars, |a| a[0] as u8 as f64 * 2.0 + a[1] as u8 as f64 + 1.0).unwrap();
        assert_eq!(mgr.order(), vec![Var::new(2), Var::new(1)]);
        assert_eq!(mgr.generation(), 1);
        assert!(mgr.stats().restarts >= 1);
        assert_eq!(table(&mgr, &f, 2), vec![1.0, 3.0, 2.0, 4.0]);
    }
}
