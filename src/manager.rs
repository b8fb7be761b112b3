//! The ADD manager.
//!
//! [`AddManager`] owns the node store, the unique tables, the operation cache
//! and the variable order. All operations go through it, which keeps every
//! diagram canonical: for a fixed variable order each function has exactly
//! one node, so equality of functions is equality of [`Ref`]s.
//!
//! # Memory management
//!
//! Every node carries a reference count made of its parent edges plus the
//! [`Diagram`] handles pointing at it. Nodes whose count drops to zero are
//! *dead* but stay in place until the next sweep, so a cache or unique-table
//! hit can revive them. Sweeps run when the live-node count reaches the GC
//! threshold, or when the store is full.
//!
//! # Restarts
//!
//! An automatic sweep may be followed by a reordering (see
//! [`ReorderPolicy`][crate::reorder::ReorderPolicy]). Reordering relabels
//! nodes in place, so any recursion running at that moment is working from
//! stale levels. The constructor reports this as an internal restart signal,
//! the recursion unwinds (releasing its intermediates), and the public entry
//! point runs the whole operation again.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::time::{Duration, Instant};

use log::debug;

use crate::cache::{Cache, OpKey};
use crate::config::AddConfig;
use crate::diagram::Diagram;
use crate::error::{AddError, AddResult, Interrupt, Step};
use crate::node::{canonical_value, Node};
use crate::reference::Ref;
use crate::reorder::ReorderPolicy;
use crate::storage::Storage;
use crate::subtable::{Subtable, TerminalTable};
use crate::types::{Level, Var};

/// Counters describing the state of a manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Nodes with a non-zero reference count (pinned constants included).
    pub live_nodes: usize,
    /// Occupied slots, dead nodes awaiting collection included.
    pub total_nodes: usize,
    pub peak_nodes: usize,
    pub num_vars: usize,
    pub gc_runs: usize,
    pub reclaimed_nodes: usize,
    pub reorders: usize,
    pub restarts: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub generation: u64,
}

pub struct AddManager {
    pub(crate) config: AddConfig,
    pub(crate) storage: RefCell<Storage>,
    /// One subtable per level; `subtables[l].variable` is the variable at level `l`.
    pub(crate) subtables: RefCell<Vec<Subtable>>,
    pub(crate) terminals: RefCell<TerminalTable>,
    /// Level of each variable, indexed by variable ID (slot 0 unused).
    pub(crate) level_map: RefCell<Vec<Level>>,
    pub(crate) cache: RefCell<Cache<OpKey, Ref>>,
    pub(crate) reorder_policy: RefCell<Option<Box<dyn ReorderPolicy>>>,
    /// Bumped on every change of the variable order.
    pub(crate) generation: Cell<u64>,
    /// Generation at the start of the current attempt of a public operation.
    attempt_generation: Cell<u64>,
    gc_threshold: Cell<usize>,
    time_limit: Cell<Option<Duration>>,
    deadline: Cell<Option<Instant>>,
    pub(crate) stats: RefCell<ManagerStats>,
}

impl AddManager {
    pub fn new() -> Self {
        Self::with_config(AddConfig::default())
    }

    pub fn with_config(config: AddConfig) -> Self {
        let mut storage = Storage::new(config.max_nodes);
        let mut terminals = TerminalTable::default();
        for (expected, value) in [(Ref::ZERO, 0.0), (Ref::ONE, 1.0)] {
            let r = storage.alloc(Node::Terminal(value));
            assert_eq!(r, Some(expected), "constant terminals must occupy the first slots");
            storage.pin(expected);
            terminals.insert(value, expected);
        }

        Self {
            storage: RefCell::new(storage),
            subtables: RefCell::new(Vec::new()),
            terminals: RefCell::new(terminals),
            level_map: RefCell::new(vec![Level::TERMINAL]),
            cache: RefCell::new(Cache::new(config.cache_bits)),
            reorder_policy: RefCell::new(None),
            generation: Cell::new(0),
            attempt_generation: Cell::new(0),
            gc_threshold: Cell::new(config.gc_threshold),
            time_limit: Cell::new(config.time_limit),
            deadline: Cell::new(None),
            stats: RefCell::new(ManagerStats {
                live_nodes: 2,
                total_nodes: 2,
                peak_nodes: 2,
                ..ManagerStats::default()
            }),
            config,
        }
    }
}

impl Default for AddManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AddManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddManager")
            .field("num_vars", &self.num_vars())
            .field("nodes", &self.num_nodes())
            .field("cache_size", &self.cache.borrow().len())
            .field("generation", &self.generation.get())
            .finish()
    }
}

// ============================================================================
// Node Access
// ============================================================================

impl AddManager {
    pub fn node(&self, r: Ref) -> Node {
        self.storage.borrow().node(r)
    }

    pub fn is_zero(&self, r: Ref) -> bool {
        r == Ref::ZERO
    }

    pub fn is_one(&self, r: Ref) -> bool {
        r == Ref::ONE
    }

    pub fn is_terminal(&self, r: Ref) -> bool {
        self.node(r).is_terminal()
    }

    /// Terminal value of `r`, or `None` for decision nodes.
    pub fn value(&self, r: Ref) -> Option<f64> {
        self.node(r).value()
    }

    pub fn variable(&self, r: Ref) -> Option<Var> {
        self.node(r).variable()
    }

    /// Current level of the node's variable; terminals are at [`Level::TERMINAL`].
    pub fn level(&self, r: Ref) -> Level {
        match self.node(r) {
            Node::Terminal(_) => Level::TERMINAL,
            Node::Decision { variable, .. } => self.level_of(variable),
        }
    }

    /// Current level of a variable.
    ///
    /// # Panics
    ///
    /// Panics if the variable has not been created.
    pub fn level_of(&self, v: Var) -> Level {
        let level_map = self.level_map.borrow();
        assert!(v.index() < level_map.len(), "Variable {} does not exist", v);
        level_map[v.index()]
    }

    pub fn var_at(&self, level: Level) -> Var {
        self.subtables.borrow()[level.index()].variable
    }

    /// Variables listed from the top level down.
    pub fn order(&self) -> Vec<Var> {
        self.subtables.borrow().iter().map(|st| st.variable).collect()
    }

    pub fn num_vars(&self) -> usize {
        self.subtables.borrow().len()
    }

    /// Number of nodes currently in the store, dead ones included.
    pub fn num_nodes(&self) -> usize {
        self.storage.borrow().real_size()
    }

    /// Current reference count of a node (saturated for the constant terminals).
    pub fn ref_count(&self, r: Ref) -> u32 {
        self.storage.borrow().refs(r)
    }

    /// Counter incremented by every reordering.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub fn stats(&self) -> ManagerStats {
        let mut stats = self.stats.borrow().clone();
        let cache = self.cache.borrow();
        {
            let storage = self.storage.borrow();
            stats.total_nodes = storage.real_size();
            stats.live_nodes = storage.real_size() - storage.dead().len();
        }
        stats.num_vars = self.num_vars();
        stats.cache_hits = cache.hits();
        stats.cache_misses = cache.misses();
        stats.generation = self.generation.get();
        stats
    }

    pub fn set_time_limit(&self, limit: Option<Duration>) {
        self.time_limit.set(limit);
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit.get()
    }

    /// Live-node count at which the next automatic collection runs.
    pub fn gc_threshold(&self) -> usize {
        self.gc_threshold.get()
    }

    pub fn set_gc_threshold(&self, threshold: usize) {
        self.gc_threshold.set(threshold);
    }

    /// Then/else cofactors of `r` with respect to the variable at `level`.
    pub(crate) fn cofactors(&self, r: Ref, level: Level) -> (Ref, Ref) {
        match self.node(r) {
            Node::Decision { variable, high, low } if self.level_of(variable) == level => (high, low),
            _ => (r, r),
        }
    }

    /// Takes a new counted handle on `r`.
    pub(crate) fn own(&self, r: Ref) -> Diagram<'_> {
        self.storage.borrow_mut().inc_ref(r);
        Diagram::from_owned(self, r)
    }

    pub(crate) fn retain(&self, r: Ref) {
        self.storage.borrow_mut().inc_ref(r);
    }

    pub(crate) fn release(&self, r: Ref) {
        match self.storage.try_borrow_mut() {
            Ok(mut storage) => {
                storage.dec_ref(r);
            }
            Err(_) => {
                // Only legitimate while unwinding from a panic that held the store.
                debug!("release({}): node store is borrowed, reference leaked", r);
                debug_assert!(std::thread::panicking(), "{} released while the node store is borrowed", r);
            }
        }
    }
}

// ============================================================================
// Variables
// ============================================================================

impl AddManager {
    /// Creates variables up to and including `v`, each new one placed at the bottom of the order.
    pub fn ensure_var(&self, v: Var) {
        let mut level_map = self.level_map.borrow_mut();
        let mut subtables = self.subtables.borrow_mut();
        while level_map.len() <= v.index() {
            let var = Var::new(level_map.len() as u32);
            level_map.push(Level::new(subtables.len()));
            subtables.push(Subtable::new(var));
        }
    }

    /// Creates a fresh variable at the bottom of the order.
    pub fn new_var(&self) -> Var {
        let v = Var::new(self.level_map.borrow().len() as u32);
        self.ensure_var(v);
        v
    }
}

// ============================================================================
// Node Construction
// ============================================================================

impl AddManager {
    pub fn zero(&self) -> Diagram<'_> {
        self.own(Ref::ZERO)
    }

    pub fn one(&self) -> Diagram<'_> {
        self.own(Ref::ONE)
    }

    /// The canonical terminal holding `value`.
    pub fn constant(&self, value: f64) -> AddResult<Diagram<'_>> {
        self.retry("constant", || self.constant_rec(value))
    }

    /// The projection of `v`: `1.0` where `v` holds, `0.0` elsewhere.
    pub fn var(&self, v: Var) -> AddResult<Diagram<'_>> {
        self.ensure_var(v);
        self.retry("var", || self.mk_node_rec(v, Ref::ONE, Ref::ZERO))
    }

    /// Returns the unique node `if variable { high } else { low }`.
    ///
    /// Identical children collapse to that child. Fails with
    /// [`AddError::OrderViolation`] unless `variable` precedes the top
    /// variables of both children in the current order.
    pub fn mk_node(&self, variable: Var, high: &Diagram<'_>, low: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        debug!("mk_node(v = {}, high = {}, low = {})", variable, high, low);
        self.ensure_var(variable);
        self.retry("mk_node", || self.mk_node_rec(variable, high.node(), low.node()))
    }

    /// Positive cube over `vars`: `1.0` when all of them hold, `0.0` otherwise.
    pub fn cube(&self, vars: impl IntoIterator<Item = Var>) -> AddResult<Diagram<'_>> {
        let mut vars: Vec<Var> = vars.into_iter().collect();
        debug!("cube(vars = {:?})", vars);
        for &v in &vars {
            self.ensure_var(v);
        }
        vars.sort();
        vars.dedup();
        self.retry("cube", || {
            let mut vars = vars.clone();
            vars.sort_by_key(|&v| std::cmp::Reverse(self.level_of(v)));
            let mut res = self.one();
            for v in vars {
                res = self.mk_node_rec(v, res.node(), Ref::ZERO)?;
            }
            Ok(res)
        })
    }

    /// Builds the diagram of `f` over `vars`.
    ///
    /// `f` receives the values of `vars` in the order they are listed. It is
    /// called once per assignment, so this is meant for small supports.
    pub fn tabulate(&self, vars: &[Var], f: impl Fn(&[bool]) -> f64) -> AddResult<Diagram<'_>> {
        for &v in vars {
            self.ensure_var(v);
        }
        self.retry("tabulate", || {
            let mut positions: Vec<usize> = (0..vars.len()).collect();
            positions.sort_by_key(|&i| self.level_of(vars[i]));
            let mut values = vec![false; vars.len()];
            self.tabulate_rec(vars, &positions, 0, &mut values, &f)
        })
    }

    fn tabulate_rec(
        &self,
        vars: &[Var],
        positions: &[usize],
        depth: usize,
        values: &mut [bool],
        f: &impl Fn(&[bool]) -> f64,
    ) -> Step<Diagram<'_>> {
        let Some(&i) = positions.get(depth) else {
            return self.constant_rec(f(values));
        };
        self.checkpoint()?;
        values[i] = true;
        let high = self.tabulate_rec(vars, positions, depth + 1, values, f)?;
        values[i] = false;
        let low = self.tabulate_rec(vars, positions, depth + 1, values, f)?;
        self.mk_node_rec(vars[i], high.node(), low.node())
    }

    pub(crate) fn constant_rec(&self, value: f64) -> Step<Diagram<'_>> {
        let value = canonical_value(value);
        let existing = self.terminals.borrow().find(value);
        if let Some(r) = existing {
            return Ok(self.own(r));
        }
        self.before_alloc()?;
        let r = self.alloc(Node::Terminal(value))?;
        self.terminals.borrow_mut().insert(value, r);
        Ok(self.own(r))
    }

    pub(crate) fn mk_node_rec(&self, variable: Var, high: Ref, low: Ref) -> Step<Diagram<'_>> {
        if high == low {
            return Ok(self.own(high));
        }

        let level = self.level_of(variable);
        if level >= self.level(high) || level >= self.level(low) {
            return Err(AddError::OrderViolation { variable }.into());
        }

        let existing = self.subtables.borrow()[level.index()].find(high, low);
        if let Some(r) = existing {
            return Ok(self.own(r));
        }

        self.before_alloc()?;
        let r = self.alloc(Node::Decision { variable, high, low })?;
        self.subtables.borrow_mut()[level.index()].insert(high, low, r);
        {
            let mut storage = self.storage.borrow_mut();
            storage.inc_ref(high);
            storage.inc_ref(low);
        }
        Ok(self.own(r))
    }

    fn alloc(&self, node: Node) -> Result<Ref, AddError> {
        let mut storage = self.storage.borrow_mut();
        match storage.alloc(node) {
            Some(r) => {
                let mut stats = self.stats.borrow_mut();
                stats.peak_nodes = stats.peak_nodes.max(storage.real_size());
                Ok(r)
            }
            None => Err(AddError::AllocationFailure {
                live: storage.real_size(),
                capacity: storage.capacity(),
            }),
        }
    }

    /// Runs an automatic sweep when the store is full or over the GC threshold.
    ///
    /// If the sweep is followed by a reordering, returns the restart signal.
    fn before_alloc(&self) -> Step<()> {
        let (live, full) = {
            let storage = self.storage.borrow();
            (storage.real_size(), storage.headroom() == 0)
        };
        let over_threshold = self.config.auto_gc && live >= self.gc_threshold.get();
        if !full && !over_threshold {
            return Ok(());
        }

        self.collect_garbage();

        let live = self.num_nodes();
        if live * 4 > self.gc_threshold.get() * 3 {
            let threshold = self.gc_threshold.get().saturating_mul(2);
            debug!("raising GC threshold to {}", threshold);
            self.gc_threshold.set(threshold);
        }

        if self.config.auto_gc && self.consult_reorder_policy()? {
            return Err(Interrupt::Reordered);
        }
        Ok(())
    }
}

// ============================================================================
// Garbage Collection
// ============================================================================

impl AddManager {
    /// Reclaims every dead node and clears the operation cache.
    ///
    /// Returns the number of reclaimed nodes. Nodes reachable from a live
    /// [`Diagram`] are never touched.
    pub fn collect_garbage(&self) -> usize {
        let mut storage = self.storage.borrow_mut();
        let mut subtables = self.subtables.borrow_mut();
        let mut terminals = self.terminals.borrow_mut();
        let level_map = self.level_map.borrow();

        let mut stack = storage.dead();
        let mut reclaimed = 0;
        while let Some(r) = stack.pop() {
            match storage.node(r) {
                Node::Terminal(value) => {
                    terminals.remove(value);
                }
                Node::Decision { variable, high, low } => {
                    subtables[level_map[variable.index()].index()].remove(high, low);
                    for child in [high, low] {
                        if storage.dec_ref(child) == 0 {
                            stack.push(child);
                        }
                    }
                }
            }
            storage.free(r);
            reclaimed += 1;
        }

        self.cache.borrow_mut().clear();

        let mut stats = self.stats.borrow_mut();
        stats.gc_runs += 1;
        stats.reclaimed_nodes += reclaimed;
        debug!("collect_garbage: reclaimed {} nodes, {} remain", reclaimed, storage.real_size());
        reclaimed
    }

    /// Drops every memoized result.
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }
}

// ============================================================================
// Operation Protocol
// ============================================================================

impl AddManager {
    /// Runs `attempt` until it completes under a stable variable order.
    ///
    /// An attempt that reports a restart, or that finishes after the order
    /// changed, is discarded and started over. Genuine failures are returned
    /// at once. The time limit (if any) covers all attempts together.
    pub(crate) fn retry<T>(&self, name: &str, mut attempt: impl FnMut() -> Step<T>) -> AddResult<T> {
        let saved_deadline = self.deadline.get();
        let saved_generation = self.attempt_generation.get();
        if saved_deadline.is_none() {
            self.deadline.set(self.time_limit.get().map(|limit| Instant::now() + limit));
        }

        let mut attempts = 0;
        let result = loop {
            attempts += 1;
            let generation = self.generation.get();
            self.attempt_generation.set(generation);
            match attempt() {
                Ok(value) if self.generation.get() == generation => break Ok(value),
                Ok(_) | Err(Interrupt::Reordered) => {
                    debug!("{}: variable order changed, restarting (attempt {})", name, attempts);
                    self.stats.borrow_mut().restarts += 1;
                    if attempts > self.config.max_restarts {
                        break Err(AddError::RetryLimitExceeded { attempts });
                    }
                }
                Err(Interrupt::Failed(error)) => {
                    debug!("{}: {}", name, error);
                    break Err(error);
                }
            }
        };

        self.deadline.set(saved_deadline);
        self.attempt_generation.set(saved_generation);
        result
    }

    /// Cooperative poll made at every recursion step.
    pub(crate) fn checkpoint(&self) -> Step<()> {
        if self.generation.get() != self.attempt_generation.get() {
            return Err(Interrupt::Reordered);
        }
        if let Some(deadline) = self.deadline.get() {
            if Instant::now() >= deadline {
                let limit = self.time_limit.get().unwrap_or_default();
                return Err(AddError::Timeout { limit }.into());
            }
        }
        Ok(())
    }

    pub(crate) fn cache_get(&self, key: &OpKey) -> Option<Diagram<'_>> {
        let hit = self.cache.borrow_mut().get(key);
        hit.map(|r| self.own(r))
    }

    pub(crate) fn cache_put(&self, key: OpKey, result: &Diagram<'_>) {
        self.cache.borrow_mut().insert(key, result.node());
    }
}
