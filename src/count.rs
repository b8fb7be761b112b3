//! Structural queries: evaluation, size, support and minterm counting.

use std::collections::{HashMap, HashSet};

use num_bigint::BigUint;

use crate::diagram::Diagram;
use crate::manager::AddManager;
use crate::node::Node;
use crate::reference::Ref;
use crate::types::Var;

impl AddManager {
    /// Value of `f` under `assignment`.
    pub fn eval(&self, f: &Diagram<'_>, assignment: impl Fn(Var) -> bool) -> f64 {
        let mut r = f.node();
        loop {
            match self.node(r) {
                Node::Terminal(value) => return value,
                Node::Decision { variable, high, low } => {
                    r = if assignment(variable) { high } else { low };
                }
            }
        }
    }

    /// Number of distinct nodes reachable from `f`, terminals included.
    pub fn size(&self, f: &Diagram<'_>) -> usize {
        self.descendants([f.node()]).len()
    }

    /// Variables `f` depends on, from the top level down.
    pub fn support(&self, f: &Diagram<'_>) -> Vec<Var> {
        let vars: HashSet<Var> = self
            .descendants([f.node()])
            .into_iter()
            .filter_map(|r| self.variable(r))
            .collect();
        let mut result: Vec<Var> = vars.into_iter().collect();
        result.sort_unstable_by_key(|&v| self.level_of(v));
        result
    }

    /// Distinct terminal values reachable from `f`, in increasing order.
    pub fn leaves(&self, f: &Diagram<'_>) -> Vec<f64> {
        let mut values: Vec<f64> = self
            .descendants([f.node()])
            .into_iter()
            .filter_map(|r| self.value(r))
            .collect();
        values.sort_by(f64::total_cmp);
        values
    }

    /// Number of assignments to `num_vars` variables on which `f` is non-zero.
    ///
    /// `num_vars` must be at least the number of variables `f` depends on.
    pub fn minterm_count(&self, f: &Diagram<'_>, num_vars: usize) -> BigUint {
        let max = BigUint::from(1u8) << num_vars;
        let mut cache = HashMap::new();
        self.minterm_count_rec(f.node(), &max, &mut cache)
    }

    fn minterm_count_rec(&self, r: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        let (high, low) = match self.node(r) {
            Node::Terminal(value) => {
                return if value == 0.0 { BigUint::ZERO } else { max.clone() };
            }
            Node::Decision { high, low, .. } => (high, low),
        };

        if let Some(count) = cache.get(&r) {
            return count.clone();
        }

        let count_high = self.minterm_count_rec(high, max, cache);
        let count_low = self.minterm_count_rec(low, max, cache);
        let count: BigUint = (count_high + count_low) >> 1;

        cache.insert(r, count.clone());
        count
    }

    /// All nodes reachable from `roots`.
    pub(crate) fn descendants(&self, roots: impl IntoIterator<Item = Ref>) -> Vec<Ref> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<Ref> = roots.into_iter().collect();

        while let Some(r) = stack.pop() {
            if !visited.insert(r) {
                continue;
            }
            order.push(r);
            if let Some((high, low)) = self.node(r).children() {
                stack.push(low);
                stack.push(high);
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_size_and_support() {
        let mgr = AddManager::default();
        let (x1, x2, x3) = (Var::new(1), Var::new(2), Var::new(3));
        let f = mgr.tabulate(&[x1, x3], |a| if a[0] { 2.0 } else if a[1] { 1.0 } else { 0.0 }).unwrap();
        mgr.ensure_var(x2);

        assert_eq!(mgr.support(&f), vec![x1, x3]);
        // x1, x3 and the terminals 0, 1, 2.
        assert_eq!(mgr.size(&f), 5);
        assert_eq!(mgr.leaves(&f), vec![0.0, 1.0, 2.0]);
        assert_eq!(mgr.size(&mgr.one()), 1);
        assert!(mgr.support(&mgr.one()).is_empty());
    }

    #[test]
    fn test_minterm_count() {
        let mgr = AddManager::default();
        let vars: Vec<Var> = (1..=3).map(Var::new).collect();
        let f = mgr.tabulate(&vars, |a| a.iter().filter(|&&b| b).count() as f64 - 1.0).unwrap();
        // Non-zero everywhere except on the three assignments with exactly one bit set.
        assert_eq!(mgr.minterm_count(&f, 3), BigUint::from(5u32));
        assert_eq!(mgr.minterm_count(&f, 5), BigUint::from(20u32));
        assert_eq!(mgr.minterm_count(&mgr.zero(), 3), BigUint::ZERO);
        assert_eq!(mgr.minterm_count(&mgr.constant(0.5).unwrap(), 2), BigUint::from(4u32));
    }

    #[test]
    fn test_eval() {
        let mgr = AddManager::default();
        let (x1, x2) = (Var::new(1), Var::new(2));
        let f = mgr.tabulate(&[x1, x2], |a| if a[0] { 1.5 } else if a[1] { -2.0 } else { 0.0 }).unwrap();
        assert_eq!(mgr.eval(&f, |_| true), 1.5);
        assert_eq!(mgr.eval(&f, |v| v == x2), -2.0);
        assert_eq!(mgr.eval(&f, |_| false), 0.0);
    }
}
