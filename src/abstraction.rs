//! Abstraction of variables out of an ADD.
//!
//! Abstracting a set of variables (given as a positive cube) aggregates the
//! function's values over every setting of those variables. All six
//! operators share one cofactor recursion; they differ only in the binary
//! operator that merges the two cofactors, in how a cube variable that `f`
//! does not depend on is folded, and in their terminal shortcuts:
//!
//! | Operator     | Merge            | Unseen variable | Returns `f` when `f` is |
//! |--------------|------------------|-----------------|-------------------------|
//! | `Exist`      | `+`              | `x + x`         | `0`                     |
//! | `Univ`       | `×`              | `x × x`         | `0` or `1`              |
//! | `Or`         | or (absorbs `1`) | `x`             | a terminal              |
//! | `Min`        | `min`            | `x`             | `0`                     |
//! | `MinExcept0` | `min`, `0` = `+∞`| `x`             | `0`                     |
//! | `Max`        | `max`            | `x`             | `0`                     |
//!
//! # Example
//!
//! ```
//! use add_rs::manager::AddManager;
//! use add_rs::types::Var;
//!
//! let mgr = AddManager::default();
//! let (x1, x2) = (Var::new(1), Var::new(2));
//! let f = mgr
//!     .tabulate(&[x1, x2], |a| match (a[0], a[1]) {
//!         (false, false) => 3.0,
//!         (false, true) => 5.0,
//!         _ => 2.0,
//!     })
//!     .unwrap();
//! let cube = mgr.cube([x1]).unwrap();
//!
//! let sum = mgr.exist_abstract(&f, &cube).unwrap();
//! assert_eq!(mgr.eval(&sum, |_| false), 5.0);
//! assert_eq!(mgr.eval(&sum, |v| v == x2), 7.0);
//! ```

use std::fmt;

use log::debug;

use crate::apply::BinaryOp;
use crate::cache::OpKey;
use crate::diagram::Diagram;
use crate::error::{AddError, AddResult, Step};
use crate::manager::AddManager;
use crate::node::Node;
use crate::reference::Ref;

/// One of the abstraction operators.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Abstraction {
    /// Sum over the abstracted variables.
    Exist,
    /// Product over the abstracted variables.
    Univ,
    /// Disjunction; meant for 0/1 diagrams.
    Or,
    Min,
    /// Minimum of the non-zero values, or `0` if all of them are zero.
    MinExcept0,
    Max,
}

impl Abstraction {
    pub const ALL: [Abstraction; 6] = [
        Abstraction::Exist,
        Abstraction::Univ,
        Abstraction::Or,
        Abstraction::Min,
        Abstraction::MinExcept0,
        Abstraction::Max,
    ];

    /// Operator merging the two cofactors of an abstracted variable.
    pub fn combine(self) -> BinaryOp {
        match self {
            Abstraction::Exist => BinaryOp::Plus,
            Abstraction::Univ => BinaryOp::Times,
            Abstraction::Or => BinaryOp::Or,
            Abstraction::Min => BinaryOp::Min,
            Abstraction::MinExcept0 => BinaryOp::MinExcept0,
            Abstraction::Max => BinaryOp::Max,
        }
    }

    /// How to account for a cube variable `f` does not depend on:
    /// `Some(op)` means `r op r`, `None` means `r` itself.
    pub fn fold(self) -> Option<BinaryOp> {
        match self {
            Abstraction::Exist => Some(BinaryOp::Plus),
            Abstraction::Univ => Some(BinaryOp::Times),
            _ => None,
        }
    }

    /// Value that, once reached by the then-cofactor, decides the merge.
    pub fn absorbing(self) -> Option<Ref> {
        match self {
            Abstraction::Or => Some(Ref::ONE),
            _ => None,
        }
    }

    /// Operands that abstraction leaves unchanged.
    fn is_fixed_point(self, f: Ref, node: &Node) -> bool {
        match self {
            Abstraction::Univ => f == Ref::ZERO || f == Ref::ONE,
            Abstraction::Or => node.is_terminal(),
            _ => f == Ref::ZERO,
        }
    }

    /// Neutral element of the merge, if it has one among the reals.
    pub fn identity(self) -> Option<f64> {
        match self {
            Abstraction::Exist | Abstraction::Or | Abstraction::MinExcept0 => Some(0.0),
            Abstraction::Univ => Some(1.0),
            Abstraction::Min | Abstraction::Max => None,
        }
    }

    /// Aggregates a slice of values the way this operator does.
    ///
    /// An empty slice gives the [identity][Self::identity].
    pub fn aggregate(self, values: &[f64]) -> Option<f64> {
        let op = self.combine();
        values.iter().copied().reduce(|acc, v| op.eval(acc, v)).or_else(|| self.identity())
    }
}

impl fmt::Display for Abstraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Abstraction::Exist => "exist",
            Abstraction::Univ => "univ",
            Abstraction::Or => "or",
            Abstraction::Min => "min",
            Abstraction::MinExcept0 => "min_except0",
            Abstraction::Max => "max",
        };
        write!(f, "{}", name)
    }
}

impl AddManager {
    /// Sums `f` over all settings of the variables in `cube`.
    pub fn exist_abstract(&self, f: &Diagram<'_>, cube: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.abstract_with(Abstraction::Exist, f, cube)
    }

    /// Multiplies `f` over all settings of the variables in `cube`.
    pub fn univ_abstract(&self, f: &Diagram<'_>, cube: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.abstract_with(Abstraction::Univ, f, cube)
    }

    /// Disjunction of the 0/1 diagram `f` over all settings of the variables in `cube`.
    pub fn or_abstract(&self, f: &Diagram<'_>, cube: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.abstract_with(Abstraction::Or, f, cube)
    }

    pub fn min_abstract(&self, f: &Diagram<'_>, cube: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.abstract_with(Abstraction::Min, f, cube)
    }

    /// Like [`min_abstract`][Self::min_abstract], but zeros only win when every value is zero.
    pub fn min_except0_abstract(&self, f: &Diagram<'_>, cube: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.abstract_with(Abstraction::MinExcept0, f, cube)
    }

    pub fn max_abstract(&self, f: &Diagram<'_>, cube: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.abstract_with(Abstraction::Max, f, cube)
    }

    /// Abstracts the variables of `cube` out of `f` with the given operator.
    ///
    /// Fails with [`AddError::InvalidCube`] if `cube` is not a positive cube.
    pub fn abstract_with(&self, op: Abstraction, f: &Diagram<'_>, cube: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        debug!("{}_abstract(f = {}, cube = {})", op, f, cube);
        self.check_cube(cube.node())?;
        self.retry(&format!("{}_abstract", op), || self.abstract_rec(op, f.node(), cube.node()))
    }

    /// Whether `cube` is a conjunction of positive literals (`one` counts as the empty cube).
    pub fn is_cube(&self, cube: &Diagram<'_>) -> bool {
        self.is_cube_raw(cube.node())
    }

    pub(crate) fn check_cube(&self, cube: Ref) -> AddResult<()> {
        if self.is_cube_raw(cube) {
            Ok(())
        } else {
            Err(AddError::InvalidCube(cube))
        }
    }

    fn is_cube_raw(&self, mut r: Ref) -> bool {
        loop {
            match self.node(r) {
                Node::Terminal(_) => return r == Ref::ONE,
                Node::Decision { high, low, .. } => {
                    if low != Ref::ZERO {
                        return false;
                    }
                    r = high;
                }
            }
        }
    }

    pub(crate) fn abstract_rec(&self, op: Abstraction, f: Ref, cube: Ref) -> Step<Diagram<'_>> {
        let node = self.node(f);
        if cube == Ref::ONE || op.is_fixed_point(f, &node) {
            return Ok(self.own(f));
        }

        let f_level = self.level(f);
        let cube_level = self.level(cube);
        let (cube_rest, _) = self.cofactors(cube, cube_level);

        if f_level > cube_level {
            // The cube variable does not occur in f: both cofactors are f.
            let res = self.abstract_rec(op, f, cube_rest)?;
            return match op.fold() {
                Some(fold) => self.apply_rec(fold, res.node(), res.node()),
                None => Ok(res),
            };
        }

        let key = OpKey::Abstract(op, f, cube);
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }
        self.checkpoint()?;

        let (f1, f0) = self.cofactors(f, f_level);
        let res = if f_level == cube_level {
            let high = self.abstract_rec(op, f1, cube_rest)?;
            if op.absorbing() == Some(high.node()) {
                high
            } else {
                let low = self.abstract_rec(op, f0, cube_rest)?;
                self.apply_rec(op.combine(), high.node(), low.node())?
            }
        } else {
            let high = self.abstract_rec(op, f1, cube)?;
            let low = self.abstract_rec(op, f0, cube)?;
            self.mk_node_rec(self.var_at(f_level), high.node(), low.node())?
        };

        self.cache_put(key, &res);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Var;

    use test_log::test;

    /// f(x1, x2) with f(0,0) = 3, f(0,1) = 5, f(1,0) = 2, f(1,1) = 2.
    fn sample(mgr: &AddManager) -> Diagram<'_> {
        mgr.tabulate(&[Var::new(1), Var::new(2)], |a| match (a[0], a[1]) {
            (false, false) => 3.0,
            (false, true) => 5.0,
            _ => 2.0,
        })
        .unwrap()
    }

    fn on_x2(mgr: &AddManager, g: &Diagram<'_>) -> (f64, f64) {
        let x2 = Var::new(2);
        (mgr.eval(g, |_| false), mgr.eval(g, |v| v == x2))
    }

    #[test]
    fn test_sample_abstractions_over_x1() {
        let mgr = AddManager::default();
        let f = sample(&mgr);
        let cube = mgr.cube([Var::new(1)]).unwrap();

        let exist = mgr.exist_abstract(&f, &cube).unwrap();
        assert_eq!(on_x2(&mgr, &exist), (5.0, 7.0));
        let univ = mgr.univ_abstract(&f, &cube).unwrap();
        assert_eq!(on_x2(&mgr, &univ), (6.0, 10.0));
        let max = mgr.max_abstract(&f, &cube).unwrap();
        assert_eq!(on_x2(&mgr, &max), (3.0, 5.0));
        let min = mgr.min_abstract(&f, &cube).unwrap();
        assert_eq!(on_x2(&mgr, &min), (2.0, 2.0));
        assert!(min.is_terminal());
    }

    #[test]
    fn test_sample_abstractions_over_x2() {
        let mgr = AddManager::default();
        let f = sample(&mgr);
        let cube = mgr.cube([Var::new(2)]).unwrap();
        let x1 = Var::new(1);
        let at = |g: &Diagram| (mgr.eval(g, |_| false), mgr.eval(g, |v| v == x1));

        assert_eq!(at(&mgr.exist_abstract(&f, &cube).unwrap()), (8.0, 4.0));
        assert_eq!(at(&mgr.univ_abstract(&f, &cube).unwrap()), (15.0, 4.0));
        assert_eq!(at(&mgr.max_abstract(&f, &cube).unwrap()), (5.0, 2.0));
        assert_eq!(at(&mgr.min_abstract(&f, &cube).unwrap()), (3.0, 2.0));
    }

    #[test]
    fn test_empty_cube_is_identity() {
        let mgr = AddManager::default();
        let f = sample(&mgr);
        let one = mgr.one();
        for op in Abstraction::ALL {
            assert_eq!(mgr.abstract_with(op, &f, &one).unwrap(), f, "{}", op);
        }
    }

    #[test]
    fn test_constant_operands() {
        let mgr = AddManager::default();
        let three = mgr.constant(3.0).unwrap();
        let cube = mgr.cube([Var::new(1), Var::new(2)]).unwrap();

        assert_eq!(mgr.exist_abstract(&three, &cube).unwrap().value(), Some(12.0));
        assert_eq!(mgr.univ_abstract(&three, &cube).unwrap().value(), Some(81.0));
        assert_eq!(mgr.min_abstract(&three, &cube).unwrap(), three);
        assert_eq!(mgr.max_abstract(&three, &cube).unwrap(), three);

        let zero = mgr.zero();
        for op in Abstraction::ALL {
            assert!(mgr.abstract_with(op, &zero, &cube).unwrap().is_zero(), "{}", op);
        }
        let one = mgr.one();
        assert!(mgr.univ_abstract(&one, &cube).unwrap().is_one());
        assert!(mgr.or_abstract(&one, &cube).unwrap().is_one());
    }

    #[test]
    fn test_or_abstract() {
        let mgr = AddManager::default();
        let (x1, x2) = (Var::new(1), Var::new(2));
        let f = mgr.tabulate(&[x1, x2], |a| if a[0] && !a[1] { 1.0 } else { 0.0 }).unwrap();
        let g = mgr.or_abstract(&f, &mgr.cube([x1]).unwrap()).unwrap();
        assert_eq!(g, mgr.not(&mgr.var(x2).unwrap()).unwrap());
        let h = mgr.or_abstract(&f, &mgr.cube([x1, x2]).unwrap()).unwrap();
        assert!(h.is_one());
    }

    #[test]
    fn test_min_except0_ignores_zeros() {
        let mgr = AddManager::default();
        let (x1, x2) = (Var::new(1), Var::new(2));
        let f = mgr
            .tabulate(&[x1, x2], |a| match (a[0], a[1]) {
                (false, false) => 0.0,
                (true, false) => 4.0,
                (false, true) => 0.0,
                (true, true) => 0.0,
            })
            .unwrap();
        let cube = mgr.cube([x1]).unwrap();
        let g = mgr.min_except0_abstract(&f, &cube).unwrap();
        assert_eq!(mgr.eval(&g, |_| false), 4.0);
        assert_eq!(mgr.eval(&g, |v| v == x2), 0.0);

        let plain = mgr.min_abstract(&f, &cube).unwrap();
        assert!(plain.is_zero());
    }

    #[test]
    fn test_invalid_cubes_are_rejected() {
        let mgr = AddManager::default();
        let f = sample(&mgr);
        let (x1, x2) = (Var::new(1), Var::new(2));

        let two = mgr.constant(2.0).unwrap();
        assert_eq!(mgr.exist_abstract(&f, &two), Err(AddError::InvalidCube(two.node())));
        let zero = mgr.zero();
        assert_eq!(mgr.max_abstract(&f, &zero), Err(AddError::InvalidCube(Ref::ZERO)));

        let negative = mgr.not(&mgr.var(x1).unwrap()).unwrap();
        assert!(!mgr.is_cube(&negative));
        assert!(mgr.min_abstract(&f, &negative).is_err());

        let disjunction = mgr.or(&mgr.var(x1).unwrap(), &mgr.var(x2).unwrap()).unwrap();
        assert!(mgr.univ_abstract(&f, &disjunction).is_err());

        let scaled = mgr.times(&mgr.cube([x1]).unwrap(), &two).unwrap();
        assert!(mgr.or_abstract(&f, &scaled).is_err());
    }

    #[test]
    fn test_abstracting_unused_variable() {
        let mgr = AddManager::default();
        let (x1, x3) = (Var::new(1), Var::new(3));
        let f = mgr.tabulate(&[x1], |a| if a[0] { 2.0 } else { 1.0 }).unwrap();
        let cube = mgr.cube([x3]).unwrap();

        let doubled = mgr.plus(&f, &f).unwrap();
        assert_eq!(mgr.exist_abstract(&f, &cube).unwrap(), doubled);
        let squared = mgr.times(&f, &f).unwrap();
        assert_eq!(mgr.univ_abstract(&f, &cube).unwrap(), squared);
        assert_eq!(mgr.max_abstract(&f, &cube).unwrap(), f);
    }

    #[test]
    fn test_aggregate() {
        assert_eq!(Abstraction::Exist.aggregate(&[1.0, 2.0, 3.0]), Some(6.0));
        assert_eq!(Abstraction::Univ.aggregate(&[2.0, 3.0]), Some(6.0));
        assert_eq!(Abstraction::MinExcept0.aggregate(&[0.0, 3.0, 2.0]), Some(2.0));
        assert_eq!(Abstraction::MinExcept0.aggregate(&[0.0, 0.0]), Some(0.0));
        assert_eq!(Abstraction::Or.aggregate(&[0.0, 1.0]), Some(1.0));
    }

    #[test]
    fn test_aggregate_of_nothing() {
        assert_eq!(Abstraction::Exist.aggregate(&[]), Some(0.0));
        assert_eq!(Abstraction::Univ.aggregate(&[]), Some(1.0));
        assert_eq!(Abstraction::Or.aggregate(&[]), Some(0.0));
        assert_eq!(Abstraction::MinExcept0.aggregate(&[]), Some(0.0));
        assert_eq!(Abstraction::Min.aggregate(&[]), None);
        assert_eq!(Abstraction::Max.aggregate(&[]), None);

        // The identity never changes a non-empty aggregate.
        for op in Abstraction::ALL {
            let x = if op == Abstraction::Or { 1.0 } else { 3.0 };
            if let Some(e) = op.identity() {
                assert_eq!(op.aggregate(&[e, x]), op.aggregate(&[x]), "{}", op);
            }
        }
    }
}
