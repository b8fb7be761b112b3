//! Pointwise operators on ADDs.
//!
//! [`AddManager::apply`] combines two diagrams value by value with a
//! [`BinaryOp`], recursing on the top variable of either operand and memoizing
//! every step. Besides the arithmetic operators there are relational ones
//! (producing `0.0`/`1.0`), a three-way [`ite`][AddManager::ite] on a 0/1 guard,
//! and the 0/1 complement [`not`][AddManager::not].

use std::cmp::min;
use std::fmt;

use log::debug;

use crate::cache::OpKey;
use crate::diagram::Diagram;
use crate::error::{AddResult, Step};
use crate::manager::AddManager;
use crate::reference::Ref;

/// Comparison used by [`BinaryOp::Compare`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Relation {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Relation {
    pub fn holds(self, a: f64, b: f64) -> bool {
        match self {
            Relation::Lt => a < b,
            Relation::Le => a <= b,
            Relation::Gt => a > b,
            Relation::Ge => a >= b,
            Relation::Eq => a == b,
            Relation::Ne => a != b,
        }
    }

    /// Whether `x R x` holds.
    fn is_reflexive(self) -> bool {
        matches!(self, Relation::Le | Relation::Ge | Relation::Eq)
    }
}

/// Operator applied terminal-wise by [`AddManager::apply`].
///
/// `Or` and `And` are meant for 0/1 diagrams; their shortcuts assume it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
    Min,
    Max,
    /// Minimum where `0` counts as `+∞`, unless both operands are `0`.
    MinExcept0,
    Or,
    And,
    Compare(Relation),
}

impl BinaryOp {
    pub fn eval(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Plus => a + b,
            BinaryOp::Minus => a - b,
            BinaryOp::Times => a * b,
            BinaryOp::Min => a.min(b),
            BinaryOp::Max => a.max(b),
            BinaryOp::MinExcept0 => {
                if a == 0.0 {
                    b
                } else if b == 0.0 {
                    a
                } else {
                    a.min(b)
                }
            }
            BinaryOp::Or => bool_value(a != 0.0 || b != 0.0),
            BinaryOp::And => bool_value(a != 0.0 && b != 0.0),
            BinaryOp::Compare(relation) => bool_value(relation.holds(a, b)),
        }
    }

    pub fn is_commutative(self) -> bool {
        match self {
            BinaryOp::Minus => false,
            BinaryOp::Compare(relation) => matches!(relation, Relation::Eq | Relation::Ne),
            _ => true,
        }
    }

    /// Result determined by the operand identities alone.
    fn shortcut(self, f: Ref, g: Ref) -> Option<Ref> {
        match self {
            BinaryOp::Plus if f == Ref::ZERO => Some(g),
            BinaryOp::Plus | BinaryOp::Minus if g == Ref::ZERO => Some(f),
            BinaryOp::Times if f == Ref::ZERO || g == Ref::ZERO => Some(Ref::ZERO),
            BinaryOp::Times if f == Ref::ONE => Some(g),
            BinaryOp::Times if g == Ref::ONE => Some(f),
            BinaryOp::MinExcept0 if f == Ref::ZERO => Some(g),
            BinaryOp::MinExcept0 if g == Ref::ZERO => Some(f),
            BinaryOp::Or if f == Ref::ONE || g == Ref::ONE => Some(Ref::ONE),
            BinaryOp::Or if f == Ref::ZERO => Some(g),
            BinaryOp::Or if g == Ref::ZERO => Some(f),
            BinaryOp::And if f == Ref::ZERO || g == Ref::ZERO => Some(Ref::ZERO),
            BinaryOp::And if f == Ref::ONE => Some(g),
            BinaryOp::And if g == Ref::ONE => Some(f),
            BinaryOp::Min | BinaryOp::Max | BinaryOp::MinExcept0 | BinaryOp::Or | BinaryOp::And if f == g => Some(f),
            BinaryOp::Compare(relation) if f == g => Some(if relation.is_reflexive() { Ref::ONE } else { Ref::ZERO }),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Plus => write!(f, "+"),
            BinaryOp::Minus => write!(f, "-"),
            BinaryOp::Times => write!(f, "*"),
            BinaryOp::Min => write!(f, "min"),
            BinaryOp::Max => write!(f, "max"),
            BinaryOp::MinExcept0 => write!(f, "min0"),
            BinaryOp::Or => write!(f, "or"),
            BinaryOp::And => write!(f, "and"),
            BinaryOp::Compare(relation) => write!(f, "{:?}", relation),
        }
    }
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl AddManager {
    pub fn apply(&self, op: BinaryOp, f: &Diagram<'_>, g: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        debug!("apply(op = {}, f = {}, g = {})", op, f, g);
        self.retry("apply", || self.apply_rec(op, f.node(), g.node()))
    }

    pub fn plus(&self, f: &Diagram<'_>, g: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.apply(BinaryOp::Plus, f, g)
    }

    pub fn minus(&self, f: &Diagram<'_>, g: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.apply(BinaryOp::Minus, f, g)
    }

    pub fn times(&self, f: &Diagram<'_>, g: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.apply(BinaryOp::Times, f, g)
    }

    pub fn minimum(&self, f: &Diagram<'_>, g: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.apply(BinaryOp::Min, f, g)
    }

    pub fn maximum(&self, f: &Diagram<'_>, g: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.apply(BinaryOp::Max, f, g)
    }

    pub fn or(&self, f: &Diagram<'_>, g: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.apply(BinaryOp::Or, f, g)
    }

    pub fn and(&self, f: &Diagram<'_>, g: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.apply(BinaryOp::And, f, g)
    }

    /// The 0/1 diagram of `f R g`.
    pub fn compare(&self, f: &Diagram<'_>, g: &Diagram<'_>, relation: Relation) -> AddResult<Diagram<'_>> {
        self.apply(BinaryOp::Compare(relation), f, g)
    }

    /// `1` where `f` is zero, `0` elsewhere.
    pub fn not(&self, f: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        debug!("not(f = {})", f);
        self.retry("not", || self.not_rec(f.node()))
    }

    /// `then_` where `guard` is non-zero, `else_` elsewhere.
    pub fn ite(&self, guard: &Diagram<'_>, then_: &Diagram<'_>, else_: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        debug!("ite(g = {}, t = {}, e = {})", guard, then_, else_);
        self.retry("ite", || self.ite_rec(guard.node(), then_.node(), else_.node()))
    }

    pub(crate) fn apply_rec(&self, op: BinaryOp, f: Ref, g: Ref) -> Step<Diagram<'_>> {
        if let Some(res) = op.shortcut(f, g) {
            return Ok(self.own(res));
        }
        if let (Some(a), Some(b)) = (self.value(f), self.value(g)) {
            return self.constant_rec(op.eval(a, b));
        }

        let key = OpKey::apply(op, f, g);
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }
        self.checkpoint()?;

        let level = min(self.level(f), self.level(g));
        let variable = self.var_at(level);
        let (f1, f0) = self.cofactors(f, level);
        let (g1, g0) = self.cofactors(g, level);

        let high = self.apply_rec(op, f1, g1)?;
        let low = self.apply_rec(op, f0, g0)?;
        let res = self.mk_node_rec(variable, high.node(), low.node())?;

        self.cache_put(key, &res);
        Ok(res)
    }

    pub(crate) fn not_rec(&self, f: Ref) -> Step<Diagram<'_>> {
        if let Some(value) = self.value(f) {
            return Ok(self.own(if value == 0.0 { Ref::ONE } else { Ref::ZERO }));
        }

        let key = OpKey::Not(f);
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }
        self.checkpoint()?;

        let level = self.level(f);
        let (f1, f0) = self.cofactors(f, level);
        let high = self.not_rec(f1)?;
        let low = self.not_rec(f0)?;
        let res = self.mk_node_rec(self.var_at(level), high.node(), low.node())?;

        self.cache_put(key, &res);
        Ok(res)
    }

    pub(crate) fn ite_rec(&self, g: Ref, t: Ref, e: Ref) -> Step<Diagram<'_>> {
        if t == e {
            return Ok(self.own(t));
        }
        if let Some(value) = self.value(g) {
            return Ok(self.own(if value != 0.0 { t } else { e }));
        }
        if t == Ref::ONE && e == Ref::ZERO {
            return Ok(self.own(g));
        }

        let key = OpKey::Ite(g, t, e);
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }
        self.checkpoint()?;

        let level = min(self.level(g), min(self.level(t), self.level(e)));
        let (g1, g0) = self.cofactors(g, level);
        let (t1, t0) = self.cofactors(t, level);
        let (e1, e0) = self.cofactors(e, level);

        let high = self.ite_rec(g1, t1, e1)?;
        let low = self.ite_rec(g0, t0, e0)?;
        let res = self.mk_node_rec(self.var_at(level), high.node(), low.node())?;

        self.cache_put(key, &res);
        Ok(res)
    }
}
