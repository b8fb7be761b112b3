use crate::reference::Ref;
use crate::types::Var;

/// A node of an algebraic decision diagram.
///
/// Decision nodes read as `if variable { high } else { low }`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Node {
    Terminal(f64),
    Decision { variable: Var, high: Ref, low: Ref },
}

impl Node {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Terminal(_))
    }

    /// Terminal value, or `None` for decision nodes.
    pub fn value(&self) -> Option<f64> {
        match *self {
            Node::Terminal(value) => Some(value),
            Node::Decision { .. } => None,
        }
    }

    pub fn variable(&self) -> Option<Var> {
        match *self {
            Node::Terminal(_) => None,
            Node::Decision { variable, .. } => Some(variable),
        }
    }

    /// Children as `(high, low)`, or `None` for terminals.
    pub fn children(&self) -> Option<(Ref, Ref)> {
        match *self {
            Node::Terminal(_) => None,
            Node::Decision { high, low, .. } => Some((high, low)),
        }
    }
}

/// Canonical form of a terminal value: `-0.0` folds into `0.0` and every NaN
/// into the standard NaN, so equal values share a bit pattern.
pub fn canonical_value(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else if value.is_nan() {
        f64::NAN
    } else {
        value
    }
}

/// Hash key of a terminal value.
pub(crate) fn value_key(value: f64) -> u64 {
    canonical_value(value).to_bits()
}
