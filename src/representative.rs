//! Extraction of extremal witnesses.
//!
//! For a function `f` and a cube over variables `C`, the min (max)
//! representative is a 0/1 diagram `w` such that for every assignment `r` of
//! the other variables exactly one assignment `c` of `C` has `w(r, c) = 1`,
//! and `f(r, c)` is the minimum (maximum) of `f(r, ·)`. On ties the witness
//! sets the earliest differing cube variable to false.
//!
//! Cube variables are always fixed in the result: where `f` does not depend
//! on one, it is set to false.

use std::fmt;

use log::debug;

use crate::abstraction::Abstraction;
use crate::apply::{BinaryOp, Relation};
use crate::cache::OpKey;
use crate::diagram::Diagram;
use crate::error::{AddResult, Step};
use crate::manager::AddManager;
use crate::reference::Ref;

/// Which extremum a representative realizes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Extremum {
    Min,
    Max,
}

impl Extremum {
    fn abstraction(self) -> Abstraction {
        match self {
            Extremum::Min => Abstraction::Min,
            Extremum::Max => Abstraction::Max,
        }
    }

    /// Holds when the else-branch aggregate is at least as good as the then-branch one.
    fn prefers_else(self) -> Relation {
        match self {
            Extremum::Min => Relation::Le,
            Extremum::Max => Relation::Ge,
        }
    }
}

impl fmt::Display for Extremum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extremum::Min => write!(f, "min"),
            Extremum::Max => write!(f, "max"),
        }
    }
}

impl AddManager {
    /// Witness of [`min_abstract`][Self::min_abstract]; ties resolve towards false.
    pub fn min_representative(&self, f: &Diagram<'_>, cube: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.representative(Extremum::Min, f, cube)
    }

    /// Witness of [`max_abstract`][Self::max_abstract]; ties resolve towards false.
    pub fn max_representative(&self, f: &Diagram<'_>, cube: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        self.representative(Extremum::Max, f, cube)
    }

    pub fn representative(&self, ext: Extremum, f: &Diagram<'_>, cube: &Diagram<'_>) -> AddResult<Diagram<'_>> {
        debug!("{}_representative(f = {}, cube = {})", ext, f, cube);
        self.check_cube(cube.node())?;
        self.retry(&format!("{}_representative", ext), || {
            self.representative_rec(ext, f.node(), cube.node())
        })
    }

    fn representative_rec(&self, ext: Extremum, f: Ref, cube: Ref) -> Step<Diagram<'_>> {
        if cube == Ref::ONE {
            return Ok(self.one());
        }

        let f_level = self.level(f);
        let cube_level = self.level(cube);
        let cube_var = self.var_at(cube_level);
        let (cube_rest, _) = self.cofactors(cube, cube_level);

        if f_level > cube_level {
            // f ignores the cube variable: pin it to false.
            let res = self.representative_rec(ext, f, cube_rest)?;
            return self.mk_node_rec(cube_var, Ref::ZERO, res.node());
        }

        let key = OpKey::Representative(ext, f, cube);
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }
        self.checkpoint()?;

        let (f1, f0) = self.cofactors(f, f_level);
        let res = if f_level == cube_level {
            let w0 = self.representative_rec(ext, f0, cube_rest)?;
            let w1 = self.representative_rec(ext, f1, cube_rest)?;

            let take_else = {
                let v0 = self.abstract_rec(ext.abstraction(), f0, cube_rest)?;
                let v1 = self.abstract_rec(ext.abstraction(), f1, cube_rest)?;
                self.apply_rec(BinaryOp::Compare(ext.prefers_else()), v0.node(), v1.node())?
            };

            let low = self.ite_rec(take_else.node(), w0.node(), Ref::ZERO)?;
            let high = self.ite_rec(take_else.node(), Ref::ZERO, w1.node())?;
            self.mk_node_rec(cube_var, high.node(), low.node())?
        } else {
            let w1 = self.representative_rec(ext, f1, cube)?;
            let w0 = self.representative_rec(ext, f0, cube)?;
            self.mk_node_rec(self.var_at(f_level), w1.node(), w0.node())?
        };

        self.cache_put(key, &res);
        Ok(res)
    }
}
