//! the solver side of the boundary. the translator never calls a solver itself; it only produces
//! formulas and constraint lists. `Solver` is the shape of the collaborator that consumes them.
//! `Z3Solver` hands them to z3 as bit-vector formulas. `EnumerationSolver` tries every assignment,
//! which is only workable for a handful of free bits.

use std::collections::BTreeMap;

use symbolic::{Model, SymExpr};

#[cfg(feature = "z3")]
mod smt;

#[cfg(feature = "z3")]
pub use self::smt::Z3Solver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatResult {
    Sat(Model),
    Unsat,
    /// the query was outside what this solver is willing to decide.
    Unknown,
}

impl SatResult {
    pub fn is_sat(&self) -> bool {
        match self {
            SatResult::Sat(_) => true,
            _ => false,
        }
    }

    pub fn is_unsat(&self) -> bool {
        *self == SatResult::Unsat
    }
}

pub trait Solver {
    /// decide whether every constraint in `constraints` can hold at once.
    fn check(&self, constraints: &[SymExpr]) -> SatResult;
}

/// exhaustively enumerates assignments to free variables, giving up (`Unknown`) if their combined
/// width exceeds `max_bits`. `max_bits` is clamped to `ENUMERATION_LIMIT`.
pub struct EnumerationSolver {
    pub max_bits: u32,
}

/// the widest assignment space `EnumerationSolver` will walk, whatever `max_bits` says.
pub const ENUMERATION_LIMIT: u32 = 127;

impl Default for EnumerationSolver {
    fn default() -> Self {
        EnumerationSolver { max_bits: 20 }
    }
}

impl Solver for EnumerationSolver {
    fn check(&self, constraints: &[SymExpr]) -> SatResult {
        let mut vars: BTreeMap<String, u32> = BTreeMap::new();
        for c in constraints {
            vars.extend(c.variables());
        }
        let total: u32 = vars.values().sum();
        if total > self.max_bits.min(ENUMERATION_LIMIT) {
            return SatResult::Unknown;
        }

        let vars: Vec<(String, u32)> = vars.into_iter().collect();
        for assignment in 0..(1u128 << total) {
            let mut model = Model::new();
            let mut rest = assignment;
            for (name, bits) in vars.iter() {
                model.insert(name.clone(), rest & ((1u128 << *bits) - 1));
                rest >>= *bits;
            }
            let holds = constraints.iter().all(|c| {
                c.eval(&model).and_then(|v| v.as_bool()) == Some(true)
            });
            if holds {
                return SatResult::Sat(model);
            }
        }
        SatResult::Unsat
    }
}
