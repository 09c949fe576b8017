use std::collections::BTreeMap;

use tracing::{event, Level};
use z3::ast::{Ast, Bool, BV};

use solver::{SatResult, Solver};
use symbolic::{BinOp, CmpOp, Model, Node, SymExpr, UnOp};

/// decides constraint lists with z3. formulas are rebuilt as z3 bit-vector and boolean terms on
/// every query; nothing is kept between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Z3Solver;

impl Z3Solver {
    pub fn new() -> Self {
        Z3Solver
    }
}

enum Term {
    Bv(BV),
    Bool(Bool),
}

impl Term {
    fn bv(self) -> BV {
        match self {
            Term::Bv(bv) => bv,
            // a boolean read as a bit-vector is one bit wide
            Term::Bool(b) => b.ite(&BV::from_u64(1, 1), &BV::from_u64(0, 1)),
        }
    }

    fn boolean(self) -> Bool {
        match self {
            Term::Bool(b) => b,
            Term::Bv(bv) => {
                let size = bv.get_size();
                bv.eq(&BV::from_u64(0, size)).not()
            }
        }
    }
}

fn constant(value: u128, bits: u32) -> BV {
    if bits <= 64 {
        BV::from_u64(value as u64, bits)
    } else {
        let high = BV::from_u64((value >> 64) as u64, bits - 64);
        high.concat(&BV::from_u64(value as u64, 64))
    }
}

fn translate(expr: &SymExpr) -> Term {
    match expr.node() {
        Node::Const { value, bits } => Term::Bv(constant(*value, *bits)),
        Node::Bool(b) => Term::Bool(Bool::from_bool(*b)),
        Node::Var { name, bits } => Term::Bv(BV::new_const(name.as_str(), *bits)),
        Node::Unary(op, inner) => {
            let inner = translate(inner).bv();
            Term::Bv(match op {
                UnOp::Not => inner.bvnot(),
                UnOp::Neg => inner.bvneg(),
            })
        }
        Node::Binary(op, left, right) => {
            let left = translate(left).bv();
            let right = translate(right).bv();
            Term::Bv(match op {
                BinOp::Add => left.bvadd(&right),
                BinOp::Sub => left.bvsub(&right),
                BinOp::Mul => left.bvmul(&right),
                BinOp::UDiv => left.bvudiv(&right),
                BinOp::SDiv => left.bvsdiv(&right),
                BinOp::URem => left.bvurem(&right),
                BinOp::SRem => left.bvsrem(&right),
                BinOp::And => left.bvand(&right),
                BinOp::Or => left.bvor(&right),
                BinOp::Xor => left.bvxor(&right),
                BinOp::Shl => left.bvshl(&right),
                BinOp::LShr => left.bvlshr(&right),
                BinOp::AShr => left.bvashr(&right),
            })
        }
        Node::Compare(op, left, right) => {
            let left = translate(left).bv();
            let right = translate(right).bv();
            Term::Bool(match op {
                CmpOp::Eq => left.eq(&right),
                CmpOp::Ult => left.bvult(&right),
                CmpOp::Ule => left.bvule(&right),
                CmpOp::Slt => left.bvslt(&right),
                CmpOp::Sle => left.bvsle(&right),
            })
        }
        Node::Not(inner) => Term::Bool(translate(inner).boolean().not()),
        Node::And(terms) => {
            let terms: Vec<Bool> = terms.iter().map(|t| translate(t).boolean()).collect();
            let refs: Vec<&Bool> = terms.iter().collect();
            Term::Bool(Bool::and(&refs))
        }
        Node::Or(terms) => {
            let terms: Vec<Bool> = terms.iter().map(|t| translate(t).boolean()).collect();
            let refs: Vec<&Bool> = terms.iter().collect();
            Term::Bool(Bool::or(&refs))
        }
        Node::Ite(cond, then, otherwise) => {
            let cond = translate(cond).boolean();
            match (translate(then), translate(otherwise)) {
                (Term::Bool(t), Term::Bool(e)) => Term::Bool(cond.ite(&t, &e)),
                (t, e) => Term::Bv(cond.ite(&t.bv(), &e.bv())),
            }
        }
        Node::Extract { hi, lo, inner } => Term::Bv(translate(inner).bv().extract(*hi, *lo)),
        Node::Concat(high, low) => Term::Bv(translate(high).bv().concat(&translate(low).bv())),
        Node::ZeroExt { by, inner } => Term::Bv(translate(inner).bv().zero_ext(*by)),
        Node::SignExt { by, inner } => Term::Bv(translate(inner).bv().sign_ext(*by)),
    }
}

/// reads `var` back out of a z3 model, 64 bits at a time.
fn model_value(model: &z3::Model, var: &BV, bits: u32) -> Option<u128> {
    let mut value = 0u128;
    let mut lo = 0;
    while lo < bits {
        let hi = (lo + 63).min(bits - 1);
        let part = model.eval(&var.extract(hi, lo), true)?.as_u64()?;
        value |= (part as u128) << lo;
        lo = hi + 1;
    }
    Some(value)
}

impl Solver for Z3Solver {
    fn check(&self, constraints: &[SymExpr]) -> SatResult {
        let solver = z3::Solver::new();
        let mut vars: BTreeMap<String, u32> = BTreeMap::new();
        for c in constraints {
            vars.extend(c.variables());
            solver.assert(translate(c).boolean());
        }

        match solver.check() {
            z3::SatResult::Sat => {
                let z3_model = match solver.get_model() {
                    Some(model) => model,
                    None => return SatResult::Unknown,
                };
                let mut model = Model::new();
                for (name, bits) in vars {
                    let var = BV::new_const(name.as_str(), bits);
                    match model_value(&z3_model, &var, bits) {
                        Some(value) => { model.insert(name, value); }
                        None => return SatResult::Unknown,
                    }
                }
                SatResult::Sat(model)
            }
            z3::SatResult::Unsat => SatResult::Unsat,
            z3::SatResult::Unknown => {
                event!(Level::DEBUG, constraints = constraints.len(), "z3 gave up");
                SatResult::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_satisfy_the_constraints() {
        let x = SymExpr::bvs("x", 64);
        let c = x.mul(&SymExpr::bvv(3, 64)).eq(&SymExpr::bvv(0x3_0000_0009, 64));
        match Z3Solver::new().check(&[c.clone()]) {
            SatResult::Sat(model) => {
                assert_eq!(c.eval(&model).and_then(|v| v.as_bool()), Some(true));
            }
            other => panic!("expected sat, got {:?}", other),
        }
    }

    #[test]
    fn wide_values_come_back_whole() {
        let x = SymExpr::bvs("x", 128);
        let target = (0x0123_4567_89ab_cdefu128 << 64) | 0xfedc_ba98_7654_3210;
        match Z3Solver::new().check(&[x.eq(&SymExpr::bvv(target, 128))]) {
            SatResult::Sat(model) => assert_eq!(model.get("x"), Some(&target)),
            other => panic!("expected sat, got {:?}", other),
        }
    }

    #[test]
    fn contradictions_are_unsat() {
        let x = SymExpr::bvs("x", 32);
        let y = SymExpr::bvs("y", 32);
        let c = vec![x.ult(&y), y.ult(&x)];
        assert!(Z3Solver::new().check(&c).is_unsat());
    }

    #[test]
    fn narrowing_and_extension_agree_with_evaluation() {
        let x = SymExpr::bvs("x", 8);
        let widened = x.sign_extend(8).concat(&x.zero_extend(8));
        let c = widened.extract(31, 16).eq(&SymExpr::bvv(0xff80, 16));
        match Z3Solver::new().check(&[c.clone()]) {
            SatResult::Sat(model) => {
                assert_eq!(model.get("x"), Some(&0x80));
                assert_eq!(c.eval(&model).and_then(|v| v.as_bool()), Some(true));
            }
            other => panic!("expected sat, got {:?}", other),
        }
    }
}
