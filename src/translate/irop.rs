//! IR operators, applied to already-translated operands.

use error::{Error, Result};
use ir::IROp;
use symbolic::{Constraints, SymExpr};

fn arity(op: &IROp) -> usize {
    match op {
        IROp::Not(_) |
        IROp::CmpNEZ(_) |
        IROp::Clz(_) |
        IROp::Ctz(_) |
        IROp::Uto { .. } |
        IROp::Sto { .. } |
        IROp::To { .. } |
        IROp::HIto { .. } => 1,
        _ => 2,
    }
}

fn flag(b: SymExpr) -> SymExpr {
    b.bool_to_bv(1)
}

/// count of leading (`from_top`) or trailing zero bits. an all-zero operand counts as `bits`.
fn count_zeros(value: &SymExpr, bits: u32, from_top: bool) -> SymExpr {
    let one = SymExpr::bvv(1, 1);
    let mut result = SymExpr::bvv(bits as u128, bits);
    for i in (0..bits).rev() {
        let index = if from_top { bits - 1 - i } else { i };
        let set = value.extract(index, index).eq(&one);
        result = SymExpr::ite(&set, &SymExpr::bvv(i as u128, bits), &result);
    }
    result
}

fn unsupported(op: &IROp) -> Error {
    Error::UnsupportedOperator(op.to_string())
}

/// the value of `op` applied to `args`, plus any constraints the operator itself introduces.
pub fn translate(op: &IROp, args: &[SymExpr]) -> Result<(SymExpr, Constraints)> {
    if let IROp::Other(_) = op {
        return Err(unsupported(op));
    }
    let expected = arity(op);
    if args.len() != expected {
        return Err(Error::OperatorArity { op: op.to_string(), expected, got: args.len() });
    }
    let a = &args[0];
    let b = args.get(1);
    let rhs = || b.ok_or_else(|| Error::OperatorArity { op: op.to_string(), expected, got: args.len() });

    let value = match *op {
        IROp::Add(_) => a.add(rhs()?),
        IROp::Sub(_) => a.sub(rhs()?),
        IROp::Mul(_) => a.mul(rhs()?),
        IROp::MullS(n) => a.sign_extend(n).mul(&rhs()?.sign_extend(n)),
        IROp::MullU(n) => a.zero_extend(n).mul(&rhs()?.zero_extend(n)),
        IROp::DivU(_) => a.udiv(rhs()?),
        IROp::DivS(_) => a.sdiv(rhs()?),
        IROp::DivModU { from, to } | IROp::DivModS { from, to } => {
            if to == 0 || to * 2 != from {
                return Err(unsupported(op));
            }
            let signed = if let IROp::DivModS { .. } = *op { true } else { false };
            let divisor = if signed {
                rhs()?.sign_extend(from - to)
            } else {
                rhs()?.zero_extend(from - to)
            };
            let (quot, rem) = if signed {
                (a.sdiv(&divisor), a.srem(&divisor))
            } else {
                (a.udiv(&divisor), a.urem(&divisor))
            };
            rem.extract(to - 1, 0).concat(&quot.extract(to - 1, 0))
        }
        IROp::And(_) => a.and(rhs()?),
        IROp::Or(_) => a.or(rhs()?),
        IROp::Xor(_) => a.xor(rhs()?),
        IROp::Shl(_) => a.shl(rhs()?),
        IROp::Shr(_) => a.lshr(rhs()?),
        IROp::Sar(_) => a.ashr(rhs()?),
        IROp::Not(_) => a.not(),
        IROp::CmpEQ(_) => flag(a.eq(rhs()?)),
        IROp::CmpNE(_) => flag(a.ne(rhs()?)),
        IROp::CmpLTS(_) => flag(a.slt(rhs()?)),
        IROp::CmpLTU(_) => flag(a.ult(rhs()?)),
        IROp::CmpLES(_) => flag(a.sle(rhs()?)),
        IROp::CmpLEU(_) => flag(a.ule(rhs()?)),
        IROp::CmpNEZ(n) => flag(a.ne(&SymExpr::bvv(0, n))),
        IROp::Clz(n) => count_zeros(a, n, true),
        IROp::Ctz(n) => count_zeros(a, n, false),
        IROp::MaxU(_) => {
            let b = rhs()?;
            SymExpr::ite(&a.ult(b), b, a)
        }
        IROp::Uto { from, to } => {
            if to < from {
                return Err(unsupported(op));
            }
            a.zero_extend(to - from)
        }
        IROp::Sto { from, to } => {
            if to < from {
                return Err(unsupported(op));
            }
            a.sign_extend(to - from)
        }
        IROp::To { from, to } => {
            if to > from {
                return Err(unsupported(op));
            }
            a.extract(to - 1, 0)
        }
        IROp::HIto { from, to } => {
            if to > from {
                return Err(unsupported(op));
            }
            a.extract(from - 1, from - to)
        }
        IROp::HLto { from, to } => {
            if from * 2 != to {
                return Err(unsupported(op));
            }
            a.concat(rhs()?)
        }
        IROp::Other(_) => return Err(unsupported(op)),
    };
    Ok((value, Constraints::new()))
}
