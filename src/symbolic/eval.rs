use std::collections::BTreeMap;

use symbolic::{mask, to_signed, BinOp, CmpOp, Node, SymExpr, UnOp, MAX_BITS};

/// an assignment of values to free variables, by name.
pub type Model = BTreeMap<String, u128>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    BitVec { value: u128, bits: u32 },
}

impl Value {
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Value::BitVec { value, .. } => Some(*value),
            Value::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::BitVec { .. } => None,
        }
    }
}

pub(crate) fn apply_unop(op: UnOp, v: u128, bits: u32) -> u128 {
    match op {
        UnOp::Not => !v & mask(bits),
        UnOp::Neg => v.wrapping_neg() & mask(bits),
    }
}

pub(crate) fn apply_binop(op: BinOp, l: u128, r: u128, bits: u32) -> u128 {
    let m = mask(bits);
    let res = match op {
        BinOp::Add => l.wrapping_add(r),
        BinOp::Sub => l.wrapping_sub(r),
        BinOp::Mul => l.wrapping_mul(r),
        BinOp::UDiv => {
            if r == 0 { m } else { l / r }
        }
        BinOp::URem => {
            if r == 0 { l } else { l % r }
        }
        BinOp::SDiv => {
            let (sl, sr) = (to_signed(l, bits), to_signed(r, bits));
            if sr == 0 {
                // smt-lib: -1 for a non-negative dividend, 1 otherwise
                if sl < 0 { 1 } else { m }
            } else {
                sl.wrapping_div(sr) as u128
            }
        }
        BinOp::SRem => {
            let (sl, sr) = (to_signed(l, bits), to_signed(r, bits));
            if sr == 0 { l } else { sl.wrapping_rem(sr) as u128 }
        }
        BinOp::And => l & r,
        BinOp::Or => l | r,
        BinOp::Xor => l ^ r,
        BinOp::Shl => {
            if r >= bits as u128 { 0 } else { l << r as u32 }
        }
        BinOp::LShr => {
            if r >= bits as u128 { 0 } else { l >> r as u32 }
        }
        BinOp::AShr => {
            let sl = to_signed(l, bits);
            if r >= bits as u128 {
                if sl < 0 { m } else { 0 }
            } else {
                (sl >> r as u32) as u128
            }
        }
    };
    res & m
}

pub(crate) fn apply_cmp(op: CmpOp, l: u128, r: u128, bits: u32) -> bool {
    match op {
        CmpOp::Eq => l == r,
        CmpOp::Ult => l < r,
        CmpOp::Ule => l <= r,
        CmpOp::Slt => to_signed(l, bits) < to_signed(r, bits),
        CmpOp::Sle => to_signed(l, bits) <= to_signed(r, bits),
    }
}

fn bv(expr: &SymExpr, model: &Model) -> Option<u128> {
    expr.eval(model).and_then(|v| v.as_u128())
}

fn boolean(expr: &SymExpr, model: &Model) -> Option<bool> {
    expr.eval(model).and_then(|v| v.as_bool())
}

impl SymExpr {
    /// evaluate under `model`. `None` if a free variable is unassigned.
    pub fn eval(&self, model: &Model) -> Option<Value> {
        let bits = self.bits();
        let value = match self.node() {
            Node::Const { value, .. } => *value,
            Node::Bool(b) => return Some(Value::Bool(*b)),
            Node::Var { name, .. } => model.get(name)? & mask(bits),
            Node::Unary(op, a) => apply_unop(*op, bv(a, model)?, bits),
            Node::Binary(op, a, b) => apply_binop(*op, bv(a, model)?, bv(b, model)?, bits),
            Node::Compare(op, a, b) => {
                return Some(Value::Bool(apply_cmp(*op, bv(a, model)?, bv(b, model)?, a.bits())));
            }
            Node::Not(a) => return Some(Value::Bool(!boolean(a, model)?)),
            Node::And(terms) => {
                let mut all = true;
                for term in terms {
                    all &= boolean(term, model)?;
                }
                return Some(Value::Bool(all));
            }
            Node::Or(terms) => {
                let mut any = false;
                for term in terms {
                    any |= boolean(term, model)?;
                }
                return Some(Value::Bool(any));
            }
            Node::Ite(c, t, e) => {
                return if boolean(c, model)? { t.eval(model) } else { e.eval(model) };
            }
            Node::Extract { lo, inner, .. } => (bv(inner, model)? >> *lo) & mask(bits),
            Node::Concat(h, l) => {
                let low_bits = l.bits();
                let high = bv(h, model)?;
                let low = bv(l, model)?;
                if low_bits >= MAX_BITS { low } else { (high << low_bits) | low }
            }
            Node::ZeroExt { inner, .. } => bv(inner, model)?,
            Node::SignExt { inner, .. } => to_signed(bv(inner, model)?, inner.bits()) as u128 & mask(bits),
        };
        Some(Value::BitVec { value, bits })
    }
}
