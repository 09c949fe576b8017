//! symbolic formulas over bit-vectors and booleans.
//!
//! `SymExpr` is the currency everything else in this crate trades in: translated IR values,
//! register and memory contents, path constraints. values are immutable and cheap to clone (an
//! `Arc` bump), so a temp read hands back the very same node the temp was bound to. constructors
//! fold fully-concrete operands eagerly, which keeps constant-only IR trees constant all the way
//! through translation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

pub mod eval;

pub use self::eval::{Model, Value};

/// widest bit-vector this layer represents. VEX does not produce integer values wider than
/// `Ity_I128`/`Ity_V128`.
pub const MAX_BITS: u32 = 128;

/// side conditions accompanying a translated value, in the order they were produced.
pub type Constraints = SmallVec<[SymExpr; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    Bool,
    BitVec(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ult,
    Ule,
    Slt,
    Sle,
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub enum Node {
    Const { value: u128, bits: u32 },
    Bool(bool),
    Var { name: String, bits: u32 },
    Unary(UnOp, SymExpr),
    Binary(BinOp, SymExpr, SymExpr),
    Compare(CmpOp, SymExpr, SymExpr),
    Not(SymExpr),
    And(Vec<SymExpr>),
    Or(Vec<SymExpr>),
    Ite(SymExpr, SymExpr, SymExpr),
    Extract { hi: u32, lo: u32, inner: SymExpr },
    Concat(SymExpr, SymExpr),
    ZeroExt { by: u32, inner: SymExpr },
    SignExt { by: u32, inner: SymExpr },
}

#[derive(PartialEq, Eq, Hash)]
struct Inner {
    sort: Sort,
    node: Node,
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SymExpr(Arc<Inner>);

pub(crate) fn mask(bits: u32) -> u128 {
    if bits >= MAX_BITS {
        u128::max_value()
    } else {
        (1u128 << bits) - 1
    }
}

pub(crate) fn to_signed(value: u128, bits: u32) -> i128 {
    if bits >= MAX_BITS {
        value as i128
    } else {
        let shift = MAX_BITS - bits;
        ((value << shift) as i128) >> shift
    }
}

impl SymExpr {
    fn mk(sort: Sort, node: Node) -> SymExpr {
        SymExpr(Arc::new(Inner { sort, node }))
    }

    /// a bit-vector constant. `value` is reduced modulo `2^bits`.
    pub fn bvv(value: u128, bits: u32) -> SymExpr {
        debug_assert!(bits > 0 && bits <= MAX_BITS, "invalid bit-vector width {}", bits);
        SymExpr::mk(Sort::BitVec(bits), Node::Const { value: value & mask(bits), bits })
    }

    /// an unconstrained bit-vector variable.
    pub fn bvs<T: Into<String>>(name: T, bits: u32) -> SymExpr {
        debug_assert!(bits > 0 && bits <= MAX_BITS, "invalid bit-vector width {}", bits);
        SymExpr::mk(Sort::BitVec(bits), Node::Var { name: name.into(), bits })
    }

    pub fn true_() -> SymExpr {
        SymExpr::mk(Sort::Bool, Node::Bool(true))
    }

    pub fn false_() -> SymExpr {
        SymExpr::mk(Sort::Bool, Node::Bool(false))
    }

    pub fn bool_const(b: bool) -> SymExpr {
        if b { SymExpr::true_() } else { SymExpr::false_() }
    }

    pub fn node(&self) -> &Node {
        &self.0.node
    }

    pub fn sort(&self) -> Sort {
        self.0.sort
    }

    pub fn is_bool(&self) -> bool {
        self.0.sort == Sort::Bool
    }

    /// width of a bit-vector expression. booleans report `0`.
    pub fn bits(&self) -> u32 {
        match self.0.sort {
            Sort::BitVec(bits) => bits,
            Sort::Bool => 0,
        }
    }

    /// `true` if `self` and `other` are the same node, not merely structurally equal.
    pub fn ptr_eq(&self, other: &SymExpr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_const(&self) -> Option<u128> {
        match self.node() {
            Node::Const { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_const().and_then(|v| if v >> 64 == 0 { Some(v as u64) } else { None })
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.node() {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_concrete(&self) -> bool {
        match self.node() {
            Node::Const { .. } | Node::Bool(_) => true,
            _ => false,
        }
    }

    fn unop(&self, op: UnOp) -> SymExpr {
        let bits = self.bits();
        if let Some(v) = self.as_const() {
            return SymExpr::bvv(eval::apply_unop(op, v, bits), bits);
        }
        SymExpr::mk(Sort::BitVec(bits), Node::Unary(op, self.clone()))
    }

    fn binop(&self, op: BinOp, other: &SymExpr) -> SymExpr {
        debug_assert_eq!(self.bits(), other.bits(), "width mismatch in {:?}: {} vs {}", op, self, other);
        let bits = self.bits();
        if let (Some(l), Some(r)) = (self.as_const(), other.as_const()) {
            return SymExpr::bvv(eval::apply_binop(op, l, r, bits), bits);
        }
        SymExpr::mk(Sort::BitVec(bits), Node::Binary(op, self.clone(), other.clone()))
    }

    fn cmp(&self, op: CmpOp, other: &SymExpr) -> SymExpr {
        debug_assert_eq!(self.bits(), other.bits(), "width mismatch in {:?}: {} vs {}", op, self, other);
        if let (Some(l), Some(r)) = (self.as_const(), other.as_const()) {
            return SymExpr::bool_const(eval::apply_cmp(op, l, r, self.bits()));
        }
        if op == CmpOp::Eq && self == other {
            return SymExpr::true_();
        }
        SymExpr::mk(Sort::Bool, Node::Compare(op, self.clone(), other.clone()))
    }

    pub fn add(&self, other: &SymExpr) -> SymExpr { self.binop(BinOp::Add, other) }
    pub fn sub(&self, other: &SymExpr) -> SymExpr { self.binop(BinOp::Sub, other) }
    pub fn mul(&self, other: &SymExpr) -> SymExpr { self.binop(BinOp::Mul, other) }
    pub fn udiv(&self, other: &SymExpr) -> SymExpr { self.binop(BinOp::UDiv, other) }
    pub fn sdiv(&self, other: &SymExpr) -> SymExpr { self.binop(BinOp::SDiv, other) }
    pub fn urem(&self, other: &SymExpr) -> SymExpr { self.binop(BinOp::URem, other) }
    pub fn srem(&self, other: &SymExpr) -> SymExpr { self.binop(BinOp::SRem, other) }
    pub fn and(&self, other: &SymExpr) -> SymExpr { self.binop(BinOp::And, other) }
    pub fn or(&self, other: &SymExpr) -> SymExpr { self.binop(BinOp::Or, other) }
    pub fn xor(&self, other: &SymExpr) -> SymExpr { self.binop(BinOp::Xor, other) }
    pub fn not(&self) -> SymExpr { self.unop(UnOp::Not) }
    pub fn neg(&self) -> SymExpr { self.unop(UnOp::Neg) }

    /// shifts take an amount of any width; it is resized to the width of `self`.
    pub fn shl(&self, amount: &SymExpr) -> SymExpr { self.binop(BinOp::Shl, &amount.resize(self.bits())) }
    pub fn lshr(&self, amount: &SymExpr) -> SymExpr { self.binop(BinOp::LShr, &amount.resize(self.bits())) }
    pub fn ashr(&self, amount: &SymExpr) -> SymExpr { self.binop(BinOp::AShr, &amount.resize(self.bits())) }

    pub fn eq(&self, other: &SymExpr) -> SymExpr { self.cmp(CmpOp::Eq, other) }
    pub fn ne(&self, other: &SymExpr) -> SymExpr { self.eq(other).bool_not() }
    pub fn ult(&self, other: &SymExpr) -> SymExpr { self.cmp(CmpOp::Ult, other) }
    pub fn ule(&self, other: &SymExpr) -> SymExpr { self.cmp(CmpOp::Ule, other) }
    pub fn slt(&self, other: &SymExpr) -> SymExpr { self.cmp(CmpOp::Slt, other) }
    pub fn sle(&self, other: &SymExpr) -> SymExpr { self.cmp(CmpOp::Sle, other) }

    pub fn bool_not(&self) -> SymExpr {
        debug_assert!(self.is_bool());
        match self.node() {
            Node::Bool(b) => SymExpr::bool_const(!b),
            Node::Not(inner) => inner.clone(),
            _ => SymExpr::mk(Sort::Bool, Node::Not(self.clone())),
        }
    }

    /// conjunction of `terms`. an empty conjunction is `true`.
    pub fn bool_and<I: IntoIterator<Item = SymExpr>>(terms: I) -> SymExpr {
        let mut kept = Vec::new();
        for term in terms {
            debug_assert!(term.is_bool());
            match term.as_bool() {
                Some(true) => {}
                Some(false) => return SymExpr::false_(),
                None => kept.push(term),
            }
        }
        match kept.len() {
            0 => SymExpr::true_(),
            1 => kept.pop().unwrap_or_else(SymExpr::true_),
            _ => SymExpr::mk(Sort::Bool, Node::And(kept)),
        }
    }

    /// disjunction of `terms`. an empty disjunction is `false`.
    pub fn bool_or<I: IntoIterator<Item = SymExpr>>(terms: I) -> SymExpr {
        let mut kept = Vec::new();
        for term in terms {
            debug_assert!(term.is_bool());
            match term.as_bool() {
                Some(false) => {}
                Some(true) => return SymExpr::true_(),
                None => kept.push(term),
            }
        }
        match kept.len() {
            0 => SymExpr::false_(),
            1 => kept.pop().unwrap_or_else(SymExpr::false_),
            _ => SymExpr::mk(Sort::Bool, Node::Or(kept)),
        }
    }

    /// if-then-else. `cond` must be boolean; both arms must have the same sort.
    pub fn ite(cond: &SymExpr, then: &SymExpr, otherwise: &SymExpr) -> SymExpr {
        debug_assert!(cond.is_bool());
        debug_assert_eq!(then.sort(), otherwise.sort());
        match cond.as_bool() {
            Some(true) => return then.clone(),
            Some(false) => return otherwise.clone(),
            None => {}
        }
        if then == otherwise {
            return then.clone();
        }
        SymExpr::mk(then.sort(), Node::Ite(cond.clone(), then.clone(), otherwise.clone()))
    }

    /// bits `hi..=lo` of `self`.
    pub fn extract(&self, hi: u32, lo: u32) -> SymExpr {
        debug_assert!(hi >= lo && hi < self.bits(), "bad extract [{}:{}] of {} bits", hi, lo, self.bits());
        let bits = hi - lo + 1;
        if lo == 0 && bits == self.bits() {
            return self.clone();
        }
        if let Some(v) = self.as_const() {
            return SymExpr::bvv(v >> lo, bits);
        }
        SymExpr::mk(Sort::BitVec(bits), Node::Extract { hi, lo, inner: self.clone() })
    }

    /// `self` becomes the high bits, `low` the low bits.
    pub fn concat(&self, low: &SymExpr) -> SymExpr {
        let bits = self.bits() + low.bits();
        debug_assert!(bits <= MAX_BITS, "concat to {} bits", bits);
        if let (Some(h), Some(l)) = (self.as_const(), low.as_const()) {
            return SymExpr::bvv((h << low.bits()) | l, bits);
        }
        SymExpr::mk(Sort::BitVec(bits), Node::Concat(self.clone(), low.clone()))
    }

    pub fn zero_extend(&self, by: u32) -> SymExpr {
        if by == 0 {
            return self.clone();
        }
        let bits = self.bits() + by;
        if let Some(v) = self.as_const() {
            return SymExpr::bvv(v, bits);
        }
        SymExpr::mk(Sort::BitVec(bits), Node::ZeroExt { by, inner: self.clone() })
    }

    pub fn sign_extend(&self, by: u32) -> SymExpr {
        if by == 0 {
            return self.clone();
        }
        let bits = self.bits() + by;
        if let Some(v) = self.as_const() {
            return SymExpr::bvv(to_signed(v, self.bits()) as u128, bits);
        }
        SymExpr::mk(Sort::BitVec(bits), Node::SignExt { by, inner: self.clone() })
    }

    /// zero-extend or truncate to exactly `bits`.
    pub fn resize(&self, bits: u32) -> SymExpr {
        let have = self.bits();
        if have == bits {
            self.clone()
        } else if have < bits {
            self.zero_extend(bits - have)
        } else {
            self.extract(bits - 1, 0)
        }
    }

    /// `1` of width `bits` if `self` holds, `0` otherwise.
    pub fn bool_to_bv(&self, bits: u32) -> SymExpr {
        SymExpr::ite(self, &SymExpr::bvv(1, bits), &SymExpr::bvv(0, bits))
    }

    /// free variables of this expression, with their widths.
    pub fn variables(&self) -> BTreeMap<String, u32> {
        let mut vars = BTreeMap::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr.node() {
                Node::Const { .. } | Node::Bool(_) => {}
                Node::Var { name, bits } => {
                    vars.insert(name.clone(), *bits);
                }
                Node::Unary(_, a) |
                Node::Not(a) |
                Node::Extract { inner: a, .. } |
                Node::ZeroExt { inner: a, .. } |
                Node::SignExt { inner: a, .. } => stack.push(a),
                Node::Binary(_, a, b) |
                Node::Compare(_, a, b) |
                Node::Concat(a, b) => {
                    stack.push(a);
                    stack.push(b);
                }
                Node::Ite(c, t, e) => {
                    stack.push(c);
                    stack.push(t);
                    stack.push(e);
                }
                Node::And(terms) | Node::Or(terms) => stack.extend(terms.iter()),
            }
        }
        vars
    }
}

impl fmt::Display for SymExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.node() {
            Node::Const { value, bits } => write!(f, "{:#x}:{}", value, bits),
            Node::Bool(b) => write!(f, "{}", b),
            Node::Var { name, bits } => write!(f, "{}:{}", name, bits),
            Node::Unary(op, a) => {
                let name = match op { UnOp::Not => "bvnot", UnOp::Neg => "bvneg" };
                write!(f, "({} {})", name, a)
            }
            Node::Binary(op, a, b) => {
                let name = match op {
                    BinOp::Add => "bvadd",
                    BinOp::Sub => "bvsub",
                    BinOp::Mul => "bvmul",
                    BinOp::UDiv => "bvudiv",
                    BinOp::SDiv => "bvsdiv",
                    BinOp::URem => "bvurem",
                    BinOp::SRem => "bvsrem",
                    BinOp::And => "bvand",
                    BinOp::Or => "bvor",
                    BinOp::Xor => "bvxor",
                    BinOp::Shl => "bvshl",
                    BinOp::LShr => "bvlshr",
                    BinOp::AShr => "bvashr",
                };
                write!(f, "({} {} {})", name, a, b)
            }
            Node::Compare(op, a, b) => {
                let name = match op {
                    CmpOp::Eq => "=",
                    CmpOp::Ult => "bvult",
                    CmpOp::Ule => "bvule",
                    CmpOp::Slt => "bvslt",
                    CmpOp::Sle => "bvsle",
                };
                write!(f, "({} {} {})", name, a, b)
            }
            Node::Not(a) => write!(f, "(not {})", a),
            Node::And(terms) | Node::Or(terms) => {
                let name = if let Node::And(_) = self.node() { "and" } else { "or" };
                write!(f, "({}", name)?;
                for term in terms {
                    write!(f, " {}", term)?;
                }
                write!(f, ")")
            }
            Node::Ite(c, t, e) => write!(f, "(ite {} {} {})", c, t, e),
            Node::Extract { hi, lo, inner } => write!(f, "((_ extract {} {}) {})", hi, lo, inner),
            Node::Concat(h, l) => write!(f, "(concat {} {})", h, l),
            Node::ZeroExt { by, inner } => write!(f, "((_ zero_extend {}) {})", by, inner),
            Node::SignExt { by, inner } => write!(f, "((_ sign_extend {}) {})", by, inner),
        }
    }
}

impl fmt::Debug for SymExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
