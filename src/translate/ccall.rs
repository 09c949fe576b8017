//! emulation of VEX's architecture helper calls.
//!
//! the helpers here all evaluate the lazy flag thunk: rather than computing flags after every
//! instruction, VEX records `(cc_op, cc_dep1, cc_dep2, cc_ndep)` and calls a helper when some
//! flag is actually needed. `cc_op` names the operation that last set flags and its operand width;
//! the deps are its operands (or result, depending on the operation).
//!
//! a concrete `cc_op` is evaluated directly. a symbolic one is expanded into an if-then-else over
//! every operation we model, with a constraint that `cc_op` is one of them.

use error::{Error, Result};
use state::SymbolicState;
use symbolic::{Constraints, SymExpr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CCallHelper {
    Amd64CalculateCondition,
    Amd64CalculateRflagsAll,
    Amd64CalculateRflagsC,
    X86CalculateCondition,
    X86CalculateEflagsAll,
    X86CalculateEflagsC,
}

const HELPERS: [CCallHelper; 6] = [
    CCallHelper::Amd64CalculateCondition,
    CCallHelper::Amd64CalculateRflagsAll,
    CCallHelper::Amd64CalculateRflagsC,
    CCallHelper::X86CalculateCondition,
    CCallHelper::X86CalculateEflagsAll,
    CCallHelper::X86CalculateEflagsC,
];

impl CCallHelper {
    pub fn from_name(name: &str) -> Option<CCallHelper> {
        HELPERS.iter().cloned().find(|h| h.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CCallHelper::Amd64CalculateCondition => "amd64g_calculate_condition",
            CCallHelper::Amd64CalculateRflagsAll => "amd64g_calculate_rflags_all",
            CCallHelper::Amd64CalculateRflagsC => "amd64g_calculate_rflags_c",
            CCallHelper::X86CalculateCondition => "x86g_calculate_condition",
            CCallHelper::X86CalculateEflagsAll => "x86g_calculate_eflags_all",
            CCallHelper::X86CalculateEflagsC => "x86g_calculate_eflags_c",
        }
    }

    fn layout(&self) -> &'static ThunkLayout {
        match self {
            CCallHelper::Amd64CalculateCondition |
            CCallHelper::Amd64CalculateRflagsAll |
            CCallHelper::Amd64CalculateRflagsC => &AMD64_THUNK,
            CCallHelper::X86CalculateCondition |
            CCallHelper::X86CalculateEflagsAll |
            CCallHelper::X86CalculateEflagsC => &X86_THUNK,
        }
    }

    fn arity(&self) -> usize {
        match self {
            CCallHelper::Amd64CalculateCondition | CCallHelper::X86CalculateCondition => 5,
            _ => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThunkOp {
    Copy,
    Add,
    Sub,
    Adc,
    Sbb,
    Logic,
    Inc,
    Dec,
    Shl,
    Shr,
}

/// operation groups in `cc_op` order, after `COPY`. each group has one `cc_op` per data width.
/// VEX continues with rotates and multiplies, which are not modeled.
const OP_GROUPS: [ThunkOp; 9] = [
    ThunkOp::Add,
    ThunkOp::Sub,
    ThunkOp::Adc,
    ThunkOp::Sbb,
    ThunkOp::Logic,
    ThunkOp::Inc,
    ThunkOp::Dec,
    ThunkOp::Shl,
    ThunkOp::Shr,
];

struct ThunkLayout {
    word_bits: u32,
    widths: &'static [u32],
}

static AMD64_THUNK: ThunkLayout = ThunkLayout { word_bits: 64, widths: &[8, 16, 32, 64] };
static X86_THUNK: ThunkLayout = ThunkLayout { word_bits: 32, widths: &[8, 16, 32] };

impl ThunkLayout {
    fn decode(&self, cc_op: u64) -> Option<(ThunkOp, u32)> {
        if cc_op == 0 {
            return Some((ThunkOp::Copy, self.word_bits));
        }
        let idx = (cc_op - 1) as usize;
        let group = OP_GROUPS.get(idx / self.widths.len())?;
        Some((*group, self.widths[idx % self.widths.len()]))
    }

    /// one past the highest modeled `cc_op`.
    fn modeled(&self) -> u64 {
        1 + (OP_GROUPS.len() * self.widths.len()) as u64
    }
}

const CF_SHIFT: u32 = 0;
const PF_SHIFT: u32 = 2;
const AF_SHIFT: u32 = 4;
const ZF_SHIFT: u32 = 6;
const SF_SHIFT: u32 = 7;
const OF_SHIFT: u32 = 11;

/// each flag as a 1-bit value.
struct Flags {
    cf: SymExpr,
    pf: SymExpr,
    af: SymExpr,
    zf: SymExpr,
    sf: SymExpr,
    of: SymExpr,
}

fn bit(e: &SymExpr, i: u32) -> SymExpr {
    e.extract(i, i)
}

fn msb(e: &SymExpr) -> SymExpr {
    bit(e, e.bits() - 1)
}

fn zero_flag(res: &SymExpr) -> SymExpr {
    res.eq(&SymExpr::bvv(0, res.bits())).bool_to_bv(1)
}

/// set when the low byte of `res` has an even number of set bits.
fn parity_flag(res: &SymExpr) -> SymExpr {
    let mut parity = bit(res, 0);
    for i in 1..8 {
        parity = parity.xor(&bit(res, i));
    }
    parity.not()
}

fn adjust_flag(res: &SymExpr, l: &SymExpr, r: &SymExpr) -> SymExpr {
    bit(&res.xor(l).xor(r), 4)
}

fn flags_for(op: ThunkOp, n: u32, dep1: &SymExpr, dep2: &SymExpr, ndep: &SymExpr) -> Flags {
    let zero = SymExpr::bvv(0, 1);
    if op == ThunkOp::Copy {
        return Flags {
            cf: bit(dep1, CF_SHIFT),
            pf: bit(dep1, PF_SHIFT),
            af: bit(dep1, AF_SHIFT),
            zf: bit(dep1, ZF_SHIFT),
            sf: bit(dep1, SF_SHIFT),
            of: bit(dep1, OF_SHIFT),
        };
    }

    let l = dep1.extract(n - 1, 0);
    let r = dep2.extract(n - 1, 0);
    let one = SymExpr::bvv(1, n);
    let old_c = bit(ndep, CF_SHIFT);
    let old_c_wide = old_c.zero_extend(n - 1);
    let old_c_set = old_c.eq(&SymExpr::bvv(1, 1));

    let (res, cf, af, of) = match op {
        ThunkOp::Add => {
            let res = l.add(&r);
            let cf = res.ult(&l).bool_to_bv(1);
            let of = msb(&l.xor(&r).not().and(&l.xor(&res)));
            let af = adjust_flag(&res, &l, &r);
            (res, cf, af, of)
        }
        ThunkOp::Sub => {
            let res = l.sub(&r);
            let cf = l.ult(&r).bool_to_bv(1);
            let of = msb(&l.xor(&r).and(&l.xor(&res)));
            let af = adjust_flag(&res, &l, &r);
            (res, cf, af, of)
        }
        ThunkOp::Adc => {
            let arg_r = r.xor(&old_c_wide);
            let res = l.add(&arg_r).add(&old_c_wide);
            let cf = SymExpr::ite(&old_c_set, &res.ule(&l), &res.ult(&l)).bool_to_bv(1);
            let of = msb(&l.xor(&arg_r).not().and(&l.xor(&res)));
            let af = adjust_flag(&res, &l, &arg_r);
            (res, cf, af, of)
        }
        ThunkOp::Sbb => {
            let arg_r = r.xor(&old_c_wide);
            let res = l.sub(&arg_r).sub(&old_c_wide);
            let cf = SymExpr::ite(&old_c_set, &l.ule(&arg_r), &l.ult(&arg_r)).bool_to_bv(1);
            let of = msb(&l.xor(&arg_r).and(&l.xor(&res)));
            let af = adjust_flag(&res, &l, &arg_r);
            (res, cf, af, of)
        }
        ThunkOp::Logic => (l.clone(), zero.clone(), zero.clone(), zero.clone()),
        ThunkOp::Inc | ThunkOp::Dec => {
            let res = l.clone();
            let sign = 1u128 << (n - 1);
            let (arg_l, of_at) = if op == ThunkOp::Inc {
                (res.sub(&one), sign)
            } else {
                (res.add(&one), sign - 1)
            };
            let of = res.eq(&SymExpr::bvv(of_at, n)).bool_to_bv(1);
            let af = adjust_flag(&res, &arg_l, &one);
            (res, old_c.clone(), af, of)
        }
        ThunkOp::Shl | ThunkOp::Shr => {
            // dep2 is the operand shifted by one less than the real count
            let res = l.clone();
            let cf = if op == ThunkOp::Shl { msb(&r) } else { bit(&r, 0) };
            let of = msb(&res.xor(&r));
            (res, cf, zero.clone(), of)
        }
        ThunkOp::Copy => (l.clone(), zero.clone(), zero.clone(), zero.clone()),
    };

    Flags {
        cf,
        pf: parity_flag(&res),
        af,
        zf: zero_flag(&res),
        sf: msb(&res),
        of,
    }
}

fn pack(flags: &Flags, bits: u32) -> SymExpr {
    let place = |f: &SymExpr, shift: u32| f.zero_extend(bits - 1).shl(&SymExpr::bvv(shift as u128, bits));
    place(&flags.cf, CF_SHIFT)
        .or(&place(&flags.pf, PF_SHIFT))
        .or(&place(&flags.af, AF_SHIFT))
        .or(&place(&flags.zf, ZF_SHIFT))
        .or(&place(&flags.sf, SF_SHIFT))
        .or(&place(&flags.of, OF_SHIFT))
}

/// the 1-bit truth of condition code `cond` (`O, NO, B, NB, Z, NZ, BE, NBE, S, NS, P, NP, L, NL,
/// LE, NLE`).
fn condition_bit(cond: u64, flags: &Flags) -> SymExpr {
    let base = match (cond >> 1) & 7 {
        0 => flags.of.clone(),
        1 => flags.cf.clone(),
        2 => flags.zf.clone(),
        3 => flags.cf.or(&flags.zf),
        4 => flags.sf.clone(),
        5 => flags.pf.clone(),
        6 => flags.sf.xor(&flags.of),
        _ => flags.sf.xor(&flags.of).or(&flags.zf),
    };
    if cond & 1 == 1 { base.not() } else { base }
}

/// `condition_bit` for a possibly-symbolic condition code.
fn condition_value(cond: &SymExpr, flags: &Flags) -> SymExpr {
    if let Some(c) = cond.as_u64() {
        return condition_bit(c & 15, flags);
    }
    let mut result = condition_bit(15, flags);
    for c in (0..15).rev() {
        let guard = cond.eq(&SymExpr::bvv(c as u128, cond.bits()));
        result = SymExpr::ite(&guard, &condition_bit(c, flags), &result);
    }
    result
}

/// evaluate `f` for the operation named by `cc_op`, expanding over every modeled operation if
/// `cc_op` is symbolic.
fn over_cc_op<F>(helper: CCallHelper, cc_op: &SymExpr, f: F) -> Result<(SymExpr, Constraints)>
    where F: Fn(ThunkOp, u32) -> SymExpr
{
    let layout = helper.layout();
    if let Some(op) = cc_op.as_u64() {
        let (thunk_op, n) = layout.decode(op)
            .ok_or(Error::UnsupportedFlagThunk { helper: helper.name(), cc_op: op })?;
        return Ok((f(thunk_op, n), Constraints::new()));
    }

    let case = |k: u64| cc_op.eq(&SymExpr::bvv(k as u128, cc_op.bits()));
    let mut result = f(ThunkOp::Copy, layout.word_bits);
    let mut cases = vec![case(0)];
    for k in (1..layout.modeled()).rev() {
        if let Some((thunk_op, n)) = layout.decode(k) {
            result = SymExpr::ite(&case(k), &f(thunk_op, n), &result);
            cases.push(case(k));
        }
    }
    let mut constraints = Constraints::new();
    constraints.push(SymExpr::bool_or(cases));
    Ok((result, constraints))
}

/// invoke `helper` on translated arguments, returning its value and any constraints it adds.
pub fn call(helper: CCallHelper, _state: &SymbolicState, args: &[SymExpr]) -> Result<(SymExpr, Constraints)> {
    if args.len() != helper.arity() {
        return Err(Error::CallHelperArity { helper: helper.name(), expected: helper.arity(), got: args.len() });
    }
    let word = helper.layout().word_bits;
    let word_args: Vec<SymExpr> = args.iter().map(|a| a.resize(word)).collect();

    match helper {
        CCallHelper::Amd64CalculateCondition | CCallHelper::X86CalculateCondition => {
            let cond = &word_args[0];
            let (dep1, dep2, ndep) = (&word_args[2], &word_args[3], &word_args[4]);
            let (value, mut constraints) = over_cc_op(helper, &word_args[1], |op, n| {
                condition_value(cond, &flags_for(op, n, dep1, dep2, ndep))
            })?;
            if !cond.is_concrete() {
                constraints.push(cond.ult(&SymExpr::bvv(16, word)));
            }
            Ok((value.zero_extend(word - 1), constraints))
        }
        CCallHelper::Amd64CalculateRflagsAll | CCallHelper::X86CalculateEflagsAll => {
            let (dep1, dep2, ndep) = (&word_args[1], &word_args[2], &word_args[3]);
            over_cc_op(helper, &word_args[0], |op, n| pack(&flags_for(op, n, dep1, dep2, ndep), word))
        }
        CCallHelper::Amd64CalculateRflagsC | CCallHelper::X86CalculateEflagsC => {
            let (dep1, dep2, ndep) = (&word_args[1], &word_args[2], &word_args[3]);
            over_cc_op(helper, &word_args[0], |op, n| {
                flags_for(op, n, dep1, dep2, ndep).cf.zero_extend(word - 1)
            })
        }
    }
}
