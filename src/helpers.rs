//! width and byte-order conversions between the IR and the symbolic layer.

use ir::{Endness, IRConst, IRType};
use symbolic::SymExpr;

/// solver-level width, in bits, of a value of IR type `ty`.
pub fn size_of(ty: IRType) -> u32 {
    ty.bits()
}

/// an IR literal as a bit-vector constant of its declared width.
pub fn translate_const(con: &IRConst) -> SymExpr {
    let bits = con.ty().bits();
    match *con {
        IRConst::U1(b) => SymExpr::bvv(b as u128, bits),
        IRConst::U8(v) => SymExpr::bvv(v as u128, bits),
        IRConst::U16(v) => SymExpr::bvv(v as u128, bits),
        IRConst::U32(v) | IRConst::F32(v) => SymExpr::bvv(v as u128, bits),
        IRConst::U64(v) | IRConst::F64(v) => SymExpr::bvv(v as u128, bits),
        IRConst::V128(lanes) => {
            let mut value = 0u128;
            for lane in 0..16 {
                if lanes & (1 << lane) != 0 {
                    value |= 0xffu128 << (lane * 8);
                }
            }
            SymExpr::bvv(value, bits)
        }
    }
}

/// reverse the byte order of `expr`. widths that are not a whole number of bytes are returned
/// unchanged.
pub fn reverse_bytes(expr: &SymExpr) -> SymExpr {
    let bits = expr.bits();
    if bits <= 8 || bits % 8 != 0 {
        return expr.clone();
    }
    let mut reversed = expr.extract(7, 0);
    let mut lo = 8;
    while lo < bits {
        reversed = reversed.concat(&expr.extract(lo + 7, lo));
        lo += 8;
    }
    reversed
}

/// storage hands back multi-byte values with the lowest-addressed byte most significant. a
/// little-endian access wants that byte least significant instead.
pub fn fix_endian(end: Endness, expr: SymExpr) -> SymExpr {
    match end {
        Endness::LE => reverse_bytes(&expr),
        Endness::BE => expr,
    }
}

/// split `expr` into bytes in memory order for an access of byte order `end`.
pub fn to_bytes(end: Endness, expr: &SymExpr) -> Vec<SymExpr> {
    let bits = expr.bits();
    let count = (bits + 7) / 8;
    let padded = expr.resize(count * 8);
    let mut bytes: Vec<SymExpr> = (0..count).map(|i| padded.extract(i * 8 + 7, i * 8)).collect();
    if end == Endness::BE {
        bytes.reverse();
    }
    bytes
}
