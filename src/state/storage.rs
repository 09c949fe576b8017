use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;
use tracing::{event, Level};

use error::{Error, Result};
use helpers::to_bytes;
use ir::Endness;
use symbolic::{CmpOp, Constraints, Node, SymExpr, MAX_BITS};

/// the register file and memory, as the translator sees them.
///
/// `addr` may be fully symbolic; what to do about that is up to the implementation. `prior` is
/// the set of constraints known to hold on the path at the time of the access, which an
/// implementation may use to pin down a symbolic address. loads do not modify storage.
pub trait SymbolicStorage {
    fn load(&self, addr: &SymExpr, bits: u32, prior: &[SymExpr]) -> Result<(SymExpr, Constraints)>;
    fn store(&mut self, addr: &SymExpr, value: &SymExpr) -> Result<Constraints>;
}

/// byte-granular storage. values wider than a byte are split on store and reassembled on load in
/// `order`: with `Endness::LE` the byte at the lowest address is least significant, with
/// `Endness::BE` it is most significant.
///
/// the register file is a `ByteStore` in the guest's byte order, so that reading `eax` out of a
/// previously written `rax` sees the right bytes. memory is a `ByteStore` in `BE` order, raw
/// address order, and byte order of a particular access is applied by whoever issued it.
///
/// bytes that were never written read as variables named for their location, `mem_1000` for the
/// byte at `0x1000`, so repeated reads of the same untouched byte agree with each other.
#[derive(Debug, Clone)]
pub struct ByteStore {
    name: &'static str,
    order: Endness,
    bytes: BTreeMap<u64, SymExpr>,
}

impl ByteStore {
    pub fn new(name: &'static str, order: Endness) -> ByteStore {
        ByteStore { name, order, bytes: BTreeMap::new() }
    }

    pub fn byte_at(&self, addr: u64) -> SymExpr {
        match self.bytes.get(&addr) {
            Some(b) => b.clone(),
            None => SymExpr::bvs(format!("{}_{:x}", self.name, addr), 8),
        }
    }

    /// write raw bytes starting at `addr`.
    pub fn store_bytes(&mut self, addr: u64, data: &[u8]) {
        for (i, b) in data.iter().enumerate() {
            self.bytes.insert(addr.wrapping_add(i as u64), SymExpr::bvv(*b as u128, 8));
        }
    }

    pub fn load_concrete(&self, addr: u64, bits: u32) -> Result<SymExpr> {
        if bits > MAX_BITS {
            return Err(Error::LoadTooWide(bits));
        }
        let count = ((bits + 7) / 8) as u64;
        let mut value: Option<SymExpr> = None;
        for i in 0..count {
            let byte = self.byte_at(addr.wrapping_add(i));
            value = Some(match (value, self.order) {
                (None, _) => byte,
                (Some(acc), Endness::BE) => acc.concat(&byte),
                (Some(acc), Endness::LE) => byte.concat(&acc),
            });
        }
        let value = value.unwrap_or_else(|| SymExpr::bvv(0, 8));
        Ok(value.resize(bits))
    }

    pub fn store_concrete(&mut self, addr: u64, value: &SymExpr) {
        let mut bytes = to_bytes(Endness::LE, value);
        if self.order == Endness::BE {
            bytes.reverse();
        }
        for (i, b) in bytes.into_iter().enumerate() {
            self.bytes.insert(addr.wrapping_add(i as u64), b);
        }
    }

    /// a stable stand-in for a load we cannot place: same address expression, same variable.
    fn unresolved(&self, addr: &SymExpr, bits: u32) -> SymExpr {
        let mut hasher = SipHasher13::new();
        addr.hash(&mut hasher);
        SymExpr::bvs(format!("{}_sym_{:016x}_{}", self.name, hasher.finish(), bits), bits)
    }
}

/// a concrete address for `addr`: either it folds to a constant, or some prior constraint
/// states `addr == constant`.
pub fn resolve_address(addr: &SymExpr, prior: &[SymExpr]) -> Option<u64> {
    if let Some(a) = addr.as_u64() {
        return Some(a);
    }
    for c in prior {
        if let Node::Compare(CmpOp::Eq, l, r) = c.node() {
            if l == addr {
                if let Some(a) = r.as_u64() {
                    return Some(a);
                }
            }
            if r == addr {
                if let Some(a) = l.as_u64() {
                    return Some(a);
                }
            }
        }
    }
    None
}

impl SymbolicStorage for ByteStore {
    fn load(&self, addr: &SymExpr, bits: u32, prior: &[SymExpr]) -> Result<(SymExpr, Constraints)> {
        if bits > MAX_BITS {
            return Err(Error::LoadTooWide(bits));
        }
        match resolve_address(addr, prior) {
            Some(a) => Ok((self.load_concrete(a, bits)?, Constraints::new())),
            None => {
                event!(Level::WARN, store = self.name, %addr, "load from unresolved symbolic address");
                Ok((self.unresolved(addr, bits), Constraints::new()))
            }
        }
    }

    fn store(&mut self, addr: &SymExpr, value: &SymExpr) -> Result<Constraints> {
        match resolve_address(addr, &[]) {
            Some(a) => {
                self.store_concrete(a, value);
                Ok(Constraints::new())
            }
            None => Err(Error::SymbolicAddress(addr.to_string())),
        }
    }
}
