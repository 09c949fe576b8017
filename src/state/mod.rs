//! per-path symbolic state.
//!
//! a `SymbolicState` belongs to exactly one path. forking a path clones the state; nothing in it
//! is shared between paths except immutable `SymExpr` nodes.

pub mod posix;
pub mod storage;

pub use self::posix::{PosixState, WriteRecord};
pub use self::storage::{ByteStore, SymbolicStorage};

use tracing::{event, Level};

use ir::Endness;
use symbolic::SymExpr;

/// the few facts about a guest architecture the translator and summaries need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchInfo {
    pub name: &'static str,
    /// pointer and register width.
    pub bits: u32,
    pub endness: Endness,
}

impl ArchInfo {
    pub fn amd64() -> ArchInfo {
        ArchInfo { name: "AMD64", bits: 64, endness: Endness::LE }
    }

    pub fn x86() -> ArchInfo {
        ArchInfo { name: "X86", bits: 32, endness: Endness::LE }
    }

    pub fn bytes(&self) -> u32 {
        self.bits / 8
    }
}

/// values of the current instruction's IR temporaries.
#[derive(Debug, Clone, Default)]
pub struct TempTable {
    temps: Vec<Option<SymExpr>>,
}

impl TempTable {
    pub fn get(&self, tmp: u32) -> Option<&SymExpr> {
        self.temps.get(tmp as usize).and_then(|t| t.as_ref())
    }

    pub fn bind(&mut self, tmp: u32, value: SymExpr) {
        let idx = tmp as usize;
        if self.temps.len() <= idx {
            self.temps.resize(idx + 1, None);
        }
        self.temps[idx] = Some(value);
    }

    /// forget every temp. called between instructions.
    pub fn clear(&mut self) {
        self.temps.clear();
    }

    pub fn bound(&self) -> usize {
        self.temps.iter().filter(|t| t.is_some()).count()
    }
}

#[derive(Debug, Clone)]
pub struct SymbolicState {
    pub arch: ArchInfo,
    pub registers: ByteStore,
    pub memory: ByteStore,
    pub temps: TempTable,
    /// constraints accumulated along this path so far.
    pub old_constraints: Vec<SymExpr>,
    pub posix: PosixState,
}

impl SymbolicState {
    pub fn new(arch: ArchInfo) -> SymbolicState {
        SymbolicState {
            arch,
            registers: ByteStore::new("reg", arch.endness),
            memory: ByteStore::new("mem", Endness::BE),
            temps: TempTable::default(),
            old_constraints: Vec::new(),
            posix: PosixState::new(),
        }
    }

    /// a constant of pointer width.
    pub fn bvv(&self, value: u64) -> SymExpr {
        SymExpr::bvv(value as u128, self.arch.bits)
    }

    pub fn add_constraints<I: IntoIterator<Item = SymExpr>>(&mut self, constraints: I) {
        for c in constraints {
            // trivially true constraints carry nothing
            if c.as_bool() != Some(true) {
                self.old_constraints.push(c);
            }
        }
    }

    /// an independent copy of this state for a diverging path.
    pub fn fork(&self) -> SymbolicState {
        event!(Level::DEBUG, constraints = self.old_constraints.len(), "forking state");
        self.clone()
    }
}
