use std::collections::BTreeMap;

use tracing::{event, Level};

use error::{Error, Result};
use symbolic::SymExpr;

/// one `write` to a descriptor. `data` holds the bytes available to be written, in order;
/// `length` is the requested length in bytes, possibly symbolic, and may be shorter than `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub data: Vec<SymExpr>,
    pub length: SymExpr,
}

impl WriteRecord {
    /// the written bytes, if the length and every written byte are concrete.
    pub fn concrete_bytes(&self) -> Option<Vec<u8>> {
        let length = (self.length.as_u64()? as usize).min(self.data.len());
        self.data[..length].iter().map(|b| b.as_const().map(|v| v as u8)).collect()
    }
}

/// the outside world as a process sees it, which for now is just output channels.
#[derive(Debug, Clone, Default)]
pub struct PosixState {
    files: BTreeMap<u64, Vec<WriteRecord>>,
}

impl PosixState {
    pub fn new() -> PosixState {
        PosixState::default()
    }

    /// record a write of the bytes `data` to `fd`. `fd` must be concrete.
    pub fn write(&mut self, fd: &SymExpr, data: Vec<SymExpr>, length: SymExpr) -> Result<()> {
        let fd = fd.as_u64().ok_or_else(|| Error::SymbolicDescriptor(fd.to_string()))?;
        event!(Level::DEBUG, fd, available = data.len(), %length, "posix write");
        self.files.entry(fd).or_insert_with(Vec::new).push(WriteRecord { data, length });
        Ok(())
    }

    pub fn writes(&self, fd: u64) -> &[WriteRecord] {
        self.files.get(&fd).map(|w| &w[..]).unwrap_or(&[])
    }

    pub fn stdout(&self) -> &[WriteRecord] {
        self.writes(1)
    }

    /// everything written to `fd`, if every write was concrete.
    pub fn concrete_output(&self, fd: u64) -> Option<Vec<u8>> {
        let mut out = Vec::new();
        for record in self.writes(fd) {
            out.extend(record.concrete_bytes()?);
        }
        Some(out)
    }
}
