use thiserror::Error;

/// every failure this crate reports. none of these are recovered from internally: a partially
/// supported expression or a misconfigured summary leaves the path state unsound, so the error
/// travels up to whoever is driving the path and they decide whether to drop it.
#[derive(Debug, Error)]
pub enum Error {
    /// an IR node kind the translator does not handle.
    #[error("unsupported expression kind {0}")]
    UnsupportedExpressionKind(&'static str),

    #[error("unsupported operator {0}")]
    UnsupportedOperator(String),

    #[error("operator {op} takes {expected} operands, got {got}")]
    OperatorArity { op: String, expected: usize, got: usize },

    /// a `CCall` naming a helper with no emulation.
    #[error("unsupported call helper {0}")]
    UnsupportedCallHelper(String),

    #[error("call helper {helper} takes {expected} arguments, got {got}")]
    CallHelperArity { helper: &'static str, expected: usize, got: usize },

    /// a concrete flag-thunk operation outside the modeled set.
    #[error("{helper}: unsupported flag thunk operation {cc_op}")]
    UnsupportedFlagThunk { helper: &'static str, cc_op: u64 },

    /// a temp read before the temp was written. this is a lifter or interpreter bug.
    #[error("read of unbound temporary t{0}")]
    UnboundTemporary(u32),

    #[error("{0}-bit load exceeds the widest supported value")]
    LoadTooWide(u32),

    #[error("cannot resolve symbolic address {0}")]
    SymbolicAddress(String),

    /// a string with no terminator among the bytes a summary was willing to scan.
    #[error("no terminator within {scanned} concrete bytes of {address}")]
    StringTooLong { address: String, scanned: usize },

    #[error("write of {count} bytes exceeds the {limit}-byte limit")]
    WriteTooLong { count: u64, limit: u32 },

    #[error("cannot resolve symbolic file descriptor {0}")]
    SymbolicDescriptor(String),

    /// a summary's declared signature cannot be read out of the calling convention.
    #[error("cannot marshal arguments for {procedure}: {reason}")]
    SummaryArgumentMismatch { procedure: String, reason: String },

    #[error("inline call to {procedure} with {got} arguments, expected {expected}")]
    InlineArgumentCount { procedure: String, expected: usize, got: usize },

    #[error("malformed ir: {0}")]
    MalformedIr(#[source] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
