//! symbolic execution over VEX-style lifted IR.
//!
//! `translate` turns IR expression trees into `symbolic` formulas and the constraints they carry,
//! reading registers and memory out of a per-path `state::SymbolicState`. `procedures` holds
//! hand-written summaries that stand in for library routines and system calls.

extern crate siphasher;
#[macro_use] extern crate serde_derive;
extern crate serde;
extern crate serde_json;
extern crate smallvec;
extern crate thiserror;
extern crate tracing;
#[cfg(feature = "z3")]
extern crate z3;

pub mod config;
pub mod error;
pub mod helpers;
pub mod ir;
pub mod procedures;
pub mod solver;
pub mod state;
pub mod symbolic;
pub mod translate;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use state::SymbolicState;
pub use symbolic::SymExpr;
pub use translate::Translator;
