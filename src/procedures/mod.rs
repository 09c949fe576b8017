//! hand-written summaries of library routines and system calls.
//!
//! a summary stands in for a function body: instead of lifting and interpreting the routine, the
//! engine marshals its arguments out of the calling convention and runs `Procedure::execute`
//! against the path's state. summaries hold no state of their own; everything they do goes
//! through the `CallContext` they're handed, so one registered summary serves every path.
//!
//! summaries compose with `inline_call`, which runs another summary's body on the same state
//! without going through a call and return.

pub mod cc;
pub mod libc;
pub mod registry;
pub mod syscalls;
pub mod types;

pub use self::cc::CallingConvention;
pub use self::registry::ProcedureRegistry;
pub use self::types::{Signature, SimType};

use tracing::{event, Level};

use config::EngineConfig;
use error::{Error, Result};
use state::SymbolicState;
use symbolic::SymExpr;

/// what a summary says about its return value.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnValue {
    Value(SymExpr),
    /// the summary does not model a return value. callers must not read anything into
    /// whatever the return register holds afterward.
    Unconstrained,
}

impl ReturnValue {
    pub fn value(&self) -> Option<&SymExpr> {
        match self {
            ReturnValue::Value(v) => Some(v),
            ReturnValue::Unconstrained => None,
        }
    }

    /// the modeled value, or a fresh variable `name` of `bits` bits standing in for it.
    pub fn materialize(&self, name: &str, bits: u32) -> SymExpr {
        match self {
            ReturnValue::Value(v) => v.clone(),
            ReturnValue::Unconstrained => SymExpr::bvs(name, bits),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureOutcome {
    pub ret_expr: ReturnValue,
}

pub struct CallContext<'s, 'c> {
    pub state: &'s mut SymbolicState,
    pub config: &'c EngineConfig,
}

impl<'s, 'c> CallContext<'s, 'c> {
    pub fn new(state: &'s mut SymbolicState, config: &'c EngineConfig) -> CallContext<'s, 'c> {
        CallContext { state, config }
    }

    /// a constant of the guest's pointer width.
    pub fn word(&self, value: u64) -> SymExpr {
        self.state.bvv(value)
    }
}

pub trait Procedure: Send + Sync {
    fn name(&self) -> &'static str;
    fn signature(&self) -> Signature;
    /// run the summary on already-marshaled `args`, one per `signature().args` entry.
    fn execute(&self, ctx: &mut CallContext, args: &[SymExpr]) -> Result<ProcedureOutcome>;
}

/// finish a summary. `None` leaves the return value unconstrained.
pub fn ret(value: Option<SymExpr>) -> Result<ProcedureOutcome> {
    let ret_expr = match value {
        Some(v) => ReturnValue::Value(v),
        None => ReturnValue::Unconstrained,
    };
    Ok(ProcedureOutcome { ret_expr })
}

/// run `procedure` on `args` against the caller's own state. nothing is saved or restored
/// around the call: the temp table and constraints change exactly as the inlined body changes
/// them, and its failures are the caller's failures.
pub fn inline_call(ctx: &mut CallContext, procedure: &dyn Procedure, args: &[SymExpr]) -> Result<ProcedureOutcome> {
    let expected = procedure.signature().args.len();
    if args.len() != expected {
        return Err(Error::InlineArgumentCount {
            procedure: procedure.name().to_string(),
            expected,
            got: args.len(),
        });
    }
    event!(Level::DEBUG, procedure = procedure.name(), "inline call");
    procedure.execute(ctx, args)
}

/// call `procedure` as if the guest had called it through `cc`: marshal its arguments, run it,
/// and write a modeled return value to the return register. an unconstrained return leaves the
/// return register alone.
pub fn invoke(ctx: &mut CallContext, procedure: &dyn Procedure, cc: &CallingConvention) -> Result<ProcedureOutcome> {
    let signature = procedure.signature();
    let args = cc.arguments(procedure.name(), &signature, ctx.state)?;
    event!(Level::DEBUG, procedure = %signature.render(procedure.name()), convention = cc.name, "invoking summary");

    let outcome = procedure.execute(ctx, &args)?;
    if signature.ret != SimType::Void {
        if let ReturnValue::Value(ref v) = outcome.ret_expr {
            cc.set_return(ctx.state, v)?;
        }
    }
    Ok(outcome)
}
