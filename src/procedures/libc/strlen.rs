use tracing::{event, Level};

use error::{Error, Result};
use procedures::{ret, CallContext, Procedure, ProcedureOutcome, Signature, SimType};
use state::SymbolicStorage;
use symbolic::SymExpr;

/// `size_t strlen(const char *s)`.
///
/// scans `max_str_len` bytes. a concrete NUL ends the scan; each symbolic byte before it might be
/// the terminator, so the length is an if-then-else over them. while every byte so far has been
/// concrete the scan keeps going past the window, up to `max_concrete_str_len`, stopping after the
/// first symbolic byte. if no concrete NUL turns up, the path is constrained so that one of the
/// scanned bytes is NUL; a string with no byte that could be NUL is `Error::StringTooLong`.
pub struct Strlen;

impl Procedure for Strlen {
    fn name(&self) -> &'static str {
        "strlen"
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![SimType::String], SimType::SizeT)
    }

    fn execute(&self, ctx: &mut CallContext, args: &[SymExpr]) -> Result<ProcedureOutcome> {
        let s = &args[0];
        let word = ctx.state.arch.bits;
        let window = ctx.config.max_str_len as u64;
        let concrete_limit = (ctx.config.max_concrete_str_len as u64).max(window);

        let mut scanned = Vec::new();
        let mut terminated = false;
        let mut all_concrete = true;
        let mut i = 0;
        while i < window || (all_concrete && i < concrete_limit) {
            let addr = s.add(&ctx.word(i));
            let (byte, constraints) = ctx.state.memory.load(&addr, 8, &ctx.state.old_constraints)?;
            ctx.state.add_constraints(constraints);
            match byte.as_const() {
                Some(0) => {
                    terminated = true;
                    break;
                }
                Some(_) => {}
                None => all_concrete = false,
            }
            scanned.push(byte);
            i += 1;
        }

        let zero = SymExpr::bvv(0, 8);
        let mut length = SymExpr::bvv(scanned.len() as u128, word);
        for (i, byte) in scanned.iter().enumerate().rev() {
            length = SymExpr::ite(&byte.eq(&zero), &SymExpr::bvv(i as u128, word), &length);
        }

        if !terminated && !scanned.is_empty() {
            let some_nul = SymExpr::bool_or(scanned.iter().map(|b| b.eq(&zero)));
            if some_nul.as_bool() == Some(false) {
                return Err(Error::StringTooLong { address: s.to_string(), scanned: scanned.len() });
            }
            ctx.state.add_constraints(Some(some_nul));
        }
        event!(Level::DEBUG, scanned = scanned.len(), terminated, %length, "strlen");

        ret(Some(length))
    }
}
