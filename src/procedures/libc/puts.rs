use error::Result;
use procedures::libc::Strlen;
use procedures::syscalls::Write;
use procedures::{inline_call, ret, CallContext, Procedure, ProcedureOutcome, Signature, SimType};
use symbolic::SymExpr;

/// `int puts(const char *s)`: the string, then a newline, on stdout.
///
/// the return value is left unconstrained. real `puts` returns a nonnegative number on success,
/// and nothing here decides which.
pub struct Puts;

impl Procedure for Puts {
    fn name(&self) -> &'static str {
        "puts"
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![SimType::String], SimType::int())
    }

    fn execute(&self, ctx: &mut CallContext, args: &[SymExpr]) -> Result<ProcedureOutcome> {
        let s = &args[0];
        let word = ctx.state.arch.bits;

        let length = inline_call(ctx, &Strlen, &[s.clone()])?
            .ret_expr
            .materialize("strlen_ret", word);
        let stdout = ctx.word(1);
        inline_call(ctx, &Write, &[stdout.clone(), s.clone(), length])?;

        let one = ctx.word(1);
        ctx.state.posix.write(&stdout, vec![SymExpr::bvv(0x0a, 8)], one)?;

        ret(None)
    }
}
