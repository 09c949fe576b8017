use error::Result;
use procedures::{ret, CallContext, Procedure, ProcedureOutcome, Signature, SimType};
use symbolic::SymExpr;

/// `int putchar(int c)`. writes `(unsigned char)c` to stdout and returns `c`.
pub struct Putchar;

impl Procedure for Putchar {
    fn name(&self) -> &'static str {
        "putchar"
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![SimType::int()], SimType::int())
    }

    fn execute(&self, ctx: &mut CallContext, args: &[SymExpr]) -> Result<ProcedureOutcome> {
        let c = &args[0];
        let (stdout, one) = (ctx.word(1), ctx.word(1));
        ctx.state.posix.write(&stdout, vec![c.extract(7, 0)], one)?;
        ret(Some(c.clone()))
    }
}
