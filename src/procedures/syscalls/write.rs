use error::{Error, Result};
use procedures::{ret, CallContext, Procedure, ProcedureOutcome, Signature, SimType};
use state::SymbolicStorage;
use symbolic::SymExpr;

/// `ssize_t write(int fd, const void *buf, size_t count)`.
///
/// records the bytes at `buf` on `fd`'s output channel. a concrete `count` records exactly that
/// many bytes, and is refused past `max_write_bytes`. a symbolic `count` records
/// `max_buffer_bytes` bytes with the symbolic length attached to the record. the return value
/// is not modeled.
pub struct Write;

impl Procedure for Write {
    fn name(&self) -> &'static str {
        "write"
    }

    fn signature(&self) -> Signature {
        Signature::new(
            vec![SimType::int(), SimType::pointer_to(SimType::Void), SimType::SizeT],
            SimType::SizeT,
        )
    }

    fn execute(&self, ctx: &mut CallContext, args: &[SymExpr]) -> Result<ProcedureOutcome> {
        let (fd, buf, count) = (&args[0], &args[1], &args[2]);
        let available = match count.as_u64() {
            Some(n) if n > ctx.config.max_write_bytes as u64 => {
                return Err(Error::WriteTooLong { count: n, limit: ctx.config.max_write_bytes });
            }
            Some(n) => n,
            None => ctx.config.max_buffer_bytes as u64,
        };

        let mut data = Vec::with_capacity(available as usize);
        for i in 0..available {
            let addr = buf.add(&ctx.word(i));
            let (byte, constraints) = ctx.state.memory.load(&addr, 8, &ctx.state.old_constraints)?;
            ctx.state.add_constraints(constraints);
            data.push(byte);
        }
        ctx.state.posix.write(fd, data, count.clone())?;

        ret(None)
    }
}
