//! summaries for system calls, registered under the pseudo-library `syscalls`.

mod write;

pub use self::write::Write;

pub const LIBRARY: &str = "syscalls";

#[cfg(test)]
mod tests {
    use super::*;
    use config::EngineConfig;
    use error::Error;
    use procedures::{inline_call, CallContext, ReturnValue};
    use state::{ArchInfo, SymbolicState};
    use symbolic::SymExpr;

    #[test]
    fn write_records_the_buffer() {
        let config = EngineConfig::default();
        let mut state = SymbolicState::new(ArchInfo::amd64());
        state.memory.store_bytes(0x3000, b"data");
        let outcome = {
            let mut ctx = CallContext::new(&mut state, &config);
            let args = [SymExpr::bvv(2, 32), SymExpr::bvv(0x3000, 64), SymExpr::bvv(3, 64)];
            inline_call(&mut ctx, &Write, &args).expect("write")
        };
        assert_eq!(outcome.ret_expr, ReturnValue::Unconstrained);
        assert_eq!(state.posix.concrete_output(2), Some(b"dat".to_vec()));
    }

    #[test]
    fn symbolic_counts_record_a_capped_buffer() {
        let mut config = EngineConfig::default();
        config.max_buffer_bytes = 8;
        let mut state = SymbolicState::new(ArchInfo::amd64());
        {
            let mut ctx = CallContext::new(&mut state, &config);
            let args = [SymExpr::bvv(1, 32), SymExpr::bvv(0x3000, 64), SymExpr::bvs("n", 64)];
            inline_call(&mut ctx, &Write, &args).expect("write");
        }
        let record = &state.posix.stdout()[0];
        assert_eq!(record.data.len(), 8);
        assert!(!record.length.is_concrete());
    }

    #[test]
    fn concrete_counts_are_recorded_in_full() {
        let config = EngineConfig::default();
        let mut state = SymbolicState::new(ArchInfo::amd64());
        let buf: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
        state.memory.store_bytes(0x8000, &buf);
        {
            let mut ctx = CallContext::new(&mut state, &config);
            let args = [SymExpr::bvv(1, 32), SymExpr::bvv(0x8000, 64), SymExpr::bvv(300, 64)];
            inline_call(&mut ctx, &Write, &args).expect("write");
        }
        assert_eq!(state.posix.stdout()[0].data.len(), 300);
        assert_eq!(state.posix.concrete_output(1), Some(buf));
    }

    #[test]
    fn oversized_concrete_counts_are_refused() {
        let mut config = EngineConfig::default();
        config.max_write_bytes = 16;
        let mut state = SymbolicState::new(ArchInfo::amd64());
        let result = {
            let mut ctx = CallContext::new(&mut state, &config);
            let args = [SymExpr::bvv(1, 32), SymExpr::bvv(0x8000, 64), SymExpr::bvv(17, 64)];
            inline_call(&mut ctx, &Write, &args)
        };
        match result {
            Err(Error::WriteTooLong { count, limit }) => assert_eq!((count, limit), (17, 16)),
            other => panic!("expected an oversized write, got {:?}", other),
        }
        assert!(state.posix.stdout().is_empty());
    }
}
