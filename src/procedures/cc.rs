//! calling conventions: where a summary's arguments come from and where its return value goes.

use error::{Error, Result};
use helpers::fix_endian;
use procedures::types::Signature;
use state::{SymbolicState, SymbolicStorage};
use symbolic::SymExpr;

/// register offsets are VEX guest-state offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallingConvention {
    pub name: &'static str,
    pub word_bits: u32,
    arg_regs: &'static [u64],
    /// the stack pointer register, when arguments past `arg_regs` are passed on the stack.
    stack_pointer: Option<u64>,
    return_reg: u64,
}

mod amd64 {
    pub const RAX: u64 = 16;
    pub const RCX: u64 = 24;
    pub const RDX: u64 = 32;
    pub const RSI: u64 = 64;
    pub const RDI: u64 = 72;
    pub const R8: u64 = 80;
    pub const R9: u64 = 88;
    pub const R10: u64 = 96;
}

mod x86 {
    pub const EAX: u64 = 8;
    pub const ESP: u64 = 24;
}

impl CallingConvention {
    pub fn amd64_sysv() -> CallingConvention {
        use self::amd64::*;
        CallingConvention {
            name: "amd64_sysv",
            word_bits: 64,
            arg_regs: &[RDI, RSI, RDX, RCX, R8, R9],
            stack_pointer: None,
            return_reg: RAX,
        }
    }

    pub fn amd64_syscall() -> CallingConvention {
        use self::amd64::*;
        CallingConvention {
            name: "amd64_syscall",
            word_bits: 64,
            arg_regs: &[RDI, RSI, RDX, R10, R8, R9],
            stack_pointer: None,
            return_reg: RAX,
        }
    }

    /// every argument on the stack, starting just above the return address.
    pub fn x86_cdecl() -> CallingConvention {
        CallingConvention {
            name: "x86_cdecl",
            word_bits: 32,
            arg_regs: &[],
            stack_pointer: Some(x86::ESP),
            return_reg: x86::EAX,
        }
    }

    pub fn return_register(&self) -> u64 {
        self.return_reg
    }

    fn word(&self, value: u64) -> SymExpr {
        SymExpr::bvv(value as u128, self.word_bits)
    }

    fn mismatch(procedure: &str, reason: String) -> Error {
        Error::SummaryArgumentMismatch { procedure: procedure.to_string(), reason }
    }

    /// check that every argument in `sig` has somewhere to come from. this does not touch any
    /// state; `ProcedureRegistry::check` runs it over a whole library.
    pub fn check(&self, procedure: &str, sig: &Signature) -> Result<()> {
        if self.stack_pointer.is_none() && sig.args.len() > self.arg_regs.len() {
            return Err(CallingConvention::mismatch(procedure, format!(
                "{} passes at most {} arguments, signature has {}",
                self.name, self.arg_regs.len(), sig.args.len()
            )));
        }
        for (i, ty) in sig.args.iter().enumerate() {
            match ty.bits(self.word_bits) {
                None => {
                    return Err(CallingConvention::mismatch(procedure, format!("argument {} is void", i)));
                }
                Some(bits) if bits > self.word_bits => {
                    return Err(CallingConvention::mismatch(procedure, format!(
                        "argument {} ({}) does not fit a {}-bit slot", i, ty, self.word_bits
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// read the arguments for `sig` out of `state`, each at its declared width.
    pub fn arguments(&self, procedure: &str, sig: &Signature, state: &mut SymbolicState) -> Result<Vec<SymExpr>> {
        self.check(procedure, sig)?;
        let word_bytes = (self.word_bits / 8) as u64;
        let mut args = Vec::with_capacity(sig.args.len());

        for (i, ty) in sig.args.iter().enumerate() {
            let bits = ty.bits(self.word_bits).unwrap_or(self.word_bits);
            let (slot, constraints) = if let Some(reg) = self.arg_regs.get(i) {
                state.registers.load(&self.word(*reg), self.word_bits, &[])?
            } else {
                let sp_reg = self.stack_pointer.ok_or_else(|| {
                    CallingConvention::mismatch(procedure, format!("no location for argument {}", i))
                })?;
                let (sp, mut constraints) = state.registers.load(&self.word(sp_reg), self.word_bits, &[])?;
                let stack_index = (i - self.arg_regs.len()) as u64;
                let addr = sp.add(&self.word(word_bytes * (stack_index + 1)));
                let mut prior = state.old_constraints.clone();
                prior.extend(constraints.iter().cloned());
                let (raw, load_constraints) = state.memory.load(&addr, self.word_bits, &prior)?;
                constraints.extend(load_constraints);
                (fix_endian(state.arch.endness, raw), constraints)
            };
            state.add_constraints(constraints);
            args.push(slot.resize(bits));
        }
        Ok(args)
    }

    pub fn set_return(&self, state: &mut SymbolicState, value: &SymExpr) -> Result<()> {
        let constraints = state.registers.store(&self.word(self.return_reg), &value.resize(self.word_bits))?;
        state.add_constraints(constraints);
        Ok(())
    }
}
