//! translation of IR expression trees into symbolic expressions.
//!
//! `Translator::translate` walks one expression tree bottom-up. every node yields a value and the
//! side conditions that value depends on; children's conditions are kept in evaluation order ahead
//! of whatever the node itself adds. translation only reads from the state.

pub mod ccall;
pub mod irop;

pub use self::ccall::CCallHelper;

use tracing::{event, Level};

use config::{CCallConstraintPolicy, EngineConfig};
use error::{Error, Result};
use helpers::{fix_endian, size_of, translate_const};
use ir::{Endness, IRConst, IRExpr, IROp, IRType};
use state::{SymbolicState, SymbolicStorage};
use symbolic::{Constraints, SymExpr};

pub struct Translator<'c> {
    config: &'c EngineConfig,
}

impl<'c> Translator<'c> {
    pub fn new(config: &'c EngineConfig) -> Translator<'c> {
        Translator { config }
    }

    /// the symbolic value of `expr` in `state`, and the constraints that value relies on.
    pub fn translate(&self, expr: &IRExpr, state: &SymbolicState) -> Result<(SymExpr, Constraints)> {
        event!(Level::DEBUG, kind = expr.kind_name(), "translating expression");
        match expr {
            IRExpr::Get { offset, ty } => self.get(*offset, *ty, state),
            IRExpr::Unop { .. } | IRExpr::Binop { .. } | IRExpr::Triop { .. } | IRExpr::Qop { .. } => {
                match expr.op_args() {
                    Some((op, args)) => self.op(op, &args, state),
                    None => Err(Error::UnsupportedExpressionKind(expr.kind_name())),
                }
            }
            IRExpr::RdTmp { tmp } => self.rdtmp(*tmp, state),
            IRExpr::Const { con } => Ok(self.constant(con)),
            IRExpr::Load { end, ty, addr } => self.load(*end, *ty, addr, state),
            IRExpr::CCall { callee, retty, args } => self.ccall(callee, *retty, args, state),
            IRExpr::Mux0X { cond, expr0, expr_x } => self.mux(cond, expr0, expr_x, state),
            IRExpr::GetI { .. } | IRExpr::Binder { .. } => {
                Err(Error::UnsupportedExpressionKind(expr.kind_name()))
            }
        }
    }

    /// translate `expr` and fold its constraints into `constraints`.
    fn translate_into(&self, expr: &IRExpr, state: &SymbolicState, constraints: &mut Constraints) -> Result<SymExpr> {
        let (value, more) = self.translate(expr, state)?;
        constraints.extend(more);
        Ok(value)
    }

    fn get(&self, offset: u64, ty: IRType, state: &SymbolicState) -> Result<(SymExpr, Constraints)> {
        let bits = size_of(ty);
        let addr = state.bvv(offset);
        state.registers.load(&addr, bits, &[])
    }

    fn op(&self, op: &IROp, args: &[&IRExpr], state: &SymbolicState) -> Result<(SymExpr, Constraints)> {
        let mut constraints = Constraints::new();
        let mut operands = Vec::with_capacity(args.len());
        for arg in args {
            operands.push(self.translate_into(arg, state, &mut constraints)?);
        }
        let (value, op_constraints) = irop::translate(op, &operands)?;
        constraints.extend(op_constraints);
        Ok((value, constraints))
    }

    fn rdtmp(&self, tmp: u32, state: &SymbolicState) -> Result<(SymExpr, Constraints)> {
        match state.temps.get(tmp) {
            Some(value) => Ok((value.clone(), Constraints::new())),
            None => Err(Error::UnboundTemporary(tmp)),
        }
    }

    fn constant(&self, con: &IRConst) -> (SymExpr, Constraints) {
        (translate_const(con), Constraints::new())
    }

    fn load(&self, end: Endness, ty: IRType, addr: &IRExpr, state: &SymbolicState) -> Result<(SymExpr, Constraints)> {
        self.load_from(&state.memory, end, ty, addr, state)
    }

    /// the path's constraints, then the address's, are what `memory` sees as known; the result
    /// lists the address's constraints ahead of the load's own.
    fn load_from<S: SymbolicStorage>(
        &self,
        memory: &S,
        end: Endness,
        ty: IRType,
        addr: &IRExpr,
        state: &SymbolicState,
    ) -> Result<(SymExpr, Constraints)> {
        let (addr, mut constraints) = self.translate(addr, state)?;
        let bits = size_of(ty);

        let mut prior = state.old_constraints.clone();
        prior.extend(constraints.iter().cloned());
        let (value, load_constraints) = memory.load(&addr, bits, &prior)?;
        event!(Level::DEBUG, %addr, requested = bits, produced = value.bits(), "memory load");

        constraints.extend(load_constraints);
        Ok((fix_endian(end, value), constraints))
    }

    fn ccall(&self, callee: &str, retty: IRType, args: &[IRExpr], state: &SymbolicState) -> Result<(SymExpr, Constraints)> {
        let mut constraints = Constraints::new();
        let mut values = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let (value, arg_constraints) = self.translate(arg, state)?;
            let keep = match self.config.ccall_constraints {
                CCallConstraintPolicy::FirstArgument => i == 0,
                CCallConstraintPolicy::AllArguments => true,
            };
            if keep {
                constraints.extend(arg_constraints);
            }
            values.push(value);
        }

        let helper = CCallHelper::from_name(callee)
            .ok_or_else(|| Error::UnsupportedCallHelper(callee.to_string()))?;
        let (value, helper_constraints) = ccall::call(helper, state, &values)?;
        constraints.extend(helper_constraints);
        Ok((value.resize(size_of(retty)), constraints))
    }

    fn mux(&self, cond: &IRExpr, expr0: &IRExpr, expr_x: &IRExpr, state: &SymbolicState) -> Result<(SymExpr, Constraints)> {
        // the condition's own constraints are not carried into either branch
        let (cond, _) = self.translate(cond, state)?;
        let (value0, constraints0) = self.translate(expr0, state)?;
        let (value_x, constraints_x) = self.translate(expr_x, state)?;

        let is_zero = cond.eq(&SymExpr::bvv(0, cond.bits()));
        let is_nonzero = is_zero.bool_not();

        let zero_branch = SymExpr::bool_and(Some(is_zero.clone()).into_iter().chain(constraints0));
        let nonzero_branch = SymExpr::bool_and(Some(is_nonzero).into_iter().chain(constraints_x));

        let mut constraints = Constraints::new();
        constraints.push(SymExpr::bool_or(vec![zero_branch, nonzero_branch]));
        Ok((SymExpr::ite(&is_zero, &value0, &value_x), constraints))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use state::ArchInfo;

    /// hands back a fixed value with a marker constraint, and remembers what it was told held.
    struct Recording {
        prior: RefCell<Vec<SymExpr>>,
        marker: SymExpr,
    }

    impl SymbolicStorage for Recording {
        fn load(&self, _addr: &SymExpr, bits: u32, prior: &[SymExpr]) -> Result<(SymExpr, Constraints)> {
            *self.prior.borrow_mut() = prior.to_vec();
            let mut constraints = Constraints::new();
            constraints.push(self.marker.clone());
            Ok((SymExpr::bvv(0x11, bits), constraints))
        }

        fn store(&mut self, _addr: &SymExpr, _value: &SymExpr) -> Result<Constraints> {
            Ok(Constraints::new())
        }
    }

    #[test]
    fn load_constraint_order() {
        let config = EngineConfig::default();
        let mut state = SymbolicState::new(ArchInfo::amd64());
        let path = SymExpr::bvs("path", 8).ult(&SymExpr::bvv(9, 8));
        state.add_constraints(vec![path.clone()]);
        let memory = Recording {
            prior: RefCell::new(Vec::new()),
            marker: SymExpr::bvs("marker", 8).eq(&SymExpr::bvv(1, 8)),
        };

        let addr = IRExpr::mux0x(
            IRExpr::get(0, IRType::I8),
            IRExpr::constant(IRConst::U64(0x1000)),
            IRExpr::constant(IRConst::U64(0x2000)),
        );
        let translator = Translator::new(&config);
        let (_, addr_constraints) = translator.translate(&addr, &state).expect("address");
        assert_eq!(addr_constraints.len(), 1);

        let (value, constraints) = translator
            .load_from(&memory, Endness::LE, IRType::I8, &addr, &state)
            .expect("load");
        assert_eq!(value.as_const(), Some(0x11));
        assert_eq!(*memory.prior.borrow(), vec![path, addr_constraints[0].clone()]);
        assert_eq!(constraints.to_vec(), vec![addr_constraints[0].clone(), memory.marker.clone()]);
    }

    #[test]
    fn register_reads_go_through_the_register_file() {
        let config = EngineConfig::default();
        let mut state = SymbolicState::new(ArchInfo::amd64());
        state.registers.store_concrete(16, &SymExpr::bvv(0xdead_beef_0000_1234, 64));
        let translator = Translator::new(&config);

        let (eax, c) = translator.translate(&IRExpr::get(16, IRType::I32), &state).expect("translate");
        assert_eq!(eax.as_const(), Some(0x0000_1234));
        assert!(c.is_empty());
    }

    #[test]
    fn unknown_helpers_are_rejected() {
        let config = EngineConfig::default();
        let state = SymbolicState::new(ArchInfo::amd64());
        let call = IRExpr::ccall("amd64g_dirtyhelper_RDTSC", IRType::I64, vec![]);
        match Translator::new(&config).translate(&call, &state) {
            Err(Error::UnsupportedCallHelper(name)) => assert_eq!(name, "amd64g_dirtyhelper_RDTSC"),
            other => panic!("expected an unsupported helper, got {:?}", other),
        }
    }

    #[test]
    fn unbound_temps_are_errors() {
        let config = EngineConfig::default();
        let state = SymbolicState::new(ArchInfo::x86());
        match Translator::new(&config).translate(&IRExpr::rdtmp(4), &state) {
            Err(Error::UnboundTemporary(4)) => {}
            other => panic!("expected an unbound temporary, got {:?}", other),
        }
    }

    #[test]
    fn operator_constraints_follow_operands() {
        let config = EngineConfig::default();
        let state = SymbolicState::new(ArchInfo::amd64());
        let mux = IRExpr::mux0x(
            IRExpr::get(0, IRType::I8),
            IRExpr::constant(IRConst::U32(1)),
            IRExpr::constant(IRConst::U32(2)),
        );
        let expr = IRExpr::binop(IROp::Add(32), mux, IRExpr::constant(IRConst::U32(10)));
        let (value, c) = Translator::new(&config).translate(&expr, &state).expect("translate");
        assert_eq!(value.bits(), 32);
        assert_eq!(c.len(), 1);
    }
}
