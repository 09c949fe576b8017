#[macro_use]
extern crate proptest;
extern crate yaxpeax_symex;

use proptest::prelude::*;

use yaxpeax_symex::config::{CCallConstraintPolicy, EngineConfig};
use yaxpeax_symex::ir::{Endness, IRConst, IRExpr, IROp, IRRegArray, IRType};
use yaxpeax_symex::solver::{EnumerationSolver, Solver};
use yaxpeax_symex::state::{ArchInfo, SymbolicState};
use yaxpeax_symex::symbolic::{Model, Node, SymExpr};
use yaxpeax_symex::{Error, Translator};

fn amd64() -> SymbolicState {
    SymbolicState::new(ArchInfo::amd64())
}

fn c32(v: u32) -> IRExpr {
    IRExpr::constant(IRConst::U32(v))
}

fn c64(v: u64) -> IRExpr {
    IRExpr::constant(IRConst::U64(v))
}

fn evaluate(expr: &IRExpr) -> Option<u128> {
    let config = EngineConfig::default();
    let (value, constraints) = Translator::new(&config).translate(expr, &amd64()).ok()?;
    assert!(constraints.is_empty());
    value.eval(&Model::new()).and_then(|v| v.as_u128())
}

proptest! {
    #[test]
    fn constants_are_reduced_to_their_width(v in any::<u64>()) {
        let cases = vec![
            (IRConst::U8(v as u8), 8u32),
            (IRConst::U16(v as u16), 16),
            (IRConst::U32(v as u32), 32),
            (IRConst::U64(v), 64),
            (IRConst::U1(v & 1 == 1), 1),
        ];
        let config = EngineConfig::default();
        let state = amd64();
        for (con, bits) in cases {
            let (value, constraints) = Translator::new(&config)
                .translate(&IRExpr::constant(con), &state)
                .expect("constants always translate");
            prop_assert!(constraints.is_empty());
            prop_assert_eq!(value.bits(), bits);
            let mask = if bits == 64 { u64::max_value() } else { (1u64 << bits) - 1 };
            prop_assert_eq!(value.as_const(), Some((v & mask) as u128));
        }
    }

    #[test]
    fn constant_operators_match_machine_arithmetic(a in any::<u32>(), b in any::<u32>()) {
        let bin = |op: IROp| evaluate(&IRExpr::binop(op, c32(a), c32(b)));
        prop_assert_eq!(bin(IROp::Add(32)), Some(a.wrapping_add(b) as u128));
        prop_assert_eq!(bin(IROp::Sub(32)), Some(a.wrapping_sub(b) as u128));
        prop_assert_eq!(bin(IROp::Mul(32)), Some(a.wrapping_mul(b) as u128));
        prop_assert_eq!(bin(IROp::And(32)), Some((a & b) as u128));
        prop_assert_eq!(bin(IROp::Or(32)), Some((a | b) as u128));
        prop_assert_eq!(bin(IROp::Xor(32)), Some((a ^ b) as u128));
        prop_assert_eq!(bin(IROp::CmpLTU(32)), Some((a < b) as u128));
        prop_assert_eq!(bin(IROp::CmpLTS(32)), Some(((a as i32) < (b as i32)) as u128));
        prop_assert_eq!(bin(IROp::MullU(32)), Some((a as u64 * b as u64) as u128));
        if b != 0 {
            prop_assert_eq!(bin(IROp::DivU(32)), Some((a / b) as u128));
        }

        let shift = IRExpr::constant(IRConst::U8((b % 32) as u8));
        prop_assert_eq!(
            evaluate(&IRExpr::binop(IROp::Shl(32), c32(a), shift.clone())),
            Some(a.wrapping_shl(b % 32) as u128)
        );
        prop_assert_eq!(
            evaluate(&IRExpr::binop(IROp::Sar(32), c32(a), shift)),
            Some(((a as i32) >> (b % 32)) as u32 as u128)
        );
        prop_assert_eq!(
            evaluate(&IRExpr::unop(IROp::Not(32), c32(a))),
            Some(!a as u128)
        );
    }
}

#[test]
fn mux_branches_are_exclusive() {
    let config = EngineConfig::default();
    let state = amd64();
    let mux = IRExpr::mux0x(IRExpr::get(0, IRType::I8), c64(0x10), c64(0x20));

    let (value, constraints) = Translator::new(&config).translate(&mux, &state).expect("mux");
    assert_eq!(constraints.len(), 1);
    let (zero_branch, nonzero_branch) = match constraints[0].node() {
        Node::Or(terms) if terms.len() == 2 => (terms[0].clone(), terms[1].clone()),
        other => panic!("expected a two-way disjunction, got {:?}", other),
    };

    let cond = SymExpr::bvs("reg_0", 8);
    let solver = EnumerationSolver::default();
    let forced_zero = cond.eq(&SymExpr::bvv(0, 8));
    let forced_nonzero = cond.eq(&SymExpr::bvv(5, 8));

    assert!(solver.check(&[forced_zero.clone(), nonzero_branch.clone()]).is_unsat());
    assert!(solver.check(&[forced_zero.clone(), zero_branch.clone()]).is_sat());
    assert!(solver.check(&[forced_nonzero.clone(), zero_branch]).is_unsat());
    assert!(solver.check(&[forced_nonzero, nonzero_branch]).is_sat());

    let mut model = Model::new();
    model.insert("reg_0".to_string(), 0);
    assert_eq!(value.eval(&model).and_then(|v| v.as_u128()), Some(0x10));
    model.insert("reg_0".to_string(), 3);
    assert_eq!(value.eval(&model).and_then(|v| v.as_u128()), Some(0x20));
}

#[cfg(feature = "z3")]
#[test]
fn mux_branches_are_exclusive_at_register_width() {
    use yaxpeax_symex::solver::Z3Solver;

    let config = EngineConfig::default();
    let state = amd64();
    let translator = Translator::new(&config);
    let solver = Z3Solver::new();

    for &(ty, bits) in &[(IRType::I32, 32u32), (IRType::I64, 64)] {
        let cond_ir = IRExpr::get(16, ty);
        let (cond, _) = translator.translate(&cond_ir, &state).expect("get");
        let mux = IRExpr::mux0x(cond_ir, c64(0x10), c64(0x20));
        let (value, constraints) = translator.translate(&mux, &state).expect("mux");
        assert_eq!(constraints.len(), 1);
        let (zero_branch, nonzero_branch) = match constraints[0].node() {
            Node::Or(terms) if terms.len() == 2 => (terms[0].clone(), terms[1].clone()),
            other => panic!("expected a two-way disjunction, got {:?}", other),
        };

        let forced_zero = cond.eq(&SymExpr::bvv(0, bits));
        let forced_high = cond.eq(&SymExpr::bvv(1 << (bits - 1), bits));
        assert!(solver.check(&[forced_zero.clone(), nonzero_branch.clone()]).is_unsat());
        assert!(solver.check(&[forced_zero.clone(), zero_branch.clone()]).is_sat());
        assert!(solver.check(&[forced_high.clone(), zero_branch]).is_unsat());
        assert!(solver.check(&[forced_high.clone(), nonzero_branch]).is_sat());

        // under either forcing the value is pinned to its arm
        let other_than_arm = value.ne(&SymExpr::bvv(0x10, 64));
        assert!(solver.check(&[forced_zero, constraints[0].clone(), other_than_arm]).is_unsat());
        let other_than_arm = value.ne(&SymExpr::bvv(0x20, 64));
        assert!(solver.check(&[forced_high, constraints[0].clone(), other_than_arm]).is_unsat());
    }
}

#[test]
fn mux_carries_branch_constraints() {
    let config = EngineConfig::default();
    let state = amd64();
    let inner = IRExpr::mux0x(IRExpr::get(1, IRType::I8), c32(1), c32(2));
    let outer = IRExpr::mux0x(IRExpr::get(0, IRType::I8), inner, c32(3));

    let (_, constraints) = Translator::new(&config).translate(&outer, &state).expect("mux");
    assert_eq!(constraints.len(), 1);
    let zero_branch = match constraints[0].node() {
        Node::Or(terms) => terms[0].clone(),
        other => panic!("expected a disjunction, got {:?}", other),
    };
    // the outer zero branch holds both the outer condition and the inner mux's disjunction
    match zero_branch.node() {
        Node::And(terms) => assert_eq!(terms.len(), 2),
        other => panic!("expected a conjunction, got {:?}", other),
    }
}

#[test]
fn temp_reads_share_the_bound_expression() {
    let config = EngineConfig::default();
    let mut state = amd64();
    let bound = SymExpr::bvs("t7", 32).add(&SymExpr::bvv(1, 32));
    state.temps.bind(7, bound.clone());

    let translator = Translator::new(&config);
    let (first, c1) = translator.translate(&IRExpr::rdtmp(7), &state).expect("rdtmp");
    let (second, c2) = translator.translate(&IRExpr::rdtmp(7), &state).expect("rdtmp");
    assert!(first.ptr_eq(&bound));
    assert!(second.ptr_eq(&first));
    assert!(c1.is_empty());
    assert!(c2.is_empty());
}

#[test]
fn unsupported_kinds_leave_state_alone() {
    let config = EngineConfig::default();
    let mut state = amd64();
    state.temps.bind(0, SymExpr::bvv(1, 64));
    state.memory.store_bytes(0x100, &[0xaa]);
    state.add_constraints(vec![SymExpr::bvs("x", 8).ult(&SymExpr::bvv(3, 8))]);

    let get_i = IRExpr::GetI {
        descr: IRRegArray { base: 0x400, elem_ty: IRType::I64, n_elems: 8 },
        ix: Box::new(c32(0)),
        bias: 0,
    };
    let translator = Translator::new(&config);
    match translator.translate(&get_i, &state) {
        Err(Error::UnsupportedExpressionKind(kind)) => assert_eq!(kind, "Iex_GetI"),
        other => panic!("expected an unsupported kind, got {:?}", other),
    }
    match translator.translate(&IRExpr::Binder { binder: 2 }, &state) {
        Err(Error::UnsupportedExpressionKind(kind)) => assert_eq!(kind, "Iex_Binder"),
        other => panic!("expected an unsupported kind, got {:?}", other),
    }

    assert_eq!(state.temps.bound(), 1);
    assert_eq!(state.old_constraints.len(), 1);
    assert_eq!(state.memory.byte_at(0x100).as_const(), Some(0xaa));
}

#[test]
fn unsupported_operators_are_reported_by_name() {
    let config = EngineConfig::default();
    let expr = IRExpr::binop(IROp::parse("Iop_Add32Fx4"), c32(1), c32(2));
    match Translator::new(&config).translate(&expr, &amd64()) {
        Err(Error::UnsupportedOperator(name)) => assert_eq!(name, "Iop_Add32Fx4"),
        other => panic!("expected an unsupported operator, got {:?}", other),
    }
}

#[test]
fn loads_respect_declared_byte_order() {
    let config = EngineConfig::default();
    let mut state = amd64();
    state.memory.store_bytes(0x1000, &[0x01, 0x02, 0x03, 0x04]);
    let translator = Translator::new(&config);

    let le = IRExpr::load(Endness::LE, IRType::I32, c64(0x1000));
    let be = IRExpr::load(Endness::BE, IRType::I32, c64(0x1000));
    let (v_le, c_le) = translator.translate(&le, &state).expect("le load");
    let (v_be, c_be) = translator.translate(&be, &state).expect("be load");
    assert_eq!(v_le.as_const(), Some(0x0403_0201));
    assert_eq!(v_be.as_const(), Some(0x0102_0304));
    assert!(c_le.is_empty() && c_be.is_empty());
}

#[test]
fn loads_through_pinned_symbolic_addresses() {
    let config = EngineConfig::default();
    let mut state = amd64();
    state.memory.store_bytes(0x2000, &[0xef, 0xbe]);
    let translator = Translator::new(&config);

    let rdi = IRExpr::get(72, IRType::I64);
    let (addr, _) = translator.translate(&rdi, &state).expect("get");
    assert!(!addr.is_concrete());
    state.add_constraints(vec![addr.eq(&SymExpr::bvv(0x2000, 64))]);

    let (value, _) = translator
        .translate(&IRExpr::load(Endness::LE, IRType::I16, rdi), &state)
        .expect("load");
    assert_eq!(value.as_const(), Some(0xbeef));
}

#[test]
fn ccall_constraint_policy() {
    const COND_Z: u64 = 4;
    const CC_OP_SUBQ: u64 = 8;
    // equal arms: the value folds to 5, but the mux still emits its constraint
    let dep1 = IRExpr::mux0x(IRExpr::get(0, IRType::I8), c64(5), c64(5));
    let call = IRExpr::ccall(
        "amd64g_calculate_condition",
        IRType::I64,
        vec![c64(COND_Z), c64(CC_OP_SUBQ), dep1, c64(5), c64(0)],
    );
    let state = amd64();

    let first_only = EngineConfig::default();
    let (value, constraints) = Translator::new(&first_only).translate(&call, &state).expect("ccall");
    assert_eq!(value.as_const(), Some(1));
    assert!(constraints.is_empty());

    let mut all = EngineConfig::default();
    all.ccall_constraints = CCallConstraintPolicy::AllArguments;
    let (value, constraints) = Translator::new(&all).translate(&call, &state).expect("ccall");
    assert_eq!(value.as_const(), Some(1));
    assert_eq!(constraints.len(), 1);
}

#[test]
fn ccall_keeps_argument_constraints_ahead_of_the_helpers() {
    // equal arms fold each argument to a constant, but each mux still emits its constraint
    let cond = IRExpr::mux0x(IRExpr::get(0, IRType::I8), c64(4), c64(4));
    let dep1 = IRExpr::mux0x(IRExpr::get(1, IRType::I8), c64(5), c64(5));
    let cc_op = IRExpr::get(32, IRType::I64);
    let call = IRExpr::ccall(
        "amd64g_calculate_condition",
        IRType::I64,
        vec![cond.clone(), cc_op, dep1.clone(), c64(5), c64(0)],
    );
    let state = amd64();

    let first_only = EngineConfig::default();
    let translator = Translator::new(&first_only);
    let (_, cond_constraints) = translator.translate(&cond, &state).expect("cond");
    let (_, dep1_constraints) = translator.translate(&dep1, &state).expect("dep1");
    assert_eq!(cond_constraints.len(), 1);
    assert_eq!(dep1_constraints.len(), 1);

    let (_, constraints) = translator.translate(&call, &state).expect("ccall");
    assert_eq!(constraints.len(), 2);
    assert_eq!(constraints[0], cond_constraints[0]);
    let helper_constraint = constraints[1].clone();
    match helper_constraint.node() {
        // one case per modeled cc_op
        Node::Or(cases) => assert!(cases.len() > 2),
        other => panic!("expected the cc_op case split, got {:?}", other),
    }

    let mut all = EngineConfig::default();
    all.ccall_constraints = CCallConstraintPolicy::AllArguments;
    let (_, constraints) = Translator::new(&all).translate(&call, &state).expect("ccall");
    assert_eq!(
        constraints.to_vec(),
        vec![cond_constraints[0].clone(), dep1_constraints[0].clone(), helper_constraint]
    );
}

#[test]
fn loads_through_constraint_bearing_addresses() {
    let config = EngineConfig::default();
    let mut state = amd64();
    state.memory.store_bytes(0x3000, &[0x34, 0x12]);
    let translator = Translator::new(&config);

    let rdi = IRExpr::get(72, IRType::I64);
    let (rdi_value, _) = translator.translate(&rdi, &state).expect("get");
    state.add_constraints(vec![rdi_value.eq(&SymExpr::bvv(0x3000, 64))]);

    // both arms read rdi, so the address is rdi itself and carries the mux's constraint
    let addr = IRExpr::mux0x(IRExpr::get(0, IRType::I8), rdi.clone(), rdi);
    let (_, addr_constraints) = translator.translate(&addr, &state).expect("address");
    let (value, constraints) = translator
        .translate(&IRExpr::load(Endness::LE, IRType::I16, addr), &state)
        .expect("load");
    assert_eq!(value.as_const(), Some(0x1234));
    assert_eq!(constraints.to_vec(), addr_constraints.to_vec());
    assert_eq!(constraints.len(), 1);
}

#[test]
fn json_trees_translate() {
    let text = r#"{
        "tag": "Iex_Binop",
        "op": "Iop_Add64",
        "arg1": { "tag": "Iex_Get", "offset": 16, "ty": "Ity_I64" },
        "arg2": { "tag": "Iex_Const", "con": { "Ico_U64": 8 } }
    }"#;
    let expr = IRExpr::from_json(text).expect("valid ir");
    let config = EngineConfig::default();
    let mut state = amd64();
    state.registers.store_concrete(16, &SymExpr::bvv(0x100, 64));

    let (value, _) = Translator::new(&config).translate(&expr, &state).expect("translate");
    assert_eq!(value.as_const(), Some(0x108));

    match IRExpr::from_json(r#"{ "tag": "Iex_Nope" }"#) {
        Err(Error::MalformedIr(_)) => {}
        other => panic!("expected malformed ir, got {:?}", other),
    }
}
