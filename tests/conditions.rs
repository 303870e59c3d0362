//! Tabular coverage of every [`Condition`] against a fixed flag register,
//! the same "feed one table of inputs through one assertion body" shape
//! `interpreter/alu.rs`'s own opcode table tests use, here driven by
//! `test-case` instead of a hand-rolled loop.

use test_case::test_case;
use x86_symex_core::ast::{
    AstNode,
    BinaryOp,
    UnaryOp,
};
use x86_symex_core::opcode::Condition;
use x86_symex_core::register::FlagId;
use x86_symex_core::state::{
    ExpressionId,
    SymbolicState,
};

/// Evaluate a 1-bit AST built entirely from constants, flag `Ref`s, and the
/// handful of operators [`x86_symex_core::control_flow::evaluate_condition`]
/// uses, down to its concrete bit. This is a test-only evaluator, not a
/// general one — the crate itself never collapses an AST to a value, that
/// is left for a downstream solver or concrete emulator.
fn eval_bit(state: &SymbolicState, node: &AstNode) -> u128 {
    match node {
        AstNode::Const { value, .. } => *value,
        AstNode::Ref { expr_id, .. } => {
            let expr = state.expression(ExpressionId(*expr_id)).expect("referenced expression exists");
            eval_bit(state, &expr.node)
        }
        AstNode::Unary { op: UnaryOp::BvNot, child } => 1 - eval_bit(state, child),
        AstNode::Binary { op, lhs, rhs } => {
            let l = eval_bit(state, lhs);
            let r = eval_bit(state, rhs);
            match op {
                BinaryOp::BvXor => l ^ r,
                BinaryOp::BvOr => l | r,
                BinaryOp::Equal => u128::from(l == r),
                other => panic!("unexpected operator in a condition AST: {other:?}"),
            }
        }
        other => panic!("unexpected node in a condition AST: {other}"),
    }
}

/// CF=0, PF=1, AF=0, ZF=0, SF=1, OF=0 — a result that is negative and has
/// even parity, carries nothing, and did not overflow signed arithmetic.
fn session_with_fixed_flags() -> SymbolicState {
    let mut state = SymbolicState::new(true, 64, 0);
    let mut txn = state.begin();
    let flags = [
        (FlagId::Cf, 0u128),
        (FlagId::Pf, 1),
        (FlagId::Af, 0),
        (FlagId::Zf, 0),
        (FlagId::Sf, 1),
        (FlagId::Of, 0),
    ];
    for (flag, value) in flags {
        let node = txn.ast().const_(value, 1).unwrap();
        txn.create_symbolic_flag_expression(0, node, flag, "seed");
    }
    txn.commit();
    state
}

#[test_case(Condition::Overflow, false)]
#[test_case(Condition::NotOverflow, true)]
#[test_case(Condition::Below, false)]
#[test_case(Condition::AboveOrEqual, true)]
#[test_case(Condition::Equal, false)]
#[test_case(Condition::NotEqual, true)]
#[test_case(Condition::BelowOrEqual, false)]
#[test_case(Condition::Above, true)]
#[test_case(Condition::Sign, true)]
#[test_case(Condition::NotSign, false)]
#[test_case(Condition::ParityEven, true)]
#[test_case(Condition::ParityOdd, false)]
#[test_case(Condition::Less, true)] // SF(1) xor OF(0)
#[test_case(Condition::GreaterOrEqual, false)] // SF(1) == OF(0) is false
#[test_case(Condition::LessOrEqual, true)] // Less(true) or ZF(0)
#[test_case(Condition::Greater, false)] // not LessOrEqual(true)
fn condition_matches_expected_bit_against_fixed_flags(condition: Condition, expected: bool) {
    let mut state = session_with_fixed_flags();
    let mut txn = state.begin();
    let ast = x86_symex_core::control_flow::evaluate_condition(&mut txn, condition).unwrap();
    txn.commit();
    let value = eval_bit(&state, &ast);
    assert_eq!(value == 1, expected, "{condition:?} against the fixed flag set");
}
