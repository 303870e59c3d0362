//! Control-flow bookkeeping (C8, spec.md §4.8): advancing `RIP`
//! sequentially after every instruction, evaluating a [`Condition`] into a
//! 1-bit AST, and recording the path constraint a taken/not-taken branch
//! implies.

use crate::ast::{
    Ast,
    BinaryOp,
};
use crate::error::BuildResult;
use crate::opcode::Condition;
use crate::register::FlagId;
use crate::state::InstructionTxn;

/// A logged branch decision: the condition that was (or wasn't) satisfied,
/// and which way this particular trace went. Spec.md §4.8 calls this the
/// path constraint; a solver-backed symbolic executor would assert `ast`
/// (if `taken`) or its negation (if not) when exploring the other arm.
#[derive(Debug, Clone)]
pub struct PathConstraint {
    /// Address of the branch instruction.
    pub address: u64,
    /// The 1-bit AST for "this condition holds".
    pub ast: Ast,
    /// Whether this particular execution took the branch.
    pub taken: bool,
}

/// Build the 1-bit AST for `condition`, reading flags from `txn` at their
/// pre-instruction (committed) values — a `Jcc`/`SETcc`/`CMOVcc` handler
/// never itself writes a flag, so there is nothing staged to worry about.
pub fn evaluate_condition(txn: &mut InstructionTxn<'_>, condition: Condition) -> BuildResult<Ast> {
    use Condition::*;
    match condition {
        Overflow => txn.flag_ast(FlagId::Of),
        NotOverflow => negate(txn, FlagId::Of),
        Below => txn.flag_ast(FlagId::Cf),
        AboveOrEqual => negate(txn, FlagId::Cf),
        Equal => txn.flag_ast(FlagId::Zf),
        NotEqual => negate(txn, FlagId::Zf),
        BelowOrEqual => {
            let c = txn.flag_ast(FlagId::Cf)?;
            let z = txn.flag_ast(FlagId::Zf)?;
            txn.ast().binary(BinaryOp::BvOr, c, z)
        }
        Above => {
            let below_or_equal = evaluate_condition(txn, BelowOrEqual)?;
            bit_not(txn, below_or_equal)
        }
        Sign => txn.flag_ast(FlagId::Sf),
        NotSign => negate(txn, FlagId::Sf),
        ParityEven => txn.flag_ast(FlagId::Pf),
        ParityOdd => negate(txn, FlagId::Pf),
        Less => {
            let s = txn.flag_ast(FlagId::Sf)?;
            let o = txn.flag_ast(FlagId::Of)?;
            txn.ast().binary(BinaryOp::BvXor, s, o)
        }
        GreaterOrEqual => {
            let s = txn.flag_ast(FlagId::Sf)?;
            let o = txn.flag_ast(FlagId::Of)?;
            txn.ast().equal(s, o)
        }
        LessOrEqual => {
            let less = evaluate_condition(txn, Less)?;
            let z = txn.flag_ast(FlagId::Zf)?;
            txn.ast().binary(BinaryOp::BvOr, less, z)
        }
        Greater => {
            let less_or_equal = evaluate_condition(txn, LessOrEqual)?;
            bit_not(txn, less_or_equal)
        }
    }
}

fn negate(txn: &mut InstructionTxn<'_>, flag: FlagId) -> BuildResult<Ast> {
    let v = txn.flag_ast(flag)?;
    bit_not(txn, v)
}

fn bit_not(txn: &mut InstructionTxn<'_>, bit: Ast) -> BuildResult<Ast> {
    let one = txn.ast().const_(1, 1)?;
    txn.ast().binary(BinaryOp::BvXor, bit, one)
}

/// Compute the next `RIP` for a plain sequential instruction (no control
/// transfer): `address + length`.
pub const fn sequential_next_pc(address: u64, length: u32) -> u64 {
    address.wrapping_add(length as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SymbolicState;

    #[test]
    fn greater_or_equal_is_sf_xor_of_negated() {
        let mut state = SymbolicState::new(true, 64, 0);
        let mut txn = state.begin();
        let ast = evaluate_condition(&mut txn, Condition::GreaterOrEqual).unwrap();
        assert_eq!(ast.width(), Some(1));
    }

    #[test]
    fn above_is_not_below_or_equal() {
        let mut state = SymbolicState::new(true, 64, 0);
        let mut txn = state.begin();
        let ast = evaluate_condition(&mut txn, Condition::Above).unwrap();
        assert_eq!(ast.width(), Some(1));
    }

    #[test]
    fn sequential_pc_adds_instruction_length() {
        assert_eq!(sequential_next_pc(0x1000, 5), 0x1005);
    }
}
