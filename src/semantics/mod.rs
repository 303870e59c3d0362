//! Per-instruction semantic builders (C6, spec.md §4.6). One submodule per
//! mnemonic family, grounded the way
//! `interpreter/executors/instruction.rs` groups ALU, memory, and
//! control-flow opcodes into separate match arms feeding small dedicated
//! functions rather than one undifferentiated dispatch body.

pub mod arith;
pub mod bitscan;
pub mod control;
pub mod exchange;
pub mod flagops;
pub mod mov;
pub mod muldiv;
pub mod shift_rotate;
pub mod signext;
pub mod simd;
pub mod stack;

use crate::ast::Ast;
use crate::error::BuildResult;
use crate::instruction::Instruction;
use crate::operand::OperandWrapper;
use crate::state::InstructionTxn;
use crate::taint;

/// Read both operands of a two-operand instruction as ASTs, plus their
/// combined taint via [`taint::union`]. Almost every arithmetic/logical
/// handler starts here.
pub fn read_binary_operands(
    txn: &mut InstructionTxn<'_>,
    dest: &OperandWrapper,
    src: &OperandWrapper,
) -> BuildResult<(Ast, Ast, bool)> {
    let op1 = txn.build_symbolic_operand(dest)?;
    let op2 = txn.build_symbolic_operand(src)?;
    let tainted = taint::union(
        taint::operand_is_tainted(txn, dest),
        taint::operand_is_tainted(txn, src),
    );
    Ok((op1, op2, tainted))
}

/// Fetch `instruction`'s `n`th operand or fail with [`crate::error::BuildError::NotWritable`]
/// — every handler needs at least its declared operand count, and a
/// decoder that hands out too few is a caller bug, not a recoverable
/// build error, but we still route it through `BuildResult` rather than
/// panicking so a malformed `Instruction` cannot crash the session.
pub fn operand(instruction: &Instruction, n: usize) -> BuildResult<&OperandWrapper> {
    instruction
        .operand(n)
        .ok_or(crate::error::BuildError::NotWritable)
}
