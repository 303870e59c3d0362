//! `CLC`, `STC`, `CMC`, `CLD`, `STD`, `NOP` (spec.md §4.6 "flagops").
//!
//! Each of these touches exactly one flag and no operands at all — the
//! simplest possible handlers, grounded on the same "no operands, one
//! architectural write" shape as the `met`/`gm`/`gtf` register
//! instructions in `executors/instruction.rs`.

use crate::ast::BinaryOp;
use crate::error::BuildResult;
use crate::instruction::Instruction;
use crate::register::FlagId;
use crate::state::InstructionTxn;

/// `CLC` — `CF = 0`.
pub fn clc(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let zero = txn.ast().const_(0, 1)?;
    txn.create_symbolic_flag_expression(inst.address, zero, FlagId::Cf, "clc");
    Ok(())
}

/// `STC` — `CF = 1`.
pub fn stc(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let one = txn.ast().const_(1, 1)?;
    txn.create_symbolic_flag_expression(inst.address, one, FlagId::Cf, "stc");
    Ok(())
}

/// `CMC` — `CF = !CF`.
pub fn cmc(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let cf = txn.flag_ast(FlagId::Cf)?;
    let one = txn.ast().const_(1, 1)?;
    let flipped = txn.ast().binary(BinaryOp::BvXor, cf, one)?;
    txn.create_symbolic_flag_expression(inst.address, flipped, FlagId::Cf, "cmc");
    Ok(())
}

/// `CLD` — `DF = 0`.
pub fn cld(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let zero = txn.ast().const_(0, 1)?;
    txn.create_symbolic_flag_expression(inst.address, zero, FlagId::Df, "cld");
    Ok(())
}

/// `STD` — `DF = 1`.
pub fn std(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let one = txn.ast().const_(1, 1)?;
    txn.create_symbolic_flag_expression(inst.address, one, FlagId::Df, "std");
    Ok(())
}

/// `NOP` — no registers, no memory, no flags. `RIP` still advances, but
/// that is [`crate::session::Session::build`]'s job, not this handler's.
pub fn nop(_txn: &mut InstructionTxn<'_>, _inst: &Instruction) -> BuildResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::OpcodeId;
    use crate::state::SymbolicState;

    #[test]
    fn cmc_flips_carry() {
        let mut state = SymbolicState::new(true, 64, 0);
        let inst = Instruction::new(0x1000, 1, OpcodeId::Cmc, vec![]);
        let mut txn = state.begin();
        cmc(&mut txn, &inst).unwrap();
        txn.commit();
        let cf = state.flag_value(FlagId::Cf).unwrap();
        assert_eq!(state.expression(cf).unwrap().node.to_string(), "(_ bv1 1)");
    }
}
