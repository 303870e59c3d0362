//! `MOV`, `LEA`, `MOVZX`, `MOVSX`, `MOVSXD` (spec.md §4.6 "mov").

use crate::error::BuildResult;
use crate::instruction::Instruction;
use crate::semantics::operand;
use crate::state::InstructionTxn;
use crate::taint;

/// `MOV dest, src` — plain assignment copy, no flags touched.
pub fn mov(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    txn.create_symbolic_expression(inst.address, value, &dest, "mov", tainted)?;
    Ok(())
}

/// `LEA dest, [mem]` — the destination gets the *address*, not the
/// contents, of `src`. Since this crate's [`crate::operand::MemoryOperand`]
/// already carries a resolved effective address (computed by the caller
/// from base/index/scale/disp, per spec.md §4.4's note that effective
/// address arithmetic lives outside this crate), `LEA` is simply "load
/// that address as an immediate-shaped value".
pub fn lea(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    use crate::operand::OperandWrapper;
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?;
    let (address, width) = match src {
        OperandWrapper::Memory(mem) => (mem.address, dest.bit_size()),
        _ => return Err(crate::error::BuildError::NotWritable),
    };
    let value = txn.ast().const_(u128::from(address), width)?;
    txn.create_symbolic_expression(inst.address, value, &dest, "lea", false)?;
    Ok(())
}

/// `MOVZX dest, src` — zero-extend `src` up to `dest`'s width.
pub fn movzx(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    extend_move(txn, inst, false)
}

/// `MOVSX dest, src` — sign-extend `src` up to `dest`'s width.
pub fn movsx(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    extend_move(txn, inst, true)
}

/// `MOVSXD dest, src` — sign-extend a 32-bit source into a 64-bit
/// destination. Semantically identical to `MOVSX` once the operand widths
/// are known; kept as a distinct opcode only because decoders name it
/// separately.
pub fn movsxd(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    extend_move(txn, inst, true)
}

fn extend_move(txn: &mut InstructionTxn<'_>, inst: &Instruction, signed: bool) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    let extra = dest.bit_size() - src.bit_size();
    let extended = if signed {
        txn.ast().sign_extend(extra, value)?
    } else {
        txn.ast().zero_extend(extra, value)?
    };
    txn.create_symbolic_expression(inst.address, extended, &dest, "extend_move", tainted)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::OpcodeId;
    use crate::operand::OperandWrapper;
    use crate::register::GpRegisterName;
    use crate::state::SymbolicState;

    #[test]
    fn movzx_zero_extends_into_wider_destination() {
        let mut state = SymbolicState::new(true, 64, 0);
        let inst = Instruction::new(
            0x1000,
            3,
            OpcodeId::Movzx,
            vec![
                OperandWrapper::register(GpRegisterName::Eax),
                OperandWrapper::immediate(0xff, 8),
            ],
        );
        let mut txn = state.begin();
        movzx(&mut txn, &inst).unwrap();
        txn.commit();
        let rax = state.register_value(crate::register::ParentRegister::Rax).unwrap();
        assert_eq!(state.expression(rax).unwrap().node.to_string(), "(_ bv255 64)");
    }

    #[test]
    fn lea_loads_the_address_not_the_contents() {
        let mut state = SymbolicState::new(true, 64, 0);
        let inst = Instruction::new(
            0x1000,
            7,
            OpcodeId::Lea,
            vec![
                OperandWrapper::register(GpRegisterName::Rax),
                OperandWrapper::memory(0x4000, 64),
            ],
        );
        let mut txn = state.begin();
        lea(&mut txn, &inst).unwrap();
        txn.commit();
        let rax = state.register_value(crate::register::ParentRegister::Rax).unwrap();
        assert_eq!(state.expression(rax).unwrap().node.to_string(), "(_ bv16384 64)");
    }
}
