//! `CBW`, `CWDE`, `CDQE`, `CQO` (spec.md §4.6 "signext").
//!
//! All four are implicit-operand sign extensions of the accumulator into
//! itself (or, for `CQO`, into `RDX:RAX`) — no [`Instruction::operand`]
//! reads at all, the same "no decoded operands, fixed registers" shape
//! `flagops.rs` uses for `CLC`/`STC`/`CMC`/`CLD`/`STD`.

use crate::error::BuildResult;
use crate::instruction::Instruction;
use crate::operand::OperandWrapper;
use crate::register::GpRegisterName;
use crate::state::InstructionTxn;
use crate::taint;

/// `CBW` — sign-extend `AL` into `AX`.
pub fn cbw(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    extend_accumulator(txn, inst, GpRegisterName::Al, GpRegisterName::Ax)
}

/// `CWDE` — sign-extend `AX` into `EAX`.
pub fn cwde(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    extend_accumulator(txn, inst, GpRegisterName::Ax, GpRegisterName::Eax)
}

/// `CDQE` — sign-extend `EAX` into `RAX`.
pub fn cdqe(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    extend_accumulator(txn, inst, GpRegisterName::Eax, GpRegisterName::Rax)
}

fn extend_accumulator(
    txn: &mut InstructionTxn<'_>,
    inst: &Instruction,
    src: GpRegisterName,
    dest: GpRegisterName,
) -> BuildResult<()> {
    let src = OperandWrapper::register(src);
    let dest = OperandWrapper::register(dest);
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    let extra = dest.bit_size() - src.bit_size();
    let extended = txn.ast().sign_extend(extra, value)?;
    txn.create_symbolic_expression(inst.address, extended, &dest, "signext: accumulator", tainted)?;
    Ok(())
}

/// `CQO` — sign-extend `RAX` into `RDX:RAX`: `RAX` itself is left alone,
/// `RDX` becomes all-0s or all-1s matching `RAX`'s sign bit. Built as one
/// 128-bit `sign_extend` of `RAX` with the top half sliced back out, the
/// same "extend wide, then extract the half you actually want" shape
/// `mov.rs`'s `extend_move` uses for narrower destinations.
pub fn cqo(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let rax = OperandWrapper::register(GpRegisterName::Rax);
    let rdx = OperandWrapper::register(GpRegisterName::Rdx);
    let value = txn.build_symbolic_operand(&rax)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &rax));
    let widened = txn.ast().sign_extend(64, value)?;
    let high = txn.ast().extract(127, 64, widened)?;
    txn.create_symbolic_expression(inst.address, high, &rdx, "cqo: rdx = sign(rax)", tainted)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::OpcodeId;
    use crate::register::ParentRegister;
    use crate::state::SymbolicState;

    #[test]
    fn cbw_sign_extends_negative_al_into_ax() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            let al = txn.ast().const_(0xff, 8).unwrap();
            txn.create_symbolic_expression(0, al, &OperandWrapper::register(GpRegisterName::Al), "seed", false).unwrap();
            txn.commit();
        }
        let inst = Instruction::new(0x1000, 2, OpcodeId::Cbw, vec![]);
        let mut txn = state.begin();
        cbw(&mut txn, &inst).unwrap();
        txn.commit();
        let mut read_txn = state.begin();
        let ax = read_txn.build_symbolic_operand(&OperandWrapper::register(GpRegisterName::Ax)).unwrap();
        assert_eq!(ax.to_string(), "(_ bv65535 16)");
    }

    #[test]
    fn cqo_fills_rdx_with_all_ones_for_negative_rax() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            let rax_seed = txn.ast().const_(u128::from(u64::MAX), 64).unwrap();
            txn.create_symbolic_register_expression(0, rax_seed, ParentRegister::Rax, "seed rax");
            txn.commit();
        }
        let inst = Instruction::new(0x1000, 2, OpcodeId::Cqo, vec![]);
        let mut txn = state.begin();
        cqo(&mut txn, &inst).unwrap();
        txn.commit();
        assert_eq!(
            state.expression(state.register_value(ParentRegister::Rdx).unwrap()).unwrap().node.to_string(),
            "(_ bv18446744073709551615 64)"
        );
    }

    #[test]
    fn cqo_fills_rdx_with_zero_for_positive_rax() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            let rax_seed = txn.ast().const_(42, 64).unwrap();
            txn.create_symbolic_register_expression(0, rax_seed, ParentRegister::Rax, "seed rax");
            txn.commit();
        }
        let inst = Instruction::new(0x1000, 2, OpcodeId::Cqo, vec![]);
        let mut txn = state.begin();
        cqo(&mut txn, &inst).unwrap();
        txn.commit();
        assert_eq!(
            state.expression(state.register_value(ParentRegister::Rdx).unwrap()).unwrap().node.to_string(),
            "(_ bv0 64)"
        );
    }
}
