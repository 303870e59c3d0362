//! `JMP`, `Jcc`, `CALL`, `RET`, `SETcc`, `CMOVcc` (spec.md §4.6
//! "control_flow", tying into C8's [`crate::control_flow`]).
//!
//! Direct jump/call targets are carried as an immediate operand (the
//! decoder resolves relative displacement into an absolute address before
//! handing us the instruction, same division of labour as `LEA`'s
//! pre-resolved effective address). Indirect forms go through a register
//! or memory operand; if the AST built for the target happens to be a
//! concrete constant, the edge is resolved, otherwise the caller driving
//! the session is left to handle the symbolic target.

use crate::ast::{
    Ast,
    AstNode,
    BinaryOp,
};
use crate::control_flow::{
    evaluate_condition,
    PathConstraint,
};
use crate::error::{
    BuildError,
    BuildResult,
};
use crate::instruction::Instruction;
use crate::opcode::Condition;
use crate::operand::OperandWrapper;
use crate::register::{
    GpRegisterName,
    ParentRegister,
};
use crate::semantics::operand;
use crate::state::InstructionTxn;
use crate::taint;

/// `JMP target` — unconditional, no path constraint to record.
pub fn jmp(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<Option<u64>> {
    let target = operand(inst, 0)?.clone();
    resolve_branch_target(txn, &target)
}

/// `Jcc target` — evaluates `condition`; if taken, transfers control to
/// `target`, else falls through. Returns the taken target address (if
/// statically known) plus the logged [`PathConstraint`].
pub fn jcc(
    txn: &mut InstructionTxn<'_>,
    inst: &Instruction,
    condition: Condition,
    concretely_taken: bool,
) -> BuildResult<(Option<u64>, PathConstraint)> {
    let target = operand(inst, 0)?.clone();
    let cond_ast = evaluate_condition(txn, condition)?;
    let constraint = PathConstraint {
        address: inst.address,
        ast: cond_ast,
        taken: concretely_taken,
    };
    let resolved = if concretely_taken { resolve_branch_target(txn, &target)? } else { None };
    Ok((resolved, constraint))
}

/// `CALL target` — push the return address, then transfer control exactly
/// like `JMP`.
pub fn call(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<Option<u64>> {
    let target = operand(inst, 0)?.clone();
    let return_address = inst.next_address();

    let rsp_operand = OperandWrapper::register(GpRegisterName::Rsp);
    let rsp = txn.build_symbolic_operand(&rsp_operand)?;
    let eight = txn.ast().const_(8, 64)?;
    let new_rsp = txn.ast().binary(BinaryOp::BvSub, rsp, eight)?;
    let store_address = extract_concrete_u64(&new_rsp).ok_or(BuildError::SymbolicShiftCount)?;
    txn.create_symbolic_register_expression(inst.address, new_rsp, ParentRegister::Rsp, "call: decrement rsp");

    let return_value = txn.ast().const_(u128::from(return_address), 64)?;
    let dest = OperandWrapper::memory(store_address, 64);
    txn.create_symbolic_expression(inst.address, return_value, &dest, "call: push return address", false)?;

    resolve_branch_target(txn, &target)
}

/// `RET` — pop the return address off the stack and transfer control to
/// it.
pub fn ret(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<Option<u64>> {
    let rsp_operand = OperandWrapper::register(GpRegisterName::Rsp);
    let rsp = txn.build_symbolic_operand(&rsp_operand)?;
    let load_address = extract_concrete_u64(&rsp).ok_or(BuildError::SymbolicShiftCount)?;
    let src = OperandWrapper::memory(load_address, 64);
    let return_value = txn.build_symbolic_operand(&src)?;

    let eight = txn.ast().const_(8, 64)?;
    let new_rsp = txn.ast().binary(BinaryOp::BvAdd, rsp, eight)?;
    txn.create_symbolic_register_expression(inst.address, new_rsp, ParentRegister::Rsp, "ret: increment rsp");

    Ok(extract_concrete_u64(&return_value))
}

/// `SETcc dest` — `dest = condition ? 1 : 0`, zero-extended to `dest`'s
/// width.
pub fn setcc(txn: &mut InstructionTxn<'_>, inst: &Instruction, condition: Condition) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let cond_ast = evaluate_condition(txn, condition)?;
    let width = dest.bit_size();
    let value = txn.ast().zero_extend(width - 1, cond_ast)?;
    txn.create_symbolic_expression(inst.address, value, &dest, "setcc", false)?;
    Ok(())
}

/// `CMOVcc dest, src` — `dest = condition ? src : dest`, built as a single
/// `ite` so both arms are represented regardless of which one a concrete
/// trace took.
pub fn cmovcc(txn: &mut InstructionTxn<'_>, inst: &Instruction, condition: Condition) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let cond_ast = evaluate_condition(txn, condition)?;
    let dest_value = txn.build_symbolic_operand(&dest)?;
    let src_value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::union(
        taint::operand_is_tainted(txn, &dest),
        taint::operand_is_tainted(txn, &src),
    );
    let selected = txn.ast().ite(cond_ast, src_value, dest_value)?;
    txn.create_symbolic_expression(inst.address, selected, &dest, "cmovcc", tainted)?;
    Ok(())
}

fn resolve_branch_target(txn: &mut InstructionTxn<'_>, target: &OperandWrapper) -> BuildResult<Option<u64>> {
    match target {
        OperandWrapper::Immediate(imm) => Ok(Some(imm.value as u64)),
        _ => {
            let ast = txn.build_symbolic_operand(target)?;
            Ok(extract_concrete_u64(&ast))
        }
    }
}

/// Pull a concrete `u64` out of an AST if it happens to be a literal
/// constant — same convention [`crate::semantics::stack`] uses for reading
/// back a concretely-tracked `RSP`.
fn extract_concrete_u64(ast: &Ast) -> Option<u64> {
    match &**ast {
        AstNode::Const { value, .. } => Some(*value as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::OpcodeId;
    use crate::register::FlagId;
    use crate::state::SymbolicState;

    #[test]
    fn jmp_resolves_immediate_target() {
        let mut state = SymbolicState::new(true, 64, 0);
        let inst = Instruction::new(0x1000, 5, OpcodeId::Jmp, vec![OperandWrapper::immediate(0x2000, 64)]);
        let mut txn = state.begin();
        let target = jmp(&mut txn, &inst).unwrap();
        txn.commit();
        assert_eq!(target, Some(0x2000));
    }

    #[test]
    fn setcc_equal_writes_one_when_zf_set() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            let one = txn.ast().const_(1, 1).unwrap();
            txn.create_symbolic_flag_expression(0, one, FlagId::Zf, "seed zf");
            txn.commit();
        }
        let inst = Instruction::new(
            0x1000,
            3,
            OpcodeId::Setcc(Condition::Equal),
            vec![OperandWrapper::register(GpRegisterName::Al)],
        );
        let mut txn = state.begin();
        setcc(&mut txn, &inst, Condition::Equal).unwrap();
        txn.commit();
        let mut read_txn = state.begin();
        let al = read_txn.build_symbolic_operand(&OperandWrapper::register(GpRegisterName::Al)).unwrap();
        assert_eq!(al.to_string(), "(_ bv1 8)");
    }

    #[test]
    fn call_then_ret_round_trips_return_address() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            let rsp_seed = txn.ast().const_(0x7fff_0000, 64).unwrap();
            txn.create_symbolic_register_expression(0, rsp_seed, ParentRegister::Rsp, "seed rsp");
            txn.commit();
        }
        let call_inst = Instruction::new(0x1000, 5, OpcodeId::Call, vec![OperandWrapper::immediate(0x2000, 64)]);
        let mut txn = state.begin();
        let target = call(&mut txn, &call_inst).unwrap();
        txn.commit();
        assert_eq!(target, Some(0x2000));

        let ret_inst = Instruction::new(0x2000, 1, OpcodeId::Ret, vec![]);
        let mut txn = state.begin();
        let return_target = ret(&mut txn, &ret_inst).unwrap();
        txn.commit();
        assert_eq!(return_target, Some(0x1005));
        let mut read_txn = state.begin();
        let rsp = read_txn.build_symbolic_operand(&OperandWrapper::register(GpRegisterName::Rsp)).unwrap();
        assert_eq!(rsp.to_string(), "(_ bv2147418112 64)");
    }
}
