//! `PUSH`, `POP`, `LEAVE` (spec.md §4.6 "stack").
//!
//! Stack-pointer arithmetic is built the same way `interpreter/internal.rs`
//! bumps `$sp` before a memory write: decrement-then-store
//! for `PUSH`, load-then-increment for `POP`. Both directions operate at
//! the destination operand's width (16/32/64), matching real operand-size
//! prefixed push/pop.

use crate::ast::BinaryOp;
use crate::error::BuildResult;
use crate::instruction::Instruction;
use crate::operand::OperandWrapper;
use crate::register::{
    GpRegisterName,
    ParentRegister,
};
use crate::semantics::operand;
use crate::state::InstructionTxn;
use crate::taint;

fn stack_pointer_width(txn: &mut InstructionTxn<'_>) -> BuildResult<crate::ast::Ast> {
    let rsp = OperandWrapper::register(GpRegisterName::Rsp);
    txn.build_symbolic_operand(&rsp)
}

/// `PUSH src` — `RSP -= width/8; [RSP] = src`.
pub fn push(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let src = operand(inst, 0)?.clone();
    let width = src.bit_size();
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));

    let rsp = stack_pointer_width(txn)?;
    let delta = txn.ast().const_(u128::from(width / 8), 64)?;
    let new_rsp = txn.ast().binary(BinaryOp::BvSub, rsp, delta)?;
    txn.create_symbolic_register_expression(inst.address, new_rsp.clone(), ParentRegister::Rsp, "push: decrement rsp");

    // The address written is the *new* (post-decrement) RSP.
    let new_rsp_value = resolve_concrete_u64(txn, &new_rsp);
    let dest = match new_rsp_value {
        Some(address) => OperandWrapper::memory(address, width),
        None => return Err(crate::error::BuildError::SymbolicShiftCount),
    };
    txn.create_symbolic_expression(inst.address, value, &dest, "push: store", tainted)?;
    Ok(())
}

/// `POP dest` — `dest = [RSP]; RSP += width/8`.
pub fn pop(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let width = dest.bit_size();

    let rsp = stack_pointer_width(txn)?;
    let rsp_value = resolve_concrete_u64(txn, &rsp).ok_or(crate::error::BuildError::SymbolicShiftCount)?;
    let src = OperandWrapper::memory(rsp_value, width);
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    txn.create_symbolic_expression(inst.address, value, &dest, "pop: load", tainted)?;

    let delta = txn.ast().const_(u128::from(width / 8), 64)?;
    let new_rsp = txn.ast().binary(BinaryOp::BvAdd, rsp, delta)?;
    txn.create_symbolic_register_expression(inst.address, new_rsp, ParentRegister::Rsp, "pop: increment rsp");
    Ok(())
}

/// `LEAVE` — `RSP := RBP`, then `POP RBP`. The canonical undo of a
/// `PUSH RBP; MOV RBP, RSP` prologue, built as the same two steps in
/// reverse rather than one combined formula.
pub fn leave(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let rbp = OperandWrapper::register(GpRegisterName::Rbp);
    let rbp_value = txn.build_symbolic_operand(&rbp)?;
    txn.create_symbolic_register_expression(inst.address, rbp_value.clone(), ParentRegister::Rsp, "leave: rsp = rbp");

    let rsp_value = resolve_concrete_u64(txn, &rbp_value).ok_or(crate::error::BuildError::SymbolicShiftCount)?;
    let width = 64;
    let src = OperandWrapper::memory(rsp_value, width);
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    txn.create_symbolic_expression(inst.address, value, &rbp, "leave: pop rbp", tainted)?;

    let delta = txn.ast().const_(u128::from(width / 8), 64)?;
    let new_rsp = txn.ast().binary(BinaryOp::BvAdd, rbp_value, delta)?;
    txn.create_symbolic_register_expression(inst.address, new_rsp, ParentRegister::Rsp, "leave: increment rsp");
    Ok(())
}

/// Pull a concrete `u64` out of an AST, following `Ref` indirection back to
/// whatever expression it names and folding the small family of `Const`/add/
/// sub shapes `RSP` arithmetic actually produces. `RSP` is tracked
/// symbolically like everything else, and [`InstructionTxn::build_symbolic_operand`]
/// always hands a register read back wrapped in a fresh `Ref` even when the
/// register's own backing expression is already concrete — so a bare
/// `Const` match on the value `build_symbolic_operand` returns can never
/// succeed. Stack addressing needs a concrete address to build a
/// [`crate::operand::MemoryOperand`] against; in practice `RSP` stays
/// concrete throughout straight-line code with no symbolic stack-pointer
/// arithmetic, which is the only case `PUSH`/`POP`/`LEAVE` need to support.
fn resolve_concrete_u64(txn: &InstructionTxn<'_>, ast: &crate::ast::Ast) -> Option<u64> {
    match &**ast {
        crate::ast::AstNode::Const { value, .. } => Some(*value as u64),
        crate::ast::AstNode::Ref { expr_id, .. } => {
            let node = txn.resolve_expression(crate::state::ExpressionId(*expr_id))?.node.clone();
            resolve_concrete_u64(txn, &node)
        }
        crate::ast::AstNode::Binary { op, lhs, rhs } => {
            let l = resolve_concrete_u64(txn, lhs)?;
            let r = resolve_concrete_u64(txn, rhs)?;
            match op {
                BinaryOp::BvAdd => Some(l.wrapping_add(r)),
                BinaryOp::BvSub => Some(l.wrapping_sub(r)),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::OpcodeId;
    use crate::state::SymbolicState;

    #[test]
    fn push_then_pop_round_trips() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            let rsp_seed = txn.ast().const_(0x7fff_0000, 64).unwrap();
            txn.create_symbolic_register_expression(0, rsp_seed, ParentRegister::Rsp, "seed rsp");
            let rax_seed = txn.ast().const_(0x1234, 64).unwrap();
            let dest = OperandWrapper::register(GpRegisterName::Rax);
            txn.create_symbolic_expression(0, rax_seed, &dest, "seed rax", false).unwrap();
            txn.commit();
        }
        let push_inst = Instruction::new(0x1000, 1, OpcodeId::Push, vec![OperandWrapper::register(GpRegisterName::Rax)]);
        let mut txn = state.begin();
        push(&mut txn, &push_inst).unwrap();
        txn.commit();
        assert_eq!(
            state.expression(state.register_value(ParentRegister::Rsp).unwrap()).unwrap().node.to_string(),
            "(_ bv2147418104 64)"
        );

        let pop_inst = Instruction::new(0x1001, 1, OpcodeId::Pop, vec![OperandWrapper::register(GpRegisterName::Rbx)]);
        let mut txn = state.begin();
        pop(&mut txn, &pop_inst).unwrap();
        txn.commit();
        assert_eq!(
            state.expression(state.register_value(ParentRegister::Rbx).unwrap()).unwrap().node.to_string(),
            "(_ bv4660 64)"
        );
        assert_eq!(
            state.expression(state.register_value(ParentRegister::Rsp).unwrap()).unwrap().node.to_string(),
            "(_ bv2147418112 64)"
        );
    }

    #[test]
    fn leave_restores_rsp_from_rbp_and_pops_rbp() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            let rsp_seed = txn.ast().const_(0x7fff_0000, 64).unwrap();
            txn.create_symbolic_register_expression(0, rsp_seed, ParentRegister::Rsp, "seed rsp");
            let rbp_seed = txn.ast().const_(0x7fff_1000, 64).unwrap();
            txn.create_symbolic_register_expression(0, rbp_seed, ParentRegister::Rbp, "seed rbp");
            let saved_rbp = txn.ast().const_(0x1111, 64).unwrap();
            let mem = OperandWrapper::memory(0x7fff_1000, 64);
            txn.create_symbolic_expression(0, saved_rbp, &mem, "seed saved rbp on the stack", false).unwrap();
            txn.commit();
        }
        let inst = Instruction::new(0x1000, 1, OpcodeId::Leave, vec![]);
        let mut txn = state.begin();
        leave(&mut txn, &inst).unwrap();
        txn.commit();
        assert_eq!(
            state.expression(state.register_value(ParentRegister::Rbp).unwrap()).unwrap().node.to_string(),
            "(_ bv4369 64)"
        );
        assert_eq!(
            state.expression(state.register_value(ParentRegister::Rsp).unwrap()).unwrap().node.to_string(),
            "(_ bv2147422216 64)"
        );
    }
}
