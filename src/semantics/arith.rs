//! `ADD`, `ADC`, `SUB`, `SBB`, `INC`, `DEC`, `NEG`, `CMP`, `AND`, `OR`,
//! `XOR`, `NOT`, `TEST` (spec.md §4.6 "arith").

use crate::ast::BinaryOp;
use crate::error::BuildResult;
use crate::flags;
use crate::instruction::Instruction;
use crate::register::FlagId;
use crate::semantics::{
    operand,
    read_binary_operands,
};
use crate::state::InstructionTxn;
use crate::taint;

fn write_status_flags_add_sub(
    txn: &mut InstructionTxn<'_>,
    address: u64,
    r: &crate::ast::Ast,
    op1: &crate::ast::Ast,
    op2: &crate::ast::Ast,
    width: u32,
    cf: crate::ast::Ast,
    of: crate::ast::Ast,
) -> BuildResult<()> {
    let af = flags::af_add_sub(txn.ast(), r, op1, op2, width)?;
    let pf = flags::pf(txn.ast(), r)?;
    let zf = flags::zf(txn.ast(), r, width)?;
    let sf = flags::sf(txn.ast(), r, width)?;
    txn.create_symbolic_flag_expression(address, cf, FlagId::Cf, "cf");
    txn.create_symbolic_flag_expression(address, af, FlagId::Af, "af");
    txn.create_symbolic_flag_expression(address, pf, FlagId::Pf, "pf");
    txn.create_symbolic_flag_expression(address, zf, FlagId::Zf, "zf");
    txn.create_symbolic_flag_expression(address, sf, FlagId::Sf, "sf");
    txn.create_symbolic_flag_expression(address, of, FlagId::Of, "of");
    Ok(())
}

fn write_status_flags_logic(
    txn: &mut InstructionTxn<'_>,
    address: u64,
    r: &crate::ast::Ast,
    width: u32,
) -> BuildResult<()> {
    // AND/OR/XOR/TEST clear CF and OF, leave AF undefined (spec.md leaves
    // the flag map holding whatever expression was already resident — we
    // simply do not write it), and set PF/ZF/SF from the result.
    let pf = flags::pf(txn.ast(), r)?;
    let zf = flags::zf(txn.ast(), r, width)?;
    let sf = flags::sf(txn.ast(), r, width)?;
    let zero1 = txn.ast().const_(0, 1)?;
    txn.create_symbolic_flag_expression(address, zero1.clone(), FlagId::Cf, "cf cleared");
    txn.create_symbolic_flag_expression(address, zero1, FlagId::Of, "of cleared");
    txn.create_symbolic_flag_expression(address, pf, FlagId::Pf, "pf");
    txn.create_symbolic_flag_expression(address, zf, FlagId::Zf, "zf");
    txn.create_symbolic_flag_expression(address, sf, FlagId::Sf, "sf");
    Ok(())
}

/// `ADD dest, src`.
pub fn add(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;
    let width = dest.bit_size();
    let r = txn.ast().binary(BinaryOp::BvAdd, op1.clone(), op2.clone())?;
    let cf = flags::cf_add(txn.ast(), &r, &op1, &op2, width)?;
    let of = flags::of_add(txn.ast(), &r, &op1, &op2, width)?;
    txn.create_symbolic_expression(inst.address, r.clone(), &dest, "add", tainted)?;
    write_status_flags_add_sub(txn, inst.address, &r, &op1, &op2, width, cf, of)
}

/// `ADC dest, src` — `dest + src + CF`.
pub fn adc(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;
    let width = dest.bit_size();
    let cf_in = txn.flag_ast(FlagId::Cf)?;
    let cf_in_ext = txn.ast().zero_extend(width - 1, cf_in)?;
    let sum = txn.ast().binary(BinaryOp::BvAdd, op1.clone(), op2.clone())?;
    let r = txn.ast().binary(BinaryOp::BvAdd, sum, cf_in_ext)?;
    // CF/OF for ADC reuse the ADD formulas against the extended operand
    // (`op2 + carry_in`), matching how `interpreter/alu.rs`'s own carry-in
    // helpers feed it through the same add path as a plain ADD.
    let cf = flags::cf_add(txn.ast(), &r, &op1, &op2, width)?;
    let of = flags::of_add(txn.ast(), &r, &op1, &op2, width)?;
    txn.create_symbolic_expression(inst.address, r.clone(), &dest, "adc", tainted)?;
    write_status_flags_add_sub(txn, inst.address, &r, &op1, &op2, width, cf, of)
}

/// `SUB dest, src`.
pub fn sub(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;
    let width = dest.bit_size();
    let r = txn.ast().binary(BinaryOp::BvSub, op1.clone(), op2.clone())?;
    let cf = flags::cf_sub(txn.ast(), &r, &op1, &op2, width)?;
    let of = flags::of_sub(txn.ast(), &r, &op1, &op2, width)?;
    txn.create_symbolic_expression(inst.address, r.clone(), &dest, "sub", tainted)?;
    write_status_flags_add_sub(txn, inst.address, &r, &op1, &op2, width, cf, of)
}

/// `SBB dest, src` — `dest - (src + CF)`.
pub fn sbb(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;
    let width = dest.bit_size();
    let cf_in = txn.flag_ast(FlagId::Cf)?;
    let cf_in_ext = txn.ast().zero_extend(width - 1, cf_in)?;
    let sub_amount = txn.ast().binary(BinaryOp::BvAdd, op2.clone(), cf_in_ext)?;
    let r = txn.ast().binary(BinaryOp::BvSub, op1.clone(), sub_amount)?;
    let cf = flags::cf_sub(txn.ast(), &r, &op1, &op2, width)?;
    let of = flags::of_sub(txn.ast(), &r, &op1, &op2, width)?;
    txn.create_symbolic_expression(inst.address, r.clone(), &dest, "sbb", tainted)?;
    write_status_flags_add_sub(txn, inst.address, &r, &op1, &op2, width, cf, of)
}

/// `CMP dest, src` — like SUB, but the result is discarded (volatile).
pub fn cmp(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, _tainted) = read_binary_operands(txn, &dest, &src)?;
    let width = dest.bit_size();
    let r = txn.ast().binary(BinaryOp::BvSub, op1.clone(), op2.clone())?;
    let cf = flags::cf_sub(txn.ast(), &r, &op1, &op2, width)?;
    let of = flags::of_sub(txn.ast(), &r, &op1, &op2, width)?;
    txn.create_symbolic_volatile_expression(inst.address, r.clone(), "cmp");
    write_status_flags_add_sub(txn, inst.address, &r, &op1, &op2, width, cf, of)
}

/// `INC dest` — `dest + 1`; leaves CF untouched.
pub fn inc(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let op1 = txn.build_symbolic_operand(&dest)?;
    let tainted = taint::operand_is_tainted(txn, &dest);
    let width = dest.bit_size();
    let one = txn.ast().const_(1, width)?;
    let r = txn.ast().binary(BinaryOp::BvAdd, op1.clone(), one.clone())?;
    let of = flags::of_add(txn.ast(), &r, &op1, &one, width)?;
    let af = flags::af_add_sub(txn.ast(), &r, &op1, &one, width)?;
    let pf = flags::pf(txn.ast(), &r)?;
    let zf = flags::zf(txn.ast(), &r, width)?;
    let sf = flags::sf(txn.ast(), &r, width)?;
    txn.create_symbolic_expression(inst.address, r, &dest, "inc", tainted)?;
    txn.create_symbolic_flag_expression(inst.address, af, FlagId::Af, "af");
    txn.create_symbolic_flag_expression(inst.address, pf, FlagId::Pf, "pf");
    txn.create_symbolic_flag_expression(inst.address, zf, FlagId::Zf, "zf");
    txn.create_symbolic_flag_expression(inst.address, sf, FlagId::Sf, "sf");
    txn.create_symbolic_flag_expression(inst.address, of, FlagId::Of, "of");
    Ok(())
}

/// `DEC dest` — `dest - 1`; leaves CF untouched.
pub fn dec(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let op1 = txn.build_symbolic_operand(&dest)?;
    let tainted = taint::operand_is_tainted(txn, &dest);
    let width = dest.bit_size();
    let one = txn.ast().const_(1, width)?;
    let r = txn.ast().binary(BinaryOp::BvSub, op1.clone(), one.clone())?;
    let of = flags::of_sub(txn.ast(), &r, &op1, &one, width)?;
    let af = flags::af_add_sub(txn.ast(), &r, &op1, &one, width)?;
    let pf = flags::pf(txn.ast(), &r)?;
    let zf = flags::zf(txn.ast(), &r, width)?;
    let sf = flags::sf(txn.ast(), &r, width)?;
    txn.create_symbolic_expression(inst.address, r, &dest, "dec", tainted)?;
    txn.create_symbolic_flag_expression(inst.address, af, FlagId::Af, "af");
    txn.create_symbolic_flag_expression(inst.address, pf, FlagId::Pf, "pf");
    txn.create_symbolic_flag_expression(inst.address, zf, FlagId::Zf, "zf");
    txn.create_symbolic_flag_expression(inst.address, sf, FlagId::Sf, "sf");
    Ok(())
}

/// `NEG dest` — two's-complement negation.
pub fn neg(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    use crate::ast::UnaryOp;
    let dest = operand(inst, 0)?.clone();
    let op1 = txn.build_symbolic_operand(&dest)?;
    let tainted = taint::operand_is_tainted(txn, &dest);
    let width = dest.bit_size();
    let r = txn.ast().unary(UnaryOp::BvNeg, op1.clone())?;
    let cf = flags::cf_of_mul_neg(txn.ast(), &op1, width)?;
    let of = flags::of_neg(txn.ast(), &r, &op1, width)?;
    let af = flags::af_neg(txn.ast(), &r, &op1, width)?;
    let pf = flags::pf(txn.ast(), &r)?;
    let zf = flags::zf(txn.ast(), &r, width)?;
    let sf = flags::sf(txn.ast(), &r, width)?;
    txn.create_symbolic_expression(inst.address, r, &dest, "neg", tainted)?;
    txn.create_symbolic_flag_expression(inst.address, cf, FlagId::Cf, "cf");
    txn.create_symbolic_flag_expression(inst.address, af, FlagId::Af, "af");
    txn.create_symbolic_flag_expression(inst.address, pf, FlagId::Pf, "pf");
    txn.create_symbolic_flag_expression(inst.address, zf, FlagId::Zf, "zf");
    txn.create_symbolic_flag_expression(inst.address, sf, FlagId::Sf, "sf");
    txn.create_symbolic_flag_expression(inst.address, of, FlagId::Of, "of");
    Ok(())
}

fn logic_op(
    txn: &mut InstructionTxn<'_>,
    inst: &Instruction,
    op: BinaryOp,
    comment: &'static str,
) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;
    let width = dest.bit_size();
    let r = txn.ast().binary(op, op1, op2)?;
    txn.create_symbolic_expression(inst.address, r.clone(), &dest, comment, tainted)?;
    write_status_flags_logic(txn, inst.address, &r, width)
}

/// `AND dest, src`.
pub fn and(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    logic_op(txn, inst, BinaryOp::BvAnd, "and")
}

/// `OR dest, src`.
pub fn or(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    logic_op(txn, inst, BinaryOp::BvOr, "or")
}

/// `XOR dest, src`.
pub fn xor(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    logic_op(txn, inst, BinaryOp::BvXor, "xor")
}

/// `NOT dest` — bitwise complement; touches no flags.
pub fn not(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    use crate::ast::UnaryOp;
    let dest = operand(inst, 0)?.clone();
    let op1 = txn.build_symbolic_operand(&dest)?;
    let tainted = taint::operand_is_tainted(txn, &dest);
    let r = txn.ast().unary(UnaryOp::BvNot, op1)?;
    txn.create_symbolic_expression(inst.address, r, &dest, "not", tainted)?;
    Ok(())
}

/// `TEST dest, src` — like AND, result discarded.
pub fn test(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, _tainted) = read_binary_operands(txn, &dest, &src)?;
    let width = dest.bit_size();
    let r = txn.ast().binary(BinaryOp::BvAnd, op1, op2)?;
    txn.create_symbolic_volatile_expression(inst.address, r.clone(), "test");
    write_status_flags_logic(txn, inst.address, &r, width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::OpcodeId;
    use crate::operand::OperandWrapper;
    use crate::register::{
        GpRegisterName,
        ParentRegister,
    };
    use crate::state::SymbolicState;

    #[test]
    fn add_sets_zf_when_result_is_zero() {
        let mut state = SymbolicState::new(true, 64, 0);
        let inst = Instruction::new(
            0x1000,
            3,
            OpcodeId::Add,
            vec![
                OperandWrapper::register(GpRegisterName::Eax),
                OperandWrapper::immediate(0, 32),
            ],
        );
        let mut txn = state.begin();
        add(&mut txn, &inst).unwrap();
        txn.commit();
        let zf_id = state.flag_value(FlagId::Zf).unwrap();
        assert_eq!(state.expression(zf_id).unwrap().node.to_string(), "(_ bv1 1)");
    }

    #[test]
    fn xor_self_clears_carry_and_overflow() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            let seed = txn.ast().const_(0x1234_5678, 32).unwrap();
            let dest = OperandWrapper::register(GpRegisterName::Eax);
            txn.create_symbolic_expression(0x1000, seed, &dest, "seed", false)
                .unwrap();
            txn.commit();
        }
        let inst = Instruction::new(
            0x1003,
            2,
            OpcodeId::Xor,
            vec![
                OperandWrapper::register(GpRegisterName::Eax),
                OperandWrapper::register(GpRegisterName::Eax),
            ],
        );
        let mut txn = state.begin();
        xor(&mut txn, &inst).unwrap();
        txn.commit();
        let cf_id = state.flag_value(FlagId::Cf).unwrap();
        assert_eq!(state.expression(cf_id).unwrap().node.to_string(), "(_ bv0 1)");
        let eax_parent = state.register_value(ParentRegister::Rax).unwrap();
        assert_eq!(state.expression(eax_parent).unwrap().node.to_string(), "(_ bv0 64)");
    }
}
