//! `XCHG`, `CMPXCHG`, `XADD` (spec.md §4.6 "exchange").

use crate::ast::BinaryOp;
use crate::error::BuildResult;
use crate::flags;
use crate::instruction::Instruction;
use crate::register::{
    FlagId,
    GpRegisterName,
};
use crate::semantics::{
    operand,
    read_binary_operands,
};
use crate::state::InstructionTxn;
use crate::taint;

/// `XCHG dest, src` — swap, both sides tainted with the union of both
/// inputs (each side now carries information that could have come from
/// either).
pub fn xchg(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;
    txn.create_symbolic_expression(inst.address, op2, &dest, "xchg", tainted)?;
    txn.create_symbolic_expression(inst.address, op1, &src, "xchg", tainted)?;
    Ok(())
}

/// `CMPXCHG dest, src` — compare the implicit accumulator against `dest`;
/// if equal, `dest = src` and ZF = 1, else the accumulator is loaded with
/// `dest` and ZF = 0. Built as a single `ite`-selected write so both
/// outcomes live in one AST, the same pattern [`crate::flags::gate_unless_nonzero`]
/// uses for flag-unchanged semantics.
pub fn cmpxchg(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let width = dest.bit_size();
    let accumulator = crate::operand::OperandWrapper::register(accumulator_name(width));

    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;
    let acc_value = txn.build_symbolic_operand(&accumulator)?;

    let r = txn.ast().binary(crate::ast::BinaryOp::BvSub, acc_value.clone(), op1.clone())?;
    let cf = flags::cf_sub(txn.ast(), &r, &acc_value, &op1, width)?;
    let of = flags::of_sub(txn.ast(), &r, &acc_value, &op1, width)?;
    let af = flags::af_add_sub(txn.ast(), &r, &acc_value, &op1, width)?;
    let pf = flags::pf(txn.ast(), &r)?;
    let zf = flags::zf(txn.ast(), &r, width)?;
    let sf = flags::sf(txn.ast(), &r, width)?;

    let equal = txn.ast().equal(acc_value.clone(), op1.clone())?;
    let dest_new = txn.ast().ite(equal.clone(), op2, op1.clone())?;
    let acc_new = txn.ast().ite(equal, acc_value, op1)?;

    txn.create_symbolic_expression(inst.address, dest_new, &dest, "cmpxchg: dest", tainted)?;
    txn.create_symbolic_expression(inst.address, acc_new, &accumulator, "cmpxchg: accumulator", tainted)?;
    txn.create_symbolic_flag_expression(inst.address, cf, FlagId::Cf, "cf");
    txn.create_symbolic_flag_expression(inst.address, af, FlagId::Af, "af");
    txn.create_symbolic_flag_expression(inst.address, pf, FlagId::Pf, "pf");
    txn.create_symbolic_flag_expression(inst.address, zf, FlagId::Zf, "zf");
    txn.create_symbolic_flag_expression(inst.address, sf, FlagId::Sf, "sf");
    txn.create_symbolic_flag_expression(inst.address, of, FlagId::Of, "of");
    Ok(())
}

/// `XADD dest, src` — `tmp := dest + src; src := dest (old); dest := tmp`.
/// Architecturally "add, then exchange": the sum lands in `dest` exactly as
/// a plain `ADD` would (same status flags), while `src` is left holding the
/// pre-instruction `dest`, the one operand whose final value the add itself
/// never touches.
pub fn xadd(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let width = dest.bit_size();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;
    let sum = txn.ast().binary(BinaryOp::BvAdd, op1.clone(), op2.clone())?;
    let cf = flags::cf_add(txn.ast(), &sum, &op1, &op2, width)?;
    let of = flags::of_add(txn.ast(), &sum, &op1, &op2, width)?;
    let af = flags::af_add_sub(txn.ast(), &sum, &op1, &op2, width)?;
    let pf = flags::pf(txn.ast(), &sum)?;
    let zf = flags::zf(txn.ast(), &sum, width)?;
    let sf = flags::sf(txn.ast(), &sum, width)?;

    // `src` ends up holding the old `dest`; its taint follows the old
    // `dest` alone, not the union, since nothing from `src` survives into
    // it.
    let dest_tainted_before = taint::operand_is_tainted(txn, &dest);
    txn.create_symbolic_expression(inst.address, op1, &src, "xadd: src = old dest", dest_tainted_before)?;
    txn.create_symbolic_expression(inst.address, sum, &dest, "xadd: dest = sum", tainted)?;
    txn.create_symbolic_flag_expression(inst.address, cf, FlagId::Cf, "cf");
    txn.create_symbolic_flag_expression(inst.address, af, FlagId::Af, "af");
    txn.create_symbolic_flag_expression(inst.address, pf, FlagId::Pf, "pf");
    txn.create_symbolic_flag_expression(inst.address, zf, FlagId::Zf, "zf");
    txn.create_symbolic_flag_expression(inst.address, sf, FlagId::Sf, "sf");
    txn.create_symbolic_flag_expression(inst.address, of, FlagId::Of, "of");
    Ok(())
}

fn accumulator_name(width: u32) -> GpRegisterName {
    match width {
        8 => GpRegisterName::Al,
        16 => GpRegisterName::Ax,
        32 => GpRegisterName::Eax,
        64 => GpRegisterName::Rax,
        _ => unreachable!("operand widths are restricted to {{8,16,32,64}} by the decoder"),
    }
}
