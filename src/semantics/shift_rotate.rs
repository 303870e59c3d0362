//! `SHL`/`SAL`, `SHR`, `SAR`, `ROL`, `ROR`, `RCL`, `RCR` (spec.md §4.6
//! "shift_rotate").
//!
//! Every handler here needs the *concrete* shift/rotate count to decide
//! whether CF/OF are touched at all, per the flag table's "defined only
//! when masked count == 1" / "unchanged when masked count == 0" carve-outs
//! (spec.md §4.5 design note, "rotate-count concretization"). The count
//! operand is therefore required to already be a resolved immediate — an
//! external decoder is expected to have folded `CL` into one before handing
//! us the instruction, exactly as the rotate flag helpers in
//! [`crate::flags`] assume.

use crate::ast::BinaryOp;
use crate::error::{
    BuildError,
    BuildResult,
};
use crate::flags;
use crate::instruction::Instruction;
use crate::operand::OperandWrapper;
use crate::register::FlagId;
use crate::semantics::operand;
use crate::state::InstructionTxn;
use crate::taint;

fn concrete_masked_count(count: &OperandWrapper, width: u32) -> BuildResult<u64> {
    match count {
        OperandWrapper::Immediate(imm) => Ok((imm.value as u64) & u64::from(width - 1)),
        _ => Err(BuildError::SymbolicShiftCount),
    }
}

/// `SHL`/`SAL dest, count`.
pub fn shl(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    shift(txn, inst, BinaryOp::BvShl, Direction::Left, false)
}

/// `SHR dest, count`.
pub fn shr(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    shift(txn, inst, BinaryOp::BvLshr, Direction::Right, false)
}

/// `SAR dest, count`.
pub fn sar(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    shift(txn, inst, BinaryOp::BvAshr, Direction::Right, true)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

fn shift(
    txn: &mut InstructionTxn<'_>,
    inst: &Instruction,
    op: BinaryOp,
    direction: Direction,
    arithmetic: bool,
) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let count_operand = operand(inst, 1)?.clone();
    let width = dest.bit_size();
    let masked_count = concrete_masked_count(&count_operand, width)?;

    let op1 = txn.build_symbolic_operand(&dest)?;
    let tainted = taint::operand_is_tainted(txn, &dest);
    let count_ast = txn.ast().const_(u128::from(masked_count), width)?;
    let r = txn.ast().binary(op, op1.clone(), count_ast.clone())?;

    let old_cf = txn.flag_ast(FlagId::Cf)?;
    let old_of = txn.flag_ast(FlagId::Of)?;

    let new_cf = if masked_count == 0 {
        old_cf
    } else {
        match direction {
            Direction::Left => flags::cf_shl(txn.ast(), &op1, &count_ast, width)?,
            Direction::Right if arithmetic => flags::cf_sar(txn.ast(), &op1, &count_ast, width)?,
            Direction::Right => flags::cf_shr(txn.ast(), &op1, &count_ast, width)?,
        }
    };
    let new_of = if masked_count == 1 {
        match direction {
            Direction::Left => flags::of_shl(txn.ast(), &op1, width)?,
            Direction::Right if arithmetic => flags::of_sar(txn.ast())?,
            Direction::Right => flags::of_shr(txn.ast(), &op1, width)?,
        }
    } else {
        old_of
    };

    txn.create_symbolic_expression(inst.address, r.clone(), &dest, "shift", tainted)?;
    txn.create_symbolic_flag_expression(inst.address, new_cf, FlagId::Cf, "cf");
    txn.create_symbolic_flag_expression(inst.address, new_of, FlagId::Of, "of");
    if masked_count != 0 {
        let pf = flags::pf(txn.ast(), &r)?;
        let zf = flags::zf(txn.ast(), &r, width)?;
        let sf = flags::sf(txn.ast(), &r, width)?;
        txn.create_symbolic_flag_expression(inst.address, pf, FlagId::Pf, "pf");
        txn.create_symbolic_flag_expression(inst.address, zf, FlagId::Zf, "zf");
        txn.create_symbolic_flag_expression(inst.address, sf, FlagId::Sf, "sf");
    }
    Ok(())
}

/// `ROL dest, count`.
pub fn rol(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    rotate(txn, inst, BinaryOp::BvRol)
}

/// `ROR dest, count`.
pub fn ror(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    rotate(txn, inst, BinaryOp::BvRor)
}

fn rotate(txn: &mut InstructionTxn<'_>, inst: &Instruction, op: BinaryOp) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let count_operand = operand(inst, 1)?.clone();
    let width = dest.bit_size();
    let masked_count = concrete_masked_count(&count_operand, width)?;

    let op1 = txn.build_symbolic_operand(&dest)?;
    let tainted = taint::operand_is_tainted(txn, &dest);
    let count_decimal = txn.ast().decimal(masked_count);
    let r = txn.ast().binary(op, op1, count_decimal)?;

    let old_cf = txn.flag_ast(FlagId::Cf)?;
    let old_of = txn.flag_ast(FlagId::Of)?;
    let new_cf = if masked_count == 0 {
        old_cf
    } else {
        // The new CF after a rotate is simply the bit that rotated into
        // position 0 (ROR) or width-1 (ROL), i.e. the low/high bit of `r`.
        match op {
            BinaryOp::BvRol => txn.ast().extract(0, 0, r.clone())?,
            BinaryOp::BvRor => txn.ast().extract(width - 1, width - 1, r.clone())?,
            _ => unreachable!("rotate() is only called with BvRol/BvRor"),
        }
    };
    let new_of = if masked_count == 1 {
        match op {
            BinaryOp::BvRol => flags::of_rol(txn.ast(), &new_cf, &r, width)?,
            BinaryOp::BvRor => flags::of_ror(txn.ast(), &r, width)?,
            _ => unreachable!("rotate() is only called with BvRol/BvRor"),
        }
    } else {
        old_of
    };

    txn.create_symbolic_expression(inst.address, r, &dest, "rotate", tainted)?;
    txn.create_symbolic_flag_expression(inst.address, new_cf, FlagId::Cf, "cf");
    txn.create_symbolic_flag_expression(inst.address, new_of, FlagId::Of, "of");
    Ok(())
}

/// `RCL dest, count` — rotate left through carry.
pub fn rcl(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    rotate_through_carry(txn, inst, BinaryOp::BvRol)
}

/// `RCR dest, count` — rotate right through carry.
pub fn rcr(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    rotate_through_carry(txn, inst, BinaryOp::BvRor)
}

/// `RCL`/`RCR` conceptually rotate a `width + 1`-bit value (the operand
/// with CF appended), a bit pattern the plain `rol`/`ror` AST ops don't
/// model directly. Build it explicitly via a widened rotate instead.
fn rotate_through_carry(txn: &mut InstructionTxn<'_>, inst: &Instruction, op: BinaryOp) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let count_operand = operand(inst, 1)?.clone();
    let width = dest.bit_size();
    let masked_count = concrete_masked_count(&count_operand, width + 1)?;

    let op1 = txn.build_symbolic_operand(&dest)?;
    let tainted = taint::operand_is_tainted(txn, &dest);
    let cf = txn.flag_ast(FlagId::Cf)?;
    let old_of = txn.flag_ast(FlagId::Of)?;

    let combined = match op {
        BinaryOp::BvRol => txn.ast().concat(vec![cf, op1])?,
        BinaryOp::BvRor => txn.ast().concat(vec![op1, cf])?,
        _ => unreachable!("rotate_through_carry() is only called with BvRol/BvRor"),
    };
    let count_decimal = txn.ast().decimal(masked_count);
    let rotated = txn.ast().binary(op, combined, count_decimal)?;

    let (r, new_cf) = match op {
        BinaryOp::BvRol => (
            txn.ast().extract(width - 1, 0, rotated.clone())?,
            txn.ast().extract(width, width, rotated)?,
        ),
        BinaryOp::BvRor => (
            txn.ast().extract(width, 1, rotated.clone())?,
            txn.ast().extract(0, 0, rotated)?,
        ),
        _ => unreachable!("rotate_through_carry() is only called with BvRol/BvRor"),
    };
    let new_of = if masked_count == 1 {
        match op {
            BinaryOp::BvRol => flags::of_rol(txn.ast(), &new_cf, &r, width)?,
            BinaryOp::BvRor => flags::of_ror(txn.ast(), &r, width)?,
            _ => unreachable!("rotate_through_carry() is only called with BvRol/BvRor"),
        }
    } else {
        old_of
    };

    txn.create_symbolic_expression(inst.address, r, &dest, "rotate through carry", tainted)?;
    txn.create_symbolic_flag_expression(inst.address, new_cf, FlagId::Cf, "cf");
    txn.create_symbolic_flag_expression(inst.address, new_of, FlagId::Of, "of");
    Ok(())
}
