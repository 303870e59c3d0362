//! `MUL`, `IMUL`, `DIV`, `IDIV` (spec.md §4.6 "muldiv").
//!
//! The one-operand forms (`MUL`/`DIV`/`IDIV src`) read an implicit
//! accumulator, widen it to double `src`'s width, and split the result back
//! across a low/high register pair. x86 only breaks that uniform pattern
//! at 8 bits, where the "pair" is a single 16-bit `AX`/`AH:AL` instead of
//! two full registers — [`accumulator`] spells out that one exception so
//! every handler below can stay generic over the rest.

use crate::ast::{
    Ast,
    BinaryOp,
};
use crate::error::BuildResult;
use crate::flags;
use crate::instruction::Instruction;
use crate::operand::OperandWrapper;
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

/// The accumulator registers for a one-operand multiply/divide against an
/// operand of width `w`: `(low_in, low_out, high_out)`. For 8-bit, the
/// input is `AL` but the combined result is written whole to `AX`, so
/// `low_out` covers both halves and `high_out` is `None`.
struct Accumulator {
    low_in: GpRegisterName,
    low_out: GpRegisterName,
    high_out: Option<GpRegisterName>,
}

fn accumulator(width: u32) -> Accumulator {
    match width {
        8 => Accumulator {
            low_in: GpRegisterName::Al,
            low_out: GpRegisterName::Ax,
            high_out: None,
        },
        16 => Accumulator {
            low_in: GpRegisterName::Ax,
            low_out: GpRegisterName::Ax,
            high_out: Some(GpRegisterName::Dx),
        },
        32 => Accumulator {
            low_in: GpRegisterName::Eax,
            low_out: GpRegisterName::Eax,
            high_out: Some(GpRegisterName::Edx),
        },
        64 => Accumulator {
            low_in: GpRegisterName::Rax,
            low_out: GpRegisterName::Rax,
            high_out: Some(GpRegisterName::Rdx),
        },
        _ => unreachable!("operand widths are restricted to {{8,16,32,64}} by the decoder"),
    }
}

fn extend(txn: &mut InstructionTxn<'_>, value: Ast, width: u32, signed: bool) -> BuildResult<Ast> {
    if signed {
        txn.ast().sign_extend(width, value)
    } else {
        txn.ast().zero_extend(width, value)
    }
}

/// `MUL src` — unsigned multiply of the accumulator by `src`.
pub fn mul(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    one_operand_multiply(txn, inst, false)
}

/// `IMUL dest, src` — two-operand signed multiply, truncated to `dest`'s
/// width. (The one-operand `IMUL src` form shares [`one_operand_multiply`]
/// via a signed flag; this crate only wires up the two-operand encoding,
/// which is what modern compilers emit.)
pub fn imul(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;
    let width = dest.bit_size();
    let op1_ext = txn.ast().sign_extend(width, op1)?;
    let op2_ext = txn.ast().sign_extend(width, op2)?;
    let full = txn.ast().binary(BinaryOp::BvMul, op1_ext, op2_ext)?;
    let truncated = txn.ast().extract(width - 1, 0, full.clone())?;
    let narrow_sext = txn.ast().sign_extend(width, truncated.clone())?;
    let cf = flags::cf_of_imul(txn.ast(), &narrow_sext, &full)?;
    txn.create_symbolic_expression(inst.address, truncated, &dest, "imul", tainted)?;
    txn.create_symbolic_flag_expression(inst.address, cf.clone(), FlagId::Cf, "cf");
    txn.create_symbolic_flag_expression(inst.address, cf, FlagId::Of, "of");
    Ok(())
}

fn one_operand_multiply(txn: &mut InstructionTxn<'_>, inst: &Instruction, signed: bool) -> BuildResult<()> {
    let src = operand(inst, 0)?.clone();
    let width = src.bit_size();
    let acc = accumulator(width);
    let low_in_operand = OperandWrapper::register(acc.low_in);

    let op1 = txn.build_symbolic_operand(&low_in_operand)?;
    let op2 = txn.build_symbolic_operand(&src)?;
    let tainted = taint::union(
        taint::operand_is_tainted(txn, &low_in_operand),
        taint::operand_is_tainted(txn, &src),
    );

    let op1_wide = extend(txn, op1, width, signed)?;
    let op2_wide = extend(txn, op2, width, signed)?;
    let full = txn.ast().binary(BinaryOp::BvMul, op1_wide, op2_wide)?;

    let cf = if let Some(high_out) = acc.high_out {
        let low_half = txn.ast().extract(width - 1, 0, full.clone())?;
        let high_half = txn.ast().extract(width * 2 - 1, width, full)?;
        let low_out_operand = OperandWrapper::register(acc.low_out);
        let high_out_operand = OperandWrapper::register(high_out);
        txn.create_symbolic_expression(inst.address, low_half, &low_out_operand, "product low", tainted)?;
        txn.create_symbolic_expression(inst.address, high_half.clone(), &high_out_operand, "product high", tainted)?;
        let zero = txn.ast().const_(0, width)?;
        txn.ast().equal(high_half, zero)?
    } else {
        let low_out_operand = OperandWrapper::register(acc.low_out);
        txn.create_symbolic_expression(inst.address, full.clone(), &low_out_operand, "product", tainted)?;
        let high_half = txn.ast().extract(width * 2 - 1, width, full)?;
        let zero = txn.ast().const_(0, width)?;
        txn.ast().equal(high_half, zero)?
    };
    let zero1 = txn.ast().const_(0, 1)?;
    let one1 = txn.ast().const_(1, 1)?;
    // cf == 1 iff the high half is *not* zero.
    let cf = txn.ast().ite(cf, zero1, one1)?;
    txn.create_symbolic_flag_expression(inst.address, cf.clone(), FlagId::Cf, "cf");
    txn.create_symbolic_flag_expression(inst.address, cf, FlagId::Of, "of");
    Ok(())
}

/// `DIV src` — unsigned divide of the accumulator pair by `src`.
pub fn div(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    one_operand_divide(txn, inst, false)
}

/// `IDIV src` — signed divide of the accumulator pair by `src`.
pub fn idiv(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    one_operand_divide(txn, inst, true)
}

fn one_operand_divide(txn: &mut InstructionTxn<'_>, inst: &Instruction, signed: bool) -> BuildResult<()> {
    let src = operand(inst, 0)?.clone();
    let width = src.bit_size();
    let acc = accumulator(width);

    // The dividend is always the full double-width accumulator value: for
    // width 8 that is `AX` itself (one register); for wider forms it is
    // `high:low` concatenated.
    let dividend = if let Some(high_out) = acc.high_out {
        let low_operand = OperandWrapper::register(acc.low_in);
        let high_operand = OperandWrapper::register(high_out);
        let low = txn.build_symbolic_operand(&low_operand)?;
        let high = txn.build_symbolic_operand(&high_operand)?;
        txn.ast().concat(vec![high, low])?
    } else {
        let ax_operand = OperandWrapper::register(acc.low_out);
        txn.build_symbolic_operand(&ax_operand)?
    };

    let op2 = txn.build_symbolic_operand(&src)?;
    let tainted = taint::union(
        taint::operand_is_tainted(txn, &OperandWrapper::register(acc.low_in)),
        taint::operand_is_tainted(txn, &src),
    );
    let op2_wide = extend(txn, op2, width, signed)?;

    let (div_op, rem_op) = if signed {
        (BinaryOp::BvSdiv, BinaryOp::BvSrem)
    } else {
        (BinaryOp::BvUdiv, BinaryOp::BvUrem)
    };
    let quotient = txn.ast().binary(div_op, dividend.clone(), op2_wide.clone())?;
    let remainder = txn.ast().binary(rem_op, dividend, op2_wide)?;
    let quotient_narrow = txn.ast().extract(width - 1, 0, quotient)?;
    let remainder_narrow = txn.ast().extract(width - 1, 0, remainder)?;

    let quotient_operand = OperandWrapper::register(acc.low_in);
    txn.create_symbolic_expression(inst.address, quotient_narrow, &quotient_operand, "quotient", tainted)?;
    let remainder_operand = match acc.high_out {
        Some(high_out) => OperandWrapper::register(high_out),
        None => OperandWrapper::register(GpRegisterName::Ah),
    };
    txn.create_symbolic_expression(inst.address, remainder_narrow, &remainder_operand, "remainder", tainted)?;
    Ok(())
}
