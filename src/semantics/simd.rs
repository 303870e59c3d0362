//! `PXOR`, `PADDQ`, `MOVDQU`, and the wider packed/scalar SIMD family
//! (spec.md §3.1 supplement, §4.6 "simd").
//!
//! These operate on whole 128-bit [`crate::operand::OperandWrapper::Xmm`]
//! registers (or a memory operand, for the move/store forms); none of them
//! touch any status flag. Per-lane ops (`PADDQ`, `PCMPEQ*`, the mask-extract
//! family) split the 128-bit operands into fixed-width lanes, work each lane
//! independently, and re-concatenate — the same "split, compute per-lane,
//! reassemble" shape `PADDQ` already used before this module grew. `VEX`
//! `YMM`/`ZMM` state and alignment faults are not modeled anywhere in this
//! file; `VMOVDQA` and the unaligned/aligned move pairs all collapse to the
//! same plain 128-bit copy.

use crate::ast::{
    Ast,
    BinaryOp,
    UnaryOp,
};
use crate::error::BuildResult;
use crate::instruction::Instruction;
use crate::operand::OperandWrapper;
use crate::semantics::{
    operand,
    read_binary_operands,
};
use crate::state::InstructionTxn;
use crate::taint;

/// `PXOR dest, src` — bitwise XOR across the full 128 bits, no per-lane
/// splitting needed since XOR is lane-independent regardless of element
/// width.
pub fn pxor(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_bitwise(txn, inst, BinaryOp::BvXor, "pxor")
}

/// `PAND dest, src` — bitwise AND across the full 128 bits.
pub fn pand(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_bitwise(txn, inst, BinaryOp::BvAnd, "pand")
}

/// `POR dest, src` — bitwise OR across the full 128 bits.
pub fn por(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_bitwise(txn, inst, BinaryOp::BvOr, "por")
}

/// `ANDPS dest, src` — packed single-precision bitwise AND; identical to
/// `PAND` at the bit level, kept as its own mnemonic/opcode pair because
/// the two live in different decoder tables.
pub fn andps(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_bitwise(txn, inst, BinaryOp::BvAnd, "andps")
}

/// `ANDPD dest, src` — packed double-precision bitwise AND.
pub fn andpd(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_bitwise(txn, inst, BinaryOp::BvAnd, "andpd")
}

/// `ORPS dest, src` — packed single-precision bitwise OR.
pub fn orps(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_bitwise(txn, inst, BinaryOp::BvOr, "orps")
}

/// `ORPD dest, src` — packed double-precision bitwise OR.
pub fn orpd(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_bitwise(txn, inst, BinaryOp::BvOr, "orpd")
}

/// `XORPS dest, src` — packed single-precision bitwise XOR.
pub fn xorps(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_bitwise(txn, inst, BinaryOp::BvXor, "xorps")
}

/// `XORPD dest, src` — packed double-precision bitwise XOR.
pub fn xorpd(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_bitwise(txn, inst, BinaryOp::BvXor, "xorpd")
}

fn packed_bitwise(txn: &mut InstructionTxn<'_>, inst: &Instruction, op: BinaryOp, label: &'static str) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;
    let result = txn.ast().binary(op, op1, op2)?;
    txn.create_symbolic_expression(inst.address, result, &dest, label, tainted)?;
    Ok(())
}

/// `PANDN dest, src` — `dest := (!dest) & src`. The one packed bitwise op
/// where operand order matters: it is `dest`'s old value that gets negated,
/// never `src`'s.
pub fn pandn(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_andn(txn, inst, "pandn")
}

/// `ANDNPS dest, src` — packed single-precision `dest := (!dest) & src`.
pub fn andnps(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_andn(txn, inst, "andnps")
}

/// `ANDNPD dest, src` — packed double-precision `dest := (!dest) & src`.
pub fn andnpd(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_andn(txn, inst, "andnpd")
}

fn packed_andn(txn: &mut InstructionTxn<'_>, inst: &Instruction, label: &'static str) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;
    let not_dest = txn.ast().unary(UnaryOp::BvNot, op1)?;
    let result = txn.ast().binary(BinaryOp::BvAnd, not_dest, op2)?;
    txn.create_symbolic_expression(inst.address, result, &dest, label, tainted)?;
    Ok(())
}

/// `PADDQ dest, src` — packed add of two 64-bit lanes, each wrapping
/// independently.
pub fn paddq(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;

    let op1_low = txn.ast().extract(63, 0, op1.clone())?;
    let op1_high = txn.ast().extract(127, 64, op1)?;
    let op2_low = txn.ast().extract(63, 0, op2.clone())?;
    let op2_high = txn.ast().extract(127, 64, op2)?;

    let sum_low = txn.ast().binary(BinaryOp::BvAdd, op1_low, op2_low)?;
    let sum_high = txn.ast().binary(BinaryOp::BvAdd, op1_high, op2_high)?;
    let result = txn.ast().concat(vec![sum_high, sum_low])?;

    txn.create_symbolic_expression(inst.address, result, &dest, "paddq", tainted)?;
    Ok(())
}

/// `PCMPEQB dest, src` — packed compare-equal over 8-bit lanes; each lane
/// becomes all-1s if equal, all-0s otherwise.
pub fn pcmpeqb(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_compare_eq(txn, inst, 8, "pcmpeqb")
}

/// `PCMPEQW dest, src` — packed compare-equal over 16-bit lanes.
pub fn pcmpeqw(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_compare_eq(txn, inst, 16, "pcmpeqw")
}

/// `PCMPEQD dest, src` — packed compare-equal over 32-bit lanes.
pub fn pcmpeqd(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    packed_compare_eq(txn, inst, 32, "pcmpeqd")
}

fn packed_compare_eq(txn: &mut InstructionTxn<'_>, inst: &Instruction, lane_width: u32, label: &'static str) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let (op1, op2, tainted) = read_binary_operands(txn, &dest, &src)?;

    let lanes = 128 / lane_width;
    let ones = txn.ast().const_((1u128 << lane_width) - 1, lane_width)?;
    let zeros = txn.ast().const_(0, lane_width)?;
    let mut lane_results = Vec::with_capacity(lanes as usize);
    for i in (0..lanes).rev() {
        let hi = (i + 1) * lane_width - 1;
        let lo = i * lane_width;
        let l1 = txn.ast().extract(hi, lo, op1.clone())?;
        let l2 = txn.ast().extract(hi, lo, op2.clone())?;
        let eq = txn.ast().equal(l1, l2)?;
        lane_results.push(txn.ast().ite(eq, ones.clone(), zeros.clone())?);
    }
    let result = txn.ast().concat(lane_results)?;
    txn.create_symbolic_expression(inst.address, result, &dest, label, tainted)?;
    Ok(())
}

/// `PMOVMSKB dest, src` — one mask bit per byte lane, taken from each
/// byte's sign (high) bit, zero-extended into the (GPR) destination.
pub fn pmovmskb(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    sign_mask(txn, inst, 8, "pmovmskb")
}

/// `MOVMSKPS dest, src` — one mask bit per packed single (32-bit lane).
pub fn movmskps(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    sign_mask(txn, inst, 32, "movmskps")
}

/// `MOVMSKPD dest, src` — one mask bit per packed double (64-bit lane).
pub fn movmskpd(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    sign_mask(txn, inst, 64, "movmskpd")
}

fn sign_mask(txn: &mut InstructionTxn<'_>, inst: &Instruction, lane_width: u32, label: &'static str) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));

    let lanes = 128 / lane_width;
    let mut bits = Vec::with_capacity(lanes as usize);
    for i in (0..lanes).rev() {
        let sign_bit = (i + 1) * lane_width - 1;
        bits.push(txn.ast().extract(sign_bit, sign_bit, value.clone())?);
    }
    let mask = txn.ast().concat(bits)?;
    let extended = txn.ast().zero_extend(dest.bit_size() - lanes, mask)?;
    txn.create_symbolic_expression(inst.address, extended, &dest, label, tainted)?;
    Ok(())
}

/// `MOVDQU dest, src` — unaligned 128-bit move; this core does not model
/// alignment faults, so it is identical to an aligned move.
pub fn movdqu(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    plain_move(txn, inst, "movdqu")
}

/// `MOVAPS dest, src` — aligned packed-single move; same bits as `MOVDQU`,
/// alignment is not modeled.
pub fn movaps(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    plain_move(txn, inst, "movaps")
}

/// `MOVAPD dest, src` — aligned packed-double move.
pub fn movapd(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    plain_move(txn, inst, "movapd")
}

/// `MOVDQA dest, src` — aligned 128-bit integer move.
pub fn movdqa(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    plain_move(txn, inst, "movdqa")
}

/// `VMOVDQA dest, src` — VEX-encoded aligned 128-bit move. The wider
/// 256-/512-bit `YMM`/`ZMM` forms are out of scope; this core only tracks
/// the low 128 bits a `VMOVDQA xmm, xmm` carries.
pub fn vmovdqa(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    plain_move(txn, inst, "vmovdqa")
}

fn plain_move(txn: &mut InstructionTxn<'_>, inst: &Instruction, label: &'static str) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    txn.create_symbolic_expression(inst.address, value, &dest, label, tainted)?;
    Ok(())
}

/// `MOVNTDQ dest, src` — non-temporal store of a 128-bit integer register
/// to memory. The cache-bypass hint has no observable effect on this
/// core's symbolic state, so it is a plain store.
pub fn movntdq(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    plain_move(txn, inst, "movntdq")
}

/// `MOVNTPS dest, src` — non-temporal store of packed singles.
pub fn movntps(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    plain_move(txn, inst, "movntps")
}

/// `MOVNTPD dest, src` — non-temporal store of packed doubles.
pub fn movntpd(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    plain_move(txn, inst, "movntpd")
}

/// `MOVDDUP dest, src` — duplicate `src`'s low 64 bits into both qword
/// lanes of `dest`.
pub fn movddup(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    let low = txn.ast().extract(63, 0, value)?;
    let result = txn.ast().concat(vec![low.clone(), low])?;
    txn.create_symbolic_expression(inst.address, result, &dest, "movddup", tainted)?;
    Ok(())
}

/// `MOVSHDUP dest, src` — duplicate each 64-bit pair's high single-precision
/// lane across both halves of that pair: `{src3,src3,src1,src1}`.
pub fn movshdup(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    let lane1 = txn.ast().extract(63, 32, value.clone())?;
    let lane3 = txn.ast().extract(127, 96, value)?;
    let result = txn.ast().concat(vec![lane3.clone(), lane3, lane1.clone(), lane1])?;
    txn.create_symbolic_expression(inst.address, result, &dest, "movshdup", tainted)?;
    Ok(())
}

/// `MOVSLDUP dest, src` — duplicate each 64-bit pair's low single-precision
/// lane across both halves of that pair: `{src2,src2,src0,src0}`.
pub fn movsldup(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    let lane0 = txn.ast().extract(31, 0, value.clone())?;
    let lane2 = txn.ast().extract(95, 64, value)?;
    let result = txn.ast().concat(vec![lane2.clone(), lane2, lane0.clone(), lane0])?;
    txn.create_symbolic_expression(inst.address, result, &dest, "movsldup", tainted)?;
    Ok(())
}

/// `MOVD dest, src` — 32-bit move between a GPR and the low lane of an XMM
/// register, direction inferred from which side is the [`OperandWrapper::Xmm`].
/// Moving into the XMM side zero-extends the other 96 bits away, per the
/// architectural "MOVD always clears the rest of the destination" rule.
pub fn movd(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    let result = match dest {
        OperandWrapper::Xmm(_) => txn.ast().zero_extend(dest.bit_size() - src.bit_size(), value)?,
        _ => txn.ast().extract(dest.bit_size() - 1, 0, value)?,
    };
    txn.create_symbolic_expression(inst.address, result, &dest, "movd", tainted)?;
    Ok(())
}

/// `MOVHLPS dest, src` — `dest[63:0] := src[127:64]`; `dest[127:64]` is left
/// untouched. Register-only, no memory form exists in the real ISA.
pub fn movhlps(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let old_dest = txn.build_symbolic_operand(&dest)?;
    let src_value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    let new_low = txn.ast().extract(127, 64, src_value)?;
    let unchanged_high = txn.ast().extract(127, 64, old_dest)?;
    let result = txn.ast().concat(vec![unchanged_high, new_low])?;
    txn.create_symbolic_expression(inst.address, result, &dest, "movhlps", tainted)?;
    Ok(())
}

/// `MOVLHPS dest, src` — `dest[127:64] := src[63:0]`; `dest[63:0]` is left
/// untouched.
pub fn movlhps(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let old_dest = txn.build_symbolic_operand(&dest)?;
    let src_value = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    let new_high = txn.ast().extract(63, 0, src_value)?;
    let unchanged_low = txn.ast().extract(63, 0, old_dest)?;
    let result = txn.ast().concat(vec![new_high, unchanged_low])?;
    txn.create_symbolic_expression(inst.address, result, &dest, "movlhps", tainted)?;
    Ok(())
}

/// `MOVHPS dest, src` — moves the high qword of an XMM register to/from a
/// 64-bit memory operand; whichever side is the XMM register keeps its
/// other half untouched.
pub fn movhps(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    move_half(txn, inst, 127, 64, "movhps")
}

/// `MOVLPS dest, src` — moves the low qword of an XMM register to/from a
/// 64-bit memory operand.
pub fn movlps(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    move_half(txn, inst, 63, 0, "movlps")
}

fn move_half(txn: &mut InstructionTxn<'_>, inst: &Instruction, half_hi: u32, half_lo: u32, label: &'static str) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));

    if matches!(dest, OperandWrapper::Memory(_)) {
        let value = txn.build_symbolic_operand(&src)?;
        let half_value = txn.ast().extract(half_hi, half_lo, value)?;
        txn.create_symbolic_expression(inst.address, half_value, &dest, label, tainted)?;
        return Ok(());
    }

    let old_dest = txn.build_symbolic_operand(&dest)?;
    let new_half = txn.build_symbolic_operand(&src)?;
    let result: Ast = if half_lo == 64 {
        let unchanged_low = txn.ast().extract(63, 0, old_dest)?;
        txn.ast().concat(vec![new_half, unchanged_low])?
    } else {
        let unchanged_high = txn.ast().extract(127, 64, old_dest)?;
        txn.ast().concat(vec![unchanged_high, new_half])?
    };
    txn.create_symbolic_expression(inst.address, result, &dest, label, tainted)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::OpcodeId;
    use crate::register::{
        GpRegisterName,
        XmmRegister,
    };
    use crate::state::SymbolicState;

    #[test]
    fn pxor_self_clears_the_register() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            let seed = txn.ast().const_(0x1234_5678_9abc_def0_u128, 128).unwrap();
            let dest = OperandWrapper::xmm(XmmRegister::Xmm0);
            txn.create_symbolic_expression(0, seed, &dest, "seed", false).unwrap();
            txn.commit();
        }
        let inst = Instruction::new(
            0x1000,
            3,
            OpcodeId::Pxor,
            vec![
                OperandWrapper::xmm(XmmRegister::Xmm0),
                OperandWrapper::xmm(XmmRegister::Xmm0),
            ],
        );
        let mut txn = state.begin();
        pxor(&mut txn, &inst).unwrap();
        txn.commit();
        let mut read_txn = state.begin();
        let xmm0 = read_txn.build_symbolic_operand(&OperandWrapper::xmm(XmmRegister::Xmm0)).unwrap();
        assert_eq!(xmm0.to_string(), "(_ bv0 128)");
    }

    #[test]
    fn paddq_wraps_each_qword_lane_independently() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            // low lane = u64::MAX, high lane = 0.
            let seed = txn.ast().const_(u128::from(u64::MAX), 128).unwrap();
            let dest = OperandWrapper::xmm(XmmRegister::Xmm0);
            txn.create_symbolic_expression(0, seed, &dest, "seed dest", false).unwrap();
            let one = txn.ast().const_(1, 128).unwrap();
            let src = OperandWrapper::xmm(XmmRegister::Xmm1);
            txn.create_symbolic_expression(0, one, &src, "seed src", false).unwrap();
            txn.commit();
        }
        let inst = Instruction::new(
            0x1000,
            4,
            OpcodeId::Paddq,
            vec![
                OperandWrapper::xmm(XmmRegister::Xmm0),
                OperandWrapper::xmm(XmmRegister::Xmm1),
            ],
        );
        let mut txn = state.begin();
        paddq(&mut txn, &inst).unwrap();
        txn.commit();
        let mut read_txn = state.begin();
        let xmm0 = read_txn.build_symbolic_operand(&OperandWrapper::xmm(XmmRegister::Xmm0)).unwrap();
        // low lane wraps to 0, high lane stays 0 — no carry crosses the lane boundary.
        assert_eq!(xmm0.to_string(), "(_ bv0 128)");
    }

    #[test]
    fn pcmpeqd_sets_matching_lanes_to_all_ones() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            // lane0 (bits 31:0) matches between dest/src, lane1 does not.
            let dest_seed = txn.ast().const_(0x0000_0001_0000_0005_u128, 128).unwrap();
            let src_seed = txn.ast().const_(0x0000_0002_0000_0005_u128, 128).unwrap();
            txn.create_symbolic_expression(0, dest_seed, &OperandWrapper::xmm(XmmRegister::Xmm0), "seed dest", false).unwrap();
            txn.create_symbolic_expression(0, src_seed, &OperandWrapper::xmm(XmmRegister::Xmm1), "seed src", false).unwrap();
            txn.commit();
        }
        let inst = Instruction::new(
            0x1000,
            4,
            OpcodeId::Pcmpeqd,
            vec![
                OperandWrapper::xmm(XmmRegister::Xmm0),
                OperandWrapper::xmm(XmmRegister::Xmm1),
            ],
        );
        let mut txn = state.begin();
        pcmpeqd(&mut txn, &inst).unwrap();
        txn.commit();
        let mut read_txn = state.begin();
        let xmm0 = read_txn.build_symbolic_operand(&OperandWrapper::xmm(XmmRegister::Xmm0)).unwrap();
        assert_eq!(xmm0.to_string(), "(_ bv340282366920938463444927863362353627135 128)");
    }

    #[test]
    fn pmovmskb_extracts_one_bit_per_byte_sign() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            // low byte has its sign bit set (0x80), every other byte is 0.
            let seed = txn.ast().const_(0x80, 128).unwrap();
            txn.create_symbolic_expression(0, seed, &OperandWrapper::xmm(XmmRegister::Xmm0), "seed", false).unwrap();
            txn.commit();
        }
        let inst = Instruction::new(
            0x1000,
            4,
            OpcodeId::Pmovmskb,
            vec![
                OperandWrapper::register(GpRegisterName::Eax),
                OperandWrapper::xmm(XmmRegister::Xmm0),
            ],
        );
        let mut txn = state.begin();
        pmovmskb(&mut txn, &inst).unwrap();
        txn.commit();
        let rax = state.register_value(crate::register::ParentRegister::Rax).unwrap();
        assert_eq!(state.expression(rax).unwrap().node.to_string(), "(_ bv1 64)");
    }

    #[test]
    fn movddup_duplicates_the_low_qword() {
        let mut state = SymbolicState::new(true, 64, 0);
        {
            let mut txn = state.begin();
            let seed = txn.ast().const_(0x1234, 128).unwrap();
            txn.create_symbolic_expression(0, seed, &OperandWrapper::xmm(XmmRegister::Xmm1), "seed", false).unwrap();
            txn.commit();
        }
        let inst = Instruction::new(
            0x1000,
            4,
            OpcodeId::Movddup,
            vec![
                OperandWrapper::xmm(XmmRegister::Xmm0),
                OperandWrapper::xmm(XmmRegister::Xmm1),
            ],
        );
        let mut txn = state.begin();
        movddup(&mut txn, &inst).unwrap();
        txn.commit();
        let mut read_txn = state.begin();
        let xmm0 = read_txn.build_symbolic_operand(&OperandWrapper::xmm(XmmRegister::Xmm0)).unwrap();
        assert_eq!(xmm0.to_string(), "(_ bv85961827383486510535220 128)");
    }
}
