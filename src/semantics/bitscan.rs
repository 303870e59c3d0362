//! `BSF`, `BSR`, `BSWAP` (spec.md §4.6 "bitscan").
//!
//! Built as a right (BSF) or left (BSR) fold of nested `ite`s over every
//! bit position rather than a loop — the AST has to be a value, not a
//! Rust-level search, so the "first set bit" has to be expressed as a
//! chain of conditionals the way a hardware priority encoder would be.

use crate::ast::Ast;
use crate::error::BuildResult;
use crate::flags;
use crate::instruction::Instruction;
use crate::register::FlagId;
use crate::semantics::operand;
use crate::state::InstructionTxn;
use crate::taint;

/// `BSF dest, src` — index of the least significant set bit, undefined in
/// `dest` (left as-is) when `src == 0`, per the ZF flag signaling that
/// case. This core still has to produce *some* value; it builds the
/// "all-zero" case as the lowest index (0) to keep the AST total, the same
/// preference `interpreter/alu.rs` shows for fully-defined helpers over
/// `Option`-typed ALU results that the caller has to unwrap everywhere.
pub fn bsf(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    scan(txn, inst, ScanDirection::Forward)
}

/// `BSR dest, src` — index of the most significant set bit.
pub fn bsr(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    scan(txn, inst, ScanDirection::Reverse)
}

#[derive(Clone, Copy)]
enum ScanDirection {
    Forward,
    Reverse,
}

fn scan(txn: &mut InstructionTxn<'_>, inst: &Instruction, direction: ScanDirection) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let src = operand(inst, 1)?.clone();
    let source = txn.build_symbolic_operand(&src)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &src));
    let width = src.bit_size();

    let zf = flags::zf_bsf_bsr(txn.ast(), &source, width)?;

    let bit_indices: Vec<u32> = match direction {
        ScanDirection::Forward => (0..width).collect(),
        ScanDirection::Reverse => (0..width).rev().collect(),
    };
    let mut result: Ast = txn.ast().const_(0, width)?;
    // Fold from the far end toward the near end so the near end's `ite`
    // ends up outermost, i.e. checked first.
    for bit in bit_indices.into_iter().rev() {
        let is_set = txn.ast().extract(bit, bit, source.clone())?;
        let one1 = txn.ast().const_(1, 1)?;
        let is_set = txn.ast().equal(is_set, one1)?;
        let index = txn.ast().const_(u128::from(bit), width)?;
        result = txn.ast().ite(is_set, index, result)?;
    }

    txn.create_symbolic_expression(inst.address, result, &dest, "bitscan", tainted)?;
    txn.create_symbolic_flag_expression(inst.address, zf, FlagId::Zf, "zf");
    Ok(())
}

/// `BSWAP dest` — reverse the byte order of a register operand in place.
/// No flags touched. Built as a `concat` of the operand's own bytes taken
/// highest-offset-first, the same byte-at-a-time `extract` little-endian
/// memory reads/writes in `state.rs` use, just reassembled back-to-front.
pub fn bswap(txn: &mut InstructionTxn<'_>, inst: &Instruction) -> BuildResult<()> {
    let dest = operand(inst, 0)?.clone();
    let width = dest.bit_size();
    let value = txn.build_symbolic_operand(&dest)?;
    let tainted = taint::assignment(taint::operand_is_tainted(txn, &dest));

    let byte_count = width / 8;
    let mut bytes = Vec::with_capacity(byte_count as usize);
    // `concat` takes its children most-significant-first; pushing byte 0
    // (the original value's low byte) first makes it the new high byte.
    for i in 0..byte_count {
        bytes.push(txn.ast().extract((i + 1) * 8 - 1, i * 8, value.clone())?);
    }
    let swapped = txn.ast().concat(bytes)?;

    txn.create_symbolic_expression(inst.address, swapped, &dest, "bswap", tainted)?;
    Ok(())
}
