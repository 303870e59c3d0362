//! Canonical AST constructors for the six x86 status flags (C5, spec.md
//! §4.5). One function per `(flag, operator family)` pair named in the
//! spec's table; handlers in [`crate::semantics`] call these after writing
//! their destination, the same way `interpreter/alu.rs`'s own ALU helpers
//! are small free functions threaded explicit
//! register handles rather than methods on a god object.
//!
//! Every function here is pure: given the already-built `r` (the relevant
//! result bits), `op1`/`op2` (the operand ASTs used to compute the result),
//! and the destination `width`, it returns the 1-bit AST for that flag. None
//! of them consult concrete state; "unchanged unless count != 0" gating is
//! expressed with [`gate_unless_nonzero`], not a Rust-level branch, so the
//! produced AST is the same whether or not the count happens to be zero in
//! this particular trace.

use crate::ast::{
    Ast,
    AstContext,
    BinaryOp,
    UnaryOp,
    Width,
};
use crate::error::BuildResult;

/// `ite(count == 0, old, new)`. Used by every shift/rotate flag whose value
/// is left untouched when the (masked) count is zero.
pub fn gate_unless_nonzero(
    ast: &mut AstContext,
    count: &Ast,
    old: Ast,
    new: Ast,
) -> BuildResult<Ast> {
    let width = count.width().unwrap_or(64);
    let zero = ast.const_(0, width)?;
    let is_zero = ast.equal(count.clone(), zero)?;
    ast.ite(is_zero, old, new)
}

/// AF for ADD/SUB/INC/DEC/SBB/ADC: `((r ^ op1 ^ op2) & 0x10) == 0x10`.
pub fn af_add_sub(ast: &mut AstContext, r: &Ast, op1: &Ast, op2: &Ast, width: Width) -> BuildResult<Ast> {
    let x = ast.binary(BinaryOp::BvXor, r.clone(), op1.clone())?;
    let x = ast.binary(BinaryOp::BvXor, x, op2.clone())?;
    let mask = ast.const_(0x10, width)?;
    let masked = ast.binary(BinaryOp::BvAnd, x, mask.clone())?;
    ast.equal(masked, mask)
}

/// AF for NEG: `((op1 ^ r) & 0x10) == 0x10`.
pub fn af_neg(ast: &mut AstContext, r: &Ast, op1: &Ast, width: Width) -> BuildResult<Ast> {
    let x = ast.binary(BinaryOp::BvXor, op1.clone(), r.clone())?;
    let mask = ast.const_(0x10, width)?;
    let masked = ast.binary(BinaryOp::BvAnd, x, mask.clone())?;
    ast.equal(masked, mask)
}

/// CF for ADD: `((op1 & op2) ^ ((op1 ^ op2 ^ r) & (op1 ^ op2)))[w-1]`.
pub fn cf_add(ast: &mut AstContext, r: &Ast, op1: &Ast, op2: &Ast, width: Width) -> BuildResult<Ast> {
    let and12 = ast.binary(BinaryOp::BvAnd, op1.clone(), op2.clone())?;
    let xor12 = ast.binary(BinaryOp::BvXor, op1.clone(), op2.clone())?;
    let xor12r = ast.binary(BinaryOp::BvXor, xor12.clone(), r.clone())?;
    let rhs = ast.binary(BinaryOp::BvAnd, xor12r, xor12)?;
    let whole = ast.binary(BinaryOp::BvXor, and12, rhs)?;
    ast.extract(width - 1, width - 1, whole)
}

/// CF for SUB: `((op1 ^ op2 ^ r) ^ ((op1 ^ r) & (op1 ^ op2)))[w-1]`.
pub fn cf_sub(ast: &mut AstContext, r: &Ast, op1: &Ast, op2: &Ast, width: Width) -> BuildResult<Ast> {
    let xor12 = ast.binary(BinaryOp::BvXor, op1.clone(), op2.clone())?;
    let xor12r = ast.binary(BinaryOp::BvXor, xor12.clone(), r.clone())?;
    let xor1r = ast.binary(BinaryOp::BvXor, op1.clone(), r.clone())?;
    let rhs = ast.binary(BinaryOp::BvAnd, xor1r, xor12)?;
    let whole = ast.binary(BinaryOp::BvXor, xor12r, rhs)?;
    ast.extract(width - 1, width - 1, whole)
}

/// CF/OF shared formula for MUL and NEG: `op1 == 0 ? 0 : 1`.
pub fn cf_of_mul_neg(ast: &mut AstContext, op1: &Ast, width: Width) -> BuildResult<Ast> {
    let zero = ast.const_(0, width)?;
    let is_zero = ast.equal(op1.clone(), zero)?;
    let zero1 = ast.const_(0, 1)?;
    let one1 = ast.const_(1, 1)?;
    ast.ite(is_zero, zero1, one1)
}

/// CF/OF shared formula for IMUL: `sign_extend(op1, to width) == res ? 0 : 1`,
/// i.e. the full-precision product is not representable at the narrow
/// destination width.
pub fn cf_of_imul(ast: &mut AstContext, narrow_sext: &Ast, full_res: &Ast) -> BuildResult<Ast> {
    let eq = ast.equal(narrow_sext.clone(), full_res.clone())?;
    let zero1 = ast.const_(0, 1)?;
    let one1 = ast.const_(1, 1)?;
    ast.ite(eq, one1, zero1)
}

/// OF for ADD: `((op1 ^ ~op2) & (op1 ^ r))[w-1]`.
pub fn of_add(ast: &mut AstContext, r: &Ast, op1: &Ast, op2: &Ast, width: Width) -> BuildResult<Ast> {
    let not_op2 = ast.unary(UnaryOp::BvNot, op2.clone())?;
    let lhs = ast.binary(BinaryOp::BvXor, op1.clone(), not_op2)?;
    let rhs = ast.binary(BinaryOp::BvXor, op1.clone(), r.clone())?;
    let whole = ast.binary(BinaryOp::BvAnd, lhs, rhs)?;
    ast.extract(width - 1, width - 1, whole)
}

/// OF for SUB: `((op1 ^ op2) & (op1 ^ r))[w-1]`.
pub fn of_sub(ast: &mut AstContext, r: &Ast, op1: &Ast, op2: &Ast, width: Width) -> BuildResult<Ast> {
    let lhs = ast.binary(BinaryOp::BvXor, op1.clone(), op2.clone())?;
    let rhs = ast.binary(BinaryOp::BvXor, op1.clone(), r.clone())?;
    let whole = ast.binary(BinaryOp::BvAnd, lhs, rhs)?;
    ast.extract(width - 1, width - 1, whole)
}

/// OF for NEG: `((r & op1) << (w-1))[0]`.
pub fn of_neg(ast: &mut AstContext, r: &Ast, op1: &Ast, width: Width) -> BuildResult<Ast> {
    let anded = ast.binary(BinaryOp::BvAnd, r.clone(), op1.clone())?;
    let shift = ast.const_(u128::from(width - 1), width)?;
    let shifted = ast.binary(BinaryOp::BvShl, anded, shift)?;
    ast.extract(0, 0, shifted)
}

/// Parity flag: 1 iff the low 8 bits of `r` have an even number of set bits.
/// Built by XOR-reducing the 8 bits pairwise rather than enumerating masks.
pub fn pf(ast: &mut AstContext, r: &Ast) -> BuildResult<Ast> {
    let width = r.width().ok_or(crate::error::BuildError::OutOfRangeSlice)?;
    debug_assert!(width >= 8);
    let mut acc = ast.extract(0, 0, r.clone())?;
    for bit in 1..8u32 {
        let b = ast.extract(bit, bit, r.clone())?;
        acc = ast.binary(BinaryOp::BvXor, acc, b)?;
    }
    let zero1 = ast.const_(0, 1)?;
    ast.equal(acc, zero1)
}

/// Sign flag: the top bit of the destination slice.
pub fn sf(ast: &mut AstContext, r: &Ast, width: Width) -> BuildResult<Ast> {
    ast.extract(width - 1, width - 1, r.clone())
}

/// Zero flag: `r == 0`.
pub fn zf(ast: &mut AstContext, r: &Ast, width: Width) -> BuildResult<Ast> {
    let zero = ast.const_(0, width)?;
    ast.equal(r.clone(), zero)
}

/// Zero flag for BSF/BSR: `source == 0`.
pub fn zf_bsf_bsr(ast: &mut AstContext, source: &Ast, width: Width) -> BuildResult<Ast> {
    zf(ast, source, width)
}

/// CF for SHL, given the *unmasked* count: `(op1 >>u (w - (count & (w-1))))[0]`.
/// Only meaningful when the masked count is nonzero; callers gate with
/// [`gate_unless_nonzero`].
pub fn cf_shl(ast: &mut AstContext, op1: &Ast, masked_count: &Ast, width: Width) -> BuildResult<Ast> {
    let w = ast.const_(u128::from(width), width)?;
    let shift_amount = ast.binary(BinaryOp::BvSub, w, masked_count.clone())?;
    let shifted = ast.binary(BinaryOp::BvLshr, op1.clone(), shift_amount)?;
    ast.extract(0, 0, shifted)
}

/// CF for SHR: `(op1 >>u ((count & (w-1)) - 1))[0]`.
pub fn cf_shr(ast: &mut AstContext, op1: &Ast, masked_count: &Ast, width: Width) -> BuildResult<Ast> {
    let one = ast.const_(1, width)?;
    let shift_amount = ast.binary(BinaryOp::BvSub, masked_count.clone(), one)?;
    let shifted = ast.binary(BinaryOp::BvLshr, op1.clone(), shift_amount)?;
    ast.extract(0, 0, shifted)
}

/// CF for SAR: arithmetic-shift variant of [`cf_shr`], saturating at
/// `count > w` (the last bit shifted out is always the sign bit once the
/// count reaches the width).
pub fn cf_sar(ast: &mut AstContext, op1: &Ast, masked_count: &Ast, width: Width) -> BuildResult<Ast> {
    let one = ast.const_(1, width)?;
    let shift_amount = ast.binary(BinaryOp::BvSub, masked_count.clone(), one)?;
    let shifted = ast.binary(BinaryOp::BvAshr, op1.clone(), shift_amount)?;
    ast.extract(0, 0, shifted)
}

/// OF for SHL: defined only when the masked count == 1:
/// `op1[w-1] ^ op1[w-2]`.
pub fn of_shl(ast: &mut AstContext, op1: &Ast, width: Width) -> BuildResult<Ast> {
    let top = ast.extract(width - 1, width - 1, op1.clone())?;
    let next = ast.extract(width - 2, width - 2, op1.clone())?;
    ast.binary(BinaryOp::BvXor, top, next)
}

/// OF for SHR: defined only when the masked count == 1: `op1[w-1]`.
pub fn of_shr(ast: &mut AstContext, op1: &Ast, width: Width) -> BuildResult<Ast> {
    ast.extract(width - 1, width - 1, op1.clone())
}

/// OF for SAR: defined only when the masked count == 1: always `0`.
pub fn of_sar(ast: &mut AstContext) -> BuildResult<Ast> {
    ast.const_(0, 1)
}

/// OF for ROL/RCL: defined only when count == 1: `cf_new ^ r[w-1]`.
pub fn of_rol(ast: &mut AstContext, cf_new: &Ast, r: &Ast, width: Width) -> BuildResult<Ast> {
    let top = ast.extract(width - 1, width - 1, r.clone())?;
    ast.binary(BinaryOp::BvXor, cf_new.clone(), top)
}

/// OF for ROR/RCR: defined only when count == 1: `r[w-1] ^ r[w-2]`.
pub fn of_ror(ast: &mut AstContext, r: &Ast, width: Width) -> BuildResult<Ast> {
    let top = ast.extract(width - 1, width - 1, r.clone())?;
    let next = ast.extract(width - 2, width - 2, r.clone())?;
    ast.binary(BinaryOp::BvXor, top, next)
}
