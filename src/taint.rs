//! Taint propagation (C9, spec.md §4.9).
//!
//! Taint is a single bit carried on every [`crate::state::Expression`], not
//! a property of the AST itself — two instructions that build
//! structurally identical ASTs from differently-tainted inputs get
//! differently-tainted expressions. This module holds the two composition
//! rules spec.md names (union for most operators, plain assignment for a
//! straight copy) and a helper to read an operand's current taint out of
//! the symbolic state, the same division of labour [`crate::flags`] uses
//! for its pure formulas.

use crate::operand::OperandWrapper;
use crate::state::InstructionTxn;

/// Combine the taint of two source operands feeding a single result:
/// tainted if *either* input is tainted. Used by every binary arithmetic,
/// logical, shift, and comparison handler.
pub const fn union(a: bool, b: bool) -> bool {
    a || b
}

/// Combine the taint of an arbitrary number of sources, e.g. the per-byte
/// reads backing one memory operand.
pub fn union_all(taints: impl IntoIterator<Item = bool>) -> bool {
    taints.into_iter().any(|t| t)
}

/// The taint a plain copy (`MOV`, `MOVZX`, `MOVSX`, `POP`, ...) assigns to
/// its destination: exactly the source's taint, independent of whatever
/// the destination previously held.
pub const fn assignment(source: bool) -> bool {
    source
}

/// Read the taint of `operand`'s current value out of `txn`. Immediates are
/// never tainted; a register or memory operand is tainted iff the
/// expression currently backing it (or, for memory, any byte in its range)
/// is tainted.
pub fn operand_is_tainted(txn: &InstructionTxn<'_>, operand: &OperandWrapper) -> bool {
    match operand {
        OperandWrapper::Immediate(_) => false,
        OperandWrapper::Register(reg) => txn
            .peek_register_expression(reg.slice.parent)
            .map(|expr| expr.tainted)
            .unwrap_or(false),
        OperandWrapper::Memory(mem) => (0..mem.size_bits / 8)
            .map(|offset| mem.address.wrapping_add(u64::from(offset)))
            .filter_map(|addr| txn.peek_memory_expression(addr))
            .any(|expr| expr.tainted),
        OperandWrapper::Xmm(xmm) => txn
            .peek_xmm_expression(xmm.register)
            .map(|expr| expr.tainted)
            .unwrap_or(false),
    }
}
