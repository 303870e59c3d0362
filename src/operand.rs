//! Operand wrapper (C2, spec.md §3 "Operand wrapper" / §4.2).
//!
//! An [`OperandWrapper`] is what a decoder hands the builder for one operand
//! of an instruction: a register slice, a memory reference, or an
//! immediate. It carries only what the builder needs to construct an AST and
//! to know where a result should land — it does not resolve memory addresses
//! itself (that is the caller's job, same division of labour as the
//! `RegKey`/`Reg<'_, INDEX>` split between "which register" and
//! "what is its value").

use crate::register::{
    GpRegisterName,
    RegisterSlice,
    XmmRegister,
};

/// One operand of a decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandWrapper {
    /// A named general-purpose register or bit-slice of one.
    Register(RegisterOperand),
    /// A memory reference, already resolved to a concrete effective address
    /// by the caller (LEA's own address computation is a pure-AST
    /// operation and does not go through this variant; see
    /// [`crate::state::SymbolicState::effective_address`]).
    Memory(MemoryOperand),
    /// An immediate value sign- or zero-extended to its declared width.
    Immediate(ImmediateOperand),
    /// A whole 128-bit SIMD register, used by `semantics::simd`.
    Xmm(XmmOperand),
}

impl OperandWrapper {
    /// Width in bits of this operand.
    pub const fn bit_size(&self) -> u32 {
        match self {
            OperandWrapper::Register(r) => r.slice.width(),
            OperandWrapper::Memory(m) => m.size_bits,
            OperandWrapper::Immediate(i) => i.size_bits,
            OperandWrapper::Xmm(_) => 128,
        }
    }

    /// Inclusive high bit index of this operand *within its parent
    /// register*, or `bit_size() - 1` for non-register operands. Used by
    /// flag helpers that need "the slice just written", per spec.md §4.5.
    pub const fn abstract_high(&self) -> u32 {
        match self {
            OperandWrapper::Register(r) => r.slice.high,
            _ => self.bit_size() - 1,
        }
    }

    /// Inclusive low bit index of this operand within its parent register,
    /// or `0` for non-register operands.
    pub const fn abstract_low(&self) -> u32 {
        match self {
            OperandWrapper::Register(r) => r.slice.low,
            _ => 0,
        }
    }

    /// Whether this operand can be a write destination. Immediates cannot.
    pub const fn is_writable(&self) -> bool {
        !matches!(self, OperandWrapper::Immediate(_))
    }

    /// Construct a register operand from a named register (`EAX`, `AH`, ...).
    pub const fn register(name: GpRegisterName) -> Self {
        OperandWrapper::Register(RegisterOperand {
            slice: name.slice(),
        })
    }

    /// Construct a memory operand at a known effective address.
    pub const fn memory(address: u64, size_bits: u32) -> Self {
        OperandWrapper::Memory(MemoryOperand { address, size_bits })
    }

    /// Construct an immediate operand.
    pub const fn immediate(value: u128, size_bits: u32) -> Self {
        OperandWrapper::Immediate(ImmediateOperand { value, size_bits })
    }

    /// Construct a SIMD register operand.
    pub const fn xmm(register: XmmRegister) -> Self {
        OperandWrapper::Xmm(XmmOperand { register })
    }
}

/// A register operand: a named slice of a parent register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterOperand {
    /// The slice this operand projects into its parent register.
    pub slice: RegisterSlice,
}

/// A memory operand at a concrete effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryOperand {
    /// Effective address, already computed by the caller.
    pub address: u64,
    /// Access width in bits; always a multiple of 8.
    pub size_bits: u32,
}

/// An immediate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImmediateOperand {
    /// The value, already sign- or zero-extended by the decoder to
    /// `size_bits`.
    pub value: u128,
    /// Declared width in bits.
    pub size_bits: u32,
}

/// A whole 128-bit SIMD register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct XmmOperand {
    /// Which `XMM` register.
    pub register: XmmRegister,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ah_reports_its_slice_bounds() {
        let op = OperandWrapper::register(GpRegisterName::Ah);
        assert_eq!(op.bit_size(), 8);
        assert_eq!(op.abstract_high(), 15);
        assert_eq!(op.abstract_low(), 8);
    }

    #[test]
    fn memory_and_immediate_have_no_parent_offset() {
        let mem = OperandWrapper::memory(0x1000, 32);
        assert_eq!(mem.abstract_low(), 0);
        assert_eq!(mem.abstract_high(), 31);

        let imm = OperandWrapper::immediate(5, 8);
        assert!(!imm.is_writable());
    }
}
