//! Register taxonomy (spec.md §6 "Register name taxonomy", C2 support).
//!
//! Every named x86/x86-64 register is either a *parent* register (the
//! widest form of a general-purpose register, or `RIP`) or a named *slice*
//! of one, e.g. `AH` is bits `15..8` of `AX`/`EAX`/`RAX`. The symbolic state
//! (C3) only ever stores an expression per parent register; slices are a
//! view computed by the operand builder (C4).

use strum::EnumIter;

/// The sixteen general-purpose parent registers plus the program counter.
/// `R8`..`R15` only exist in 64-bit mode; constructing an operand against
/// them in 16/32-bit mode is a decoder-level concern, not this crate's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[non_exhaustive]
pub enum ParentRegister {
    /// `RAX`
    Rax,
    /// `RBX`
    Rbx,
    /// `RCX`
    Rcx,
    /// `RDX`
    Rdx,
    /// `RSP`
    Rsp,
    /// `RBP`
    Rbp,
    /// `RSI`
    Rsi,
    /// `RDI`
    Rdi,
    /// `R8`
    R8,
    /// `R9`
    R9,
    /// `R10`
    R10,
    /// `R11`
    R11,
    /// `R12`
    R12,
    /// `R13`
    R13,
    /// `R14`
    R14,
    /// `R15`
    R15,
    /// `RIP` / program counter.
    Rip,
}

/// A status/control flag. Each is modeled as its own 1-bit architectural
/// location in the symbolic state, distinct from the general-purpose
/// register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum FlagId {
    /// Carry flag.
    Cf,
    /// Parity flag.
    Pf,
    /// Auxiliary carry (adjust) flag.
    Af,
    /// Zero flag.
    Zf,
    /// Sign flag.
    Sf,
    /// Overflow flag.
    Of,
    /// Direction flag.
    Df,
}

/// A contiguous bit slice `[high, low]` within a parent register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterSlice {
    /// The parent register this slice projects into.
    pub parent: ParentRegister,
    /// Inclusive high bit index within the parent.
    pub high: u32,
    /// Inclusive low bit index within the parent.
    pub low: u32,
}

impl RegisterSlice {
    /// Width in bits of this slice.
    pub const fn width(&self) -> u32 {
        self.high - self.low + 1
    }

    /// A slice spanning the full width of `parent` in the given mode.
    pub const fn full(parent: ParentRegister, parent_width: u32) -> Self {
        RegisterSlice {
            parent,
            high: parent_width - 1,
            low: 0,
        }
    }
}

macro_rules! named_gp_registers {
    ($($name:ident => $parent:ident [$high:expr, $low:expr]),+ $(,)?) => {
        /// A named general-purpose register, as it would appear in
        /// disassembly (`AH`, `EAX`, `R9D`, ...).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
        #[allow(missing_docs)]
        pub enum GpRegisterName {
            $($name),+
        }

        impl GpRegisterName {
            /// The slice this name projects within its parent register.
            pub const fn slice(self) -> RegisterSlice {
                match self {
                    $(Self::$name => RegisterSlice {
                        parent: ParentRegister::$parent,
                        high: $high,
                        low: $low,
                    }),+
                }
            }
        }
    };
}

named_gp_registers! {
    Rax => Rax [63, 0], Eax => Rax [31, 0], Ax => Rax [15, 0], Ah => Rax [15, 8], Al => Rax [7, 0],
    Rbx => Rbx [63, 0], Ebx => Rbx [31, 0], Bx => Rbx [15, 0], Bh => Rbx [15, 8], Bl => Rbx [7, 0],
    Rcx => Rcx [63, 0], Ecx => Rcx [31, 0], Cx => Rcx [15, 0], Ch => Rcx [15, 8], Cl => Rcx [7, 0],
    Rdx => Rdx [63, 0], Edx => Rdx [31, 0], Dx => Rdx [15, 0], Dh => Rdx [15, 8], Dl => Rdx [7, 0],
    Rsp => Rsp [63, 0], Esp => Rsp [31, 0], Sp => Rsp [15, 0], Spl => Rsp [7, 0],
    Rbp => Rbp [63, 0], Ebp => Rbp [31, 0], Bp => Rbp [15, 0], Bpl => Rbp [7, 0],
    Rsi => Rsi [63, 0], Esi => Rsi [31, 0], Si => Rsi [15, 0], Sil => Rsi [7, 0],
    Rdi => Rdi [63, 0], Edi => Rdi [31, 0], Di => Rdi [15, 0], Dil => Rdi [7, 0],
    R8 => R8 [63, 0], R8d => R8 [31, 0], R8w => R8 [15, 0], R8b => R8 [7, 0],
    R9 => R9 [63, 0], R9d => R9 [31, 0], R9w => R9 [15, 0], R9b => R9 [7, 0],
    R10 => R10 [63, 0], R10d => R10 [31, 0], R10w => R10 [15, 0], R10b => R10 [7, 0],
    R11 => R11 [63, 0], R11d => R11 [31, 0], R11w => R11 [15, 0], R11b => R11 [7, 0],
    R12 => R12 [63, 0], R12d => R12 [31, 0], R12w => R12 [15, 0], R12b => R12 [7, 0],
    R13 => R13 [63, 0], R13d => R13 [31, 0], R13w => R13 [15, 0], R13b => R13 [7, 0],
    R14 => R14 [63, 0], R14d => R14 [31, 0], R14w => R14 [15, 0], R14b => R14 [7, 0],
    R15 => R15 [63, 0], R15d => R15 [31, 0], R15w => R15 [15, 0], R15b => R15 [7, 0],
    Rip => Rip [63, 0], Eip => Rip [31, 0],
}

/// The sixteen 128-bit SIMD registers (`XMM0`..`XMM15`). Kept as a
/// register file separate from [`ParentRegister`] rather than folded in:
/// the general-purpose file is uniformly 64-bit-wide and initialized that
/// way in [`crate::state::SymbolicState::new`], and XMM registers have no
/// sub-slice names of their own (this core does not model the legacy
/// x87/MMX aliasing), so giving them their own small enum and map is
/// simpler than stretching `ParentRegister` to carry two different widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[allow(missing_docs)]
pub enum XmmRegister {
    Xmm0,
    Xmm1,
    Xmm2,
    Xmm3,
    Xmm4,
    Xmm5,
    Xmm6,
    Xmm7,
    Xmm8,
    Xmm9,
    Xmm10,
    Xmm11,
    Xmm12,
    Xmm13,
    Xmm14,
    Xmm15,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ah_projects_bits_15_8_of_rax() {
        let slice = GpRegisterName::Ah.slice();
        assert_eq!(slice.parent, ParentRegister::Rax);
        assert_eq!((slice.high, slice.low), (15, 8));
        assert_eq!(slice.width(), 8);
    }

    #[test]
    fn eax_projects_low_32_of_rax() {
        let slice = GpRegisterName::Eax.slice();
        assert_eq!(slice.parent, ParentRegister::Rax);
        assert_eq!((slice.high, slice.low), (31, 0));
        assert_eq!(slice.width(), 32);
    }

    #[test]
    fn full_slice_spans_requested_width() {
        let slice = RegisterSlice::full(ParentRegister::Rbx, 64);
        assert_eq!(slice.width(), 64);
        assert_eq!(slice.low, 0);
    }
}
