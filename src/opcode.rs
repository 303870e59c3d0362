//! The closed opcode enumeration and its capability table (spec.md §4.6,
//! §9 "supplemented data: instruction metadata").
//!
//! [`OpcodeId`] is deliberately small relative to the x86 mnemonic space:
//! `Jcc`/`SETcc`/`CMOVcc` each take a [`Condition`] payload instead of being
//! enumerated per condition code, the same way `fuel-asm`'s `Instruction` collapses
//! its own family of near-identical opcodes behind one payload-carrying
//! variant instead of one bare variant per mnemonic, keyed by a
//! predicate rather than sixteen opcodes.

use bitflags::bitflags;
use strum::EnumIter;

bitflags! {
    /// Which of the six status flags an opcode is declared to touch.
    /// Used by [`OpcodeInfo`] purely as metadata — the dispatcher does not
    /// consult it to decide which flags to build; the handler itself does
    /// that. It exists for callers that want to know an opcode's flag
    /// footprint without building an instruction against it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FlagMask: u8 {
        /// Carry flag.
        const CF = 0b0000_0001;
        /// Parity flag.
        const PF = 0b0000_0010;
        /// Auxiliary carry flag.
        const AF = 0b0000_0100;
        /// Zero flag.
        const ZF = 0b0000_1000;
        /// Sign flag.
        const SF = 0b0001_0000;
        /// Overflow flag.
        const OF = 0b0010_0000;
        /// All six arithmetic status flags.
        const ALL_STATUS = Self::CF.bits() | Self::PF.bits() | Self::AF.bits()
            | Self::ZF.bits() | Self::SF.bits() | Self::OF.bits();
    }
}

/// A condition code, shared by `Jcc`, `SETcc`, and `CMOVcc` (spec.md §4.6
/// design note: "parameterize over condition rather than enumerate").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Condition {
    /// `O` — overflow.
    Overflow,
    /// `NO` — no overflow.
    NotOverflow,
    /// `B`/`C`/`NAE` — below (unsigned).
    Below,
    /// `AE`/`NB`/`NC` — above or equal (unsigned).
    AboveOrEqual,
    /// `E`/`Z` — equal / zero.
    Equal,
    /// `NE`/`NZ` — not equal / not zero.
    NotEqual,
    /// `BE`/`NA` — below or equal (unsigned).
    BelowOrEqual,
    /// `A`/`NBE` — above (unsigned).
    Above,
    /// `S` — sign set.
    Sign,
    /// `NS` — sign clear.
    NotSign,
    /// `P`/`PE` — parity even.
    ParityEven,
    /// `NP`/`PO` — parity odd.
    ParityOdd,
    /// `L`/`NGE` — less (signed): `SF != OF`.
    Less,
    /// `GE`/`NL` — greater or equal (signed): `SF == OF`.
    GreaterOrEqual,
    /// `LE`/`NG` — less or equal (signed).
    LessOrEqual,
    /// `G`/`NLE` — greater (signed).
    Greater,
}

/// The closed set of instruction mnemonics this core knows how to build an
/// AST for (spec.md §4.6). `#[non_exhaustive]` so that growing the table is
/// not a semver break for downstream matches, same posture as `fuel-asm`'s
/// own `Opcode` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OpcodeId {
    // -- arith --
    /// `ADD`
    Add,
    /// `ADC`
    Adc,
    /// `SUB`
    Sub,
    /// `SBB`
    Sbb,
    /// `INC`
    Inc,
    /// `DEC`
    Dec,
    /// `NEG`
    Neg,
    /// `CMP`
    Cmp,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `XOR`
    Xor,
    /// `NOT`
    Not,
    /// `TEST`
    Test,

    // -- muldiv --
    /// `MUL`
    Mul,
    /// `IMUL`
    Imul,
    /// `DIV`
    Div,
    /// `IDIV`
    Idiv,

    // -- shift_rotate --
    /// `SHL`/`SAL`
    Shl,
    /// `SHR`
    Shr,
    /// `SAR`
    Sar,
    /// `ROL`
    Rol,
    /// `ROR`
    Ror,
    /// `RCL`
    Rcl,
    /// `RCR`
    Rcr,

    // -- mov --
    /// `MOV`
    Mov,
    /// `LEA`
    Lea,
    /// `MOVZX`
    Movzx,
    /// `MOVSX`
    Movsx,
    /// `MOVSXD`
    Movsxd,

    // -- exchange --
    /// `XCHG`
    Xchg,
    /// `CMPXCHG`
    Cmpxchg,
    /// `XADD` — `tmp := dest + src; src := dest; dest := tmp`.
    Xadd,

    // -- stack --
    /// `PUSH`
    Push,
    /// `POP`
    Pop,
    /// `LEAVE` — `RSP := RBP`, then pop into `RBP`.
    Leave,

    // -- bitscan --
    /// `BSF`
    Bsf,
    /// `BSR`
    Bsr,
    /// `BSWAP` — reverse the byte order of a register operand.
    Bswap,

    // -- signext --
    /// `CBW` — sign-extend `AL` into `AX`.
    Cbw,
    /// `CWDE` — sign-extend `AX` into `EAX`.
    Cwde,
    /// `CDQE` — sign-extend `EAX` into `RAX`.
    Cdqe,
    /// `CQO` — sign-extend `RAX` into `RDX:RAX`.
    Cqo,

    // -- control_flow --
    /// Unconditional `JMP`.
    Jmp,
    /// Conditional jump, keyed by [`Condition`].
    Jcc(Condition),
    /// `CALL`
    Call,
    /// `RET`
    Ret,
    /// `SETcc`, keyed by [`Condition`].
    Setcc(Condition),
    /// `CMOVcc`, keyed by [`Condition`].
    Cmovcc(Condition),

    // -- flagops --
    /// `CLC`
    Clc,
    /// `STC`
    Stc,
    /// `CMC`
    Cmc,
    /// `CLD`
    Cld,
    /// `STD`
    Std,
    /// `NOP` — no operation; still advances `RIP`.
    Nop,

    // -- simd (byte/word-wise packed integer ops, spec.md §3.1 supplement) --
    /// `PXOR`
    Pxor,
    /// `PADDB`/`PADDW`/`PADDD`/`PADDQ`, element width carried by the
    /// operand's declared size rather than the opcode id.
    Paddq,
    /// `MOVDQU` (alignment is a decoder/faulting concern this core does not
    /// model; lands here as a plain 128-bit move).
    Movdqu,
    /// `PCMPEQB` — packed compare-equal, 16 byte lanes.
    Pcmpeqb,
    /// `PCMPEQW` — packed compare-equal, 8 word lanes.
    Pcmpeqw,
    /// `PCMPEQD` — packed compare-equal, 4 doubleword lanes.
    Pcmpeqd,
    /// `PMOVMSKB` — sign bit of each of 16 byte lanes packed into a 16-bit
    /// mask in a general-purpose destination.
    Pmovmskb,
    /// `PAND`
    Pand,
    /// `PANDN` — `dest := (NOT dest) AND src`.
    Pandn,
    /// `POR`
    Por,
    /// `ANDPS` — bitwise AND over packed single-precision lanes; identical
    /// to [`OpcodeId::Pand`] at the bit level, this core does not model
    /// floating-point lane semantics.
    Andps,
    /// `ANDPD`
    Andpd,
    /// `ANDNPS`
    Andnps,
    /// `ANDNPD`
    Andnpd,
    /// `ORPS`
    Orps,
    /// `ORPD`
    Orpd,
    /// `XORPS`
    Xorps,
    /// `XORPD`
    Xorpd,
    /// `MOVDDUP` — duplicate the low 64 bits of `src` into both lanes.
    Movddup,
    /// `MOVSHDUP` — duplicate each pair's high 32-bit lane.
    Movshdup,
    /// `MOVSLDUP` — duplicate each pair's low 32-bit lane.
    Movsldup,
    /// `MOVMSKPD` — sign bit of each of 2 qword lanes into a 2-bit mask.
    Movmskpd,
    /// `MOVMSKPS` — sign bit of each of 4 dword lanes into a 4-bit mask.
    Movmskps,
    /// `MOVAPS` — aligned 128-bit move; alignment is not modeled.
    Movaps,
    /// `MOVAPD`
    Movapd,
    /// `MOVDQA`
    Movdqa,
    /// `VMOVDQA` — VEX-encoded form of [`OpcodeId::Movdqa`]; this core does
    /// not model the wider YMM/ZMM state a real VEX encoding can carry, so
    /// it lands on the same 128-bit move.
    Vmovdqa,
    /// `MOVD` — move a doubleword between a general-purpose/memory operand
    /// and the low 32 bits of an XMM register, zero-extending the rest.
    Movd,
    /// `MOVHLPS` — `dest[63:0] := src[127:64]`; `dest[127:64]` unchanged.
    Movhlps,
    /// `MOVLHPS` — `dest[127:64] := src[63:0]`; `dest[63:0]` unchanged.
    Movlhps,
    /// `MOVHPS` — move 64 bits between memory and the high half of an XMM
    /// register.
    Movhps,
    /// `MOVLPS` — move 64 bits between memory and the low half of an XMM
    /// register.
    Movlps,
    /// `MOVNTPS` — non-temporal 128-bit store; the caching hint is not
    /// modeled, so this is a plain store.
    Movntps,
    /// `MOVNTPD`
    Movntpd,
    /// `MOVNTDQ`
    Movntdq,
}

impl OpcodeId {
    /// Static metadata about this opcode. `None` for the handful of opcodes
    /// not yet present in the table (there are none today; the `Option`
    /// exists so adding an `OpcodeId` variant without updating the table is
    /// a quiet miss rather than a panic).
    pub fn info(self) -> Option<OpcodeInfo> {
        use Condition::*;
        use OpcodeId::*;
        Some(match self {
            Add => OpcodeInfo::new(2, FlagMask::ALL_STATUS),
            Adc => OpcodeInfo::new(2, FlagMask::ALL_STATUS),
            Sub => OpcodeInfo::new(2, FlagMask::ALL_STATUS),
            Sbb => OpcodeInfo::new(2, FlagMask::ALL_STATUS),
            Inc => OpcodeInfo::new(1, FlagMask::ALL_STATUS.difference(FlagMask::CF)),
            Dec => OpcodeInfo::new(1, FlagMask::ALL_STATUS.difference(FlagMask::CF)),
            Neg => OpcodeInfo::new(1, FlagMask::ALL_STATUS),
            Cmp => OpcodeInfo::new(2, FlagMask::ALL_STATUS),
            And => OpcodeInfo::new(2, FlagMask::ALL_STATUS),
            Or => OpcodeInfo::new(2, FlagMask::ALL_STATUS),
            Xor => OpcodeInfo::new(2, FlagMask::ALL_STATUS),
            Not => OpcodeInfo::new(1, FlagMask::empty()),
            Test => OpcodeInfo::new(2, FlagMask::ALL_STATUS),
            Mul => OpcodeInfo::new(1, FlagMask::CF | FlagMask::OF),
            Imul => OpcodeInfo::new(2, FlagMask::CF | FlagMask::OF),
            Div => OpcodeInfo::new(1, FlagMask::empty()),
            Idiv => OpcodeInfo::new(1, FlagMask::empty()),
            Shl => OpcodeInfo::new(2, FlagMask::CF | FlagMask::OF),
            Shr => OpcodeInfo::new(2, FlagMask::CF | FlagMask::OF),
            Sar => OpcodeInfo::new(2, FlagMask::CF | FlagMask::OF),
            Rol => OpcodeInfo::new(2, FlagMask::CF | FlagMask::OF),
            Ror => OpcodeInfo::new(2, FlagMask::CF | FlagMask::OF),
            Rcl => OpcodeInfo::new(2, FlagMask::CF | FlagMask::OF),
            Rcr => OpcodeInfo::new(2, FlagMask::CF | FlagMask::OF),
            Mov => OpcodeInfo::new(1, FlagMask::empty()),
            Lea => OpcodeInfo::new(1, FlagMask::empty()),
            Movzx => OpcodeInfo::new(1, FlagMask::empty()),
            Movsx => OpcodeInfo::new(1, FlagMask::empty()),
            Movsxd => OpcodeInfo::new(1, FlagMask::empty()),
            Xchg => OpcodeInfo::new(2, FlagMask::empty()),
            Cmpxchg => OpcodeInfo::new(2, FlagMask::ALL_STATUS),
            Xadd => OpcodeInfo::new(2, FlagMask::ALL_STATUS),
            Push => OpcodeInfo::new(1, FlagMask::empty()),
            Pop => OpcodeInfo::new(1, FlagMask::empty()),
            Leave => OpcodeInfo::new(0, FlagMask::empty()),
            Bsf => OpcodeInfo::new(1, FlagMask::ZF),
            Bsr => OpcodeInfo::new(1, FlagMask::ZF),
            Bswap => OpcodeInfo::new(1, FlagMask::empty()),
            Cbw => OpcodeInfo::new(0, FlagMask::empty()),
            Cwde => OpcodeInfo::new(0, FlagMask::empty()),
            Cdqe => OpcodeInfo::new(0, FlagMask::empty()),
            Cqo => OpcodeInfo::new(0, FlagMask::empty()),
            Jmp => OpcodeInfo::new(1, FlagMask::empty()),
            Jcc(_) => OpcodeInfo::new(1, FlagMask::empty()),
            Call => OpcodeInfo::new(1, FlagMask::empty()),
            Ret => OpcodeInfo::new(0, FlagMask::empty()),
            Setcc(_) => OpcodeInfo::new(1, FlagMask::empty()),
            Cmovcc(_) => OpcodeInfo::new(2, FlagMask::empty()),
            Clc => OpcodeInfo::new(0, FlagMask::CF),
            Stc => OpcodeInfo::new(0, FlagMask::CF),
            Cmc => OpcodeInfo::new(0, FlagMask::CF),
            Cld => OpcodeInfo::new(0, FlagMask::DF_PLACEHOLDER),
            Std => OpcodeInfo::new(0, FlagMask::DF_PLACEHOLDER),
            Nop => OpcodeInfo::new(0, FlagMask::empty()),
            Pxor => OpcodeInfo::new(2, FlagMask::empty()),
            Paddq => OpcodeInfo::new(2, FlagMask::empty()),
            Movdqu => OpcodeInfo::new(2, FlagMask::empty()),
            Pcmpeqb => OpcodeInfo::new(2, FlagMask::empty()),
            Pcmpeqw => OpcodeInfo::new(2, FlagMask::empty()),
            Pcmpeqd => OpcodeInfo::new(2, FlagMask::empty()),
            Pmovmskb => OpcodeInfo::new(2, FlagMask::empty()),
            Pand => OpcodeInfo::new(2, FlagMask::empty()),
            Pandn => OpcodeInfo::new(2, FlagMask::empty()),
            Por => OpcodeInfo::new(2, FlagMask::empty()),
            Andps => OpcodeInfo::new(2, FlagMask::empty()),
            Andpd => OpcodeInfo::new(2, FlagMask::empty()),
            Andnps => OpcodeInfo::new(2, FlagMask::empty()),
            Andnpd => OpcodeInfo::new(2, FlagMask::empty()),
            Orps => OpcodeInfo::new(2, FlagMask::empty()),
            Orpd => OpcodeInfo::new(2, FlagMask::empty()),
            Xorps => OpcodeInfo::new(2, FlagMask::empty()),
            Xorpd => OpcodeInfo::new(2, FlagMask::empty()),
            Movddup => OpcodeInfo::new(2, FlagMask::empty()),
            Movshdup => OpcodeInfo::new(2, FlagMask::empty()),
            Movsldup => OpcodeInfo::new(2, FlagMask::empty()),
            Movmskpd => OpcodeInfo::new(2, FlagMask::empty()),
            Movmskps => OpcodeInfo::new(2, FlagMask::empty()),
            Movaps => OpcodeInfo::new(2, FlagMask::empty()),
            Movapd => OpcodeInfo::new(2, FlagMask::empty()),
            Movdqa => OpcodeInfo::new(2, FlagMask::empty()),
            Vmovdqa => OpcodeInfo::new(2, FlagMask::empty()),
            Movd => OpcodeInfo::new(2, FlagMask::empty()),
            Movhlps => OpcodeInfo::new(2, FlagMask::empty()),
            Movlhps => OpcodeInfo::new(2, FlagMask::empty()),
            Movhps => OpcodeInfo::new(2, FlagMask::empty()),
            Movlps => OpcodeInfo::new(2, FlagMask::empty()),
            Movntps => OpcodeInfo::new(2, FlagMask::empty()),
            Movntpd => OpcodeInfo::new(2, FlagMask::empty()),
            Movntdq => OpcodeInfo::new(2, FlagMask::empty()),
            // Silence exhaustiveness churn from the `Condition` payload
            // variants already matched above via their wildcard arms.
            #[allow(unreachable_patterns)]
            _ => return None,
        })
    }

    /// Convenience constructor matching disassembler text for the
    /// conditional family (`JE`, `JNE`, `SETL`, ...), used by tests and by
    /// any caller wiring this crate to an external decoder.
    pub const fn condition_of(self) -> Option<Condition> {
        match self {
            OpcodeId::Jcc(c) | OpcodeId::Setcc(c) | OpcodeId::Cmovcc(c) => Some(c),
            _ => None,
        }
    }
}

// `DF` does not live in `FlagMask::ALL_STATUS` (it is not a status flag in
// the CF/PF/AF/ZF/SF/OF sense spec.md §4.5 tabulates), but CLD/STD still
// need a bit to report in `OpcodeInfo`. Reuse the unused top bit rather
// than widening every other call site's `ALL_STATUS` arithmetic.
impl FlagMask {
    /// Not a real status flag; marks "touches DF" for [`OpcodeId::Cld`] /
    /// [`OpcodeId::Std`] metadata only.
    pub const DF_PLACEHOLDER: FlagMask = FlagMask::from_bits_truncate(0b0100_0000);
}

/// Static capability metadata for one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// Number of explicit operands the handler expects (not counting an
    /// implicit accumulator or stack pointer).
    pub operand_count: u8,
    /// Which flags this opcode may write.
    pub writes_flags: FlagMask,
}

impl OpcodeInfo {
    const fn new(operand_count: u8, writes_flags: FlagMask) -> Self {
        OpcodeInfo {
            operand_count,
            writes_flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_has_info() {
        use strum::IntoEnumIterator;
        for id in [
            OpcodeId::Add,
            OpcodeId::Mul,
            OpcodeId::Shl,
            OpcodeId::Jmp,
            OpcodeId::Jcc(Condition::Equal),
            OpcodeId::Pxor,
            OpcodeId::Xadd,
            OpcodeId::Leave,
            OpcodeId::Bswap,
            OpcodeId::Cqo,
            OpcodeId::Nop,
            OpcodeId::Pand,
            OpcodeId::Pmovmskb,
            OpcodeId::Movd,
        ] {
            assert!(id.info().is_some());
        }
        // Every `Condition` variant round-trips through `Jcc`.
        for c in Condition::iter() {
            assert_eq!(OpcodeId::Jcc(c).condition_of(), Some(c));
        }
    }

    #[test]
    fn inc_dec_do_not_touch_carry() {
        assert!(!OpcodeId::Inc.info().unwrap().writes_flags.contains(FlagMask::CF));
        assert!(!OpcodeId::Dec.info().unwrap().writes_flags.contains(FlagMask::CF));
    }
}
