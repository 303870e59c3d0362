//! Session-wide configuration (C10).
//!
//! The core never reads environment variables or global state: every knob
//! that affects how a [`crate::session::Session`] behaves is collected here
//! and handed to the session once, at construction, the same way
//! `Interpreter` takes its gas costs and flags as explicit
//! constructor arguments rather than as ambient globals.

/// Processor mode the session operates in. Determines the width of `RIP`,
/// the parent width of general-purpose registers, and which sub-register
/// slices are valid (e.g. `R8`..`R15` only exist in 64-bit mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuBitSize {
    /// 16-bit real/virtual-8086 mode.
    Bits16,
    /// 32-bit protected mode.
    Bits32,
    /// 64-bit long mode.
    Bits64,
}

impl CpuBitSize {
    /// Width, in bits, of a full general-purpose register / the program
    /// counter in this mode.
    pub const fn register_width(self) -> u32 {
        match self {
            CpuBitSize::Bits16 => 16,
            CpuBitSize::Bits32 => 32,
            CpuBitSize::Bits64 => 64,
        }
    }
}

/// What the dispatcher (C7) should do when it is handed an opcode id with no
/// registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnknownOpcodePolicy {
    /// Treat the instruction as opaque: advance PC, touch no symbolic state,
    /// report no taint effect. This is the conservative default for a
    /// best-effort analysis run.
    #[default]
    SkipOpaque,
    /// Return a [`crate::error::BuildError::UnknownOpcode`] and let the
    /// caller decide.
    Abort,
}

/// Whether arithmetic overflow in a flag/result computation should be
/// tolerated (x86 arithmetic is always modular, so in practice this only
/// gates internal debug assertions, not instruction semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrappingPolicy {
    /// Silently wrap (the only sound choice for x86 semantics).
    #[default]
    Wrapping,
}

/// Immutable configuration for a single analysis session.
///
/// Constructed once and passed to [`crate::session::Session::new`]. There is
/// no setter: building a session with different configuration means building
/// a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionConfig {
    cpu_bit_size: CpuBitSize,
    hash_cons: bool,
    unknown_opcode_policy: UnknownOpcodePolicy,
    wrapping_policy: WrappingPolicy,
}

impl SessionConfig {
    /// Build a configuration for the given processor mode, with
    /// hash-consing enabled and the conservative unknown-opcode policy.
    pub const fn new(cpu_bit_size: CpuBitSize) -> Self {
        Self {
            cpu_bit_size,
            hash_cons: true,
            unknown_opcode_policy: UnknownOpcodePolicy::SkipOpaque,
            wrapping_policy: WrappingPolicy::Wrapping,
        }
    }

    /// Return a copy of this configuration with hash-consing toggled.
    #[must_use]
    pub const fn with_hash_consing(mut self, enabled: bool) -> Self {
        self.hash_cons = enabled;
        self
    }

    /// Return a copy of this configuration with a different unknown-opcode
    /// policy.
    #[must_use]
    pub const fn with_unknown_opcode_policy(mut self, policy: UnknownOpcodePolicy) -> Self {
        self.unknown_opcode_policy = policy;
        self
    }

    /// The configured processor mode.
    pub const fn cpu_bit_size(&self) -> CpuBitSize {
        self.cpu_bit_size
    }

    /// Whether the AST context should hash-cons structurally identical
    /// nodes.
    pub const fn hash_cons_enabled(&self) -> bool {
        self.hash_cons
    }

    /// The configured unknown-opcode policy.
    pub const fn unknown_opcode_policy(&self) -> UnknownOpcodePolicy {
        self.unknown_opcode_policy
    }

    /// The configured wrapping-arithmetic policy.
    pub const fn wrapping_policy(&self) -> WrappingPolicy {
        self.wrapping_policy
    }

    /// Width, in bits, of the program counter in this session.
    pub const fn pc_width(&self) -> u32 {
        self.cpu_bit_size.register_width()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(CpuBitSize::Bits64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_64_bit_with_hash_consing() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.cpu_bit_size(), CpuBitSize::Bits64);
        assert!(cfg.hash_cons_enabled());
        assert_eq!(cfg.pc_width(), 64);
    }

    #[test]
    fn builder_methods_are_independent() {
        let cfg = SessionConfig::new(CpuBitSize::Bits32)
            .with_hash_consing(false)
            .with_unknown_opcode_policy(UnknownOpcodePolicy::Abort);
        assert_eq!(cfg.cpu_bit_size(), CpuBitSize::Bits32);
        assert!(!cfg.hash_cons_enabled());
        assert_eq!(cfg.unknown_opcode_policy(), UnknownOpcodePolicy::Abort);
        assert_eq!(cfg.pc_width(), 32);
    }
}
