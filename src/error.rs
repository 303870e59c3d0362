//! Error taxonomy for the symbolic execution core (C12, spec.md §7).
//!
//! Two layers, mirroring the `RuntimeError`/`InterpreterError`
//! split: [`BuildError`] is local to a single [`crate::session::Session::build`]
//! call and never outlives it; [`SessionError`] is what the session surfaces
//! to its caller, and its `Poisoned` variant means the session itself must
//! not be used again.

use crate::opcode::OpcodeId;
use core::fmt;

/// A fatal-to-instruction error raised while building the AST for one
/// instruction. The staged writes for that instruction are discarded; the
/// session otherwise remains usable.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum BuildError {
    /// An opcode handler encountered an operand width outside
    /// `{8, 16, 32, 64, 128}`.
    #[display(fmt = "invalid operand size: {_0} bits")]
    InvalidOperandSize(u32),
    /// A flag helper for a rotate/shift family received a non-`Decimal`
    /// count where the formula requires concretization.
    #[display(fmt = "symbolic rotate/shift count requires concretization")]
    SymbolicShiftCount,
    /// The destination operand cannot be written to (e.g. an immediate).
    #[display(fmt = "operand is not a writable destination")]
    NotWritable,
    /// A handler asked for an extract or concat outside the width of its
    /// operand; this indicates a bug in the handler, not bad input.
    #[display(fmt = "extract/concat out of range")]
    OutOfRangeSlice,
    /// The dispatcher was handed an opcode id with no registered handler and
    /// [`crate::config::UnknownOpcodePolicy::Abort`] is in effect.
    #[display(fmt = "unknown opcode: {_0:?}")]
    UnknownOpcode(OpcodeId),
    /// The program counter would overflow its width advancing past this
    /// instruction.
    #[display(fmt = "program counter overflow")]
    PcOverflow,
}

impl BuildError {
    /// Whether this error corresponds to spec.md's "out-of-range
    /// extract/concat" class, which poisons the whole session rather than
    /// just aborting the instruction.
    pub const fn poisons_session(&self) -> bool {
        matches!(self, BuildError::OutOfRangeSlice)
    }
}

/// Error surfaced to the caller of [`crate::session::Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A single instruction failed to build; the session is still usable.
    Build {
        /// Address of the instruction that failed to build.
        address: u64,
        /// The underlying error.
        source: BuildError,
    },
    /// A bug-class error occurred (out-of-range extract/concat). The
    /// session must not be used again.
    Poisoned {
        /// Address of the instruction that poisoned the session.
        address: u64,
        /// The underlying error.
        source: BuildError,
    },
}

impl SessionError {
    /// Build the appropriate variant for `error` having occurred while
    /// processing the instruction at `address`.
    pub fn from_build(address: u64, error: BuildError) -> Self {
        if error.poisons_session() {
            SessionError::Poisoned {
                address,
                source: error,
            }
        } else {
            SessionError::Build {
                address,
                source: error,
            }
        }
    }

    /// Whether the session that produced this error must not be used again.
    pub const fn is_poisoned(&self) -> bool {
        matches!(self, SessionError::Poisoned { .. })
    }

    /// Address of the instruction whose handling raised this error.
    pub const fn address(&self) -> u64 {
        match self {
            SessionError::Build { address, .. } | SessionError::Poisoned { address, .. } => {
                *address
            }
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Build { address, source } => {
                write!(f, "instruction at {address:#x} failed: {source}")
            }
            SessionError::Poisoned { address, source } => {
                write!(
                    f,
                    "session poisoned at instruction {address:#x}: {source}"
                )
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Shorthand for the result type most C1-C6 builder functions return.
pub type BuildResult<T> = Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_slice_poisons() {
        assert!(BuildError::OutOfRangeSlice.poisons_session());
        assert!(!BuildError::SymbolicShiftCount.poisons_session());
    }

    #[test]
    fn session_error_classification_matches_source() {
        let err = SessionError::from_build(0x1000, BuildError::OutOfRangeSlice);
        assert!(err.is_poisoned());
        assert_eq!(err.address(), 0x1000);

        let err = SessionError::from_build(0x2000, BuildError::NotWritable);
        assert!(!err.is_poisoned());
    }
}
