//! The session facade tying C1-C9 together (spec.md §2 "Session" /
//! design note: "a thin orchestrator, not a new abstraction layer").
//!
//! [`Session`] owns one [`SymbolicState`] plus its [`SessionConfig`], and
//! is the only type an external caller needs: everything else in this
//! crate is reachable through it, the same way `Interpreter`
//! is the one type that wraps together a VM's registers, memory, and
//! context.

use crate::config::SessionConfig;
use crate::control_flow::{
    sequential_next_pc,
    PathConstraint,
};
use crate::dispatcher::dispatch;
use crate::error::SessionError;
use crate::instruction::Instruction;
use crate::register::ParentRegister;
use crate::state::{
    ExpressionId,
    SymbolicState,
};

/// An x86/x86-64 symbolic execution session: one [`SymbolicState`] plus the
/// configuration it was built with, plus the accumulated trail of path
/// constraints a caller can hand to a downstream solver.
#[derive(Debug)]
pub struct Session {
    state: SymbolicState,
    config: SessionConfig,
    path_constraints: Vec<PathConstraint>,
    poisoned: bool,
}

impl Session {
    /// Start a fresh session at `entry_pc`, in the processor mode and with
    /// the knobs `config` describes. Parent GPRs are always modeled at
    /// their 64-bit canonical width regardless of [`crate::config::CpuBitSize`]
    /// (spec.md §6's register taxonomy note); only `RIP`'s *meaningful*
    /// width (used when wrapping on overflow) tracks the configured mode.
    pub fn new(config: SessionConfig, entry_pc: u64) -> Self {
        Session {
            state: SymbolicState::new(config.hash_cons_enabled(), 64, entry_pc),
            config,
            path_constraints: Vec::new(),
            poisoned: false,
        }
    }

    /// The configuration this session was built with.
    pub const fn config(&self) -> SessionConfig {
        self.config
    }

    /// Read-only access to the underlying symbolic state, for callers that
    /// want to inspect a register/flag/memory value directly.
    pub const fn state(&self) -> &SymbolicState {
        &self.state
    }

    /// Every path constraint logged so far, oldest first.
    pub fn path_constraints(&self) -> &[PathConstraint] {
        &self.path_constraints
    }

    /// Whether this session has been poisoned by a prior bug-class error
    /// and must not be built against again.
    pub const fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Build the symbolic effect of one instruction, commit it on success,
    /// and advance `RIP`. `concretely_taken` only matters for a conditional
    /// branch (`Jcc`) and is otherwise ignored; pass `false` for every other
    /// opcode.
    ///
    /// On [`crate::error::BuildError::OutOfRangeSlice`] the session is
    /// poisoned (spec.md §4.3: a bug-class error, not a recoverable one) and
    /// every subsequent call returns [`SessionError::Poisoned`] without
    /// touching state again. Any other error discards the instruction's
    /// staged writes — `RIP` does not advance and the session remains
    /// usable.
    #[tracing::instrument(name = "build", skip(self, instruction), fields(address = instruction.address, opcode = ?instruction.opcode))]
    pub fn build(&mut self, instruction: &Instruction, concretely_taken: bool) -> Result<(), SessionError> {
        tracing::trace!(?instruction, concretely_taken, "building instruction effect");
        if self.poisoned {
            return Err(SessionError::Poisoned {
                address: instruction.address,
                source: crate::error::BuildError::OutOfRangeSlice,
            });
        }

        let mut txn = self.state.begin();
        let outcome = match dispatch(&mut txn, instruction, concretely_taken, self.config.unknown_opcode_policy()) {
            Ok(outcome) => outcome,
            Err(error) => {
                let poisons = error.poisons_session();
                drop(txn);
                if poisons {
                    tracing::warn!(address = instruction.address, %error, "session poisoned");
                    self.poisoned = true;
                }
                return Err(SessionError::from_build(instruction.address, error));
            }
        };

        let next_pc = outcome
            .target
            .unwrap_or_else(|| sequential_next_pc(instruction.address, instruction.length));
        let pc_node = match txn.ast().const_(u128::from(next_pc), self.state.register_width()) {
            Ok(node) => node,
            Err(error) => {
                drop(txn);
                return Err(SessionError::from_build(instruction.address, error));
            }
        };
        txn.create_symbolic_register_expression(instruction.address, pc_node, ParentRegister::Rip, "advance rip");
        txn.commit();

        if let Some(constraint) = outcome.constraint {
            self.path_constraints.push(constraint);
        }
        Ok(())
    }

    /// The expression id currently backing `RIP`.
    pub fn program_counter(&self) -> ExpressionId {
        self.state
            .register_value(ParentRegister::Rip)
            .expect("RIP is always initialized")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CpuBitSize;
    use crate::opcode::OpcodeId;
    use crate::operand::OperandWrapper;
    use crate::register::GpRegisterName;

    #[test]
    fn sequential_instruction_advances_rip_by_its_length() {
        let mut session = Session::new(SessionConfig::new(CpuBitSize::Bits64), 0x1000);
        let inst = Instruction::new(
            0x1000,
            3,
            OpcodeId::Add,
            vec![
                OperandWrapper::register(GpRegisterName::Eax),
                OperandWrapper::immediate(1, 32),
            ],
        );
        session.build(&inst, false).unwrap();
        let rip_id = session.program_counter();
        assert_eq!(
            session.state().expression(rip_id).unwrap().node.to_string(),
            "(_ bv4099 64)"
        );
    }

    #[test]
    fn taken_jump_sets_rip_to_the_target() {
        let mut session = Session::new(SessionConfig::new(CpuBitSize::Bits64), 0x1000);
        let inst = Instruction::new(0x1000, 5, OpcodeId::Jmp, vec![OperandWrapper::immediate(0x2000, 64)]);
        session.build(&inst, false).unwrap();
        let rip_id = session.program_counter();
        assert_eq!(
            session.state().expression(rip_id).unwrap().node.to_string(),
            "(_ bv8192 64)"
        );
    }

    #[test]
    fn not_taken_conditional_branch_logs_constraint_and_falls_through() {
        let mut session = Session::new(SessionConfig::new(CpuBitSize::Bits64), 0x1000);
        let inst = Instruction::new(
            0x1000,
            2,
            OpcodeId::Jcc(crate::opcode::Condition::Equal),
            vec![OperandWrapper::immediate(0x2000, 64)],
        );
        session.build(&inst, false).unwrap();
        assert_eq!(session.path_constraints().len(), 1);
        assert!(!session.path_constraints()[0].taken);
        let rip_id = session.program_counter();
        assert_eq!(
            session.state().expression(rip_id).unwrap().node.to_string(),
            "(_ bv4098 64)"
        );
    }
}
