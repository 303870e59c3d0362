//! Single dispatch point from a decoded [`Instruction`] to its
//! `semantics::*` handler (C7, spec.md §4.7 — "implemented as a single
//! `match` over a closed `OpcodeId` enum" is a design directive, not a
//! style preference).
//!
//! This is the only place in the crate that knows the full opcode-to-handler
//! mapping; every handler itself stays ignorant of how it gets invoked,
//! mirroring how `Interpreter::instruction` is the one entry point fanning
//! out to per-opcode executor functions.

use crate::config::UnknownOpcodePolicy;
use crate::control_flow::PathConstraint;
use crate::error::{
    BuildError,
    BuildResult,
};
use crate::instruction::Instruction;
use crate::opcode::OpcodeId;
use crate::semantics::{
    arith,
    bitscan,
    control,
    exchange,
    flagops,
    mov,
    muldiv,
    shift_rotate,
    signext,
    simd,
    stack,
};
use crate::state::InstructionTxn;

/// What a dispatched instruction did to control flow. `target` is `None`
/// for any instruction that falls through sequentially (the overwhelming
/// majority); [`crate::session::Session`] advances `RIP` to `target` when
/// present, else to `address + length`.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// The concrete address control transfers to, if this instruction is a
    /// taken branch/call/return and the target was statically resolvable.
    pub target: Option<u64>,
    /// The path constraint logged by a conditional branch, if any.
    pub constraint: Option<PathConstraint>,
}

impl DispatchOutcome {
    const fn fallthrough() -> Self {
        DispatchOutcome {
            target: None,
            constraint: None,
        }
    }

    const fn branch(target: Option<u64>) -> Self {
        DispatchOutcome {
            target,
            constraint: None,
        }
    }
}

/// Build the symbolic effect of `instruction` into `txn`. `concretely_taken`
/// is consulted only for `Jcc`: whoever is driving this session against a
/// concrete (or concretely-assumed) trace already knows whether the branch
/// was taken, the same "concolic" division of labour spec.md's worked
/// scenarios assume. It is ignored for every other opcode.
pub fn dispatch(
    txn: &mut InstructionTxn<'_>,
    instruction: &Instruction,
    concretely_taken: bool,
    unknown_opcode_policy: UnknownOpcodePolicy,
) -> BuildResult<DispatchOutcome> {
    use OpcodeId::*;
    match instruction.opcode {
        Add => arith::add(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Adc => arith::adc(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Sub => arith::sub(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Sbb => arith::sbb(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Inc => arith::inc(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Dec => arith::dec(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Neg => arith::neg(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Cmp => arith::cmp(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        And => arith::and(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Or => arith::or(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Xor => arith::xor(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Not => arith::not(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Test => arith::test(txn, instruction).map(|()| DispatchOutcome::fallthrough()),

        Mul => muldiv::mul(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Imul => muldiv::imul(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Div => muldiv::div(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Idiv => muldiv::idiv(txn, instruction).map(|()| DispatchOutcome::fallthrough()),

        Shl => shift_rotate::shl(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Shr => shift_rotate::shr(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Sar => shift_rotate::sar(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Rol => shift_rotate::rol(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Ror => shift_rotate::ror(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Rcl => shift_rotate::rcl(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Rcr => shift_rotate::rcr(txn, instruction).map(|()| DispatchOutcome::fallthrough()),

        Mov => mov::mov(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Lea => mov::lea(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movzx => mov::movzx(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movsx => mov::movsx(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movsxd => mov::movsxd(txn, instruction).map(|()| DispatchOutcome::fallthrough()),

        Xchg => exchange::xchg(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Cmpxchg => exchange::cmpxchg(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Xadd => exchange::xadd(txn, instruction).map(|()| DispatchOutcome::fallthrough()),

        Push => stack::push(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Pop => stack::pop(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Leave => stack::leave(txn, instruction).map(|()| DispatchOutcome::fallthrough()),

        Bsf => bitscan::bsf(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Bsr => bitscan::bsr(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Bswap => bitscan::bswap(txn, instruction).map(|()| DispatchOutcome::fallthrough()),

        Cbw => signext::cbw(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Cwde => signext::cwde(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Cdqe => signext::cdqe(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Cqo => signext::cqo(txn, instruction).map(|()| DispatchOutcome::fallthrough()),

        Jmp => control::jmp(txn, instruction).map(DispatchOutcome::branch),
        Jcc(condition) => control::jcc(txn, instruction, condition, concretely_taken)
            .map(|(target, constraint)| DispatchOutcome {
                target,
                constraint: Some(constraint),
            }),
        Call => control::call(txn, instruction).map(DispatchOutcome::branch),
        Ret => control::ret(txn, instruction).map(DispatchOutcome::branch),
        Setcc(condition) => control::setcc(txn, instruction, condition).map(|()| DispatchOutcome::fallthrough()),
        Cmovcc(condition) => control::cmovcc(txn, instruction, condition).map(|()| DispatchOutcome::fallthrough()),

        Clc => flagops::clc(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Stc => flagops::stc(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Cmc => flagops::cmc(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Cld => flagops::cld(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Std => flagops::std(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Nop => flagops::nop(txn, instruction).map(|()| DispatchOutcome::fallthrough()),

        Pxor => simd::pxor(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Paddq => simd::paddq(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movdqu => simd::movdqu(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Pcmpeqb => simd::pcmpeqb(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Pcmpeqw => simd::pcmpeqw(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Pcmpeqd => simd::pcmpeqd(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Pmovmskb => simd::pmovmskb(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Pand => simd::pand(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Pandn => simd::pandn(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Por => simd::por(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Andps => simd::andps(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Andpd => simd::andpd(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Andnps => simd::andnps(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Andnpd => simd::andnpd(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Orps => simd::orps(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Orpd => simd::orpd(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Xorps => simd::xorps(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Xorpd => simd::xorpd(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movddup => simd::movddup(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movshdup => simd::movshdup(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movsldup => simd::movsldup(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movmskpd => simd::movmskpd(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movmskps => simd::movmskps(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movaps => simd::movaps(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movapd => simd::movapd(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movdqa => simd::movdqa(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Vmovdqa => simd::vmovdqa(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movd => simd::movd(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movhlps => simd::movhlps(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movlhps => simd::movlhps(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movhps => simd::movhps(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movlps => simd::movlps(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movntps => simd::movntps(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movntpd => simd::movntpd(txn, instruction).map(|()| DispatchOutcome::fallthrough()),
        Movntdq => simd::movntdq(txn, instruction).map(|()| DispatchOutcome::fallthrough()),

        // Every variant of today's closed `OpcodeId` is handled above; this
        // arm only exists to honor `unknown_opcode_policy` the day a new
        // variant is added without a matching handler, the same forward
        // posture as `OpcodeId::info`'s own `_ => return None` arm.
        #[allow(unreachable_patterns)]
        _ => match unknown_opcode_policy {
            UnknownOpcodePolicy::SkipOpaque => Ok(DispatchOutcome::fallthrough()),
            UnknownOpcodePolicy::Abort => Err(BuildError::UnknownOpcode(instruction.opcode)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::OperandWrapper;
    use crate::register::GpRegisterName;
    use crate::state::SymbolicState;

    #[test]
    fn add_dispatches_and_reports_fallthrough() {
        let mut state = SymbolicState::new(true, 64, 0);
        let inst = Instruction::new(
            0x1000,
            3,
            OpcodeId::Add,
            vec![
                OperandWrapper::register(GpRegisterName::Eax),
                OperandWrapper::immediate(1, 32),
            ],
        );
        let mut txn = state.begin();
        let outcome = dispatch(&mut txn, &inst, false, UnknownOpcodePolicy::Abort).unwrap();
        txn.commit();
        assert_eq!(outcome.target, None);
        assert!(outcome.constraint.is_none());
    }

    #[test]
    fn jmp_dispatches_to_a_branch_outcome() {
        let mut state = SymbolicState::new(true, 64, 0);
        let inst = Instruction::new(0x1000, 5, OpcodeId::Jmp, vec![OperandWrapper::immediate(0x2000, 64)]);
        let mut txn = state.begin();
        let outcome = dispatch(&mut txn, &inst, false, UnknownOpcodePolicy::Abort).unwrap();
        txn.commit();
        assert_eq!(outcome.target, Some(0x2000));
    }

    #[test]
    fn nop_dispatches_as_a_plain_fallthrough() {
        let mut state = SymbolicState::new(true, 64, 0);
        let inst = Instruction::new(0x1000, 1, OpcodeId::Nop, vec![]);
        let mut txn = state.begin();
        let outcome = dispatch(&mut txn, &inst, false, UnknownOpcodePolicy::Abort).unwrap();
        txn.commit();
        assert_eq!(outcome.target, None);
        assert!(outcome.constraint.is_none());
    }

    #[test]
    fn xadd_dispatches_and_reports_fallthrough() {
        let mut state = SymbolicState::new(true, 64, 0);
        let inst = Instruction::new(
            0x1000,
            3,
            OpcodeId::Xadd,
            vec![
                OperandWrapper::register(GpRegisterName::Eax),
                OperandWrapper::register(GpRegisterName::Ebx),
            ],
        );
        let mut txn = state.begin();
        let outcome = dispatch(&mut txn, &inst, false, UnknownOpcodePolicy::Abort).unwrap();
        txn.commit();
        assert_eq!(outcome.target, None);
    }
}
