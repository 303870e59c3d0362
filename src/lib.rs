//! Instruction-to-bitvector-expression translator for x86/x86-64 symbolic
//! execution.
//!
//! This crate builds a side-effect-free AST representation of a decoded x86
//! instruction's effect on processor state, tracks how every produced
//! expression depends on tainted inputs, and accumulates path constraints for
//! a downstream SMT solver. It does not decode bytes, does not hold concrete
//! memory, and does not talk to a solver: those are external collaborators.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]
#![deny(
    clippy::arithmetic_side_effects,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

#[cfg(test)]
use criterion as _;
#[cfg(test)]
use quickcheck_macros as _;
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use test_case as _;

pub mod ast;
pub mod config;
pub mod control_flow;
pub mod dispatcher;
pub mod error;
pub mod flags;
pub mod instruction;
pub mod operand;
pub mod opcode;
pub mod register;
pub mod semantics;
pub mod session;
pub mod state;
pub mod taint;

pub mod prelude {
    //! Re-exports of the types most callers need.
    pub use crate::{
        ast::{
            Ast,
            AstNode,
            BinaryOp,
            UnaryOp,
            Width,
        },
        config::{
            CpuBitSize,
            SessionConfig,
            UnknownOpcodePolicy,
            WrappingPolicy,
        },
        error::{
            BuildError,
            SessionError,
        },
        control_flow::PathConstraint,
        dispatcher::DispatchOutcome,
        instruction::Instruction,
        opcode::OpcodeId,
        operand::OperandWrapper,
        register::{
            FlagId,
            ParentRegister,
            XmmRegister,
        },
        session::Session,
        state::{
            Expression,
            ExpressionId,
        },
    };
}
