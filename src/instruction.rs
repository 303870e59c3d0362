//! The decoded-instruction shape this core consumes (spec.md §3
//! "Instruction"). An external decoder is assumed to produce these; this
//! crate only ever reads them.

use crate::opcode::OpcodeId;
use crate::operand::OperandWrapper;

/// One decoded machine instruction, concrete operand values already
/// resolved by the caller (memory effective addresses included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Address of the first byte of this instruction.
    pub address: u64,
    /// Length in bytes, used to compute the next sequential `RIP` and as
    /// the base for `CALL`'s return-address push and `LEA [rip + disp]`.
    pub length: u32,
    /// Which operation this instruction performs.
    pub opcode: OpcodeId,
    /// Operands in disassembly order (destination first for two-operand
    /// forms).
    pub operands: Vec<OperandWrapper>,
}

impl Instruction {
    /// Construct a new instruction descriptor.
    pub fn new(address: u64, length: u32, opcode: OpcodeId, operands: Vec<OperandWrapper>) -> Self {
        Instruction {
            address,
            length,
            opcode,
            operands,
        }
    }

    /// Address of the next sequential instruction.
    pub const fn next_address(&self) -> u64 {
        self.address.wrapping_add(self.length as u64)
    }

    /// The `n`th operand, if present.
    pub fn operand(&self, n: usize) -> Option<&OperandWrapper> {
        self.operands.get(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_address_adds_length() {
        let inst = Instruction::new(0x1000, 3, OpcodeId::Mov, vec![]);
        assert_eq!(inst.next_address(), 0x1003);
    }
}
