//! Symbolic state store (C3, spec.md §3 "Symbolic state" / §4.3).
//!
//! [`SymbolicState`] owns the hash-cons context plus one [`ExpressionId`]
//! slot per architectural location: the sixteen parent GPRs + RIP, the
//! seven flags, and a byte-addressed memory map. Expressions are never
//! mutated or removed once created, only superseded by a later id in the
//! relevant map (spec.md §3 invariant: "expressions are monotonic").
//!
//! Writes within one instruction go through an [`InstructionTxn`], mirroring
//! how `Interpreter` only commits a receipt once its
//! instruction handler returns `Ok`: reads inside the transaction see
//! whatever was already committed before it began (so a flag-unchanged
//! `ite` built mid-instruction reads the *pre*-instruction flag, not a
//! partial write from earlier in the same handler), and `commit` is the
//! only place the real maps change. Dropping the transaction without
//! committing discards the staged writes; the expression ids it allocated
//! are simply never referenced, which spec.md §4.3 calls out as an
//! acceptable implementation of rollback (ids are monotonic, not
//! gap-free).

use crate::ast::{
    Ast,
    AstContext,
    Width,
};
use crate::error::{
    BuildError,
    BuildResult,
};
use crate::operand::OperandWrapper;
use crate::register::{
    FlagId,
    ParentRegister,
    XmmRegister,
};
use hashbrown::HashMap;

/// A stable handle to one entry in the expression store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpressionId(pub u64);

/// One entry in the symbolic expression store: the AST that was built, plus
/// the bookkeeping spec.md §3 attaches to every expression.
#[derive(Debug, Clone)]
pub struct Expression {
    /// This expression's id.
    pub id: ExpressionId,
    /// The AST node this expression denotes.
    pub node: Ast,
    /// A short human-readable label, analogous to Triton's
    /// `comment` field on `SymbolicExpression` — purely diagnostic.
    pub comment: String,
    /// Whether this expression is tainted (spec.md §4.9 "Taint
    /// propagation").
    pub tainted: bool,
    /// Address of the instruction that created this expression.
    pub origin_address: u64,
}

/// The full symbolic machine state: registers, flags, byte-addressed
/// memory, and the expression store backing all of them.
#[derive(Debug)]
pub struct SymbolicState {
    /// The AST hash-cons context shared by every expression this state
    /// creates.
    pub ast: AstContext,
    expressions: Vec<Expression>,
    register_map: HashMap<ParentRegister, ExpressionId>,
    flag_map: HashMap<FlagId, ExpressionId>,
    memory_map: HashMap<u64, ExpressionId>,
    xmm_map: HashMap<XmmRegister, ExpressionId>,
    next_id: u64,
    register_width: Width,
}

impl SymbolicState {
    /// Construct a fresh state: every GPR and flag initialized to a
    /// concrete zero of its architectural width, matching the "initial
    /// state: all registers zero" framing of spec.md's worked scenarios.
    /// `entry_pc` seeds `RIP`.
    pub fn new(hash_cons_enabled: bool, register_width: Width, entry_pc: u64) -> Self {
        let mut state = SymbolicState {
            ast: AstContext::new(hash_cons_enabled),
            expressions: Vec::new(),
            register_map: HashMap::new(),
            flag_map: HashMap::new(),
            memory_map: HashMap::new(),
            xmm_map: HashMap::new(),
            next_id: 0,
            register_width,
        };
        use strum::IntoEnumIterator;
        for parent in ParentRegister::iter() {
            let value = if matches!(parent, ParentRegister::Rip) {
                u128::from(entry_pc)
            } else {
                0
            };
            let node = state
                .ast
                .const_(value, register_width)
                .expect("register width is always valid");
            let id = state.push_expression(node, "initial register value".to_owned(), 0);
            state.register_map.insert(parent, id);
        }
        for flag in FlagId::iter() {
            let node = state.ast.const_(0, 1).expect("width 1 is always valid");
            let id = state.push_expression(node, "initial flag value".to_owned(), 0);
            state.flag_map.insert(flag, id);
        }
        for xmm in XmmRegister::iter() {
            let node = state.ast.const_(0, 128).expect("width 128 is always valid");
            let id = state.push_expression(node, "initial xmm value".to_owned(), 0);
            state.xmm_map.insert(xmm, id);
        }
        state
    }

    /// Width in bits backing every parent GPR (always 64, independent of
    /// [`crate::config::CpuBitSize`]; only the program counter's width
    /// varies with mode).
    pub const fn register_width(&self) -> Width {
        self.register_width
    }

    fn push_expression(&mut self, node: Ast, comment: String, origin_address: u64) -> ExpressionId {
        let id = ExpressionId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .expect("expression id space exhausted");
        self.expressions.push(Expression {
            id,
            node,
            comment,
            tainted: false,
            origin_address,
        });
        id
    }

    /// Look up a previously built expression.
    pub fn expression(&self, id: ExpressionId) -> Option<&Expression> {
        self.expressions.get(id.0 as usize)
    }

    /// The expression id currently backing `parent`, if it has been set.
    pub fn register_value(&self, parent: ParentRegister) -> Option<ExpressionId> {
        self.register_map.get(&parent).copied()
    }

    /// The expression id currently backing `flag`.
    pub fn flag_value(&self, flag: FlagId) -> Option<ExpressionId> {
        self.flag_map.get(&flag).copied()
    }

    /// The expression id currently backing the byte at `address`, if any
    /// byte has ever been written there. Uninitialized memory has no
    /// backing expression; callers that need a concrete default synthesize
    /// one explicitly (spec.md §4.3: "reads against undefined locations
    /// return defined defaults").
    pub fn memory_byte(&self, address: u64) -> Option<ExpressionId> {
        self.memory_map.get(&address).copied()
    }

    /// The expression id currently backing `xmm`.
    pub fn xmm_value(&self, xmm: XmmRegister) -> Option<ExpressionId> {
        self.xmm_map.get(&xmm).copied()
    }

    /// An AST reference to the current value of `parent`.
    pub fn register_ast(&mut self, parent: ParentRegister) -> BuildResult<Ast> {
        let id = self
            .register_value(parent)
            .expect("every ParentRegister is initialized in SymbolicState::new");
        self.ast.ref_(id.0, self.register_width)
    }

    /// An AST reference to the current value of `flag`.
    pub fn flag_ast(&mut self, flag: FlagId) -> BuildResult<Ast> {
        let id = self
            .flag_value(flag)
            .expect("every FlagId is initialized in SymbolicState::new");
        self.ast.ref_(id.0, 1)
    }

    /// Begin a transaction for one instruction. All writes made through the
    /// returned handle are invisible to `self` until [`InstructionTxn::commit`]
    /// is called.
    pub fn begin(&mut self) -> InstructionTxn<'_> {
        InstructionTxn {
            state: self,
            staged_expressions: Vec::new(),
            staged_registers: HashMap::new(),
            staged_flags: HashMap::new(),
            staged_memory: HashMap::new(),
            staged_xmm: HashMap::new(),
        }
    }
}

/// A staged set of writes for one instruction (spec.md §4.3's "builds must
/// commit atomically, or not at all").
pub struct InstructionTxn<'s> {
    state: &'s mut SymbolicState,
    staged_expressions: Vec<Expression>,
    staged_registers: HashMap<ParentRegister, ExpressionId>,
    staged_flags: HashMap<FlagId, ExpressionId>,
    staged_memory: HashMap<u64, ExpressionId>,
    staged_xmm: HashMap<XmmRegister, ExpressionId>,
}

impl<'s> InstructionTxn<'s> {
    /// The AST context, exposed directly since node construction itself
    /// (unlike register/flag/memory writes) does not need transactional
    /// semantics — interned nodes are immutable and harmless to keep even
    /// if the surrounding instruction is ultimately discarded.
    pub fn ast(&mut self) -> &mut AstContext {
        &mut self.state.ast
    }

    /// Register width in bits, per [`SymbolicState::register_width`].
    pub const fn register_width(&self) -> Width {
        self.state.register_width
    }

    /// Read the current value of `parent` as committed *before this
    /// transaction began*, ignoring any write already staged in it. This is
    /// what every flag "unchanged" formula wants: the pre-instruction flag,
    /// even if the same handler has already staged a new value for it.
    fn committed_register(&self, parent: ParentRegister) -> Option<ExpressionId> {
        self.state.register_value(parent)
    }

    fn committed_flag(&self, flag: FlagId) -> Option<ExpressionId> {
        self.state.flag_value(flag)
    }

    fn committed_memory_byte(&self, address: u64) -> Option<ExpressionId> {
        self.state.memory_byte(address)
    }

    fn committed_xmm(&self, xmm: XmmRegister) -> Option<ExpressionId> {
        self.state.xmm_value(xmm)
    }

    /// The value an operand currently denotes, read-your-writes within this
    /// transaction (a handler that writes a destination and later re-reads
    /// it, e.g. `CMPXCHG`, sees its own write).
    pub fn build_symbolic_operand(&mut self, operand: &OperandWrapper) -> BuildResult<Ast> {
        match operand {
            OperandWrapper::Immediate(imm) => self.ast().const_(imm.value, imm.size_bits),
            OperandWrapper::Register(reg) => {
                let slice = reg.slice;
                let id = self
                    .staged_registers
                    .get(&slice.parent)
                    .copied()
                    .or_else(|| self.committed_register(slice.parent))
                    .ok_or(BuildError::NotWritable)?;
                let width = self.register_width();
                let full = self.ast().ref_(id.0, width)?;
                self.ast().extract(slice.high, slice.low, full)
            }
            OperandWrapper::Memory(mem) => {
                let mut bytes = Vec::with_capacity((mem.size_bits / 8) as usize);
                for offset in (0..mem.size_bits / 8).rev() {
                    let addr = mem.address.wrapping_add(u64::from(offset));
                    let id = self
                        .staged_memory
                        .get(&addr)
                        .copied()
                        .or_else(|| self.committed_memory_byte(addr));
                    let byte_ast = match id {
                        Some(id) => self.ast().ref_(id.0, 8)?,
                        None => self.ast().const_(0, 8)?,
                    };
                    bytes.push(byte_ast);
                }
                self.ast().concat(bytes)
            }
            OperandWrapper::Xmm(xmm) => {
                let id = self
                    .staged_xmm
                    .get(&xmm.register)
                    .copied()
                    .or_else(|| self.committed_xmm(xmm.register))
                    .ok_or(BuildError::NotWritable)?;
                self.ast().ref_(id.0, 128)
            }
        }
    }

    /// An AST reference to `flag`'s pre-transaction value, for flag-formula
    /// inputs like the "unchanged unless count != 0" gate.
    pub fn flag_ast(&mut self, flag: FlagId) -> BuildResult<Ast> {
        let id = self
            .staged_flags
            .get(&flag)
            .copied()
            .or_else(|| self.committed_flag(flag))
            .expect("every FlagId is initialized in SymbolicState::new");
        self.ast().ref_(id.0, 1)
    }

    /// The expression currently backing `parent`'s full value, checking
    /// staged writes first. Used by taint lookups, which need to read the
    /// expression's metadata rather than build an AST from it.
    pub fn peek_register_expression(&self, parent: ParentRegister) -> Option<&Expression> {
        if let Some(id) = self.staged_registers.get(&parent) {
            return self.staged_expressions.iter().find(|e| e.id == *id);
        }
        self.committed_register(parent)
            .and_then(|id| self.state.expression(id))
    }

    /// The expression currently backing the byte at `address`, checking
    /// staged writes first.
    pub fn peek_memory_expression(&self, address: u64) -> Option<&Expression> {
        if let Some(id) = self.staged_memory.get(&address) {
            return self.staged_expressions.iter().find(|e| e.id == *id);
        }
        self.committed_memory_byte(address)
            .and_then(|id| self.state.expression(id))
    }

    /// The expression currently backing `xmm`'s value, checking staged
    /// writes first.
    pub fn peek_xmm_expression(&self, xmm: XmmRegister) -> Option<&Expression> {
        if let Some(id) = self.staged_xmm.get(&xmm) {
            return self.staged_expressions.iter().find(|e| e.id == *id);
        }
        self.committed_xmm(xmm).and_then(|id| self.state.expression(id))
    }

    /// Look up any expression by id, staged or already committed. Used to
    /// follow an [`crate::ast::AstNode::Ref`] back to the node it denotes,
    /// e.g. when a handler needs to concretize a register that
    /// [`Self::build_symbolic_operand`] only ever hands back wrapped in a
    /// fresh `Ref`.
    pub fn resolve_expression(&self, id: ExpressionId) -> Option<&Expression> {
        self.staged_expressions
            .iter()
            .find(|e| e.id == id)
            .or_else(|| self.state.expression(id))
    }

    fn stage_expression(&mut self, node: Ast, comment: impl Into<String>, origin_address: u64, tainted: bool) -> ExpressionId {
        let id = ExpressionId(self.state.next_id + self.staged_expressions.len() as u64);
        self.staged_expressions.push(Expression {
            id,
            node,
            comment: comment.into(),
            tainted,
            origin_address,
        });
        id
    }

    /// Create an expression and route it to `destination`, splitting
    /// across bytes for memory and merging with the untouched bits of the
    /// parent register for a sub-register write (spec.md §4.3's
    /// "destination-write coverage" invariant).
    pub fn create_symbolic_expression(
        &mut self,
        origin_address: u64,
        node: Ast,
        destination: &OperandWrapper,
        comment: impl Into<String>,
        tainted: bool,
    ) -> BuildResult<Expression> {
        if !destination.is_writable() {
            return Err(BuildError::NotWritable);
        }
        let comment = comment.into();
        match destination {
            OperandWrapper::Immediate(_) => unreachable!("checked above"),
            OperandWrapper::Xmm(xmm) => {
                let id = self.stage_expression(node.clone(), comment.clone(), origin_address, tainted);
                self.staged_xmm.insert(xmm.register, id);
                Ok(Expression {
                    id,
                    node,
                    comment,
                    tainted,
                    origin_address,
                })
            }
            OperandWrapper::Register(reg) => {
                let slice = reg.slice;
                let width = self.register_width();
                let merged = if slice.high == width - 1 && slice.low == 0 {
                    node
                } else {
                    let old_id = self
                        .staged_registers
                        .get(&slice.parent)
                        .copied()
                        .or_else(|| self.committed_register(slice.parent))
                        .ok_or(BuildError::NotWritable)?;
                    let old = self.ast().ref_(old_id.0, width)?;
                    let mut parts = Vec::with_capacity(3);
                    if slice.high < width - 1 {
                        parts.push(self.ast().extract(width - 1, slice.high + 1, old.clone())?);
                    }
                    parts.push(node);
                    if slice.low > 0 {
                        parts.push(self.ast().extract(slice.low - 1, 0, old)?);
                    }
                    self.ast().concat(parts)?
                };
                let id = self.stage_expression(merged.clone(), comment.clone(), origin_address, tainted);
                self.staged_registers.insert(slice.parent, id);
                Ok(Expression {
                    id,
                    node: merged,
                    comment,
                    tainted,
                    origin_address,
                })
            }
            OperandWrapper::Memory(mem) => {
                let width = mem.size_bits;
                let id = self.stage_expression(node.clone(), comment.clone(), origin_address, tainted);
                for offset in 0..width / 8 {
                    let byte = self
                        .ast()
                        .extract((offset + 1) * 8 - 1, offset * 8, node.clone())?;
                    let byte_id = self.stage_expression(
                        byte,
                        format!("{comment} (byte {offset})"),
                        origin_address,
                        tainted,
                    );
                    let addr = mem.address.wrapping_add(u64::from(offset));
                    self.staged_memory.insert(addr, byte_id);
                }
                Ok(Expression {
                    id,
                    node,
                    comment,
                    tainted,
                    origin_address,
                })
            }
        }
    }

    /// Create an expression and route it to `flag`'s full-width (1-bit)
    /// location.
    pub fn create_symbolic_flag_expression(
        &mut self,
        origin_address: u64,
        node: Ast,
        flag: FlagId,
        comment: impl Into<String>,
    ) -> Expression {
        let comment = comment.into();
        let id = self.stage_expression(node.clone(), comment.clone(), origin_address, false);
        self.staged_flags.insert(flag, id);
        Expression {
            id,
            node,
            comment,
            tainted: false,
            origin_address,
        }
    }

    /// Create an expression with no destination at all: a pure
    /// side-effect-free computation kept only for inspection (spec.md
    /// §4.3's "volatile" expression kind — used for e.g. an intermediate
    /// full-width product before it is truncated to the destination).
    pub fn create_symbolic_volatile_expression(
        &mut self,
        origin_address: u64,
        node: Ast,
        comment: impl Into<String>,
    ) -> Expression {
        let comment = comment.into();
        let id = self.stage_expression(node.clone(), comment.clone(), origin_address, false);
        Expression {
            id,
            node,
            comment,
            tainted: false,
            origin_address,
        }
    }

    /// Create an expression and write it to a whole parent register
    /// (`RIP` advancing, or any full-width GPR write that does not go
    /// through an [`OperandWrapper`]).
    pub fn create_symbolic_register_expression(
        &mut self,
        origin_address: u64,
        node: Ast,
        register: ParentRegister,
        comment: impl Into<String>,
    ) -> Expression {
        let comment = comment.into();
        let id = self.stage_expression(node.clone(), comment.clone(), origin_address, false);
        self.staged_registers.insert(register, id);
        Expression {
            id,
            node,
            comment,
            tainted: false,
            origin_address,
        }
    }

    /// Apply every staged write to the underlying state. Consumes `self`;
    /// dropping an uncommitted `InstructionTxn` instead discards its writes.
    pub fn commit(self) {
        let InstructionTxn {
            state,
            staged_expressions,
            staged_registers,
            staged_flags,
            staged_memory,
            staged_xmm,
        } = self;
        state.next_id += staged_expressions.len() as u64;
        state.expressions.extend(staged_expressions);
        state.register_map.extend(staged_registers);
        state.flag_map.extend(staged_flags);
        state.memory_map.extend(staged_memory);
        state.xmm_map.extend(staged_xmm);
    }
}
