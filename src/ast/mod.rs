//! The bitvector AST term algebra (C1, spec.md §3–§4.1).
//!
//! [`AstNode`] is the data of one node in a directed acyclic expression
//! graph; [`Ast`] is a cheaply-cloned shared handle to one (`Rc<AstNode>`).
//! Every constructor in [`AstContext`] is pure and total: no constructor
//! here ever consults concrete CPU state, and none of them re-derive x86
//! semantics (masking a shift count to the operand width, for instance, is
//! the caller's job — see spec.md §4.1's contract).

mod context;

pub use context::AstContext;

use core::fmt;
use std::rc::Rc;

/// Bit width of a [`AstNode`] result. x86 only ever produces values at one
/// of six widths; `Decimal` is the one variant with no width at all.
pub type Width = u32;

/// The canonical bitvector widths spec.md's data model enumerates.
pub const VALID_WIDTHS: [Width; 6] = [1, 8, 16, 32, 64, 128];

/// Whether `width` is one of the widths x86 bitvectors are allowed to have.
pub const fn is_valid_width(width: Width) -> bool {
    let mut i = 0;
    while i < VALID_WIDTHS.len() {
        if VALID_WIDTHS[i] == width {
            return true;
        }
        i += 1;
    }
    false
}

/// A shared handle to an interned AST node. Cloning is a refcount bump, not
/// a copy of the subtree.
pub type Ast = Rc<AstNode>;

/// A unary bitvector operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    /// Bitwise complement.
    BvNot,
    /// Two's-complement negation.
    BvNeg,
}

/// A binary bitvector operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    /// Addition.
    BvAdd,
    /// Subtraction.
    BvSub,
    /// Multiplication (low bits).
    BvMul,
    /// Unsigned division.
    BvUdiv,
    /// Unsigned remainder.
    BvUrem,
    /// Signed division.
    BvSdiv,
    /// Signed remainder.
    BvSrem,
    /// Bitwise AND.
    BvAnd,
    /// Bitwise OR.
    BvOr,
    /// Bitwise XOR.
    BvXor,
    /// Logical shift left.
    BvShl,
    /// Logical shift right.
    BvLshr,
    /// Arithmetic shift right.
    BvAshr,
    /// Rotate left.
    BvRol,
    /// Rotate right.
    BvRor,
    /// Equality; always produces a 1-bit result.
    Equal,
}

impl BinaryOp {
    /// Whether this operator's right-hand operand is allowed to be a
    /// [`AstNode::Decimal`] instead of a width-matching bitvector (spec.md
    /// §3 invariant (c)).
    pub const fn allows_decimal_rhs(self) -> bool {
        matches!(self, BinaryOp::BvRol | BinaryOp::BvRor)
    }
}

/// A node in the bitvector expression DAG (spec.md §3 "AST node (term)").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AstNode {
    /// A literal bitvector constant.
    Const {
        /// The constant's value, truncated to `width` bits.
        value: u128,
        /// Result width.
        width: Width,
    },
    /// A placeholder for an unresolved input symbol.
    Var {
        /// Identifier of the symbol this variable stands for.
        sym_id: u64,
        /// Result width.
        width: Width,
    },
    /// A named handle into the symbolic-state expression store, forcing
    /// sharing across instructions.
    Ref {
        /// The referenced expression's id.
        expr_id: u64,
        /// Result width (must match the referenced expression's width).
        width: Width,
    },
    /// `op(child)`.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        child: Ast,
    },
    /// `lhs op rhs`.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left-hand operand.
        lhs: Ast,
        /// Right-hand operand.
        rhs: Ast,
    },
    /// `child[high:low]`.
    Extract {
        /// Inclusive high bit index.
        high: u32,
        /// Inclusive low bit index.
        low: u32,
        /// The operand being sliced.
        child: Ast,
    },
    /// `children[0] ++ children[1] ++ ...`, high-bits-first.
    Concat {
        /// The children, ordered from the highest bits to the lowest.
        children: Vec<Ast>,
    },
    /// Sign-extend `child` by `extra` bits.
    SignExtend {
        /// Number of bits to add.
        extra: Width,
        /// The operand being extended.
        child: Ast,
    },
    /// Zero-extend `child` by `extra` bits.
    ZeroExtend {
        /// Number of bits to add.
        extra: Width,
        /// The operand being extended.
        child: Ast,
    },
    /// `if cond { then_arm } else { else_arm }`; `cond` must be 1-bit.
    Ite {
        /// The 1-bit condition.
        cond: Ast,
        /// Value when `cond` is 1.
        then_arm: Ast,
        /// Value when `cond` is 0.
        else_arm: Ast,
    },
    /// An untyped natural number, usable only as the count operand of
    /// `bvrol`/`bvror` (and, by convention, the masked shift amount passed
    /// into the rotate/shift flag helpers).
    Decimal(u64),
}

impl AstNode {
    /// The result width of this node, or `None` for [`AstNode::Decimal`],
    /// which has no width.
    pub fn width(&self) -> Option<Width> {
        match self {
            AstNode::Const { width, .. }
            | AstNode::Var { width, .. }
            | AstNode::Ref { width, .. } => Some(*width),
            AstNode::Unary { child, .. } => child.width(),
            AstNode::Binary { op, lhs, .. } => {
                if matches!(op, BinaryOp::Equal) {
                    Some(1)
                } else {
                    lhs.width()
                }
            }
            AstNode::Extract { high, low, .. } => Some(high - low + 1),
            AstNode::Concat { children } => {
                children.iter().try_fold(0u32, |acc, c| Some(acc + c.width()?))
            }
            AstNode::SignExtend { extra, child } | AstNode::ZeroExtend { extra, child } => {
                Some(child.width()? + extra)
            }
            AstNode::Ite { then_arm, .. } => then_arm.width(),
            AstNode::Decimal(_) => None,
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Const { value, width } => write!(f, "(_ bv{value} {width})"),
            AstNode::Var { sym_id, width } => write!(f, "(var sym{sym_id} {width})"),
            AstNode::Ref { expr_id, .. } => write!(f, "ref!{expr_id}"),
            AstNode::Unary { op, child } => write!(f, "({op:?} {child})"),
            AstNode::Binary { op, lhs, rhs } => write!(f, "({op:?} {lhs} {rhs})"),
            AstNode::Extract { high, low, child } => {
                write!(f, "((_ extract {high} {low}) {child})")
            }
            AstNode::Concat { children } => {
                write!(f, "(concat")?;
                for c in children {
                    write!(f, " {c}")?;
                }
                write!(f, ")")
            }
            AstNode::SignExtend { extra, child } => {
                write!(f, "((_ sign_extend {extra}) {child})")
            }
            AstNode::ZeroExtend { extra, child } => {
                write!(f, "((_ zero_extend {extra}) {child})")
            }
            AstNode::Ite {
                cond,
                then_arm,
                else_arm,
            } => write!(f, "(ite {cond} {then_arm} {else_arm})"),
            AstNode::Decimal(value) => write!(f, "{value}"),
        }
    }
}
