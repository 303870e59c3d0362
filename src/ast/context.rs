//! Hash-consing constructors for [`super::AstNode`] (C1).

use super::{
    is_valid_width,
    Ast,
    AstNode,
    BinaryOp,
    UnaryOp,
    Width,
};
use crate::error::{
    BuildError,
    BuildResult,
};
use hashbrown::HashMap;

/// Owns the hash-cons table for one analysis session. All AST construction
/// goes through here so that structurally identical subtrees share one
/// allocation, per spec.md §4.1 ("hash-consing is optional but
/// recommended").
///
/// Hashing/equality of a candidate node is structural (derived on
/// [`AstNode`], which recurses through its `Ast` children), so interning a
/// deeply nested node costs time proportional to its subtree size. That is
/// an acceptable trade for a per-instruction expression tree, which is
/// always small.
#[derive(Debug, Default)]
pub struct AstContext {
    table: HashMap<AstNode, Ast>,
    enabled: bool,
}

impl AstContext {
    /// Create a new, empty context.
    pub fn new(hash_cons_enabled: bool) -> Self {
        Self {
            table: HashMap::new(),
            enabled: hash_cons_enabled,
        }
    }

    /// Intern `node`, returning the canonical shared handle for it.
    fn intern(&mut self, node: AstNode) -> Ast {
        if !self.enabled {
            return Ast::new(node);
        }
        if let Some(existing) = self.table.get(&node) {
            return existing.clone();
        }
        let ast = Ast::new(node.clone());
        self.table.insert(node, ast.clone());
        ast
    }

    /// Number of distinct nodes currently interned. Exposed for tests and
    /// diagnostics, not part of the semantic contract.
    pub fn interned_count(&self) -> usize {
        self.table.len()
    }

    /// `Const(1, 1)`.
    pub fn bvtrue(&mut self) -> Ast {
        self.intern(AstNode::Const { value: 1, width: 1 })
    }

    /// `Const(0, 1)`.
    pub fn bvfalse(&mut self) -> Ast {
        self.intern(AstNode::Const { value: 0, width: 1 })
    }

    /// A bitvector constant, truncated to `width` bits.
    pub fn const_(&mut self, value: u128, width: Width) -> BuildResult<Ast> {
        if !is_valid_width(width) {
            return Err(BuildError::InvalidOperandSize(width));
        }
        let mask = if width == 128 {
            u128::MAX
        } else {
            (1u128 << width) - 1
        };
        Ok(self.intern(AstNode::Const {
            value: value & mask,
            width,
        }))
    }

    /// A placeholder for an unresolved input symbol.
    pub fn var(&mut self, sym_id: u64, width: Width) -> BuildResult<Ast> {
        if !is_valid_width(width) {
            return Err(BuildError::InvalidOperandSize(width));
        }
        Ok(self.intern(AstNode::Var { sym_id, width }))
    }

    /// A named handle into the symbolic-state expression store.
    pub fn ref_(&mut self, expr_id: u64, width: Width) -> BuildResult<Ast> {
        if !is_valid_width(width) {
            return Err(BuildError::InvalidOperandSize(width));
        }
        Ok(self.intern(AstNode::Ref { expr_id, width }))
    }

    /// An untyped natural, valid only as a rotate/shift count.
    pub fn decimal(&mut self, value: u64) -> Ast {
        self.intern(AstNode::Decimal(value))
    }

    /// `op(child)`.
    pub fn unary(&mut self, op: UnaryOp, child: Ast) -> BuildResult<Ast> {
        child.width().ok_or(BuildError::OutOfRangeSlice)?;
        Ok(self.intern(AstNode::Unary { op, child }))
    }

    /// `lhs op rhs`.
    ///
    /// For [`BinaryOp::BvRol`]/[`BinaryOp::BvRor`], `rhs` may be a
    /// [`AstNode::Decimal`] (spec.md §3 invariant (c)); any other
    /// non-matching width is rejected.
    pub fn binary(&mut self, op: BinaryOp, lhs: Ast, rhs: Ast) -> BuildResult<Ast> {
        let lhs_width = lhs.width().ok_or(BuildError::OutOfRangeSlice)?;
        match rhs.width() {
            Some(w) if w == lhs_width => {}
            Some(_) => return Err(BuildError::OutOfRangeSlice),
            None if op.allows_decimal_rhs() => {}
            None => return Err(BuildError::SymbolicShiftCount),
        }
        Ok(self.intern(AstNode::Binary { op, lhs, rhs }))
    }

    /// `lhs == rhs`, a 1-bit result.
    pub fn equal(&mut self, lhs: Ast, rhs: Ast) -> BuildResult<Ast> {
        self.binary(BinaryOp::Equal, lhs, rhs)
    }

    /// `child[high:low]`. Short-circuits to `child` itself (per spec.md
    /// §4.1) when the slice covers the operand's full width.
    pub fn extract(&mut self, high: u32, low: u32, child: Ast) -> BuildResult<Ast> {
        let width = child.width().ok_or(BuildError::OutOfRangeSlice)?;
        if low > high || high >= width {
            return Err(BuildError::OutOfRangeSlice);
        }
        if high == width - 1 && low == 0 {
            return Ok(child);
        }
        Ok(self.intern(AstNode::Extract { high, low, child }))
    }

    /// High-bits-first concatenation. `concat([x]) == x`.
    pub fn concat(&mut self, mut children: Vec<Ast>) -> BuildResult<Ast> {
        if children.is_empty() {
            return Err(BuildError::OutOfRangeSlice);
        }
        for c in &children {
            c.width().ok_or(BuildError::OutOfRangeSlice)?;
        }
        if children.len() == 1 {
            return Ok(children.pop().expect("checked non-empty above"));
        }
        Ok(self.intern(AstNode::Concat { children }))
    }

    /// Sign-extend `child` by `extra` bits.
    pub fn sign_extend(&mut self, extra: Width, child: Ast) -> BuildResult<Ast> {
        child.width().ok_or(BuildError::OutOfRangeSlice)?;
        if extra == 0 {
            return Ok(child);
        }
        Ok(self.intern(AstNode::SignExtend { extra, child }))
    }

    /// Zero-extend `child` by `extra` bits.
    pub fn zero_extend(&mut self, extra: Width, child: Ast) -> BuildResult<Ast> {
        child.width().ok_or(BuildError::OutOfRangeSlice)?;
        if extra == 0 {
            return Ok(child);
        }
        Ok(self.intern(AstNode::ZeroExtend { extra, child }))
    }

    /// `if cond { then_arm } else { else_arm }`. `cond` must be 1-bit; the
    /// two arms must share a width.
    pub fn ite(&mut self, cond: Ast, then_arm: Ast, else_arm: Ast) -> BuildResult<Ast> {
        if cond.width() != Some(1) {
            return Err(BuildError::OutOfRangeSlice);
        }
        let then_width = then_arm.width().ok_or(BuildError::OutOfRangeSlice)?;
        if else_arm.width() != Some(then_width) {
            return Err(BuildError::OutOfRangeSlice);
        }
        Ok(self.intern(AstNode::Ite {
            cond,
            then_arm,
            else_arm,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structurally_identical_consts_are_shared() {
        let mut ctx = AstContext::new(true);
        let a = ctx.const_(42, 32).unwrap();
        let b = ctx.const_(42, 32).unwrap();
        assert!(Ast::ptr_eq(&a, &b));
        assert_eq!(ctx.interned_count(), 1);
    }

    #[test]
    fn disabled_hash_consing_still_produces_equal_but_distinct_nodes() {
        let mut ctx = AstContext::new(false);
        let a = ctx.const_(7, 8).unwrap();
        let b = ctx.const_(7, 8).unwrap();
        assert_eq!(a, b);
        assert!(!Ast::ptr_eq(&a, &b));
    }

    #[test]
    fn const_is_truncated_to_width() {
        let mut ctx = AstContext::new(true);
        let c = ctx.const_(0x1_ff, 8).unwrap();
        assert_eq!(*c, AstNode::Const { value: 0xff, width: 8 });
    }

    #[test]
    fn invalid_width_is_rejected() {
        let mut ctx = AstContext::new(true);
        assert_eq!(
            ctx.const_(0, 3),
            Err(BuildError::InvalidOperandSize(3))
        );
    }

    #[test]
    fn extract_full_width_short_circuits() {
        let mut ctx = AstContext::new(true);
        let x = ctx.const_(5, 32).unwrap();
        let extracted = ctx.extract(31, 0, x.clone()).unwrap();
        assert!(Ast::ptr_eq(&x, &extracted));
    }

    #[test]
    fn extract_out_of_range_is_rejected() {
        let mut ctx = AstContext::new(true);
        let x = ctx.const_(5, 8).unwrap();
        assert_eq!(ctx.extract(8, 0, x), Err(BuildError::OutOfRangeSlice));
    }

    #[test]
    fn concat_of_single_child_is_identity() {
        let mut ctx = AstContext::new(true);
        let x = ctx.const_(5, 8).unwrap();
        let c = ctx.concat(vec![x.clone()]).unwrap();
        assert!(Ast::ptr_eq(&x, &c));
    }

    #[test]
    fn concat_width_is_sum_of_children() {
        let mut ctx = AstContext::new(true);
        let hi = ctx.const_(0, 32).unwrap();
        let lo = ctx.const_(0, 32).unwrap();
        let c = ctx.concat(vec![hi, lo]).unwrap();
        assert_eq!(c.width(), Some(64));
    }

    #[test]
    fn rotate_accepts_decimal_rhs() {
        let mut ctx = AstContext::new(true);
        let x = ctx.const_(1, 32).unwrap();
        let count = ctx.decimal(4);
        let rotated = ctx.binary(BinaryOp::BvRol, x, count).unwrap();
        assert_eq!(rotated.width(), Some(32));
    }

    #[test]
    fn add_rejects_decimal_rhs() {
        let mut ctx = AstContext::new(true);
        let x = ctx.const_(1, 32).unwrap();
        let count = ctx.decimal(4);
        assert_eq!(
            ctx.binary(BinaryOp::BvAdd, x, count),
            Err(BuildError::SymbolicShiftCount)
        );
    }

    #[test]
    fn ite_requires_bool_condition_and_matching_arms() {
        let mut ctx = AstContext::new(true);
        let cond = ctx.bvtrue();
        let then_arm = ctx.const_(1, 32).unwrap();
        let else_arm = ctx.const_(0, 32).unwrap();
        let ite = ctx.ite(cond.clone(), then_arm.clone(), else_arm).unwrap();
        assert_eq!(ite.width(), Some(32));

        let bad_cond = ctx.const_(0, 32).unwrap();
        assert_eq!(
            ctx.ite(bad_cond, then_arm, cond),
            Err(BuildError::OutOfRangeSlice)
        );
    }
}
