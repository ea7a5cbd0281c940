//! Per-kind rewrites invoked by the lowering pass.

mod conversions;
mod for_each;
mod properties;

use strata_ast::{BinaryOp, NodeIndex};
use strata_solver::{PrimitiveKind, TypeRef, unboxed_kind};

use crate::lowering_pass::LoweringPass;

impl LoweringPass<'_> {
    /// Checked type of an original node.
    pub(crate) fn checked_type(&self, idx: NodeIndex) -> Option<&TypeRef> {
        self.model.type_of(idx).filter(|ty| !ty.is_unresolved())
    }

    /// Primitive kind of an original node, looking through boxes.
    pub(crate) fn numeric_kind(&self, idx: NodeIndex) -> Option<PrimitiveKind> {
        let ty = self.checked_type(idx)?;
        unboxed_kind(self.db, ty).filter(|kind| kind.is_numeric())
    }

    pub(crate) fn is_string(&self, idx: NodeIndex) -> bool {
        self.checked_type(idx)
            .is_some_and(|ty| *ty == self.db.string_type())
    }

    /// `left op right` producing a `kind` value, with integral division
    /// routed through the runtime helpers.
    pub(crate) fn arithmetic(
        &mut self,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
        kind: Option<PrimitiveKind>,
    ) -> NodeIndex {
        if op == BinaryOp::Div && self.options.integer_division {
            match kind {
                Some(PrimitiveKind::Long) => return self.runtime_call("ldiv", vec![left, right]),
                Some(k) if k.is_integral() => return self.runtime_call("idiv", vec![left, right]),
                _ => {}
            }
        }
        self.arena.binary(op, left, right)
    }
}

/// Kind of `left op right` for numeric operands.
pub(crate) fn result_kind(op: BinaryOp, left: PrimitiveKind, right: Option<PrimitiveKind>) -> PrimitiveKind {
    match op {
        // Shifts take the promoted type of the left operand only.
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => PrimitiveKind::promote(left, PrimitiveKind::Int),
        _ => PrimitiveKind::promote(left, right.unwrap_or(PrimitiveKind::Int)),
    }
}
