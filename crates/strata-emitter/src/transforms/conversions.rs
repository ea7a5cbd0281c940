//! Numeric conversions the target does not perform: narrowing casts,
//! integral division and the implicit narrowing of compound assignment.

use strata_ast::{AssignOp, BinaryOp, NodeData, NodeIndex};
use strata_checker::MemberBinding;
use strata_solver::PrimitiveKind;
use tracing::trace;

use super::result_kind;
use crate::lowering_pass::LoweringPass;

/// Assignable end of a selector chain, re-read through temporaries.
enum Slot {
    Field(String),
    Element(NodeIndex),
}

/// Whether converting a `from` value to `to` loses information.
pub(crate) fn needs_narrowing(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    to.is_integral() && from.is_numeric() && !from.widens_to(to)
}

impl LoweringPass<'_> {
    /// Wrap `expr` (a `from` value) in the helpers converting it to `to`.
    pub(crate) fn narrow(&mut self, from: PrimitiveKind, to: PrimitiveKind, expr: NodeIndex) -> NodeIndex {
        if !needs_narrowing(from, to) {
            return expr;
        }
        let mut value = expr;
        let mut current = from;
        match from {
            PrimitiveKind::Float | PrimitiveKind::Double => {
                if to == PrimitiveKind::Long {
                    return self.runtime_call("truncLong", vec![value]);
                }
                value = self.runtime_call("trunc", vec![value]);
                current = PrimitiveKind::Int;
            }
            PrimitiveKind::Long => {
                value = self.runtime_call("toInt", vec![value]);
                current = PrimitiveKind::Int;
            }
            _ => {}
        }
        if current == to {
            return value;
        }
        match to {
            PrimitiveKind::Short => self.runtime_call("toShort", vec![value]),
            PrimitiveKind::Byte => self.runtime_call("toByte", vec![value]),
            PrimitiveKind::Char => self.runtime_call("toChar", vec![value]),
            _ => value,
        }
    }

    pub(crate) fn lower_cast(&mut self, idx: NodeIndex, expression: NodeIndex) -> Option<NodeIndex> {
        let to = self.checked_type(idx)?.primitive()?;
        let from = self.numeric_kind(expression)?;
        if !needs_narrowing(from, to) {
            return None;
        }
        trace!(node = idx.0, from = from.name(), to = to.name(), "[lowering] narrowing cast");
        self.stats.casts += 1;
        Some(self.narrow(from, to, expression))
    }

    pub(crate) fn lower_division(
        &mut self,
        idx: NodeIndex,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    ) -> Option<NodeIndex> {
        if op != BinaryOp::Div {
            return None;
        }
        let kind = self.numeric_kind(idx).filter(|k| k.is_integral())?;
        self.stats.divisions += 1;
        Some(self.arithmetic(op, left, right, Some(kind)))
    }

    /// `target op= value` where the target would not truncate or narrow the
    /// result itself. The target's receiver and index are evaluated once.
    pub(crate) fn lower_compound(
        &mut self,
        op: AssignOp,
        target: NodeIndex,
        value: NodeIndex,
    ) -> Option<NodeIndex> {
        let bin = op.binary_op()?;
        let target_kind = self.numeric_kind(target)?;
        let kind = result_kind(bin, target_kind, self.numeric_kind(value));
        let divides = bin == BinaryOp::Div && kind.is_integral() && self.options.integer_division;
        let narrows = self.options.narrowing_casts && needs_narrowing(kind, target_kind);
        if !divides && !narrows {
            return None;
        }

        let lowered = match self.arena.data(target)?.clone() {
            NodeData::Identifier {
                names,
                arguments: None,
            } => {
                let static_prefix = self
                    .model
                    .bindings(target)
                    .get(..names.len().saturating_sub(1))
                    .is_some_and(|prefix| prefix.iter().all(|b| matches!(b, MemberBinding::Type(_))));
                if names.len() == 1 || static_prefix {
                    let read = self.arena.clone_subtree(target);
                    let computed = self.arithmetic(bin, read, value, Some(kind));
                    let narrowed = self.narrow(kind, target_kind, computed);
                    self.arena.assign(target, narrowed)
                } else {
                    let field = self.pop_name(target)?;
                    let n = self.fresh_temp();
                    let receiver = format!("_r{n}");
                    let slot = format!("{receiver}.{field}");
                    let store = self.store_temp(&receiver, target);
                    let lhs = self.arena.ident(&slot);
                    let read = self.arena.ident(&slot);
                    let computed = self.arithmetic(bin, read, value, Some(kind));
                    let narrowed = self.narrow(kind, target_kind, computed);
                    let update = self.arena.assign(lhs, narrowed);
                    self.arena.sequence(vec![receiver], vec![store, update])
                }
            }
            NodeData::Selector { selectors, .. } => {
                let slot = match self.arena.data(*selectors.nodes.last()?)?.clone() {
                    NodeData::VariableSelector {
                        name,
                        arguments: None,
                    } => Slot::Field(name),
                    NodeData::ArraySelector { index } => Slot::Element(index),
                    _ => return None,
                };
                let (receiver_expr, _) = self.split_selector(target)?;
                let n = self.fresh_temp();
                let receiver = format!("_r{n}");
                let mut temps = vec![receiver.clone()];
                let mut exprs = vec![self.store_temp(&receiver, receiver_expr)];
                if let Slot::Element(index) = &slot {
                    let key = format!("_k{n}");
                    exprs.push(self.store_temp(&key, *index));
                    temps.push(key);
                }
                let lhs = self.slot_node(n, &slot);
                let read = self.slot_node(n, &slot);
                let computed = self.arithmetic(bin, read, value, Some(kind));
                let narrowed = self.narrow(kind, target_kind, computed);
                exprs.push(self.arena.assign(lhs, narrowed));
                self.arena.sequence(temps, exprs)
            }
            _ => return None,
        };
        trace!(target = target.0, op = op.symbol(), "[lowering] compound assignment");
        self.stats.compound_assignments += 1;
        Some(lowered)
    }

    /// `_rN.field` or `_rN[_kN]`.
    fn slot_node(&mut self, n: u32, slot: &Slot) -> NodeIndex {
        let base = self.arena.ident(&format!("_r{n}"));
        let selector = match slot {
            Slot::Field(name) => self.arena.field_sel(name.clone()),
            Slot::Element(_) => {
                let key = self.arena.ident(&format!("_k{n}"));
                self.arena.array_sel(key)
            }
        };
        self.arena.select(base, vec![selector])
    }

    /// `temp = value`, the form that declares a sequence temporary.
    pub(crate) fn store_temp(&mut self, temp: &str, value: NodeIndex) -> NodeIndex {
        let name = self.arena.ident(temp);
        self.arena.assign(name, value)
    }

    /// Drop the last segment of an identifier chain in place, returning it.
    /// The node keeps its resolved bindings for the remaining segments.
    pub(crate) fn pop_name(&mut self, idx: NodeIndex) -> Option<String> {
        let node = self.arena.get_mut(idx)?;
        match &mut node.data {
            NodeData::Identifier { names, arguments } if names.len() > 1 && arguments.is_none() => names.pop(),
            _ => None,
        }
    }

    /// Split `expr.s1...sn` into the receiver `expr.s1...s(n-1)` and `sn`.
    /// The selector node itself is reused as the receiver when more than one
    /// selector remains.
    pub(crate) fn split_selector(&mut self, idx: NodeIndex) -> Option<(NodeIndex, NodeIndex)> {
        let NodeData::Selector {
            expression,
            selectors,
        } = self.arena.data(idx)?.clone()
        else {
            return None;
        };
        let last = *selectors.nodes.last()?;
        if selectors.len() == 1 {
            return Some((expression, last));
        }
        let node = self.arena.get_mut(idx)?;
        if let NodeData::Selector { selectors, .. } = &mut node.data {
            selectors.nodes.pop();
        }
        Some((idx, last))
    }
}
