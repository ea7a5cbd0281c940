//! Computed properties as explicit accessor calls.
//!
//! `obj.count` resolved to `getCount()`/`setCount(v)` has no counterpart in
//! the target, so reads become getter calls and writes become sequences:
//!
//! ```text
//! getObj().count++   =>   (_r0 = getObj(), _v0 = _r0.getCount(), _r0.setCount(_v0 + 1), _v0)
//! ```
//!
//! The receiver is stored in a temporary and read from there, so it is
//! evaluated exactly once.

use strata_ast::{AssignOp, BinaryOp, NodeData, NodeIndex, NodeList, UnaryOp};
use strata_checker::{MemberBinding, PropertyAccessor};
use strata_solver::PrimitiveKind;
use tracing::trace;

use super::result_kind;
use crate::lowering_pass::LoweringPass;

/// Where the receiver of a computed property comes from.
enum ReceiverShape {
    /// `count`: the enclosing instance or type.
    Implicit,
    /// `Config.count`: a dotted type name.
    Static(String),
    /// `a.b.count`: the identifier chain minus its last segment.
    Chain,
    /// `expr.count`: the selector chain minus its last selector.
    Selector,
}

/// How the lowered code reaches the receiver.
enum Access {
    Implicit,
    Static(String),
    Temp(String),
}

impl Access {
    fn member(&self, name: &str) -> String {
        match self {
            Access::Implicit => name.to_string(),
            Access::Static(prefix) | Access::Temp(prefix) => format!("{prefix}.{name}"),
        }
    }
}

struct ComputedTarget {
    shape: ReceiverShape,
    getter: String,
    setter: Option<String>,
}

fn computed(binding: Option<&MemberBinding>) -> Option<(&String, &Option<String>)> {
    match binding? {
        MemberBinding::Property {
            accessor: PropertyAccessor::Computed { getter, setter, .. },
            ..
        } => Some((getter, setter)),
        _ => None,
    }
}

impl LoweringPass<'_> {
    /// Whether `idx` as a whole denotes a computed property.
    fn computed_target(&self, idx: NodeIndex) -> Option<ComputedTarget> {
        match self.arena.data(idx)? {
            NodeData::Identifier {
                names,
                arguments: None,
            } => {
                let bindings = self.model.bindings(idx);
                let (getter, setter) = computed(bindings.get(names.len().checked_sub(1)?))?;
                let prefix = &bindings[..names.len() - 1];
                let shape = if names.len() == 1 {
                    ReceiverShape::Implicit
                } else if prefix.iter().all(|b| matches!(b, MemberBinding::Type(_))) {
                    ReceiverShape::Static(names[..names.len() - 1].join("."))
                } else {
                    ReceiverShape::Chain
                };
                Some(ComputedTarget {
                    shape,
                    getter: getter.clone(),
                    setter: setter.clone(),
                })
            }
            NodeData::Selector { selectors, .. } => {
                let last = *selectors.nodes.last()?;
                if !matches!(
                    self.arena.data(last),
                    Some(NodeData::VariableSelector { arguments: None, .. })
                ) {
                    return None;
                }
                let (getter, setter) = computed(self.model.final_binding(last))?;
                Some(ComputedTarget {
                    shape: ReceiverShape::Selector,
                    getter: getter.clone(),
                    setter: setter.clone(),
                })
            }
            _ => None,
        }
    }

    /// Detach the receiver of `target`, storing it in `_rN` when it is an
    /// expression.
    fn bind_receiver(
        &mut self,
        n: u32,
        target: NodeIndex,
        shape: ReceiverShape,
        temps: &mut Vec<String>,
        exprs: &mut Vec<NodeIndex>,
    ) -> Option<Access> {
        let receiver = match shape {
            ReceiverShape::Implicit => return Some(Access::Implicit),
            ReceiverShape::Static(prefix) => return Some(Access::Static(prefix)),
            ReceiverShape::Chain => {
                self.pop_name(target)?;
                target
            }
            ReceiverShape::Selector => self.split_selector(target)?.0,
        };
        let temp = format!("_r{n}");
        exprs.push(self.store_temp(&temp, receiver));
        temps.push(temp.clone());
        Some(Access::Temp(temp))
    }

    fn accessor_call(&mut self, access: &Access, method: &str, args: Vec<NodeIndex>) -> NodeIndex {
        self.arena.call(&access.member(method), args)
    }

    pub(crate) fn lower_property_update(
        &mut self,
        idx: NodeIndex,
        op: UnaryOp,
        operand: NodeIndex,
    ) -> Option<NodeIndex> {
        let ComputedTarget { shape, getter, setter } = self.computed_target(operand)?;
        let setter = setter?;
        let kind = self.numeric_kind(operand);
        let delta = if op.update_delta()? > 0 {
            BinaryOp::Add
        } else {
            BinaryOp::Sub
        };

        let n = self.fresh_temp();
        let mut temps = Vec::new();
        let mut exprs = Vec::new();
        let access = self.bind_receiver(n, operand, shape, &mut temps, &mut exprs)?;
        let value = format!("_v{n}");
        temps.push(value.clone());

        let read = self.accessor_call(&access, &getter, Vec::new());
        if op.is_postfix() {
            exprs.push(self.store_temp(&value, read));
            let old = self.arena.ident(&value);
            let stepped = self.step(delta, old, kind);
            exprs.push(self.accessor_call(&access, &setter, vec![stepped]));
        } else {
            let stepped = self.step(delta, read, kind);
            exprs.push(self.store_temp(&value, stepped));
            let new = self.arena.ident(&value);
            exprs.push(self.accessor_call(&access, &setter, vec![new]));
        }
        exprs.push(self.arena.ident(&value));

        trace!(node = idx.0, getter = %getter, "[lowering] property update");
        self.stats.properties += 1;
        Some(self.arena.sequence(temps, exprs))
    }

    /// `base ± 1`, narrowed back to the property's kind.
    fn step(&mut self, op: BinaryOp, base: NodeIndex, kind: Option<PrimitiveKind>) -> NodeIndex {
        let one = self.arena.int(1);
        let sum = self.arena.binary(op, base, one);
        match kind {
            Some(kind) => self.narrow(PrimitiveKind::promote(kind, PrimitiveKind::Int), kind, sum),
            None => sum,
        }
    }

    pub(crate) fn lower_assignment(
        &mut self,
        idx: NodeIndex,
        op: AssignOp,
        target: NodeIndex,
        value: NodeIndex,
    ) -> Option<NodeIndex> {
        if self.options.rewrite_properties
            && let Some(property) = self.computed_target(target)
        {
            return self.lower_property_assignment(idx, op, target, value, property);
        }
        self.lower_compound(op, target, value)
    }

    fn lower_property_assignment(
        &mut self,
        idx: NodeIndex,
        op: AssignOp,
        target: NodeIndex,
        value: NodeIndex,
        property: ComputedTarget,
    ) -> Option<NodeIndex> {
        let ComputedTarget { shape, getter, setter } = property;
        let setter = setter?;

        // The value of a plain assignment statement is unused: call the
        // setter on the receiver directly.
        let statement = matches!(
            self.arena.data(self.arena.parent_of(idx)),
            Some(NodeData::ExpressionStatement { .. })
        );
        if statement && op == AssignOp::Assign {
            let call = match shape {
                ReceiverShape::Implicit => self.arena.call(&setter, vec![value]),
                ReceiverShape::Static(prefix) => self.arena.call(&format!("{prefix}.{setter}"), vec![value]),
                ReceiverShape::Chain => {
                    self.pop_name(target)?;
                    let set = self.arena.method_sel(setter.clone(), vec![value]);
                    self.arena.select(target, vec![set])
                }
                ReceiverShape::Selector => {
                    let (receiver, _) = self.split_selector(target)?;
                    let set = self.arena.method_sel(setter.clone(), vec![value]);
                    self.arena.select(receiver, vec![set])
                }
            };
            trace!(node = idx.0, setter = %setter, "[lowering] property store");
            self.stats.properties += 1;
            return Some(call);
        }

        let n = self.fresh_temp();
        let mut temps = Vec::new();
        let mut exprs = Vec::new();
        let kind = self.numeric_kind(target);
        let concat = self.is_string(target);
        let access = self.bind_receiver(n, target, shape, &mut temps, &mut exprs)?;
        let result = format!("_v{n}");
        temps.push(result.clone());

        let stored = match op.binary_op() {
            None => value,
            Some(bin) => {
                let read = self.accessor_call(&access, &getter, Vec::new());
                match kind {
                    Some(kind) if !concat => {
                        let computed_kind = result_kind(bin, kind, self.numeric_kind(value));
                        let computed = self.arithmetic(bin, read, value, Some(computed_kind));
                        self.narrow(computed_kind, kind, computed)
                    }
                    _ => self.arena.binary(bin, read, value),
                }
            }
        };
        exprs.push(self.store_temp(&result, stored));
        let current = self.arena.ident(&result);
        exprs.push(self.accessor_call(&access, &setter, vec![current]));
        exprs.push(self.arena.ident(&result));

        trace!(node = idx.0, setter = %setter, op = op.symbol(), "[lowering] property assignment");
        self.stats.properties += 1;
        Some(self.arena.sequence(temps, exprs))
    }

    /// Computed segments read as getter calls.
    pub(crate) fn lower_property_read(&mut self, idx: NodeIndex) -> Option<NodeIndex> {
        match self.arena.data(idx)?.clone() {
            NodeData::Identifier { names, arguments } => self.lower_chain_read(idx, &names, arguments),
            NodeData::Selector { selectors, .. } => {
                self.lower_selector_reads(&selectors);
                None
            }
            _ => None,
        }
    }

    /// `a.count.x` becomes `a.getCount().x`; the identifier chain stops at
    /// the first getter call and continues as selectors.
    fn lower_chain_read(
        &mut self,
        idx: NodeIndex,
        names: &[String],
        arguments: Option<NodeList>,
    ) -> Option<NodeIndex> {
        let bindings = self.model.bindings(idx);
        let first = (0..names.len()).find(|&i| computed(bindings.get(i)).is_some())?;
        let accessors: Vec<Option<String>> = (0..names.len())
            .map(|i| computed(bindings.get(i)).map(|(getter, _)| getter.clone()))
            .collect();

        let mut head_names = names[..first].to_vec();
        head_names.push(accessors[first].clone()?);
        let head = self.arena.call(&head_names.join("."), Vec::new());

        let last = names.len() - 1;
        let mut arguments = arguments;
        let mut selectors = Vec::new();
        for (i, name) in names.iter().enumerate().skip(first + 1) {
            let selector = match &accessors[i] {
                Some(getter) => self.arena.method_sel(getter.clone(), Vec::new()),
                None if i == last && arguments.is_some() => {
                    let args = arguments.take().map(|list| list.nodes).unwrap_or_default();
                    self.arena.method_sel(name.clone(), args)
                }
                None => self.arena.field_sel(name.clone()),
            };
            selectors.push(selector);
        }

        trace!(node = idx.0, segment = first, "[lowering] property read");
        self.stats.properties += 1;
        if selectors.is_empty() {
            return Some(head);
        }
        Some(self.arena.select(head, selectors))
    }

    /// Selectors are rewritten in place: `.count` becomes `.getCount()`.
    fn lower_selector_reads(&mut self, selectors: &NodeList) {
        for selector in selectors.iter() {
            let Some((getter, _)) = computed(self.model.final_binding(selector)) else {
                continue;
            };
            let getter = getter.clone();
            let Some(node) = self.arena.get_mut(selector) else {
                continue;
            };
            if let NodeData::VariableSelector { name, arguments } = &mut node.data
                && arguments.is_none()
            {
                *name = getter;
                *arguments = Some(NodeList::new());
                self.stats.properties += 1;
            }
        }
    }
}
