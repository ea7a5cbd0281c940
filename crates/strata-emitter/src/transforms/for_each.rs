//! `for (T x : items) body` as a counted or iterator-driven `for`.
//!
//! The temporaries live in the loop initializer, so a label on the original
//! statement still names the loop and `continue` still runs the increment.

use strata_ast::{BinaryOp, NodeIndex, TypeSyntax, UnaryOp};
use strata_solver::{TypeRef, as_super, iteration_element};
use tracing::trace;

use crate::ForEachStrategy;
use crate::lowering_pass::LoweringPass;

struct LoopParts {
    init: Vec<NodeIndex>,
    condition: NodeIndex,
    incrementor: Vec<NodeIndex>,
    /// Expression producing the current element.
    current: NodeIndex,
}

impl LoweringPass<'_> {
    pub(crate) fn lower_for_each(
        &mut self,
        idx: NodeIndex,
        ty: TypeSyntax,
        name: &str,
        expression: NodeIndex,
        body: NodeIndex,
    ) -> Option<NodeIndex> {
        let iterable = self.checked_type(expression)?.clone();
        let element = iteration_element(self.db, &iterable)?;
        let declared = if ty.name == "var" {
            element.to_syntax(self.db)
        } else {
            ty
        };

        let n = self.fresh_temp();
        let parts = if iterable.element().is_some() {
            self.counted_loop(n, &iterable, expression, "length", None)
        } else if self.options.for_each == ForEachStrategy::Index && self.is_list(&iterable) {
            self.counted_loop(n, &iterable, expression, "size()", Some("get"))
        } else {
            self.iterator_loop(n, &element, expression)?
        };

        let variable = self.arena.var(declared, name, parts.current);
        let block = self.arena.block(vec![variable, body]);
        let lowered = self
            .arena
            .for_stmt(parts.init, parts.condition, parts.incrementor, block);
        trace!(node = idx.0, temp = n, "[lowering] for-each");
        self.stats.for_each += 1;
        Some(lowered)
    }

    fn is_list(&self, ty: &TypeRef) -> bool {
        self.db
            .well_known()
            .list
            .is_some_and(|list| as_super(self.db, ty, list).is_some())
    }

    /// `for (C _sN = items, int _iN = 0; _iN < _sN.<bound>; _iN++)` reading
    /// `_sN[_iN]`, or `_sN.<getter>(_iN)` for lists.
    fn counted_loop(
        &mut self,
        n: u32,
        collection: &TypeRef,
        expression: NodeIndex,
        bound: &str,
        getter: Option<&str>,
    ) -> LoopParts {
        let source = if getter.is_some() {
            format!("_l{n}")
        } else {
            format!("_a{n}")
        };
        let index = format!("_i{n}");

        let hold = self.arena.var(collection.to_syntax(self.db), &source, expression);
        let zero = self.arena.int(0);
        let counter = self.arena.var(TypeSyntax::named("int"), &index, zero);

        let i = self.arena.ident(&index);
        let limit = match bound.strip_suffix("()") {
            Some(method) => self.arena.call(&format!("{source}.{method}"), Vec::new()),
            None => self.arena.ident(&format!("{source}.{bound}")),
        };
        let condition = self.arena.binary(BinaryOp::Lt, i, limit);
        let i = self.arena.ident(&index);
        let step = self.arena.unary(UnaryOp::PostIncrement, i);

        let i = self.arena.ident(&index);
        let current = match getter {
            Some(getter) => self.arena.call(&format!("{source}.{getter}"), vec![i]),
            None => {
                let base = self.arena.ident(&source);
                let element = self.arena.array_sel(i);
                self.arena.select(base, vec![element])
            }
        };
        LoopParts {
            init: vec![hold, counter],
            condition,
            incrementor: vec![step],
            current,
        }
    }

    /// `for (Iterator<E> _itN = items.iterator(); _itN.hasNext();)` reading
    /// `_itN.next()`.
    fn iterator_loop(&mut self, n: u32, element: &TypeRef, expression: NodeIndex) -> Option<LoopParts> {
        let iterator_id = self.db.well_known().iterator?;
        let iterator_ty = TypeRef::parameterized(iterator_id, vec![element.clone()]);
        let cursor = format!("_it{n}");

        let open = self.arena.method_sel("iterator", Vec::new());
        let iterator = self.arena.select(expression, vec![open]);
        let hold = self.arena.var(iterator_ty.to_syntax(self.db), &cursor, iterator);
        let condition = self.arena.call(&format!("{cursor}.hasNext"), Vec::new());
        let current = self.arena.call(&format!("{cursor}.next"), Vec::new());
        Some(LoopParts {
            init: vec![hold],
            condition,
            incrementor: Vec::new(),
            current,
        })
    }
}
