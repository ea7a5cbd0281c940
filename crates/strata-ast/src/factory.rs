//! Programmatic node construction.
//!
//! Hosts without the grammar collaborator (and the test suites) build trees
//! through these helpers. Every helper returns the new node's index; all
//! created nodes carry a synthesized range.

use crate::base::{NodeIndex, NodeList};
use crate::node::{ClassKind, ModifierFlags, NodeData, Param, TypeParamSyntax};
use crate::node_arena::NodeArena;
use crate::ops::{AssignOp, BinaryOp, BindingDirection, LiteralValue, UnaryOp};
use crate::syntax::TypeSyntax;

/// Header of a class or interface declaration.
#[derive(Clone, Debug, Default)]
pub struct ClassSpec {
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: ModifierFlags,
    pub type_params: Vec<TypeParamSyntax>,
    pub extends: Option<TypeSyntax>,
    pub implements: Vec<TypeSyntax>,
    pub modifies: bool,
}

impl ClassSpec {
    pub fn class(name: impl Into<String>) -> Self {
        ClassSpec {
            name: name.into(),
            ..ClassSpec::default()
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        ClassSpec {
            name: name.into(),
            kind: ClassKind::Interface,
            ..ClassSpec::default()
        }
    }

    pub fn extends(mut self, ty: TypeSyntax) -> Self {
        self.extends = Some(ty);
        self
    }

    pub fn implements(mut self, ty: TypeSyntax) -> Self {
        self.implements.push(ty);
        self
    }

    pub fn type_param(mut self, name: impl Into<String>, bound: Option<TypeSyntax>) -> Self {
        self.type_params.push(TypeParamSyntax {
            name: name.into(),
            bound,
        });
        self
    }

    pub fn modifiers(mut self, modifiers: ModifierFlags) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Mark the declaration as a later-layer modification of an existing type.
    pub fn modifying(mut self) -> Self {
        self.modifies = true;
        self
    }
}

pub fn param(ty: TypeSyntax, name: impl Into<String>) -> Param {
    Param {
        ty,
        name: name.into(),
    }
}

fn names_of(dotted: &str) -> Vec<String> {
    dotted.split('.').map(str::to_string).collect()
}

impl NodeArena {
    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn literal(&mut self, value: LiteralValue) -> NodeIndex {
        self.add_synthesized(NodeData::Literal { value })
    }

    pub fn int(&mut self, value: i32) -> NodeIndex {
        self.literal(LiteralValue::Int(value))
    }

    pub fn long(&mut self, value: i64) -> NodeIndex {
        self.literal(LiteralValue::Long(value))
    }

    pub fn double(&mut self, value: f64) -> NodeIndex {
        self.literal(LiteralValue::Double(value))
    }

    pub fn boolean(&mut self, value: bool) -> NodeIndex {
        self.literal(LiteralValue::Boolean(value))
    }

    pub fn char_lit(&mut self, value: char) -> NodeIndex {
        self.literal(LiteralValue::Char(value))
    }

    pub fn string(&mut self, value: impl Into<String>) -> NodeIndex {
        self.literal(LiteralValue::String(value.into()))
    }

    pub fn null(&mut self) -> NodeIndex {
        self.literal(LiteralValue::Null)
    }

    /// Identifier chain from a dotted spelling: `ident("a.b.c")`.
    pub fn ident(&mut self, dotted: &str) -> NodeIndex {
        self.add_synthesized(NodeData::Identifier {
            names: names_of(dotted),
            arguments: None,
        })
    }

    /// Call through an identifier chain: `call("obj.m", args)` is `obj.m(args)`.
    pub fn call(&mut self, dotted: &str, args: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(NodeData::Identifier {
            names: names_of(dotted),
            arguments: Some(args.into()),
        })
    }

    /// Root expression with a selector chain.
    pub fn select(&mut self, expression: NodeIndex, selectors: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(NodeData::Selector {
            expression,
            selectors: selectors.into(),
        })
    }

    pub fn field_sel(&mut self, name: impl Into<String>) -> NodeIndex {
        self.add_synthesized(NodeData::VariableSelector {
            name: name.into(),
            arguments: None,
        })
    }

    pub fn method_sel(&mut self, name: impl Into<String>, args: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(NodeData::VariableSelector {
            name: name.into(),
            arguments: Some(args.into()),
        })
    }

    pub fn array_sel(&mut self, index: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::ArraySelector { index })
    }

    pub fn this(&mut self) -> NodeIndex {
        self.add_synthesized(NodeData::This { qualifier: None })
    }

    /// `Outer.this`.
    pub fn outer_this(&mut self, qualifier: impl Into<String>) -> NodeIndex {
        self.add_synthesized(NodeData::This {
            qualifier: Some(qualifier.into()),
        })
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::Binary { op, left, right })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::Unary { op, operand })
    }

    pub fn assign(&mut self, target: NodeIndex, value: NodeIndex) -> NodeIndex {
        self.compound_assign(AssignOp::Assign, target, value)
    }

    pub fn compound_assign(
        &mut self,
        op: AssignOp,
        target: NodeIndex,
        value: NodeIndex,
    ) -> NodeIndex {
        self.add_synthesized(NodeData::Assignment { op, target, value })
    }

    pub fn conditional(
        &mut self,
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    ) -> NodeIndex {
        self.add_synthesized(NodeData::Conditional {
            condition,
            when_true,
            when_false,
        })
    }

    pub fn cast(&mut self, ty: TypeSyntax, expression: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::Cast { ty, expression })
    }

    pub fn instance_of(&mut self, expression: NodeIndex, ty: TypeSyntax) -> NodeIndex {
        self.add_synthesized(NodeData::InstanceOf { expression, ty })
    }

    pub fn new_object(&mut self, ty: TypeSyntax, args: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(NodeData::New {
            ty,
            arguments: args.into(),
        })
    }

    pub fn new_array(
        &mut self,
        element: TypeSyntax,
        dimensions: Vec<NodeIndex>,
        initializer: NodeIndex,
    ) -> NodeIndex {
        self.add_synthesized(NodeData::NewArray {
            element,
            dimensions: dimensions.into(),
            initializer,
        })
    }

    pub fn array_init(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(NodeData::ArrayInitializer {
            elements: elements.into(),
        })
    }

    pub fn lambda(&mut self, params: &[&str], body: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::Lambda {
            params: params.iter().map(|p| (*p).to_string()).collect(),
            body,
        })
    }

    pub fn paren(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::Paren { expression })
    }

    pub fn sequence(&mut self, temps: Vec<String>, expressions: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(NodeData::Sequence {
            temps,
            expressions: expressions.into(),
        })
    }

    /// Attach a data-binding direction to an expression.
    pub fn bind(&mut self, expression: NodeIndex, direction: BindingDirection) -> NodeIndex {
        if let Some(node) = self.get_mut(expression) {
            node.binding = direction;
        }
        expression
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn block(&mut self, statements: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(NodeData::Block {
            statements: statements.into(),
        })
    }

    /// `ty name = initializer;` (single declarator).
    pub fn var(&mut self, ty: TypeSyntax, name: &str, initializer: NodeIndex) -> NodeIndex {
        let decl = self.var_declarator(name, initializer);
        self.var_stmt(ty, vec![decl])
    }

    pub fn var_declarator(&mut self, name: &str, initializer: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::VariableDeclaration {
            name: name.to_string(),
            initializer,
        })
    }

    pub fn var_stmt(&mut self, ty: TypeSyntax, declarations: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(NodeData::VariableStatement {
            ty,
            declarations: declarations.into(),
        })
    }

    pub fn expr_stmt(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::ExpressionStatement { expression })
    }

    pub fn if_stmt(
        &mut self,
        condition: NodeIndex,
        then_statement: NodeIndex,
        else_statement: NodeIndex,
    ) -> NodeIndex {
        self.add_synthesized(NodeData::If {
            condition,
            then_statement,
            else_statement,
        })
    }

    pub fn while_stmt(&mut self, condition: NodeIndex, body: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::While { condition, body })
    }

    pub fn do_while(&mut self, body: NodeIndex, condition: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::DoWhile { body, condition })
    }

    pub fn for_stmt(
        &mut self,
        initializer: Vec<NodeIndex>,
        condition: NodeIndex,
        incrementor: Vec<NodeIndex>,
        body: NodeIndex,
    ) -> NodeIndex {
        self.add_synthesized(NodeData::For {
            initializer: initializer.into(),
            condition,
            incrementor: incrementor.into(),
            body,
        })
    }

    pub fn for_each(
        &mut self,
        ty: TypeSyntax,
        name: &str,
        expression: NodeIndex,
        body: NodeIndex,
    ) -> NodeIndex {
        self.add_synthesized(NodeData::ForEach {
            ty,
            name: name.to_string(),
            expression,
            body,
        })
    }

    pub fn labeled(&mut self, label: &str, statement: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::Labeled {
            label: label.to_string(),
            statement,
        })
    }

    pub fn break_stmt(&mut self, label: Option<&str>) -> NodeIndex {
        self.add_synthesized(NodeData::Break {
            label: label.map(str::to_string),
        })
    }

    pub fn continue_stmt(&mut self, label: Option<&str>) -> NodeIndex {
        self.add_synthesized(NodeData::Continue {
            label: label.map(str::to_string),
        })
    }

    pub fn return_stmt(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::Return { expression })
    }

    pub fn throw_stmt(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::Throw { expression })
    }

    pub fn try_stmt(
        &mut self,
        block: NodeIndex,
        catches: Vec<NodeIndex>,
        finally_block: NodeIndex,
    ) -> NodeIndex {
        self.add_synthesized(NodeData::Try {
            block,
            catches: catches.into(),
            finally_block,
        })
    }

    pub fn catch_clause(&mut self, types: Vec<TypeSyntax>, name: &str, block: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::CatchClause {
            types,
            name: name.to_string(),
            block,
        })
    }

    pub fn switch_stmt(&mut self, expression: NodeIndex, statements: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(NodeData::Switch {
            expression,
            statements: statements.into(),
        })
    }

    pub fn case_label(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add_synthesized(NodeData::SwitchLabel { expression })
    }

    pub fn default_label(&mut self) -> NodeIndex {
        self.case_label(NodeIndex::NONE)
    }

    pub fn empty(&mut self) -> NodeIndex {
        self.add_synthesized(NodeData::Empty)
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    pub fn source_file(&mut self, types: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(NodeData::SourceFile {
            types: types.into(),
        })
    }

    pub fn class_decl(&mut self, spec: ClassSpec, members: Vec<NodeIndex>) -> NodeIndex {
        self.add_synthesized(NodeData::ClassDeclaration {
            name: spec.name,
            kind: spec.kind,
            modifiers: spec.modifiers,
            type_params: spec.type_params,
            extends: spec.extends,
            implements: spec.implements,
            members: members.into(),
            modifies: spec.modifies,
        })
    }

    pub fn field(
        &mut self,
        modifiers: ModifierFlags,
        ty: TypeSyntax,
        name: &str,
        initializer: NodeIndex,
    ) -> NodeIndex {
        self.bound_field(modifiers, ty, name, initializer, BindingDirection::None)
    }

    /// Field whose initializer is a data-binding (`int x := expr;`).
    pub fn bound_field(
        &mut self,
        modifiers: ModifierFlags,
        ty: TypeSyntax,
        name: &str,
        initializer: NodeIndex,
        binding: BindingDirection,
    ) -> NodeIndex {
        if binding.is_bound() {
            self.bind(initializer, binding);
        }
        self.add_synthesized(NodeData::FieldDeclaration {
            modifiers,
            ty,
            name: name.to_string(),
            initializer,
            binding,
        })
    }

    pub fn method(
        &mut self,
        modifiers: ModifierFlags,
        name: &str,
        params: Vec<Param>,
        return_type: TypeSyntax,
        body: NodeIndex,
    ) -> NodeIndex {
        self.generic_method(modifiers, Vec::new(), name, params, return_type, body)
    }

    pub fn generic_method(
        &mut self,
        modifiers: ModifierFlags,
        type_params: Vec<TypeParamSyntax>,
        name: &str,
        params: Vec<Param>,
        return_type: TypeSyntax,
        body: NodeIndex,
    ) -> NodeIndex {
        self.add_synthesized(NodeData::MethodDeclaration {
            modifiers,
            type_params,
            name: name.to_string(),
            params,
            return_type,
            body,
        })
    }

    pub fn constructor(
        &mut self,
        modifiers: ModifierFlags,
        params: Vec<Param>,
        body: NodeIndex,
    ) -> NodeIndex {
        self.add_synthesized(NodeData::ConstructorDeclaration {
            modifiers,
            params,
            body,
        })
    }

    /// Append a member to an existing class declaration.
    pub fn push_member(&mut self, class: NodeIndex, member: NodeIndex) {
        if let Some(node) = self.get_mut(class)
            && let NodeData::ClassDeclaration { members, .. } = &mut node.data
        {
            members.nodes.push(member);
        }
        if let Some(node) = self.get_mut(member) {
            node.parent = class;
        }
    }
}

/// Empty argument list shorthand.
pub fn no_args() -> Vec<NodeIndex> {
    Vec::new()
}

impl From<NodeIndex> for NodeList {
    fn from(index: NodeIndex) -> Self {
        NodeList { nodes: vec![index] }
    }
}
