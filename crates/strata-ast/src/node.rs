//! Node definitions.
//!
//! Every node kind is a variant of the closed [`NodeData`] sum type; the
//! capability passes (resolution, evaluation, lowering) dispatch with an
//! exhaustive `match`, so adding a variant forces every pass to handle it.

use crate::base::{NodeIndex, NodeList};
use crate::ops::{AssignOp, BinaryOp, BindingDirection, LiteralValue, UnaryOp};
use crate::syntax::TypeSyntax;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strata_common::TextRange;

/// Per-node lifecycle.
///
/// `Unstarted → Initialized → Started → Validated → [Transformed]`; `Stopped`
/// is reachable from any state and means every cached resolution result for
/// the node has been discarded so it can be restarted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeState {
    #[default]
    Unstarted,
    Initialized,
    Started,
    Validated,
    Transformed,
    Stopped,
}

impl NodeState {
    #[inline]
    pub fn is_started(self) -> bool {
        matches!(
            self,
            NodeState::Started | NodeState::Validated | NodeState::Transformed
        )
    }

    #[inline]
    pub fn is_validated(self) -> bool {
        matches!(self, NodeState::Validated | NodeState::Transformed)
    }
}

bitflags! {
    /// Declaration modifiers.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ModifierFlags: u16 {
        const STATIC = 1 << 0;
        const FINAL = 1 << 1;
        const ABSTRACT = 1 << 2;
        const PUBLIC = 1 << 3;
        const PROTECTED = 1 << 4;
        const PRIVATE = 1 << 5;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
}

/// Formal parameter of a method, constructor or lambda.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub ty: TypeSyntax,
    pub name: String,
}

/// Declared type variable with an optional upper bound.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamSyntax {
    pub name: String,
    #[serde(default)]
    pub bound: Option<TypeSyntax>,
}

/// Node payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum NodeData {
    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------
    Literal {
        value: LiteralValue,
    },
    /// Dotted identifier chain `a.b.c`, optionally a call `a.b.c(args)`.
    Identifier {
        names: Vec<String>,
        #[serde(default)]
        arguments: Option<NodeList>,
    },
    /// Root expression followed by field/method/array selectors: `e.f[i].m()`.
    Selector {
        expression: NodeIndex,
        selectors: NodeList,
    },
    /// `.name` or `.name(args)` inside a selector chain.
    VariableSelector {
        name: String,
        #[serde(default)]
        arguments: Option<NodeList>,
    },
    /// `[index]` inside a selector chain.
    ArraySelector {
        index: NodeIndex,
    },
    /// `this` or `Outer.this`.
    This {
        #[serde(default)]
        qualifier: Option<String>,
    },
    Binary {
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    },
    Unary {
        op: UnaryOp,
        operand: NodeIndex,
    },
    Assignment {
        op: AssignOp,
        target: NodeIndex,
        value: NodeIndex,
    },
    Conditional {
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    },
    Cast {
        ty: TypeSyntax,
        expression: NodeIndex,
    },
    InstanceOf {
        expression: NodeIndex,
        ty: TypeSyntax,
    },
    New {
        ty: TypeSyntax,
        arguments: NodeList,
    },
    NewArray {
        element: TypeSyntax,
        dimensions: NodeList,
        initializer: NodeIndex,
    },
    ArrayInitializer {
        elements: NodeList,
    },
    /// `(a, b) -> body`; the body is an expression or a block.
    Lambda {
        params: Vec<String>,
        body: NodeIndex,
    },
    Paren {
        expression: NodeIndex,
    },
    /// Evaluates `expressions` in order inside a scope declaring `temps`,
    /// yielding the last value. Only produced by lowering.
    Sequence {
        temps: Vec<String>,
        expressions: NodeList,
    },

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------
    Block {
        statements: NodeList,
    },
    VariableStatement {
        ty: TypeSyntax,
        declarations: NodeList,
    },
    VariableDeclaration {
        name: String,
        initializer: NodeIndex,
    },
    ExpressionStatement {
        expression: NodeIndex,
    },
    If {
        condition: NodeIndex,
        then_statement: NodeIndex,
        else_statement: NodeIndex,
    },
    While {
        condition: NodeIndex,
        body: NodeIndex,
    },
    DoWhile {
        body: NodeIndex,
        condition: NodeIndex,
    },
    For {
        initializer: NodeList,
        condition: NodeIndex,
        incrementor: NodeList,
        body: NodeIndex,
    },
    ForEach {
        ty: TypeSyntax,
        name: String,
        expression: NodeIndex,
        body: NodeIndex,
    },
    Labeled {
        label: String,
        statement: NodeIndex,
    },
    Break {
        #[serde(default)]
        label: Option<String>,
    },
    Continue {
        #[serde(default)]
        label: Option<String>,
    },
    Return {
        expression: NodeIndex,
    },
    Throw {
        expression: NodeIndex,
    },
    Try {
        block: NodeIndex,
        catches: NodeList,
        finally_block: NodeIndex,
    },
    CatchClause {
        types: Vec<TypeSyntax>,
        name: String,
        block: NodeIndex,
    },
    /// Switch body is a flat statement list with `SwitchLabel` entries
    /// interleaved, so fallthrough is plain sequential execution.
    Switch {
        expression: NodeIndex,
        statements: NodeList,
    },
    /// `case expr:`; `expression == NONE` is `default:`.
    SwitchLabel {
        expression: NodeIndex,
    },
    Empty,

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------
    SourceFile {
        types: NodeList,
    },
    ClassDeclaration {
        name: String,
        #[serde(default)]
        kind: ClassKind,
        #[serde(default)]
        modifiers: ModifierFlags,
        #[serde(default)]
        type_params: Vec<TypeParamSyntax>,
        #[serde(default)]
        extends: Option<TypeSyntax>,
        #[serde(default)]
        implements: Vec<TypeSyntax>,
        members: NodeList,
        /// Declared in a later layer as a modification of an existing type.
        #[serde(default)]
        modifies: bool,
    },
    FieldDeclaration {
        #[serde(default)]
        modifiers: ModifierFlags,
        ty: TypeSyntax,
        name: String,
        initializer: NodeIndex,
        #[serde(default)]
        binding: BindingDirection,
    },
    MethodDeclaration {
        #[serde(default)]
        modifiers: ModifierFlags,
        #[serde(default)]
        type_params: Vec<TypeParamSyntax>,
        name: String,
        params: Vec<Param>,
        return_type: TypeSyntax,
        body: NodeIndex,
    },
    ConstructorDeclaration {
        #[serde(default)]
        modifiers: ModifierFlags,
        params: Vec<Param>,
        body: NodeIndex,
    },
}

impl NodeData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeData::Literal { .. } => "Literal",
            NodeData::Identifier { .. } => "Identifier",
            NodeData::Selector { .. } => "Selector",
            NodeData::VariableSelector { .. } => "VariableSelector",
            NodeData::ArraySelector { .. } => "ArraySelector",
            NodeData::This { .. } => "This",
            NodeData::Binary { .. } => "Binary",
            NodeData::Unary { .. } => "Unary",
            NodeData::Assignment { .. } => "Assignment",
            NodeData::Conditional { .. } => "Conditional",
            NodeData::Cast { .. } => "Cast",
            NodeData::InstanceOf { .. } => "InstanceOf",
            NodeData::New { .. } => "New",
            NodeData::NewArray { .. } => "NewArray",
            NodeData::ArrayInitializer { .. } => "ArrayInitializer",
            NodeData::Lambda { .. } => "Lambda",
            NodeData::Paren { .. } => "Paren",
            NodeData::Sequence { .. } => "Sequence",
            NodeData::Block { .. } => "Block",
            NodeData::VariableStatement { .. } => "VariableStatement",
            NodeData::VariableDeclaration { .. } => "VariableDeclaration",
            NodeData::ExpressionStatement { .. } => "ExpressionStatement",
            NodeData::If { .. } => "If",
            NodeData::While { .. } => "While",
            NodeData::DoWhile { .. } => "DoWhile",
            NodeData::For { .. } => "For",
            NodeData::ForEach { .. } => "ForEach",
            NodeData::Labeled { .. } => "Labeled",
            NodeData::Break { .. } => "Break",
            NodeData::Continue { .. } => "Continue",
            NodeData::Return { .. } => "Return",
            NodeData::Throw { .. } => "Throw",
            NodeData::Try { .. } => "Try",
            NodeData::CatchClause { .. } => "CatchClause",
            NodeData::Switch { .. } => "Switch",
            NodeData::SwitchLabel { .. } => "SwitchLabel",
            NodeData::Empty => "Empty",
            NodeData::SourceFile { .. } => "SourceFile",
            NodeData::ClassDeclaration { .. } => "ClassDeclaration",
            NodeData::FieldDeclaration { .. } => "FieldDeclaration",
            NodeData::MethodDeclaration { .. } => "MethodDeclaration",
            NodeData::ConstructorDeclaration { .. } => "ConstructorDeclaration",
        }
    }

    /// Whether the node produces a value.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeData::Literal { .. }
                | NodeData::Identifier { .. }
                | NodeData::Selector { .. }
                | NodeData::This { .. }
                | NodeData::Binary { .. }
                | NodeData::Unary { .. }
                | NodeData::Assignment { .. }
                | NodeData::Conditional { .. }
                | NodeData::Cast { .. }
                | NodeData::InstanceOf { .. }
                | NodeData::New { .. }
                | NodeData::NewArray { .. }
                | NodeData::ArrayInitializer { .. }
                | NodeData::Lambda { .. }
                | NodeData::Paren { .. }
                | NodeData::Sequence { .. }
        )
    }

    /// Loops are the statements a `continue` may target.
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            NodeData::While { .. }
                | NodeData::DoWhile { .. }
                | NodeData::For { .. }
                | NodeData::ForEach { .. }
        )
    }

    /// Children in source order. `NONE` slots are skipped.
    pub fn children(&self) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut push = |idx: NodeIndex| {
            if idx.is_some() {
                out.push(idx);
            }
        };
        match self {
            NodeData::Literal { .. }
            | NodeData::This { .. }
            | NodeData::Break { .. }
            | NodeData::Continue { .. }
            | NodeData::Empty => {}
            NodeData::Identifier { arguments, .. }
            | NodeData::VariableSelector { arguments, .. } => {
                if let Some(args) = arguments {
                    args.iter().for_each(&mut push);
                }
            }
            NodeData::Selector {
                expression,
                selectors,
            } => {
                push(*expression);
                selectors.iter().for_each(&mut push);
            }
            NodeData::ArraySelector { index } => push(*index),
            NodeData::Binary { left, right, .. } => {
                push(*left);
                push(*right);
            }
            NodeData::Unary { operand, .. } => push(*operand),
            NodeData::Assignment { target, value, .. } => {
                push(*target);
                push(*value);
            }
            NodeData::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                push(*condition);
                push(*when_true);
                push(*when_false);
            }
            NodeData::Cast { expression, .. }
            | NodeData::InstanceOf { expression, .. }
            | NodeData::Paren { expression }
            | NodeData::ExpressionStatement { expression }
            | NodeData::Return { expression }
            | NodeData::Throw { expression }
            | NodeData::SwitchLabel { expression } => push(*expression),
            NodeData::New { arguments, .. } => arguments.iter().for_each(&mut push),
            NodeData::NewArray {
                dimensions,
                initializer,
                ..
            } => {
                dimensions.iter().for_each(&mut push);
                push(*initializer);
            }
            NodeData::ArrayInitializer { elements } => elements.iter().for_each(&mut push),
            NodeData::Lambda { body, .. } => push(*body),
            NodeData::Sequence { expressions, .. } => expressions.iter().for_each(&mut push),
            NodeData::Block { statements } => statements.iter().for_each(&mut push),
            NodeData::VariableStatement { declarations, .. } => {
                declarations.iter().for_each(&mut push)
            }
            NodeData::VariableDeclaration { initializer, .. } => push(*initializer),
            NodeData::If {
                condition,
                then_statement,
                else_statement,
            } => {
                push(*condition);
                push(*then_statement);
                push(*else_statement);
            }
            NodeData::While { condition, body } => {
                push(*condition);
                push(*body);
            }
            NodeData::DoWhile { body, condition } => {
                push(*body);
                push(*condition);
            }
            NodeData::For {
                initializer,
                condition,
                incrementor,
                body,
            } => {
                initializer.iter().for_each(&mut push);
                push(*condition);
                incrementor.iter().for_each(&mut push);
                push(*body);
            }
            NodeData::ForEach {
                expression, body, ..
            } => {
                push(*expression);
                push(*body);
            }
            NodeData::Labeled { statement, .. } => push(*statement),
            NodeData::Try {
                block,
                catches,
                finally_block,
            } => {
                push(*block);
                catches.iter().for_each(&mut push);
                push(*finally_block);
            }
            NodeData::CatchClause { block, .. } => push(*block),
            NodeData::Switch {
                expression,
                statements,
            } => {
                push(*expression);
                statements.iter().for_each(&mut push);
            }
            NodeData::SourceFile { types } => types.iter().for_each(&mut push),
            NodeData::ClassDeclaration { members, .. } => members.iter().for_each(&mut push),
            NodeData::FieldDeclaration { initializer, .. } => push(*initializer),
            NodeData::MethodDeclaration { body, .. }
            | NodeData::ConstructorDeclaration { body, .. } => push(*body),
        }
        out
    }

    /// Mutable access to every child slot (including `NONE` slots).
    pub fn child_slots_mut(&mut self) -> Vec<&mut NodeIndex> {
        fn list(list: &mut NodeList) -> impl Iterator<Item = &mut NodeIndex> {
            list.nodes.iter_mut()
        }
        match self {
            NodeData::Literal { .. }
            | NodeData::This { .. }
            | NodeData::Break { .. }
            | NodeData::Continue { .. }
            | NodeData::Empty => Vec::new(),
            NodeData::Identifier { arguments, .. }
            | NodeData::VariableSelector { arguments, .. } => match arguments {
                Some(args) => list(args).collect(),
                None => Vec::new(),
            },
            NodeData::Selector {
                expression,
                selectors,
            } => std::iter::once(expression).chain(list(selectors)).collect(),
            NodeData::ArraySelector { index } => vec![index],
            NodeData::Binary { left, right, .. } => vec![left, right],
            NodeData::Unary { operand, .. } => vec![operand],
            NodeData::Assignment { target, value, .. } => vec![target, value],
            NodeData::Conditional {
                condition,
                when_true,
                when_false,
            } => vec![condition, when_true, when_false],
            NodeData::Cast { expression, .. }
            | NodeData::InstanceOf { expression, .. }
            | NodeData::Paren { expression }
            | NodeData::ExpressionStatement { expression }
            | NodeData::Return { expression }
            | NodeData::Throw { expression }
            | NodeData::SwitchLabel { expression } => vec![expression],
            NodeData::New { arguments, .. } => list(arguments).collect(),
            NodeData::NewArray {
                dimensions,
                initializer,
                ..
            } => list(dimensions).chain(std::iter::once(initializer)).collect(),
            NodeData::ArrayInitializer { elements } => list(elements).collect(),
            NodeData::Lambda { body, .. } => vec![body],
            NodeData::Sequence { expressions, .. } => list(expressions).collect(),
            NodeData::Block { statements } => list(statements).collect(),
            NodeData::VariableStatement { declarations, .. } => list(declarations).collect(),
            NodeData::VariableDeclaration { initializer, .. } => vec![initializer],
            NodeData::If {
                condition,
                then_statement,
                else_statement,
            } => vec![condition, then_statement, else_statement],
            NodeData::While { condition, body } => vec![condition, body],
            NodeData::DoWhile { body, condition } => vec![body, condition],
            NodeData::For {
                initializer,
                condition,
                incrementor,
                body,
            } => list(initializer)
                .chain(std::iter::once(condition))
                .chain(list(incrementor))
                .chain(std::iter::once(body))
                .collect(),
            NodeData::ForEach {
                expression, body, ..
            } => vec![expression, body],
            NodeData::Labeled { statement, .. } => vec![statement],
            NodeData::Try {
                block,
                catches,
                finally_block,
            } => std::iter::once(block)
                .chain(list(catches))
                .chain(std::iter::once(finally_block))
                .collect(),
            NodeData::CatchClause { block, .. } => vec![block],
            NodeData::Switch {
                expression,
                statements,
            } => std::iter::once(expression).chain(list(statements)).collect(),
            NodeData::SourceFile { types } => list(types).collect(),
            NodeData::ClassDeclaration { members, .. } => list(members).collect(),
            NodeData::FieldDeclaration { initializer, .. } => vec![initializer],
            NodeData::MethodDeclaration { body, .. }
            | NodeData::ConstructorDeclaration { body, .. } => vec![body],
        }
    }
}

/// A node in the arena: payload plus the attributes every node carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub data: NodeData,
    #[serde(default)]
    pub range: TextRange,
    /// Weak back-reference used for navigation and in-place replacement.
    #[serde(default)]
    pub parent: NodeIndex,
    #[serde(default, skip_serializing)]
    pub state: NodeState,
    /// Binding direction when the expression is the right-hand side of a
    /// data-binding (`x := expr`).
    #[serde(default)]
    pub binding: BindingDirection,
}

impl Node {
    pub fn new(data: NodeData, range: TextRange) -> Self {
        Node {
            data,
            range,
            parent: NodeIndex::NONE,
            state: NodeState::Unstarted,
            binding: BindingDirection::None,
        }
    }

    #[inline]
    pub fn kind_name(&self) -> &'static str {
        self.data.kind_name()
    }

    #[inline]
    pub fn is_expression(&self) -> bool {
        self.data.is_expression()
    }
}
