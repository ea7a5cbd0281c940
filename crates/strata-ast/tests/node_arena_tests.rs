use super::*;
use crate::factory::ClassSpec;
use crate::node::ModifierFlags;
use crate::ops::{BinaryOp, BindingDirection, UnaryOp};
use crate::syntax::TypeSyntax;

fn int_ty() -> TypeSyntax {
    TypeSyntax::named("int")
}

#[test]
fn add_links_children_to_parent() {
    let mut arena = NodeArena::new();
    let left = arena.int(1);
    let right = arena.int(2);
    let sum = arena.binary(BinaryOp::Add, left, right);
    assert_eq!(arena.parent_of(left), sum);
    assert_eq!(arena.parent_of(right), sum);
    assert_eq!(arena.children(sum), vec![left, right]);
    assert!(arena.parent_of(sum).is_none());
}

#[test]
fn optional_children_are_skipped() {
    let mut arena = NodeArena::new();
    let cond = arena.boolean(true);
    let then = arena.empty();
    let stmt = arena.if_stmt(cond, then, NodeIndex::NONE);
    assert_eq!(arena.children(stmt), vec![cond, then]);
}

#[test]
fn replace_child_updates_slot_and_back_link() {
    let mut arena = NodeArena::new();
    let operand = arena.ident("x");
    let inc = arena.unary(UnaryOp::PostIncrement, operand);
    let stmt = arena.expr_stmt(inc);

    let replacement = arena.int(42);
    assert!(arena.replace_child(stmt, inc, replacement));
    assert_eq!(arena.children(stmt), vec![replacement]);
    assert_eq!(arena.parent_of(replacement), stmt);

    let unrelated = arena.int(7);
    assert!(!arena.replace_child(stmt, unrelated, replacement));
}

#[test]
fn replace_in_parent_finds_the_holder() {
    let mut arena = NodeArena::new();
    let a = arena.int(1);
    let b = arena.int(2);
    let sum = arena.binary(BinaryOp::Add, a, b);
    let c = arena.int(3);
    assert!(arena.replace_in_parent(b, c));
    assert_eq!(arena.children(sum), vec![a, c]);
    let detached = arena.int(9);
    assert!(!arena.replace_in_parent(detached, c));
}

#[test]
fn descendants_are_pre_order() {
    let mut arena = NodeArena::new();
    let a = arena.ident("a");
    let b = arena.ident("b");
    let sum = arena.binary(BinaryOp::Add, a, b);
    let stmt = arena.expr_stmt(sum);
    let block = arena.block(vec![stmt]);
    assert_eq!(arena.descendants(block), vec![block, stmt, sum, a, b]);
}

#[test]
fn find_ancestor_walks_parent_links() {
    let mut arena = NodeArena::new();
    let brk = arena.break_stmt(None);
    let body = arena.block(vec![brk]);
    let cond = arena.boolean(true);
    let lp = arena.while_stmt(cond, body);
    let outer = arena.block(vec![lp]);
    assert_eq!(arena.find_ancestor(brk, |d| d.is_loop()), Some(lp));
    assert_eq!(
        arena.find_ancestor(brk, |d| matches!(d, NodeData::Block { .. })),
        Some(body)
    );
    assert_eq!(arena.find_ancestor(outer, |d| d.is_loop()), None);
}

#[test]
fn clone_subtree_is_deep_and_detached() {
    let mut arena = NodeArena::new();
    let recv = arena.call("getObj", Vec::new());
    let field = arena.field_sel("counter");
    let sel = arena.select(recv, vec![field]);
    let copy = arena.clone_subtree(sel);
    assert_ne!(copy, sel);
    assert!(arena.parent_of(copy).is_none());
    let copied_children = arena.children(copy);
    assert_eq!(copied_children.len(), 2);
    assert_ne!(copied_children[0], recv);
    assert_eq!(arena.data(copied_children[0]), arena.data(recv));
    assert_eq!(arena.parent_of(copied_children[1]), copy);
}

#[test]
fn bound_field_marks_initializer() {
    let mut arena = NodeArena::new();
    let init = arena.ident("other");
    let field = arena.bound_field(
        ModifierFlags::empty(),
        int_ty(),
        "x",
        init,
        BindingDirection::Forward,
    );
    assert_eq!(arena.get(init).map(|n| n.binding), Some(BindingDirection::Forward));
    let class = arena.class_decl(ClassSpec::class("A"), vec![field]);
    assert_eq!(arena.parent_of(field), class);
}

#[test]
fn state_defaults_to_unstarted() {
    let mut arena = NodeArena::new();
    let n = arena.int(1);
    assert_eq!(arena.state(n), NodeState::Unstarted);
    arena.set_state(n, NodeState::Validated);
    assert!(arena.state(n).is_validated());
    assert!(arena.state(n).is_started());
    assert_eq!(arena.state(NodeIndex::NONE), NodeState::Unstarted);
}

#[test]
fn json_round_trip_relinks_parents() {
    let mut arena = NodeArena::new();
    let x = arena.ident("x");
    let one = arena.int(1);
    let decl = arena.var(int_ty(), "y", one);
    let stmt = arena.expr_stmt(x);
    let block = arena.block(vec![decl, stmt]);

    let json = serde_json::to_string(&arena).expect("serialize");
    let mut back: NodeArena = serde_json::from_str(&json).expect("deserialize");
    for node in &mut back.nodes {
        node.parent = NodeIndex::NONE;
    }
    back.link_parents();
    assert_eq!(back.len(), arena.len());
    assert_eq!(back.parent_of(stmt), block);
    assert_eq!(back.parent_of(x), stmt);
    assert_eq!(back.kind_name(decl), "VariableStatement");
}

#[test]
fn class_declarations_round_trip_with_their_kind() {
    let mut arena = NodeArena::new();
    let body = arena.block(vec![]);
    let run = arena.method(ModifierFlags::empty(), "run", vec![], TypeSyntax::named("void"), body);
    let runnable = arena.class_decl(ClassSpec::interface("Task"), vec![run]);
    let count = arena.field(ModifierFlags::STATIC, int_ty(), "count", NodeIndex::NONE);
    let job = arena.class_decl(
        ClassSpec::class("Job").implements(TypeSyntax::named("Task")),
        vec![count],
    );
    let root = arena.source_file(vec![runnable, job]);

    let json = serde_json::to_string(&arena).expect("serialize");
    assert!(json.contains(r#""node":"ClassDeclaration""#), "{json}");
    assert!(json.contains(r#""kind":"Interface""#), "{json}");

    let back: NodeArena = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.len(), arena.len());
    for idx in [root, runnable, job, count, run] {
        assert_eq!(back.data(idx), arena.data(idx));
    }
    assert_eq!(back.kind_name(job), "ClassDeclaration");
}
