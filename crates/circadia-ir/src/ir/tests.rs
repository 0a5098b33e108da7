//! Tests for the IR substrate: arenas, scope ancestry, mutation primitives.

use super::*;

#[test]
fn model_body_has_storage_handle() {
    let mut module = Module::new();
    let model = module.add_model("boiler");
    let body = module.model(model).body;

    let params = &module.scope(body).params;
    assert_eq!(params.len(), 1);
    assert_eq!(module.value(params[0]).ty, Type::Storage);
    assert_eq!(module.state_handle(model), params[0]);
}

#[test]
fn values_know_their_producer() {
    let mut module = Module::new();
    let model = module.add_model("m");
    let body = module.model(model).body;

    let c = module.const_num(body, 1.0);
    match module.value(c).def {
        ValueDef::Node(node) => assert!(matches!(
            module.node(node).kind,
            NodeKind::Const {
                value: ConstValue::Num(v)
            } if v == 1.0
        )),
        ValueDef::Param { .. } => panic!("constant defined as parameter"),
    }

    let handle = module.state_handle(model);
    assert!(matches!(
        module.value(handle).def,
        ValueDef::Param { scope, index: 0 } if scope == body
    ));
}

#[test]
fn scope_ancestry_follows_node_ownership() {
    let mut module = Module::new();
    let model = module.add_model("m");
    let body = module.model(model).body;

    let cond = module.const_bool(body, true);
    let (_, outer_scope) = module.if_node(body, cond);
    let (_, inner_scope) = module.if_node(outer_scope, cond);

    assert!(module.is_ancestor(body, body));
    assert!(module.is_ancestor(body, outer_scope));
    assert!(module.is_ancestor(body, inner_scope));
    assert!(module.is_ancestor(outer_scope, inner_scope));
    assert!(!module.is_ancestor(inner_scope, outer_scope));
    assert!(!module.is_ancestor(outer_scope, body));
}

#[test]
fn users_query_spans_nested_scopes() {
    let mut module = Module::new();
    let model = module.add_model("m");
    let body = module.model(model).body;
    let handle = module.state_handle(model);

    let c = module.const_num(body, 2.0);
    module.state_write(body, "a", handle, c);
    let cond = module.const_bool(body, true);
    let (_, then_scope) = module.if_node(body, cond);
    module.state_write(then_scope, "b", handle, c);

    let producer = match module.value(c).def {
        ValueDef::Node(node) => node,
        ValueDef::Param { .. } => unreachable!(),
    };
    assert_eq!(module.users(c).len(), 2);
    assert_eq!(module.node_users(producer).len(), 2);
}

#[test]
fn detach_keeps_node_alive_and_erase_clears_uses() {
    let mut module = Module::new();
    let model = module.add_model("m");
    let body = module.model(model).body;
    let handle = module.state_handle(model);

    let c = module.const_num(body, 1.0);
    let write = module.state_write(body, "a", handle, c);

    module.detach_node(write);
    assert!(module.node(write).parent.is_none());
    assert_eq!(module.scope(body).nodes.len(), 1);
    // Detached nodes still count as users.
    assert_eq!(module.users(c).len(), 1);

    module.erase_node(write);
    assert!(module.users(c).is_empty());
}

#[test]
fn relocating_a_node_between_scopes() {
    let mut module = Module::new();
    let model = module.add_model("m");
    let body = module.model(model).body;

    let c = module.const_num(body, 5.0);
    let cond = module.const_bool(body, false);
    let (_, then_scope) = module.if_node(body, cond);

    let producer = match module.value(c).def {
        ValueDef::Node(node) => node,
        ValueDef::Param { .. } => unreachable!(),
    };
    module.detach_node(producer);
    module.insert_node(then_scope, 0, producer);

    assert_eq!(module.node(producer).parent, Some(then_scope));
    assert_eq!(module.scope(then_scope).nodes[0], producer);
    assert_eq!(module.defining_scope(c), Some(then_scope));
}

#[test]
fn clone_without_scope_gets_fresh_results() {
    let mut module = Module::new();
    let model = module.add_model("m");
    let body = module.model(model).body;

    let c = module.const_num(body, 7.0);
    let producer = match module.value(c).def {
        ValueDef::Node(node) => node,
        ValueDef::Param { .. } => unreachable!(),
    };

    let duplicate = module.clone_node_without_scope(producer);
    assert_eq!(module.node(duplicate).kind, module.node(producer).kind);
    assert!(module.node(duplicate).scope.is_none());
    assert!(module.node(duplicate).parent.is_none());

    let original_result = module.node(producer).results[0];
    let new_result = module.node(duplicate).results[0];
    assert_ne!(original_result, new_result);
    assert_eq!(module.value(new_result).ty, Type::Num);
    assert_eq!(module.value(new_result).def, ValueDef::Node(duplicate));
}

#[test]
fn preorder_visits_nested_scopes_in_order() {
    let mut module = Module::new();
    let model = module.add_model("m");
    let body = module.model(model).body;
    let handle = module.state_handle(model);

    let cond = module.const_bool(body, true);
    let (if_id, then_scope) = module.if_node(body, cond);
    let inner = module.state_read(then_scope, "x", handle);
    let inner_node = match module.value(inner).def {
        ValueDef::Node(node) => node,
        ValueDef::Param { .. } => unreachable!(),
    };
    let after = module.state_write(body, "y", handle, inner);

    let order = module.preorder_nodes(body);
    let pos = |n: NodeId| order.iter().position(|&x| x == n).unwrap();
    assert!(pos(if_id) < pos(inner_node));
    assert!(pos(inner_node) < pos(after));
}

#[test]
fn print_model_shows_structure() {
    let mut module = Module::new();
    let model = module.add_model("boiler");
    let body = module.model(model).body;
    let handle = module.state_handle(model);

    let gate = module.const_bool(body, true);
    let (_, region) = module.update_region(body, gate);
    let v = module.state_read(region, "temp", handle);
    module.state_write(region, "temp", handle, v);

    let printed = module.print_model(model);
    assert!(printed.contains("model boiler(%0: storage)"));
    assert!(printed.contains("const true"));
    assert!(printed.contains("clock.update"));
    assert!(printed.contains("state.read \"temp\""));
}
