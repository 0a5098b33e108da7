//! Data isolation of a clock region.
//!
//! Rewrites every operand reference inside a region scope so that, after the
//! walk, no node in the scope references anything defined outside it except
//! through the region's own handle parameter. External constant-like
//! producers are moved into the scope when all their users live there, and
//! duplicated otherwise.

use std::collections::{HashMap, VecDeque};

use crate::ir::{Module, NodeId, ValueDef, ValueId};

use super::{OutlineError, OutlineStats};

/// Rewrite all operands inside `region`'s scope using the
/// `(outer, inner)` handle substitution pair.
///
/// Aborts at the first illegal operand. No partial state is unwound; the
/// translation unit is discarded on failure.
pub(super) fn isolate_region(
    module: &mut Module,
    region: NodeId,
    outer: ValueId,
    inner: ValueId,
    stats: &mut OutlineStats,
) -> Result<(), OutlineError> {
    let scope = module.nested_scope(region);
    // Replacement values for externals already brought inside, keyed by the
    // original value. Local to this invocation.
    let mut replaced: HashMap<ValueId, ValueId> = HashMap::new();
    // Nodes moved or duplicated into the scope re-enter the worklist so
    // their own operands are resolved as well.
    let mut worklist: VecDeque<NodeId> = module.preorder_nodes(scope).into();

    while let Some(node) = worklist.pop_front() {
        for index in 0..module.node(node).operands.len() {
            let operand = module.node(node).operands[index];

            // The handle substitution is the one parameter reference allowed
            // through the boundary.
            if operand == outer {
                module.node_mut(node).operands[index] = inner;
                continue;
            }

            let producer = match module.value(operand).def {
                ValueDef::Param { scope: def_scope, .. } => {
                    if module.is_ancestor(scope, def_scope) {
                        continue;
                    }
                    return Err(OutlineError::ExternalParameter {
                        node,
                        value: operand,
                        region,
                    });
                }
                ValueDef::Node(producer) => producer,
            };

            // Internal dependencies are legal.
            if module
                .node(producer)
                .parent
                .is_some_and(|p| module.is_ancestor(scope, p))
            {
                continue;
            }

            if let Some(&replacement) = replaced.get(&operand) {
                module.node_mut(node).operands[index] = replacement;
                continue;
            }

            if !module.node(producer).kind.is_constant_like() {
                return Err(OutlineError::ExternalValue {
                    node,
                    value: operand,
                    producer,
                    region,
                });
            }

            // Move the producer in when the region owns every one of its
            // users; otherwise duplicate it at the front of the scope.
            let all_users_inside = module.node_users(producer).into_iter().all(|user| {
                module
                    .node(user)
                    .parent
                    .is_some_and(|p| module.is_ancestor(scope, p))
            });
            if all_users_inside {
                module.detach_node(producer);
                module.insert_node(scope, 0, producer);
                stats.nodes_moved += 1;
                worklist.push_back(producer);
            } else {
                let duplicate = module.clone_node_without_scope(producer);
                module.insert_node(scope, 0, duplicate);
                stats.nodes_copied += 1;
                let originals = module.node(producer).results.clone();
                let fresh = module.node(duplicate).results.clone();
                for (original, new) in originals.into_iter().zip(fresh) {
                    replaced.insert(original, new);
                }
                module.node_mut(node).operands[index] = replaced[&operand];
                worklist.push_back(duplicate);
            }
        }
    }
    Ok(())
}
