//! Module arena and graph mutation primitives.
//!
//! The module owns every node, value and scope in a translation unit,
//! together with its models and procedures. Mutations are expressed as
//! explicit detach/insert operations on scope node lists; arena slots are
//! never reused, so ids held by callers stay valid (an erased node's slot
//! simply goes dead).

use super::types::{
    BinOp, ClockKind, ConstValue, Model, ModelId, NodeData, NodeId, NodeKind, ProcId, Procedure,
    ScopeData, ScopeId, ScopeOwner, Type, ValueData, ValueDef, ValueId,
};

/// A translation unit: arenas plus the models and procedures built on them.
#[derive(Debug, Default)]
pub struct Module {
    nodes: Vec<NodeData>,
    values: Vec<ValueData>,
    scopes: Vec<ScopeData>,
    models: Vec<Model>,
    procs: Vec<Procedure>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    // === Accessors ===

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0 as usize]
    }

    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.0 as usize]
    }

    pub fn scope(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id.0 as usize]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut ScopeData {
        &mut self.scopes[id.0 as usize]
    }

    pub fn model(&self, id: ModelId) -> &Model {
        &self.models[id.0 as usize]
    }

    pub fn model_mut(&mut self, id: ModelId) -> &mut Model {
        &mut self.models[id.0 as usize]
    }

    pub fn model_ids(&self) -> Vec<ModelId> {
        (0..self.models.len() as u32).map(ModelId).collect()
    }

    pub fn proc(&self, id: ProcId) -> &Procedure {
        &self.procs[id.0 as usize]
    }

    pub fn procs(&self) -> &[Procedure] {
        &self.procs
    }

    pub fn proc_by_name(&self, name: &str) -> Option<ProcId> {
        self.procs
            .iter()
            .position(|p| p.name == name)
            .map(|i| ProcId(i as u32))
    }

    /// The model's state handle: the sole parameter of its body scope.
    pub fn state_handle(&self, model: ModelId) -> ValueId {
        self.scope(self.model(model).body).params[0]
    }

    /// Nested scope owned by a node. Panics if the node kind nests none.
    pub fn nested_scope(&self, node: NodeId) -> ScopeId {
        self.node(node)
            .scope
            .expect("node does not own a nested scope")
    }

    // === Construction ===

    fn new_value(&mut self, ty: Type, def: ValueDef) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueData { ty, def });
        id
    }

    fn new_scope(&mut self, owner: ScopeOwner) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeData {
            owner,
            params: Vec::new(),
            nodes: Vec::new(),
        });
        id
    }

    /// Create a model with an empty body scope and its state handle parameter.
    pub fn add_model(&mut self, name: impl Into<String>) -> ModelId {
        let id = ModelId(self.models.len() as u32);
        let body = self.new_scope(ScopeOwner::Model(id));
        self.models.push(Model {
            name: name.into(),
            body,
            initializer: None,
        });
        self.add_scope_param(body, Type::Storage);
        id
    }

    /// Register a procedure whose body is an existing scope. The scope's
    /// ownership transfers to the new procedure.
    pub fn add_proc(&mut self, name: impl Into<String>, body: ScopeId) -> ProcId {
        let id = ProcId(self.procs.len() as u32);
        self.scope_mut(body).owner = ScopeOwner::Proc(id);
        self.procs.push(Procedure {
            name: name.into(),
            body,
        });
        id
    }

    /// Create a procedure with a fresh, empty body scope.
    pub fn add_empty_proc(&mut self, name: impl Into<String>, params: Vec<Type>) -> ProcId {
        let id = ProcId(self.procs.len() as u32);
        let body = self.new_scope(ScopeOwner::Proc(id));
        self.procs.push(Procedure {
            name: name.into(),
            body,
        });
        for ty in params {
            self.add_scope_param(body, ty);
        }
        id
    }

    /// Create a detached node with fresh result values.
    pub fn new_node(
        &mut self,
        kind: NodeKind,
        operands: Vec<ValueId>,
        result_tys: Vec<Type>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let results = result_tys
            .into_iter()
            .map(|ty| self.new_value(ty, ValueDef::Node(id)))
            .collect();
        self.nodes.push(NodeData {
            kind,
            operands,
            results,
            scope: None,
            parent: None,
        });
        id
    }

    /// Create the nested scope owned by a node.
    pub fn new_nested_scope(&mut self, node: NodeId) -> ScopeId {
        let scope = self.new_scope(ScopeOwner::Node(node));
        self.node_mut(node).scope = Some(scope);
        scope
    }

    /// Append a new parameter value to a scope.
    pub fn add_scope_param(&mut self, scope: ScopeId, ty: Type) -> ValueId {
        let index = self.scope(scope).params.len();
        let value = self.new_value(ty, ValueDef::Param { scope, index });
        self.scope_mut(scope).params.push(value);
        value
    }

    // === List mutation ===

    /// Append a detached node to the end of a scope's node list.
    pub fn push_node(&mut self, scope: ScopeId, node: NodeId) {
        debug_assert!(self.node(node).parent.is_none(), "node already attached");
        self.scope_mut(scope).nodes.push(node);
        self.node_mut(node).parent = Some(scope);
    }

    /// Insert a detached node into a scope's node list at `index`.
    pub fn insert_node(&mut self, scope: ScopeId, index: usize, node: NodeId) {
        debug_assert!(self.node(node).parent.is_none(), "node already attached");
        self.scope_mut(scope).nodes.insert(index, node);
        self.node_mut(node).parent = Some(scope);
    }

    /// Position of a node within its parent scope's node list.
    pub fn position(&self, scope: ScopeId, node: NodeId) -> usize {
        self.scope(scope)
            .nodes
            .iter()
            .position(|&n| n == node)
            .expect("node not in scope")
    }

    /// Remove a node from its parent scope's node list, keeping it alive.
    pub fn detach_node(&mut self, node: NodeId) {
        if let Some(parent) = self.node(node).parent {
            self.scope_mut(parent).nodes.retain(|&n| n != node);
            self.node_mut(node).parent = None;
        }
    }

    /// Detach a node and kill its arena slot. Operand references are cleared
    /// so the dead node no longer counts as a user of anything. The caller is
    /// responsible for any nested scope still attached to the node.
    pub fn erase_node(&mut self, node: NodeId) {
        self.detach_node(node);
        self.node_mut(node).operands.clear();
    }

    /// Structural duplicate of a node: same kind and operands, fresh result
    /// values, no nested scope.
    pub fn clone_node_without_scope(&mut self, node: NodeId) -> NodeId {
        let kind = self.node(node).kind.clone();
        let operands = self.node(node).operands.clone();
        let result_tys: Vec<Type> = self
            .node(node)
            .results
            .iter()
            .map(|&r| self.value(r).ty)
            .collect();
        self.new_node(kind, operands, result_tys)
    }

    // === Convenience constructors (append into a scope) ===

    pub fn const_num(&mut self, scope: ScopeId, value: f64) -> ValueId {
        self.append_const(scope, ConstValue::Num(value))
    }

    pub fn const_bool(&mut self, scope: ScopeId, value: bool) -> ValueId {
        self.append_const(scope, ConstValue::Bool(value))
    }

    fn append_const(&mut self, scope: ScopeId, value: ConstValue) -> ValueId {
        let ty = value.ty();
        let node = self.new_node(NodeKind::Const { value }, vec![], vec![ty]);
        self.push_node(scope, node);
        self.node(node).results[0]
    }

    pub fn binary(&mut self, scope: ScopeId, op: BinOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        let node = self.new_node(
            NodeKind::Binary { op },
            vec![lhs, rhs],
            vec![op.result_ty()],
        );
        self.push_node(scope, node);
        self.node(node).results[0]
    }

    pub fn state_read(
        &mut self,
        scope: ScopeId,
        slot: impl Into<String>,
        handle: ValueId,
    ) -> ValueId {
        let node = self.new_node(
            NodeKind::StateRead { slot: slot.into() },
            vec![handle],
            vec![Type::Num],
        );
        self.push_node(scope, node);
        self.node(node).results[0]
    }

    pub fn state_write(
        &mut self,
        scope: ScopeId,
        slot: impl Into<String>,
        handle: ValueId,
        value: ValueId,
    ) -> NodeId {
        let node = self.new_node(
            NodeKind::StateWrite { slot: slot.into() },
            vec![handle, value],
            vec![],
        );
        self.push_node(scope, node);
        node
    }

    pub fn call(
        &mut self,
        scope: ScopeId,
        callee: impl Into<String>,
        args: Vec<ValueId>,
    ) -> NodeId {
        let node = self.new_node(
            NodeKind::Call {
                callee: callee.into(),
            },
            args,
            vec![],
        );
        self.push_node(scope, node);
        node
    }

    pub fn if_node(&mut self, scope: ScopeId, cond: ValueId) -> (NodeId, ScopeId) {
        let node = self.new_node(NodeKind::If, vec![cond], vec![]);
        let then_scope = self.new_nested_scope(node);
        self.push_node(scope, node);
        (node, then_scope)
    }

    pub fn return_node(&mut self, scope: ScopeId) -> NodeId {
        let node = self.new_node(NodeKind::Return, vec![], vec![]);
        self.push_node(scope, node);
        node
    }

    /// Append an update clock region gated by `gate`.
    pub fn update_region(&mut self, scope: ScopeId, gate: ValueId) -> (NodeId, ScopeId) {
        self.append_region(scope, ClockKind::Update, vec![gate])
    }

    /// Append a one-shot init clock region.
    pub fn init_region(&mut self, scope: ScopeId) -> (NodeId, ScopeId) {
        self.append_region(scope, ClockKind::OneShotInit, vec![])
    }

    /// Append a passthrough clock region.
    pub fn passthrough_region(&mut self, scope: ScopeId) -> (NodeId, ScopeId) {
        self.append_region(scope, ClockKind::Passthrough, vec![])
    }

    fn append_region(
        &mut self,
        scope: ScopeId,
        kind: ClockKind,
        operands: Vec<ValueId>,
    ) -> (NodeId, ScopeId) {
        let node = self.new_node(NodeKind::Clock(kind), operands, vec![]);
        let region_scope = self.new_nested_scope(node);
        self.push_node(scope, node);
        (node, region_scope)
    }

    // === Queries ===

    /// Scope in which a value is defined: the parameter's scope, or the
    /// producing node's parent scope (`None` while the producer is detached).
    pub fn defining_scope(&self, value: ValueId) -> Option<ScopeId> {
        match self.value(value).def {
            ValueDef::Param { scope, .. } => Some(scope),
            ValueDef::Node(node) => self.node(node).parent,
        }
    }

    /// Whether `ancestor` is `scope` itself or encloses it through the
    /// node-ownership chain.
    pub fn is_ancestor(&self, ancestor: ScopeId, scope: ScopeId) -> bool {
        let mut current = scope;
        loop {
            if current == ancestor {
                return true;
            }
            match self.scope(current).owner {
                ScopeOwner::Node(node) => match self.node(node).parent {
                    Some(parent) => current = parent,
                    None => return false,
                },
                ScopeOwner::Model(_) | ScopeOwner::Proc(_) => return false,
            }
        }
    }

    /// All nodes anywhere in the module that use `value` as an operand.
    pub fn users(&self, value: ValueId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.operands.contains(&value))
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    /// All nodes anywhere in the module that use any result of `node`.
    pub fn node_users(&self, node: NodeId) -> Vec<NodeId> {
        let results = &self.node(node).results;
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.operands.iter().any(|o| results.contains(o)))
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    /// Nodes of a scope and all nested scopes in pre-order.
    pub fn preorder_nodes(&self, scope: ScopeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_preorder(scope, &mut out);
        out
    }

    fn collect_preorder(&self, scope: ScopeId, out: &mut Vec<NodeId>) {
        for &node in &self.scope(scope).nodes {
            out.push(node);
            if let Some(nested) = self.node(node).scope {
                self.collect_preorder(nested, out);
            }
        }
    }

    // === Printing ===

    /// Pretty-print a model body.
    pub fn print_model(&self, id: ModelId) -> String {
        let model = self.model(id);
        let mut out = format!("model {}({})", model.name, self.params_str(model.body));
        if let Some(init) = &model.initializer {
            out.push_str(&format!(" initializer(@{})", init));
        }
        out.push_str(" {\n");
        self.print_scope_into(&mut out, model.body, 1);
        out.push_str("}\n");
        out
    }

    /// Pretty-print a procedure body.
    pub fn print_proc(&self, id: ProcId) -> String {
        let proc = self.proc(id);
        let mut out = format!("proc {}({}) {{\n", proc.name, self.params_str(proc.body));
        self.print_scope_into(&mut out, proc.body, 1);
        out.push_str("}\n");
        out
    }

    fn params_str(&self, scope: ScopeId) -> String {
        self.scope(scope)
            .params
            .iter()
            .map(|&p| format!("{}: {}", p, self.value(p).ty))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn print_scope_into(&self, out: &mut String, scope: ScopeId, depth: usize) {
        let indent = "  ".repeat(depth);
        for &node in &self.scope(scope).nodes {
            let data = self.node(node);
            out.push_str(&indent);
            if !data.results.is_empty() {
                let results = data
                    .results
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&results);
                out.push_str(" = ");
            }
            out.push_str(data.kind.mnemonic());
            match &data.kind {
                NodeKind::Const { value } => out.push_str(&format!(" {}", value)),
                NodeKind::Binary { op } => out.push_str(&format!(" {:?}", op).to_lowercase()),
                NodeKind::StateRead { slot } | NodeKind::StateWrite { slot } => {
                    out.push_str(&format!(" \"{}\"", slot))
                }
                NodeKind::Call { callee } => out.push_str(&format!(" @{}", callee)),
                _ => {}
            }
            if !data.operands.is_empty() {
                let operands = data
                    .operands
                    .iter()
                    .map(|o| o.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&format!(" ({})", operands));
            }
            if let Some(nested) = data.scope {
                let params = self.params_str(nested);
                if params.is_empty() {
                    out.push_str(" {\n");
                } else {
                    out.push_str(&format!(" |{}| {{\n", params));
                }
                self.print_scope_into(out, nested, depth + 1);
                out.push_str(&indent);
                out.push('}');
            }
            out.push('\n');
        }
    }
}
