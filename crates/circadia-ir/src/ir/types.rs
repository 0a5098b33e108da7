//! IR type definitions.
//!
//! Defines the core id, node, value and scope types for the simulation
//! model graph IR.

use std::fmt;

/// Node identifier.
///
/// Indexes the node arena of a [`Module`](super::Module). Ids are stable for
/// the lifetime of the module and never reused, so they can be carried in
/// errors and diagnostics after the node itself has been erased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Value identifier.
///
/// Each value is produced exactly once, either by a node or by a scope's
/// parameter list, and may be used by any number of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Scope identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope{}", self.0)
    }
}

/// Model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(pub u32);

/// Procedure identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcId(pub u32);

/// Value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    /// Opaque handle to a model's mutable runtime storage.
    Storage,
    Bool,
    Num,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Storage => write!(f, "storage"),
            Type::Bool => write!(f, "bool"),
            Type::Num => write!(f, "num"),
        }
    }
}

/// Constant payload of a [`NodeKind::Const`] node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Num(f64),
    Bool(bool),
}

impl ConstValue {
    pub fn ty(&self) -> Type {
        match self {
            ConstValue::Num(_) => Type::Num,
            ConstValue::Bool(_) => Type::Bool,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Num(v) => write!(f, "{}", v),
            ConstValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Binary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Gt,
}

impl BinOp {
    /// Result type of the operation.
    pub fn result_ty(&self) -> Type {
        match self {
            BinOp::Add | BinOp::Sub | BinOp::Mul => Type::Num,
            BinOp::Gt => Type::Bool,
        }
    }
}

/// Kind of a clock region.
///
/// Closed set of region kinds; every dispatch on a clock region matches
/// exhaustively over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Gated by a boolean condition, runs when the gate is true.
    /// May appear any number of times per model.
    Update,
    /// Runs once at model initialization. At most one per model.
    OneShotInit,
    /// Runs unconditionally every step. At most one per model.
    Passthrough,
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockKind::Update => write!(f, "update"),
            ClockKind::OneShotInit => write!(f, "init"),
            ClockKind::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// Node operation.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Constant value. The only constant-like kind: pure, takes no operands,
    /// safe to duplicate across scope boundaries.
    Const { value: ConstValue },

    /// Binary arithmetic or comparison on two operands.
    Binary { op: BinOp },

    /// Read a storage slot. Operands: `[handle]`.
    StateRead { slot: String },

    /// Write a storage slot. Operands: `[handle, value]`.
    StateWrite { slot: String },

    /// Call a procedure by name. Operands are the call arguments.
    Call { callee: String },

    /// Conditional. Operand: `[cond]`; owns the then-scope.
    If,

    /// Scope terminator. Procedures produce no results, so it carries none.
    Return,

    /// Clock region. Owns the region scope. `Update` regions carry the
    /// gating condition as their single operand.
    Clock(ClockKind),
}

impl NodeKind {
    /// Whether this node is constant-like: pure, operand-free, and safe to
    /// duplicate across a scope boundary.
    pub fn is_constant_like(&self) -> bool {
        matches!(self, NodeKind::Const { .. })
    }

    /// Short mnemonic used in printing and diagnostics.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            NodeKind::Const { .. } => "const",
            NodeKind::Binary { .. } => "binary",
            NodeKind::StateRead { .. } => "state.read",
            NodeKind::StateWrite { .. } => "state.write",
            NodeKind::Call { .. } => "call",
            NodeKind::If => "if",
            NodeKind::Return => "return",
            NodeKind::Clock(ClockKind::Update) => "clock.update",
            NodeKind::Clock(ClockKind::OneShotInit) => "clock.init",
            NodeKind::Clock(ClockKind::Passthrough) => "clock.passthrough",
        }
    }
}

/// A node in the graph.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Operation performed by this node.
    pub kind: NodeKind,
    /// Values this node consumes, in operand order.
    pub operands: Vec<ValueId>,
    /// Values this node produces.
    pub results: Vec<ValueId>,
    /// Nested scope owned by this node, for kinds that nest one.
    pub scope: Option<ScopeId>,
    /// Scope whose node list currently holds this node. `None` while the
    /// node is detached or after it has been erased.
    pub parent: Option<ScopeId>,
}

/// What a scope belongs to. Ownership chains give scope ancestry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeOwner {
    Model(ModelId),
    Proc(ProcId),
    Node(NodeId),
}

/// An ordered list of nodes with its own parameter values.
#[derive(Debug, Clone)]
pub struct ScopeData {
    pub owner: ScopeOwner,
    /// Parameter values of this scope, in declaration order.
    pub params: Vec<ValueId>,
    /// Nodes in execution order.
    pub nodes: Vec<NodeId>,
}

/// Producer of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDef {
    /// Produced as a result of a node.
    Node(NodeId),
    /// Introduced by a scope's parameter list.
    Param { scope: ScopeId, index: usize },
}

/// A value in the graph.
#[derive(Debug, Clone)]
pub struct ValueData {
    pub ty: Type,
    pub def: ValueDef,
}

/// Top-level simulation unit.
///
/// The body scope has exactly one parameter, the state handle of type
/// [`Type::Storage`]. Clock regions live in the body until outlined.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub body: ScopeId,
    /// Name of the initializer procedure, set when a one-shot init region
    /// is outlined. Overwriting emits a warning, not an error.
    pub initializer: Option<String>,
}

/// Named callable unit. Parameters are its body scope's parameters.
#[derive(Debug, Clone)]
pub struct Procedure {
    pub name: String,
    pub body: ScopeId,
}
