//! Arena-backed graph IR for simulation models.
//!
//! A [`Module`] owns flat arenas of nodes, values and scopes, addressed by
//! copyable id newtypes. Nodes live in the ordered node list of exactly one
//! scope (or are detached mid-transformation); values are produced by exactly
//! one node or by a scope's parameter list. Some node kinds own a nested
//! scope, which is how clock regions and conditionals nest.
//!
//! # Example
//!
//! ```text
//! model boiler(%0: storage) {
//!   %1 = const 1.0
//!   update %2 {                 <- clock region gated by %2
//!     %4 = state.read "temp" (%3)
//!     state.write "temp" (%3, %4)
//!   }
//! }
//! ```

mod module;
mod types;

pub use module::Module;
pub use types::{
    BinOp, ClockKind, ConstValue, Model, ModelId, NodeData, NodeId, NodeKind, ProcId, Procedure,
    ScopeData, ScopeId, ScopeOwner, Type, ValueData, ValueDef, ValueId,
};

#[cfg(test)]
mod tests;
