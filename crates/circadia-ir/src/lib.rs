//! Circadia IR - simulation model intermediate representation
//!
//! Provides the arena-backed graph IR for simulation models and the
//! clock-region outlining pass that extracts each clock region into an
//! independently callable procedure.
//!
//! Pipeline: model IR -> clock outlining -> procedures + call sites

pub mod diag;
pub mod ir;
pub mod outline;

pub use diag::{Diagnostic, Diagnostics, Severity};
pub use ir::{
    BinOp, ClockKind, ConstValue, Model, ModelId, Module, NodeId, NodeKind, ProcId, Procedure,
    ScopeId, ScopeOwner, Type, ValueDef, ValueId,
};
pub use outline::{outline_clocks, outline_model, OutlineError, OutlineStats};
