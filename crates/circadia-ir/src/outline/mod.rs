//! Clock-region outlining.
//!
//! Extracts every clock region of a model into a procedure that takes the
//! model's state handle as its only parameter, rewriting the region's data
//! dependencies so the procedure references nothing defined outside it, and
//! replaces the region with a call site matched to its kind:
//!
//! - `update` regions become a conditional wrapping a call,
//! - `passthrough` regions become an unconditional call,
//! - `init` regions set the model's initializer reference.
//!
//! The pass is fatal on failure: the caller is expected to discard the
//! translation unit rather than recover.

use thiserror::Error;
use tracing::debug;

use crate::diag::{Diagnostic, Diagnostics};
use crate::ir::{ClockKind, ModelId, Module, NodeId, NodeKind, ValueId};

mod isolate;
mod names;
mod region;

pub use names::NameRegistry;


/// Errors that can occur during clock outlining.
///
/// All variants are fatal for the enclosing translation unit; none are
/// recoverable in place.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutlineError {
    /// More than one passthrough region in a single model.
    #[error("model `{model}` contains multiple passthrough regions")]
    MultiplePassthrough { model: String, regions: Vec<NodeId> },

    /// More than one one-shot init region in a single model.
    #[error("model `{model}` contains multiple init regions")]
    MultipleInit { model: String, regions: Vec<NodeId> },

    /// A node inside a clock region uses a parameter of an enclosing scope
    /// other than the state handle.
    #[error("node {node} in clock region {region} uses external parameter {value}")]
    ExternalParameter {
        node: NodeId,
        value: ValueId,
        region: NodeId,
    },

    /// A node inside a clock region uses a non-constant value defined
    /// outside the region.
    #[error("node {node} in clock region {region} uses external value {value}")]
    ExternalValue {
        node: NodeId,
        value: ValueId,
        producer: NodeId,
        region: NodeId,
    },

    /// The init procedure's deferred call does not resolve to the model's
    /// own passthrough procedure.
    #[error("init procedure `{init}` calls `{callee}`, which is not the model's passthrough procedure")]
    UnresolvedCallee { init: String, callee: String },
}

/// Pass statistics, for profiling and diagnostics only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutlineStats {
    /// Nodes moved into clock regions during isolation.
    pub nodes_moved: usize,
    /// Nodes duplicated into clock regions during isolation.
    pub nodes_copied: usize,
}

impl OutlineStats {
    fn merge(&mut self, other: OutlineStats) {
        self.nodes_moved += other.nodes_moved;
        self.nodes_copied += other.nodes_copied;
    }
}

/// Outline the clock regions of every model in the module, in order.
///
/// One name registry is shared across all models, seeded with the names of
/// procedures that already exist in the module.
pub fn outline_clocks(
    module: &mut Module,
    diags: &mut Diagnostics,
) -> Result<OutlineStats, Vec<OutlineError>> {
    let mut registry = seeded_registry(module);
    let mut stats = OutlineStats::default();
    for model in module.model_ids() {
        stats.merge(outline_model_with(module, model, &mut registry, diags)?);
    }
    Ok(stats)
}

/// Outline the clock regions of a single model.
pub fn outline_model(
    module: &mut Module,
    model: ModelId,
    diags: &mut Diagnostics,
) -> Result<OutlineStats, Vec<OutlineError>> {
    let mut registry = seeded_registry(module);
    outline_model_with(module, model, &mut registry, diags)
}

fn seeded_registry(module: &Module) -> NameRegistry {
    let mut registry = NameRegistry::new();
    for proc in module.procs() {
        registry.reserve(&proc.name);
    }
    registry
}

fn outline_model_with(
    module: &mut Module,
    model: ModelId,
    registry: &mut NameRegistry,
    diags: &mut Diagnostics,
) -> Result<OutlineStats, Vec<OutlineError>> {
    let model_name = module.model(model).name.clone();
    debug!(model = %model_name, "outlining clock regions");

    // Discover regions in pre-order, tagged by kind.
    let body = module.model(model).body;
    let mut regions = Vec::new();
    let mut inits = Vec::new();
    let mut passthroughs = Vec::new();
    for node in module.preorder_nodes(body) {
        if let NodeKind::Clock(kind) = &module.node(node).kind {
            let kind = *kind;
            regions.push((node, kind));
            match kind {
                ClockKind::OneShotInit => inits.push(node),
                ClockKind::Passthrough => passthroughs.push(node),
                ClockKind::Update => {}
            }
        }
    }

    // Cardinality checks are independent; report both before failing.
    let mut errors = Vec::new();
    if passthroughs.len() > 1 {
        diags.emit(region_conflict_diag(
            &format!("model `{}` contains multiple passthrough regions", model_name),
            "conflicting passthrough region",
            &passthroughs,
        ));
        errors.push(OutlineError::MultiplePassthrough {
            model: model_name.clone(),
            regions: passthroughs.clone(),
        });
    }
    if inits.len() > 1 {
        diags.emit(region_conflict_diag(
            &format!("model `{}` contains multiple init regions", model_name),
            "conflicting init region",
            &inits,
        ));
        errors.push(OutlineError::MultipleInit {
            model: model_name.clone(),
            regions: inits.clone(),
        });
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut outliner = region::Outliner::new(
        module,
        model,
        !passthroughs.is_empty(),
        registry,
        diags,
    );
    for (node, kind) in regions {
        if let Err(error) = outliner.outline_region(node, kind) {
            outliner.diags.emit(error_diag(&error));
            return Err(vec![error]);
        }
    }
    let (stats, deferred) = outliner.finish();

    // The init procedure's call to the passthrough procedure is inserted by
    // predicted name before the passthrough region is necessarily outlined;
    // verify the prediction once the whole model has been processed.
    if let Some((init, callee, actual)) = deferred {
        if actual.as_deref() != Some(callee.as_str()) {
            let error = OutlineError::UnresolvedCallee { init, callee };
            diags.emit(error_diag(&error));
            return Err(vec![error]);
        }
    }

    debug!(
        model = %model_name,
        moved = stats.nodes_moved,
        copied = stats.nodes_copied,
        "clock outlining complete"
    );
    Ok(stats)
}

fn region_conflict_diag(message: &str, note_label: &str, regions: &[NodeId]) -> Diagnostic {
    let mut diag = Diagnostic::error(message);
    for region in regions {
        diag = diag.with_note(format!("{}: {}", note_label, region));
    }
    diag
}

fn error_diag(error: &OutlineError) -> Diagnostic {
    let diag = Diagnostic::error(error.to_string());
    match error {
        OutlineError::ExternalParameter { region, .. } => diag
            .with_note("clock regions can only use external constant values")
            .with_note(format!("clock region: {}", region)),
        OutlineError::ExternalValue {
            producer, region, ..
        } => diag
            .with_note("clock regions can only use external constant values")
            .with_note(format!("external value defined by: {}", producer))
            .with_note(format!("clock region: {}", region)),
        _ => diag,
    }
}
