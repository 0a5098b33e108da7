//! Outlining of a single clock region into a procedure.

use tracing::{debug, warn};

use crate::diag::{Diagnostic, Diagnostics};
use crate::ir::{ClockKind, ModelId, Module, NodeId, NodeKind, ValueId};

use super::isolate::isolate_region;
use super::names::NameRegistry;
use super::{OutlineError, OutlineStats};

/// Per-model outlining state.
pub(super) struct Outliner<'a> {
    module: &'a mut Module,
    model: ModelId,
    model_name: String,
    /// The model's state handle, threaded into every outlined procedure.
    handle: ValueId,
    /// Whether the model contains a passthrough region anywhere.
    has_passthrough: bool,
    registry: &'a mut NameRegistry,
    pub(super) diags: &'a mut Diagnostics,
    stats: OutlineStats,
    /// Init procedure name and the predicted passthrough callee name, when
    /// the init/passthrough coupling call has been emitted.
    init_coupling: Option<(String, String)>,
    /// Name actually issued to the model's passthrough procedure.
    passthrough_proc: Option<String>,
}

impl<'a> Outliner<'a> {
    pub(super) fn new(
        module: &'a mut Module,
        model: ModelId,
        has_passthrough: bool,
        registry: &'a mut NameRegistry,
        diags: &'a mut Diagnostics,
    ) -> Self {
        let model_name = module.model(model).name.clone();
        let handle = module.state_handle(model);
        Self {
            module,
            model,
            model_name,
            handle,
            has_passthrough,
            registry,
            diags,
            stats: OutlineStats::default(),
            init_coupling: None,
            passthrough_proc: None,
        }
    }

    /// Accumulated statistics and the deferred init-coupling record:
    /// `(init proc, predicted callee, actual passthrough proc)`.
    pub(super) fn finish(self) -> (OutlineStats, Option<(String, String, Option<String>)>) {
        let deferred = self
            .init_coupling
            .map(|(init, callee)| (init, callee, self.passthrough_proc));
        (self.stats, deferred)
    }

    /// Outline one clock region: isolate it, pull its scope out into a new
    /// procedure, and build the kind-specific replacement at its original
    /// position.
    pub(super) fn outline_region(
        &mut self,
        region: NodeId,
        kind: ClockKind,
    ) -> Result<(), OutlineError> {
        debug!(region = %region, kind = %kind, "outlining clock region");
        let scope = self.module.nested_scope(region);

        // The region scope gains a parameter of the handle's type; it
        // becomes the future procedure's sole parameter.
        let handle_ty = self.module.value(self.handle).ty;
        let inner = self.module.add_scope_param(scope, handle_ty);

        // Isolation needs the region still attached at its original
        // position to find producers and verify use-sets.
        isolate_region(self.module, region, self.handle, inner, &mut self.stats)?;

        self.module.return_node(scope);

        let suffix = match kind {
            ClockKind::Update => "_clock",
            ClockKind::OneShotInit => "_initial",
            ClockKind::Passthrough => "_passthrough",
        };
        let name = self
            .registry
            .register(&format!("{}{}", self.model_name, suffix));
        debug!(proc = %name, "created clock procedure");

        // Build the replacement at the region's original position, before
        // the body is relocated.
        let parent = self
            .module
            .node(region)
            .parent
            .expect("clock region is attached");
        let position = self.module.position(parent, region);
        match kind {
            ClockKind::Update => {
                let gate = self.module.node(region).operands[0];
                let if_node = self.module.new_node(NodeKind::If, vec![gate], vec![]);
                let then_scope = self.module.new_nested_scope(if_node);
                self.module.insert_node(parent, position, if_node);
                self.module.call(then_scope, name.clone(), vec![self.handle]);
            }
            ClockKind::Passthrough => {
                let call = self.module.new_node(
                    NodeKind::Call {
                        callee: name.clone(),
                    },
                    vec![self.handle],
                    vec![],
                );
                self.module.insert_node(parent, position, call);
                self.passthrough_proc = Some(name.clone());
            }
            ClockKind::OneShotInit => {
                if let Some(previous) = &self.module.model(self.model).initializer {
                    warn!(model = %self.model_name, previous = %previous, "model initializer overridden");
                    self.diags.emit(Diagnostic::warning(format!(
                        "existing initializer `{}` of model `{}` will be overridden",
                        previous, self.model_name
                    )));
                }
                self.module.model_mut(self.model).initializer = Some(name.clone());
            }
        }

        // The passthrough procedure may not be outlined yet, so the init
        // procedure calls it by its predicted name; the prediction is
        // validated once the whole model has been processed.
        if kind == ClockKind::OneShotInit && self.has_passthrough {
            let callee = format!("{}_passthrough", self.model_name);
            let terminator = self.module.scope(scope).nodes.len() - 1;
            let call = self.module.new_node(
                NodeKind::Call {
                    callee: callee.clone(),
                },
                vec![inner],
                vec![],
            );
            self.module.insert_node(scope, terminator, call);
            self.init_coupling = Some((name.clone(), callee));
        }

        // Relocate the region body into the procedure and drop the region.
        self.module.node_mut(region).scope = None;
        self.module.add_proc(name, scope);
        self.module.erase_node(region);
        Ok(())
    }
}
