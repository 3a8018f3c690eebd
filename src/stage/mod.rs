//! The TIPO workflow-build stage.
//!
//! Runs once per generation request, after the host has created its prompt
//! encoder nodes but before the graph is finalized for submission. When any
//! TIPO parameter is present in the request, the stage inserts a TIPO node
//! wired from the current parameter values and redirects the positive prompt
//! encoder to consume its output instead of the original text.

mod seed;

pub use seed::{ResolvedSeed, SEED_RANDOM, SEED_USE_MAIN, SeedPolicy, resolve_seed};

use ahash::AHashMap;
use tracing::{debug, warn};

use crate::error::StageError;
use crate::extension::{self, param};
use crate::graph::{NodeInput, NodeLink, WorkflowNode};
use crate::host::{BuildContext, WorkflowStep};
use crate::metadata::TIPO_PROMPT_KEY;
use crate::params::{ParamValue, core};

/// Conventional id of the positive prompt encoder in the host's default
/// graph layout, used when the recorded final-prompt reference is stale.
const FALLBACK_ENCODER_ID: &str = "6";

/// Marker shared by the single and dual text encoder node families.
const TEXT_ENCODER_MARKER: &str = "CLIPTextEncode";

/// Id namespace this stage allocates its nodes from.
const NODE_ID_NAMESPACE: u32 = 100;

/// Strictly before the host's default 0.0 steps, so the redirect still sees
/// the encoder nodes but runs ahead of submission.
const STEP_PRIORITY: f64 = -0.1;

/// TIPO node output indices: formatted prompt and unformatted prompt.
const OUTPUT_FORMATTED: u32 = 0;
const OUTPUT_UNFORMATTED: u32 = 2;

/// The graph mutator, registered as a [`WorkflowStep`] at priority −0.1.
pub struct TipoStage {
    strict_capability: bool,
    seed_policy: SeedPolicy,
    record_provenance: bool,
}

impl Default for TipoStage {
    fn default() -> Self {
        Self::new()
    }
}

impl TipoStage {
    pub fn new() -> Self {
        Self {
            strict_capability: true,
            seed_policy: SeedPolicy::Resolve,
            record_provenance: true,
        }
    }

    /// When strict (the default), a request with TIPO parameters is rejected
    /// outright if the backend lacks the capability; otherwise the missing
    /// node type is left to fail downstream at the backend.
    pub fn with_strict_capability(mut self, strict: bool) -> Self {
        self.strict_capability = strict;
        self
    }

    pub fn with_seed_policy(mut self, policy: SeedPolicy) -> Self {
        self.seed_policy = policy;
        self
    }

    /// Whether to insert the save-metadata node pairing the generated prompt
    /// with the reserved provenance key.
    pub fn with_provenance(mut self, record: bool) -> Self {
        self.record_provenance = record;
        self
    }
}

impl WorkflowStep for TipoStage {
    fn priority(&self) -> f64 {
        STEP_PRIORITY
    }

    fn apply(&self, ctx: &mut BuildContext<'_>) -> Result<(), StageError> {
        if !self.is_active(ctx) {
            return Ok(());
        }

        if self.strict_capability && !ctx.features.has_feature(extension::TIPO_FEATURE) {
            return Err(StageError::MissingCapability {
                feature: extension::TIPO_FEATURE.to_string(),
            });
        }

        let resolved = self.resolve_request_seed(ctx);
        // Echo the resolved seed into the request so generation provenance
        // records what the node actually ran with.
        ctx.request.set(param::SEED, ParamValue::Int(resolved.value));

        let inputs = self.tipo_inputs(ctx, resolved);
        let tipo_id = ctx.workflow.stable_id(NODE_ID_NAMESPACE, 0);
        let tipo_id = ctx
            .workflow
            .create_node(extension::TIPO_NODE_CLASS, inputs, tipo_id);

        let unformatted = self
            .resolve_bool(ctx, param::NO_FORMATTING)
            .unwrap_or(false);
        let output = if unformatted {
            OUTPUT_UNFORMATTED
        } else {
            OUTPUT_FORMATTED
        };
        let tipo_link = NodeLink::new(tipo_id, output);
        debug!(node = %tipo_link.node, output, "inserted TIPO node");

        if self.record_provenance {
            let mut meta_inputs = AHashMap::new();
            meta_inputs.insert("key".to_string(), NodeInput::value(TIPO_PROMPT_KEY));
            meta_inputs.insert("value".to_string(), NodeInput::Link(tipo_link.clone()));
            let meta_id = ctx.workflow.stable_id(NODE_ID_NAMESPACE, 1);
            ctx.workflow
                .create_node(extension::SAVE_METADATA_NODE_CLASS, meta_inputs, meta_id);
        }

        self.redirect_encoder(ctx, &tipo_link);
        Ok(())
    }
}

impl TipoStage {
    /// The stage is active iff the request carries a raw value for at least
    /// one parameter of the TIPO group.
    fn is_active(&self, ctx: &BuildContext<'_>) -> bool {
        ctx.catalog
            .group_members(extension::TIPO_GROUP)
            .iter()
            .any(|param| ctx.request.get(&param.id).is_some())
    }

    fn resolve_request_seed(&self, ctx: &BuildContext<'_>) -> ResolvedSeed {
        let requested = ctx
            .request
            .get(param::SEED)
            .and_then(ParamValue::as_i64);
        let main_seed = ctx
            .resolve(core::SEED)
            .and_then(|value| value.as_i64())
            .unwrap_or(SEED_RANDOM);
        let mut rng = rand::rng();
        resolve_seed(self.seed_policy, requested, main_seed, &mut rng)
    }

    fn tipo_inputs(
        &self,
        ctx: &BuildContext<'_>,
        seed: ResolvedSeed,
    ) -> AHashMap<String, NodeInput> {
        let prompt = self.resolve_text(ctx, core::PROMPT);
        let prompt_type = self.resolve_text(ctx, param::PROMPT_TYPE);
        // The prompt is routed into exactly one of the two prompt fields;
        // the other stays empty.
        let (tags, nl_prompt) = if prompt_type == "natural language" {
            (String::new(), prompt)
        } else {
            (prompt, String::new())
        };

        let mut inputs = AHashMap::new();
        inputs.insert("tags".to_string(), NodeInput::value(tags));
        inputs.insert("nl_prompt".to_string(), NodeInput::value(nl_prompt));
        inputs.insert(
            "ban_tags".to_string(),
            NodeInput::value(self.resolve_text(ctx, param::BAN_TAGS)),
        );
        inputs.insert(
            "tipo_model".to_string(),
            NodeInput::value(self.resolve_text(ctx, param::MODEL)),
        );
        inputs.insert(
            "format".to_string(),
            NodeInput::value(self.resolve_text(ctx, param::FORMAT)),
        );
        inputs.insert(
            "width".to_string(),
            NodeInput::value(self.resolve_i64(ctx, core::WIDTH).unwrap_or(1024)),
        );
        inputs.insert(
            "height".to_string(),
            NodeInput::value(self.resolve_i64(ctx, core::HEIGHT).unwrap_or(1024)),
        );
        inputs.insert(
            "temperature".to_string(),
            NodeInput::value(self.resolve_f64(ctx, param::TEMPERATURE)),
        );
        inputs.insert(
            "top_p".to_string(),
            NodeInput::value(self.resolve_f64(ctx, param::TOP_P)),
        );
        inputs.insert(
            "min_p".to_string(),
            NodeInput::value(self.resolve_f64(ctx, param::MIN_P)),
        );
        inputs.insert(
            "top_k".to_string(),
            NodeInput::value(self.resolve_i64(ctx, param::TOP_K).unwrap_or(0)),
        );
        inputs.insert(
            "tag_length".to_string(),
            NodeInput::value(self.resolve_text(ctx, param::TAG_LENGTH)),
        );
        inputs.insert(
            "nl_length".to_string(),
            NodeInput::value(self.resolve_text(ctx, param::NL_LENGTH)),
        );
        inputs.insert("seed".to_string(), NodeInput::value(seed.value));
        inputs.insert(
            "device".to_string(),
            NodeInput::value(self.resolve_text(ctx, param::DEVICE)),
        );
        if seed.locked {
            inputs.insert(
                "control_after_generate".to_string(),
                NodeInput::value("fixed"),
            );
        }
        inputs
    }

    /// Redirects the positive prompt encoder to consume the TIPO output.
    ///
    /// Preference order for the target: the recorded final-prompt producer
    /// when it still exists in the graph, else the conventional fallback id.
    /// A missing node, unexpected class type, or absent text input skips the
    /// redirect without failing the request.
    fn redirect_encoder(&self, ctx: &mut BuildContext<'_>, link: &NodeLink) {
        let recorded = ctx.workflow.final_prompt();
        let prior_output = recorded.map(|l| l.output).unwrap_or(0);
        let target = match recorded {
            Some(l) if ctx.workflow.contains(&l.node) => l.node.clone(),
            _ => FALLBACK_ENCODER_ID.to_string(),
        };

        let redirected = match ctx.workflow.node_mut(&target) {
            Some(node) => redirect_text_inputs(node, &target, link),
            None => {
                warn!(node = %target, "positive prompt encoder not found, leaving prompt wiring unchanged");
                false
            }
        };

        if redirected {
            // Re-point the final-prompt reference at the encoder id so later
            // build logic re-derives the link from the rewired node rather
            // than a stale reference.
            ctx.workflow
                .set_final_prompt(NodeLink::new(target, prior_output));
        }
    }

    fn resolve_text(&self, ctx: &BuildContext<'_>, id: &str) -> String {
        ctx.resolve(id)
            .and_then(|value| value.as_text().map(str::to_string))
            .unwrap_or_default()
    }

    fn resolve_bool(&self, ctx: &BuildContext<'_>, id: &str) -> Option<bool> {
        ctx.resolve(id).and_then(|value| value.as_bool())
    }

    fn resolve_f64(&self, ctx: &BuildContext<'_>, id: &str) -> f64 {
        ctx.resolve(id)
            .and_then(|value| value.as_f64())
            .unwrap_or_default()
    }

    fn resolve_i64(&self, ctx: &BuildContext<'_>, id: &str) -> Option<i64> {
        ctx.resolve(id).and_then(|value| value.as_i64())
    }
}

fn redirect_text_inputs(node: &mut WorkflowNode, target: &str, link: &NodeLink) -> bool {
    if !node.class_type.contains(TEXT_ENCODER_MARKER) {
        warn!(
            node = %target,
            class_type = %node.class_type,
            "target node is not a text encoder, skipping prompt redirect"
        );
        return false;
    }

    let input_name = if node.inputs.contains_key("text_g") {
        "text_g"
    } else {
        "text"
    };
    if !node.inputs.contains_key(input_name) {
        warn!(
            node = %target,
            input = input_name,
            "encoder lacks the expected text input, skipping prompt redirect"
        );
        return false;
    }

    // Dual-encoder nodes keep both text inputs in sync.
    if input_name == "text_g" && node.inputs.contains_key("text_l") {
        node.set_input("text_l", NodeInput::Link(link.clone()));
    }
    node.set_input(input_name, NodeInput::Link(link.clone()));
    debug!(node = %target, input = input_name, "redirected prompt encoder to TIPO output");
    true
}
