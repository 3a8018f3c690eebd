//! Common test utilities for building hosts, requests, and workflows.
use std::collections::HashSet;

use tensaku::extension::{TIPO_FEATURE, TipoExtension, param};
use tensaku::graph::{NodeInput, NodeLink, Workflow, WorkflowNode};
use tensaku::host::HostRegistries;
use tensaku::params::{GenerationRequest, core};
use tensaku::stage::TipoStage;

/// A host with the TIPO extension registered under default configuration.
#[allow(dead_code)]
pub fn tipo_host() -> HostRegistries {
    let mut host = HostRegistries::new();
    TipoExtension::new()
        .register(&mut host)
        .expect("extension registration");
    host
}

/// Same, but with a custom stage configuration.
#[allow(dead_code)]
pub fn tipo_host_with_stage(stage: TipoStage) -> HostRegistries {
    let mut host = HostRegistries::new();
    TipoExtension::new()
        .with_stage(stage)
        .register(&mut host)
        .expect("extension registration");
    host
}

/// A backend feature set advertising the TIPO capability.
#[allow(dead_code)]
pub fn backend_features() -> HashSet<String> {
    [TIPO_FEATURE.to_string()].into_iter().collect()
}

/// A backend feature set without the TIPO capability.
#[allow(dead_code)]
pub fn no_features() -> HashSet<String> {
    HashSet::new()
}

/// Single-encoder graph in the host's default layout: the positive prompt
/// encoder sits at id "6" with a plain `text` input.
#[allow(dead_code)]
pub fn single_encoder_workflow() -> Workflow {
    let mut workflow = Workflow::new();
    workflow.add_node(
        "4",
        WorkflowNode::new("CheckpointLoaderSimple")
            .with_input("ckpt_name", NodeInput::value("v1-5.safetensors")),
    );
    workflow.add_node(
        "6",
        WorkflowNode::new("CLIPTextEncode")
            .with_input("text", NodeInput::value("1girl, forest"))
            .with_input("clip", NodeInput::link("4", 1)),
    );
    workflow.add_node(
        "7",
        WorkflowNode::new("CLIPTextEncode")
            .with_input("text", NodeInput::value("lowres"))
            .with_input("clip", NodeInput::link("4", 1)),
    );
    workflow.set_final_prompt(NodeLink::new("6", 0));
    workflow
}

/// Dual-encoder graph (`text_g`/`text_l`) with the encoder at id "6".
#[allow(dead_code)]
pub fn dual_encoder_workflow() -> Workflow {
    let mut workflow = Workflow::new();
    workflow.add_node(
        "4",
        WorkflowNode::new("CheckpointLoaderSimple")
            .with_input("ckpt_name", NodeInput::value("sd_xl_base_1.0.safetensors")),
    );
    workflow.add_node(
        "6",
        WorkflowNode::new("CLIPTextEncodeSDXL")
            .with_input("text_g", NodeInput::value("1girl, forest"))
            .with_input("text_l", NodeInput::value("1girl, forest"))
            .with_input("clip", NodeInput::link("4", 1)),
    );
    workflow.set_final_prompt(NodeLink::new("6", 0));
    workflow
}

/// Request carrying the host core values plus one TIPO parameter, so the
/// build stage activates.
#[allow(dead_code)]
pub fn tipo_request() -> GenerationRequest {
    GenerationRequest::new()
        .with(core::PROMPT, "1girl, forest")
        .with(core::SEED, 12345_i64)
        .with(core::WIDTH, 1024_i64)
        .with(core::HEIGHT, 1024_i64)
        .with(param::SEED, 42_i64)
}

/// Runs the registered build steps, panicking on a stage error.
#[allow(dead_code)]
pub fn run_build(
    host: &HostRegistries,
    request: &mut GenerationRequest,
    workflow: &mut Workflow,
    features: &HashSet<String>,
) {
    host.build_workflow(request, workflow, features)
        .expect("workflow build");
}

/// Id of the first node with the given class type, if any.
#[allow(dead_code)]
pub fn node_id_of(workflow: &Workflow, class_type: &str) -> Option<String> {
    workflow
        .nodes()
        .find(|(_, node)| node.class_type == class_type)
        .map(|(id, _)| id.clone())
}
