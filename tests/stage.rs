//! Workflow-build stage tests: activation, node construction, output
//! selection, seed handling, and encoder rewiring.
mod common;
use common::*;
use tensaku::extension::{SAVE_METADATA_NODE_CLASS, TIPO_NODE_CLASS, param};
use tensaku::graph::{NodeInput, NodeLink, Workflow, WorkflowNode};
use tensaku::params::{GenerationRequest, core};
use tensaku::stage::{SeedPolicy, TipoStage};

#[test]
fn untouched_without_tipo_parameters() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    let before = workflow.to_wire();

    let mut request = GenerationRequest::new()
        .with(core::PROMPT, "1girl, forest")
        .with(core::SEED, 1_i64);
    run_build(&host, &mut request, &mut workflow, &backend_features());

    assert_eq!(workflow.to_wire(), before);
    assert_eq!(workflow.final_prompt(), Some(&NodeLink::new("6", 0)));
}

#[test]
fn tags_prompt_routed_into_tags_field() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    let mut request = tipo_request();
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).expect("TIPO node");
    let node = workflow.node(&tipo_id).unwrap();
    assert_eq!(node.input("tags"), Some(&NodeInput::value("1girl, forest")));
    assert_eq!(node.input("nl_prompt"), Some(&NodeInput::value("")));
}

#[test]
fn natural_language_prompt_routed_into_nl_field() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    let mut request = tipo_request().with(param::PROMPT_TYPE, "natural language");
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).expect("TIPO node");
    let node = workflow.node(&tipo_id).unwrap();
    assert_eq!(node.input("tags"), Some(&NodeInput::value("")));
    assert_eq!(
        node.input("nl_prompt"),
        Some(&NodeInput::value("1girl, forest"))
    );
}

#[test]
fn formatted_output_selected_by_default() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    let mut request = tipo_request();
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).unwrap();
    let encoder = workflow.node("6").unwrap();
    assert_eq!(encoder.input("text"), Some(&NodeInput::link(tipo_id, 0)));
}

#[test]
fn unformatted_output_selected_when_no_formatting() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    let mut request = tipo_request().with(param::NO_FORMATTING, true);
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).unwrap();
    let encoder = workflow.node("6").unwrap();
    assert_eq!(encoder.input("text"), Some(&NodeInput::link(tipo_id, 2)));
}

#[test]
fn dual_encoder_rewrites_both_text_inputs() {
    let host = tipo_host();
    let mut workflow = dual_encoder_workflow();
    let mut request = tipo_request();
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).unwrap();
    let tipo = workflow.node(&tipo_id).unwrap();
    assert_eq!(tipo.input("tags"), Some(&NodeInput::value("1girl, forest")));
    assert_eq!(tipo.input("seed"), Some(&NodeInput::value(42_i64)));

    let encoder = workflow.node("6").unwrap();
    let expected = NodeInput::link(tipo_id, 0);
    assert_eq!(encoder.input("text_g"), Some(&expected));
    assert_eq!(encoder.input("text_l"), Some(&expected));
}

#[test]
fn explicit_seed_recorded_and_locked() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    let mut request = tipo_request();
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).unwrap();
    let node = workflow.node(&tipo_id).unwrap();
    assert_eq!(node.input("seed"), Some(&NodeInput::value(42_i64)));
    assert_eq!(
        node.input("control_after_generate"),
        Some(&NodeInput::value("fixed"))
    );
    // Resolved seed echoed back for provenance.
    assert_eq!(request.get(param::SEED).and_then(|v| v.as_i64()), Some(42));
}

#[test]
fn random_seed_request_draws_unlocked_seed() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    let mut request = tipo_request().with(param::SEED, -1_i64);
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).unwrap();
    let node = workflow.node(&tipo_id).unwrap();
    assert!(node.input("control_after_generate").is_none());

    let echoed = request
        .get(param::SEED)
        .and_then(|v| v.as_i64())
        .expect("echoed seed");
    assert!(echoed >= 0);
}

#[test]
fn untoggled_seed_mirrors_image_seed() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    // Activate via a different group parameter; the seed stays untoggled.
    let mut request = GenerationRequest::new()
        .with(core::PROMPT, "1girl, forest")
        .with(core::SEED, 12345_i64)
        .with(core::WIDTH, 1024_i64)
        .with(core::HEIGHT, 1024_i64)
        .with(param::PROMPT_TYPE, "tags");
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).unwrap();
    let node = workflow.node(&tipo_id).unwrap();
    assert_eq!(node.input("seed"), Some(&NodeInput::value(12345_i64)));
    assert_eq!(
        node.input("control_after_generate"),
        Some(&NodeInput::value("fixed"))
    );
}

#[test]
fn passthrough_policy_forwards_raw_seed() {
    let host = tipo_host_with_stage(TipoStage::new().with_seed_policy(SeedPolicy::Passthrough));
    let mut workflow = single_encoder_workflow();
    let mut request = tipo_request().with(param::SEED, -1_i64);
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).unwrap();
    let node = workflow.node(&tipo_id).unwrap();
    assert_eq!(node.input("seed"), Some(&NodeInput::value(-1_i64)));
    assert!(node.input("control_after_generate").is_none());
}

#[test]
fn missing_capability_rejects_request_without_mutation() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    let before = workflow.to_wire();

    let mut request = tipo_request();
    let result = host.build_workflow(&mut request, &mut workflow, &no_features());

    let err = result.expect_err("capability gate");
    assert!(err.to_string().contains("tipo_prompt_generation"));
    assert_eq!(workflow.to_wire(), before);
}

#[test]
fn lenient_mode_proceeds_without_capability() {
    let host = tipo_host_with_stage(TipoStage::new().with_strict_capability(false));
    let mut workflow = single_encoder_workflow();
    let mut request = tipo_request();
    run_build(&host, &mut request, &mut workflow, &no_features());

    assert!(node_id_of(&workflow, TIPO_NODE_CLASS).is_some());
}

#[test]
fn fallback_encoder_used_when_reference_stale() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    workflow.set_final_prompt(NodeLink::new("99", 0));

    let mut request = tipo_request();
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).unwrap();
    let encoder = workflow.node("6").unwrap();
    assert_eq!(encoder.input("text"), Some(&NodeInput::link(tipo_id, 0)));
    assert_eq!(workflow.final_prompt(), Some(&NodeLink::new("6", 0)));
}

#[test]
fn rewrite_skipped_for_non_encoder_target() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    workflow.add_node(
        "3",
        WorkflowNode::new("KSampler").with_input("seed", NodeInput::value(7_i64)),
    );
    workflow.set_final_prompt(NodeLink::new("3", 0));
    let sampler_before = workflow.node("3").cloned();

    let mut request = tipo_request();
    run_build(&host, &mut request, &mut workflow, &backend_features());

    // The TIPO node is still inserted; the sampler is left alone and the
    // stale reference is not rewritten.
    assert!(node_id_of(&workflow, TIPO_NODE_CLASS).is_some());
    assert_eq!(workflow.node("3").cloned(), sampler_before);
    assert_eq!(workflow.final_prompt(), Some(&NodeLink::new("3", 0)));
}

#[test]
fn rewrite_skipped_when_encoder_missing() {
    let host = tipo_host();
    let mut workflow = Workflow::new();
    workflow.add_node(
        "4",
        WorkflowNode::new("CheckpointLoaderSimple")
            .with_input("ckpt_name", NodeInput::value("v1-5.safetensors")),
    );

    let mut request = tipo_request();
    run_build(&host, &mut request, &mut workflow, &backend_features());

    assert!(node_id_of(&workflow, TIPO_NODE_CLASS).is_some());
    assert!(workflow.final_prompt().is_none());
}

#[test]
fn provenance_node_records_tipo_output() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    let mut request = tipo_request();
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).unwrap();
    let meta_id = node_id_of(&workflow, SAVE_METADATA_NODE_CLASS).expect("provenance node");
    let meta = workflow.node(&meta_id).unwrap();
    assert_eq!(meta.input("key"), Some(&NodeInput::value("tipo_prompt")));
    assert_eq!(meta.input("value"), Some(&NodeInput::link(tipo_id, 0)));
}

#[test]
fn provenance_node_skipped_when_disabled() {
    let host = tipo_host_with_stage(TipoStage::new().with_provenance(false));
    let mut workflow = single_encoder_workflow();
    let mut request = tipo_request();
    run_build(&host, &mut request, &mut workflow, &backend_features());

    assert!(node_id_of(&workflow, SAVE_METADATA_NODE_CLASS).is_none());
}

#[test]
fn inserted_nodes_avoid_occupied_ids() {
    let host = tipo_host();
    let mut workflow = single_encoder_workflow();
    workflow.add_node("100", WorkflowNode::new("LatentUpscale"));
    workflow.add_node("101", WorkflowNode::new("LatentUpscale"));

    let mut request = tipo_request();
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).unwrap();
    assert_eq!(tipo_id, "102");
    let meta_id = node_id_of(&workflow, SAVE_METADATA_NODE_CLASS).unwrap();
    assert_eq!(meta_id, "103");
}

#[test]
fn end_to_end_dual_encoder_scenario() {
    let host = tipo_host();
    let mut workflow = dual_encoder_workflow();
    let mut request = GenerationRequest::new()
        .with(core::PROMPT, "1girl, forest")
        .with(core::SEED, 99_i64)
        .with(core::WIDTH, 1024_i64)
        .with(core::HEIGHT, 1024_i64)
        .with(param::PROMPT_TYPE, "tags")
        .with(param::NO_FORMATTING, false)
        .with(param::SEED, 42_i64);
    run_build(&host, &mut request, &mut workflow, &backend_features());

    let tipo_id = node_id_of(&workflow, TIPO_NODE_CLASS).expect("TIPO node");
    let tipo = workflow.node(&tipo_id).unwrap();
    assert_eq!(tipo.class_type, "TIPO");
    assert_eq!(tipo.input("tags"), Some(&NodeInput::value("1girl, forest")));
    assert_eq!(tipo.input("seed"), Some(&NodeInput::value(42_i64)));
    assert_eq!(tipo.input("width"), Some(&NodeInput::value(1024_i64)));
    assert_eq!(tipo.input("height"), Some(&NodeInput::value(1024_i64)));

    let encoder = workflow.node("6").unwrap();
    let expected = NodeInput::link(tipo_id, 0);
    assert_eq!(encoder.input("text_g"), Some(&expected));
    assert_eq!(encoder.input("text_l"), Some(&expected));
}
