//! # Tensaku - TIPO Prompt-Upsampling Integration Engine
//!
//! **Tensaku** integrates the TIPO prompt-generation model into node-graph
//! image generation pipelines. It is the plugin side of a host/plugin split:
//! the surrounding application owns the parameter UI, the request lifecycle,
//! and graph submission, while this crate contributes the parameter catalog
//! entries, the dynamic model registry, the metadata interception, and — the
//! actual substance — the workflow-build stage that inserts a TIPO node into
//! the request's graph and redirects the positive prompt encoder to consume
//! its output.
//!
//! ## Core Workflow
//!
//! 1.  **Register**: At initialization, hand a [`host::HostRegistries`]
//!     bundle to [`extension::TipoExtension::register`]. This wires in the
//!     parameter group, the capability parser, the metadata handler, and the
//!     build stage.
//! 2.  **Ingest capabilities**: Feed each raw backend capability report to
//!     `host.capability_parsers.ingest(..)` so the model-selection parameter
//!     tracks what the backend actually has installed.
//! 3.  **Build**: For each generation request, run
//!     `host.build_workflow(..)` over the request's graph. When the request
//!     carries TIPO parameters, the stage performs the graph surgery; when
//!     it does not, the graph is left untouched.
//! 4.  **Intercept metadata**: Dispatch backend-reported metadata entries
//!     through `host.metadata_handlers` so the generated prompt replaces the
//!     recorded one and the original is preserved for provenance.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::collections::HashSet;
//! use tensaku::extension::{param, TipoExtension, TIPO_FEATURE};
//! use tensaku::graph::{NodeInput, Workflow, WorkflowNode};
//! use tensaku::host::HostRegistries;
//! use tensaku::params::{core, GenerationRequest};
//!
//! fn main() -> tensaku::prelude::Result<()> {
//!     let mut host = HostRegistries::new();
//!     TipoExtension::new().register(&mut host)?;
//!
//!     // A minimal host graph: one positive prompt encoder.
//!     let mut workflow = Workflow::new();
//!     workflow.add_node(
//!         "6",
//!         WorkflowNode::new("CLIPTextEncode")
//!             .with_input("text", NodeInput::value("1girl, forest")),
//!     );
//!
//!     let mut request = GenerationRequest::new()
//!         .with(core::PROMPT, "1girl, forest")
//!         .with(core::SEED, 12345_i64)
//!         .with(core::WIDTH, 1024_i64)
//!         .with(core::HEIGHT, 1024_i64)
//!         .with(param::SEED, 42_i64);
//!
//!     let features: HashSet<String> = [TIPO_FEATURE.to_string()].into();
//!     host.build_workflow(&mut request, &mut workflow, &features)?;
//!
//!     // The encoder now consumes the TIPO node's formatted output.
//!     println!("{}", workflow.to_wire());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod extension;
pub mod graph;
pub mod host;
pub mod install;
pub mod metadata;
pub mod params;
pub mod prelude;
pub mod registry;
pub mod stage;
