//! Host-side extension points.
//!
//! The surrounding application owns the request lifecycle; plugins hook into
//! it through the explicit registries bundled in [`HostRegistries`]: a
//! parameter catalog, a priority-ordered list of workflow-build steps, a
//! metadata-handler chain, and a list of capability-report parsers. A plugin
//! receives the bundle once at initialization and registers everything it
//! contributes.

use std::collections::HashSet;
use std::hash::BuildHasher;

use ahash::AHashMap;
use serde_json::Value;

use crate::error::StageError;
use crate::graph::Workflow;
use crate::params::{GenerationRequest, ParamCatalog, ParamValue};

/// Read-only query for capabilities the connected backend advertises.
pub trait FeatureSet {
    fn has_feature(&self, name: &str) -> bool;
}

impl<S: BuildHasher> FeatureSet for HashSet<String, S> {
    fn has_feature(&self, name: &str) -> bool {
        self.contains(name)
    }
}

/// Mutable state a workflow-build step sees for one generation request.
pub struct BuildContext<'a> {
    pub request: &'a mut GenerationRequest,
    pub workflow: &'a mut Workflow,
    pub catalog: &'a ParamCatalog,
    pub features: &'a dyn FeatureSet,
}

impl BuildContext<'_> {
    /// The effective value of a parameter: request value or catalog default.
    pub fn resolve(&self, id: &str) -> Option<ParamValue> {
        self.request.resolve(self.catalog, id)
    }
}

/// A single stage of workflow assembly, invoked once per request.
pub trait WorkflowStep: Send + Sync {
    /// Ordering key; steps run in ascending priority, with the host's own
    /// assembly conventionally at 0.0.
    fn priority(&self) -> f64;

    fn apply(&self, ctx: &mut BuildContext<'_>) -> Result<(), StageError>;
}

/// Priority-ordered collection of workflow-build steps.
#[derive(Default)]
pub struct StepRegistry {
    steps: Vec<Box<dyn WorkflowStep>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, step: Box<dyn WorkflowStep>) {
        self.steps.push(step);
        self.steps
            .sort_by(|a, b| a.priority().total_cmp(&b.priority()));
    }

    /// Runs every step in priority order. The first error aborts the build;
    /// the request never reaches the backend.
    pub fn run(&self, ctx: &mut BuildContext<'_>) -> Result<(), StageError> {
        for step in &self.steps {
            step.apply(ctx)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Handler for one backend-reported metadata entry.
pub trait MetadataHandler: Send + Sync {
    /// Returns `true` when the key was consumed, suppressing the host's
    /// generic handling for it.
    fn handle(&self, request: &mut GenerationRequest, key: &str, value: &str) -> bool;
}

/// Chain of metadata handlers consulted in registration order.
#[derive(Default)]
pub struct MetadataHandlerRegistry {
    handlers: Vec<Box<dyn MetadataHandler>>,
}

impl MetadataHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, handler: Box<dyn MetadataHandler>) {
        self.handlers.push(handler);
    }

    /// Dispatches one entry. When no handler claims the key, the host's
    /// generic fallback records it verbatim under `custom_<key>`.
    pub fn dispatch(&self, request: &mut GenerationRequest, key: &str, value: &str) {
        for handler in &self.handlers {
            if handler.handle(request, key, value) {
                return;
            }
        }
        request.set_extra_meta(format!("custom_{key}"), ParamValue::from(value));
    }
}

/// Callback invoked with each raw capability report the backend sends.
pub type CapabilityParser = Box<dyn Fn(&Value) + Send + Sync>;

/// Parsers that extract plugin-specific data out of capability reports.
#[derive(Default)]
pub struct CapabilityParserRegistry {
    parsers: Vec<CapabilityParser>,
}

impl CapabilityParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_parser(&mut self, parser: CapabilityParser) {
        self.parsers.push(parser);
    }

    pub fn ingest(&self, report: &Value) {
        for parser in &self.parsers {
            parser(report);
        }
    }
}

/// Descriptor of a backend feature the host can offer to install on demand.
#[derive(Debug, Clone)]
pub struct InstallableFeature {
    pub display_name: String,
    pub feature_id: String,
    pub source_url: String,
    pub author: String,
    /// Confirmation text shown before installation starts.
    pub notice: String,
}

/// The bundle of extension points a plugin registers itself into.
#[derive(Default)]
pub struct HostRegistries {
    pub catalog: ParamCatalog,
    pub steps: StepRegistry,
    pub metadata_handlers: MetadataHandlerRegistry,
    pub capability_parsers: CapabilityParserRegistry,
    /// Backend node class name to host feature id.
    pub node_features: AHashMap<String, String>,
    pub installable_features: Vec<InstallableFeature>,
    /// Client-side script assets to serve with the UI.
    pub script_files: Vec<String>,
}

impl HostRegistries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the registered build steps over one request's workflow.
    pub fn build_workflow(
        &self,
        request: &mut GenerationRequest,
        workflow: &mut Workflow,
        features: &dyn FeatureSet,
    ) -> Result<(), StageError> {
        let mut ctx = BuildContext {
            request,
            workflow,
            catalog: &self.catalog,
            features,
        };
        self.steps.run(&mut ctx)
    }
}
