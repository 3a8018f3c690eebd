//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types so integrating hosts can pull in
//! the whole registration and build surface with a single import.

// Plugin entry point and stage configuration
pub use crate::extension::TipoExtension;
pub use crate::stage::{SeedPolicy, TipoStage};

// Graph model
pub use crate::graph::{NodeInput, NodeLink, Workflow, WorkflowNode};

// Host extension points
pub use crate::host::{
    BuildContext, FeatureSet, HostRegistries, InstallableFeature, MetadataHandler, WorkflowStep,
};

// Parameters and request state
pub use crate::params::{
    GenerationRequest, ParamCatalog, ParamDefinition, ParamGroup, ParamKind, ParamValue, ViewHint,
};

// Shared model registry and metadata interception
pub use crate::metadata::TipoMetadataHandler;
pub use crate::registry::TipoModelRegistry;

// Error types
pub use crate::error::{CatalogError, GraphError, StageError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
