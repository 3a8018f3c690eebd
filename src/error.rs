use thiserror::Error;

/// Errors that can occur while registering parameters and groups at plugin
/// initialization.
#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    #[error("Parameter '{0}' is already registered")]
    DuplicateParam(String),

    #[error("Parameter group '{0}' is already registered")]
    DuplicateGroup(String),

    #[error("Parameter '{param_id}' references unknown group '{group_id}'")]
    UnknownGroup { param_id: String, group_id: String },
}

/// Errors that can occur while decoding a workflow graph from its wire form.
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("Workflow JSON must be an object of node entries")]
    NotAnObject,

    #[error("Node '{0}' is missing the required 'class_type' field")]
    MissingClassType(String),

    #[error("Node '{0}' has a malformed 'inputs' field")]
    MalformedInputs(String),
}

/// Errors that abort a single generation request during workflow assembly.
///
/// This is the only error category surfaced to the end user; everything else
/// the build stage encounters is a logged best-effort skip.
#[derive(Error, Debug, Clone)]
pub enum StageError {
    #[error(
        "TIPO parameters were provided, but the backend does not have the '{feature}' capability. Install the TIPO custom node on the backend, or disable the TIPO parameter group."
    )]
    MissingCapability { feature: String },
}
