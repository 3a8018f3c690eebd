use ahash::AHashMap;

use super::catalog::ParamCatalog;
use super::types::ParamValue;

/// Parameter ids owned by the host itself rather than any plugin.
pub mod core {
    pub const PROMPT: &str = "prompt";
    pub const SEED: &str = "seed";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
}

/// The mutable per-request state a workflow is built from.
///
/// `values` holds what the user actually provided; absence of an id means
/// the parameter is untouched (or untoggled) and its catalog default
/// applies. `extra_meta` carries provenance entries recorded into the final
/// artifact's metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    values: AHashMap<String, ParamValue>,
    extra_meta: AHashMap<String, ParamValue>,
}

impl GenerationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(id.into(), value.into());
        self
    }

    /// The raw value, without default resolution. `None` means the user
    /// never touched the parameter.
    pub fn get(&self, id: &str) -> Option<&ParamValue> {
        self.values.get(id)
    }

    pub fn set(&mut self, id: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(id.into(), value.into());
    }

    /// The effective value: what the request carries, else the catalog
    /// default for the id.
    pub fn resolve(&self, catalog: &ParamCatalog, id: &str) -> Option<ParamValue> {
        self.values
            .get(id)
            .cloned()
            .or_else(|| catalog.get(id).map(|param| param.default.clone()))
    }

    pub fn extra_meta(&self, key: &str) -> Option<&ParamValue> {
        self.extra_meta.get(key)
    }

    pub fn has_extra_meta(&self, key: &str) -> bool {
        self.extra_meta.contains_key(key)
    }

    pub fn set_extra_meta(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.extra_meta.insert(key.into(), value.into());
    }
}
