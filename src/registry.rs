//! Dynamic TIPO model registry.
//!
//! The backend reports its node capabilities out-of-band relative to request
//! processing, so the list of installed TIPO models is shared mutable state:
//! replaced wholesale under a mutex whenever a capability report carries new
//! content, and snapshotted by the parameter UI between replacements.

use itertools::Itertools;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::info;

/// Shown until the first capability report arrives.
pub const PLACEHOLDER_NO_BACKEND: &str = "(Requires ComfyUI Backend Connection)";

/// Substituted when a backend reports the TIPO node with zero models, so the
/// enumeration consumers see is never empty.
pub const PLACEHOLDER_NO_MODELS: &str = "(No TIPO models found on backend)";

/// Mutex-guarded list of model identifiers advertised by the backend.
#[derive(Debug)]
pub struct TipoModelRegistry {
    models: Mutex<Vec<String>>,
}

impl Default for TipoModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TipoModelRegistry {
    pub fn new() -> Self {
        Self {
            models: Mutex::new(vec![PLACEHOLDER_NO_BACKEND.to_string()]),
        }
    }

    /// Ingests one raw capability report.
    ///
    /// Locates the `TIPO.input.required.tipo_model` enumeration; any
    /// deviation from the expected shape is a silent no-op, since reports
    /// from backends without the node installed simply lack the path. The
    /// held list is replaced only on a content difference. Returns whether a
    /// replacement happened.
    pub fn refresh(&self, report: &Value) -> bool {
        let Some(ids) = extract_model_ids(report) else {
            return false;
        };

        let incoming: Vec<String> = if ids.is_empty() {
            vec![PLACEHOLDER_NO_MODELS.to_string()]
        } else {
            ids.into_iter().sorted().collect()
        };

        let mut models = self.models.lock();
        if *models == incoming {
            return false;
        }
        info!(count = incoming.len(), "updating TIPO model list from backend");
        *models = incoming;
        true
    }

    /// A copy of the current list in presentation order (reversed, so the
    /// newest model revisions list first).
    pub fn snapshot(&self) -> Vec<String> {
        self.models.lock().iter().rev().cloned().collect()
    }
}

/// Walks the fixed `TIPO.input.required.tipo_model` path, expecting the
/// backend's array-of-array-of-strings input declaration.
fn extract_model_ids(report: &Value) -> Option<Vec<String>> {
    let declaration = report
        .get("TIPO")?
        .get("input")?
        .get("required")?
        .get("tipo_model")?
        .as_array()?;
    let ids = declaration.first()?.as_array()?;
    Some(
        ids.iter()
            .filter_map(|id| id.as_str().map(str::to_string))
            .collect(),
    )
}
