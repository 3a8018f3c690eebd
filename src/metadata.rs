//! Backend metadata interception.
//!
//! When the backend executes the provenance node inserted by the build
//! stage, it reports the generated prompt text back under a reserved key.
//! The handler here substitutes that text into the recorded request state so
//! saved artifacts carry the prompt the image was actually made from, while
//! preserving what the user originally typed.

use tracing::debug;

use crate::host::MetadataHandler;
use crate::params::{GenerationRequest, ParamValue, core};

/// Reserved metadata key carrying the backend-generated prompt text.
pub const TIPO_PROMPT_KEY: &str = "tipo_prompt";

/// Provenance slot the user's original prompt is preserved under.
pub const ORIGINAL_PROMPT_KEY: &str = "original_prompt";

/// Substitutes the TIPO-generated prompt into the request's recorded state.
#[derive(Debug, Clone, Copy, Default)]
pub struct TipoMetadataHandler;

impl MetadataHandler for TipoMetadataHandler {
    fn handle(&self, request: &mut GenerationRequest, key: &str, value: &str) -> bool {
        if key != TIPO_PROMPT_KEY {
            return false;
        }

        let current = request
            .get(core::PROMPT)
            .and_then(|v| v.as_text().map(str::to_string))
            .unwrap_or_default();

        // First write wins; an already-captured original is never replaced,
        // and an empty prompt is never worth capturing.
        if !current.is_empty() && !request.has_extra_meta(ORIGINAL_PROMPT_KEY) {
            request.set_extra_meta(ORIGINAL_PROMPT_KEY, ParamValue::from(current));
        }

        request.set(core::PROMPT, ParamValue::from(value));
        debug!("substituted TIPO-generated prompt into request state");
        true
    }
}
