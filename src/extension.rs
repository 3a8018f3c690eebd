//! Plugin registration.
//!
//! [`TipoExtension`] is the one-shot entry point: handed the host's
//! extension-point bundle at initialization, it registers the parameter
//! group and its parameters, the capability parser feeding the model
//! registry, the metadata handler, the workflow-build stage, and the
//! install affordance.

use std::sync::Arc;

use tracing::info;

use crate::error::CatalogError;
use crate::host::{HostRegistries, InstallableFeature};
use crate::install;
use crate::metadata::TipoMetadataHandler;
use crate::params::{ParamCatalog, ParamDefinition, ParamGroup, ViewHint};
use crate::registry::TipoModelRegistry;
use crate::stage::TipoStage;

/// Feature id the backend advertises when the TIPO custom node is installed.
pub const TIPO_FEATURE: &str = "tipo_prompt_generation";

/// Class name of the backend node this plugin injects.
pub const TIPO_NODE_CLASS: &str = "TIPO";

/// Class name of the provenance node pairing a metadata key with a link.
pub const SAVE_METADATA_NODE_CLASS: &str = "SwarmAddSaveMetadataWS";

/// Id of the parameter group registered by this plugin.
pub const TIPO_GROUP: &str = "tipo";

/// Default output format template; the extended section is natural language.
pub const DEFAULT_FORMAT: &str = "<|special|>,\n<|characters|>, <|copyrights|>,\n<|artist|>,\n\n<|general|>,\n\n<|extended|>.\n\n<|quality|>, <|meta|>, <|rating|>";

/// Parameter ids registered by this plugin.
pub mod param {
    pub const PROMPT_TYPE: &str = "tipo_prompt_type";
    pub const BAN_TAGS: &str = "tipo_ban_tags";
    pub const MODEL: &str = "tipo_model";
    pub const FORMAT: &str = "tipo_format";
    pub const NO_FORMATTING: &str = "tipo_no_formatting";
    pub const TEMPERATURE: &str = "tipo_temperature";
    pub const TOP_P: &str = "tipo_top_p";
    pub const MIN_P: &str = "tipo_min_p";
    pub const TOP_K: &str = "tipo_top_k";
    pub const TAG_LENGTH: &str = "tipo_tag_length";
    pub const NL_LENGTH: &str = "tipo_nl_length";
    pub const SEED: &str = "tipo_seed";
    pub const DEVICE: &str = "tipo_device";
}

const LENGTH_CHOICES: &[&str] = &["very_short", "short", "long", "very_long"];

/// The plugin itself: owns the shared model registry and the stage
/// configuration until registration hands them to the host.
pub struct TipoExtension {
    models: Arc<TipoModelRegistry>,
    stage: TipoStage,
}

impl Default for TipoExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl TipoExtension {
    pub fn new() -> Self {
        Self {
            models: Arc::new(TipoModelRegistry::new()),
            stage: TipoStage::new(),
        }
    }

    /// Replaces the default stage configuration.
    pub fn with_stage(mut self, stage: TipoStage) -> Self {
        self.stage = stage;
        self
    }

    /// A handle on the shared model registry, e.g. for tests or for hosts
    /// that refresh capabilities through their own channel.
    pub fn models(&self) -> Arc<TipoModelRegistry> {
        Arc::clone(&self.models)
    }

    /// Registers every TIPO concern into the host's extension points.
    pub fn register(self, host: &mut HostRegistries) -> Result<(), CatalogError> {
        info!("loading TIPO prompt generation extension");

        host.installable_features.push(InstallableFeature {
            display_name: "TIPO".to_string(),
            feature_id: TIPO_FEATURE.to_string(),
            source_url: "https://github.com/KohakuBlueleaf/z-tipo-extension".to_string(),
            author: "KohakuBlueleaf".to_string(),
            notice: "This will install TIPO developed by KohakuBlueleaf.\nDo you wish to install?"
                .to_string(),
        });
        host.script_files
            .push(install::INSTALL_SCRIPT_PATH.to_string());
        host.node_features
            .insert(TIPO_NODE_CLASS.to_string(), TIPO_FEATURE.to_string());

        self.register_params(&mut host.catalog)?;

        let models = Arc::clone(&self.models);
        host.capability_parsers
            .add_parser(Box::new(move |report: &serde_json::Value| {
                models.refresh(report);
            }));
        host.metadata_handlers
            .add_handler(Box::new(TipoMetadataHandler));
        host.steps.add_step(Box::new(self.stage));
        Ok(())
    }

    fn register_params(&self, catalog: &mut ParamCatalog) -> Result<(), CatalogError> {
        catalog.register_group(ParamGroup {
            id: TIPO_GROUP.to_string(),
            name: "TIPO Prompt Generation".to_string(),
            description: "Use TIPO to upsample the main prompt before image synthesis.".to_string(),
            toggles: true,
            open: false,
            advanced: false,
            order_priority: 50.0,
            feature_flag: Some(TIPO_FEATURE.to_string()),
        })?;

        catalog.register(
            ParamDefinition::text(
                param::PROMPT_TYPE,
                "[TIPO] Prompt Type",
                "Treat the main prompt as 'tags' or 'natural language'.",
            )
            .with_default("tags")
            .with_values(&["tags", "natural language"])
            .in_group(TIPO_GROUP)
            .with_feature_flag(TIPO_FEATURE)
            .with_order(2.0),
        )?;

        catalog.register(
            ParamDefinition::text(
                param::BAN_TAGS,
                "[TIPO] Banned Tags",
                "Comma-separated list of tags to ban.",
            )
            .in_group(TIPO_GROUP)
            .with_feature_flag(TIPO_FEATURE)
            .with_view(ViewHint::Prompt)
            .with_order(3.0),
        )?;

        let models = Arc::clone(&self.models);
        catalog.register(
            ParamDefinition::text(
                param::MODEL,
                "[TIPO] TIPO Model",
                "TIPO model to use. 500m-ft is recommended.",
            )
            .with_dynamic_values(move || models.snapshot())
            .in_group(TIPO_GROUP)
            .with_feature_flag(TIPO_FEATURE)
            .with_order(4.0),
        )?;

        catalog.register(
            ParamDefinition::text(
                param::FORMAT,
                "[TIPO] Format",
                "TIPO output format string. Extended is natural language.",
            )
            .with_default(DEFAULT_FORMAT)
            .in_group(TIPO_GROUP)
            .with_feature_flag(TIPO_FEATURE)
            .with_view(ViewHint::Prompt)
            .with_order(5.0)
            .toggleable(),
        )?;

        catalog.register(
            ParamDefinition::boolean(
                param::NO_FORMATTING,
                "[TIPO] No Formatting",
                "Use unformatted TIPO output.",
                false,
            )
            .in_group(TIPO_GROUP)
            .with_feature_flag(TIPO_FEATURE)
            .with_order(5.5)
            .ignore_if_default(),
        )?;

        catalog.register(
            ParamDefinition::double(
                param::TEMPERATURE,
                "[TIPO] Temperature",
                "TIPO sampling temperature. Higher = more random outputs.",
                0.5,
            )
            .with_range(0.0, 2.0, 0.01)
            .in_group(TIPO_GROUP)
            .with_feature_flag(TIPO_FEATURE)
            .with_view(ViewHint::Slider)
            .with_order(6.0)
            .advanced(),
        )?;

        catalog.register(
            ParamDefinition::double(param::TOP_P, "[TIPO] Top P", "TIPO sampling Top P.", 0.95)
                .with_range(0.0, 1.0, 0.01)
                .in_group(TIPO_GROUP)
                .with_feature_flag(TIPO_FEATURE)
                .with_view(ViewHint::Slider)
                .with_order(7.0)
                .advanced(),
        )?;

        catalog.register(
            ParamDefinition::double(param::MIN_P, "[TIPO] Min P", "TIPO sampling Min P.", 0.05)
                .with_range(0.0, 1.0, 0.01)
                .in_group(TIPO_GROUP)
                .with_feature_flag(TIPO_FEATURE)
                .with_view(ViewHint::Slider)
                .with_order(8.0)
                .advanced(),
        )?;

        catalog.register(
            ParamDefinition::integer(param::TOP_K, "[TIPO] Top K", "TIPO sampling Top K.", 80)
                .with_range(0.0, 200.0, 1.0)
                .in_group(TIPO_GROUP)
                .with_feature_flag(TIPO_FEATURE)
                .with_view(ViewHint::Slider)
                .with_order(9.0)
                .advanced(),
        )?;

        catalog.register(
            ParamDefinition::text(param::TAG_LENGTH, "[TIPO] Tag Length", "Target tag length.")
                .with_default("long")
                .with_values(LENGTH_CHOICES)
                .in_group(TIPO_GROUP)
                .with_feature_flag(TIPO_FEATURE)
                .with_order(10.0),
        )?;

        catalog.register(
            ParamDefinition::text(
                param::NL_LENGTH,
                "[TIPO] NL Length",
                "Target natural language length.",
            )
            .with_default("long")
            .with_values(LENGTH_CHOICES)
            .in_group(TIPO_GROUP)
            .with_feature_flag(TIPO_FEATURE)
            .with_order(11.0),
        )?;

        catalog.register(
            ParamDefinition::long(
                param::SEED,
                "[TIPO] Seed",
                "TIPO generation seed. Use -1 for random; uses the image generation seed when left disabled.",
                -1,
            )
            .with_range(-1.0, i64::MAX as f64, 1.0)
            .in_group(TIPO_GROUP)
            .with_feature_flag(TIPO_FEATURE)
            .with_view(ViewHint::Seed)
            .with_order(12.0)
            .toggleable(),
        )?;

        catalog.register(
            ParamDefinition::text(
                param::DEVICE,
                "[TIPO] Device",
                "Device override for TIPO.\nDefault is cpu because cuda has reproducibility issues.",
            )
            .with_default("cpu")
            .with_values(&["cuda", "cpu"])
            .in_group(TIPO_GROUP)
            .with_feature_flag(TIPO_FEATURE)
            .with_order(13.0)
            .advanced(),
        )?;

        Ok(())
    }
}
