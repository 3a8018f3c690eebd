//! Install-affordance boundary contract.
//!
//! The browser-side script shipped at [`INSTALL_SCRIPT_PATH`] polls the
//! client-visible feature set on a fixed interval and keeps exactly one
//! install-trigger button mounted inside the TIPO group container while the
//! backend capability is missing. The loop is idempotent and treats an
//! absent container as "UI not built yet", retrying on the next tick.

/// Mount point: the content element the host renders for the TIPO group.
pub const INSTALL_CONTAINER_ID: &str = "input_group_content_tipopromptgeneration";

/// Id of the install-trigger control the script manages.
pub const INSTALL_BUTTON_ID: &str = "tipo_prompt_generation_install_button";

/// Polling cadence of the script, in milliseconds.
pub const INSTALL_POLL_INTERVAL_MS: u64 = 1000;

/// Path of the script asset, relative to the plugin root.
pub const INSTALL_SCRIPT_PATH: &str = "assets/tipo.js";
