//! Command handlers for the CLI application.
//!
//! - `query`: read-only commands (list, show, config-path)
//! - `apply`: commands that drive the fan (apply, set, restore, preview)

pub mod apply;
pub mod query;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crosec_transport::{CancelToken, CrosEcDevice, SharedDevice};
use framework_rgb::config::{self, AppConfig, ConfigStore};
use framework_rgb::RgbController;
use tracing::debug;

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Set up a Ctrl-C handler that cancels the returned token.
pub fn setup_interrupt_handler() -> CancelToken {
    let cancel = CancelToken::new();
    let handler_cancel = cancel.clone();

    ctrlc::set_handler(move || {
        handler_cancel.cancel();
    })
    .ok();

    cancel
}

/// Resolve the config path from `--config` or the default location
pub fn config_store(path: Option<PathBuf>) -> ConfigStore {
    ConfigStore::new(path.unwrap_or_else(config::default_config_path))
}

/// Load the config, creating the default file on first use
pub fn load_config(store: &ConfigStore) -> anyhow::Result<AppConfig> {
    store
        .load()
        .with_context(|| format!("loading {}", store.path().display()))
}

/// The EC device from `--device`, or the platform default
pub fn open_device(path: Option<&Path>) -> SharedDevice {
    let device = match path {
        Some(path) => CrosEcDevice::with_path(path),
        None => CrosEcDevice::new(),
    };
    debug!("Using EC device {}", device.path().display());
    Arc::new(device)
}

pub fn controller(device: Option<&Path>) -> RgbController {
    RgbController::new(open_device(device))
}

/// Block while a looping animation runs, until Ctrl-C or the loop ends
pub fn hold_animation(controller: &RgbController, cancel: &CancelToken) {
    if !controller.is_animating() {
        return;
    }

    println!("Animating, press Ctrl-C to stop");
    while !cancel.wait_timeout(Duration::from_millis(250)) {
        if !controller.is_animating() {
            break;
        }
    }
    controller.stop();
}
