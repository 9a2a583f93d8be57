//! Commands that drive the fan.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail};
use framework_rgb::config::ConfigStore;
use framework_rgb::{AnimationKind, Preset, RgbController, TerminalPreview};
use tracing::info;

use super::{controller, hold_animation, load_config, setup_interrupt_handler, CommandResult};

/// Apply a configured preset, recording it as the last one on success
pub fn apply(
    store: &ConfigStore,
    device: Option<&Path>,
    name: &str,
    no_save: bool,
) -> CommandResult {
    let mut config = load_config(store)?;
    let preset = config
        .find_preset(name)
        .cloned()
        .ok_or_else(|| anyhow!("no preset named '{name}' (see `framework-rgb list`)"))?;

    let cancel = setup_interrupt_handler();
    let controller = controller(device);
    controller
        .apply_preset(&preset, &cancel)
        .into_result()
        .map_err(|e| anyhow!(e))?;
    println!("Applied '{}' ({})", preset.name, preset.animation);

    if !no_save {
        config.last_preset_name = Some(preset.name.clone());
        store.save(&config)?;
    }

    hold_animation(&controller, &cancel);
    Ok(())
}

/// Apply colors given on the command line
pub fn set(device: Option<&Path>, colors: Vec<String>, animation: AnimationKind) -> CommandResult {
    let preset = Preset::new("Custom", colors, animation);
    let cancel = setup_interrupt_handler();
    let controller = controller(device);
    controller
        .apply_preset(&preset, &cancel)
        .into_result()
        .map_err(|e| anyhow!(e))?;
    println!("Applied {} colors ({})", preset.colors.len(), animation);

    hold_animation(&controller, &cancel);
    Ok(())
}

/// Re-apply the last preset with the configured retry policy
pub fn restore(store: &ConfigStore, device: Option<&Path>) -> CommandResult {
    let config = load_config(store)?;
    let Some(preset) = config.last_preset() else {
        match config.last_preset_name.as_deref() {
            Some(name) => bail!("last preset '{name}' is no longer configured"),
            None => {
                println!("No preset applied yet, nothing to restore");
                return Ok(());
            }
        }
    };

    info!(
        "Restoring '{}' ({} attempts, {:?} apart)",
        preset.name,
        config.retry_attempts(),
        config.retry_delay()
    );
    let cancel = setup_interrupt_handler();
    let controller = controller(device);
    controller
        .apply_with_retry(preset, &cancel, config.retry_attempts(), config.retry_delay())
        .into_result()
        .map_err(|e| anyhow!(e))?;
    println!("Restored '{}'", preset.name);

    hold_animation(&controller, &cancel);
    Ok(())
}

/// Run a preset against the terminal preview
pub fn preview(store: &ConfigStore, name: &str, seconds: u64) -> CommandResult {
    let config = load_config(store)?;
    let preset = config
        .find_preset(name)
        .ok_or_else(|| anyhow!("no preset named '{name}' (see `framework-rgb list`)"))?;

    let screen = TerminalPreview::stdout(preset.name.clone());
    let cancel = setup_interrupt_handler();
    let controller = RgbController::new(Arc::new(screen.clone()));
    let result = controller.apply_preset(preset, &cancel);

    if result.succeeded() && controller.is_animating() {
        cancel.wait_timeout(Duration::from_secs(seconds));
        controller.stop();
    }
    screen.finish()?;

    result.into_result().map_err(|e| anyhow!(e))
}
