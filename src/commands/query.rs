//! Query (read-only) command handlers.

use anyhow::anyhow;
use framework_rgb::color;
use framework_rgb::config::ConfigStore;

use super::{load_config, CommandResult};

/// List presets, marking the last applied one
pub fn list(store: &ConfigStore) -> CommandResult {
    let config = load_config(store)?;
    let last = config.last_preset().map(|p| p.name.as_str());

    println!("Presets ({}):", config.presets.len());
    for preset in &config.presets {
        let marker = if Some(preset.name.as_str()) == last {
            "*"
        } else {
            " "
        };
        println!(
            " {marker} {:<20} {:<14} {} colors",
            preset.name,
            preset.animation.name(),
            preset.colors.len()
        );
    }
    Ok(())
}

/// Show one preset's colors
pub fn show(store: &ConfigStore, name: &str) -> CommandResult {
    let config = load_config(store)?;
    let preset = config
        .find_preset(name)
        .ok_or_else(|| anyhow!("no preset named '{name}'"))?;

    println!("Preset:    {}", preset.name);
    println!("Animation: {}", preset.animation);
    for (i, text) in preset.colors.iter().enumerate() {
        match color::normalize(text) {
            Ok(canonical) => println!("  LED {i}: {canonical}"),
            Err(_) => println!("  LED {i}: {text} (invalid)"),
        }
    }
    Ok(())
}

pub fn config_path(store: &ConfigStore) -> CommandResult {
    println!("{}", store.path().display());
    Ok(())
}
