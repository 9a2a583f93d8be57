// CLI definitions using clap

use clap::{Parser, Subcommand};
use framework_rgb::AnimationKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "framework-rgb")]
#[command(author, version, about = "Framework Desktop RGB fan control")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/framework-rgb/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// EC device node (default: /dev/cros_ec)
    #[arg(long, global = true, value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // === Query Commands ===
    /// List configured presets
    #[command(visible_alias = "ls")]
    List,

    /// Show the colors and animation of a preset
    Show {
        /// Preset name (case-insensitive)
        name: String,
    },

    /// Print the config file path
    ConfigPath,

    // === Apply Commands ===
    /// Apply a preset to the fan
    ///
    /// Looping animations (Breathe, GradientSweep) keep running until Ctrl-C.
    #[command(visible_alias = "a")]
    Apply {
        /// Preset name (case-insensitive)
        name: String,
        /// Don't record the preset as the last applied one
        #[arg(long)]
        no_save: bool,
    },

    /// Apply ad-hoc colors without touching the config
    Set {
        /// Colors as hex (#rrggbb, 0xrrggbb or rrggbb); 8 for Static
        #[arg(required = true, num_args = 1..)]
        colors: Vec<String>,
        /// Animation (Static, Breathe, GradientSweep)
        #[arg(short, long, default_value = "Static", value_parser = parse_animation)]
        animation: AnimationKind,
    },

    /// Re-apply the last preset, retrying while the EC is unavailable
    Restore,

    /// Render a preset in the terminal instead of on the fan
    Preview {
        /// Preset name (case-insensitive)
        name: String,
        /// How long to run looping animations
        #[arg(short, long, default_value = "5")]
        seconds: u64,
    },
}

fn parse_animation(s: &str) -> Result<AnimationKind, String> {
    s.parse()
}
