use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "kitsune",
    about = "Arrow-key driven glTF character viewer",
    version,
    arg_required_else_help = false
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the viewer window (default when no subcommand is given)
    Run(RunArgs),
    /// Print the hierarchy, skin and clips of a model
    Inspect {
        /// Path to a .gltf or .glb file
        model: PathBuf,
    },
    /// Write a starter kitsune.toml
    Init {
        /// Directory to write into
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Model path to put in the config
        #[arg(long, default_value = "Fox.glb")]
        model: String,
        /// Overwrite an existing kitsune.toml
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Model to load. Defaults to `model` from kitsune.toml
    pub model: Option<PathBuf>,
    /// Use this config file instead of searching for kitsune.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Move this many units per second instead of a fixed step per frame
    #[arg(long, value_name = "UNITS")]
    pub per_second: Option<f32>,
    /// Fixed distance per frame
    #[arg(long, value_name = "UNITS", conflicts_with = "per_second")]
    pub per_frame: Option<f32>,
    /// Release held arrow keys when the window loses focus
    #[arg(long)]
    pub release_on_blur: bool,
    /// Disable the shadow pass
    #[arg(long)]
    pub no_shadows: bool,
    /// Index of the idle clip
    #[arg(long)]
    pub idle_clip: Option<usize>,
    /// Index of the walk clip
    #[arg(long)]
    pub walk_clip: Option<usize>,
}
