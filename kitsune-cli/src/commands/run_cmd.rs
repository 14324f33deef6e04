use std::path::PathBuf;

use kitsune_runtime::{MovementPolicy, StageConfig};

use crate::cli::RunArgs;
use crate::config::{load_config, ProjectContext, ViewerConfig};
use crate::viewer::{self, ViewerOptions};

pub fn run(args: RunArgs, ctx: Option<ProjectContext>) -> anyhow::Result<()> {
    let options = resolve_options(args, ctx)?;
    log::info!("opening {}", options.model.display());
    viewer::run(options)
}

/// Merge kitsune.toml (explicit `--config`, else the discovered one) with
/// command-line flags. Flags win.
pub fn resolve_options(args: RunArgs, ctx: Option<ProjectContext>) -> anyhow::Result<ViewerOptions> {
    let (config, config_model): (ViewerConfig, Option<PathBuf>) = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            let root = path.parent().map(PathBuf::from).unwrap_or_default();
            let model = config.model.as_ref().map(|m| root.join(m));
            (config, model)
        }
        None => match ctx {
            Some(ctx) => {
                let model = ctx.model_path();
                (ctx.config, model)
            }
            None => (ViewerConfig::default(), None),
        },
    };

    let Some(model) = args.model.or(config_model) else {
        anyhow::bail!(
            "No model to load.\n\
             Pass one: kitsune run path/to/Fox.glb\n\
             or set `model` in kitsune.toml (kitsune init writes a starter)"
        );
    };

    let mut stage: StageConfig = config.stage;
    if let Some(speed) = args.per_second {
        stage.actor.movement = MovementPolicy::PerSecond(speed);
    }
    if let Some(distance) = args.per_frame {
        stage.actor.movement = MovementPolicy::PerFrame(distance);
    }
    if args.release_on_blur {
        stage.release_keys_on_blur = true;
    }
    if args.no_shadows {
        stage.lighting.shadows = false;
    }
    if let Some(i) = args.idle_clip {
        stage.actor.idle_clip = i;
    }
    if let Some(i) = args.walk_clip {
        stage.actor.walk_clip = i;
    }

    Ok(ViewerOptions {
        model,
        window: config.window,
        stage,
    })
}
