mod cli;
mod commands;
mod config;
mod viewer;

use clap::Parser;

use cli::{Cli, Command, RunArgs};

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // wgpu is chatty at info
    let filter = format!("{default},wgpu_core=warn,wgpu_hal=warn,naga=warn");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        None => commands::run_cmd::run(RunArgs::default(), config::detect_project_context()?),
        Some(Command::Run(args)) => {
            let ctx = match args.config {
                Some(_) => None,
                None => config::detect_project_context()?,
            };
            commands::run_cmd::run(args, ctx)
        }
        Some(Command::Inspect { model }) => {
            let actor = config::detect_project_context()?
                .map(|ctx| ctx.config.stage.actor)
                .unwrap_or_default();
            commands::inspect_cmd::run(&model, &actor)
        }
        Some(Command::Init { dir, model, force }) => {
            commands::init_cmd::run(&dir, &model, force).map(|_| ())
        }
    }
}
