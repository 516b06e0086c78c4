mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hairdresser_config::Config;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::commands::{Settings, Stack};
use crate::error::CliError;

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Completions don't need a manifest
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "hairdresser", &mut std::io::stdout());
            Ok(())
        }

        Command::Render(args) => {
            let config = load(&cli.global)?;
            let settings = Settings::resolve(&cli.global, &config)?;
            let stack = Stack::build(&config, &args)?;
            commands::render::handle(&stack, &settings)
        }

        Command::Inspect(args) => {
            let config = load(&cli.global)?;
            let settings = Settings::resolve(&cli.global, &config)?;
            let stack = Stack::build(&config, &args)?;
            commands::inspect::handle(&stack, &settings)
        }
    }
}

/// Load the manifest named on the command line, or the one at the default path.
fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let config = match &global.manifest {
        Some(path) => hairdresser_config::load_manifest(path)?,
        None => hairdresser_config::load_config()?,
    };
    tracing::debug!(overrides = config.overrides.len(), "manifest ready");
    Ok(config)
}
