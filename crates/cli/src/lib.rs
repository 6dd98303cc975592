pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::CommandResult;

/// Operator tooling for a Hipfrog deployment.
#[derive(Debug, Parser)]
#[command(
    name = "hipfrog",
    version,
    about = "Hipfrog operator CLI",
    after_help = "Examples:\n  hipfrog migrate\n  hipfrog doctor --json\n  hipfrog installations"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations to the installation store
    Migrate,
    /// Print effective configuration and where each value came from
    Config,
    /// Check configuration, public URL and schema state before going live
    Doctor {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List chat installations and whether each has a GlassFrog token
    Installations,
}

impl Command {
    fn execute(self) -> CommandResult {
        match self {
            Self::Migrate => commands::migrate::run(),
            Self::Config => CommandResult { exit_code: 0, output: commands::config::run() },
            Self::Doctor { json } => commands::doctor::run(json),
            Self::Installations => commands::installations::run(),
        }
    }
}

pub fn run() -> ExitCode {
    let result = Cli::parse().command.execute();
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
