//! `layerdesk` command-line entry point.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// LayerDesk project tools.
#[derive(Parser, Debug)]
#[command(name = "layerdesk", version, about = "LayerDesk project tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that resetting every layer restores its baseline exactly, and
    /// write a JSON report.
    ValidateReset {
        /// Project JSON file.
        #[arg(long, value_name = "FILE")]
        project: PathBuf,
        /// Directory for the report.
        #[arg(long, value_name = "DIR", default_value = layerdesk_app::DEFAULT_REPORT_DIR)]
        out: PathBuf,
        /// Editor configuration JSON file.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::ValidateReset { project, out, config } => {
            let result = layerdesk_app::load_config(config.as_deref())
                .and_then(|config| layerdesk_app::validate_reset(&project, &out, config));
            match result {
                Ok((path, report)) => {
                    println!("written: {}", path.display());
                    if report.passed() {
                        ExitCode::SUCCESS
                    } else {
                        log::warn!("{} layer(s) failed the reset check", report.failures());
                        ExitCode::FAILURE
                    }
                }
                Err(e) => {
                    log::error!("validate-reset failed: {}", e);
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
