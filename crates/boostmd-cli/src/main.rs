mod cli;
mod error;
mod input;
mod logging;
mod progress;

use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::progress::ChunkProgressHandler;
use boostmd::engine::build_engine;
use boostmd::runner::progress::ProgressReporter;
use boostmd::runner::{RunSummary, Runner};
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    match run_app(cli) {
        Ok(summary) => {
            info!("Run completed successfully.");
            println!(
                "Run complete: {} chunk(s) executed, final step {}.",
                summary.chunks_completed, summary.final_step
            );
        }
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn run_app(cli: Cli) -> Result<RunSummary> {
    info!("BoostMD v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let file_type = cli.input_file_type.parse().map_err(CliError::Argument)?;
    let config = input::load_config(&cli.input_file, file_type)?;
    info!(
        variant = %config.boost_variant,
        total_steps = config.total_steps,
        chunk_size = config.chunk_size,
        "Configuration loaded"
    );

    let engine = build_engine(&config);
    let handler = ChunkProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.callback());

    let mut runner = Runner::new(config, engine);
    let summary = runner.run(cli.restart, &reporter)?;
    Ok(summary)
}
