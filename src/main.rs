use anyhow::Result;
use clap::Parser;
use log::{error, info};
use resource_cloner::cli::{self, Cli, ConsoleObserver};
use resource_cloner::config::EnvConfig;
use resource_cloner::migration::Orchestrator;
use std::process::ExitCode;

const LOG_FILE: &str = "resource-cloner.log";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(LOG_FILE)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let args = Cli::parse();
    info!("Starting resource-cloner {}", env!("CARGO_PKG_VERSION"));

    let mut config = match EnvConfig::load(&args.env_file) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            eprintln!("Configuration error: {:#}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    if let Some(output_dir) = args.output_dir {
        config = config.with_output_dir(output_dir);
    }

    cli::output::print_header(
        &config.source.tenant,
        &config.destination.tenant,
        &format!("{} v{}", config.questionnaire.id, config.questionnaire.version),
    );

    let orchestrator = Orchestrator::new(config)?;
    let mut observer = ConsoleObserver;

    match orchestrator.run(&mut observer).await {
        Ok(report) => {
            cli::output::print_report(&report, orchestrator.artifacts().dir());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("{}", e);
            cli::output::print_failure(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}
