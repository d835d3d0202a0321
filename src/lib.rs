pub mod commands;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use error::{OcrError, Result};
pub use models::image_ref::ImageRef;
pub use models::ocr_result::{FilteredLine, RecognitionResult};
pub use models::session::SessionState;
pub use services::ocr::{filter_text, EngineHandle, EngineState, RecognitionEngine};
pub use services::session::{RecognitionOutcome, SessionController};

use clap::Parser;
use commands::{Cli, Command};
use std::process::ExitCode;

/// Entry point of the `ocr-reader` binary
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    let manager = commands::config::config_manager(cli.config)?;

    match cli.command {
        Command::Config { action } => {
            // Logging uses defaults here; `show` reports a broken file as an error
            logging::init_logging(&models::config::LoggingConfig::default());
            println!("{}", commands::config::run(&manager, action)?);
            Ok(())
        }
        Command::Recognize { image, json } => {
            let config = commands::config::load_config(&manager)?;
            logging::init_logging(&config.logging);
            tracing::info!(
                language = %config.language,
                backend = ?config.engine.backend,
                "starting recognition"
            );

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                let session = SessionController::from_config(&config);
                let mut stdout = std::io::stdout().lock();
                commands::session::recognize_file(&session, &image, json, &mut stdout)
                    .await
                    .map(|_| ())
            })
        }
    }
}
