use std::process;

use renderform::{
    application::{BatchRunner, error::AppError},
    config,
    infra::telemetry,
    presentation::ConsoleProgress,
};
use tracing::{dispatcher, error};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "batch aborted");
    }

    eprintln!("{error}");
    for cause in error.causes() {
        eprintln!("  caused by: {cause}");
    }
    if let Some(payload) = error.remote_payload() {
        eprintln!("{payload}");
    }
}

async fn run() -> Result<(), AppError> {
    let settings = config::load_from_args()?;
    telemetry::init(&settings.logging)?;

    let runner = BatchRunner::from_settings(&settings)?;
    let progress = ConsoleProgress;
    runner
        .run(settings.batch.target.as_deref(), &progress)
        .await?;

    progress.finished();
    Ok(())
}
