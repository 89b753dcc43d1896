use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    filter::LevelFilter,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

/// Crates whose own tracing would drown the request/response trace under `--debug`.
const QUIET_DEPENDENCIES: &[&str] = &["hyper=info", "hyper_util=info", "reqwest=info", "rustls=info"];

/// Install a global tracing subscriber using the provided logging settings.
///
/// Every layer writes to stderr. Stdout belongs to the `Render:` / `Skipping:`
/// progress lines, so a run can be piped or diffed with logging at any level.
/// An explicit `RUST_LOG` replaces the level-derived filter entirely.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    let env_filter = build_filter(
        logging.level,
        std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
    )?;

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn build_filter(level: LevelFilter, env: Option<&str>) -> Result<EnvFilter, InfraError> {
    let builder = EnvFilter::builder().with_default_directive(level.into());
    if let Some(directives) = env.filter(|value| !value.trim().is_empty()) {
        return Ok(builder.parse_lossy(directives));
    }

    let mut filter = builder.parse_lossy("");
    if level > LevelFilter::INFO {
        for directive in QUIET_DEPENDENCIES {
            let directive = directive.parse().map_err(|err| {
                InfraError::telemetry(format!("invalid log directive `{directive}`: {err}"))
            })?;
            filter = filter.add_directive(directive);
        }
    }
    Ok(filter)
}
