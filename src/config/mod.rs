//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::CliArgs;

const LOCAL_CONFIG_BASENAME: &str = "renderform";
const ENV_PREFIX: &str = "RENDERFORM";
pub const DEFAULT_RENDER_ENDPOINT: &str = "https://get.renderform.io/api/v2/render";

/// Fully-resolved run settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub render: RenderSettings,
    pub batch: BatchSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub api_key: String,
    /// Run-wide template; takes precedence over a descriptor's own template.
    pub template: Option<String>,
    pub endpoint: Url,
    /// When false every request carries a fresh `version` token.
    pub use_cache: bool,
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub target: Option<PathBuf>,
    pub overwrite: bool,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Parse the process arguments and resolve the settings they select.
pub fn load_from_args() -> Result<Settings, LoadError> {
    load(&CliArgs::parse())
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder =
        Config::builder().add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_cli_overrides(cli);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    render: RawRenderSettings,
    batch: RawBatchSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    api_key: Option<String>,
    template: Option<String>,
    endpoint: Option<String>,
    use_cache: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBatchSettings {
    target: Option<PathBuf>,
    overwrite: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
    debug: Option<bool>,
}

impl RawSettings {
    fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        if let Some(key) = cli.api_key.as_ref() {
            self.render.api_key = Some(key.clone());
        }
        if let Some(template) = cli.template.as_ref() {
            self.render.template = Some(template.clone());
        }
        if let Some(endpoint) = cli.endpoint.as_ref() {
            self.render.endpoint = Some(endpoint.clone());
        }
        if let Some(use_cache) = cli.use_cache() {
            self.render.use_cache = Some(use_cache);
        }
        if let Some(target) = cli.target() {
            self.batch.target = Some(target);
        }
        if cli.overwrite {
            self.batch.overwrite = Some(true);
        }
        if let Some(level) = cli.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = cli.log_json {
            self.logging.json = Some(json);
        }
        if cli.debug {
            self.logging.debug = Some(true);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            render,
            batch,
            logging,
        } = raw;

        let render = build_render_settings(render)?;
        let batch = build_batch_settings(batch);
        let logging = build_logging_settings(logging)?;

        Ok(Self {
            render,
            batch,
            logging,
        })
    }
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let api_key = non_blank(render.api_key).ok_or_else(|| {
        LoadError::invalid(
            "render.api_key",
            "an API key is required (use --api-key or RENDERFORM_API_KEY)",
        )
    })?;

    let template = non_blank(render.template);

    let endpoint_value = render
        .endpoint
        .unwrap_or_else(|| DEFAULT_RENDER_ENDPOINT.to_string());
    let endpoint = Url::parse(endpoint_value.trim())
        .map_err(|err| LoadError::invalid("render.endpoint", format!("failed to parse: {err}")))?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "render.endpoint",
            "scheme must be http or https",
        ));
    }

    Ok(RenderSettings {
        api_key,
        template,
        endpoint,
        use_cache: render.use_cache.unwrap_or(false),
    })
}

fn build_batch_settings(batch: RawBatchSettings) -> BatchSettings {
    let target = batch
        .target
        .filter(|path| !path.as_os_str().is_empty());

    BatchSettings {
        target,
        overwrite: batch.overwrite.unwrap_or(false),
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = if logging.debug.unwrap_or(false) {
        LevelFilter::DEBUG
    } else {
        match logging.level {
            Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
                LoadError::invalid("logging.level", format!("failed to parse: {err}"))
            })?,
            None => LevelFilter::INFO,
        }
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
