use std::path::PathBuf;

use clap::{Parser, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the renderform binary.
#[derive(Debug, Parser, Default)]
#[command(
    name = "renderform",
    version,
    about = "Render every RenderForm descriptor found under a directory"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "RENDERFORM_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// RenderForm API key.
    #[arg(
        long = "api-key",
        alias = "apiKey",
        env = "RENDERFORM_API_KEY",
        hide_env_values = true,
        value_name = "KEY"
    )]
    pub api_key: Option<String>,

    /// Template id used for every descriptor; descriptors may name their own otherwise.
    #[arg(long, value_name = "ID")]
    pub template: Option<String>,

    /// Override the render endpoint URL.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Reuse renders cached by the service (no version token is sent).
    #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with = "no_cache")]
    pub cache: bool,

    /// Force a fresh render for every descriptor (default).
    #[arg(long = "no-cache", action = clap::ArgAction::SetTrue)]
    pub no_cache: bool,

    /// Re-render descriptors that already have an output image.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub overwrite: bool,

    /// Trace request headers, bodies and resolved paths.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub debug: bool,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Directory to scan for descriptors; when several are given the last one wins.
    #[arg(value_name = "DIRECTORY", value_hint = ValueHint::DirPath)]
    pub directories: Vec<PathBuf>,
}

impl CliArgs {
    /// The directory the batch should scan, if one was supplied.
    pub fn target(&self) -> Option<PathBuf> {
        self.directories
            .last()
            .filter(|path| !path.as_os_str().is_empty())
            .cloned()
    }

    /// Cache preference expressed on the command line, if any.
    pub fn use_cache(&self) -> Option<bool> {
        if self.cache {
            Some(true)
        } else if self.no_cache {
            Some(false)
        } else {
            None
        }
    }
}
