use std::{error::Error as StdError, path::PathBuf};

use thiserror::Error;
use url::Url;

use crate::{
    config::LoadError,
    infra::{assets::FetchError, error::InfraError, renderform::RenderError, storage::PersistError},
};

/// A failure that aborts the batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no template for {descriptor} (use --template or set `template` in the descriptor)")]
    MissingTemplate { descriptor: PathBuf },
    #[error("render failed for {descriptor}: {source}")]
    Render {
        descriptor: PathBuf,
        #[source]
        source: RenderError,
    },
    #[error("download failed for {descriptor}: {source}")]
    Fetch {
        descriptor: PathBuf,
        #[source]
        source: FetchError,
    },
    #[error("asset URL {url} has no file extension")]
    UnresolvedExtension { url: Url },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl PipelineError {
    /// Error body returned by the render service, when there is one.
    pub fn remote_payload(&self) -> Option<&str> {
        match self {
            Self::Render { source, .. } => source.payload(),
            _ => None,
        }
    }
}

/// Top-level error of the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AppError {
    /// Messages of the underlying error chain, outermost first.
    ///
    /// A cause whose text already appears in the message above it is left out.
    pub fn causes(&self) -> Vec<String> {
        let mut messages = Vec::new();
        let mut shown = self.to_string();
        let mut current = self.source();
        while let Some(inner) = current {
            let message = inner.to_string();
            if !shown.contains(&message) {
                messages.push(message.clone());
            }
            shown = message;
            current = inner.source();
        }
        messages
    }

    pub fn remote_payload(&self) -> Option<&str> {
        match self {
            Self::Pipeline(err) => err.remote_payload(),
            Self::Config(_) | Self::Infra(_) => None,
        }
    }
}
