//! Skip-if-already-rendered decision.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use tokio::fs;

use crate::domain::RenderDescriptor;

/// Output formats a previous render may have produced, checked in this order.
pub const SUPPORTED_EXTENSIONS: [&str; 9] = [
    "png", "jpg", "jpeg", "pdf", "webp", "gif", "bmp", "tiff", "eps",
];

pub const OVERWRITE_FLAG: &str = "--overwrite";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Skip(SkipNotice),
}

/// Explains why a descriptor was not rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipNotice {
    descriptor: PathBuf,
    existing: PathBuf,
}

impl SkipNotice {
    pub fn descriptor(&self) -> &Path {
        &self.descriptor
    }

    pub fn existing(&self) -> &Path {
        &self.existing
    }
}

impl fmt::Display for SkipNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .existing
            .file_name()
            .map_or_else(|| self.existing.display().to_string(), |name| {
                name.to_string_lossy().into_owned()
            });
        write!(
            f,
            "Skipping: {name} already exists. Use {OVERWRITE_FLAG} to overwrite existing files."
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IdempotencyGuard {
    overwrite: bool,
}

impl IdempotencyGuard {
    pub fn new(overwrite: bool) -> Self {
        Self { overwrite }
    }

    /// Any existing output of a supported format counts as already rendered,
    /// since the format the service will produce is unknown up front.
    pub async fn check(&self, descriptor: &RenderDescriptor) -> GuardDecision {
        if self.overwrite {
            return GuardDecision::Proceed;
        }

        for extension in SUPPORTED_EXTENSIONS {
            let candidate = descriptor.output_path(extension);
            if fs::try_exists(&candidate).await.unwrap_or(false) {
                return GuardDecision::Skip(SkipNotice {
                    descriptor: descriptor.path().to_path_buf(),
                    existing: candidate,
                });
            }
        }

        GuardDecision::Proceed
    }
}
