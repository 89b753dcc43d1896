//! Sequential batch run over every descriptor below a directory.

use std::path::{Path, PathBuf};

use tracing::{Instrument, debug, info, info_span};

use crate::{
    config::Settings,
    domain::RenderDescriptor,
    infra::{
        assets::AssetFetcher,
        error::InfraError,
        http::build_client,
        renderform::RenderClient,
        storage::{WriteError, write_artifact},
    },
};

use super::{
    error::PipelineError,
    guard::{GuardDecision, IdempotencyGuard, SkipNotice},
    scan::DescriptorScanner,
};

/// Receives user-facing progress as the batch advances.
pub trait ProgressSink {
    fn missing_target(&self);
    fn skipped(&self, notice: &SkipNotice);
    fn rendered(&self, descriptor: &Path, output: &Path);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorOutcome {
    Rendered {
        descriptor: PathBuf,
        output: PathBuf,
        bytes: u64,
    },
    Skipped(SkipNotice),
}

/// Per-descriptor results in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    outcomes: Vec<DescriptorOutcome>,
}

impl BatchOutcome {
    pub fn outcomes(&self) -> &[DescriptorOutcome] {
        &self.outcomes
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn rendered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, DescriptorOutcome::Rendered { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, DescriptorOutcome::Skipped(_)))
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct BatchRunner {
    guard: IdempotencyGuard,
    renderer: RenderClient,
    fetcher: AssetFetcher,
    template: Option<String>,
}

impl BatchRunner {
    pub fn new(
        guard: IdempotencyGuard,
        renderer: RenderClient,
        fetcher: AssetFetcher,
        template: Option<String>,
    ) -> Self {
        Self {
            guard,
            renderer,
            fetcher,
            template,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, InfraError> {
        let http = build_client()?;
        Ok(Self::new(
            IdempotencyGuard::new(settings.batch.overwrite),
            RenderClient::new(http.clone(), &settings.render),
            AssetFetcher::new(http),
            settings.render.template.clone(),
        ))
    }

    /// Process every descriptor under `root` in scan order.
    ///
    /// The first failing descriptor aborts the run; descriptors after it are
    /// left untouched.
    pub async fn run(
        &self,
        root: Option<&Path>,
        progress: &dyn ProgressSink,
    ) -> Result<BatchOutcome, PipelineError> {
        let mut outcome = BatchOutcome::default();

        let Some(root) = root.filter(|root| !root.as_os_str().is_empty()) else {
            progress.missing_target();
            return Ok(outcome);
        };

        let scanner = DescriptorScanner::new(root);
        debug!(directory = %absolute_display(scanner.root()), "scanning for descriptors");

        for path in scanner.candidates() {
            let Some(descriptor) = scanner.load(&path).await else {
                continue;
            };

            let span = info_span!("descriptor", path = %descriptor.path().display());
            let result = self.process(&descriptor, progress).instrument(span).await?;
            outcome.outcomes.push(result);
        }

        info!(
            rendered = outcome.rendered(),
            skipped = outcome.skipped(),
            "batch finished"
        );
        Ok(outcome)
    }

    async fn process(
        &self,
        descriptor: &RenderDescriptor,
        progress: &dyn ProgressSink,
    ) -> Result<DescriptorOutcome, PipelineError> {
        if let GuardDecision::Skip(notice) = self.guard.check(descriptor).await {
            progress.skipped(&notice);
            return Ok(DescriptorOutcome::Skipped(notice));
        }

        let template = self
            .template
            .as_deref()
            .or_else(|| descriptor.template_id())
            .ok_or_else(|| PipelineError::MissingTemplate {
                descriptor: descriptor.path().to_path_buf(),
            })?;
        debug!(template, data = ?descriptor.data(), "rendering");

        let request = self.renderer.build_request(template, descriptor.data().clone());
        let href = self
            .renderer
            .render(&request)
            .await
            .map_err(|source| PipelineError::Render {
                descriptor: descriptor.path().to_path_buf(),
                source,
            })?;

        let asset = self
            .fetcher
            .fetch(&href)
            .await
            .map_err(|source| PipelineError::Fetch {
                descriptor: descriptor.path().to_path_buf(),
                source,
            })?;
        let extension = asset
            .extension()
            .ok_or_else(|| PipelineError::UnresolvedExtension { url: href.clone() })?;

        let output = descriptor.output_path(&extension);
        debug!(output = %output.display(), "saving asset");
        let bytes = write_artifact(asset.into_stream(), &output)
            .await
            .map_err(|err| match err {
                WriteError::Source(source) => PipelineError::Fetch {
                    descriptor: descriptor.path().to_path_buf(),
                    source,
                },
                WriteError::Persist(err) => PipelineError::Persist(err),
            })?;

        progress.rendered(descriptor.path(), &output);
        Ok(DescriptorOutcome::Rendered {
            descriptor: descriptor.path().to_path_buf(),
            output,
            bytes,
        })
    }
}

fn absolute_display(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
