//! Batch pipeline: discovery, skip decisions and orchestration.

pub mod batch;
pub mod error;
pub mod guard;
pub mod scan;

pub use batch::{BatchOutcome, BatchRunner, DescriptorOutcome, ProgressSink};
pub use guard::{GuardDecision, IdempotencyGuard, SkipNotice};
pub use scan::DescriptorScanner;
