use std::{
    io::{self, Write},
    path::Path,
};

use crate::application::{ProgressSink, SkipNotice};

pub const FINISHED_LINE: &str = "Finished!";
pub const MISSING_TARGET_LINE: &str = "No directory provided";

/// Prints progress lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    fn line(args: std::fmt::Arguments<'_>) {
        let mut stdout = io::stdout().lock();
        // A closed stdout must not abort the batch.
        let _ = writeln!(stdout, "{args}");
    }

    pub fn finished(&self) {
        Self::line(format_args!("{FINISHED_LINE}"));
    }
}

impl ProgressSink for ConsoleProgress {
    fn missing_target(&self) {
        Self::line(format_args!("{MISSING_TARGET_LINE}"));
    }

    fn skipped(&self, notice: &SkipNotice) {
        Self::line(format_args!("{notice}"));
    }

    fn rendered(&self, descriptor: &Path, output: &Path) {
        Self::line(format_args!(
            "Render: {} -> {}",
            descriptor.display(),
            output.display()
        ));
    }
}
