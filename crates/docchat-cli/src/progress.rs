use docchat_retrieval::{IngestPhase, IngestProgress};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        pb.set_style(spinner.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn bar_style() -> Option<ProgressStyle> {
    ProgressStyle::default_bar()
        .template("{msg}\n[{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
        .ok()
        .map(|s| s.progress_chars("█▓▒░ "))
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {}", message));
}

/// Progress display for ingestion: a spinner until embedding starts, then a bar
pub struct IngestProgressBar {
    bar: ProgressBar,
    hidden: bool,
    embedding: bool,
}

impl IngestProgressBar {
    /// A hidden tracker swallows updates so JSON output stays clean
    pub fn new(hidden: bool) -> Self {
        let bar = if hidden { ProgressBar::hidden() } else { create_spinner("Starting ingestion...") };
        Self { bar, hidden, embedding: false }
    }

    pub fn update(&mut self, progress: IngestProgress) {
        if self.hidden {
            return;
        }

        match progress.phase {
            IngestPhase::Embedding => {
                if !self.embedding {
                    self.embedding = true;
                    self.bar.disable_steady_tick();
                    self.bar.set_length(progress.total as u64);
                    if let Some(style) = bar_style() {
                        self.bar.set_style(style);
                    }
                }
                self.bar.set_position(progress.current as u64);
                self.bar.set_message(progress.message);
            }
            IngestPhase::Finalizing => {
                self.bar.set_position(progress.current as u64);
            }
            _ => self.bar.set_message(progress.message),
        }
    }

    pub fn finish(&self, inserted: usize) {
        finish_success(&self.bar, &format!("Inserted {} vectors", inserted));
    }

    pub fn fail(&self, message: &str) {
        finish_error(&self.bar, message);
    }
}
