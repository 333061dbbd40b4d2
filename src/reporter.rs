use audio_duper::{Error, FileOutcome, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter: one indicatif bar per source tree.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_tree_start(&self, root: &Path, files: usize) {
        let pb = ProgressBar::new(files as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} {prefix} [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
        ) {
            pb.set_style(style.progress_chars("━╸─").tick_chars(TICK_CHARS));
        }
        pb.set_prefix(root.display().to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_file_complete(&self, _path: &Path, _outcome: &FileOutcome) {
        self.with_bar(|pb| pb.inc(1));
    }

    fn on_tree_complete(&self, root: &Path, files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m {}: {} files in {:.2}s",
            root.display(),
            files,
            duration_secs
        );
    }

    fn on_tree_failed(&self, root: &Path, error: &Error) {
        self.finish_bar();
        eprintln!("  \x1b[31m✗\x1b[0m {}: {}", root.display(), error);
    }
}
