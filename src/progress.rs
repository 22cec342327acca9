//! Progress reporting using indicatif.
//!
//! The pipeline reports through the [`ProgressCallback`] trait; [`Progress`]
//! renders it as one spinner for the walk and one bar per I/O stage. The
//! stages run one after another, so at most one indicator is active.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::duplicates::finder::{PHASE_HASH, PHASE_PREFIX, PHASE_WALK};

/// Progress callback for the duplicate detection pipeline.
///
/// Implementations must be thread-safe: `on_progress` and
/// `on_item_completed` are called from worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Phase name (`"walking"`, `"prefix"`, `"fullhash"`)
    /// * `total` - Number of items, or 0 when unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed (`current` is 1-based).
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been processed, with its size in bytes.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Replace the status message.
    fn on_message(&self, _message: &str) {}
}

/// Terminal progress reporter.
pub struct Progress {
    multi: MultiProgress,
    active: Mutex<Option<ProgressBar>>,
    bytes: AtomicU64,
    quiet: bool,
}

impl Progress {
    /// Create a reporter drawing to stderr; `quiet` disables all drawing.
    ///
    /// ```
    /// use dedupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self {
            multi,
            active: Mutex::new(None),
            bytes: AtomicU64::new(0),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style(color: &str) -> ProgressStyle {
        let template = format!(
            "[{{elapsed_precise}}] [{{bar:40.{color}/blue}}] {{pos}}/{{len}} ({{percent}}%) {{msg}} (ETA: {{eta}})"
        );
        ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }

    fn with_active(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.active.lock() {
            if let Some(ref pb) = *guard {
                f(pb);
            }
        }
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("quiet", &self.quiet)
            .field("bytes", &self.bytes.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = match phase {
            PHASE_WALK => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.set_message("Walking");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            PHASE_PREFIX => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style("cyan"));
                pb.set_message("Reading prefixes");
                pb
            }
            PHASE_HASH => {
                self.bytes.store(0, Ordering::Relaxed);
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style("green"));
                pb.set_message("Hashing");
                pb
            }
            other => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style("white"));
                pb.set_message(other.to_string());
                pb
            }
        };

        if let Ok(mut active) = self.active.lock() {
            if let Some(previous) = active.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }
        let message = truncate_path(path, 30);
        self.with_active(|pb| {
            pb.set_position(current as u64);
            pb.set_message(message);
        });
    }

    fn on_item_completed(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let message = match phase {
            PHASE_WALK => "Walk complete".to_string(),
            PHASE_PREFIX => "Prefixes compared".to_string(),
            PHASE_HASH => format!(
                "Hashing complete ({})",
                bytesize::ByteSize::b(self.bytes.load(Ordering::Relaxed))
            ),
            other => format!("{other} complete"),
        };

        if let Ok(mut active) = self.active.lock() {
            if let Some(pb) = active.take() {
                pb.finish_with_message(message);
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        let message = message.to_string();
        self.with_active(|pb| pb.set_message(message));
    }
}

/// Shorten a path to at most about `max_len` characters, keeping the file name.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let count = file_name.chars().count();
    if count >= max_len {
        let tail: String = file_name.chars().skip(count + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
