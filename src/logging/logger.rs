//! Structured logger with summary collection and the abort banner.
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::subscriber::{BANNER_TARGET, LogSink, STAGE_TARGET};
use super::types::{BuildStatus, Log, SummaryEntry};

/// Route `Log` calls to the inherent `Logger` methods so both call styles
/// produce identical output.
macro_rules! log_via_inherent {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger for a build run.
///
/// Every message goes to the log file once one is attached (first the
/// global `<output>/assetbuild.log`, later the per-build copy). The console
/// only mirrors messages while verbosity is on.
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<SummaryEntry>>,
    sink: Arc<LogSink>,
    verbose: Arc<AtomicBool>,
    aborted: AtomicBool,
}

impl Logger {
    /// Create a logger with a detached sink.
    ///
    /// The tracing subscriber is installed by
    /// [`init_subscriber`](super::subscriber::init_subscriber); this
    /// constructor does not touch global state.
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            sink: Arc::new(LogSink::default()),
            verbose: Arc::new(AtomicBool::new(verbose)),
            aborted: AtomicBool::new(false),
        }
    }

    pub(super) fn sink(&self) -> Arc<LogSink> {
        Arc::clone(&self.sink)
    }

    pub(super) fn verbose_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.verbose)
    }

    /// Whether console mirroring is currently on.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    /// Turn console mirroring on for the rest of the run.
    pub fn force_verbose(&self) {
        self.verbose.store(true, Ordering::Relaxed);
    }

    /// Start writing to the log file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn attach_file(&self, path: &Path) -> io::Result<()> {
        self.sink.attach(path)
    }

    /// Move the current run's log into `path` and keep writing there.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be copied.
    pub fn relocate(&self, path: &Path) -> io::Result<()> {
        self.sink.relocate(path)
    }

    /// Path of the log file currently in use.
    #[must_use]
    pub fn log_path(&self) -> Option<PathBuf> {
        self.sink.path()
    }

    /// Return a clone of all recorded summary entries.
    #[must_use]
    pub fn entries(&self) -> Vec<SummaryEntry> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Start a new section, e.g. one per manifest.
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Progress line, shown on the console in verbose mode.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message.
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Record a manifest result for the summary.
    pub fn record(&self, name: &str, status: BuildStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(SummaryEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Log the summary of all recorded manifests.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }

        self.stage("Summary");

        let mut ok = 0u32;
        let mut warned = 0u32;
        let mut failed = 0u32;

        for entry in &entries {
            let (icon, color) = match entry.status {
                BuildStatus::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                BuildStatus::Warned => {
                    warned += 1;
                    ("!", "\x1b[33m")
                }
                BuildStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };

            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", entry.name));
        }

        self.info(&format!(
            "{} manifests: \x1b[32m{ok} ok\x1b[0m, \x1b[33m{warned} with warnings\x1b[0m, \x1b[31m{failed} failed\x1b[0m",
            ok + warned + failed
        ));

        if let Some(path) = self.log_path() {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }

    /// Report a fatal condition.
    ///
    /// Forces verbosity on, logs `reason` and a trailing banner pointing at
    /// the log file. Only the first call has any effect; returns `false` for
    /// repeated calls.
    pub fn abort(&self, reason: &str, user_abort: bool) -> bool {
        if self.aborted.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.force_verbose();

        let headline = if user_abort {
            self.warn(reason);
            "Build cancelled by operator"
        } else {
            self.error(reason);
            "Build aborted"
        };

        let rule = "==========================================";
        tracing::error!(target: BANNER_TARGET, "{rule}");
        tracing::error!(target: BANNER_TARGET, "{headline}");
        if let Some(path) = self.log_path() {
            tracing::error!(target: BANNER_TARGET, "log: {}", path.display());
        }
        tracing::error!(target: BANNER_TARGET, "{rule}");
        true
    }

    /// Whether [`abort`](Self::abort) has already run.
    #[must_use]
    pub fn has_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

impl Log for Logger {
    log_via_inherent!(stage, info, debug, warn, error);

    fn record(&self, name: &str, status: BuildStatus, message: Option<&str>) {
        self.record(name, status, message);
    }
}
