//! Tracing subscriber setup: console formatter, relocatable file layer, and
//! initialisation.
use std::fs;
use std::io::{self, Read as _, Seek as _, SeekFrom, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::logger::Logger;
use super::utils::{DATETIME, TIME, now, strip_ansi};

/// Target used for stage headers.
pub(super) const STAGE_TARGET: &str = "assetbuild::stage";
/// Target used for the abort banner.
pub(super) const BANNER_TARGET: &str = "assetbuild::banner";

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

#[derive(Debug, Default)]
struct SinkState {
    file: Option<fs::File>,
    path: Option<PathBuf>,
    /// Byte offset at which this run's header was written.
    run_start: u64,
}

/// Append-only log file shared between [`Logger`] and [`FileLayer`].
///
/// The sink starts detached (events are dropped) until [`attach`](Self::attach)
/// opens the global log. [`relocate`](Self::relocate) later moves the current
/// run's lines into the build directory and keeps appending there.
#[derive(Debug, Default)]
pub struct LogSink {
    state: Mutex<SinkState>,
}

impl LogSink {
    fn lock(&self) -> std::sync::MutexGuard<'_, SinkState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Open (or create) `path` in append mode and write a run header.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory or the file cannot be created.
    pub fn attach(&self, path: &Path) -> io::Result<()> {
        let mut file = open_append(path)?;
        let run_start = file.metadata()?.len();
        let version =
            option_env!("ASSETBUILD_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        write!(
            file,
            "==========================================\n\
             assetbuild {version} {}\n\
             ==========================================\n",
            now(DATETIME),
        )?;
        let mut state = self.lock();
        state.file = Some(file);
        state.path = Some(path.to_path_buf());
        state.run_start = run_start;
        Ok(())
    }

    /// Move this run's log lines to `path` and continue logging there.
    ///
    /// The original file keeps its contents; only the lines written since
    /// [`attach`](Self::attach) are copied. Attaches directly if no file was
    /// open yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the old file cannot be read or the new one cannot
    /// be written. On error the sink keeps writing to the old file.
    pub fn relocate(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        let Some(old_path) = state.path.clone() else {
            drop(state);
            return self.attach(path);
        };
        if old_path == path {
            return Ok(());
        }

        let mut carried = Vec::new();
        let mut reader = fs::File::open(&old_path)?;
        reader.seek(SeekFrom::Start(state.run_start))?;
        reader.read_to_end(&mut carried)?;

        let mut file = open_append(path)?;
        let run_start = file.metadata()?.len();
        file.write_all(&carried)?;

        state.file = Some(file);
        state.path = Some(path.to_path_buf());
        state.run_start = run_start;
        Ok(())
    }

    /// Path of the file currently receiving events.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self.lock().path.clone()
    }

    fn write_line(&self, line: &str) {
        if let Some(f) = self.lock().file.as_mut() {
            writeln!(f, "{line}").ok();
        }
    }
}

fn open_append(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::OpenOptions::new().create(true).append(true).open(path)
}

/// A [`tracing_subscriber::Layer`] that appends all events to the
/// [`LogSink`] with timestamps and ANSI codes stripped.
///
/// Always captures events at `DEBUG` level and above regardless of the
/// console verbosity setting.
#[derive(Debug)]
pub(super) struct FileLayer {
    sink: Arc<LogSink>,
}

impl FileLayer {
    pub(super) const fn new(sink: Arc<LogSink>) -> Self {
        Self { sink }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = strip_ansi(&extractor.message);
        let ts = now(TIME);

        let line = match (level, target) {
            (tracing::Level::INFO, STAGE_TARGET) => format!("[{ts}] ==> {msg}"),
            (_, BANNER_TARGET) => format!("[{ts}] !!! {msg}"),
            (tracing::Level::ERROR, _) => format!("[{ts}]     [error] {msg}"),
            (tracing::Level::WARN, _) => format!("[{ts}]     [warn] {msg}"),
            (tracing::Level::DEBUG, _) => format!("[{ts}]     [debug] {msg}"),
            _ => format!("[{ts}]     {msg}"),
        };

        self.sink.write_line(&line);
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that emits assetbuild-style
/// console output.
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = &extractor.message;

        match level {
            _ if target == BANNER_TARGET => writeln!(writer, "\x1b[1;31m{msg}\x1b[0m"),
            tracing::Level::ERROR => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            tracing::Level::INFO if target == STAGE_TARGET => {
                writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m")
            }
            tracing::Level::INFO => writeln!(writer, "  {msg}"),
            _ => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Build the layered subscriber that feeds `log`'s console and file output,
/// without installing it.
///
/// Console output goes to stderr and is gated by the logger's verbosity
/// flag, which [`Logger::force_verbose`] can flip at any time. File output
/// is written to the logger's [`LogSink`] once a file has been attached.
pub fn subscriber_for(log: &Logger) -> impl tracing::Subscriber + Send + Sync + 'static {
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, filter::filter_fn, fmt, layer::SubscriberExt as _,
    };

    let flag: Arc<AtomicBool> = log.verbose_flag();
    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(io::stderr)
        .with_filter(filter_fn(move |_| flag.load(Ordering::Relaxed)));

    let file_layer = FileLayer::new(log.sink()).with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
}

/// Initialise the global [`tracing`] subscriber and return the [`Logger`]
/// bound to it.
///
/// Must be called once at program startup, before any logging.
#[must_use]
pub fn init_subscriber(verbose: bool) -> Logger {
    use tracing_subscriber::util::SubscriberInitExt as _;

    let log = Logger::new(verbose);
    subscriber_for(&log).init();
    log
}
