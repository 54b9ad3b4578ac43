//! Logging infrastructure for console and file output.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::{LogSink, init_subscriber, subscriber_for};
pub use types::{BuildStatus, Log, SummaryEntry};

/// Create a Logger backed by an isolated per-thread tracing subscriber with
/// a [`FileLayer`](subscriber::FileLayer) writing into a fresh temp
/// directory, so that events emitted by logger methods reach a real file.
///
/// Returns a [`tracing::dispatcher::DefaultGuard`] that must be kept alive
/// for the duration of the test.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let log = Logger::new(false);
    log.attach_file(&tmp.path().join("assetbuild.log"))
        .expect("failed to attach log file");
    let file_layer = subscriber::FileLayer::new(log.sink());
    let subscriber =
        tracing_subscriber::registry().with(file_layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
    (log, tmp, guard)
}

/// In-memory [`Log`] for unit tests that only need to inspect messages.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingLog {
    pub(crate) warnings: std::sync::Mutex<Vec<String>>,
    pub(crate) records: std::sync::Mutex<Vec<(String, BuildStatus)>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
impl RecordingLog {
    pub(crate) fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub(crate) fn records(&self) -> Vec<(String, BuildStatus)> {
        self.records.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
impl Log for RecordingLog {
    fn stage(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
    fn warn(&self, msg: &str) {
        self.warnings.lock().unwrap().push(msg.to_string());
    }
    fn error(&self, _msg: &str) {}
    fn record(&self, name: &str, status: BuildStatus, _message: Option<&str>) {
        self.records.lock().unwrap().push((name.to_string(), status));
    }
}
