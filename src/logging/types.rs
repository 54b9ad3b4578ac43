//! Core logging types: summary entries, status, and the [`Log`] trait.

/// Per-manifest result for summary reporting.
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    /// Manifest short name.
    pub name: String,
    /// Final status of the manifest.
    pub status: BuildStatus,
    /// Optional detail message (e.g., produced artifact types or a warning count).
    pub message: Option<String>,
}

/// Outcome of building one manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// All artifacts were built and deployed.
    Ok,
    /// Built, but one or more deployment extras were skipped with a warning.
    Warned,
    /// The manifest aborted the run.
    Failed,
}

/// Sink for build progress messages and per-manifest results.
///
/// The pipeline and deploy steps only see `&dyn Log`, so unit tests can
/// hand them a recorder instead of a [`Logger`](super::logger::Logger).
pub trait Log: Send + Sync {
    /// Section header such as "Building ex01".
    fn stage(&self, msg: &str);
    /// Progress line.
    fn info(&self, msg: &str);
    /// Detail that reaches the console only in verbose mode.
    fn debug(&self, msg: &str);
    /// Recoverable problem, e.g. a skipped subtree.
    fn warn(&self, msg: &str);
    /// Failure of the current step.
    fn error(&self, msg: &str);
    /// Store the outcome of one manifest for the closing summary.
    fn record(&self, name: &str, status: BuildStatus, message: Option<&str>);
}
