//! Tracing and logging setup shared by the service binaries.

/// Output format of the process-wide subscriber.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable lines for local development.
    Pretty,
}

impl LogFormat {
    /// Human-readable output when debugging, JSON otherwise.
    pub fn for_debug(debug: bool) -> Self {
        if debug { LogFormat::Pretty } else { LogFormat::Json }
    }
}

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
