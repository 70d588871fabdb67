//! Logging setup shared by freightdesk binaries.

/// Initialize process-wide logging at `info`, in the format chosen by
/// `FREIGHTDESK_LOG_FORMAT`. Repeated calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env(), "info");
}

pub mod tracing;

pub use tracing::LogFormat;
