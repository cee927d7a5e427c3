//! Audit trail sink for security relevant actions

pub mod tracing_sink;

/// Fire-and-forget: implementations must not fail the calling operation
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait AuditSink: Send + Sync {
    fn log(&self, action: &str, actor: &str);
}

/// Actor name used for operations not attributed to a user
pub const SYSTEM_ACTOR: &str = "SYSTEM";
