use super::AuditSink;

/// Emits audit entries as `info` events on the `audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn log(&self, action: &str, actor: &str) {
        tracing::info!(target: "audit", action, actor, "audit event");
    }
}
