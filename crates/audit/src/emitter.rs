use std::sync::Arc;

use crate::event::{AuditEvent, Details};
use crate::record::AuditRecord;
use crate::sink::{AuditSink, StdoutSink};

/// Entry point for handlers recording completed actions.
///
/// Cheap to clone; all clones write to the same sink. Every `record_*` call
/// writes exactly one record before returning and never fails: a sink error
/// is reported through `tracing` and otherwise dropped.
#[derive(Clone)]
pub struct AuditEmitter {
    sink: Arc<dyn AuditSink>,
}

impl AuditEmitter {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Emitter writing JSON lines to stdout.
    pub fn stdout() -> Self {
        Self::new(Arc::new(StdoutSink))
    }

    pub fn record_admin_action(
        &self,
        actor: &str,
        action: &str,
        target_tenant: Option<&str>,
        target_user: Option<&str>,
        details: Option<Details>,
    ) {
        self.emit(&AuditEvent::admin_action(
            actor,
            action,
            target_tenant,
            target_user,
            details,
        ));
    }

    pub fn record_auth_event(
        &self,
        identity: &str,
        event_type: &str,
        success: bool,
        ip_address: Option<&str>,
    ) {
        self.emit(&AuditEvent::auth(identity, event_type, success, ip_address));
    }

    pub fn record_config_change(&self, actor: &str, key: &str, old_value: &str, new_value: &str) {
        self.emit(&AuditEvent::config_change(actor, key, old_value, new_value));
    }

    /// Write one prepared event.
    pub fn emit(&self, event: &AuditEvent) {
        let record = AuditRecord::from(event);
        if let Err(err) = self.sink.write(&record) {
            tracing::warn!(
                error = %err,
                action = event.action(),
                actor = event.actor(),
                "audit record could not be written"
            );
        }
    }
}

impl core::fmt::Debug for AuditEmitter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuditEmitter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::{AuditError, MemorySink, details};

    fn emitter() -> (AuditEmitter, MemorySink) {
        let sink = MemorySink::new();
        (AuditEmitter::new(Arc::new(sink.clone())), sink)
    }

    #[derive(Default)]
    struct BrokenSink {
        attempts: AtomicUsize,
    }

    impl AuditSink for BrokenSink {
        fn write(&self, _record: &AuditRecord) -> Result<(), AuditError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(AuditError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdout closed",
            )))
        }
    }

    #[test]
    fn each_call_writes_exactly_one_record() {
        let (emitter, sink) = emitter();

        emitter.record_admin_action("a@x.com", "UPDATE_PROFILE", None, None, None);
        assert_eq!(sink.len(), 1);

        emitter.record_auth_event("a@x.com", "LOGOUT", true, None);
        assert_eq!(sink.len(), 2);

        emitter.record_config_change("a@x.com", "theme", "dark", "light");
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn actor_and_action_are_verbatim_with_defaults() {
        let (emitter, sink) = emitter();
        emitter.record_admin_action("Admin@X.com", "Custom_Tag", None, None, None);
        emitter.record_auth_event("Admin@X.com", "LOGOUT", false, None);

        let records = sink.records();
        assert_eq!(records[0].admin_user, "Admin@X.com");
        assert_eq!(records[0].action, "Custom_Tag");
        assert_eq!(records[0].target_tenant, "default");
        assert_eq!(records[0].target_user, "");
        assert_eq!(records[1].ip_address.as_deref(), Some("unknown"));
        assert_eq!(records[1].success, Some(false));
    }

    #[test]
    fn role_change_record() {
        let (emitter, sink) = emitter();
        emitter.record_admin_action(
            "admin@x.com",
            crate::actions::UPDATE_USER_ROLE,
            None,
            Some("x@x.com"),
            Some(details(json!({"old_role": "user", "new_role": "manager"}))),
        );

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "UPDATE_USER_ROLE");
        assert_eq!(
            records[0].details.clone().map(serde_json::Value::Object),
            Some(json!({"old_role": "user", "new_role": "manager"}))
        );
    }

    #[test]
    fn config_change_record() {
        let (emitter, sink) = emitter();
        emitter.record_config_change("a@x.com", "theme", "dark", "light");

        let record = &sink.records()[0];
        assert_eq!(record.action, "CONFIG_CHANGE");
        assert_eq!(record.config_key.as_deref(), Some("theme"));
        assert_eq!(record.old_value.as_deref(), Some("dark"));
        assert_eq!(record.new_value.as_deref(), Some("light"));
    }

    #[test]
    fn sink_failures_are_swallowed() {
        let sink = Arc::new(BrokenSink::default());
        let emitter = AuditEmitter::new(sink.clone());

        emitter.record_config_change("a@x.com", "theme", "dark", "light");
        emitter.record_auth_event("a@x.com", "LOGOUT", true, Some("10.1.1.1"));

        assert_eq!(sink.attempts.load(Ordering::SeqCst), 2);
    }
}
