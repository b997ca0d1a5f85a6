//! `adminhub-audit` — audit trail of administrative and authentication actions.
//!
//! Handlers describe a committed change as an [`AuditEvent`]; the
//! [`AuditEmitter`] flattens it into one [`AuditRecord`] and hands it to the
//! injected [`AuditSink`]. Emission is fire-and-forget: sink failures are
//! logged and swallowed, never returned to the request that triggered them.

pub mod actions;
pub mod emitter;
pub mod event;
pub mod record;
pub mod sink;

pub use emitter::AuditEmitter;
pub use event::{AuditEvent, AuditKind, Details, details};
pub use record::AuditRecord;
pub use sink::{AuditError, AuditSink, MemorySink, StdoutSink, TracingSink};
