use std::io::Write;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::record::AuditRecord;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write audit record: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination of audit records, provided by the environment.
///
/// Implementations must write each record as one self-contained unit; the
/// emitter calls `write` exactly once per event.
pub trait AuditSink: Send + Sync {
    fn write(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn write(&self, record: &AuditRecord) -> Result<(), AuditError> {
        (**self).write(record)
    }
}

/// JSON lines on the process stdout.
///
/// The record is serialized up front and written with a single `write_all`,
/// so concurrent requests never interleave partial lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl AuditSink for StdoutSink {
    fn write(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = record.to_json_line()?;
        let mut out = std::io::stdout().lock();
        out.write_all(&line)?;
        out.flush()?;
        Ok(())
    }
}

/// Routes records through `tracing` (target `audit`).
///
/// Use with the JSON subscriber and `flatten_event(true)` to get the contract
/// field names at the top level of each log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn write(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let details = record
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        tracing::info!(
            target: "audit",
            Admin_User = %record.admin_user,
            Action = %record.action,
            Target_Tenant = %record.target_tenant,
            Target_User = %record.target_user,
            Success = record.success,
            IP_Address = record.ip_address.as_deref(),
            Config_Key = record.config_key.as_deref(),
            Old_Value = record.old_value.as_deref(),
            New_Value = record.new_value.as_deref(),
            Details = details.as_deref(),
            "{}",
            record.message
        );
        Ok(())
    }
}

/// In-memory capture, for tests and local inspection.
///
/// Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl AuditSink for MemorySink {
    fn write(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push(record.clone());
        Ok(())
    }
}
