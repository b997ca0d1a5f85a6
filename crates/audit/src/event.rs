use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use adminhub_core::TenantLabel;

use crate::actions;

/// Action-specific extra fields (e.g. `{old_role, new_role}`).
pub type Details = Map<String, Value>;

/// Build [`Details`] from a JSON value; non-object values land under `"value"`.
pub fn details(value: Value) -> Details {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// Which entry point produced an event; decides the message and how the
/// event is flattened into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    AdminAction,
    Auth,
    ConfigChange,
}

/// One completed administrative or authentication action.
///
/// Immutable once constructed: fields are private and only exposed through
/// accessors. The timestamp is captured at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    kind: AuditKind,
    actor: String,
    action: String,
    target_tenant: TenantLabel,
    target_user: String,
    /// Authentication events only.
    success: Option<bool>,
    /// Authentication events only.
    ip_address: Option<String>,
    details: Option<Details>,
    occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub const UNKNOWN_IP: &'static str = "unknown";

    pub fn admin_action(
        actor: impl Into<String>,
        action: impl Into<String>,
        target_tenant: Option<&str>,
        target_user: Option<&str>,
        details: Option<Details>,
    ) -> Self {
        Self {
            kind: AuditKind::AdminAction,
            actor: actor.into(),
            action: action.into(),
            target_tenant: target_tenant.map(TenantLabel::new).unwrap_or_default(),
            target_user: target_user.unwrap_or_default().to_string(),
            success: None,
            ip_address: None,
            details,
            occurred_at: Utc::now(),
        }
    }

    pub fn auth(
        identity: impl Into<String>,
        event_type: impl Into<String>,
        success: bool,
        ip_address: Option<&str>,
    ) -> Self {
        let identity = identity.into();
        let ip_address = ip_address
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(Self::UNKNOWN_IP);

        Self {
            kind: AuditKind::Auth,
            target_user: identity.clone(),
            actor: identity,
            action: event_type.into(),
            target_tenant: TenantLabel::default(),
            success: Some(success),
            ip_address: Some(ip_address.to_string()),
            details: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn config_change(
        actor: impl Into<String>,
        key: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        let mut details = Details::new();
        details.insert("key".to_string(), Value::String(key.into()));
        details.insert("old_value".to_string(), Value::String(old_value.into()));
        details.insert("new_value".to_string(), Value::String(new_value.into()));

        Self {
            kind: AuditKind::ConfigChange,
            actor: actor.into(),
            action: actions::CONFIG_CHANGE.to_string(),
            target_tenant: TenantLabel::default(),
            target_user: String::new(),
            success: None,
            ip_address: None,
            details: Some(details),
            occurred_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> AuditKind {
        self.kind
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn target_tenant(&self) -> &str {
        self.target_tenant.as_str()
    }

    pub fn target_user(&self) -> &str {
        &self.target_user
    }

    pub fn success(&self) -> Option<bool> {
        self.success
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn details(&self) -> Option<&Details> {
        self.details.as_ref()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// String-valued entry of `details`.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.as_ref()?.get(key)?.as_str()
    }

    /// Human-readable message of the emitted record.
    pub fn message(&self) -> String {
        match self.kind {
            AuditKind::AdminAction => format!("AUDIT: {}", self.action),
            AuditKind::Auth => format!("AUTH: {}", self.action),
            AuditKind::ConfigChange => {
                format!("CONFIG: Changed {}", self.detail_str("key").unwrap_or_default())
            }
        }
    }
}
