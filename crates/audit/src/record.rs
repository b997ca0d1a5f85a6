use serde::{Deserialize, Serialize};

use crate::event::{AuditEvent, AuditKind, Details};

/// Timestamp layout of the `timestamp` field (UTC, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Flattened, serializable form of an [`AuditEvent`].
///
/// The capitalized field names are read by log-analytics collectors and must
/// not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub level: String,
    pub message: String,

    #[serde(rename = "Admin_User")]
    pub admin_user: String,

    #[serde(rename = "Action")]
    pub action: String,

    #[serde(rename = "Target_Tenant")]
    pub target_tenant: String,

    #[serde(rename = "Target_User")]
    pub target_user: String,

    #[serde(rename = "Success", default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    #[serde(rename = "IP_Address", default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(rename = "Config_Key", default, skip_serializing_if = "Option::is_none")]
    pub config_key: Option<String>,

    #[serde(rename = "Old_Value", default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,

    #[serde(rename = "New_Value", default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,

    #[serde(rename = "Details", default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
}

impl AuditRecord {
    pub const LEVEL: &'static str = "INFO";

    /// One newline-terminated JSON document.
    pub fn to_json_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

impl From<&AuditEvent> for AuditRecord {
    fn from(event: &AuditEvent) -> Self {
        let mut record = AuditRecord {
            timestamp: event.occurred_at().format(TIMESTAMP_FORMAT).to_string(),
            level: Self::LEVEL.to_string(),
            message: event.message(),
            admin_user: event.actor().to_string(),
            action: event.action().to_string(),
            target_tenant: event.target_tenant().to_string(),
            target_user: event.target_user().to_string(),
            success: event.success(),
            ip_address: event.ip_address().map(str::to_string),
            config_key: None,
            old_value: None,
            new_value: None,
            details: None,
        };

        match event.kind() {
            AuditKind::ConfigChange => {
                record.config_key = event.detail_str("key").map(str::to_string);
                record.old_value = event.detail_str("old_value").map(str::to_string);
                record.new_value = event.detail_str("new_value").map(str::to_string);
            }
            AuditKind::AdminAction | AuditKind::Auth => {
                record.details = event.details().filter(|d| !d.is_empty()).cloned();
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::details;

    #[test]
    fn admin_action_record_shape() {
        let event = AuditEvent::admin_action(
            "admin@x.com",
            "UPDATE_USER_ROLE",
            None,
            Some("bob@x.com"),
            Some(details(json!({"old_role": "user", "new_role": "manager"}))),
        );
        let value = serde_json::to_value(AuditRecord::from(&event)).unwrap();

        assert_eq!(value["level"], "INFO");
        assert_eq!(value["message"], "AUDIT: UPDATE_USER_ROLE");
        assert_eq!(value["Admin_User"], "admin@x.com");
        assert_eq!(value["Action"], "UPDATE_USER_ROLE");
        assert_eq!(value["Target_Tenant"], "default");
        assert_eq!(value["Target_User"], "bob@x.com");
        assert_eq!(value["Details"], json!({"old_role": "user", "new_role": "manager"}));
        assert!(value.get("Success").is_none());
        assert!(value.get("IP_Address").is_none());
        assert!(value.get("Config_Key").is_none());
    }

    #[test]
    fn config_change_is_flattened_into_named_fields() {
        let event = AuditEvent::config_change("a@x.com", "theme", "dark", "light");
        let record = AuditRecord::from(&event);

        assert_eq!(record.action, "CONFIG_CHANGE");
        assert_eq!(record.config_key.as_deref(), Some("theme"));
        assert_eq!(record.old_value.as_deref(), Some("dark"));
        assert_eq!(record.new_value.as_deref(), Some("light"));
        assert_eq!(record.target_user, "");
        assert!(record.details.is_none());
    }

    #[test]
    fn auth_record_carries_success_and_ip() {
        let event = AuditEvent::auth("a@x.com", "LOGOUT", true, None);
        let value = serde_json::to_value(AuditRecord::from(&event)).unwrap();
        assert_eq!(value["Success"], Value::Bool(true));
        assert_eq!(value["IP_Address"], "unknown");
        assert_eq!(value["message"], "AUTH: LOGOUT");
    }

    #[test]
    fn json_line_is_a_single_line() {
        let event = AuditEvent::admin_action(
            "a@x.com",
            "UPDATE_PROFILE",
            None,
            None,
            Some(details(json!({"fields_updated": ["city", "phone"]}))),
        );
        let line = AuditRecord::from(&event).to_json_line().unwrap();

        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);

        let parsed: AuditRecord = serde_json::from_slice(&line).unwrap();
        assert_eq!(parsed.action, "UPDATE_PROFILE");
    }

    #[test]
    fn timestamp_has_second_precision() {
        let event = AuditEvent::admin_action("a@x.com", "X", None, None, None);
        let record = AuditRecord::from(&event);
        assert!(chrono::NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(record.timestamp.len(), "2024-01-01T00:00:00".len());
    }
}
