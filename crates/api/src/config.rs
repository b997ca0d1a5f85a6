//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

use adminhub_core::Email;
use adminhub_observability::{LogFormat, LogSettings};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Where audit records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditSinkKind {
    /// One JSON line per record on stdout.
    #[default]
    Stdout,
    /// Through the application's `tracing` subscriber.
    Tracing,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub database_url: Option<String>,
    pub audit_sink: AuditSinkKind,
    pub bootstrap_admin_email: Option<Email>,
    pub log: LogSettings,
}

impl AppConfig {
    /// True when `JWT_SECRET` was not provided.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", &bind_raw, e))?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let audit_sink = match get("AUDIT_SINK") {
            None => AuditSinkKind::default(),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "stdout" => AuditSinkKind::Stdout,
                "tracing" => AuditSinkKind::Tracing,
                _ => {
                    return Err(ConfigError::invalid(
                        "AUDIT_SINK",
                        &raw,
                        "expected 'stdout' or 'tracing'",
                    ));
                }
            },
        };

        let bootstrap_admin_email = get("BOOTSTRAP_ADMIN_EMAIL")
            .map(|raw| Email::parse(&raw).map_err(|e| ConfigError::invalid("BOOTSTRAP_ADMIN_EMAIL", &raw, e)))
            .transpose()?;

        let format = match get("LOG_FORMAT") {
            None => LogFormat::default(),
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid("LOG_FORMAT", &raw, e))?,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            database_url: get("DATABASE_URL"),
            audit_sink,
            bootstrap_admin_email,
            log: LogSettings {
                format,
                ..LogSettings::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(cfg.uses_dev_secret());
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.audit_sink, AuditSinkKind::Stdout);
        assert!(cfg.bootstrap_admin_email.is_none());
        assert_eq!(cfg.log.format, LogFormat::Json);
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://localhost/adminhub"),
            ("AUDIT_SINK", "Tracing"),
            ("BOOTSTRAP_ADMIN_EMAIL", "Root@Example.com"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/adminhub"));
        assert_eq!(cfg.audit_sink, AuditSinkKind::Tracing);
        assert_eq!(cfg.bootstrap_admin_email.unwrap().as_str(), "root@example.com");
        assert_eq!(cfg.log.format, LogFormat::Pretty);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let cfg = config(&[("DATABASE_URL", ""), ("JWT_SECRET", "  ")]).unwrap();
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn rejects_invalid_values() {
        for (var, value) in [
            ("BIND_ADDR", "not-an-address"),
            ("AUDIT_SINK", "syslog"),
            ("BOOTSTRAP_ADMIN_EMAIL", "nobody"),
            ("LOG_FORMAT", "xml"),
        ] {
            let err = config(&[(var, value)]).unwrap_err();
            let ConfigError::Invalid { var: got, .. } = err;
            assert_eq!(got, var);
        }
    }
}
