//! Key/value system configuration storage.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adminhub_core::DomainError;

use crate::StoreError;

/// Entries created at startup when missing: `(key, value, description)`.
pub const DEFAULT_CONFIGS: [(&str, &str, &str); 4] = [
    ("app_name", "POC Web App", "Application name"),
    ("theme", "dark", "UI theme (light/dark)"),
    ("maintenance_mode", "false", "Enable maintenance mode"),
    ("max_upload_size", "5242880", "Max file upload size in bytes"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Requested write of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigWrite {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ConfigWrite {
    pub const MAX_KEY_LEN: usize = 100;
    pub const MAX_VALUE_LEN: usize = 500;
    pub const MAX_DESCRIPTION_LEN: usize = 255;

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.key.trim().is_empty() {
            return Err(DomainError::validation("config key cannot be empty"));
        }
        if self.key.chars().count() > Self::MAX_KEY_LEN {
            return Err(DomainError::validation(format!(
                "config key must be at most {} characters",
                Self::MAX_KEY_LEN
            )));
        }
        if self.value.chars().count() > Self::MAX_VALUE_LEN {
            return Err(DomainError::validation(format!(
                "config value must be at most {} characters",
                Self::MAX_VALUE_LEN
            )));
        }
        if let Some(d) = &self.description {
            if d.chars().count() > Self::MAX_DESCRIPTION_LEN {
                return Err(DomainError::validation(format!(
                    "description must be at most {} characters",
                    Self::MAX_DESCRIPTION_LEN
                )));
            }
        }
        Ok(())
    }

    /// A missing or empty description leaves the stored one untouched.
    fn description_update(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

/// Result of an upsert: the entry as it was before (if any) and after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigUpsert {
    pub previous: Option<ConfigEntry>,
    pub current: ConfigEntry,
}

#[async_trait::async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<ConfigEntry>, StoreError>;

    /// All entries ordered by key.
    async fn list(&self) -> Result<Vec<ConfigEntry>, StoreError>;

    /// Create or update `write.key`, atomically reporting the previous entry.
    async fn upsert(&self, write: ConfigWrite, now: DateTime<Utc>) -> Result<ConfigUpsert, StoreError>;

    /// Create a new entry. Fails with `Conflict` when the key exists.
    async fn insert(&self, write: ConfigWrite, now: DateTime<Utc>) -> Result<ConfigEntry, StoreError>;

    /// Create any missing [`DEFAULT_CONFIGS`] entry; returns how many were created.
    async fn seed_defaults(&self) -> Result<usize, StoreError> {
        let mut created = 0;
        for (key, value, description) in DEFAULT_CONFIGS {
            if self.get(key).await?.is_some() {
                continue;
            }
            let write = ConfigWrite {
                key: key.to_string(),
                value: value.to_string(),
                description: Some(description.to_string()),
            };
            match self.insert(write, Utc::now()).await {
                Ok(_) => created += 1,
                // Lost a race with another instance seeding the same key.
                Err(StoreError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }
}

#[async_trait::async_trait]
impl<S> ConfigRepository for Arc<S>
where
    S: ConfigRepository + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<ConfigEntry>, StoreError> {
        (**self).get(key).await
    }

    async fn list(&self) -> Result<Vec<ConfigEntry>, StoreError> {
        (**self).list().await
    }

    async fn upsert(&self, write: ConfigWrite, now: DateTime<Utc>) -> Result<ConfigUpsert, StoreError> {
        (**self).upsert(write, now).await
    }

    async fn insert(&self, write: ConfigWrite, now: DateTime<Utc>) -> Result<ConfigEntry, StoreError> {
        (**self).insert(write, now).await
    }

    async fn seed_defaults(&self) -> Result<usize, StoreError> {
        (**self).seed_defaults().await
    }
}

/// In-memory config store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryConfigRepository {
    inner: RwLock<BTreeMap<String, ConfigEntry>>,
}

impl InMemoryConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Database("config store lock poisoned".to_string())
    }
}

#[async_trait::async_trait]
impl ConfigRepository for InMemoryConfigRepository {
    async fn get(&self, key: &str) -> Result<Option<ConfigEntry>, StoreError> {
        let map = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(map.get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<ConfigEntry>, StoreError> {
        let map = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(map.values().cloned().collect())
    }

    async fn upsert(&self, write: ConfigWrite, now: DateTime<Utc>) -> Result<ConfigUpsert, StoreError> {
        let mut map = self.inner.write().map_err(|_| Self::poisoned())?;
        let previous = map.get(&write.key).cloned();

        let current = match &previous {
            Some(existing) => ConfigEntry {
                key: existing.key.clone(),
                value: write.value.clone(),
                description: write
                    .description_update()
                    .map(str::to_string)
                    .or_else(|| existing.description.clone()),
                updated_at: Some(now),
            },
            None => ConfigEntry {
                key: write.key.clone(),
                value: write.value.clone(),
                description: write.description.clone(),
                updated_at: None,
            },
        };

        map.insert(write.key, current.clone());
        Ok(ConfigUpsert { previous, current })
    }

    async fn insert(&self, write: ConfigWrite, _now: DateTime<Utc>) -> Result<ConfigEntry, StoreError> {
        let mut map = self.inner.write().map_err(|_| Self::poisoned())?;
        if map.contains_key(&write.key) {
            return Err(StoreError::Conflict(format!(
                "configuration key '{}' already exists",
                write.key
            )));
        }

        let entry = ConfigEntry {
            key: write.key.clone(),
            value: write.value,
            description: write.description,
            updated_at: None,
        };
        map.insert(write.key, entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(key: &str, value: &str, description: Option<&str>) -> ConfigWrite {
        ConfigWrite {
            key: key.to_string(),
            value: value.to_string(),
            description: description.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let repo = InMemoryConfigRepository::new();
        assert_eq!(repo.seed_defaults().await.unwrap(), DEFAULT_CONFIGS.len());
        assert_eq!(repo.seed_defaults().await.unwrap(), 0);

        let theme = repo.get("theme").await.unwrap().unwrap();
        assert_eq!(theme.value, "dark");
        assert_eq!(repo.list().await.unwrap().len(), DEFAULT_CONFIGS.len());
    }

    #[tokio::test]
    async fn seeding_keeps_existing_values() {
        let repo = InMemoryConfigRepository::new();
        repo.insert(write("theme", "light", None), Utc::now()).await.unwrap();
        repo.seed_defaults().await.unwrap();

        assert_eq!(repo.get("theme").await.unwrap().unwrap().value, "light");
    }

    #[tokio::test]
    async fn upsert_reports_previous_value() {
        let repo = InMemoryConfigRepository::new();
        repo.seed_defaults().await.unwrap();

        let result = repo.upsert(write("theme", "light", None), Utc::now()).await.unwrap();
        assert_eq!(result.previous.unwrap().value, "dark");
        assert_eq!(result.current.value, "light");
        assert_eq!(result.current.description.as_deref(), Some("UI theme (light/dark)"));
        assert!(result.current.updated_at.is_some());
    }

    #[tokio::test]
    async fn upsert_creates_missing_key() {
        let repo = InMemoryConfigRepository::new();
        let result = repo
            .upsert(write("banner", "hello", Some("Login banner")), Utc::now())
            .await
            .unwrap();

        assert!(result.previous.is_none());
        assert_eq!(repo.get("banner").await.unwrap(), Some(result.current));
    }

    #[tokio::test]
    async fn racing_first_writes_report_the_value_they_replaced() {
        let repo = Arc::new(InMemoryConfigRepository::new());
        let (a, b) = tokio::join!(
            repo.upsert(write("banner", "from-a", None), Utc::now()),
            repo.upsert(write("banner", "from-b", None), Utc::now()),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let (first, second) = if a.previous.is_none() { (a, b) } else { (b, a) };
        assert!(first.previous.is_none());
        assert_eq!(second.previous, Some(first.current.clone()));
        assert_eq!(repo.get("banner").await.unwrap(), Some(second.current));
    }

    #[tokio::test]
    async fn insert_rejects_existing_key() {
        let repo = InMemoryConfigRepository::new();
        repo.insert(write("k", "v", None), Utc::now()).await.unwrap();
        let err = repo.insert(write("k", "w", None), Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn validation_limits() {
        assert!(write("", "v", None).validate().is_err());
        assert!(write(&"k".repeat(101), "v", None).validate().is_err());
        assert!(write("k", &"v".repeat(501), None).validate().is_err());
        assert!(write("k", "v", Some(&"d".repeat(256))).validate().is_err());
        assert!(write("k", "v", Some("fine")).validate().is_ok());
    }
}
