//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Database` |
//! | Decode / ColumnNotFound | N/A | `Corrupt` |
//! | Other | N/A | `Database` |
//!
//! ## Thread Safety
//!
//! Both repositories are `Send + Sync` and share one SQLx connection pool.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use adminhub_auth::{Profile, UserAccount};
use adminhub_core::{Email, UserId};

use crate::system_config::{ConfigEntry, ConfigRepository, ConfigUpsert, ConfigWrite};
use crate::users::UserRepository;
use crate::StoreError;

/// Open a connection pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Create tables when they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id              UUID PRIMARY KEY,
            email           VARCHAR(255) NOT NULL UNIQUE,
            role            VARCHAR(20)  NOT NULL DEFAULT 'user',
            is_active       BOOLEAN      NOT NULL DEFAULT TRUE,
            full_name       VARCHAR(255),
            phone           VARCHAR(50),
            address         VARCHAR(500),
            city            VARCHAR(100),
            country         VARCHAR(100),
            department      VARCHAR(100),
            job_title       VARCHAR(100),
            date_of_birth   VARCHAR(20),
            avatar_url      VARCHAR(500),
            created_at      TIMESTAMPTZ  NOT NULL DEFAULT now(),
            updated_at      TIMESTAMPTZ,
            version         BIGINT       NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("create_users", e))?;

    sqlx::query("ALTER TABLE users ADD COLUMN IF NOT EXISTS version BIGINT NOT NULL DEFAULT 0")
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("add_users_version", e))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS system_config (
            key             VARCHAR(100) PRIMARY KEY,
            value           VARCHAR(500) NOT NULL,
            description     VARCHAR(255),
            updated_at      TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("create_system_config", e))?;

    Ok(())
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Unique violation
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(format!("{operation}: {err}"))
        }
        other => StoreError::Database(format!("{operation}: {other}")),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

const USER_COLUMNS: &str = "id, email, role, is_active, full_name, phone, address, city, \
     country, department, job_title, date_of_birth, avatar_url, created_at, updated_at, version";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<UserAccount, StoreError> {
    let decode = |e| map_sqlx_error("decode_user", e);

    let email: String = row.try_get("email").map_err(decode)?;
    let email = Email::parse(&email)
        .map_err(|e| StoreError::Corrupt(format!("users.email '{email}': {e}")))?;

    Ok(UserAccount {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        email,
        role: row.try_get("role").map_err(decode)?,
        is_active: row.try_get("is_active").map_err(decode)?,
        profile: Profile {
            full_name: row.try_get("full_name").map_err(decode)?,
            phone: row.try_get("phone").map_err(decode)?,
            address: row.try_get("address").map_err(decode)?,
            city: row.try_get("city").map_err(decode)?,
            country: row.try_get("country").map_err(decode)?,
            department: row.try_get("department").map_err(decode)?,
            job_title: row.try_get("job_title").map_err(decode)?,
            date_of_birth: row.try_get("date_of_birth").map_err(decode)?,
            avatar_url: row.try_get("avatar_url").map_err(decode)?,
        },
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
        updated_at: row.try_get::<Option<DateTime<Utc>>, _>("updated_at").map_err(decode)?,
        version: row.try_get("version").map_err(decode)?,
    })
}

#[async_trait::async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self), fields(operation = "get_user"))]
    async fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(operation = "find_user_by_email"))]
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<UserAccount>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self, account), fields(user_id = %account.id))]
    async fn insert(&self, account: UserAccount) -> Result<UserAccount, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, role, is_active, full_name, phone, address, city,
                               country, department, job_title, date_of_birth, avatar_url,
                               created_at, updated_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(account.email.as_str())
        .bind(&account.role)
        .bind(account.is_active)
        .bind(&account.profile.full_name)
        .bind(&account.profile.phone)
        .bind(&account.profile.address)
        .bind(&account.profile.city)
        .bind(&account.profile.country)
        .bind(&account.profile.department)
        .bind(&account.profile.job_title)
        .bind(&account.profile.date_of_birth)
        .bind(&account.profile.avatar_url)
        .bind(account.created_at)
        .bind(account.updated_at)
        .bind(account.version)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        Ok(account)
    }

    #[instrument(skip(self, account), fields(user_id = %account.id, expected_version = account.version))]
    async fn update(&self, account: UserAccount) -> Result<UserAccount, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
               SET email = $2, role = $3, is_active = $4, full_name = $5, phone = $6,
                   address = $7, city = $8, country = $9, department = $10, job_title = $11,
                   date_of_birth = $12, avatar_url = $13, updated_at = $14,
                   version = version + 1
             WHERE id = $1 AND version = $15
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(account.id.as_uuid())
        .bind(account.email.as_str())
        .bind(&account.role)
        .bind(account.is_active)
        .bind(&account.profile.full_name)
        .bind(&account.profile.phone)
        .bind(&account.profile.address)
        .bind(&account.profile.city)
        .bind(&account.profile.country)
        .bind(&account.profile.department)
        .bind(&account.profile.job_title)
        .bind(&account.profile.date_of_birth)
        .bind(&account.profile.avatar_url)
        .bind(account.updated_at)
        .bind(account.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;

        if let Some(row) = row {
            return user_from_row(&row);
        }

        // No row matched: either the account is gone or its version moved on.
        let stored_version: Option<i64> = sqlx::query_scalar("SELECT version FROM users WHERE id = $1")
            .bind(account.id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("check_user_version", e))?;

        match stored_version {
            None => Err(StoreError::NotFound),
            Some(found) => Err(StoreError::Concurrency(format!(
                "user {} was modified concurrently: expected version {}, found {}",
                account.id, account.version, found
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// System configuration
// ─────────────────────────────────────────────────────────────────────────────

pub struct PgConfigRepository {
    pool: PgPool,
}

impl PgConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn config_from_row(row: &PgRow) -> Result<ConfigEntry, StoreError> {
    let decode = |e| map_sqlx_error("decode_config", e);
    Ok(ConfigEntry {
        key: row.try_get("key").map_err(decode)?,
        value: row.try_get("value").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

#[async_trait::async_trait]
impl ConfigRepository for PgConfigRepository {
    async fn get(&self, key: &str) -> Result<Option<ConfigEntry>, StoreError> {
        let row = sqlx::query(
            "SELECT key, value, description, updated_at FROM system_config WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_config", e))?;

        row.as_ref().map(config_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<ConfigEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT key, value, description, updated_at FROM system_config ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_config", e))?;

        rows.iter().map(config_from_row).collect()
    }

    #[instrument(skip(self, write), fields(key = %write.key))]
    async fn upsert(&self, write: ConfigWrite, now: DateTime<Utc>) -> Result<ConfigUpsert, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_upsert_config", e))?;

        let description = write.description.as_deref().filter(|d| !d.is_empty());

        // A concurrent first write of the same key blocks here on the unique
        // index until the other transaction commits, then inserts nothing.
        let created = sqlx::query(
            r#"
            INSERT INTO system_config (key, value, description, updated_at)
            VALUES ($1, $2, $3, NULL)
            ON CONFLICT (key) DO NOTHING
            RETURNING key, value, description, updated_at
            "#,
        )
        .bind(&write.key)
        .bind(&write.value)
        .bind(description)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_config", e))?;

        if let Some(row) = created {
            let current = config_from_row(&row)?;
            tx.commit()
                .await
                .map_err(|e| map_sqlx_error("commit_upsert_config", e))?;
            return Ok(ConfigUpsert { previous: None, current });
        }

        let previous = sqlx::query(
            "SELECT key, value, description, updated_at FROM system_config WHERE key = $1 FOR UPDATE",
        )
        .bind(&write.key)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_config", e))?;
        let previous = config_from_row(&previous)?;

        // Existing rows keep their description unless a non-empty one is supplied.
        let row = sqlx::query(
            r#"
            UPDATE system_config
               SET value = $2,
                   description = COALESCE($3, description),
                   updated_at = $4
             WHERE key = $1
            RETURNING key, value, description, updated_at
            "#,
        )
        .bind(&write.key)
        .bind(&write.value)
        .bind(description)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_config", e))?;
        let current = config_from_row(&row)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_upsert_config", e))?;

        Ok(ConfigUpsert {
            previous: Some(previous),
            current,
        })
    }

    async fn insert(&self, write: ConfigWrite, _now: DateTime<Utc>) -> Result<ConfigEntry, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO system_config (key, value, description, updated_at)
            VALUES ($1, $2, $3, NULL)
            RETURNING key, value, description, updated_at
            "#,
        )
        .bind(&write.key)
        .bind(&write.value)
        .bind(&write.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_sqlx_error("insert_config", e) {
            StoreError::Conflict(_) => StoreError::Conflict(format!(
                "configuration key '{}' already exists",
                write.key
            )),
            other => other,
        })?;

        config_from_row(&row)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use adminhub_auth::Role;

    use super::*;

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
        let pool = connect(&url, 4).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        pool
    }

    fn write(key: &str, value: &str) -> ConfigWrite {
        ConfigWrite {
            key: key.to_string(),
            value: value.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn racing_first_config_writes_see_each_other() {
        let repo = Arc::new(PgConfigRepository::new(pool().await));
        let key = format!("race-{}", Uuid::now_v7());

        let (a, b) = tokio::join!(
            repo.upsert(write(&key, "from-a"), Utc::now()),
            repo.upsert(write(&key, "from-b"), Utc::now()),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let (first, second) = if a.previous.is_none() { (a, b) } else { (b, a) };
        assert!(first.previous.is_none());
        assert_eq!(second.previous.map(|e| e.value), Some(first.current.value));
        assert_eq!(repo.get(&key).await.unwrap().map(|e| e.value), Some(second.current.value));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn stale_user_write_is_rejected() {
        let repo = PgUserRepository::new(pool().await);
        let email = Email::parse(&format!("race-{}@example.com", Uuid::now_v7())).unwrap();
        let bob = repo
            .insert(UserAccount::new(email, Role::User, Utc::now()))
            .await
            .unwrap();

        let mut first = bob.clone();
        let mut second = bob.clone();
        second.assign_role(Role::Viewer, Utc::now());
        assert_eq!(repo.update(second).await.unwrap().version, 1);

        first.is_active = false;
        let err = repo.update(first).await.unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        let stored = repo.get(bob.id).await.unwrap().unwrap();
        assert_eq!(stored.role, "viewer");
        assert!(stored.is_active);

        let mut ghost = bob.clone();
        ghost.id = UserId::new();
        assert_eq!(repo.update(ghost).await.unwrap_err(), StoreError::NotFound);
    }
}
