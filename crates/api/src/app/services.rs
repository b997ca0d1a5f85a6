//! Store and audit wiring, plus the startup tasks run before serving.

use std::sync::Arc;

use chrono::Utc;

use adminhub_audit::{AuditEmitter, AuditSink, StdoutSink, TracingSink};
use adminhub_auth::{Authenticator, Role, RolePermissions, UserAccount};
use adminhub_core::Email;
use adminhub_infra::{
    ConfigRepository, InMemoryConfigRepository, InMemoryUserRepository, PgConfigRepository,
    PgUserRepository, StoreError, UserRepository,
};

use crate::app::AppState;
use crate::config::{AppConfig, AuditSinkKind};
use crate::jwt::Hs256Authenticator;

const PG_MAX_CONNECTIONS: u32 = 10;

impl AppState {
    /// State backed by in-memory stores (dev/test).
    pub fn in_memory(audit: AuditEmitter, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            configs: Arc::new(InMemoryConfigRepository::new()),
            catalog: Arc::new(RolePermissions::standard()),
            audit,
            authenticator,
        }
    }
}

/// Build the application state described by `config`.
///
/// Connects to Postgres and creates the schema when `DATABASE_URL` is set;
/// otherwise everything lives in memory for the lifetime of the process.
pub async fn build_state(config: &AppConfig) -> Result<AppState, StoreError> {
    let sink: Arc<dyn AuditSink> = match config.audit_sink {
        AuditSinkKind::Stdout => Arc::new(StdoutSink),
        AuditSinkKind::Tracing => Arc::new(TracingSink),
    };
    let audit = AuditEmitter::new(sink);
    let authenticator: Arc<dyn Authenticator> =
        Arc::new(Hs256Authenticator::new(config.jwt_secret.as_bytes()));

    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set; using in-memory stores");
        return Ok(AppState::in_memory(audit, authenticator));
    };

    let pool = adminhub_infra::connect(database_url, PG_MAX_CONNECTIONS).await?;
    adminhub_infra::ensure_schema(&pool).await?;
    tracing::info!("connected to postgres");

    Ok(AppState {
        users: Arc::new(PgUserRepository::new(pool.clone())),
        configs: Arc::new(PgConfigRepository::new(pool)),
        catalog: Arc::new(RolePermissions::standard()),
        audit,
        authenticator,
    })
}

/// Seed default configuration and, if requested, the bootstrap admin.
pub async fn prepare(state: &AppState, bootstrap_admin: Option<&Email>) -> Result<(), StoreError> {
    let seeded = state.configs.seed_defaults().await?;
    if seeded > 0 {
        tracing::info!(count = seeded, "seeded default configuration");
    }

    if let Some(email) = bootstrap_admin {
        ensure_admin(state.users.as_ref(), email).await?;
    }
    Ok(())
}

/// Make sure `email` exists, is active and holds the admin role.
pub async fn ensure_admin(users: &dyn UserRepository, email: &Email) -> Result<UserAccount, StoreError> {
    let now = Utc::now();

    match users.find_by_email(email).await? {
        None => {
            let account = users.insert(UserAccount::new(email.clone(), Role::Admin, now)).await?;
            tracing::info!(user = %email, "created bootstrap admin");
            Ok(account)
        }
        Some(mut account) => {
            let promoted = account.assign_role(Role::Admin, now).is_some();
            let reactivated = !account.is_active;
            if !promoted && !reactivated {
                return Ok(account);
            }
            account.is_active = true;
            account.updated_at = Some(now);
            tracing::info!(user = %email, "promoted bootstrap admin");
            users.update(account).await
        }
    }
}
