//! Infrastructure layer: persistence of user accounts and system configuration.
//!
//! Every store comes in two flavours behind one async trait: an in-memory
//! implementation for tests/dev and a Postgres one for deployments.

pub mod error;
pub mod postgres;
pub mod system_config;
pub mod users;

pub use error::StoreError;
pub use postgres::{PgConfigRepository, PgUserRepository, connect, ensure_schema};
pub use system_config::{
    ConfigEntry, ConfigRepository, ConfigUpsert, ConfigWrite, DEFAULT_CONFIGS,
    InMemoryConfigRepository,
};
pub use users::{InMemoryUserRepository, UserRepository};
