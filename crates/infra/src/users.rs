//! User account storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use adminhub_auth::UserAccount;
use adminhub_core::{Email, UserId};

use crate::StoreError;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserAccount>, StoreError>;

    /// All accounts, oldest first.
    async fn list(&self) -> Result<Vec<UserAccount>, StoreError>;

    /// Store a new account. Fails with `Conflict` when the e-mail is taken.
    async fn insert(&self, account: UserAccount) -> Result<UserAccount, StoreError>;

    /// Replace an existing account and return it with its version bumped.
    ///
    /// `account.version` must equal the stored version, otherwise the write
    /// fails with `Concurrency` and nothing changes. Fails with `NotFound`
    /// when the account does not exist.
    async fn update(&self, account: UserAccount) -> Result<UserAccount, StoreError>;
}

#[async_trait::async_trait]
impl<S> UserRepository for Arc<S>
where
    S: UserRepository + ?Sized,
{
    async fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        (**self).get(id).await
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserAccount>, StoreError> {
        (**self).find_by_email(email).await
    }

    async fn list(&self) -> Result<Vec<UserAccount>, StoreError> {
        (**self).list().await
    }

    async fn insert(&self, account: UserAccount) -> Result<UserAccount, StoreError> {
        (**self).insert(account).await
    }

    async fn update(&self, account: UserAccount) -> Result<UserAccount, StoreError> {
        (**self).update(account).await
    }
}

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<HashMap<UserId, UserAccount>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<UserId, UserAccount>>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Database("user store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<UserId, UserAccount>>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Database("user store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.read()?.values().find(|u| &u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<UserAccount>, StoreError> {
        let mut users: Vec<UserAccount> = self.read()?.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn insert(&self, account: UserAccount) -> Result<UserAccount, StoreError> {
        let mut map = self.write()?;

        if map.values().any(|u| u.email == account.email) {
            return Err(StoreError::Conflict(format!(
                "email '{}' is already registered",
                account.email
            )));
        }
        if map.contains_key(&account.id) {
            return Err(StoreError::Conflict(format!("user {} already exists", account.id)));
        }

        map.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update(&self, mut account: UserAccount) -> Result<UserAccount, StoreError> {
        let mut map = self.write()?;

        let stored_version = map
            .get(&account.id)
            .map(|u| u.version)
            .ok_or(StoreError::NotFound)?;
        if stored_version != account.version {
            return Err(StoreError::Concurrency(format!(
                "user {} was modified concurrently: expected version {}, found {}",
                account.id, account.version, stored_version
            )));
        }

        if map
            .values()
            .any(|u| u.id != account.id && u.email == account.email)
        {
            return Err(StoreError::Conflict(format!(
                "email '{}' is already registered",
                account.email
            )));
        }

        account.version += 1;
        map.insert(account.id, account.clone());
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use adminhub_auth::{AccountUpdate, Role};
    use chrono::{Duration, Utc};

    use super::*;

    fn account(email: &str) -> UserAccount {
        UserAccount::new(Email::parse(email).unwrap(), Role::User, Utc::now())
    }

    #[tokio::test]
    async fn insert_then_lookup() {
        let repo = InMemoryUserRepository::new();
        let alice = repo.insert(account("alice@example.com")).await.unwrap();

        assert_eq!(repo.get(alice.id).await.unwrap(), Some(alice.clone()));
        assert_eq!(
            repo.find_by_email(&Email::parse("ALICE@example.com").unwrap())
                .await
                .unwrap()
                .map(|u| u.id),
            Some(alice.id)
        );
        assert!(repo.get(UserId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let repo = InMemoryUserRepository::new();
        repo.insert(account("alice@example.com")).await.unwrap();

        let err = repo.insert(account("alice@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_requires_existing_account() {
        let repo = InMemoryUserRepository::new();
        let err = repo.update(account("ghost@example.com")).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound);

        let mut alice = repo.insert(account("alice@example.com")).await.unwrap();
        alice.assign_role(Role::Manager, Utc::now());
        let stored = repo.update(alice.clone()).await.unwrap();

        assert_eq!(stored.version, 1);
        assert_eq!(repo.get(alice.id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn stale_write_does_not_revert_a_committed_change() {
        let repo = InMemoryUserRepository::new();
        let bob = repo.insert(account("bob@example.com")).await.unwrap();

        let mut first = repo.get(bob.id).await.unwrap().unwrap();
        let mut second = repo.get(bob.id).await.unwrap().unwrap();

        second.assign_role(Role::Viewer, Utc::now());
        repo.update(second).await.unwrap();

        first.apply_update(
            &AccountUpdate {
                is_active: Some(false),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        let err = repo.update(first).await.unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        let stored = repo.get(bob.id).await.unwrap().unwrap();
        assert_eq!(stored.role, "viewer");
        assert!(stored.is_active);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn reloaded_account_can_be_updated_after_a_conflict() {
        let repo = InMemoryUserRepository::new();
        let bob = repo.insert(account("bob@example.com")).await.unwrap();

        let mut stale = bob.clone();
        let mut fresh = bob.clone();
        fresh.assign_role(Role::Editor, Utc::now());
        repo.update(fresh).await.unwrap();

        stale.assign_role(Role::Manager, Utc::now());
        assert!(repo.update(stale).await.is_err());

        let mut reloaded = repo.get(bob.id).await.unwrap().unwrap();
        reloaded.assign_role(Role::Manager, Utc::now());
        let stored = repo.update(reloaded).await.unwrap();
        assert_eq!(stored.role, "manager");
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn list_is_oldest_first() {
        let repo = InMemoryUserRepository::new();
        let mut older = account("older@example.com");
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = account("newer@example.com");

        repo.insert(newer.clone()).await.unwrap();
        repo.insert(older.clone()).await.unwrap();

        let ids: Vec<UserId> = repo.list().await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![older.id, newer.id]);
    }

    #[tokio::test]
    async fn arc_wrapped_repository_delegates() {
        let repo: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        repo.insert(account("alice@example.com")).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }
}
