use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::accounts::{
    error::StoreError,
    repo::AccountStore,
    repo_types::{Account, AccountChanges, NewAccount},
};

/// In-memory [`AccountStore`] with the same two unique constraints as the table.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn taken(
        accounts: &HashMap<Uuid, Account>,
        except: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> bool {
        accounts.values().any(|a| {
            Some(a.id) != except
                && (username == Some(a.username.as_str()) || email == Some(a.email.as_str()))
        })
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.username == username || a.email == email)
            .cloned())
    }

    async fn insert(&self, record: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        if Self::taken(&accounts, None, Some(record.username.as_str()), Some(record.email.as_str())) {
            return Err(StoreError::Conflict);
        }

        let now = OffsetDateTime::now_utc();
        let account = Account {
            id: Uuid::new_v4(),
            username: record.username,
            email: record.email,
            password_hash: record.password_hash,
            role: record.role,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update(&self, id: Uuid, changes: AccountChanges) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        if Self::taken(
            &accounts,
            Some(id),
            changes.username.as_deref(),
            changes.email.as_deref(),
        ) {
            return Err(StoreError::Conflict);
        }

        let account = accounts.get_mut(&id).ok_or(StoreError::Missing)?;
        if let Some(username) = changes.username {
            account.username = username;
        }
        if let Some(email) = changes.email {
            account.email = email;
        }
        if let Some(hash) = changes.password_hash {
            account.password_hash = hash;
        }
        account.updated_at = OffsetDateTime::now_utc();
        Ok(account.clone())
    }

    async fn list_all(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repo_types::Role;

    fn record(username: &str, email: &str) -> NewAccount {
        NewAccount {
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn insert_enforces_both_unique_fields() {
        let store = InMemoryAccountStore::new();
        store.insert(record("alice01", "a@example.com")).await.unwrap();

        let same_username = store.insert(record("alice01", "b@example.com")).await;
        assert!(matches!(same_username, Err(StoreError::Conflict)));

        let same_email = store.insert(record("bob", "a@example.com")).await;
        assert!(matches!(same_email, Err(StoreError::Conflict)));

        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_is_partial_and_checks_others() {
        let store = InMemoryAccountStore::new();
        let alice = store.insert(record("alice01", "a@example.com")).await.unwrap();
        store.insert(record("bob", "b@example.com")).await.unwrap();

        let clash = store
            .update(
                alice.id,
                AccountChanges {
                    email: Some("b@example.com".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(clash, Err(StoreError::Conflict)));

        // Re-saving its own values is not a conflict.
        let same = store
            .update(
                alice.id,
                AccountChanges {
                    username: Some("alice01".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.email, "a@example.com");
        assert_eq!(same.password_hash, "hash");
    }

    #[tokio::test]
    async fn update_missing_record() {
        let store = InMemoryAccountStore::new();
        let res = store.update(Uuid::new_v4(), AccountChanges::default()).await;
        assert!(matches!(res, Err(StoreError::Missing)));
    }

    #[tokio::test]
    async fn lookups() {
        let store = InMemoryAccountStore::new();
        store.insert(record("alice01", "a@example.com")).await.unwrap();
        assert!(store.find_by_username("alice01").await.unwrap().is_some());
        assert!(store.find_by_username("Alice01").await.unwrap().is_none());
        assert!(store.find_by_email("a@example.com").await.unwrap().is_some());
        assert!(store
            .find_by_username_or_email("nobody", "a@example.com")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_by_username_or_email("nobody", "x@example.com")
            .await
            .unwrap()
            .is_none());
    }
}
