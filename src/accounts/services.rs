use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::accounts::{
    dto::{CreateAccountRequest, PublicAccount, UpdateAccountRequest},
    error::{AccountError, AccountResult, StoreError},
    password,
    repo::AccountStore,
    repo_types::{AccountChanges, NewAccount},
    validation::{validate_create, validate_update},
};

/// Account operations: validation, uniqueness pre-checks, hashing, persistence and
/// sanitized output.
///
/// The pre-checks only exist to produce an early, friendly error. Two concurrent
/// writers can both pass them; the store's unique constraints then reject the loser,
/// which surfaces here as [`AccountError::Conflict`].
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, req))]
    pub async fn create(&self, req: &CreateAccountRequest) -> AccountResult<PublicAccount> {
        let input = validate_create(req).map_err(|issues| {
            warn!(issues = issues.len(), "create rejected by validation");
            AccountError::Validation(issues)
        })?;

        if let Some(existing) = self
            .store
            .find_by_username_or_email(&input.username, &input.email)
            .await?
        {
            warn!(existing_id = %existing.id, "username or email already in use");
            return Err(AccountError::Conflict);
        }

        let password_hash = password::hash_password_blocking(input.password)
            .await
            .map_err(AccountError::Internal)?;

        let account = self
            .store
            .insert(NewAccount {
                username: input.username,
                email: input.email,
                password_hash,
                role: input.role,
            })
            .await
            .map_err(|e| {
                if matches!(e, StoreError::Conflict) {
                    warn!("insert hit a unique constraint after passing the pre-check");
                }
                AccountError::from(e)
            })?;

        info!(account_id = %account.id, username = %account.username, role = %account.role, "account created");
        Ok(account.into())
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> AccountResult<Vec<PublicAccount>> {
        let accounts = self.store.list_all().await?;
        info!(count = accounts.len(), "accounts listed");
        Ok(accounts.into_iter().map(PublicAccount::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_by_username(&self, username: &str) -> AccountResult<PublicAccount> {
        require_username(username)?;

        match self.store.find_by_username(username).await? {
            Some(account) => Ok(account.into()),
            None => {
                warn!(%username, "account not found");
                Err(AccountError::NotFound(username.to_string()))
            }
        }
    }

    #[instrument(skip(self, req))]
    pub async fn update(
        &self,
        username: &str,
        req: &UpdateAccountRequest,
    ) -> AccountResult<PublicAccount> {
        require_username(username)?;

        let input = validate_update(req).map_err(|issues| {
            warn!(issues = issues.len(), "update rejected by validation");
            AccountError::Validation(issues)
        })?;

        let current = self.store.find_by_username(username).await?.ok_or_else(|| {
            warn!(%username, "account not found");
            AccountError::NotFound(username.to_string())
        })?;

        if let Some(new_username) = input.username.as_deref() {
            if new_username != current.username {
                if let Some(other) = self.store.find_by_username(new_username).await? {
                    if other.id != current.id {
                        warn!(account_id = %current.id, "new username already in use");
                        return Err(AccountError::Conflict);
                    }
                }
            }
        }

        if let Some(new_email) = input.email.as_deref() {
            if new_email != current.email {
                if let Some(other) = self.store.find_by_email(new_email).await? {
                    if other.id != current.id {
                        warn!(account_id = %current.id, "new email already in use");
                        return Err(AccountError::Conflict);
                    }
                }
            }
        }

        let password_hash = match input.password {
            Some(plain) => Some(
                password::hash_password_blocking(plain)
                    .await
                    .map_err(AccountError::Internal)?,
            ),
            None => None,
        };

        let changes = AccountChanges {
            username: input.username,
            email: input.email,
            password_hash,
        };
        let password_changed = changes.password_hash.is_some();

        let account = match self.store.update(current.id, changes).await {
            Ok(a) => a,
            Err(StoreError::Missing) => {
                warn!(account_id = %current.id, "account disappeared before update");
                return Err(AccountError::NotFound(username.to_string()));
            }
            Err(StoreError::Conflict) => {
                warn!(account_id = %current.id, "update hit a unique constraint after passing the pre-check");
                return Err(AccountError::Conflict);
            }
            Err(e) => return Err(e.into()),
        };

        info!(account_id = %account.id, password_changed, "account updated");
        Ok(account.into())
    }
}

fn require_username(username: &str) -> AccountResult<()> {
    if username.trim().is_empty() {
        return Err(AccountError::invalid("username", "username is required"));
    }
    Ok(())
}
