use crate::accounts::{
    memory::InMemoryAccountStore,
    repo::{AccountStore, PgAccountStore},
    services::AccountService,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
}

impl AppState {
    pub fn from_parts(store: Arc<dyn AccountStore>) -> Self {
        Self {
            accounts: AccountService::new(store),
        }
    }

    pub fn with_pool(db: PgPool) -> Self {
        Self::from_parts(Arc::new(PgAccountStore::new(db)))
    }

    /// State backed by an empty in-memory store; no database involved.
    pub fn fake() -> Self {
        Self::from_parts(Arc::new(InMemoryAccountStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::dto::CreateAccountRequest;

    #[tokio::test]
    async fn clones_share_one_store() {
        let state = AppState::fake();
        let other = state.clone();
        assert!(other.accounts.list_all().await.unwrap().is_empty());

        let req = CreateAccountRequest {
            username: Some("alice01".into()),
            email: Some("a@example.com".into()),
            password: Some("secret1".into()),
            role: None,
        };
        state.accounts.create(&req).await.unwrap();
        assert_eq!(other.accounts.list_all().await.unwrap().len(), 1);
    }
}
