use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::accounts::{
    error::StoreError,
    repo_types::{Account, AccountChanges, NewAccount},
};

/// Persistence for accounts. Implementations must enforce uniqueness of `username`
/// and `email` themselves and report a violated constraint as [`StoreError::Conflict`].
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Exact, case-sensitive username match.
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;
    /// Exact match on an email the caller has already lowercased.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    /// Any one account whose username equals `username` or whose email equals `email`.
    /// Which one is unspecified when two different accounts match.
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<Account>, StoreError>;
    /// Stores a new account and returns it with its generated id and timestamps.
    /// A duplicate username or email is [`StoreError::Conflict`].
    async fn insert(&self, record: NewAccount) -> Result<Account, StoreError>;
    /// Applies only the `Some` fields of `changes`, keeps the rest, and bumps
    /// `updated_at`. [`StoreError::Missing`] if `id` is gone, [`StoreError::Conflict`]
    /// if the new username or email belongs to another account.
    async fn update(&self, id: Uuid, changes: AccountChanges) -> Result<Account, StoreError>;
    /// Every account, in no particular order.
    async fn list_all(&self) -> Result<Vec<Account>, StoreError>;
}

const COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";

#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {COLUMNS} FROM accounts WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {COLUMNS} FROM accounts WHERE username = $1 OR email = $2 LIMIT 1"
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn insert(&self, record: NewAccount) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&record.username)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.role)
        .fetch_one(&self.db)
        .await?;
        Ok(account)
    }

    async fn update(&self, id: Uuid, changes: AccountChanges) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts
               SET username      = COALESCE($2, username),
                   email         = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash),
                   updated_at    = now()
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .fetch_optional(&self.db)
        .await?;
        account.ok_or(StoreError::Missing)
    }

    async fn list_all(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query_as::<_, Account>(&format!("SELECT {COLUMNS} FROM accounts"))
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repo_types::Role;

    // Runs only against a real database: TEST_DATABASE_URL=postgres://... cargo test
    async fn store() -> Option<PgAccountStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to test database");
        crate::db::migrate(&db).await.expect("migrations");
        Some(PgAccountStore::new(db))
    }

    fn record(tag: &str) -> NewAccount {
        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        NewAccount {
            username: format!("{tag}_{suffix}"),
            email: format!("{tag}_{suffix}@example.com"),
            password_hash: "$argon2id$v=19$placeholder".into(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn insert_conflict_and_partial_update() {
        let Some(store) = store().await else {
            return;
        };

        let rec = record("pg");
        let created = store.insert(rec.clone()).await.expect("insert");
        assert_eq!(created.role, Role::User);

        let mut dup = record("pg");
        dup.username = rec.username.clone();
        assert!(matches!(store.insert(dup).await, Err(StoreError::Conflict)));

        let updated = store
            .update(
                created.id,
                AccountChanges {
                    email: Some(format!("new_{}", rec.email)),
                    ..Default::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.username, rec.username);
        assert_eq!(updated.password_hash, rec.password_hash);
        assert!(updated.updated_at >= created.updated_at);

        let found = store
            .find_by_username_or_email("nobody-here", &updated.email)
            .await
            .unwrap();
        assert_eq!(found.map(|a| a.id), Some(created.id));

        assert!(matches!(
            store.update(Uuid::new_v4(), AccountChanges::default()).await,
            Err(StoreError::Missing)
        ));
    }
}
