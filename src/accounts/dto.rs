use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::accounts::repo_types::{Account, Role};

/// Request body for account registration. Every field is optional at this stage so
/// that validation can report all missing fields together.
#[derive(Debug, Default, Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Request body for a profile update. There is deliberately no `role` here.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Account as returned to clients. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Account> for PublicAccount {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            username: a.username,
            email: a.email,
            role: a.role,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<PublicAccount> for CreatedAccount {
    fn from(a: PublicAccount) -> Self {
        Self {
            id: a.id,
            username: a.username,
            email: a.email,
            role: a.role,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<PublicAccount> for UpdatedAccount {
    fn from(a: PublicAccount) -> Self {
        Self {
            id: a.id,
            username: a.username,
            email: a.email,
            role: a.role,
            updated_at: a.updated_at,
        }
    }
}

/// `{message, user}` envelope.
#[derive(Debug, Serialize)]
pub struct AccountEnvelope<T> {
    pub message: &'static str,
    pub user: T,
}

/// `{message, count, users}` envelope for listings.
#[derive(Debug, Serialize)]
pub struct AccountListEnvelope {
    pub message: &'static str,
    pub count: usize,
    pub users: Vec<PublicAccount>,
}
