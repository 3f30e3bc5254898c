use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    accounts::{
        dto::{
            AccountEnvelope, AccountListEnvelope, CreateAccountRequest, CreatedAccount,
            PublicAccount, UpdateAccountRequest, UpdatedAccount,
        },
        error::{AccountError, AccountResult},
    },
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_accounts))
        .route("/register", post(register))
        .route("/:username", get(get_account).put(update_account))
}

fn body_error(rejection: JsonRejection) -> AccountError {
    warn!(error = %rejection, "unreadable request body");
    AccountError::invalid("body", &rejection.body_text())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> AccountResult<(StatusCode, Json<AccountEnvelope<CreatedAccount>>)> {
    let Json(req) = payload.map_err(body_error)?;
    let account = state.accounts.create(&req).await?;
    Ok((
        StatusCode::CREATED,
        Json(AccountEnvelope {
            message: "account created",
            user: account.into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_accounts(State(state): State<AppState>) -> AccountResult<Json<AccountListEnvelope>> {
    let users = state.accounts.list_all().await?;
    Ok(Json(AccountListEnvelope {
        message: "accounts retrieved",
        count: users.len(),
        users,
    }))
}

#[instrument(skip(state))]
pub async fn get_account(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AccountResult<Json<AccountEnvelope<PublicAccount>>> {
    let user = state.accounts.get_by_username(&username).await?;
    Ok(Json(AccountEnvelope {
        message: "account retrieved",
        user,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_account(
    State(state): State<AppState>,
    Path(username): Path<String>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> AccountResult<Json<AccountEnvelope<UpdatedAccount>>> {
    let Json(req) = payload.map_err(body_error)?;
    let account = state.accounts.update(&username, &req).await?;
    Ok(Json(AccountEnvelope {
        message: "account updated",
        user: account.into(),
    }))
}
