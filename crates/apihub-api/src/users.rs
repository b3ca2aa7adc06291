use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use apihub_db::models::NewUser;
use apihub_db::queries;
use apihub_types::api::{RegisterRequest, UserPatch};
use apihub_types::models::UserResponse;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::permissions::basic_info;
use crate::state::AppState;

const MAX_EMAIL_LEN: usize = 255;
const MAX_NICKNAME_CHARS: usize = 8;

/// POST /user/: register a new, inactive account.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_string();
    validate_email(&email)?;
    if req.password.is_empty() {
        return Err(ApiError::Validation("Password must not be empty".into()));
    }
    let nickname = clean_nickname(req.nickname)?;

    let password = req.password;
    let hashed_password = state
        .blocking(move |state| Ok(state.passwords.hash(&password)?))
        .await?;

    let user = state
        .transaction(move |conn| {
            if queries::user_by_email(conn, &email)?.is_some() {
                return Err(ApiError::BadRequest("Email already registered".into()));
            }
            Ok(queries::insert_user(
                conn,
                &NewUser {
                    email: &email,
                    hashed_password: &hashed_password,
                    nickname: nickname.as_deref(),
                    active: false,
                    is_superuser: false,
                },
            )?)
        })
        .await?;

    info!("User registered: {}", user.email);
    Ok((StatusCode::CREATED, Json(user.into_response())))
}

/// GET /user/me
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into_response())
}

/// PATCH /user/{id}: activate/deactivate or promote/demote an account.
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .transaction(move |conn| {
            basic_info(conn, &caller)?.require_elevated()?;

            let target = user_id.to_string();
            if queries::user_by_id(conn, &target)?.is_none() {
                return Err(ApiError::NotFound("User not found"));
            }
            queries::set_user_flags(conn, &target, patch.active, patch.is_superuser)?;
            queries::user_by_id(conn, &target)?
                .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("User {} vanished after update", target)))
        })
        .await?;

    info!("User {} updated (active={}, superuser={})", user.email, user.active, user.is_superuser);
    Ok(Json(user.into_response()))
}

/// Makes sure an active superuser with this email exists. Creates it when
/// missing; an existing account keeps its password and gets both superuser
/// flags and the active flag set.
pub async fn ensure_superuser(
    state: &AppState,
    email: String,
    password: String,
) -> Result<UserResponse, ApiError> {
    validate_email(&email)?;
    let hashed_password = state
        .blocking(move |state| Ok(state.passwords.hash(&password)?))
        .await?;

    let user = state
        .transaction(move |conn| {
            if let Some(existing) = queries::user_by_email(conn, &email)? {
                queries::set_user_flags(conn, &existing.id, Some(true), Some(true))?;
                return queries::user_by_id(conn, &existing.id)?
                    .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("User {} vanished", existing.id)));
            }
            Ok(queries::insert_user(
                conn,
                &NewUser {
                    email: &email,
                    hashed_password: &hashed_password,
                    nickname: None,
                    active: true,
                    is_superuser: true,
                },
            )?)
        })
        .await?;

    Ok(user.into_response())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let invalid = || ApiError::Validation(format!("'{}' is not a valid email address", email));

    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels_ok = domain.split('.').count() >= 2 && domain.split('.').all(|label| !label.is_empty());
    if !labels_ok {
        return Err(invalid());
    }
    Ok(())
}

fn clean_nickname(nickname: Option<String>) -> Result<Option<String>, ApiError> {
    let Some(nickname) = nickname else {
        return Ok(None);
    };
    let nickname = nickname.trim();
    if nickname.is_empty() {
        return Ok(None);
    }
    if nickname.chars().count() > MAX_NICKNAME_CHARS {
        return Err(ApiError::Validation(format!(
            "Nickname must be at most {} characters",
            MAX_NICKNAME_CHARS
        )));
    }
    Ok(Some(nickname.to_string()))
}
