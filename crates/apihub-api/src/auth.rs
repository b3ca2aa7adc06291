use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use axum::{Form, Json, extract::State, response::IntoResponse};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{info, warn};
use uuid::Uuid;

use apihub_db::models::UserRow;
use apihub_db::queries;
use apihub_types::api::{Claims, LoginForm};
use apihub_types::models::TokenResponse;

use crate::error::ApiError;
use crate::state::AppState;

/// Verified against when the email is unknown, so a miss costs as much as a
/// wrong password.
const DUMMY_PASSWORD: &str = "DUMMY_HASH_vnVoKIj501AlSSBhmH4SZA752RAi4N7VF4";

const BAD_CREDENTIALS: &str = "Incorrect email or password";
const INVALID_TOKEN: &str = "Could not validate credentials";

/// Argon2id hashing with fixed cost parameters.
pub struct Passwords {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl Passwords {
    pub fn new(params: Params) -> anyhow::Result<Self> {
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, DUMMY_PASSWORD)?;
        Ok(Self { argon2, dummy_hash })
    }

    pub fn hash(&self, password: &str) -> anyhow::Result<String> {
        hash_with(&self.argon2, password)
    }

    /// False for a wrong password or an unparseable stored hash.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self.argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                warn!("Stored password hash is unreadable: {}", e);
                false
            }
        }
    }

    /// Burns one verification against the dummy hash.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// Signing material for access tokens.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: chrono::Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, algorithm: Algorithm, ttl: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            exp: (chrono::Utc::now() + self.ttl).timestamp().max(0) as usize,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Checks signature, algorithm and expiry.
    pub fn decode(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::new(self.algorithm))
            .map_err(|_| ApiError::Unauthorized(INVALID_TOKEN))?;
        Ok(token_data.claims)
    }
}

/// Looks up the user by email and checks the password. Unknown emails still
/// pay for one hash verification.
pub async fn authenticate(
    state: &AppState,
    email: String,
    password: String,
) -> Result<Option<UserRow>, ApiError> {
    let lookup = email.trim().to_string();
    let user = state
        .transaction(move |conn| Ok(queries::user_by_email(conn, &lookup)?))
        .await?;

    state
        .blocking(move |state| {
            let Some(user) = user else {
                state.passwords.verify_dummy(&password);
                return Ok(None);
            };
            if state.passwords.verify(&password, &user.hashed_password) {
                Ok(Some(user))
            } else {
                Ok(None)
            }
        })
        .await
}

/// Resolves a bearer token to a stored user.
pub async fn resolve_token(state: &AppState, token: &str) -> Result<UserRow, ApiError> {
    let claims = state.tokens.decode(token)?;
    let user_id = claims.sub.to_string();

    state
        .transaction(move |conn| {
            queries::user_by_id(conn, &user_id)?.ok_or(ApiError::Unauthorized(INVALID_TOKEN))
        })
        .await
}

/// POST /user/token: OAuth2 password form login.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, form.username, form.password)
        .await?
        .ok_or(ApiError::Unauthorized(BAD_CREDENTIALS))?;

    if !user.active {
        return Err(ApiError::Unauthorized("Account is not active"));
    }

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;
    let token = state.tokens.issue(user_id)?;

    info!("User {} logged in", user.email);
    Ok(Json(TokenResponse::bearer(token)))
}
