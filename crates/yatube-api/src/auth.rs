use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use tracing::info;

use yatube_db::UsernameTaken;
use yatube_types::api::{AuthResponse, Claims, LoginPage, LoginRequest, SignupRequest};

use crate::error::ApiError;
use crate::state::{AppState, blocking};

const MAX_USERNAME_LEN: usize = 150;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&req.username)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    // Check if username is taken
    let username = req.username.clone();
    if blocking(&state, move |repo| repo.get_user_by_username(&username))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(UsernameTaken(req.username).to_string()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    // A concurrent signup can still win the name between the check and here
    let username = req.username.clone();
    let user = match blocking(&state, move |repo| repo.create_user(&username, &password_hash)).await
    {
        Err(ApiError::Internal(e)) if e.is::<UsernameTaken>() => {
            return Err(ApiError::Conflict(e.to_string()));
        }
        result => result?,
    };

    let token = create_token(&state.jwt_secret, user.id, &user.username)?;
    info!("New user {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id: user.id,
            username: user.username,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.clone();
    let user = blocking(&state, move |repo| repo.get_credentials(&username))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash for user {} is unreadable: {}", user.id, e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let token = create_token(&state.jwt_secret, user.id, &user.username)?;

    Ok(Json(AuthResponse {
        user_id: user.id,
        username: user.username,
        token,
    }))
}

/// Where protected routes send anonymous visitors. Echoes `next` back so the
/// client knows where to return after logging in.
pub async fn login_page(Query(query): Query<LoginQuery>) -> Json<LoginPage> {
    Json(LoginPage {
        fields: vec!["username".to_string(), "password".to_string()],
        next: query.next,
    })
}

pub fn create_token(secret: &str, user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if !(3..=MAX_USERNAME_LEN).contains(&len) {
        return Err(ApiError::BadRequest(format!(
            "username must be 3 to {} characters",
            MAX_USERNAME_LEN
        )));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(ApiError::BadRequest(
            "username may contain only letters, digits and @/./+/-/_".to_string(),
        ));
    }
    Ok(())
}
