//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | 201 with the user and a token pair |
//! | `POST` | `/auth/login` | Phone and password |
//! | `POST` | `/auth/refresh` | Exchanges a refresh token for a new pair |
//! | `GET`  | `/auth/me` | The authenticated user |

use std::sync::LazyLock;

use axum::{Json, extract::State, http::StatusCode};
use louma_core::{
  Error as CoreError, MarketStore,
  store::InsertOutcome,
  user::{Role, User},
};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
  ApiState,
  auth::{Authenticated, hash_password, verify_password},
  error::{ApiError, Result},
  tokens::TokenPair,
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Profile completeness of a freshly registered account.
const INITIAL_COMPLETION_PERCENT: u8 = 25;

/// Guinean mobile numbers, with or without the country prefix.
static GUINEA_PHONE: LazyLock<Option<Regex>> =
  LazyLock::new(|| Regex::new(r"^(\+224|00224)?[67][0-9]{8}$").ok());

/// Strip whitespace and check the result is a Guinean mobile number.
pub fn normalize_phone(raw: &str) -> Option<String> {
  let phone: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
  GUINEA_PHONE
    .as_ref()
    .is_some_and(|re| re.is_match(&phone))
    .then_some(phone)
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub user:   User,
  #[serde(flatten)]
  pub tokens: TokenPair,
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub full_name: String,
  pub phone:     String,
  pub password:  String,
  pub email:     Option<String>,
  pub role:      Option<Role>,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<AuthResponse>)>
where
  S: MarketStore + 'static,
{
  let phone = normalize_phone(&body.phone)
    .ok_or_else(|| ApiError::BadRequest("Numéro de téléphone guinéen invalide".into()))?;
  let full_name = body.full_name.trim();
  if full_name.is_empty() {
    return Err(ApiError::BadRequest("Le nom complet est requis".into()));
  }
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "Le mot de passe doit contenir au moins {MIN_PASSWORD_LEN} caractères"
    )));
  }

  let now = state.clock.now();
  let user = User {
    user_id: Uuid::new_v4(),
    full_name: full_name.to_owned(),
    phone,
    email: body.email.map(|e| e.trim().to_owned()).filter(|e| !e.is_empty()),
    password_hash: hash_password(&body.password)?,
    role: body.role.unwrap_or_default(),
    profession: None,
    household_size: None,
    completion_percent: INITIAL_COMPLETION_PERCENT,
    is_active: true,
    is_verified: false,
    last_login_at: None,
    created_at: now,
    updated_at: now,
  };

  let user = match state.store.add_user(user).await.map_err(ApiError::store)? {
    InsertOutcome::Inserted(user) => user,
    InsertOutcome::Duplicate => return Err(CoreError::AccountExists.into()),
  };
  info!(user_id = %user.user_id, role = user.role.as_ref(), "account registered");

  let tokens = state.tokens.issue_pair(&user, now)?;
  Ok((StatusCode::CREATED, Json(AuthResponse { user, tokens })))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub phone:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>>
where
  S: MarketStore + 'static,
{
  let phone: String = body.phone.chars().filter(|c| !c.is_whitespace()).collect();
  let mut user = state
    .store
    .find_user_by_phone(&phone)
    .await
    .map_err(ApiError::store)?
    .filter(|u| verify_password(&body.password, &u.password_hash))
    .ok_or(ApiError::InvalidCredentials)?;

  if !user.is_active {
    return Err(ApiError::AccountDisabled);
  }

  let now = state.clock.now();
  state
    .store
    .record_login(user.user_id, now)
    .await
    .map_err(ApiError::store)?;
  user.last_login_at = Some(now);

  let tokens = state.tokens.issue_pair(&user, now)?;
  Ok(Json(AuthResponse { user, tokens }))
}

// ─── Refresh ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
  pub refresh_token: String,
}

/// `POST /auth/refresh`
pub async fn refresh<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<RefreshBody>,
) -> Result<Json<AuthResponse>>
where
  S: MarketStore + 'static,
{
  let claims = state.tokens.verify_refresh(&body.refresh_token)?;
  let user = state
    .store
    .get_user(claims.sub)
    .await
    .map_err(ApiError::store)?
    .filter(|u| u.is_active)
    .ok_or(ApiError::Unauthorized)?;

  let tokens = state.tokens.issue_pair(&user, state.clock.now())?;
  Ok(Json(AuthResponse { user, tokens }))
}

// ─── Me ──────────────────────────────────────────────────────────────────────

/// `GET /auth/me`
pub async fn me(Authenticated(user): Authenticated) -> Json<User> { Json(user) }
