//! Bearer-token extractor and password hashing.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use louma_core::{
  MarketStore,
  user::{Actor, User},
};
use rand_core::OsRng;

use crate::{
  ApiState,
  error::{ApiError, Result},
};

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Check `password` against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

/// The raw token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(ApiError::Unauthorized)
}

/// An active user, identified by a verified access token.
///
/// This is the only way handlers obtain an [`Actor`]; user ids in request
/// bodies are never trusted.
pub struct Authenticated(pub User);

impl Authenticated {
  pub fn actor(&self) -> Actor { self.0.actor() }
}

impl<S> FromRequestParts<ApiState<S>> for Authenticated
where
  S: MarketStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let claims = state.tokens.verify_access(bearer_token(&parts.headers)?)?;
    let user = state
      .store
      .get_user(claims.sub)
      .await
      .map_err(ApiError::store)?
      .filter(|u| u.is_active)
      .ok_or(ApiError::Unauthorized)?;
    Ok(Self(user))
  }
}
