//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"error": <message>, "kind": <kind>}`. Messages
//! are French and meant to be shown to the user as-is; `kind` is stable and
//! meant for clients to branch on.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use louma_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Missing, malformed or expired credentials.
  #[error("unauthorized")]
  Unauthorized,

  /// Unknown phone number or wrong password; the two are not distinguished.
  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("account disabled")]
  AccountDisabled,

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Core(CoreError::store(e))
  }

  fn parts(&self) -> (StatusCode, &'static str, String) {
    match self {
      ApiError::Core(e) => match e {
        CoreError::PropertyNotFound(_) => {
          (StatusCode::NOT_FOUND, "not_found", "Propriété non trouvée".into())
        }
        CoreError::LeadNotFound(_) => {
          (StatusCode::NOT_FOUND, "not_found", "Lead non trouvé".into())
        }
        CoreError::SelfSubmission => (
          StatusCode::UNPROCESSABLE_ENTITY,
          "self_submission",
          "Vous ne pouvez pas soumettre une demande sur votre propre bien".into(),
        ),
        CoreError::DuplicateSubmission => (
          StatusCode::CONFLICT,
          "duplicate_submission",
          "Vous avez déjà envoyé une demande pour ce bien".into(),
        ),
        CoreError::Forbidden => {
          (StatusCode::FORBIDDEN, "forbidden", "Accès refusé".into())
        }
        CoreError::AccountExists => (
          StatusCode::CONFLICT,
          "account_exists",
          "Un utilisateur avec ce numéro de téléphone existe déjà".into(),
        ),
        CoreError::Invalid(m) => (StatusCode::BAD_REQUEST, "bad_request", m.clone()),
        CoreError::UnknownVariant { kind, value } => (
          StatusCode::BAD_REQUEST,
          "bad_request",
          format!("Valeur inconnue pour {kind} : {value}"),
        ),
        CoreError::Store(_) => (
          StatusCode::INTERNAL_SERVER_ERROR,
          "internal",
          "Erreur interne du serveur".into(),
        ),
      },
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.clone()),
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, "unauthorized", "Authentification requise".into())
      }
      ApiError::InvalidCredentials => (
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "Numéro de téléphone ou mot de passe incorrect".into(),
      ),
      ApiError::AccountDisabled => {
        (StatusCode::FORBIDDEN, "account_disabled", "Compte désactivé".into())
      }
      ApiError::Internal(_) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal",
        "Erreur interne du serveur".into(),
      ),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, kind, message) = self.parts();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": message, "kind": kind }))).into_response()
  }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
