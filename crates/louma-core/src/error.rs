//! Error types for `louma-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// The property does not exist, is inactive, or is not owned by the actor.
  #[error("property not found: {0}")]
  PropertyNotFound(Uuid),

  /// The lead does not exist, or its listing is not owned by the actor.
  #[error("lead not found: {0}")]
  LeadNotFound(Uuid),

  #[error("a requester cannot submit a lead on their own listing")]
  SelfSubmission,

  #[error("a lead already exists for this listing and requester")]
  DuplicateSubmission,

  #[error("actor is not allowed to perform this operation")]
  Forbidden,

  #[error("an account already exists for this phone number or email")]
  AccountExists,

  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("unknown {kind} value: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error as an opaque store failure.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
