//! Access and refresh tokens (HS256 JWTs).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use louma_core::user::{Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, Result};

pub const ISSUER: &str = "louma-api";
pub const AUDIENCE: &str = "louma-client";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
  Access,
  Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  /// The user id.
  pub sub:   Uuid,
  pub phone: String,
  pub role:  Role,
  pub kind:  TokenKind,
  pub iss:   String,
  pub aud:   String,
  pub iat:   i64,
  pub exp:   i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
  pub token:         String,
  pub refresh_token: String,
}

/// Secrets and lifetimes for both token kinds.
#[derive(Clone)]
pub struct TokenConfig {
  pub access_secret:  String,
  pub refresh_secret: String,
  pub access_ttl:     Duration,
  pub refresh_ttl:    Duration,
}

struct Keys {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl:      Duration,
}

impl Keys {
  fn new(secret: &str, ttl: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      ttl,
    }
  }
}

/// Issues and verifies tokens. Expiry is checked against wall-clock time.
pub struct TokenIssuer {
  access:     Keys,
  refresh:    Keys,
  validation: Validation,
}

impl TokenIssuer {
  pub fn new(config: &TokenConfig) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_audience(&[AUDIENCE]);
    Self {
      access: Keys::new(&config.access_secret, config.access_ttl),
      refresh: Keys::new(&config.refresh_secret, config.refresh_ttl),
      validation,
    }
  }

  fn keys(&self, kind: TokenKind) -> &Keys {
    match kind {
      TokenKind::Access => &self.access,
      TokenKind::Refresh => &self.refresh,
    }
  }

  fn issue(&self, user: &User, kind: TokenKind, now: DateTime<Utc>) -> Result<String> {
    let keys = self.keys(kind);
    let claims = Claims {
      sub: user.user_id,
      phone: user.phone.clone(),
      role: user.role,
      kind,
      iss: ISSUER.to_owned(),
      aud: AUDIENCE.to_owned(),
      iat: now.timestamp(),
      exp: (now + keys.ttl).timestamp(),
    };
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
      .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))
  }

  pub fn issue_pair(&self, user: &User, now: DateTime<Utc>) -> Result<TokenPair> {
    Ok(TokenPair {
      token:         self.issue(user, TokenKind::Access, now)?,
      refresh_token: self.issue(user, TokenKind::Refresh, now)?,
    })
  }

  fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims> {
    let data =
      jsonwebtoken::decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
        .map_err(|_| ApiError::Unauthorized)?;
    if data.claims.kind != kind {
      return Err(ApiError::Unauthorized);
    }
    Ok(data.claims)
  }

  pub fn verify_access(&self, token: &str) -> Result<Claims> {
    self.verify(token, TokenKind::Access)
  }

  pub fn verify_refresh(&self, token: &str) -> Result<Claims> {
    self.verify(token, TokenKind::Refresh)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn issuer() -> TokenIssuer {
    TokenIssuer::new(&TokenConfig {
      access_secret:  "access-secret".into(),
      refresh_secret: "refresh-secret".into(),
      access_ttl:     Duration::hours(168),
      refresh_ttl:    Duration::days(30),
    })
  }

  fn user() -> User {
    User {
      user_id:            Uuid::new_v4(),
      full_name:          "Mariama Diallo".into(),
      phone:              "622123456".into(),
      email:              None,
      password_hash:      String::new(),
      role:               Role::Owner,
      profession:         None,
      household_size:     None,
      completion_percent: 25,
      is_active:          true,
      is_verified:        false,
      last_login_at:      None,
      created_at:         Utc::now(),
      updated_at:         Utc::now(),
    }
  }

  #[test]
  fn access_token_roundtrips_claims() {
    let tokens = issuer();
    let user = user();
    let pair = tokens.issue_pair(&user, Utc::now()).unwrap();

    let claims = tokens.verify_access(&pair.token).unwrap();
    assert_eq!(claims.sub, user.user_id);
    assert_eq!(claims.role, Role::Owner);
    assert_eq!(claims.iss, ISSUER);
    assert_eq!(claims.exp - claims.iat, 168 * 3600);

    let refresh = tokens.verify_refresh(&pair.refresh_token).unwrap();
    assert_eq!(refresh.kind, TokenKind::Refresh);
  }

  #[test]
  fn tokens_are_not_interchangeable() {
    let tokens = issuer();
    let pair = tokens.issue_pair(&user(), Utc::now()).unwrap();
    assert!(matches!(
      tokens.verify_access(&pair.refresh_token),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      tokens.verify_refresh(&pair.token),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn expired_and_tampered_tokens_are_rejected() {
    let tokens = issuer();
    let issued = Utc::now() - Duration::days(8);
    let pair = tokens.issue_pair(&user(), issued).unwrap();
    assert!(tokens.verify_access(&pair.token).is_err());

    let fresh = tokens.issue_pair(&user(), Utc::now()).unwrap();
    let mut tampered = fresh.token.clone();
    tampered.push('x');
    assert!(tokens.verify_access(&tampered).is_err());
  }
}
