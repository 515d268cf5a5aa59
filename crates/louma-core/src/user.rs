//! Users and the authenticated actor.
//!
//! A [`User`] is an account row. An [`Actor`] is the identity a service acts
//! on behalf of; it is only ever built from a verified credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

/// What kind of account a user holds.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  #[default]
  Tenant,
  Owner,
  Agency,
}

impl Role {
  /// Owners and agencies manage listings and the leads on them.
  pub fn manages_listings(self) -> bool { matches!(self, Self::Owner | Self::Agency) }
}

/// A marketplace account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:            Uuid,
  pub full_name:          String,
  /// Normalised phone number (no whitespace); unique.
  pub phone:              String,
  pub email:              Option<String>,
  /// argon2 PHC string. Never serialised.
  #[serde(skip_serializing, default)]
  pub password_hash:      String,
  pub role:               Role,
  pub profession:         Option<String>,
  pub household_size:     Option<u32>,
  /// Profile completeness, 0–100.
  pub completion_percent: u8,
  pub is_active:          bool,
  pub is_verified:        bool,
  pub last_login_at:      Option<DateTime<Utc>>,
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
}

impl User {
  pub fn actor(&self) -> Actor {
    Actor { user_id: self.user_id, role: self.role }
  }
}

/// The tenant fields shown to an owner reviewing a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSummary {
  pub user_id:            Uuid,
  pub full_name:          String,
  pub phone:              String,
  pub profession:         Option<String>,
  pub completion_percent: u8,
}

/// The authenticated identity on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Actor {
  pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }
}
