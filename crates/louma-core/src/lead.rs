//! Lead types: a tenant's expressed interest in one listing.
//!
//! A lead's `level` is never taken from input. It is derived from the
//! submission attributes at creation and from the status afterwards; see
//! [`crate::qualification`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{property::PropertySummary, user::TenantSummary};

// ─── Status and tier ─────────────────────────────────────────────────────────

/// Where a lead is in the owner's follow-up process.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
  #[default]
  New,
  Contacted,
  Visited,
  Closed,
}

/// Qualification tier, coldest first.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadLevel {
  #[default]
  Cold,
  Warm,
  Hot,
  Verified,
}

// ─── Lead ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
  pub lead_id:      Uuid,
  pub property_id:  Uuid,
  /// The requester (tenant).
  pub user_id:      Uuid,
  /// Enriched note built once at creation.
  pub message:      String,
  pub status:       LeadStatus,
  pub level:        LeadLevel,
  /// Operator notes.
  pub notes:        Option<String>,
  pub contact_date: Option<DateTime<Utc>>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// A lead together with the listing and tenant it links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadDetails {
  #[serde(flatten)]
  pub lead:     Lead,
  pub property: PropertySummary,
  pub tenant:   TenantSummary,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// What a tenant submits. Every attribute is optional; each one present
/// raises the lead's score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSubmission {
  pub property_id:             Uuid,
  pub message:                 Option<String>,
  pub budget_gnf:              Option<i64>,
  pub professional_status:     Option<String>,
  pub desired_duration_months: Option<u32>,
  pub household_size:          Option<u32>,
}

impl LeadSubmission {
  pub fn new(property_id: Uuid) -> Self {
    Self { property_id, ..Self::default() }
  }
}

/// An owner's status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadStatusUpdate {
  pub status:       LeadStatus,
  /// `None` keeps the current notes.
  pub notes:        Option<String>,
  /// `None` keeps the current contact date.
  pub contact_date: Option<DateTime<Utc>>,
}

/// The persisted effect of a [`LeadStatusUpdate`], level already derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadStatusChange {
  pub status:       LeadStatus,
  pub level:        LeadLevel,
  pub notes:        Option<String>,
  pub contact_date: Option<DateTime<Utc>>,
  pub updated_at:   DateTime<Utc>,
}

/// Result of applying a status change: the status it replaced and the
/// updated row.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTransition {
  pub previous: LeadStatus,
  pub lead:     Lead,
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Filters shared by the owner and requester lead listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LeadFilters {
  pub status:      Option<LeadStatus>,
  pub level:       Option<LeadLevel>,
  pub property_id: Option<Uuid>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

/// Everything the admissibility check needs, read in one consistent pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionSnapshot {
  pub property_id:   Uuid,
  /// `None` when the listing does not exist at all.
  pub listing:       Option<crate::property::ListingRef>,
  /// An existing lead by the same requester on the same listing.
  pub existing_lead: Option<Uuid>,
}
