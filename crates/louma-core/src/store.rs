//! The `MarketStore` trait and supporting paging types.
//!
//! The trait is implemented by storage backends (e.g. `louma-store-sqlite`).
//! The services in [`crate::service`] and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  lead::{
    AdmissionSnapshot, Lead, LeadDetails, LeadFilters, LeadStatusChange,
    StatusTransition,
  },
  property::{Property, PropertyQuery},
  user::User,
};

// ─── Paging ──────────────────────────────────────────────────────────────────

pub const DEFAULT_PAGE_SIZE: usize = 20;

const MAX_OFFSET: usize = i64::MAX as usize;

/// A resolved `LIMIT`/`OFFSET` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
  pub limit:  usize,
  pub offset: usize,
}

impl Window {
  /// Resolve caller-supplied paging, clamping the limit to `[1, max]` and
  /// the offset to what SQLite accepts as an `i64`.
  pub fn resolve(limit: Option<usize>, offset: Option<usize>, max: usize) -> Self {
    let max = max.clamp(1, MAX_OFFSET);
    Self {
      limit:  limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, max),
      offset: offset.unwrap_or(0).min(MAX_OFFSET),
    }
  }
}

/// One page of results plus the total the filters match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
  pub items:    Vec<T>,
  pub total:    u64,
  pub limit:    usize,
  pub offset:   usize,
  pub has_more: bool,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, total: u64, window: Window) -> Self {
    let seen = window.offset.saturating_add(items.len()) as u64;
    let has_more = seen < total;
    Self { items, total, limit: window.limit, offset: window.offset, has_more }
  }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      items:    self.items.into_iter().map(f).collect(),
      total:    self.total,
      limit:    self.limit,
      offset:   self.offset,
      has_more: self.has_more,
    }
  }
}

/// Outcome of an insert guarded by a uniqueness constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome<T> {
  Inserted(T),
  /// A row with the same unique key already exists; nothing was written.
  Duplicate,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a LOUMA marketplace store backend.
///
/// Uniqueness of `(property_id, user_id)` for leads is enforced by the store,
/// not by callers, so concurrent submissions cannot both succeed.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait MarketStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new account. `Duplicate` if the phone or email is taken.
  fn add_user(
    &self,
    user: User,
  ) -> impl Future<Output = Result<InsertOutcome<User>, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user_by_phone<'a>(
    &'a self,
    phone: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn record_login(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Properties ────────────────────────────────────────────────────────

  fn add_property(
    &self,
    property: Property,
  ) -> impl Future<Output = Result<Property, Self::Error>> + Send + '_;

  fn get_property(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;

  /// Bump the view counter and return the updated listing, or `None` if it
  /// does not exist.
  fn increment_view_count(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;

  /// Overwrite the mutable fields of an existing listing.
  fn update_property(
    &self,
    property: Property,
  ) -> impl Future<Output = Result<Property, Self::Error>> + Send + '_;

  /// Delete a listing owned by `owner_id`, cascading to its leads.
  /// Returns `false` when nothing matched.
  fn delete_property(
    &self,
    id: Uuid,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Public search over active, available listings.
  fn search_properties<'a>(
    &'a self,
    query: &'a PropertyQuery,
    now: DateTime<Utc>,
    window: Window,
  ) -> impl Future<Output = Result<Page<Property>, Self::Error>> + Send + 'a;

  /// Every listing of one owner, active or not, newest first.
  fn list_properties_by_owner(
    &self,
    owner_id: Uuid,
    window: Window,
  ) -> impl Future<Output = Result<Page<Property>, Self::Error>> + Send + '_;

  // ── Leads ─────────────────────────────────────────────────────────────

  /// Read the listing and any existing lead for `(property_id, user_id)` in
  /// one consistent pass.
  fn admission_snapshot(
    &self,
    property_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<AdmissionSnapshot, Self::Error>> + Send + '_;

  /// Persist a lead and bump the listing's `lead_count` atomically.
  /// `Duplicate` if the requester already has a lead on that listing.
  fn insert_lead(
    &self,
    lead: Lead,
  ) -> impl Future<Output = Result<InsertOutcome<Lead>, Self::Error>> + Send + '_;

  fn get_lead(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<LeadDetails>, Self::Error>> + Send + '_;

  /// Apply a status change to a lead whose listing belongs to `owner_id`.
  /// `None` when the lead does not exist or is not on one of their listings.
  /// A `None` in `notes` or `contact_date` keeps the stored value.
  fn update_lead_status(
    &self,
    lead_id: Uuid,
    owner_id: Uuid,
    change: LeadStatusChange,
  ) -> impl Future<Output = Result<Option<StatusTransition>, Self::Error>> + Send + '_;

  /// Leads on listings owned by `owner_id`, newest first.
  fn list_leads_for_owner<'a>(
    &'a self,
    owner_id: Uuid,
    filters: &'a LeadFilters,
    window: Window,
  ) -> impl Future<Output = Result<Page<LeadDetails>, Self::Error>> + Send + 'a;

  /// Leads submitted by `user_id`, newest first.
  fn list_leads_for_requester<'a>(
    &'a self,
    user_id: Uuid,
    filters: &'a LeadFilters,
    window: Window,
  ) -> impl Future<Output = Result<Page<LeadDetails>, Self::Error>> + Send + 'a;
}
