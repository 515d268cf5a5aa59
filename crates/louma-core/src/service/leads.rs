use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::{DEFAULT_MAX_PAGE_SIZE, store_err};
use crate::{
  Clock, Error, MarketStore, Result,
  lead::{
    Lead, LeadDetails, LeadFilters, LeadStatus, LeadStatusChange,
    LeadStatusUpdate, LeadSubmission,
  },
  qualification::{check_admissible, classify, level_for_status, score},
  store::{InsertOutcome, Page, Window},
  user::Actor,
};

/// The lead lifecycle: submission, listings, lookup and status changes.
pub struct LeadService<S> {
  store:         Arc<S>,
  clock:         Arc<dyn Clock>,
  max_page_size: usize,
}

impl<S> Clone for LeadService<S> {
  fn clone(&self) -> Self {
    Self {
      store:         Arc::clone(&self.store),
      clock:         Arc::clone(&self.clock),
      max_page_size: self.max_page_size,
    }
  }
}

impl<S: MarketStore> LeadService<S> {
  pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
    Self { store, clock, max_page_size: DEFAULT_MAX_PAGE_SIZE }
  }

  pub fn with_max_page_size(mut self, max: usize) -> Self {
    self.max_page_size = max;
    self
  }

  /// Submit a lead on behalf of `actor`.
  ///
  /// Fails with `PropertyNotFound`, `SelfSubmission` or `DuplicateSubmission`.
  /// The store's uniqueness constraint is the final word on duplicates; the
  /// snapshot check only gives the common case an early answer.
  pub async fn create(&self, actor: &Actor, submission: LeadSubmission) -> Result<Lead> {
    let property_id = submission.property_id;
    let snapshot = self
      .store
      .admission_snapshot(property_id, actor.user_id)
      .await
      .map_err(store_err::<S>)?;

    if let Err(e) = check_admissible(&snapshot, actor.user_id) {
      info!(%property_id, requester = %actor.user_id, reason = %e, "lead rejected");
      return Err(e);
    }

    let now = self.clock.now();
    let score = score(&submission);
    let lead = Lead {
      lead_id: Uuid::new_v4(),
      property_id,
      user_id: actor.user_id,
      message: submission.enriched_message(),
      status: LeadStatus::New,
      level: classify(score),
      notes: None,
      contact_date: None,
      created_at: now,
      updated_at: now,
    };

    match self.store.insert_lead(lead).await.map_err(store_err::<S>)? {
      InsertOutcome::Inserted(lead) => {
        info!(
          lead_id = %lead.lead_id,
          %property_id,
          score,
          level = lead.level.as_ref(),
          "lead submitted"
        );
        Ok(lead)
      }
      InsertOutcome::Duplicate => {
        info!(%property_id, requester = %actor.user_id, "concurrent duplicate lead");
        Err(Error::DuplicateSubmission)
      }
    }
  }

  /// Leads on listings the actor owns.
  pub async fn list_for_owner(
    &self,
    actor: &Actor,
    filters: &LeadFilters,
  ) -> Result<Page<LeadDetails>> {
    if !actor.role.manages_listings() {
      return Err(Error::Forbidden);
    }
    let window = self.window(filters);
    self
      .store
      .list_leads_for_owner(actor.user_id, filters, window)
      .await
      .map_err(store_err::<S>)
  }

  /// Leads the actor submitted.
  pub async fn list_for_requester(
    &self,
    actor: &Actor,
    filters: &LeadFilters,
  ) -> Result<Page<LeadDetails>> {
    let window = self.window(filters);
    self
      .store
      .list_leads_for_requester(actor.user_id, filters, window)
      .await
      .map_err(store_err::<S>)
  }

  /// A single lead, visible to its requester and to owner or agency accounts.
  pub async fn get(&self, actor: &Actor, lead_id: Uuid) -> Result<LeadDetails> {
    let details = self
      .store
      .get_lead(lead_id)
      .await
      .map_err(store_err::<S>)?
      .ok_or(Error::LeadNotFound(lead_id))?;

    if details.lead.user_id != actor.user_id && !actor.role.manages_listings() {
      return Err(Error::Forbidden);
    }
    Ok(details)
  }

  /// Move a lead to a new status and re-derive its level.
  ///
  /// A lead that does not exist and one on somebody else's listing both
  /// yield `LeadNotFound`.
  pub async fn update_status(
    &self,
    actor: &Actor,
    lead_id: Uuid,
    update: LeadStatusUpdate,
  ) -> Result<Lead> {
    if !actor.role.manages_listings() {
      return Err(Error::LeadNotFound(lead_id));
    }

    let change = LeadStatusChange {
      status:       update.status,
      level:        level_for_status(update.status),
      notes:        update.notes,
      contact_date: update.contact_date,
      updated_at:   self.clock.now(),
    };

    let transition = self
      .store
      .update_lead_status(lead_id, actor.user_id, change)
      .await
      .map_err(store_err::<S>)?
      .ok_or(Error::LeadNotFound(lead_id))?;

    let lead = transition.lead;
    if lead.status < transition.previous {
      warn!(
        %lead_id,
        from = transition.previous.as_ref(),
        to = lead.status.as_ref(),
        "lead status moved backwards"
      );
    } else {
      info!(
        %lead_id,
        from = transition.previous.as_ref(),
        to = lead.status.as_ref(),
        level = lead.level.as_ref(),
        "lead status updated"
      );
    }
    Ok(lead)
  }

  fn window(&self, filters: &LeadFilters) -> Window {
    Window::resolve(filters.limit, filters.offset, self.max_page_size)
  }
}
