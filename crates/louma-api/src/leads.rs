//! Handlers for `/leads` endpoints. All of them require a bearer token.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/leads` | Submit interest in a listing; 201 |
//! | `GET`   | `/leads` | Leads on the caller's listings (owners and agencies) |
//! | `GET`   | `/leads/mine` | Leads the caller submitted |
//! | `GET`   | `/leads/{id}` | One lead with its listing and tenant |
//! | `PATCH` | `/leads/{id}/status` | Owner follow-up; re-derives the level |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use chrono::{DateTime, Utc};
use louma_core::{
  MarketStore,
  lead::{Lead, LeadDetails, LeadFilters, LeadStatus, LeadStatusUpdate, LeadSubmission},
  store::Page,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  auth::Authenticated,
  error::{ApiError, Result},
};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LeadSubmissionBody {
  pub property_id:             Uuid,
  pub message:                 Option<String>,
  pub budget_gnf:              Option<i64>,
  pub professional_status:     Option<String>,
  pub desired_duration_months: Option<u32>,
  pub household_size:          Option<u32>,
}

impl LeadSubmissionBody {
  fn into_submission(self) -> Result<LeadSubmission> {
    if self.desired_duration_months == Some(0) {
      return Err(ApiError::BadRequest(
        "La durée souhaitée doit être d'au moins un mois".into(),
      ));
    }
    if self.household_size == Some(0) {
      return Err(ApiError::BadRequest(
        "La taille du foyer doit être d'au moins une personne".into(),
      ));
    }
    if self.budget_gnf.is_some_and(|b| b < 0) {
      return Err(ApiError::BadRequest("Le budget ne peut pas être négatif".into()));
    }
    Ok(LeadSubmission {
      property_id:             self.property_id,
      message:                 self.message,
      budget_gnf:              self.budget_gnf,
      professional_status:     self.professional_status,
      desired_duration_months: self.desired_duration_months,
      household_size:          self.household_size,
    })
  }
}

/// `POST /leads`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<LeadSubmissionBody>,
) -> Result<(StatusCode, Json<Lead>)>
where
  S: MarketStore + 'static,
{
  let submission = body.into_submission()?;
  let lead = state.leads.create(&auth.actor(), submission).await?;
  Ok((StatusCode::CREATED, Json(lead)))
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// `GET /leads`
pub async fn list_for_owner<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(filters): Query<LeadFilters>,
) -> Result<Json<Page<LeadDetails>>>
where
  S: MarketStore + 'static,
{
  Ok(Json(state.leads.list_for_owner(&auth.actor(), &filters).await?))
}

/// `GET /leads/mine`
pub async fn mine<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(filters): Query<LeadFilters>,
) -> Result<Json<Page<LeadDetails>>>
where
  S: MarketStore + 'static,
{
  Ok(Json(state.leads.list_for_requester(&auth.actor(), &filters).await?))
}

/// `GET /leads/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<LeadDetails>>
where
  S: MarketStore + 'static,
{
  Ok(Json(state.leads.get(&auth.actor(), id).await?))
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status:       LeadStatus,
  pub notes:        Option<String>,
  /// RFC 3339. An empty string is treated as absent.
  pub contact_date: Option<String>,
}

impl StatusBody {
  fn into_update(self) -> Result<LeadStatusUpdate> {
    let contact_date = match self.contact_date.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(raw) => Some(
        DateTime::parse_from_rfc3339(raw)
          .map_err(|_| ApiError::BadRequest(format!("Date de contact invalide : {raw}")))?
          .with_timezone(&Utc),
      ),
    };
    Ok(LeadStatusUpdate { status: self.status, notes: self.notes, contact_date })
  }
}

/// `PATCH /leads/{id}/status`
pub async fn update_status<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Lead>>
where
  S: MarketStore + 'static,
{
  let update = body.into_update()?;
  Ok(Json(state.leads.update_status(&auth.actor(), id, update).await?))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn body() -> LeadSubmissionBody {
    LeadSubmissionBody {
      property_id:             Uuid::new_v4(),
      message:                 None,
      budget_gnf:              None,
      professional_status:     None,
      desired_duration_months: None,
      household_size:          None,
    }
  }

  #[test]
  fn zero_sizes_are_rejected() {
    let zero_household = LeadSubmissionBody { household_size: Some(0), ..body() };
    assert!(matches!(zero_household.into_submission(), Err(ApiError::BadRequest(_))));

    let zero_duration =
      LeadSubmissionBody { desired_duration_months: Some(0), ..body() };
    assert!(matches!(zero_duration.into_submission(), Err(ApiError::BadRequest(_))));

    let ok = LeadSubmissionBody { household_size: Some(3), ..body() };
    assert_eq!(ok.into_submission().unwrap().household_size, Some(3));
  }

  #[test]
  fn contact_dates() {
    let status = |raw: Option<&str>| StatusBody {
      status:       LeadStatus::Contacted,
      notes:        None,
      contact_date: raw.map(str::to_owned),
    };

    assert_eq!(status(None).into_update().unwrap().contact_date, None);
    assert_eq!(status(Some("")).into_update().unwrap().contact_date, None);

    let parsed = status(Some("2025-03-02T10:00:00+01:00"))
      .into_update()
      .unwrap()
      .contact_date
      .unwrap();
    assert_eq!(parsed.to_rfc3339(), "2025-03-02T09:00:00+00:00");

    assert!(matches!(
      status(Some("demain")).into_update(),
      Err(ApiError::BadRequest(_))
    ));
  }
}
