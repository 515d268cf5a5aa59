//! Lead qualification rules.
//!
//! Pure functions only: scoring a submission, classifying a score into a
//! [`LeadLevel`], re-deriving the level from a status, building the stored
//! message, and checking a submission is admissible. Nothing here touches a
//! store or a clock.

use std::str::FromStr;

use uuid::Uuid;

use crate::{
  Error, Result,
  lead::{AdmissionSnapshot, LeadLevel, LeadStatus, LeadSubmission},
};

/// Points contributed by each qualifying signal. There are five signals.
pub const SIGNAL_WEIGHT: u8 = 20;

/// Shortest desired stay that counts as a qualifying signal.
pub const MIN_QUALIFYING_DURATION_MONTHS: u32 = 6;

/// Message stored when a submission carries no text and no details.
pub const FALLBACK_MESSAGE: &str = "Demande de renseignements";

const DETAILS_DIVIDER: &str = "\n---\n";

// ─── Scoring ─────────────────────────────────────────────────────────────────

fn non_empty(s: Option<&str>) -> bool { s.is_some_and(|s| !s.is_empty()) }

/// Score a submission in `[0, 100]`.
pub fn score(submission: &LeadSubmission) -> u8 {
  let signals = [
    non_empty(submission.message.as_deref()),
    submission.budget_gnf.is_some_and(|b| b > 0),
    non_empty(submission.professional_status.as_deref()),
    submission
      .desired_duration_months
      .is_some_and(|d| d >= MIN_QUALIFYING_DURATION_MONTHS),
    submission.household_size.is_some_and(|h| h > 0),
  ];

  signals.into_iter().filter(|&s| s).count() as u8 * SIGNAL_WEIGHT
}

pub fn classify(score: u8) -> LeadLevel {
  match score {
    80.. => LeadLevel::Verified,
    60.. => LeadLevel::Hot,
    40.. => LeadLevel::Warm,
    _ => LeadLevel::Cold,
  }
}

// ─── Status mapping ──────────────────────────────────────────────────────────

/// The level a lead takes after moving to `status`. Replaces whatever level
/// the submission scored.
pub fn level_for_status(status: LeadStatus) -> LeadLevel {
  match status {
    LeadStatus::New => LeadLevel::Cold,
    LeadStatus::Contacted => LeadLevel::Warm,
    LeadStatus::Visited => LeadLevel::Hot,
    LeadStatus::Closed => LeadLevel::Verified,
  }
}

/// [`level_for_status`] over raw status strings; unrecognised values map to
/// [`LeadLevel::Cold`].
pub fn level_for_status_str(status: &str) -> LeadLevel {
  LeadStatus::from_str(status)
    .map(level_for_status)
    .unwrap_or(LeadLevel::Cold)
}

// ─── Message enrichment ──────────────────────────────────────────────────────

/// Group digits by thousands with a narrow no-break space, as French
/// formatting does.
pub fn format_thousands(n: i64) -> String {
  let digits = n.unsigned_abs().to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3 * 3 + 1);
  if n < 0 {
    out.push('-');
  }
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push('\u{202F}');
    }
    out.push(c);
  }
  out
}

/// Build the stored lead message: the free text verbatim, then a divider and
/// one line per structured detail present.
pub fn enrich_message(
  free_text: Option<&str>,
  budget_gnf: Option<i64>,
  professional_status: Option<&str>,
  desired_duration_months: Option<u32>,
  household_size: Option<u32>,
) -> String {
  let mut details = Vec::new();
  if let Some(budget) = budget_gnf.filter(|&b| b != 0) {
    details.push(format!("Budget : {} GNF", format_thousands(budget)));
  }
  if let Some(status) = professional_status.filter(|s| !s.is_empty()) {
    details.push(format!("Situation professionnelle : {status}"));
  }
  if let Some(months) = desired_duration_months.filter(|&m| m != 0) {
    details.push(format!("Durée souhaitée : {months} mois"));
  }
  if let Some(size) = household_size.filter(|&h| h != 0) {
    details.push(format!("Taille du foyer : {size} personne(s)"));
  }

  let mut parts = Vec::new();
  if let Some(text) = free_text.filter(|t| !t.is_empty()) {
    parts.push(text.to_owned());
  }
  if !details.is_empty() {
    parts.push(format!("{DETAILS_DIVIDER}{}", details.join("\n")));
  }

  if parts.is_empty() {
    FALLBACK_MESSAGE.to_owned()
  } else {
    parts.join("\n")
  }
}

impl LeadSubmission {
  pub fn enriched_message(&self) -> String {
    enrich_message(
      self.message.as_deref(),
      self.budget_gnf,
      self.professional_status.as_deref(),
      self.desired_duration_months,
      self.household_size,
    )
  }
}

// ─── Admissibility ───────────────────────────────────────────────────────────

/// Check a submission against the listing and any prior lead, failing on the
/// first violated rule.
pub fn check_admissible(snapshot: &AdmissionSnapshot, requester_id: Uuid) -> Result<()> {
  let listing = snapshot
    .listing
    .filter(|l| l.is_active)
    .ok_or(Error::PropertyNotFound(snapshot.property_id))?;
  if listing.owner_id == requester_id {
    return Err(Error::SelfSubmission);
  }
  if snapshot.existing_lead.is_some() {
    return Err(Error::DuplicateSubmission);
  }
  Ok(())
}
