//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that they sort lexicographically. Enums are stored as their
//! `AsRefStr` form. UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use louma_core::{
  lead::{Lead, LeadDetails},
  property::{Property, PropertySummary},
  user::{TenantSummary, User},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn decode_enum<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::UnknownVariant { kind, value: s.to_owned() })
}

/// Escape `%`, `_` and `\` for use in a `LIKE ... ESCAPE '\'` pattern.
pub fn like_pattern(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, full_name, phone, email, password_hash, role,
  profession, household_size, completion_percent, is_active, is_verified,
  last_login_at, created_at, updated_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:            String,
  pub full_name:          String,
  pub phone:              String,
  pub email:              Option<String>,
  pub password_hash:      String,
  pub role:               String,
  pub profession:         Option<String>,
  pub household_size:     Option<u32>,
  pub completion_percent: u8,
  pub is_active:          bool,
  pub is_verified:        bool,
  pub last_login_at:      Option<String>,
  pub created_at:         String,
  pub updated_at:         String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:            row.get(0)?,
      full_name:          row.get(1)?,
      phone:              row.get(2)?,
      email:              row.get(3)?,
      password_hash:      row.get(4)?,
      role:               row.get(5)?,
      profession:         row.get(6)?,
      household_size:     row.get(7)?,
      completion_percent: row.get(8)?,
      is_active:          row.get(9)?,
      is_verified:        row.get(10)?,
      last_login_at:      row.get(11)?,
      created_at:         row.get(12)?,
      updated_at:         row.get(13)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:            decode_uuid(&self.user_id)?,
      full_name:          self.full_name,
      phone:              self.phone,
      email:              self.email,
      password_hash:      self.password_hash,
      role:               decode_enum("role", &self.role)?,
      profession:         self.profession,
      household_size:     self.household_size,
      completion_percent: self.completion_percent,
      is_active:          self.is_active,
      is_verified:        self.is_verified,
      last_login_at:      decode_opt_dt(self.last_login_at)?,
      created_at:         decode_dt(&self.created_at)?,
      updated_at:         decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Properties ──────────────────────────────────────────────────────────────

pub const PROPERTY_COLUMNS: &str = "property_id, owner_id, title, kind, commune,
  quartier, description, bedrooms, bathrooms, total_rooms, surface_m2,
  furnished, water_supply, electricity_type, generator_included,
  accessible_in_rain, price_gnf, is_verified, is_active, is_available,
  available_from, min_duration_months, view_count, lead_count, created_at,
  updated_at";

/// Raw values read directly from a `properties` row.
pub struct RawProperty {
  pub property_id:         String,
  pub owner_id:            String,
  pub title:               String,
  pub kind:                String,
  pub commune:             String,
  pub quartier:            String,
  pub description:         String,
  pub bedrooms:            u32,
  pub bathrooms:           u32,
  pub total_rooms:         u32,
  pub surface_m2:          Option<f64>,
  pub furnished:           String,
  pub water_supply:        String,
  pub electricity_type:    String,
  pub generator_included:  bool,
  pub accessible_in_rain:  bool,
  pub price_gnf:           i64,
  pub is_verified:         bool,
  pub is_active:           bool,
  pub is_available:        bool,
  pub available_from:      String,
  pub min_duration_months: u32,
  pub view_count:          i64,
  pub lead_count:          i64,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawProperty {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      property_id:         row.get(0)?,
      owner_id:            row.get(1)?,
      title:               row.get(2)?,
      kind:                row.get(3)?,
      commune:             row.get(4)?,
      quartier:            row.get(5)?,
      description:         row.get(6)?,
      bedrooms:            row.get(7)?,
      bathrooms:           row.get(8)?,
      total_rooms:         row.get(9)?,
      surface_m2:          row.get(10)?,
      furnished:           row.get(11)?,
      water_supply:        row.get(12)?,
      electricity_type:    row.get(13)?,
      generator_included:  row.get(14)?,
      accessible_in_rain:  row.get(15)?,
      price_gnf:           row.get(16)?,
      is_verified:         row.get(17)?,
      is_active:           row.get(18)?,
      is_available:        row.get(19)?,
      available_from:      row.get(20)?,
      min_duration_months: row.get(21)?,
      view_count:          row.get(22)?,
      lead_count:          row.get(23)?,
      created_at:          row.get(24)?,
      updated_at:          row.get(25)?,
    })
  }

  pub fn into_property(self) -> Result<Property> {
    Ok(Property {
      property_id:         decode_uuid(&self.property_id)?,
      owner_id:            decode_uuid(&self.owner_id)?,
      title:               self.title,
      kind:                decode_enum("property kind", &self.kind)?,
      commune:             decode_enum("commune", &self.commune)?,
      quartier:            self.quartier,
      description:         self.description,
      bedrooms:            self.bedrooms,
      bathrooms:           self.bathrooms,
      total_rooms:         self.total_rooms,
      surface_m2:          self.surface_m2,
      furnished:           decode_enum("furnished", &self.furnished)?,
      water_supply:        decode_enum("water supply", &self.water_supply)?,
      electricity_type:    decode_enum("electricity type", &self.electricity_type)?,
      generator_included:  self.generator_included,
      accessible_in_rain:  self.accessible_in_rain,
      price_gnf:           self.price_gnf,
      is_verified:         self.is_verified,
      is_active:           self.is_active,
      is_available:        self.is_available,
      available_from:      decode_dt(&self.available_from)?,
      min_duration_months: self.min_duration_months,
      view_count:          self.view_count.max(0) as u64,
      lead_count:          self.lead_count.max(0) as u64,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Leads ───────────────────────────────────────────────────────────────────

pub const LEAD_COLUMNS: &str = "lead_id, property_id, user_id, message, status,
  level, notes, contact_date, created_at, updated_at";

/// Lead columns joined with the listing and tenant summaries. The `FROM`
/// clause must alias `leads l`, `properties p` and `users u`.
pub const LEAD_DETAIL_COLUMNS: &str = "l.lead_id, l.property_id, l.user_id,
  l.message, l.status, l.level, l.notes, l.contact_date, l.created_at,
  l.updated_at,
  p.title, p.kind, p.commune, p.quartier, p.price_gnf,
  u.full_name, u.phone, u.profession, u.completion_percent";

/// Raw values read directly from a `leads` row.
pub struct RawLead {
  pub lead_id:      String,
  pub property_id:  String,
  pub user_id:      String,
  pub message:      String,
  pub status:       String,
  pub level:        String,
  pub notes:        Option<String>,
  pub contact_date: Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawLead {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      lead_id:      row.get(0)?,
      property_id:  row.get(1)?,
      user_id:      row.get(2)?,
      message:      row.get(3)?,
      status:       row.get(4)?,
      level:        row.get(5)?,
      notes:        row.get(6)?,
      contact_date: row.get(7)?,
      created_at:   row.get(8)?,
      updated_at:   row.get(9)?,
    })
  }

  pub fn into_lead(self) -> Result<Lead> {
    Ok(Lead {
      lead_id:      decode_uuid(&self.lead_id)?,
      property_id:  decode_uuid(&self.property_id)?,
      user_id:      decode_uuid(&self.user_id)?,
      message:      self.message,
      status:       decode_enum("lead status", &self.status)?,
      level:        decode_enum("lead level", &self.level)?,
      notes:        self.notes,
      contact_date: decode_opt_dt(self.contact_date)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// A lead row plus the summary columns of [`LEAD_DETAIL_COLUMNS`].
pub struct RawLeadDetails {
  pub lead:                      RawLead,
  pub property_title:            String,
  pub property_kind:             String,
  pub property_commune:          String,
  pub property_quartier:         String,
  pub property_price_gnf:        i64,
  pub tenant_full_name:          String,
  pub tenant_phone:              String,
  pub tenant_profession:         Option<String>,
  pub tenant_completion_percent: u8,
}

impl RawLeadDetails {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      lead:                      RawLead::from_row(row)?,
      property_title:            row.get(10)?,
      property_kind:             row.get(11)?,
      property_commune:          row.get(12)?,
      property_quartier:         row.get(13)?,
      property_price_gnf:        row.get(14)?,
      tenant_full_name:          row.get(15)?,
      tenant_phone:              row.get(16)?,
      tenant_profession:         row.get(17)?,
      tenant_completion_percent: row.get(18)?,
    })
  }

  pub fn into_details(self) -> Result<LeadDetails> {
    let lead = self.lead.into_lead()?;
    let property = PropertySummary {
      property_id: lead.property_id,
      title:       self.property_title,
      kind:        decode_enum("property kind", &self.property_kind)?,
      commune:     decode_enum("commune", &self.property_commune)?,
      quartier:    self.property_quartier,
      price_gnf:   self.property_price_gnf,
    };
    let tenant = TenantSummary {
      user_id:            lead.user_id,
      full_name:          self.tenant_full_name,
      phone:              self.tenant_phone,
      profession:         self.tenant_profession,
      completion_percent: self.tenant_completion_percent,
    };
    Ok(LeadDetails { lead, property, tenant })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_are_fixed_width() {
    let a = DateTime::parse_from_rfc3339("2025-01-15T10:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let b = a + chrono::Duration::microseconds(1);
    assert_eq!(encode_dt(a), "2025-01-15T10:00:00.000000Z");
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("Kipé"), "%Kipé%");
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
  }
}
