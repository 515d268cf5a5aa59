//! Property (listing) types.
//!
//! The vocabulary is the one used on the Conakry rental market: communes,
//! utility reliability (SEEG water, EDG electricity) and French labels that
//! are stored and serialised verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Vocabulary ──────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
pub enum PropertyKind {
  Appartement,
  Villa,
  Studio,
  Chambre,
  Duplex,
  Maison,
}

/// The five communes of Conakry.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
pub enum Commune {
  Ratoma,
  Matam,
  Kaloum,
  Matoto,
  Dixinn,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
pub enum Furnished {
  #[serde(rename = "Meublé")]
  #[strum(serialize = "Meublé")]
  Furnished,
  #[serde(rename = "Semi-meublé")]
  #[strum(serialize = "Semi-meublé")]
  SemiFurnished,
  #[serde(rename = "Vide")]
  #[strum(serialize = "Vide")]
  Empty,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
pub enum WaterSupply {
  #[serde(rename = "SEEG fiable")]
  #[strum(serialize = "SEEG fiable")]
  SeegReliable,
  #[serde(rename = "SEEG intermittente")]
  #[strum(serialize = "SEEG intermittente")]
  SeegIntermittent,
  #[serde(rename = "Puits")]
  #[strum(serialize = "Puits")]
  Well,
  #[serde(rename = "Citerne")]
  #[strum(serialize = "Citerne")]
  Tank,
}

impl WaterSupply {
  /// Supplies a tenant can count on; everything but intermittent SEEG.
  pub const RELIABLE: [Self; 3] = [Self::SeegReliable, Self::Well, Self::Tank];

  pub fn is_reliable(self) -> bool { Self::RELIABLE.contains(&self) }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
pub enum ElectricityType {
  #[serde(rename = "EDG fiable")]
  #[strum(serialize = "EDG fiable")]
  EdgReliable,
  #[serde(rename = "EDG intermittente")]
  #[strum(serialize = "EDG intermittente")]
  EdgIntermittent,
  #[serde(rename = "Groupe seul")]
  #[strum(serialize = "Groupe seul")]
  GeneratorOnly,
  #[serde(rename = "Solaire")]
  #[strum(serialize = "Solaire")]
  Solar,
}

impl ElectricityType {
  /// Sources a tenant can count on; everything but intermittent EDG.
  pub const RELIABLE: [Self; 3] = [Self::EdgReliable, Self::GeneratorOnly, Self::Solar];

  pub fn is_reliable(self) -> bool { Self::RELIABLE.contains(&self) }
}

// ─── Property ────────────────────────────────────────────────────────────────

/// A rental listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
  pub property_id:         Uuid,
  pub owner_id:            Uuid,
  pub title:               String,
  pub kind:                PropertyKind,
  pub commune:             Commune,
  pub quartier:            String,
  pub description:         String,
  pub bedrooms:            u32,
  pub bathrooms:           u32,
  pub total_rooms:         u32,
  pub surface_m2:          Option<f64>,
  pub furnished:           Furnished,
  pub water_supply:        WaterSupply,
  pub electricity_type:    ElectricityType,
  pub generator_included:  bool,
  pub accessible_in_rain:  bool,
  /// Monthly rent in Guinean francs.
  pub price_gnf:           i64,
  pub is_verified:         bool,
  /// Inactive listings are hidden and cannot receive leads.
  pub is_active:           bool,
  pub is_available:        bool,
  pub available_from:      DateTime<Utc>,
  pub min_duration_months: u32,
  pub view_count:          u64,
  pub lead_count:          u64,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

impl Property {
  pub fn summary(&self) -> PropertySummary {
    PropertySummary {
      property_id: self.property_id,
      title:       self.title.clone(),
      kind:        self.kind,
      commune:     self.commune,
      quartier:    self.quartier.clone(),
      price_gnf:   self.price_gnf,
    }
  }

  /// Apply every field set in `patch`.
  pub fn apply(&mut self, patch: PropertyPatch) {
    let PropertyPatch {
      title,
      kind,
      commune,
      quartier,
      description,
      bedrooms,
      bathrooms,
      total_rooms,
      surface_m2,
      furnished,
      water_supply,
      electricity_type,
      generator_included,
      accessible_in_rain,
      price_gnf,
      is_active,
      is_available,
      available_from,
      min_duration_months,
    } = patch;

    if let Some(v) = title { self.title = v; }
    if let Some(v) = kind { self.kind = v; }
    if let Some(v) = commune { self.commune = v; }
    if let Some(v) = quartier { self.quartier = v; }
    if let Some(v) = description { self.description = v; }
    if let Some(v) = bedrooms { self.bedrooms = v; }
    if let Some(v) = bathrooms { self.bathrooms = v; }
    if let Some(v) = total_rooms { self.total_rooms = v; }
    if let Some(v) = surface_m2 { self.surface_m2 = Some(v); }
    if let Some(v) = furnished { self.furnished = v; }
    if let Some(v) = water_supply { self.water_supply = v; }
    if let Some(v) = electricity_type { self.electricity_type = v; }
    if let Some(v) = generator_included { self.generator_included = v; }
    if let Some(v) = accessible_in_rain { self.accessible_in_rain = v; }
    if let Some(v) = price_gnf { self.price_gnf = v; }
    if let Some(v) = is_active { self.is_active = v; }
    if let Some(v) = is_available { self.is_available = v; }
    if let Some(v) = available_from { self.available_from = v; }
    if let Some(v) = min_duration_months { self.min_duration_months = v; }
  }

  /// Reject listings that could never be shown sensibly.
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::Invalid("title must not be empty".into()));
    }
    if self.quartier.trim().is_empty() {
      return Err(Error::Invalid("quartier must not be empty".into()));
    }
    if self.price_gnf <= 0 {
      return Err(Error::Invalid("price_gnf must be positive".into()));
    }
    if self.bedrooms > self.total_rooms {
      return Err(Error::Invalid("bedrooms cannot exceed total_rooms".into()));
    }
    Ok(())
  }
}

/// The listing fields embedded in lead projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
  pub property_id: Uuid,
  pub title:       String,
  pub kind:        PropertyKind,
  pub commune:     Commune,
  pub quartier:    String,
  pub price_gnf:   i64,
}

/// The slice of a listing the admissibility check needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingRef {
  pub property_id: Uuid,
  pub owner_id:    Uuid,
  pub is_active:   bool,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

fn default_min_duration() -> u32 { 6 }

/// Input to [`crate::service::PropertyService::create`].
/// The owner and all counters are set by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProperty {
  pub title:               String,
  pub kind:                PropertyKind,
  pub commune:             Commune,
  pub quartier:            String,
  pub description:         String,
  pub bedrooms:            u32,
  pub bathrooms:           u32,
  pub total_rooms:         u32,
  pub surface_m2:          Option<f64>,
  pub furnished:           Furnished,
  pub water_supply:        WaterSupply,
  pub electricity_type:    ElectricityType,
  #[serde(default)]
  pub generator_included:  bool,
  #[serde(default)]
  pub accessible_in_rain:  bool,
  pub price_gnf:           i64,
  /// Defaults to the creation time.
  pub available_from:      Option<DateTime<Utc>>,
  #[serde(default = "default_min_duration")]
  pub min_duration_months: u32,
}

impl NewProperty {
  pub fn into_property(
    self,
    property_id: Uuid,
    owner_id: Uuid,
    now: DateTime<Utc>,
  ) -> Property {
    Property {
      property_id,
      owner_id,
      title: self.title,
      kind: self.kind,
      commune: self.commune,
      quartier: self.quartier,
      description: self.description,
      bedrooms: self.bedrooms,
      bathrooms: self.bathrooms,
      total_rooms: self.total_rooms,
      surface_m2: self.surface_m2,
      furnished: self.furnished,
      water_supply: self.water_supply,
      electricity_type: self.electricity_type,
      generator_included: self.generator_included,
      accessible_in_rain: self.accessible_in_rain,
      price_gnf: self.price_gnf,
      is_verified: false,
      is_active: true,
      is_available: true,
      available_from: self.available_from.unwrap_or(now),
      min_duration_months: self.min_duration_months,
      view_count: 0,
      lead_count: 0,
      created_at: now,
      updated_at: now,
    }
  }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyPatch {
  pub title:               Option<String>,
  pub kind:                Option<PropertyKind>,
  pub commune:             Option<Commune>,
  pub quartier:            Option<String>,
  pub description:         Option<String>,
  pub bedrooms:            Option<u32>,
  pub bathrooms:           Option<u32>,
  pub total_rooms:         Option<u32>,
  pub surface_m2:          Option<f64>,
  pub furnished:           Option<Furnished>,
  pub water_supply:        Option<WaterSupply>,
  pub electricity_type:    Option<ElectricityType>,
  pub generator_included:  Option<bool>,
  pub accessible_in_rain:  Option<bool>,
  pub price_gnf:           Option<i64>,
  pub is_active:           Option<bool>,
  pub is_available:        Option<bool>,
  pub available_from:      Option<DateTime<Utc>>,
  pub min_duration_months: Option<u32>,
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySort {
  #[default]
  CreatedAt,
  PriceGnf,
  ViewCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

/// Parameters for [`crate::store::MarketStore::search_properties`].
///
/// Only active, available listings are ever returned. Boolean flags are
/// "only if true" filters; `false` means no constraint.
#[derive(Debug, Clone, Default)]
pub struct PropertyQuery {
  pub communes:             Vec<Commune>,
  pub kinds:                Vec<PropertyKind>,
  pub min_price:            Option<i64>,
  pub max_price:            Option<i64>,
  pub bedrooms:             Option<u32>,
  pub furnished:            Option<Furnished>,
  pub water_reliable:       bool,
  pub electricity_reliable: bool,
  pub generator_included:   bool,
  pub accessible_in_rain:   bool,
  pub verified_only:        bool,
  /// Restrict to listings whose `available_from` is not in the future.
  pub available_now:        bool,
  /// Substring match over title, quartier and description.
  pub text:                 Option<String>,
  pub sort_by:              PropertySort,
  pub sort_order:           SortOrder,
  pub limit:                Option<usize>,
  pub offset:               Option<usize>,
}
