//! Handlers for `/properties` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/properties` | Public search; see [`ListParams`] |
//! | `GET`    | `/properties/{id}` | Counts a view; 404 if not found |
//! | `POST`   | `/properties` | Owners and agencies only |
//! | `PUT`    | `/properties/{id}` | Listing owner only |
//! | `DELETE` | `/properties/{id}` | Listing owner only; removes its leads |
//! | `GET`    | `/properties/owner/{owner_id}` | All listings of one owner |

use std::str::FromStr;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use louma_core::{
  Error as CoreError, MarketStore,
  property::{
    Furnished, NewProperty, Property, PropertyPatch, PropertyQuery, PropertySort,
    SortOrder,
  },
  store::Page,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  auth::Authenticated,
  error::{ApiError, Result},
};

/// Parse a comma-separated list of enum labels, ignoring empty items.
fn parse_list<T: FromStr>(kind: &'static str, raw: Option<&str>) -> Result<Vec<T>> {
  raw
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(|s| {
      T::from_str(s).map_err(|_| {
        ApiError::from(CoreError::UnknownVariant { kind, value: s.to_owned() })
      })
    })
    .collect()
}

// ─── List ────────────────────────────────────────────────────────────────────

/// Query string for `GET /properties`. `commune` and `kind` take
/// comma-separated labels, e.g. `?commune=Ratoma,Matam`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub commune:              Option<String>,
  pub kind:                 Option<String>,
  pub min_price:            Option<i64>,
  pub max_price:            Option<i64>,
  pub bedrooms:             Option<u32>,
  pub furnished:            Option<Furnished>,
  pub water_reliable:       Option<bool>,
  pub electricity_reliable: Option<bool>,
  pub generator_included:   Option<bool>,
  pub accessible_in_rain:   Option<bool>,
  pub verified_only:        Option<bool>,
  pub available_now:        Option<bool>,
  pub q:                    Option<String>,
  pub sort_by:              Option<PropertySort>,
  pub sort_order:           Option<SortOrder>,
  pub limit:                Option<usize>,
  pub offset:               Option<usize>,
}

impl ListParams {
  pub fn into_query(self) -> Result<PropertyQuery> {
    Ok(PropertyQuery {
      communes:             parse_list("commune", self.commune.as_deref())?,
      kinds:                parse_list("property kind", self.kind.as_deref())?,
      min_price:            self.min_price,
      max_price:            self.max_price,
      bedrooms:             self.bedrooms,
      furnished:            self.furnished,
      water_reliable:       self.water_reliable.unwrap_or(false),
      electricity_reliable: self.electricity_reliable.unwrap_or(false),
      generator_included:   self.generator_included.unwrap_or(false),
      accessible_in_rain:   self.accessible_in_rain.unwrap_or(false),
      verified_only:        self.verified_only.unwrap_or(false),
      available_now:        self.available_now.unwrap_or(false),
      text:                 self.q,
      sort_by:              self.sort_by.unwrap_or_default(),
      sort_order:           self.sort_order.unwrap_or_default(),
      limit:                self.limit,
      offset:               self.offset,
    })
  }
}

/// `GET /properties`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Property>>>
where
  S: MarketStore + 'static,
{
  let query = params.into_query()?;
  Ok(Json(state.properties.list(&query).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /properties/owner/{owner_id}`
pub async fn list_by_owner<S>(
  State(state): State<ApiState<S>>,
  Path(owner_id): Path<Uuid>,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<Property>>>
where
  S: MarketStore + 'static,
{
  let page = state
    .properties
    .list_by_owner(owner_id, params.limit, params.offset)
    .await?;
  Ok(Json(page))
}

// ─── Single listing ──────────────────────────────────────────────────────────

/// `GET /properties/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Property>>
where
  S: MarketStore + 'static,
{
  Ok(Json(state.properties.get(id).await?))
}

/// `POST /properties`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<NewProperty>,
) -> Result<(StatusCode, Json<Property>)>
where
  S: MarketStore + 'static,
{
  let property = state.properties.create(&auth.actor(), body).await?;
  Ok((StatusCode::CREATED, Json(property)))
}

/// `PUT /properties/{id}`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<PropertyPatch>,
) -> Result<Json<Property>>
where
  S: MarketStore + 'static,
{
  Ok(Json(state.properties.update(&auth.actor(), id, patch).await?))
}

/// `DELETE /properties/{id}`
pub async fn delete<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode>
where
  S: MarketStore + 'static,
{
  state.properties.delete(&auth.actor(), id).await?;
  Ok(StatusCode::NO_CONTENT)
}
