//! [`SqliteStore`], the SQLite implementation of [`MarketStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use louma_core::{
  lead::{
    AdmissionSnapshot, Lead, LeadDetails, LeadFilters, LeadStatusChange,
    StatusTransition,
  },
  property::{
    ElectricityType, ListingRef, Property, PropertyQuery, PropertySort,
    SortOrder, WaterSupply,
  },
  store::{InsertOutcome, MarketStore, Page, Window},
  user::User,
};

use crate::{
  Error, Result,
  encode::{
    LEAD_COLUMNS, LEAD_DETAIL_COLUMNS, PROPERTY_COLUMNS, RawLead,
    RawLeadDetails, RawProperty, RawUser, USER_COLUMNS, decode_enum,
    decode_uuid, encode_dt, encode_uuid, like_pattern,
  },
  schema::SCHEMA,
};

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  match e {
    rusqlite::Error::SqliteFailure(f, msg) => {
      f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || msg.as_deref().is_some_and(|m| m.starts_with("UNIQUE"))
    }
    _ => false,
  }
}

/// A `WHERE` clause under construction, with its positional parameters.
#[derive(Default)]
struct Conditions {
  clauses: Vec<String>,
  params:  Vec<Value>,
}

impl Conditions {
  /// Push a clause whose `?` placeholders consume `params` in order.
  fn push(&mut self, clause: impl Into<String>, params: impl IntoIterator<Item = Value>) {
    self.clauses.push(clause.into());
    self.params.extend(params);
  }

  fn require(&mut self, clause: &str) { self.clauses.push(clause.to_owned()); }

  fn push_in(&mut self, column: &str, values: impl IntoIterator<Item = String>) {
    let values: Vec<Value> = values.into_iter().map(Value::Text).collect();
    if values.is_empty() {
      return;
    }
    let marks = vec!["?"; values.len()].join(", ");
    self.push(format!("{column} IN ({marks})"), values);
  }

  fn where_clause(&self) -> String {
    if self.clauses.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.clauses.join(" AND "))
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A LOUMA marketplace store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_properties(
    &self,
    conds: Conditions,
    order_by: String,
    window: Window,
  ) -> Result<Page<Property>> {
    let (raws, total): (Vec<RawProperty>, i64) = self
      .conn
      .call(move |conn| {
        let where_clause = conds.where_clause();

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM properties {where_clause}"),
          rusqlite::params_from_iter(conds.params.iter()),
          |r| r.get(0),
        )?;

        let mut params = conds.params;
        params.push(Value::Integer(window.limit as i64));
        params.push(Value::Integer(window.offset as i64));

        let mut stmt = conn.prepare(&format!(
          "SELECT {PROPERTY_COLUMNS} FROM properties {where_clause}
           ORDER BY {order_by}
           LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawProperty::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawProperty::into_property)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(items, total.max(0) as u64, window))
  }

  /// Run a lead-details listing scoped by `scope` (e.g. `p.owner_id = ?`).
  async fn query_leads(
    &self,
    scope: &'static str,
    scope_id: Uuid,
    filters: &LeadFilters,
    window: Window,
  ) -> Result<Page<LeadDetails>> {
    let mut conds = Conditions::default();
    conds.push(scope, [Value::Text(encode_uuid(scope_id))]);
    if let Some(status) = filters.status {
      conds.push("l.status = ?", [Value::Text(status.as_ref().to_owned())]);
    }
    if let Some(level) = filters.level {
      conds.push("l.level = ?", [Value::Text(level.as_ref().to_owned())]);
    }
    if let Some(property_id) = filters.property_id {
      conds.push("l.property_id = ?", [Value::Text(encode_uuid(property_id))]);
    }

    let (raws, total): (Vec<RawLeadDetails>, i64) = self
      .conn
      .call(move |conn| {
        let from = "FROM leads l
           JOIN properties p ON p.property_id = l.property_id
           JOIN users u      ON u.user_id     = l.user_id";
        let where_clause = conds.where_clause();

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) {from} {where_clause}"),
          rusqlite::params_from_iter(conds.params.iter()),
          |r| r.get(0),
        )?;

        let mut params = conds.params;
        params.push(Value::Integer(window.limit as i64));
        params.push(Value::Integer(window.offset as i64));

        let mut stmt = conn.prepare(&format!(
          "SELECT {LEAD_DETAIL_COLUMNS} {from} {where_clause}
           ORDER BY l.created_at DESC, l.lead_id
           LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawLeadDetails::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawLeadDetails::into_details)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(items, total.max(0) as u64, window))
  }
}

fn property_search_conditions(query: &PropertyQuery, now: DateTime<Utc>) -> Conditions {
  let mut conds = Conditions::default();
  conds.require("is_active = 1 AND is_available = 1");

  conds.push_in("commune", query.communes.iter().map(|c| c.as_ref().to_owned()));
  conds.push_in("kind", query.kinds.iter().map(|k| k.as_ref().to_owned()));
  if let Some(min) = query.min_price {
    conds.push("price_gnf >= ?", [Value::Integer(min)]);
  }
  if let Some(max) = query.max_price {
    conds.push("price_gnf <= ?", [Value::Integer(max)]);
  }
  if let Some(bedrooms) = query.bedrooms {
    conds.push("bedrooms = ?", [Value::Integer(bedrooms.into())]);
  }
  if let Some(furnished) = query.furnished {
    conds.push("furnished = ?", [Value::Text(furnished.as_ref().to_owned())]);
  }
  if query.water_reliable {
    conds.push_in(
      "water_supply",
      WaterSupply::RELIABLE.iter().map(|w| w.as_ref().to_owned()),
    );
  }
  if query.electricity_reliable {
    conds.push_in(
      "electricity_type",
      ElectricityType::RELIABLE.iter().map(|e| e.as_ref().to_owned()),
    );
  }
  if query.generator_included {
    conds.require("generator_included = 1");
  }
  if query.accessible_in_rain {
    conds.require("accessible_in_rain = 1");
  }
  if query.verified_only {
    conds.require("is_verified = 1");
  }
  if query.available_now {
    conds.push("available_from <= ?", [Value::Text(encode_dt(now))]);
  }
  if let Some(text) = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
    let pattern = like_pattern(text);
    conds.push(
      "(title LIKE ? ESCAPE '\\' OR quartier LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')",
      std::iter::repeat_n(Value::Text(pattern), 3),
    );
  }
  conds
}

fn property_order(sort_by: PropertySort, order: SortOrder) -> String {
  let column = match sort_by {
    PropertySort::CreatedAt => "created_at",
    PropertySort::PriceGnf => "price_gnf",
    PropertySort::ViewCount => "view_count",
  };
  let direction = match order {
    SortOrder::Asc => "ASC",
    SortOrder::Desc => "DESC",
  };
  format!("{column} {direction}, property_id")
}

// ─── MarketStore impl ────────────────────────────────────────────────────────

impl MarketStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, user: User) -> Result<InsertOutcome<User>> {
    let id_str        = encode_uuid(user.user_id);
    let role_str      = user.role.as_ref().to_owned();
    let last_login    = user.last_login_at.map(encode_dt);
    let created_str   = encode_dt(user.created_at);
    let updated_str   = encode_dt(user.updated_at);
    let full_name     = user.full_name.clone();
    let phone         = user.phone.clone();
    let email         = user.email.clone();
    let password_hash = user.password_hash.clone();
    let profession    = user.profession.clone();
    let household     = user.household_size;
    let completion    = user.completion_percent;
    let is_active     = user.is_active;
    let is_verified   = user.is_verified;

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          &format!(
            "INSERT INTO users ({USER_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
          ),
          rusqlite::params![
            id_str,
            full_name,
            phone,
            email,
            password_hash,
            role_str,
            profession,
            household,
            completion,
            is_active,
            is_verified,
            last_login,
            created_str,
            updated_str,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(if inserted { InsertOutcome::Inserted(user) } else { InsertOutcome::Duplicate })
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>> {
    let phone = phone.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE phone = ?1"),
              rusqlite::params![phone],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET last_login_at = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Properties ────────────────────────────────────────────────────────────

  async fn add_property(&self, property: Property) -> Result<Property> {
    let p = property.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO properties ({PROPERTY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24,
                     ?25, ?26)"
          ),
          rusqlite::params![
            encode_uuid(p.property_id),
            encode_uuid(p.owner_id),
            p.title,
            p.kind.as_ref(),
            p.commune.as_ref(),
            p.quartier,
            p.description,
            p.bedrooms,
            p.bathrooms,
            p.total_rooms,
            p.surface_m2,
            p.furnished.as_ref(),
            p.water_supply.as_ref(),
            p.electricity_type.as_ref(),
            p.generator_included,
            p.accessible_in_rain,
            p.price_gnf,
            p.is_verified,
            p.is_active,
            p.is_available,
            encode_dt(p.available_from),
            p.min_duration_months,
            p.view_count as i64,
            p.lead_count as i64,
            encode_dt(p.created_at),
            encode_dt(p.updated_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(property)
  }

  async fn get_property(&self, id: Uuid) -> Result<Option<Property>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProperty> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE property_id = ?1"),
              rusqlite::params![id_str],
              RawProperty::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProperty::into_property).transpose()
  }

  async fn increment_view_count(&self, id: Uuid) -> Result<Option<Property>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProperty> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE properties SET view_count = view_count + 1 WHERE property_id = ?1",
          rusqlite::params![id_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE property_id = ?1"),
          rusqlite::params![id_str],
          RawProperty::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawProperty::into_property).transpose()
  }

  async fn update_property(&self, property: Property) -> Result<Property> {
    let p = property.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE properties SET
             title = ?2, kind = ?3, commune = ?4, quartier = ?5,
             description = ?6, bedrooms = ?7, bathrooms = ?8,
             total_rooms = ?9, surface_m2 = ?10, furnished = ?11,
             water_supply = ?12, electricity_type = ?13,
             generator_included = ?14, accessible_in_rain = ?15,
             price_gnf = ?16, is_active = ?17, is_available = ?18,
             available_from = ?19, min_duration_months = ?20,
             updated_at = ?21
           WHERE property_id = ?1",
          rusqlite::params![
            encode_uuid(p.property_id),
            p.title,
            p.kind.as_ref(),
            p.commune.as_ref(),
            p.quartier,
            p.description,
            p.bedrooms,
            p.bathrooms,
            p.total_rooms,
            p.surface_m2,
            p.furnished.as_ref(),
            p.water_supply.as_ref(),
            p.electricity_type.as_ref(),
            p.generator_included,
            p.accessible_in_rain,
            p.price_gnf,
            p.is_active,
            p.is_available,
            encode_dt(p.available_from),
            p.min_duration_months,
            encode_dt(p.updated_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(property)
  }

  async fn delete_property(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
    let id_str    = encode_uuid(id);
    let owner_str = encode_uuid(owner_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM properties WHERE property_id = ?1 AND owner_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn search_properties(
    &self,
    query: &PropertyQuery,
    now: DateTime<Utc>,
    window: Window,
  ) -> Result<Page<Property>> {
    let conds = property_search_conditions(query, now);
    let order_by = property_order(query.sort_by, query.sort_order);
    self.query_properties(conds, order_by, window).await
  }

  async fn list_properties_by_owner(
    &self,
    owner_id: Uuid,
    window: Window,
  ) -> Result<Page<Property>> {
    let mut conds = Conditions::default();
    conds.push("owner_id = ?", [Value::Text(encode_uuid(owner_id))]);
    let order_by = property_order(PropertySort::CreatedAt, SortOrder::Desc);
    self.query_properties(conds, order_by, window).await
  }

  // ── Leads ─────────────────────────────────────────────────────────────────

  async fn admission_snapshot(
    &self,
    property_id: Uuid,
    user_id: Uuid,
  ) -> Result<AdmissionSnapshot> {
    let property_str = encode_uuid(property_id);
    let user_str     = encode_uuid(user_id);

    let (listing, existing): (Option<(String, bool)>, Option<String>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let listing = tx
          .query_row(
            "SELECT owner_id, is_active FROM properties WHERE property_id = ?1",
            rusqlite::params![property_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        let existing = tx
          .query_row(
            "SELECT lead_id FROM leads WHERE property_id = ?1 AND user_id = ?2",
            rusqlite::params![property_str, user_str],
            |r| r.get(0),
          )
          .optional()?;
        tx.commit()?;
        Ok((listing, existing))
      })
      .await?;

    let listing = listing
      .map(|(owner, is_active)| -> Result<ListingRef> {
        Ok(ListingRef { property_id, owner_id: decode_uuid(&owner)?, is_active })
      })
      .transpose()?;
    let existing_lead = existing.as_deref().map(decode_uuid).transpose()?;

    Ok(AdmissionSnapshot { property_id, listing, existing_lead })
  }

  async fn insert_lead(&self, lead: Lead) -> Result<InsertOutcome<Lead>> {
    let l = lead.clone();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let property_str = encode_uuid(l.property_id);
        let result = tx.execute(
          &format!(
            "INSERT INTO leads ({LEAD_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
          ),
          rusqlite::params![
            encode_uuid(l.lead_id),
            property_str,
            encode_uuid(l.user_id),
            l.message,
            l.status.as_ref(),
            l.level.as_ref(),
            l.notes,
            l.contact_date.map(encode_dt),
            encode_dt(l.created_at),
            encode_dt(l.updated_at),
          ],
        );
        match result {
          Ok(_) => {}
          // Dropping the transaction rolls it back.
          Err(e) if is_unique_violation(&e) => return Ok(false),
          Err(e) => return Err(e.into()),
        }
        tx.execute(
          "UPDATE properties SET lead_count = lead_count + 1 WHERE property_id = ?1",
          rusqlite::params![property_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(if inserted { InsertOutcome::Inserted(lead) } else { InsertOutcome::Duplicate })
  }

  async fn get_lead(&self, id: Uuid) -> Result<Option<LeadDetails>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawLeadDetails> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {LEAD_DETAIL_COLUMNS}
                 FROM leads l
                 JOIN properties p ON p.property_id = l.property_id
                 JOIN users u      ON u.user_id     = l.user_id
                 WHERE l.lead_id = ?1"
              ),
              rusqlite::params![id_str],
              RawLeadDetails::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawLeadDetails::into_details).transpose()
  }

  async fn update_lead_status(
    &self,
    lead_id: Uuid,
    owner_id: Uuid,
    change: LeadStatusChange,
  ) -> Result<Option<StatusTransition>> {
    let lead_str  = encode_uuid(lead_id);
    let owner_str = encode_uuid(owner_id);

    let updated: Option<(String, RawLead)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let previous: Option<String> = tx
          .query_row(
            "SELECT l.status FROM leads l
             JOIN properties p ON p.property_id = l.property_id
             WHERE l.lead_id = ?1 AND p.owner_id = ?2",
            rusqlite::params![lead_str, owner_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(previous) = previous else {
          return Ok(None);
        };

        tx.execute(
          "UPDATE leads SET
             status       = ?2,
             level        = ?3,
             notes        = COALESCE(?4, notes),
             contact_date = COALESCE(?5, contact_date),
             updated_at   = ?6
           WHERE lead_id = ?1",
          rusqlite::params![
            lead_str,
            change.status.as_ref(),
            change.level.as_ref(),
            change.notes,
            change.contact_date.map(encode_dt),
            encode_dt(change.updated_at),
          ],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE lead_id = ?1"),
          rusqlite::params![lead_str],
          RawLead::from_row,
        )?;
        tx.commit()?;
        Ok(Some((previous, raw)))
      })
      .await?;

    updated
      .map(|(previous, raw)| {
        Ok(StatusTransition {
          previous: decode_enum("lead status", &previous)?,
          lead:     raw.into_lead()?,
        })
      })
      .transpose()
  }

  async fn list_leads_for_owner(
    &self,
    owner_id: Uuid,
    filters: &LeadFilters,
    window: Window,
  ) -> Result<Page<LeadDetails>> {
    self.query_leads("p.owner_id = ?", owner_id, filters, window).await
  }

  async fn list_leads_for_requester(
    &self,
    user_id: Uuid,
    filters: &LeadFilters,
    window: Window,
  ) -> Result<Page<LeadDetails>> {
    self.query_leads("l.user_id = ?", user_id, filters, window).await
  }
}
