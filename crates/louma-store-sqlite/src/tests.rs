//! Integration tests for `SqliteStore` against an in-memory database, and
//! for the services running on top of it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use louma_core::{
  Error as CoreError, FixedClock,
  lead::{LeadFilters, LeadLevel, LeadStatus, LeadStatusUpdate, LeadSubmission},
  property::{
    Commune, ElectricityType, Furnished, NewProperty, Property, PropertyKind,
    PropertyPatch, PropertyQuery, PropertySort, SortOrder, WaterSupply,
  },
  service::{LeadService, PropertyService},
  store::{InsertOutcome, MarketStore, Window},
  user::{Actor, Role, User},
};
use uuid::Uuid;

use crate::SqliteStore;

fn t0() -> DateTime<Utc> {
  DateTime::parse_from_rfc3339("2025-03-01T09:00:00Z")
    .unwrap()
    .with_timezone(&Utc)
}

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

struct Market {
  store:      Arc<SqliteStore>,
  clock:      FixedClock,
  leads:      LeadService<SqliteStore>,
  properties: PropertyService<SqliteStore>,
}

async fn market() -> Market {
  let store = Arc::new(store().await);
  let clock = FixedClock::new(t0());
  Market {
    leads: LeadService::new(Arc::clone(&store), Arc::new(clock.clone())),
    properties: PropertyService::new(Arc::clone(&store), Arc::new(clock.clone())),
    store,
    clock,
  }
}

fn user(phone: &str, role: Role) -> User {
  User {
    user_id:            Uuid::new_v4(),
    full_name:          format!("User {phone}"),
    phone:              phone.into(),
    email:              None,
    password_hash:      "not-a-real-hash".into(),
    role,
    profession:         Some("Enseignant".into()),
    household_size:     None,
    completion_percent: 25,
    is_active:          true,
    is_verified:        false,
    last_login_at:      None,
    created_at:         t0(),
    updated_at:         t0(),
  }
}

async fn add_user(s: &SqliteStore, phone: &str, role: Role) -> Actor {
  match s.add_user(user(phone, role)).await.unwrap() {
    InsertOutcome::Inserted(u) => u.actor(),
    InsertOutcome::Duplicate => panic!("phone {phone} already taken"),
  }
}

fn listing(title: &str, commune: Commune, price_gnf: i64) -> NewProperty {
  NewProperty {
    title: title.into(),
    kind: PropertyKind::Appartement,
    commune,
    quartier: "Kipé".into(),
    description: "Deux chambres, salon, cuisine".into(),
    bedrooms: 2,
    bathrooms: 1,
    total_rooms: 4,
    surface_m2: Some(80.0),
    furnished: Furnished::Empty,
    water_supply: WaterSupply::SeegReliable,
    electricity_type: ElectricityType::EdgIntermittent,
    generator_included: false,
    accessible_in_rain: true,
    price_gnf,
    available_from: None,
    min_duration_months: 6,
  }
}

async fn publish(m: &Market, owner: &Actor, title: &str) -> Property {
  m.properties
    .create(owner, listing(title, Commune::Ratoma, 2_500_000))
    .await
    .unwrap()
}

fn full_submission(property_id: Uuid) -> LeadSubmission {
  LeadSubmission {
    property_id,
    message: Some("Bonjour, je suis intéressé".into()),
    budget_gnf: Some(3_000_000),
    professional_status: Some("Salarié".into()),
    desired_duration_months: Some(12),
    household_size: Some(3),
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_find_user() {
  let s = store().await;
  let actor = add_user(&s, "622000001", Role::Owner).await;

  let by_id = s.get_user(actor.user_id).await.unwrap().unwrap();
  assert_eq!(by_id.role, Role::Owner);
  assert_eq!(by_id.password_hash, "not-a-real-hash");

  let by_phone = s.find_user_by_phone("622000001").await.unwrap().unwrap();
  assert_eq!(by_phone.user_id, actor.user_id);
  assert!(s.find_user_by_phone("622999999").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_phone_is_reported() {
  let s = store().await;
  add_user(&s, "622000001", Role::Tenant).await;
  let outcome = s.add_user(user("622000001", Role::Tenant)).await.unwrap();
  assert!(matches!(outcome, InsertOutcome::Duplicate));
}

#[tokio::test]
async fn record_login_sets_timestamp() {
  let s = store().await;
  let actor = add_user(&s, "622000001", Role::Tenant).await;
  let at = t0() + Duration::hours(3);
  s.record_login(actor.user_id, at).await.unwrap();

  let u = s.get_user(actor.user_id).await.unwrap().unwrap();
  assert_eq!(u.last_login_at, Some(at));
}

// ─── Properties ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn tenants_cannot_publish() {
  let m = market().await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  let err = m
    .properties
    .create(&tenant, listing("Studio", Commune::Kaloum, 1_000_000))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Forbidden));
}

#[tokio::test]
async fn invalid_listing_is_rejected() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let err = m
    .properties
    .create(&owner, listing("  ", Commune::Kaloum, 1_000_000))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Invalid(_)));
}

#[tokio::test]
async fn get_counts_views() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let p = publish(&m, &owner, "F3 Kipé").await;

  m.properties.get(p.property_id).await.unwrap();
  let seen = m.properties.get(p.property_id).await.unwrap();
  assert_eq!(seen.view_count, 2);

  let id = Uuid::new_v4();
  let missing = m.properties.get(id).await.unwrap_err();
  assert!(matches!(missing, CoreError::PropertyNotFound(got) if got == id));
}

#[tokio::test]
async fn search_filters_and_sorts() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Agency).await;

  let cheap = m
    .properties
    .create(&owner, listing("Chambre Matoto", Commune::Matoto, 800_000))
    .await
    .unwrap();
  m.clock.advance(Duration::minutes(1));
  let mut villa = listing("Villa Kaloum", Commune::Kaloum, 12_000_000);
  villa.kind = PropertyKind::Villa;
  villa.electricity_type = ElectricityType::Solar;
  let villa = m.properties.create(&owner, villa).await.unwrap();
  m.clock.advance(Duration::minutes(1));
  let hidden = m
    .properties
    .create(&owner, listing("F2 Ratoma", Commune::Ratoma, 2_000_000))
    .await
    .unwrap();
  m.properties
    .update(&owner, hidden.property_id, PropertyPatch {
      is_available: Some(false),
      ..PropertyPatch::default()
    })
    .await
    .unwrap();

  // Unavailable listings never show; newest first by default.
  let all = m.properties.list(&PropertyQuery::default()).await.unwrap();
  assert_eq!(all.total, 2);
  let ids: Vec<Uuid> = all.items.iter().map(|p| p.property_id).collect();
  assert_eq!(ids, vec![villa.property_id, cheap.property_id]);

  let by_price = m
    .properties
    .list(&PropertyQuery {
      sort_by: PropertySort::PriceGnf,
      sort_order: SortOrder::Asc,
      ..PropertyQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(by_price.items[0].property_id, cheap.property_id);

  let reliable = m
    .properties
    .list(&PropertyQuery { electricity_reliable: true, ..PropertyQuery::default() })
    .await
    .unwrap();
  assert_eq!(reliable.total, 1);
  assert_eq!(reliable.items[0].property_id, villa.property_id);

  let in_kaloum_or_dixinn = m
    .properties
    .list(&PropertyQuery {
      communes: vec![Commune::Kaloum, Commune::Dixinn],
      max_price: Some(20_000_000),
      ..PropertyQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(in_kaloum_or_dixinn.total, 1);

  let text = m
    .properties
    .list(&PropertyQuery { text: Some("matoto".into()), ..PropertyQuery::default() })
    .await
    .unwrap();
  assert_eq!(text.total, 1);
  assert_eq!(text.items[0].property_id, cheap.property_id);
}

#[tokio::test]
async fn search_pages_report_totals() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  for i in 0..5 {
    publish(&m, &owner, &format!("Appartement {i}")).await;
    m.clock.advance(Duration::seconds(1));
  }

  let page = m
    .properties
    .list(&PropertyQuery { limit: Some(2), offset: Some(2), ..PropertyQuery::default() })
    .await
    .unwrap();
  assert_eq!(page.items.len(), 2);
  assert_eq!(page.total, 5);
  assert!(page.has_more);
  assert_eq!(page.items[0].title, "Appartement 2");
}

#[tokio::test]
async fn available_now_uses_the_clock() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let mut later = listing("Libre en avril", Commune::Dixinn, 3_000_000);
  later.available_from = Some(t0() + Duration::days(30));
  m.properties.create(&owner, later).await.unwrap();

  let query = PropertyQuery { available_now: true, ..PropertyQuery::default() };
  assert_eq!(m.properties.list(&query).await.unwrap().total, 0);

  m.clock.advance(Duration::days(31));
  assert_eq!(m.properties.list(&query).await.unwrap().total, 1);
}

#[tokio::test]
async fn only_the_owner_updates_or_deletes() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let other = add_user(&m.store, "622000002", Role::Owner).await;
  let p = publish(&m, &owner, "F3 Kipé").await;

  let patch = PropertyPatch { price_gnf: Some(2_800_000), ..PropertyPatch::default() };
  let err = m.properties.update(&other, p.property_id, patch.clone()).await.unwrap_err();
  assert!(matches!(err, CoreError::PropertyNotFound(_)));

  m.clock.advance(Duration::hours(1));
  let updated = m.properties.update(&owner, p.property_id, patch).await.unwrap();
  assert_eq!(updated.price_gnf, 2_800_000);
  assert_eq!(updated.updated_at, t0() + Duration::hours(1));

  let err = m.properties.delete(&other, p.property_id).await.unwrap_err();
  assert!(matches!(err, CoreError::PropertyNotFound(_)));
  m.properties.delete(&owner, p.property_id).await.unwrap();
  assert!(m.store.get_property(p.property_id).await.unwrap().is_none());
}

#[tokio::test]
async fn list_by_owner_includes_inactive() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let other = add_user(&m.store, "622000002", Role::Owner).await;
  let p = publish(&m, &owner, "A").await;
  publish(&m, &owner, "B").await;
  publish(&m, &other, "C").await;
  m.properties
    .update(&owner, p.property_id, PropertyPatch {
      is_active: Some(false),
      ..PropertyPatch::default()
    })
    .await
    .unwrap();

  let page = m.properties.list_by_owner(owner.user_id, None, None).await.unwrap();
  assert_eq!(page.total, 2);
  assert!(page.items.iter().all(|p| p.owner_id == owner.user_id));
}

// ─── Lead submission ─────────────────────────────────────────────────────────

#[tokio::test]
async fn full_submission_is_verified_and_counted() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  let p = publish(&m, &owner, "F3 Kipé").await;

  let lead = m.leads.create(&tenant, full_submission(p.property_id)).await.unwrap();
  assert_eq!(lead.status, LeadStatus::New);
  assert_eq!(lead.level, LeadLevel::Verified);
  assert_eq!(lead.user_id, tenant.user_id);
  assert_eq!(lead.created_at, t0());
  assert!(lead.message.starts_with("Bonjour, je suis intéressé\n"));
  assert!(lead.message.contains("Taille du foyer : 3 personne(s)"));

  let p = m.store.get_property(p.property_id).await.unwrap().unwrap();
  assert_eq!(p.lead_count, 1);
}

#[tokio::test]
async fn bare_submission_is_cold_with_fallback_message() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  let p = publish(&m, &owner, "F3 Kipé").await;

  let lead = m
    .leads
    .create(&tenant, LeadSubmission::new(p.property_id))
    .await
    .unwrap();
  assert_eq!(lead.level, LeadLevel::Cold);
  assert_eq!(lead.message, "Demande de renseignements");
}

#[tokio::test]
async fn second_submission_is_a_duplicate() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  let p = publish(&m, &owner, "F3 Kipé").await;

  m.leads.create(&tenant, LeadSubmission::new(p.property_id)).await.unwrap();
  let err = m
    .leads
    .create(&tenant, full_submission(p.property_id))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::DuplicateSubmission));

  let p = m.store.get_property(p.property_id).await.unwrap().unwrap();
  assert_eq!(p.lead_count, 1);
}

#[tokio::test]
async fn store_rejects_duplicate_insert_without_counting() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  let p = publish(&m, &owner, "F3 Kipé").await;

  let first = m.leads.create(&tenant, LeadSubmission::new(p.property_id)).await.unwrap();

  // Bypass the snapshot check, as a concurrent submission would.
  let racing = louma_core::lead::Lead { lead_id: Uuid::new_v4(), ..first };
  let outcome = m.store.insert_lead(racing).await.unwrap();
  assert!(matches!(outcome, InsertOutcome::Duplicate));

  let p = m.store.get_property(p.property_id).await.unwrap().unwrap();
  assert_eq!(p.lead_count, 1);
}

#[tokio::test]
async fn concurrent_submissions_persist_once() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  let p = publish(&m, &owner, "F3 Kipé").await;

  let (a, b) = tokio::join!(
    m.leads.create(&tenant, LeadSubmission::new(p.property_id)),
    m.leads.create(&tenant, LeadSubmission::new(p.property_id)),
  );
  assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
  let err = a.err().or(b.err()).unwrap();
  assert!(matches!(err, CoreError::DuplicateSubmission));
}

#[tokio::test]
async fn owner_cannot_lead_on_own_listing() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let p = publish(&m, &owner, "F3 Kipé").await;

  let err = m
    .leads
    .create(&owner, full_submission(p.property_id))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::SelfSubmission));
}

#[tokio::test]
async fn inactive_or_missing_listing_is_not_found() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  let p = publish(&m, &owner, "F3 Kipé").await;
  m.properties
    .update(&owner, p.property_id, PropertyPatch {
      is_active: Some(false),
      ..PropertyPatch::default()
    })
    .await
    .unwrap();

  let err = m
    .leads
    .create(&tenant, LeadSubmission::new(p.property_id))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::PropertyNotFound(id) if id == p.property_id));

  let missing = Uuid::new_v4();
  let err = m
    .leads
    .create(&tenant, LeadSubmission::new(missing))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::PropertyNotFound(id) if id == missing));
}

// ─── Lead listings and lookup ────────────────────────────────────────────────

#[tokio::test]
async fn owner_only_sees_leads_on_own_listings() {
  let m = market().await;
  let alice = add_user(&m.store, "622000001", Role::Owner).await;
  let bob = add_user(&m.store, "622000002", Role::Agency).await;
  let tenant = add_user(&m.store, "622000003", Role::Tenant).await;
  let other_tenant = add_user(&m.store, "622000004", Role::Tenant).await;

  let pa = publish(&m, &alice, "Chez Alice").await;
  let pb = publish(&m, &bob, "Chez Bob").await;
  m.leads.create(&tenant, full_submission(pa.property_id)).await.unwrap();
  m.clock.advance(Duration::minutes(1));
  m.leads.create(&other_tenant, LeadSubmission::new(pa.property_id)).await.unwrap();
  m.leads.create(&tenant, LeadSubmission::new(pb.property_id)).await.unwrap();

  let page = m.leads.list_for_owner(&alice, &LeadFilters::default()).await.unwrap();
  assert_eq!(page.total, 2);
  assert!(page.items.iter().all(|d| d.property.property_id == pa.property_id));
  // Newest first.
  assert_eq!(page.items[0].tenant.user_id, other_tenant.user_id);
  assert_eq!(page.items[1].property.title, "Chez Alice");

  let hot_only = LeadFilters { level: Some(LeadLevel::Verified), ..LeadFilters::default() };
  let page = m.leads.list_for_owner(&alice, &hot_only).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.items[0].tenant.user_id, tenant.user_id);
  assert_eq!(page.items[0].tenant.profession.as_deref(), Some("Enseignant"));

  let bobs = m.leads.list_for_owner(&bob, &LeadFilters::default()).await.unwrap();
  assert_eq!(bobs.total, 1);
  assert_eq!(bobs.items[0].property.property_id, pb.property_id);
}

#[tokio::test]
async fn tenants_cannot_list_owner_leads() {
  let m = market().await;
  let tenant = add_user(&m.store, "622000003", Role::Tenant).await;
  let err = m
    .leads
    .list_for_owner(&tenant, &LeadFilters::default())
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Forbidden));
}

#[tokio::test]
async fn requester_lists_own_leads_paged() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  for i in 0..3 {
    let p = publish(&m, &owner, &format!("Logement {i}")).await;
    m.leads.create(&tenant, LeadSubmission::new(p.property_id)).await.unwrap();
    m.clock.advance(Duration::seconds(1));
  }

  let filters = LeadFilters { limit: Some(2), ..LeadFilters::default() };
  let page = m.leads.list_for_requester(&tenant, &filters).await.unwrap();
  assert_eq!(page.items.len(), 2);
  assert_eq!(page.total, 3);
  assert!(page.has_more);
  assert_eq!(page.items[0].property.title, "Logement 2");
}

#[tokio::test]
async fn get_is_limited_to_requester_and_managers() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  let stranger = add_user(&m.store, "622000003", Role::Tenant).await;
  let p = publish(&m, &owner, "F3 Kipé").await;
  let lead = m.leads.create(&tenant, full_submission(p.property_id)).await.unwrap();

  let mine = m.leads.get(&tenant, lead.lead_id).await.unwrap();
  assert_eq!(mine.lead, lead);
  assert!(m.leads.get(&owner, lead.lead_id).await.is_ok());

  let err = m.leads.get(&stranger, lead.lead_id).await.unwrap_err();
  assert!(matches!(err, CoreError::Forbidden));

  let err = m.leads.get(&tenant, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, CoreError::LeadNotFound(_)));
}

// ─── Status updates ──────────────────────────────────────────────────────────

#[tokio::test]
async fn visited_is_hot_regardless_of_score() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  let p = publish(&m, &owner, "F3 Kipé").await;
  let lead = m.leads.create(&tenant, full_submission(p.property_id)).await.unwrap();
  assert_eq!(lead.level, LeadLevel::Verified);

  m.clock.advance(Duration::hours(2));
  let contact = t0() + Duration::hours(1);
  let updated = m
    .leads
    .update_status(&owner, lead.lead_id, LeadStatusUpdate {
      status:       LeadStatus::Visited,
      notes:        Some("Visite samedi".into()),
      contact_date: Some(contact),
    })
    .await
    .unwrap();
  assert_eq!(updated.status, LeadStatus::Visited);
  assert_eq!(updated.level, LeadLevel::Hot);
  assert_eq!(updated.notes.as_deref(), Some("Visite samedi"));
  assert_eq!(updated.contact_date, Some(contact));
  assert_eq!(updated.updated_at, t0() + Duration::hours(2));
  assert_eq!(updated.message, lead.message);

  // Omitted notes and contact date are kept; regression is allowed.
  let back = m
    .leads
    .update_status(&owner, lead.lead_id, LeadStatusUpdate {
      status:       LeadStatus::New,
      notes:        None,
      contact_date: None,
    })
    .await
    .unwrap();
  assert_eq!(back.level, LeadLevel::Cold);
  assert_eq!(back.notes.as_deref(), Some("Visite samedi"));
  assert_eq!(back.contact_date, Some(contact));
}

#[tokio::test]
async fn foreign_leads_look_missing_to_other_owners() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let rival = add_user(&m.store, "622000009", Role::Agency).await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  let p = publish(&m, &owner, "F3 Kipé").await;
  let lead = m.leads.create(&tenant, LeadSubmission::new(p.property_id)).await.unwrap();

  let update = || LeadStatusUpdate {
    status:       LeadStatus::Closed,
    notes:        None,
    contact_date: None,
  };
  let err = m.leads.update_status(&rival, lead.lead_id, update()).await.unwrap_err();
  assert!(matches!(err, CoreError::LeadNotFound(id) if id == lead.lead_id));

  let err = m.leads.update_status(&tenant, lead.lead_id, update()).await.unwrap_err();
  assert!(matches!(err, CoreError::LeadNotFound(_)));

  let stored = m.store.get_lead(lead.lead_id).await.unwrap().unwrap();
  assert_eq!(stored.lead.status, LeadStatus::New);
}

#[tokio::test]
async fn deleting_a_listing_removes_its_leads() {
  let m = market().await;
  let owner = add_user(&m.store, "622000001", Role::Owner).await;
  let tenant = add_user(&m.store, "622000002", Role::Tenant).await;
  let p = publish(&m, &owner, "F3 Kipé").await;
  let lead = m.leads.create(&tenant, LeadSubmission::new(p.property_id)).await.unwrap();

  m.properties.delete(&owner, p.property_id).await.unwrap();
  assert!(m.store.get_lead(lead.lead_id).await.unwrap().is_none());
  let window = Window::resolve(None, None, 100);
  let page = m
    .store
    .list_leads_for_requester(tenant.user_id, &LeadFilters::default(), window)
    .await
    .unwrap();
  assert_eq!(page.total, 0);
}
