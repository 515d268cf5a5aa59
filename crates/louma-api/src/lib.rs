//! JSON REST API for Louma.
//!
//! Exposes an axum [`Router`] backed by any [`louma_core::MarketStore`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", louma_api::api_router(state))
//! ```

pub mod accounts;
pub mod auth;
pub mod error;
pub mod leads;
pub mod properties;
pub mod tokens;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use louma_core::{
  Clock, MarketStore,
  service::{LeadService, PropertyService},
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use tokens::{TokenConfig, TokenIssuer};

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:      Arc<S>,
  pub leads:      LeadService<S>,
  pub properties: PropertyService<S>,
  pub tokens:     Arc<TokenIssuer>,
  pub clock:      Arc<dyn Clock>,
}

impl<S> ApiState<S>
where
  S: MarketStore,
{
  pub fn new(
    store: Arc<S>,
    tokens: TokenIssuer,
    clock: Arc<dyn Clock>,
    max_page_size: usize,
  ) -> Self {
    Self {
      leads: LeadService::new(store.clone(), clock.clone())
        .with_max_page_size(max_page_size),
      properties: PropertyService::new(store.clone(), clock.clone())
        .with_max_page_size(max_page_size),
      store,
      tokens: Arc::new(tokens),
      clock,
    }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      self.store.clone(),
      leads:      self.leads.clone(),
      properties: self.properties.clone(),
      tokens:     self.tokens.clone(),
      clock:      self.clock.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: MarketStore + 'static,
{
  Router::new()
    // Accounts
    .route("/auth/register", post(accounts::register::<S>))
    .route("/auth/login", post(accounts::login::<S>))
    .route("/auth/refresh", post(accounts::refresh::<S>))
    .route("/auth/me", get(accounts::me))
    // Properties
    .route(
      "/properties",
      get(properties::list::<S>).post(properties::create::<S>),
    )
    .route(
      "/properties/{id}",
      get(properties::get_one::<S>)
        .put(properties::update::<S>)
        .delete(properties::delete::<S>),
    )
    .route("/properties/owner/{owner_id}", get(properties::list_by_owner::<S>))
    // Leads
    .route("/leads", get(leads::list_for_owner::<S>).post(leads::create::<S>))
    .route("/leads/mine", get(leads::mine::<S>))
    .route("/leads/{id}", get(leads::get_one::<S>))
    .route("/leads/{id}/status", patch(leads::update_status::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
