use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::{DEFAULT_MAX_PAGE_SIZE, store_err};
use crate::{
  Clock, Error, MarketStore, Result,
  property::{NewProperty, Property, PropertyPatch, PropertyQuery},
  store::{Page, Window},
  user::Actor,
};

/// Listing management and public search.
pub struct PropertyService<S> {
  store:         Arc<S>,
  clock:         Arc<dyn Clock>,
  max_page_size: usize,
}

impl<S> Clone for PropertyService<S> {
  fn clone(&self) -> Self {
    Self {
      store:         Arc::clone(&self.store),
      clock:         Arc::clone(&self.clock),
      max_page_size: self.max_page_size,
    }
  }
}

impl<S: MarketStore> PropertyService<S> {
  pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
    Self { store, clock, max_page_size: DEFAULT_MAX_PAGE_SIZE }
  }

  pub fn with_max_page_size(mut self, max: usize) -> Self {
    self.max_page_size = max;
    self
  }

  /// Publish a listing owned by `actor`. Tenants cannot publish.
  pub async fn create(&self, actor: &Actor, input: NewProperty) -> Result<Property> {
    if !actor.role.manages_listings() {
      return Err(Error::Forbidden);
    }
    let property = input.into_property(Uuid::new_v4(), actor.user_id, self.clock.now());
    property.validate()?;

    let property = self.store.add_property(property).await.map_err(store_err::<S>)?;
    info!(property_id = %property.property_id, owner_id = %actor.user_id, "property created");
    Ok(property)
  }

  /// Fetch a listing and count the view.
  pub async fn get(&self, id: Uuid) -> Result<Property> {
    self
      .store
      .increment_view_count(id)
      .await
      .map_err(store_err::<S>)?
      .ok_or(Error::PropertyNotFound(id))
  }

  pub async fn list(&self, query: &PropertyQuery) -> Result<Page<Property>> {
    let window = Window::resolve(query.limit, query.offset, self.max_page_size);
    self
      .store
      .search_properties(query, self.clock.now(), window)
      .await
      .map_err(store_err::<S>)
  }

  pub async fn list_by_owner(
    &self,
    owner_id: Uuid,
    limit: Option<usize>,
    offset: Option<usize>,
  ) -> Result<Page<Property>> {
    let window = Window::resolve(limit, offset, self.max_page_size);
    self
      .store
      .list_properties_by_owner(owner_id, window)
      .await
      .map_err(store_err::<S>)
  }

  /// Apply `patch` to a listing the actor owns.
  pub async fn update(
    &self,
    actor: &Actor,
    id: Uuid,
    patch: PropertyPatch,
  ) -> Result<Property> {
    let mut property = self
      .store
      .get_property(id)
      .await
      .map_err(store_err::<S>)?
      .filter(|p| p.owner_id == actor.user_id)
      .ok_or(Error::PropertyNotFound(id))?;

    property.apply(patch);
    property.validate()?;
    property.updated_at = self.clock.now();

    let property = self.store.update_property(property).await.map_err(store_err::<S>)?;
    info!(property_id = %id, "property updated");
    Ok(property)
  }

  /// Delete a listing the actor owns, along with its leads.
  pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
    if !self
      .store
      .delete_property(id, actor.user_id)
      .await
      .map_err(store_err::<S>)?
    {
      return Err(Error::PropertyNotFound(id));
    }
    info!(property_id = %id, "property deleted");
    Ok(())
  }
}
