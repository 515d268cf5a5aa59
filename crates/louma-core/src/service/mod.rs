//! Services composing the pure rules with a [`MarketStore`].
//!
//! Each service is a plain value holding its collaborators (store, clock).
//! Construct one per process and clone it into request handlers; clones
//! share the same store.

mod leads;
mod properties;

pub use leads::LeadService;
pub use properties::PropertyService;

use crate::{Error, MarketStore};

/// Upper bound applied to every caller-supplied page size.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

fn store_err<S: MarketStore>(e: S::Error) -> Error { Error::store(e) }
