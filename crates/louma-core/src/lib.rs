//! Core types and trait definitions for the LOUMA rental marketplace.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! The lead-qualification engine lives in [`qualification`] (pure rules) and
//! [`service::LeadService`] (the lifecycle built on top of a [`MarketStore`]).

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod error;
pub mod lead;
pub mod property;
pub mod qualification;
pub mod service;
pub mod store;
pub mod user;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use store::MarketStore;
