//! Core types and pipeline logic for the Touchline odds collector.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! store and the fetch sources are reached through the traits in [`store`]
//! and [`feed`]; concrete backends live in sibling crates.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod collect;
pub mod error;
pub mod export;
pub mod feed;
pub mod league;
pub mod model;
pub mod normalize;
pub mod quality;
pub mod reconcile;
pub mod stats;
pub mod store;
pub mod teams;

pub use error::{Error, Result};
