//! Shared types for the donafeed live donation feed.
//!
//! The `objects` module holds everything that crosses the wire between the
//! webhook provider, the feed server and feed consumers. The `client`
//! module (behind the `client` feature) contains the live stream client.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
