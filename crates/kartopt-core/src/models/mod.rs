//! Data models for the kart optimizer.
//!
//! These mirror the JSON dataset published alongside the web version of the
//! optimizer, so field names follow its camelCase convention on the wire.

pub(crate) mod game_data;
mod stats;

pub use game_data::*;
pub use stats::*;
