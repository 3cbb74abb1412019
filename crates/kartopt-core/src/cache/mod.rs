//! Decoded-resource caching.
//!
//! - [`ResourceCache`]: bounded in-memory map with LRU and expiry eviction
//! - [`DiskMirror`]: one-file-per-resource copy that survives restarts
//! - [`ResourceDecoder`]: how raw bytes become cached values

pub mod clock;
mod decode;
mod disk;
mod resource;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decode::{ImageDecoder, JsonDecoder, ResourceDecoder};
pub use disk::{DiskCopy, DiskMirror};
pub use resource::{CacheStats, CachedResource, ResourceCache};

#[cfg(test)]
pub(crate) use decode::test_support;
