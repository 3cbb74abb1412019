//! On-disk persistence helpers: directory layout and atomic writes.

mod atomic;
pub mod paths;

pub use atomic::{atomic_read_json, atomic_write_bytes, atomic_write_json, remove_if_exists};
