//! Network utilities for the remote origin.
//!
//! This module provides:
//! - A conditional GET client (`Accept`, `If-Modified-Since`, 304 handling)
//! - HTTP-date formatting and parsing
//! - Keyed deduplication of in-flight requests

mod client;
mod dedup;
mod http_date;

pub use client::{Fetcher, HttpClient, HttpResponse};
pub use dedup::RequestDeduplicator;
pub use http_date::{format_http_date, parse_http_date};
