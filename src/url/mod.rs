//! URL handling module for Sumi-Harvest
//!
//! This module provides URL normalization, host extraction, wildcard domain
//! scoping and the path rules applied before a link is enqueued.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, host_key, origin_root};
pub use matcher::{is_asset_path, matches_wildcard, path_matches_any, DomainScope};
pub use normalize::{normalize_url, QueryPolicy};
