//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `PageState`: The outcome of processing a single URL
//! - `HostState`: Per-host request bookkeeping used for politeness pacing

mod host_state;
mod page_state;

// Re-export main types
pub use host_state::HostState;
pub use page_state::PageState;
