// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod browser;
pub mod cache;
pub mod collector;
pub mod config;
pub mod matcher;
pub mod metrics;
pub mod model;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::collector::Collector;
pub use crate::matcher::{MatchResult, TopicMatcher};
pub use crate::model::{FeedItem, SourceKind};
