//! LocBook: place ingestion and enrichment
//!
//! Turns a map link or a screenshot into a deduplicated, AI-enriched place
//! record, and answers free-text searches over the saved places.
//!
//! # Pipeline
//!
//! raw input → [`resolver`] (short-link expansion, page scrape, places lookup)
//! → [`media`] (provider photos) → [`enrichment`] (AI analysis) → dedup →
//! [`store`]. The [`governor`] and [`pending`] stores sit beside it as
//! admission and conversation-context gates.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use locbook::{Config, LocBook, MemoryStore};
//!
//! let config = Config::from_env()?;
//! let kernel = LocBook::from_config(config, Arc::new(MemoryStore::new()))?;
//!
//! let outcome = kernel
//!     .handle_link(42.into(), "https://maps.app.goo.gl/AbCd123")
//!     .await?;
//! println!("saved {}", outcome.record().name);
//! ```
//!
//! # Modules
//!
//! - [`kernel`] - Dependency wiring and message admission
//! - [`pipeline`] - Ingestion orchestrator
//! - [`enrichment`] - AI backends and defensive response decoding
//! - [`search`] - Two-turn search continuation
//! - [`rederive`] - Batch recomputation from stored payloads
//! - [`testing`] - Mock collaborators for tests

pub mod config;
pub mod enrichment;
pub mod error;
pub mod fetch;
pub mod governor;
pub mod images;
pub mod kernel;
pub mod links;
pub mod lookup;
pub mod media;
pub mod pending;
pub mod pipeline;
pub mod record;
pub mod rederive;
pub mod resolver;
pub mod scrape;
pub mod search;
pub mod store;
pub mod testing;
pub mod types;

pub use config::{AiMode, Config};
pub use enrichment::{EnrichmentEngine, PlaceAnalysis, PlaceAnalyzer, PlaceDetails, SearchIntent};
pub use error::{
    EnrichmentError, ErrorCategory, FetchError, IngestError, ResolveError, StoreError,
};
pub use governor::RateGovernor;
pub use kernel::{Admission, Dependencies, LocBook, Reply};
pub use pending::{PendingIntentStore, PendingState};
pub use pipeline::{IngestOutcome, IngestPipeline, IngestStage};
pub use record::{merge_categories, PlaceRecord, CURRENT_SCHEMA_VERSION};
pub use resolver::{GeocodeHit, ResolvedPlaceInfo, SourceResolver};
pub use search::{SearchFlow, SearchOutcome};
pub use store::{MemoryStore, PlaceStore, SearchQuery};
pub use types::{GeoPoint, Identity, ImageBlob, RawInput};
