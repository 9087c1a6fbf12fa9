// LocBook kernel - wires collaborators and gates incoming messages
//
// Holds the process-lifetime stores (rate windows, pending intents) and the
// services built on the injected dependencies. Transports call the handle_*
// methods; every message passes the staleness and rate checks first.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use places_client::PlacesClient;

use crate::config::Config;
use crate::enrichment::EnrichmentEngine;
use crate::error::IngestError;
use crate::fetch::{HttpFetcher, WebFetcher};
use crate::governor::{RateGovernor, DEFAULT_WINDOW};
use crate::images::{DiskImageStore, ImageStore};
use crate::links::{extract_url, is_map_link};
use crate::lookup::{GooglePlaces, PlacesLookup};
use crate::pending::PendingIntentStore;
use crate::pipeline::{IngestOutcome, IngestPipeline};
use crate::resolver::{ResolverOptions, SourceResolver};
use crate::search::{SearchFlow, SearchOutcome};
use crate::store::PlaceStore;
use crate::types::{GeoPoint, Identity, RawInput};

/// External collaborators, injectable for tests.
pub struct Dependencies {
    pub fetcher: Arc<dyn WebFetcher>,
    pub lookup: Arc<dyn PlacesLookup>,
    pub engine: EnrichmentEngine,
    pub store: Arc<dyn PlaceStore>,
    pub images: Arc<dyn ImageStore>,
}

impl Dependencies {
    /// Production collaborators built from configuration.
    pub fn from_config(config: &Config, store: Arc<dyn PlaceStore>) -> Result<Self> {
        let fetcher = HttpFetcher::new().context("Failed to build HTTP fetcher")?;

        let places = config
            .places_api_key
            .as_ref()
            .map(|key| PlacesClient::new(key.clone()).with_timeout(config.timeouts.lookup));
        if places.is_none() {
            warn!("Places API key not set, links resolve scrape-only");
        }
        let mask = GooglePlaces::field_mask(config.max_reviews_for_ai, config.feat_image_analysis);

        Ok(Self {
            fetcher: Arc::new(fetcher),
            lookup: Arc::new(GooglePlaces::new(places, mask)),
            engine: EnrichmentEngine::from_config(config),
            store,
            images: Arc::new(DiskImageStore::new(&config.image_dir)),
        })
    }
}

/// Result of the admission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Older than the configured maximum message age
    Stale,
    RateLimited,
}

/// What the transport should present for a message.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Stale message, dropped silently
    Ignored,
    RateLimited,
    /// The feature serving this message is switched off
    Disabled,
    Saved(IngestOutcome),
    Search(SearchOutcome),
}

pub struct LocBook {
    config: Config,
    governor: Arc<RateGovernor>,
    pending: Arc<PendingIntentStore>,
    pipeline: IngestPipeline,
    search: SearchFlow,
    store: Arc<dyn PlaceStore>,
}

impl LocBook {
    pub fn new(config: Config, deps: Dependencies) -> Self {
        let resolver = Arc::new(SourceResolver::new(
            deps.fetcher,
            deps.lookup,
            ResolverOptions::from_config(&config),
        ));
        let pending = Arc::new(PendingIntentStore::default());
        let pipeline = IngestPipeline::new(
            resolver,
            deps.engine.clone(),
            deps.store.clone(),
            deps.images,
        );
        let search = SearchFlow::new(
            deps.engine,
            pending.clone(),
            deps.store.clone(),
            config.search_result_limit,
        );

        Self {
            config,
            governor: Arc::new(RateGovernor::new()),
            pending,
            pipeline,
            search,
            store: deps.store,
        }
    }

    pub fn from_config(config: Config, store: Arc<dyn PlaceStore>) -> Result<Self> {
        let deps = Dependencies::from_config(&config, store)?;
        info!(
            ai_mode = ?config.ai_mode,
            image_analysis = config.feat_image_analysis,
            place_search = config.feat_place_search,
            "LocBook kernel ready"
        );
        Ok(Self::new(config, deps))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn PlaceStore> {
        &self.store
    }

    pub fn pending(&self) -> &PendingIntentStore {
        &self.pending
    }

    pub fn admit(&self, identity: Identity, sent_at: DateTime<Utc>) -> Admission {
        self.admit_at(identity, sent_at, Utc::now(), Instant::now())
    }

    /// Staleness is judged on wall-clock time, rate on the monotonic clock.
    pub fn admit_at(
        &self,
        identity: Identity,
        sent_at: DateTime<Utc>,
        now: DateTime<Utc>,
        instant: Instant,
    ) -> Admission {
        let age = now.signed_duration_since(sent_at);
        if age.num_seconds() > self.config.max_message_age.as_secs() as i64 {
            warn!(identity = %identity, age_secs = age.num_seconds(), "Ignoring stale message");
            return Admission::Stale;
        }

        if !self.governor.admit_at(
            identity,
            self.config.rate_limit_per_minute,
            DEFAULT_WINDOW,
            instant,
        ) {
            warn!(identity = %identity, "Rate limit exceeded");
            return Admission::RateLimited;
        }

        Admission::Admitted
    }

    /// Text message: a map link is ingested, anything else is a search.
    pub async fn handle_text(
        &self,
        identity: Identity,
        text: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Reply, IngestError> {
        if let Some(reply) = self.gate(identity, sent_at) {
            return Ok(reply);
        }

        match extract_url(text).filter(|url| is_map_link(url)) {
            Some(url) => Ok(Reply::Saved(self.handle_link(identity, &url).await?)),
            None if self.config.feat_place_search => {
                Ok(Reply::Search(self.handle_search(identity, text).await?))
            }
            None => Ok(Reply::Disabled),
        }
    }

    pub async fn handle_photo(
        &self,
        identity: Identity,
        bytes: Vec<u8>,
        sent_at: DateTime<Utc>,
    ) -> Result<Reply, IngestError> {
        if let Some(reply) = self.gate(identity, sent_at) {
            return Ok(reply);
        }
        if !self.config.feat_screenshot_analysis {
            return Ok(Reply::Disabled);
        }

        let outcome = self.pipeline.ingest(RawInput::image(bytes, identity)).await?;
        Ok(Reply::Saved(outcome))
    }

    pub async fn handle_shared_location(
        &self,
        identity: Identity,
        point: GeoPoint,
        sent_at: DateTime<Utc>,
    ) -> Result<Reply, IngestError> {
        if let Some(reply) = self.gate(identity, sent_at) {
            return Ok(reply);
        }
        Ok(Reply::Search(self.handle_location(identity, point).await?))
    }

    /// Ingest a link without admission checks.
    pub async fn handle_link(&self, identity: Identity, url: &str) -> Result<IngestOutcome, IngestError> {
        self.pipeline.ingest(RawInput::link(url, identity)).await
    }

    pub async fn handle_search(&self, identity: Identity, text: &str) -> Result<SearchOutcome, IngestError> {
        self.search.handle_search(identity, text).await
    }

    pub async fn handle_location(
        &self,
        identity: Identity,
        point: GeoPoint,
    ) -> Result<SearchOutcome, IngestError> {
        self.search.handle_location(identity, point).await
    }

    fn gate(&self, identity: Identity, sent_at: DateTime<Utc>) -> Option<Reply> {
        match self.admit(identity, sent_at) {
            Admission::Admitted => None,
            Admission::Stale => Some(Reply::Ignored),
            Admission::RateLimited => Some(Reply::RateLimited),
        }
    }
}
