//! Two-turn search: a free-text request, optionally followed by a location.

use std::sync::Arc;
use tracing::info;

use crate::enrichment::{EnrichmentEngine, SearchIntent};
use crate::error::Result;
use crate::pending::PendingIntentStore;
use crate::record::PlaceRecord;
use crate::store::{PlaceStore, SearchQuery};
use crate::types::{GeoPoint, Identity};

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Results(Vec<PlaceRecord>),
    /// The intent is parked until the user shares a location
    AwaitingLocation(SearchIntent),
    /// A location arrived with no live intent to pair it with
    NoPendingSearch,
}

pub struct SearchFlow {
    engine: EnrichmentEngine,
    pending: Arc<PendingIntentStore>,
    store: Arc<dyn PlaceStore>,
    limit: usize,
}

impl SearchFlow {
    pub fn new(
        engine: EnrichmentEngine,
        pending: Arc<PendingIntentStore>,
        store: Arc<dyn PlaceStore>,
        limit: usize,
    ) -> Self {
        Self {
            engine,
            pending,
            store,
            limit,
        }
    }

    pub async fn handle_search(&self, identity: Identity, text: &str) -> Result<SearchOutcome> {
        let intent = self.engine.search_intent(text).await?;

        if intent.location_needed {
            info!(identity = %identity, keywords = ?intent.keywords, "Search waiting for location");
            self.pending.set_pending(identity, intent.clone());
            return Ok(SearchOutcome::AwaitingLocation(intent));
        }

        let results = self.store.search(&self.query(&intent, None)).await?;
        info!(identity = %identity, count = results.len(), "Search finished");
        Ok(SearchOutcome::Results(results))
    }

    pub async fn handle_location(&self, identity: Identity, point: GeoPoint) -> Result<SearchOutcome> {
        let Some(intent) = self.pending.get_pending(identity) else {
            return Ok(SearchOutcome::NoPendingSearch);
        };
        self.pending.clear(identity);

        let results = self.store.search(&self.query(&intent, Some(point))).await?;
        info!(identity = %identity, count = results.len(), "Nearby search finished");
        Ok(SearchOutcome::Results(results))
    }

    fn query(&self, intent: &SearchIntent, near: Option<GeoPoint>) -> SearchQuery {
        SearchQuery {
            terms: intent.terms(),
            min_rating: intent.rating_floor(),
            near,
            limit: self.limit,
        }
    }
}
