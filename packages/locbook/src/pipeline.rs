//! Ingestion orchestrator.
//!
//! Stages run strictly in order and a failing stage ends the request with a
//! typed error. Nothing is persisted until resolution and enrichment have both
//! succeeded.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::enrichment::prompts::SCREENSHOT_CONTEXT;
use crate::enrichment::{EnrichmentEngine, PlaceAnalysis};
use crate::error::{IngestError, Result};
use crate::images::ImageStore;
use crate::record::PlaceRecord;
use crate::resolver::SourceResolver;
use crate::store::PlaceStore;
use crate::types::{Identity, ImageBlob, RawInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Received,
    Resolving,
    Resolved,
    ResolveFailed,
    Enriching,
    Enriched,
    EnrichFailed,
    Persisting,
    Done,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Resolving => "resolving",
            Self::Resolved => "resolved",
            Self::ResolveFailed => "resolve_failed",
            Self::Enriching => "enriching",
            Self::Enriched => "enriched",
            Self::EnrichFailed => "enrich_failed",
            Self::Persisting => "persisting",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub enum IngestOutcome {
    Created {
        record: PlaceRecord,
        commentary: String,
    },
    /// A record with the same canonical URL already existed
    Duplicate(PlaceRecord),
}

impl IngestOutcome {
    pub fn record(&self) -> &PlaceRecord {
        match self {
            Self::Created { record, .. } | Self::Duplicate(record) => record,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

pub struct IngestPipeline {
    resolver: Arc<SourceResolver>,
    engine: EnrichmentEngine,
    store: Arc<dyn PlaceStore>,
    images: Arc<dyn ImageStore>,
}

fn stage(identity: Identity, stage: IngestStage) {
    debug!(identity = %identity, stage = %stage, "Ingest stage");
}

impl IngestPipeline {
    pub fn new(
        resolver: Arc<SourceResolver>,
        engine: EnrichmentEngine,
        store: Arc<dyn PlaceStore>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            resolver,
            engine,
            store,
            images,
        }
    }

    /// Run one raw input through the pipeline.
    pub async fn ingest(&self, input: RawInput) -> Result<IngestOutcome> {
        match input {
            RawInput::Link { url, identity } => self.ingest_link(&url, identity).await,
            RawInput::Image { bytes, identity } => self.ingest_image(bytes, identity).await,
        }
    }

    async fn ingest_link(&self, url: &str, identity: Identity) -> Result<IngestOutcome> {
        stage(identity, IngestStage::Received);

        if let Some(existing) = self.store.find_by_source_url(url).await? {
            info!(url = %url, id = %existing.id, "Link already saved");
            return Ok(IngestOutcome::Duplicate(existing));
        }

        stage(identity, IngestStage::Resolving);
        let (canonical_url, expanded) = self.resolver.canonicalize(url).await;
        if canonical_url != url {
            if let Some(existing) = self.store.find_by_source_url(&canonical_url).await? {
                info!(url = %canonical_url, id = %existing.id, "Canonical link already saved");
                return Ok(IngestOutcome::Duplicate(existing));
            }
        }

        let info = self
            .resolver
            .resolve_canonical(canonical_url, expanded)
            .await
            .map_err(|e| {
                stage(identity, IngestStage::ResolveFailed);
                IngestError::from(e)
            })?;
        stage(identity, IngestStage::Resolved);

        let analysis = self.enrich(identity, &info.context_text, &info.images).await?;

        let name = analysis
            .details
            .name
            .clone()
            .or_else(|| {
                info.structured
                    .as_ref()
                    .and_then(|p| p.display_name_text())
                    .map(str::to_string)
            })
            .or_else(|| info.inferred_name.clone())
            .ok_or(IngestError::Validation { field: "name" })?;

        let mut record = PlaceRecord::new(name, &analysis.details, analysis.raw.clone())
            .with_source_url(info.canonical_url.clone())
            .with_location(info.location());
        if record.address.is_none() {
            record.address = info.address().map(str::to_string);
        }

        self.persist(identity, record, analysis).await
    }

    async fn ingest_image(&self, bytes: Vec<u8>, identity: Identity) -> Result<IngestOutcome> {
        stage(identity, IngestStage::Received);

        let image = ImageBlob::jpeg(bytes);
        let analysis = self
            .enrich(identity, SCREENSHOT_CONTEXT, std::slice::from_ref(&image))
            .await?;

        let name = analysis
            .details
            .name
            .clone()
            .ok_or(IngestError::Validation { field: "name" })?;

        let hit = self
            .resolver
            .geocode(&name, analysis.details.address.as_deref())
            .await;
        if hit.is_none() {
            debug!(name = %name, "No geocode hit for screenshot place");
        }

        let path = self.images.save_screenshot(&image.bytes).await?;

        let mut record = PlaceRecord::new(name, &analysis.details, analysis.raw.clone())
            .with_source_image(path.clone())
            .with_location(hit.as_ref().map(|h| h.location));
        if record.address.is_none() {
            record.address = hit.and_then(|h| h.formatted_address);
        }

        let outcome = self.persist(identity, record, analysis).await;
        if outcome.is_err() {
            if let Err(e) = self.images.remove(&path).await {
                warn!(path = %path, error = %e, "Failed to remove orphaned screenshot");
            }
        }
        outcome
    }

    async fn enrich(
        &self,
        identity: Identity,
        context_text: &str,
        images: &[ImageBlob],
    ) -> Result<PlaceAnalysis> {
        stage(identity, IngestStage::Enriching);
        let analysis = self.engine.analyze(context_text, images).await.map_err(|e| {
            stage(identity, IngestStage::EnrichFailed);
            IngestError::from(e)
        })?;
        stage(identity, IngestStage::Enriched);
        Ok(analysis)
    }

    async fn persist(
        &self,
        identity: Identity,
        record: PlaceRecord,
        analysis: PlaceAnalysis,
    ) -> Result<IngestOutcome> {
        let commentary = if analysis.commentary.is_empty() {
            match self.engine.commentary(&analysis.details).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(identity = %identity, error = %e, "Continuing without commentary");
                    String::new()
                }
            }
        } else {
            analysis.commentary
        };

        stage(identity, IngestStage::Persisting);
        let record = self.store.insert(record).await?;
        stage(identity, IngestStage::Done);

        info!(
            identity = %identity,
            id = %record.id,
            name = %record.name,
            categories = ?record.categories,
            "Place saved"
        );

        Ok(IngestOutcome::Created { record, commentary })
    }
}
