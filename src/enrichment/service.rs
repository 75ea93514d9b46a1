//! Enrichment service - decides which sources to ask about each entry
//!
//! Per entry, the first hit wins:
//! 1. Known institutional report (static table, no network)
//! 2. ArXiv title search, for entries that look like ArXiv preprints
//! 3. DOI lookup: Crossref, then OpenAlex, then Semantic Scholar
//! 4. Title search in the same order, each source with its own acceptance threshold
//! 5. Title guessed from the URL through step 4 again, then metadata synthesized from the URL
//!
//! Every source sits behind a circuit breaker that disables it for the rest
//! of the run after too many consecutive misses. Batches consult and update
//! the [`MetadataCache`], which is saved once per batch.

use std::collections::BTreeMap;

use tracing::{debug, error, info, warn};

use crate::cache::MetadataCache;
use crate::config::Config;
use crate::enrichment::{
    arxiv::{self, ArxivClient},
    breaker::{CircuitBreaker, DEFAULT_THRESHOLD},
    crossref::CrossrefClient,
    domain::{EnrichedMetadata, EnrichmentError, EnrichmentSource},
    fallback,
    openalex::OpenAlexClient,
    semantic_scholar::SemanticScholarClient,
    doi::{clean_doi, is_valid_doi},
    similarity::{clean_title_for_search, is_searchable_title, is_valid_title},
    traits::ScholarlyApi,
};
use crate::model::BibliographicEntry;

/// Acceptance rules applied on top of each client's own confidence floor
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentConfig {
    /// Consecutive misses before a source is skipped for the rest of the run
    pub breaker_threshold: u32,
    pub crossref_title_threshold: f64,
    pub openalex_title_threshold: f64,
    pub semantic_scholar_title_threshold: f64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            breaker_threshold: DEFAULT_THRESHOLD,
            crossref_title_threshold: 0.75,
            openalex_title_threshold: 0.70,
            semantic_scholar_title_threshold: 0.70,
        }
    }
}

impl EnrichmentConfig {
    /// Minimum confidence for a title match from `source` to be accepted.
    fn title_threshold(&self, source: EnrichmentSource) -> f64 {
        match source {
            EnrichmentSource::Crossref => self.crossref_title_threshold,
            EnrichmentSource::OpenAlex => self.openalex_title_threshold,
            EnrichmentSource::SemanticScholar => self.semantic_scholar_title_threshold,
            _ => 0.0,
        }
    }
}

/// A source and the breaker guarding it
struct SourceSlot {
    api: Box<dyn ScholarlyApi>,
    breaker: CircuitBreaker,
}

impl SourceSlot {
    fn source(&self) -> EnrichmentSource {
        self.api.source()
    }

    /// Whether the source may be called; logs when it's skipped.
    fn available(&self) -> bool {
        let allowed = self.breaker.allows();
        if !allowed {
            debug!(
                "Skipping {}: circuit breaker open",
                self.source().display_name()
            );
        }
        allowed
    }

    fn record(&mut self, hit: bool) {
        if hit {
            self.breaker.record_success();
        } else if self.breaker.record_failure() {
            warn!(
                "{} disabled for this run after {} consecutive failures",
                self.source().display_name(),
                self.breaker.failures()
            );
        }
    }
}

/// Chain position for DOI and title lookups
fn priority(source: EnrichmentSource) -> u8 {
    match source {
        EnrichmentSource::Crossref => 0,
        EnrichmentSource::OpenAlex => 1,
        EnrichmentSource::SemanticScholar => 2,
        _ => 3,
    }
}

/// Build the client for one source from configuration.
///
/// The contact email, when configured, goes into every default user agent.
/// Returns `Ok(None)` when the source is disabled.
pub fn build_source(
    config: &Config,
    source: EnrichmentSource,
) -> Result<Option<Box<dyn ScholarlyApi>>, EnrichmentError> {
    let sources = &config.sources;
    let contact = config.openalex_email();
    let contact = contact.as_deref();

    let client: Box<dyn ScholarlyApi> = match source {
        EnrichmentSource::Crossref if sources.crossref.enabled => Box::new(CrossrefClient::new(
            sources
                .crossref
                .client_settings(CrossrefClient::default_settings().with_contact(contact)),
        )?),
        EnrichmentSource::OpenAlex if sources.openalex.enabled => Box::new(OpenAlexClient::new(
            sources
                .openalex
                .client_settings(OpenAlexClient::default_settings().with_contact(contact)),
            config.openalex_email(),
        )?),
        EnrichmentSource::SemanticScholar if sources.semantic_scholar.enabled => {
            let client = SemanticScholarClient::new(
                sources.semantic_scholar.client_settings(
                    SemanticScholarClient::default_settings().with_contact(contact),
                ),
                config.semantic_scholar_api_key(),
            )?;
            if !client.has_api_key() {
                info!("Semantic Scholar: no API key, using the shared rate limit");
            }
            Box::new(client)
        }
        EnrichmentSource::Arxiv if sources.arxiv.enabled => {
            let client = ArxivClient::new(
                sources
                    .arxiv
                    .client_settings(ArxivClient::default_settings().with_contact(contact)),
            )?;
            debug!("ArXiv: one request every {:?}", client.min_interval());
            Box::new(client)
        }
        EnrichmentSource::Crossref
        | EnrichmentSource::OpenAlex
        | EnrichmentSource::SemanticScholar
        | EnrichmentSource::Arxiv => return Ok(None),
        EnrichmentSource::Institutional | EnrichmentSource::Url => {
            return Err(EnrichmentError::Unsupported(format!(
                "{} is not a queryable source",
                source
            )));
        }
    };
    Ok(Some(client))
}

/// Service for enriching bibliographic entries from external sources
pub struct EnrichmentService {
    config: EnrichmentConfig,
    /// DOI and title chain, in priority order
    chain: Vec<SourceSlot>,
    arxiv: Option<SourceSlot>,
    cache: MetadataCache,
}

impl EnrichmentService {
    /// Create a service with no sources; add them with [`add_source`](Self::add_source).
    pub fn new(config: EnrichmentConfig, cache: MetadataCache) -> Self {
        Self {
            config,
            chain: Vec::new(),
            arxiv: None,
            cache,
        }
    }

    /// Create a service with every enabled source and the configured cache.
    pub fn from_config(config: &Config) -> Result<Self, EnrichmentError> {
        let cache = MetadataCache::open(config.cache_path(), config.cache_settings());
        let mut service = Self::new(config.enrichment_config(), cache);

        for source in [
            EnrichmentSource::Crossref,
            EnrichmentSource::OpenAlex,
            EnrichmentSource::SemanticScholar,
            EnrichmentSource::Arxiv,
        ] {
            match build_source(config, source)? {
                Some(client) => service.add_source(client),
                None => info!("{} disabled in configuration", source.display_name()),
            }
        }

        Ok(service)
    }

    /// Register a source. ArXiv gets its own slot; the rest join the
    /// lookup chain at their fixed priority.
    pub fn add_source(&mut self, api: Box<dyn ScholarlyApi>) {
        let slot = SourceSlot {
            api,
            breaker: CircuitBreaker::new(self.config.breaker_threshold),
        };
        if slot.source() == EnrichmentSource::Arxiv {
            self.arxiv = Some(slot);
        } else {
            self.chain.push(slot);
            self.chain.sort_by_key(|s| priority(s.source()));
        }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut MetadataCache {
        &mut self.cache
    }

    /// Consecutive misses counted against `source`, if it is registered.
    pub fn breaker_failures(&self, source: EnrichmentSource) -> Option<u32> {
        self.slot(source).map(|s| s.breaker.failures())
    }

    pub fn is_tripped(&self, source: EnrichmentSource) -> bool {
        self.slot(source).is_some_and(|s| s.breaker.is_tripped())
    }

    fn slot(&self, source: EnrichmentSource) -> Option<&SourceSlot> {
        self.chain
            .iter()
            .chain(self.arxiv.iter())
            .find(|s| s.source() == source)
    }

    /// Enrich a batch, using the cache for entries that don't need a lookup.
    ///
    /// Returns one result per citation key: metadata, or `None` when nothing
    /// matched now or on a recent attempt. Every new outcome is stored in the
    /// cache, which is saved once at the end. A failed save is logged and
    /// does not affect the returned results.
    pub async fn enrich_entries(
        &mut self,
        entries: &[BibliographicEntry],
    ) -> BTreeMap<String, Option<EnrichedMetadata>> {
        self.cache.cleanup_expired();

        let cached = self.cache.all_cached_metadata(entries);
        let pending = self.cache.retriable_entries(entries);
        let from_cache = cached.len();

        // Entries neither cached nor pending failed recently and stay `None`
        let mut results: BTreeMap<String, Option<EnrichedMetadata>> =
            entries.iter().map(|e| (e.key.clone(), None)).collect();
        results.extend(cached.into_iter().map(|(key, metadata)| (key, Some(metadata))));

        info!(
            "{} entries: {} cached, {} failed recently, {} to enrich",
            entries.len(),
            from_cache,
            entries.len().saturating_sub(from_cache + pending.len()),
            pending.len()
        );

        let mut enriched = 0;
        for entry in pending {
            let outcome = match self.enrich_entry(entry).await {
                Ok(metadata) => {
                    info!(
                        "Enriched {} (source: {})",
                        entry.key,
                        metadata.source.map_or("unknown", |s| s.as_str())
                    );
                    enriched += 1;
                    self.cache.store_success(entry, metadata.clone());
                    Some(metadata)
                }
                Err(e) => {
                    warn!("Could not enrich {}: {}", entry.key, e);
                    self.cache.store_failure(entry, e.to_string());
                    None
                }
            };
            results.insert(entry.key.clone(), outcome);
        }

        if let Err(e) = self.cache.save() {
            error!("Failed to save metadata cache: {}", e);
        }

        for slot in self.chain.iter().chain(self.arxiv.iter()) {
            debug!(
                "{}: {} requests so far",
                slot.source().display_name(),
                slot.api.request_count()
            );
        }

        info!(
            "Enrichment finished: {} new, {} from cache, {} without metadata",
            enriched,
            from_cache,
            results.values().filter(|m| m.is_none()).count()
        );
        results
    }

    /// Cached metadata only; nothing is looked up or stored.
    pub fn cached_only(
        &mut self,
        entries: &[BibliographicEntry],
    ) -> BTreeMap<String, Option<EnrichedMetadata>> {
        let mut found = self.cache.all_cached_metadata(entries);
        info!(
            "Using cached metadata only: {} of {} entries",
            found.len(),
            entries.len()
        );
        entries
            .iter()
            .map(|e| (e.key.clone(), found.remove(&e.key)))
            .collect()
    }

    /// Run the lookup sequence for one entry, ignoring the cache.
    pub async fn enrich_entry(
        &mut self,
        entry: &BibliographicEntry,
    ) -> Result<EnrichedMetadata, EnrichmentError> {
        if let Some(metadata) = fallback::lookup_institutional_report(entry) {
            debug!("{} matched a known institutional report", entry.key);
            return Ok(metadata);
        }

        let author = entry.author_query();
        let author = author.as_deref();
        let year = entry.year.as_deref();

        if arxiv::is_arxiv_entry(entry)
            && let Some(title) = entry.title_text()
            && let Some(metadata) = self.query_arxiv(title, author).await
        {
            return Ok(metadata);
        }

        if let Some(doi) = entry.doi_text()
            && let Some(metadata) = self.doi_chain(doi).await
        {
            return Ok(metadata);
        }

        if let Some(title) = entry.title_text().filter(|t| is_valid_title(t))
            && let Some(metadata) = self.title_chain(title, author, year).await
        {
            return Ok(metadata);
        }

        if let Some(url) = entry.url_text() {
            let guessed = fallback::extract_title_from_url(url);
            if !guessed.is_empty() {
                debug!("{}: searching for title guessed from URL: {}", entry.key, guessed);
                if let Some(metadata) = self.title_chain(&guessed, author, year).await {
                    return Ok(metadata);
                }
            }
            if let Some(metadata) = fallback::synthesize_from_url(url) {
                debug!("{}: using metadata synthesized from URL", entry.key);
                return Ok(metadata);
            }
        }

        Err(EnrichmentError::NoMatch(entry.key.clone()))
    }

    async fn query_arxiv(&mut self, title: &str, author: Option<&str>) -> Option<EnrichedMetadata> {
        if !searchable(title) {
            return None;
        }
        let slot = self.arxiv.as_mut().filter(|s| s.available())?;
        let result = slot.api.query_by_title(title, author, None).await;
        slot.record(result.is_some());
        result
    }

    async fn doi_chain(&mut self, doi: &str) -> Option<EnrichedMetadata> {
        // Malformed input says nothing about a source's health
        if !is_valid_doi(&clean_doi(doi)) {
            debug!("Skipping DOI lookup for invalid DOI {:?}", doi);
            return None;
        }
        for slot in &mut self.chain {
            if !slot.available() {
                continue;
            }
            let result = slot.api.query_by_doi(doi).await;
            slot.record(result.is_some());
            if result.is_some() {
                return result;
            }
        }
        None
    }

    async fn title_chain(
        &mut self,
        title: &str,
        author: Option<&str>,
        year: Option<&str>,
    ) -> Option<EnrichedMetadata> {
        if !searchable(title) {
            return None;
        }
        for slot in &mut self.chain {
            if !slot.available() {
                continue;
            }
            let threshold = self.config.title_threshold(slot.source());
            let accepted = slot
                .api
                .query_by_title(title, author, year)
                .await
                .filter(|m| {
                    let confidence = m.confidence_score.unwrap_or_default();
                    let ok = m.confidence_score.is_some() && confidence >= threshold;
                    if !ok {
                        debug!(
                            "{} title match below threshold ({:.2} < {:.2})",
                            slot.source().display_name(),
                            confidence,
                            threshold
                        );
                    }
                    ok
                });
            slot.record(accepted.is_some());
            if accepted.is_some() {
                return accepted;
            }
        }
        None
    }
}

/// Whether a title is long enough for the sources to search.
fn searchable(title: &str) -> bool {
    let ok = is_searchable_title(&clean_title_for_search(title));
    if !ok {
        debug!("Skipping title search, too short: {:?}", title);
    }
    ok
}
