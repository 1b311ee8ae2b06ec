//! Multi-source tutorial search.
//!
//! One query fans out to every requested source. Each source runs in its own
//! spawned task with its own timeout; failures are recorded per source and
//! never cancel or discard the results of the others.

mod resolver;

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use rand::seq::SliceRandom;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ProvidersConfig;
use crate::metrics::{SEARCH_DURATION, SEARCH_RESULTS, SOURCE_FAILURES};
use crate::providers::{
    DurationBucket, GameProvider, SteamClient, VideoProvider, VideoSearchOptions, YouTubeClient,
};
use crate::tutorial::{
    AggregatedResponse, NormalizedResult, SearchOptions, SourceError, SourceKind, TutorialError,
};

/// Longest accepted query, in characters.
pub const MAX_QUERY_LEN: usize = 256;

type SourceOutcome = Result<Vec<NormalizedResult>, TutorialError>;

/// Tunables for the aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    /// Videos per search when the request does not say.
    pub default_max_results: u32,
    /// Relevance language when the request does not say.
    pub default_language: String,
    /// Games matched before fetching their guides.
    pub game_count: u32,
    /// Upper bound on one source's whole pipeline.
    pub source_timeout: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            default_max_results: 5,
            default_language: "en".to_string(),
            game_count: 3,
            source_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&ProvidersConfig> for AggregatorSettings {
    fn from(config: &ProvidersConfig) -> Self {
        Self {
            default_max_results: config.youtube.max_results,
            default_language: config.youtube.language.clone(),
            game_count: config.steam.game_count,
            source_timeout: config.timeout(),
        }
    }
}

/// Fans searches out to the providers and resolves single results.
pub struct TutorialAggregator {
    youtube: Arc<dyn VideoProvider>,
    steam: Arc<dyn GameProvider>,
    settings: AggregatorSettings,
}

impl TutorialAggregator {
    pub fn new(
        youtube: Arc<dyn VideoProvider>,
        steam: Arc<dyn GameProvider>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            youtube,
            steam,
            settings,
        }
    }

    /// Build an aggregator backed by the real YouTube and Steam clients.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self, TutorialError> {
        let timeout = config.timeout();
        let youtube = YouTubeClient::new(config.youtube.clone(), timeout)?;
        let steam = SteamClient::new(config.steam.clone(), timeout)?;

        if !youtube.is_configured() {
            warn!("YouTube API key not set, youtube searches will report a configuration error");
        }
        if !steam.is_configured() {
            warn!("Steam API key not set, steam searches will report a configuration error");
        }

        Ok(Self::new(
            Arc::new(youtube),
            Arc::new(steam),
            AggregatorSettings::from(config),
        ))
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Search every requested source and merge the results.
    ///
    /// Only a malformed request fails the call. Provider failures, timeouts,
    /// panics and unknown source names end up in `errors`.
    pub async fn search_tutorials(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<AggregatedResponse, TutorialError> {
        if query.chars().count() > MAX_QUERY_LEN {
            return Err(TutorialError::InvalidRequest(format!(
                "query must be at most {} characters",
                MAX_QUERY_LEN
            )));
        }

        let started = Instant::now();
        let requested: Vec<String> = match &options.sources {
            Some(sources) => sources.clone(),
            None => SourceKind::DEFAULT
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
        };

        let mut errors = Vec::new();
        let mut kinds: Vec<SourceKind> = Vec::new();
        for name in &requested {
            match name.parse::<SourceKind>() {
                Ok(kind) => {
                    if !kinds.contains(&kind) {
                        kinds.push(kind);
                    }
                }
                Err(e) => {
                    warn!(source = %name, "Ignoring unsupported source");
                    record_failure(name, &e);
                    errors.push(SourceError {
                        source: name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        debug!(query = %query, sources = ?kinds, "Starting aggregated search");

        let tasks: Vec<_> = kinds
            .into_iter()
            .map(|kind| {
                let handle = self.spawn_source(kind, query, options);
                async move { (kind, handle.await) }
            })
            .collect();

        let mut results = Vec::new();
        for (kind, joined) in join_all(tasks).await {
            let outcome = joined.unwrap_or_else(|e| {
                Err(TutorialError::provider(
                    kind.as_str(),
                    format!("search task failed: {}", e),
                ))
            });
            match outcome {
                Ok(mut items) => {
                    debug!(source = %kind, count = items.len(), "Source search complete");
                    results.append(&mut items);
                }
                Err(e) => {
                    warn!(source = %kind, error = %e, "Source search failed");
                    record_failure(kind.as_str(), &e);
                    errors.push(SourceError {
                        source: kind.as_str().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        // Placeholder for relevance ranking: order carries no meaning.
        results.shuffle(&mut rand::thread_rng());

        SEARCH_RESULTS.with_label_values(&[]).observe(results.len() as f64);
        SEARCH_DURATION
            .with_label_values(&[if errors.is_empty() { "complete" } else { "partial" }])
            .observe(started.elapsed().as_secs_f64());

        info!(
            query = %query,
            results = results.len(),
            failed_sources = errors.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Tutorial search complete"
        );

        Ok(AggregatedResponse::new(query, requested, results, errors))
    }

    /// Run one source's pipeline in its own task, bounded by the source timeout.
    fn spawn_source(
        &self,
        kind: SourceKind,
        query: &str,
        options: &SearchOptions,
    ) -> JoinHandle<SourceOutcome> {
        let limit = self.settings.source_timeout;
        let query = query.to_string();

        match kind {
            SourceKind::Youtube => {
                let provider = Arc::clone(&self.youtube);
                let video_options = VideoSearchOptions {
                    max_results: options
                        .max_results
                        .unwrap_or(self.settings.default_max_results),
                    language: options
                        .language
                        .clone()
                        .unwrap_or_else(|| self.settings.default_language.clone()),
                    duration: DurationBucket::from_bounds(
                        options.video_duration_min,
                        options.video_duration_max,
                    ),
                };
                tokio::spawn(async move {
                    bounded(kind, limit, async move {
                        provider.search_videos(&query, &video_options).await
                    })
                    .await
                })
            }
            SourceKind::Steam => {
                let provider = Arc::clone(&self.steam);
                let count = self.settings.game_count;
                tokio::spawn(async move {
                    bounded(kind, limit, collect_game_guides(provider, query, count)).await
                })
            }
        }
    }
}

/// Match games, then fetch every game's guides concurrently.
///
/// A failure for one game is logged and skipped; only the game search itself
/// can fail the pipeline.
async fn collect_game_guides(
    provider: Arc<dyn GameProvider>,
    query: String,
    count: u32,
) -> SourceOutcome {
    let games = provider.search_games(&query, count).await?;

    let fetches = games.iter().map(|game| {
        let provider = &provider;
        async move { (game, provider.get_game_guides(&game.id).await) }
    });

    let mut guides = Vec::new();
    for (game, outcome) in join_all(fetches).await {
        match outcome {
            Ok(found) => {
                guides.extend(
                    found
                        .into_iter()
                        .map(|guide| guide.with_game(&game.id, &game.title)),
                );
            }
            Err(e) => {
                warn!(game_id = %game.id, game = %game.title, error = %e, "Failed to fetch guides");
            }
        }
    }

    Ok(guides)
}

async fn bounded<F>(kind: SourceKind, limit: Duration, pipeline: F) -> SourceOutcome
where
    F: std::future::Future<Output = SourceOutcome>,
{
    match tokio::time::timeout(limit, pipeline).await {
        Ok(outcome) => outcome,
        Err(_) => Err(TutorialError::provider(
            kind.as_str(),
            format!("timed out after {:?}", limit),
        )),
    }
}

fn record_failure(source: &str, error: &TutorialError) {
    SOURCE_FAILURES
        .with_label_values(&[source, error.kind()])
        .inc();
}
