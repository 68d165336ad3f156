//! # Race Executor
//!
//! Runs one postal lookup against every source at once and keeps the first
//! successful answer.
//!
//! All fetches share a single [`Deadline`]. The first fetch to succeed is
//! admitted through a [`Rendezvous`]; every later success is discarded. As
//! soon as the race resolves (winner, deadline, or every source failed) the
//! deadline is cancelled, which drops the in-flight requests of the
//! remaining sources.
//!
//! # Examples
//!
//! ```ignore
//! use cep_race::application::services::race_executor::{RaceConfig, RaceExecutor};
//! use cep_race::infrastructure::sources::{HttpFetcher, SourceRegistry};
//! use std::sync::Arc;
//!
//! let executor = RaceExecutor::new(
//!     Arc::new(SourceRegistry::builtin()),
//!     Arc::new(HttpFetcher::new(1000)?),
//!     RaceConfig::default(),
//! );
//! let record = executor.lookup("01001000").await?;
//! println!("{} answered", record.source);
//! ```

use crate::application::error::{LookupError, RaceError, RaceResult, SourceCause};
use crate::application::services::normalizer::normalize;
use crate::application::services::rendezvous::{Admission, Rendezvous};
use crate::domain::entities::CommonRecord;
use crate::domain::value_objects::PostalQuery;
use crate::infrastructure::sources::traits::duration_ms;
use crate::infrastructure::sources::{
    Deadline, FetchOutcome, OutboundRequest, SourceDescriptor, SourceError, SourceFetcher,
    SourceRegistry,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Default shared deadline for one race.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Configuration for races.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Shared deadline for all sources in milliseconds.
    pub timeout_ms: u64,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl RaceConfig {
    /// Creates a configuration with the given deadline.
    #[must_use]
    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    /// Returns the deadline as a duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// The admitted success, handed from a fetch task to the executor.
#[derive(Debug)]
struct Winner {
    source: Arc<SourceDescriptor>,
    payload: Bytes,
    elapsed: Duration,
}

enum Resolution {
    Winner(Winner),
    DeadlineExpired,
    Exhausted,
}

/// Races every configured source for each lookup.
#[derive(Debug, Clone)]
pub struct RaceExecutor {
    registry: Arc<SourceRegistry>,
    fetcher: Arc<dyn SourceFetcher>,
    config: RaceConfig,
}

impl RaceExecutor {
    /// Creates a new executor.
    #[must_use]
    pub fn new(
        registry: Arc<SourceRegistry>,
        fetcher: Arc<dyn SourceFetcher>,
        config: RaceConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            config,
        }
    }

    /// Races all registered sources for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError`] if no source succeeds before the deadline, or
    /// the winner's payload cannot be normalized.
    pub async fn race(&self, query: &PostalQuery) -> RaceResult<CommonRecord> {
        race_sources(
            query,
            self.registry.sources(),
            &self.fetcher,
            self.config.timeout(),
        )
        .await
    }

    /// Validates raw caller input and races it.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Query`] for empty input, otherwise the race's
    /// error.
    pub async fn lookup(&self, raw: &str) -> Result<CommonRecord, LookupError> {
        let query = PostalQuery::new(raw)?;
        Ok(self.race(&query).await?)
    }

    /// Returns the source registry.
    #[must_use]
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> &RaceConfig {
        &self.config
    }
}

/// Races an explicit list of sources.
///
/// Returns as soon as one source succeeds, the `timeout` elapses, or every
/// source has failed, whichever comes first.
///
/// # Errors
///
/// - [`RaceError::NoSources`] if `sources` is empty
/// - [`RaceError::AggregateFailure`] if no source succeeded, with one cause
///   per source in the order given
/// - [`RaceError::Decode`] if the winner's payload is unusable; the
///   runner-up is not consulted
pub async fn race_sources(
    query: &PostalQuery,
    sources: &[Arc<SourceDescriptor>],
    fetcher: &Arc<dyn SourceFetcher>,
    timeout: Duration,
) -> RaceResult<CommonRecord> {
    if sources.is_empty() {
        return Err(RaceError::NoSources);
    }

    let span = info_span!("race", race_id = %Uuid::new_v4(), cep = %query);
    run_race(query, sources, fetcher, timeout)
        .instrument(span)
        .await
}

async fn run_race(
    query: &PostalQuery,
    sources: &[Arc<SourceDescriptor>],
    fetcher: &Arc<dyn SourceFetcher>,
    timeout: Duration,
) -> RaceResult<CommonRecord> {
    let deadline = Deadline::start(timeout);
    // Cancels every fetch if this future is dropped mid-race.
    let _cancel_on_exit = deadline.token().clone().drop_guard();

    let (rendezvous, mut winner_rx) = Rendezvous::channel();
    let rendezvous = Arc::new(rendezvous);

    let mut causes: Vec<Option<SourceError>> = vec![None; sources.len()];
    let mut task_index = HashMap::with_capacity(sources.len());
    let mut tasks = JoinSet::new();

    for (index, source) in sources.iter().enumerate() {
        match OutboundRequest::build(query, Arc::clone(source), deadline.clone()) {
            Ok(request) => {
                let handle = tasks.spawn(fetch_and_offer(
                    request,
                    Arc::clone(fetcher),
                    Arc::clone(&rendezvous),
                ));
                task_index.insert(handle.id(), index);
            }
            Err(error) => {
                warn!(source = source.name(), %error, "skipping source");
                record(&mut causes, index, error);
            }
        }
    }

    debug!(
        sources = sources.len(),
        spawned = tasks.len(),
        timeout_ms = duration_ms(timeout),
        "race started"
    );

    let mut winner_open = true;
    let resolution = loop {
        if tasks.is_empty() {
            // A winner offers before its task returns, so it is already here.
            break match winner_rx.try_recv() {
                Ok(winner) => Resolution::Winner(winner),
                Err(_) => Resolution::Exhausted,
            };
        }

        tokio::select! {
            biased;
            received = &mut winner_rx, if winner_open => match received {
                Ok(winner) => break Resolution::Winner(winner),
                Err(_) => winner_open = false,
            },
            () = deadline.fired() => break Resolution::DeadlineExpired,
            Some(joined) = tasks.join_next_with_id() => match joined {
                Ok((id, Some(error))) => {
                    if let Some(&index) = task_index.get(&id) {
                        record(&mut causes, index, error);
                    }
                }
                Ok((_, None)) => {}
                Err(join_error) => {
                    if let Some(&index) = task_index.get(&join_error.id()) {
                        record(&mut causes, index, task_failure(&join_error));
                    }
                }
            },
        }
    };

    rendezvous.close();
    deadline.cancel();
    if !tasks.is_empty() {
        debug!(pending = tasks.len(), "abandoning unfinished sources");
        tasks.detach_all();
    }

    match resolution {
        Resolution::Winner(winner) => finish(winner, &deadline),
        Resolution::DeadlineExpired => Err(aggregate(sources, causes, true, &deadline)),
        // Tasks that observed the deadline can finish before the executor does.
        Resolution::Exhausted => {
            let expired = deadline.has_expired();
            Err(aggregate(sources, causes, expired, &deadline))
        }
    }
}

/// Body of one fetch task. Returns the cause if the source did not succeed.
async fn fetch_and_offer(
    request: OutboundRequest,
    fetcher: Arc<dyn SourceFetcher>,
    rendezvous: Arc<Rendezvous<Winner>>,
) -> Option<SourceError> {
    let deadline = request.deadline().clone();
    let source = Arc::clone(request.source());

    let outcome = tokio::select! {
        biased;
        outcome = fetcher.fetch(&request) => outcome,
        () = deadline.fired() => FetchOutcome::TimedOut { elapsed: deadline.elapsed() },
    };

    match outcome {
        FetchOutcome::Success { payload, elapsed } => {
            let elapsed_ms = duration_ms(elapsed);
            let winner = Winner {
                source: Arc::clone(&source),
                payload,
                elapsed,
            };
            match rendezvous.offer(winner) {
                Admission::Admitted => {
                    info!(source = source.name(), elapsed_ms, "source answered first");
                }
                Admission::Rejected => {
                    debug!(source = source.name(), elapsed_ms, "late answer discarded");
                }
            }
            None
        }
        FetchOutcome::TimedOut { elapsed } if deadline.is_cancelled() && !deadline.has_expired() => {
            debug!(
                source = source.name(),
                elapsed_ms = duration_ms(elapsed),
                "fetch abandoned after race resolved"
            );
            FetchOutcome::TimedOut { elapsed }.into_error()
        }
        other => {
            let error = other.into_error();
            if let Some(error) = &error {
                warn!(source = source.name(), %error, "source failed");
            }
            error
        }
    }
}

fn finish(winner: Winner, deadline: &Deadline) -> RaceResult<CommonRecord> {
    let name = winner.source.name();
    match normalize(&winner.payload, &winner.source) {
        Ok(record) => {
            info!(
                source = name,
                fetch_ms = duration_ms(winner.elapsed),
                race_ms = duration_ms(deadline.elapsed()),
                "race resolved"
            );
            Ok(record)
        }
        Err(error) => {
            warn!(source = name, %error, "winning payload could not be decoded");
            Err(RaceError::Decode {
                source_name: name.to_string(),
                error,
            })
        }
    }
}

fn aggregate(
    sources: &[Arc<SourceDescriptor>],
    causes: Vec<Option<SourceError>>,
    deadline_expired: bool,
    deadline: &Deadline,
) -> RaceError {
    let elapsed_ms = duration_ms(deadline.elapsed());
    let causes: Vec<SourceCause> = sources
        .iter()
        .zip(causes)
        .map(|(source, cause)| {
            let error = cause.unwrap_or_else(|| {
                SourceError::timeout_with_elapsed("no answer before the shared deadline", elapsed_ms)
            });
            SourceCause::new(source.name(), error)
        })
        .collect();

    warn!(
        deadline_expired,
        failed = causes.len(),
        race_ms = elapsed_ms,
        "race failed"
    );

    RaceError::AggregateFailure {
        deadline_expired,
        causes,
    }
}

fn record(causes: &mut [Option<SourceError>], index: usize, error: SourceError) {
    if let Some(slot) = causes.get_mut(index) {
        *slot = Some(error);
    }
}

fn task_failure(error: &JoinError) -> SourceError {
    if error.is_panic() {
        SourceError::internal("fetch task panicked")
    } else {
        SourceError::internal("fetch task was cancelled")
    }
}
