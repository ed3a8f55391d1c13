//! Bounded-concurrency reconciliation passes.
//!
//! A [`ReconcilePass`] takes a batch of [`ReconcileJob`]s and, for each
//! content key, reads the canonical record, fetches from every available
//! provider, reconciles, and persists the delta. Keys run in parallel up to
//! the configured concurrency; store calls run on blocking threads.
//!
//! One key failing never affects another: every job ends up in the
//! [`PassReport`] as applied, unchanged, or failed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reelmerge_common::{ContentKey, MediaKind};
use reelmerge_db::models::CanonicalRecord;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::cache::LookupCache;
use crate::config::Config;
use crate::policy::PolicyRegistry;
use crate::providers::{FetchRequest, FetcherRegistry};
use crate::reconcile::reconcile;
use crate::store::CanonicalStore;

/// Lookup cache entries live for one hour unless the pass says otherwise.
const CACHE_TTL_SECS: u64 = 3600;

/// Times a key is re-planned after losing a write race before it fails.
const MAX_DELTA_ATTEMPTS: usize = 3;

/// One content key to reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileJob {
    pub content_key: ContentKey,
    /// Title for providers that search by name.
    pub search_title: Option<String>,
    #[serde(default)]
    pub kind: MediaKind,
}

impl ReconcileJob {
    pub fn new(content_key: impl Into<ContentKey>, kind: MediaKind) -> Self {
        Self {
            content_key: content_key.into(),
            search_title: None,
            kind,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.search_title = Some(title.into());
        self
    }
}

/// What happened to one content key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum KeyOutcome {
    /// A delta was applied (or, in a dry run, would have been).
    Applied { fields: Vec<String> },
    /// Nothing to change.
    Unchanged,
    /// The key could not be processed.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyReport {
    pub content_key: ContentKey,
    #[serde(flatten)]
    pub outcome: KeyOutcome,
}

/// Outcome of a whole pass, in job order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub keys: Vec<KeyReport>,
}

impl PassReport {
    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, KeyOutcome::Applied { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, KeyOutcome::Unchanged))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, KeyOutcome::Failed { .. }))
    }

    pub fn get(&self, key: &ContentKey) -> Option<&KeyOutcome> {
        self.keys
            .iter()
            .find(|r| &r.content_key == key)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&KeyOutcome) -> bool) -> usize {
        self.keys.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Everything a single key's task needs, shared across tasks.
struct PassContext {
    policy: Arc<PolicyRegistry>,
    fetchers: Arc<FetcherRegistry>,
    store: Arc<dyn CanonicalStore>,
    cache: Arc<LookupCache>,
    dry_run: bool,
}

/// Runs reconciliation jobs with bounded concurrency.
pub struct ReconcilePass {
    policy: Arc<PolicyRegistry>,
    fetchers: Arc<FetcherRegistry>,
    store: Arc<dyn CanonicalStore>,
    cache: Arc<LookupCache>,
    concurrency: usize,
    dry_run: bool,
}

impl ReconcilePass {
    pub fn new(
        policy: PolicyRegistry,
        fetchers: FetcherRegistry,
        store: Arc<dyn CanonicalStore>,
    ) -> Self {
        Self {
            policy: Arc::new(policy),
            fetchers: Arc::new(fetchers),
            store,
            cache: Arc::new(LookupCache::default()),
            concurrency: 4,
            dry_run: false,
        }
    }

    /// Build a pass from configuration: policy overrides, enabled network
    /// fetchers, worker limits.
    pub fn from_config(config: &Config, store: Arc<dyn CanonicalStore>) -> anyhow::Result<Self> {
        let policy = PolicyRegistry::from_config(&config.merge)?;
        let fetchers = FetcherRegistry::from_config(&config.providers)?;

        Ok(Self::new(policy, fetchers, store)
            .with_concurrency(config.worker.concurrency)
            .with_cache(Arc::new(LookupCache::new(
                config.worker.cache_capacity,
                CACHE_TTL_SECS,
            ))))
    }

    /// Keys processed at the same time (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Share a lookup cache with other passes.
    pub fn with_cache(mut self, cache: Arc<LookupCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Compute deltas without persisting them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn cache(&self) -> &Arc<LookupCache> {
        &self.cache
    }

    /// Reconcile every job and report per-key outcomes in job order.
    pub async fn run(&self, jobs: Vec<ReconcileJob>) -> PassReport {
        let started_at = Utc::now();
        let ctx = Arc::new(PassContext {
            policy: self.policy.clone(),
            fetchers: self.fetchers.clone(),
            store: self.store.clone(),
            cache: self.cache.clone(),
            dry_run: self.dry_run,
        });
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(jobs.len());

        for job in jobs {
            let sem = semaphore.clone();
            let ctx = ctx.clone();
            let content_key = job.content_key.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = sem.acquire().await else {
                    return KeyOutcome::Failed {
                        error: "worker pool shut down".to_string(),
                    };
                };
                process(&ctx, job).await
            });
            handles.push((content_key, handle));
        }

        let mut keys = Vec::with_capacity(handles.len());
        for (content_key, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => KeyOutcome::Failed {
                    error: format!("task failed: {e}"),
                },
            };
            keys.push(KeyReport {
                content_key,
                outcome,
            });
        }

        let report = PassReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.dry_run,
            keys,
        };

        info!(
            keys = report.keys.len(),
            applied = report.applied(),
            unchanged = report.unchanged(),
            failed = report.failed(),
            dry_run = report.dry_run,
            "Reconcile pass finished"
        );

        report
    }
}

async fn process(ctx: &Arc<PassContext>, job: ReconcileJob) -> KeyOutcome {
    match try_process(ctx, job.clone()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(content_key = %job.content_key, error = %format!("{e:#}"), "Reconcile failed");
            KeyOutcome::Failed {
                error: format!("{e:#}"),
            }
        }
    }
}

async fn try_process(ctx: &Arc<PassContext>, job: ReconcileJob) -> anyhow::Result<KeyOutcome> {
    let key = job.content_key.clone();
    let mut current = read_current(ctx, &key).await?;

    let mut request = FetchRequest::new(key.clone(), job.kind);
    if let Some(title) = job.search_title.as_deref() {
        request = request.with_title(title);
    }
    // Reuse the IMDb id an earlier pass settled on.
    if let Some(imdb) = current.as_ref().and_then(|c| c.get("imdb")) {
        request = request.with_imdb_id(imdb);
    }

    let sources = ctx.fetchers.fetch_all(&request, &ctx.cache).await;
    debug!(content_key = %key, sources = sources.len(), "Fetched source records");

    if ctx.dry_run {
        let decisions = reconcile(&ctx.policy, &key, current.as_ref(), &sources);
        if decisions.is_empty() {
            return Ok(KeyOutcome::Unchanged);
        }
        let fields = decisions.into_iter().map(|d| d.field).collect();
        return Ok(KeyOutcome::Applied { fields });
    }

    let mut fields: Vec<String> = Vec::new();
    for attempt in 1..=MAX_DELTA_ATTEMPTS {
        let decisions = reconcile(&ctx.policy, &key, current.as_ref(), &sources);
        if decisions.is_empty() {
            break;
        }

        let outcome = {
            let store = ctx.store.clone();
            let key = key.clone();
            tokio::task::spawn_blocking(move || store.apply_delta(&key, &decisions)).await??
        };
        info!(content_key = %key, fields = outcome.written(), "Applied delta");
        for field in outcome.applied {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }

        if outcome.stale.is_empty() {
            break;
        }
        if attempt == MAX_DELTA_ATTEMPTS {
            anyhow::bail!(
                "fields changed underneath the pass {MAX_DELTA_ATTEMPTS} times: {}",
                outcome.stale.join(", ")
            );
        }
        warn!(
            content_key = %key,
            stale = ?outcome.stale,
            attempt,
            "Record changed concurrently, re-planning"
        );
        current = read_current(ctx, &key).await?;
    }

    if fields.is_empty() {
        return Ok(KeyOutcome::Unchanged);
    }
    fields.sort_unstable();
    Ok(KeyOutcome::Applied { fields })
}

async fn read_current(
    ctx: &Arc<PassContext>,
    key: &ContentKey,
) -> anyhow::Result<Option<CanonicalRecord>> {
    let store = ctx.store.clone();
    let key = key.clone();
    Ok(tokio::task::spawn_blocking(move || store.get(&key)).await??)
}
