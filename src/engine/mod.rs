//! Precomputation engine
//!
//! Owns the catalog of registered functions and fills the store with one
//! result per combination of their parameters.
//!
//! # Run algorithm (per function)
//!
//! 1. Load the function's entries from the store
//! 2. Enumerate the full combination space and keep the uncached keys
//! 3. Submit pending combinations in enumeration order, at most
//!    `concurrency` at a time; persist each result as soon as it arrives
//! 4. Record failures and move on; failed combinations stay uncached and
//!    are retried by the next run
//! 5. Flush, then swap the function's live snapshot
//!
//! Interrupting a run loses only the in-flight invocations: everything
//! already persisted is picked up as cached by the next run.

mod catalog;
mod report;

pub use catalog::Catalog;
pub use report::{ComputationFailure, FunctionSummary, Phase, RunOutcome, RunReport};

use crate::combination::{enumerate, total_combinations, Arguments, Combination};
use crate::config::{Config, ConfigManager, FunctionSettings};
use crate::domain::{resolve, ParameterSpec, Signature};
use crate::error::{PrecacheError, PrecacheResult};
use crate::front::{CacheFront, SnapshotCell};
use crate::journal::RunJournal;
use crate::key::{self, CacheKey};
use crate::store::PersistentStore;
use crate::target::{FnTarget, TargetFunction};
use catalog::Registration;
use futures_util::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Precomputation engine and function catalog
///
/// Created at startup, populated with [`wrap`](Self::wrap) calls, then
/// consumed by a single [`run`](Self::run).
pub struct Precomputer {
    config: Config,
    store: Arc<PersistentStore>,
    catalog: Catalog,
    journal: RunJournal,
}

impl Precomputer {
    /// Create an engine over an existing store with default settings
    pub fn new(store: Arc<PersistentStore>) -> Self {
        Self {
            config: Config::default(),
            store,
            catalog: Catalog::default(),
            journal: RunJournal::disabled(),
        }
    }

    /// Create an engine whose store and journal follow `config`
    pub fn from_config(config: Config) -> Self {
        let store_path = ConfigManager::store_path(&config);
        let journal = RunJournal::new(
            ConfigManager::journal_path(&store_path),
            config.general.journal,
        );
        let store = PersistentStore::new(store_path).with_flush_every(config.precompute.flush_every);

        Self {
            config,
            store: Arc::new(store),
            catalog: Catalog::default(),
            journal,
        }
    }

    /// Replace run settings (concurrency, timeouts, per-function flags)
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_journal(mut self, journal: RunJournal) -> Self {
        self.journal = journal;
        self
    }

    pub fn store(&self) -> &Arc<PersistentStore> {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Register an async closure and get its live lookup handle
    ///
    /// Fails if any parameter lacks a finite domain or the name is taken.
    pub fn wrap<T, F, Fut, E>(&mut self, signature: Signature, f: F) -> PrecacheResult<CacheFront<T>>
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + DeserializeOwned + 'static,
        E: Display + 'static,
    {
        self.register(signature, FnTarget::new(f))
    }

    /// Register a [`TargetFunction`] implementation
    pub fn register<T, G>(&mut self, signature: Signature, target: G) -> PrecacheResult<CacheFront<T>>
    where
        T: DeserializeOwned,
        G: TargetFunction + 'static,
    {
        let specs: Arc<[ParameterSpec]> = resolve(&signature)?.into();
        let function = signature.function().to_string();
        let snapshot = Arc::new(SnapshotCell::default());

        self.catalog.insert(Registration {
            function: function.clone(),
            specs: Arc::clone(&specs),
            target: Arc::new(target),
            snapshot: Arc::clone(&snapshot),
        })?;

        debug!(
            "Registered {} ({} combinations)",
            function,
            total_combinations(&specs)
        );
        Ok(CacheFront::new(
            function,
            specs,
            Arc::clone(&self.store),
            snapshot,
        ))
    }

    /// Precompute every registered, enabled function
    ///
    /// Store corruption and write failures abort the run; failures of
    /// individual combinations are reported in the summary instead.
    pub async fn run(self) -> PrecacheResult<RunReport> {
        let started = Instant::now();
        let names: Vec<&str> = self.catalog.functions().collect();
        info!("Precomputing {} function(s)", names.len());
        self.journal
            .record("run.started", &serde_json::json!({ "functions": names }))
            .await;

        let mut functions = Vec::with_capacity(self.catalog.len());
        for registration in self.catalog.iter() {
            let settings = self.config.function(&registration.function);
            let summary = if settings.enabled {
                match self.run_function(registration, settings).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        self.journal
                            .record(
                                "run.failed",
                                &serde_json::json!({
                                    "function": registration.function,
                                    "error": e.to_string(),
                                }),
                            )
                            .await;
                        return Err(e);
                    }
                }
            } else {
                info!("{}: disabled in configuration, skipping", registration.function);
                FunctionSummary::disabled(&registration.function)
            };

            self.journal
                .record("function.finished", &summary.to_json())
                .await;
            functions.push(summary);
        }

        let report = RunReport {
            run_id: self.journal.run_id(),
            functions,
            elapsed: started.elapsed(),
        };

        info!(
            "Precomputation finished in {:.1}s: {} computed, {} cached, {} failed",
            report.elapsed.as_secs_f64(),
            report.computed(),
            report.skipped(),
            report.failed()
        );
        self.journal
            .record(
                "run.finished",
                &serde_json::json!({
                    "computed": report.computed(),
                    "skipped": report.skipped(),
                    "failed": report.failed(),
                    "elapsed_ms": report.elapsed.as_millis() as u64,
                }),
            )
            .await;

        Ok(report)
    }

    async fn run_function(
        &self,
        registration: &Registration,
        settings: FunctionSettings,
    ) -> PrecacheResult<FunctionSummary> {
        let function = registration.function.as_str();

        let mut phase = Phase::NotStarted.advance(Phase::Loading)?;
        let cached = self.store.load(function).await?;

        phase = phase.advance(Phase::Enumerating)?;
        let total = total_combinations(&registration.specs);
        let pending: Vec<(Combination, CacheKey)> = enumerate(&registration.specs)
            .map(|combo| {
                let key = key::encode_pairs(function, combo.pairs());
                (combo, key)
            })
            .filter(|(_, key)| !cached.contains(key))
            .collect();
        let pending_count = pending.len();

        let mut summary = FunctionSummary {
            function: function.to_string(),
            total,
            computed: 0,
            skipped: total - pending_count,
            failed: 0,
            failures: Vec::new(),
            outcome: RunOutcome::FullyCached,
        };

        if pending.is_empty() {
            info!("{}: fully cached ({} entries), nothing to do", function, total);
        } else {
            summary.outcome = RunOutcome::Computed;
            info!(
                "{}: computing {} of {} combination(s), concurrency {}",
                function, pending_count, total, settings.concurrency
            );

            let mut results = stream::iter(pending)
                .map(|(args, key)| {
                    invoke(
                        function.to_string(),
                        Arc::clone(&registration.target),
                        args,
                        key,
                        settings.timeout_secs,
                    )
                })
                .buffer_unordered(settings.concurrency);

            while let Some((key, outcome)) = results.next().await {
                phase = phase.advance(Phase::Computing)?;
                match outcome {
                    Ok(value) => {
                        self.store.upsert(function, &key, value).await?;
                        summary.computed += 1;
                        debug!(
                            "{}: [{}/{}] cached {}",
                            function,
                            summary.computed + summary.failed,
                            pending_count,
                            key
                        );
                    }
                    Err(error) => {
                        warn!("{}: {}", function, error);
                        self.journal
                            .record(
                                "combination.failed",
                                &serde_json::json!({
                                    "function": function,
                                    "key": key.as_str(),
                                    "error": error.to_string(),
                                }),
                            )
                            .await;
                        summary.failed += 1;
                        summary.failures.push(ComputationFailure { key, error });
                    }
                }
            }

            self.store.flush().await?;
        }

        registration.snapshot.replace(self.store.load(function).await?);
        phase = phase.advance(Phase::Done)?;

        info!(
            "{}: {} ({} computed, {} cached, {} failed)",
            function, phase, summary.computed, summary.skipped, summary.failed
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for Precomputer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Precomputer")
            .field("store", &self.store.path())
            .field("catalog", &self.catalog)
            .finish()
    }
}

/// Task handle that aborts the task when dropped
///
/// A run that stops early drops its in-flight invocations; they must not
/// keep calling the target after `run` has returned.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run one combination on its own task
///
/// A panic or timeout inside the target becomes a failure for this
/// combination only; a timed-out task is aborted.
async fn invoke(
    function: String,
    target: Arc<dyn TargetFunction>,
    args: Combination,
    key: CacheKey,
    timeout_secs: Option<u64>,
) -> (CacheKey, PrecacheResult<serde_json::Value>) {
    let mut task = AbortOnDrop(tokio::spawn(async move { target.invoke(args).await }));

    let joined = match timeout_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), &mut task.0).await {
            Ok(joined) => joined,
            Err(_) => {
                let error = PrecacheError::Timeout {
                    key: key.to_string(),
                    secs,
                };
                return (key, Err(error));
            }
        },
        None => (&mut task.0).await,
    };

    let result = match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(reason)) => Err(PrecacheError::Computation {
            function,
            key: key.to_string(),
            reason,
        }),
        Err(e) => Err(PrecacheError::Computation {
            function,
            key: key.to_string(),
            reason: if e.is_panic() {
                "function panicked".to_string()
            } else {
                "task cancelled".to_string()
            },
        }),
    };
    (key, result)
}
