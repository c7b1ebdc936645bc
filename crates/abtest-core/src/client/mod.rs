//! Read API bound to one project.
//!
//! [`AbClient`] is a cheap handle over a shared [`SyncEngine`]. Every lookup
//! loads the currently published snapshot once and answers from it, so a
//! single call never mixes two snapshots. Lookup failures are checked in a
//! fixed order: not running, uninitialized, unknown project, unknown
//! experiment, disabled experiment.
//!
//! The `get_*` and `*_or_default` accessors never fail. They fall back to the
//! caller's default and feed the failure into the engine's damped
//! [`ErrorTracker`](crate::diagnostics::ErrorTracker).

mod typed;


pub use typed::ConfigValue;

use abtest_types::{AbClientConfig, AbError, AbResult, ConfigMap, ProjectId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::diagnostics::TrackContext;
use crate::experiment::Experiment;
use crate::snapshot::{ExperimentMap, Snapshot};
use crate::sync::{Fetcher, SyncEngine, SyncOutcome, SyncStatus};

#[derive(Debug, Clone)]
pub struct AbClient {
    project_id: ProjectId,
    engine: Arc<SyncEngine>,
}

impl AbClient {
    /// Validate `config`, then start a new engine over `fetcher`.
    ///
    /// Returns once the initial sync has been attempted. A failed initial
    /// sync is logged and the client serves defaults until a later tick
    /// succeeds.
    pub async fn open(config: AbClientConfig, fetcher: Arc<dyn Fetcher>) -> AbResult<Self> {
        let config = config.validated()?;
        let engine = SyncEngine::new(fetcher, config.interval());
        engine.start().await;

        tracing::info!(project_id = config.project_id, "A/B client opened");
        Ok(Self::with_engine(engine, config.project_id))
    }

    /// Bind a facade for `project_id` to an existing engine.
    pub fn with_engine(engine: Arc<SyncEngine>, project_id: ProjectId) -> Self {
        Self { project_id, engine }
    }

    /// Stop the engine and wait for its loop to exit.
    ///
    /// Every facade sharing the engine fails with `NotRunning` afterwards.
    pub async fn close(&self) {
        self.engine.shutdown().await;
    }

    pub async fn sync_now(&self) -> AbResult<SyncOutcome> {
        Ok(self.engine.sync_now().await?)
    }

    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn status(&self) -> SyncStatus {
        self.engine.status()
    }

    /// Union of the resolved configs of every enabled experiment.
    ///
    /// Duplicate keys across experiments resolve in snapshot iteration order,
    /// which is unspecified: no experiment is guaranteed to win.
    pub fn aggregate_config(&self, subject_id: &str) -> AbResult<ConfigMap> {
        let snapshot = self.current_snapshot()?;
        let mut merged = ConfigMap::new();
        for experiment in enabled(self.project(&snapshot)?) {
            merged.extend(experiment.resolve_config(subject_id));
        }
        Ok(merged)
    }

    /// Resolved config of every enabled experiment, keyed by experiment name.
    pub fn experiments(&self, subject_id: &str) -> AbResult<HashMap<String, ConfigMap>> {
        let snapshot = self.current_snapshot()?;
        Ok(enabled(self.project(&snapshot)?)
            .map(|experiment| (experiment.name().to_string(), experiment.resolve_config(subject_id)))
            .collect())
    }

    pub fn experiment_config(&self, subject_id: &str, exp_name: &str) -> AbResult<ConfigMap> {
        Ok(self.find_experiment(exp_name)?.resolve_config(subject_id))
    }

    pub fn raw_configs(&self, exp_name: &str) -> AbResult<HashMap<String, Vec<u8>>> {
        Ok(self.find_experiment(exp_name)?.raw_configs())
    }

    pub fn raw_config(&self, subject_id: &str, exp_name: &str) -> AbResult<Vec<u8>> {
        Ok(self.find_experiment(exp_name)?.raw_config(subject_id))
    }

    /// Strategy for the subject, the default strategy when nothing matches.
    pub fn strategy_name(&self, subject_id: &str, exp_name: &str) -> AbResult<String> {
        Ok(self.find_experiment(exp_name)?.strategy_or_default(subject_id).to_string())
    }

    /// Like [`strategy_name`](Self::strategy_name), but an unmatched subject
    /// is an `ExperimentNotMatch` error.
    pub fn matched_strategy(&self, subject_id: &str, exp_name: &str) -> AbResult<String> {
        let experiment = self.find_experiment(exp_name)?;
        match experiment.resolve_strategy(subject_id) {
            "" => Err(AbError::ExperimentNotMatch { name: exp_name.to_string() }),
            strategy => Ok(strategy.to_string()),
        }
    }

    pub fn distinct_strategy_names(&self, exp_name: &str) -> AbResult<Vec<String>> {
        Ok(self.find_experiment(exp_name)?.strategy_names())
    }

    /// Read `key_name` from the subject's config into `dest`.
    ///
    /// A stored `null` succeeds and leaves `dest` as it was. A value that
    /// cannot be converted resets `dest` to its zero value.
    pub fn typed_key_into<T: ConfigValue>(
        &self,
        subject_id: &str,
        exp_name: &str,
        key_name: &str,
        dest: &mut T,
    ) -> AbResult<()> {
        let config = self.experiment_config(subject_id, exp_name)?;
        let value = config
            .get(key_name)
            .ok_or_else(|| AbError::KeyNotFound { key: key_name.to_string() })?;
        typed::assign(key_name, value, dest)
    }

    pub fn typed_key<T: ConfigValue>(&self, subject_id: &str, exp_name: &str, key_name: &str) -> AbResult<T> {
        let mut value = T::default();
        self.typed_key_into(subject_id, exp_name, key_name, &mut value)?;
        Ok(value)
    }

    pub fn get_bool(&self, subject_id: &str, exp_name: &str, key_name: &str, default: bool) -> bool {
        self.get_or("get_bool", subject_id, exp_name, key_name, default)
    }

    pub fn get_string(&self, subject_id: &str, exp_name: &str, key_name: &str, default: &str) -> String {
        self.get_or("get_string", subject_id, exp_name, key_name, default.to_string())
    }

    pub fn get_i64(&self, subject_id: &str, exp_name: &str, key_name: &str, default: i64) -> i64 {
        self.get_or("get_i64", subject_id, exp_name, key_name, default)
    }

    pub fn get_f64(&self, subject_id: &str, exp_name: &str, key_name: &str, default: f64) -> f64 {
        self.get_or("get_f64", subject_id, exp_name, key_name, default)
    }

    pub fn get_string_vec(
        &self,
        subject_id: &str,
        exp_name: &str,
        key_name: &str,
        default: Vec<String>,
    ) -> Vec<String> {
        self.get_or("get_string_vec", subject_id, exp_name, key_name, default)
    }

    pub fn get_i64_vec(&self, subject_id: &str, exp_name: &str, key_name: &str, default: Vec<i64>) -> Vec<i64> {
        self.get_or("get_i64_vec", subject_id, exp_name, key_name, default)
    }

    pub fn get_map(&self, subject_id: &str, exp_name: &str, key_name: &str, default: ConfigMap) -> ConfigMap {
        self.get_or("get_map", subject_id, exp_name, key_name, default)
    }

    /// [`aggregate_config`](Self::aggregate_config), empty on failure.
    pub fn config_or_default(&self, subject_id: &str) -> ConfigMap {
        self.aggregate_config(subject_id).unwrap_or_else(|e| {
            self.track_error("config", TrackContext { subject_id, ..TrackContext::default() }, &e);
            ConfigMap::new()
        })
    }

    /// [`experiment_config`](Self::experiment_config), empty on failure.
    pub fn experiment_or_default(&self, subject_id: &str, exp_name: &str) -> ConfigMap {
        self.experiment_config(subject_id, exp_name).unwrap_or_else(|e| {
            let ctx = TrackContext { subject_id, exp_name, ..TrackContext::default() };
            self.track_error("experiment", ctx, &e);
            ConfigMap::new()
        })
    }

    /// [`experiments`](Self::experiments), empty on failure.
    pub fn experiments_or_default(&self, subject_id: &str) -> HashMap<String, ConfigMap> {
        self.experiments(subject_id).unwrap_or_else(|e| {
            self.track_error("experiments", TrackContext { subject_id, ..TrackContext::default() }, &e);
            HashMap::new()
        })
    }

    /// Named experiment of the bound project, after the lifecycle and status checks.
    pub fn find_experiment(&self, exp_name: &str) -> AbResult<Arc<Experiment>> {
        let snapshot = self.current_snapshot()?;
        let experiment = self
            .project(&snapshot)?
            .get(exp_name)
            .ok_or_else(|| AbError::ExperimentNotFound { name: exp_name.to_string() })?;
        if !experiment.is_enabled() {
            return Err(AbError::ExperimentDisabled { name: exp_name.to_string() });
        }
        Ok(Arc::clone(experiment))
    }

    /// Count a failure against the shared damping counter.
    pub fn track_error(&self, operation: &str, ctx: TrackContext<'_>, error: &AbError) {
        self.engine.error_tracker().track(operation, ctx, error);
    }

    fn get_or<T: ConfigValue + Clone>(
        &self,
        operation: &str,
        subject_id: &str,
        exp_name: &str,
        key_name: &str,
        default: T,
    ) -> T {
        let mut value = default.clone();
        match self.typed_key_into(subject_id, exp_name, key_name, &mut value) {
            Ok(()) => value,
            Err(e) => {
                self.track_error(operation, TrackContext { subject_id, exp_name, key_name }, &e);
                default
            },
        }
    }

    fn current_snapshot(&self) -> AbResult<Arc<Snapshot>> {
        if !self.engine.is_running() {
            return Err(AbError::NotRunning);
        }
        self.engine.snapshot().ok_or(AbError::Uninitialized)
    }

    fn project<'a>(&self, snapshot: &'a Snapshot) -> AbResult<&'a ExperimentMap> {
        snapshot
            .project(self.project_id)
            .ok_or(AbError::ProjectNotFound { project_id: self.project_id })
    }
}

fn enabled(experiments: &ExperimentMap) -> impl Iterator<Item = &Arc<Experiment>> {
    experiments.values().filter(|experiment| experiment.is_enabled())
}
