//! Single-experiment resolution: whitelist first, then the partition table.
//!
//! An [`Experiment`] is built once from its wire form and never mutated; a
//! newer copy from the server replaces it wholesale. Construction expands
//! every strategy's partition spec into a bucket → strategy table so that
//! resolving a subject is one hash plus one index.
//!
//! Status is not consulted here. Callers skip disabled experiments.


use abtest_types::models::{DEFAULT_STRATEGY_NAME, MAX_PARTITION_COUNT};
use abtest_types::{ConfigMap, ExperimentStatus, ExperimentType, ExperimentWire};
use std::collections::{BTreeSet, HashMap};

use crate::hash::bucket_index;
use crate::partitions::IntervalSet;

/// Immutable, fully-resolved experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    exp_id: String,
    name: String,
    exp_type: ExperimentType,
    ut: i64,
    status: ExperimentStatus,
    partition_count: u64,
    expire: i64,
    /// Local arrival time (UTC nanos); orders copies, never affects resolution
    version: i64,
    white_map: HashMap<String, String>,
    config_map: HashMap<String, ConfigMap>,
    config_raw_map: HashMap<String, String>,
    partitions_map: HashMap<String, String>,
    /// bucket → owning strategy, empty string for unowned buckets
    strategy_table: Vec<String>,
}

impl Experiment {
    /// Build from the server payload, expanding partition specs into the table.
    ///
    /// Specs that fail to parse contribute no buckets. Overlapping specs are a
    /// server-side misconfiguration: the strategy expanded last owns the
    /// shared buckets, and map iteration order decides which one that is.
    pub fn from_wire(wire: ExperimentWire) -> Self {
        let ExperimentWire {
            exp_id,
            name,
            exp_type,
            ut,
            partition_count,
            status,
            expire,
            white_map,
            config_map,
            config_raw_map,
            partitions_map,
        } = wire;

        let strategy_table = if partition_count > MAX_PARTITION_COUNT {
            tracing::warn!(
                experiment = %name,
                partition_count,
                max = MAX_PARTITION_COUNT,
                "Partition count too large, experiment resolves to the default strategy"
            );
            Vec::new()
        } else {
            build_strategy_table(&name, partition_count, &partitions_map)
        };

        Self {
            exp_id,
            name,
            exp_type,
            ut,
            status,
            partition_count,
            expire,
            version: chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            white_map,
            config_map,
            config_raw_map,
            partitions_map,
            strategy_table,
        }
    }

    /// Strategy for `subject_id`, or `""` when nothing claims it.
    ///
    /// A whitelisted subject never reaches the hash. Otherwise the subject's
    /// bucket is looked up in the partition table, provided the table covers
    /// the whole bucket space.
    pub fn resolve_strategy(&self, subject_id: &str) -> &str {
        if let Some(strategy) = self.white_map.get(subject_id) {
            return strategy;
        }

        self.bucket(subject_id)
            .and_then(|bucket| self.strategy_table.get(bucket as usize))
            .map_or("", String::as_str)
    }

    /// [`resolve_strategy`](Self::resolve_strategy) with `""` replaced by the default strategy.
    pub fn strategy_or_default(&self, subject_id: &str) -> &str {
        match self.resolve_strategy(subject_id) {
            "" => DEFAULT_STRATEGY_NAME,
            strategy => strategy,
        }
    }

    /// Bucket the subject hashes into, `None` if the table is unusable.
    pub fn bucket(&self, subject_id: &str) -> Option<u64> {
        let table_complete = self.partition_count > 0
            && u64::try_from(self.strategy_table.len()).is_ok_and(|len| len == self.partition_count);
        table_complete.then(|| bucket_index(&self.exp_id, subject_id, self.partition_count))
    }

    /// Copy of the resolved strategy's config; empty if the strategy has none.
    pub fn resolve_config(&self, subject_id: &str) -> ConfigMap {
        self.config_for_strategy(self.strategy_or_default(subject_id))
    }

    pub fn config_for_strategy(&self, strategy: &str) -> ConfigMap {
        self.config_map.get(strategy).cloned().unwrap_or_default()
    }

    pub fn default_config(&self) -> ConfigMap {
        self.config_for_strategy(DEFAULT_STRATEGY_NAME)
    }

    /// Raw payload of the resolved strategy; empty if it has none.
    pub fn raw_config(&self, subject_id: &str) -> Vec<u8> {
        self.raw_config_for_strategy(self.strategy_or_default(subject_id))
    }

    pub fn raw_config_for_strategy(&self, strategy: &str) -> Vec<u8> {
        self.config_raw_map.get(strategy).map(|raw| raw.as_bytes().to_vec()).unwrap_or_default()
    }

    /// Every strategy's raw payload.
    pub fn raw_configs(&self) -> HashMap<String, Vec<u8>> {
        self.config_raw_map
            .iter()
            .map(|(strategy, raw)| (strategy.clone(), raw.as_bytes().to_vec()))
            .collect()
    }

    /// Distinct strategies that own at least one bucket, sorted.
    pub fn strategy_names(&self) -> Vec<String> {
        self.strategy_table
            .iter()
            .filter(|strategy| !strategy.is_empty())
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn exp_id(&self) -> &str {
        &self.exp_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn exp_type(&self) -> ExperimentType {
        self.exp_type
    }

    pub const fn ut(&self) -> i64 {
        self.ut
    }

    pub const fn status(&self) -> ExperimentStatus {
        self.status
    }

    pub const fn is_enabled(&self) -> bool {
        self.status.is_enabled()
    }

    pub const fn partition_count(&self) -> u64 {
        self.partition_count
    }

    /// Advisory only; resolution ignores it.
    pub const fn expire(&self) -> i64 {
        self.expire
    }

    pub const fn version(&self) -> i64 {
        self.version
    }

    pub fn white_map(&self) -> &HashMap<String, String> {
        &self.white_map
    }

    pub fn partitions_map(&self) -> &HashMap<String, String> {
        &self.partitions_map
    }

    pub fn strategy_table(&self) -> &[String] {
        &self.strategy_table
    }
}

/// Bucket → owning strategy for every parsable spec; `""` marks unowned buckets.
fn build_strategy_table(
    name: &str,
    partition_count: u64,
    partitions_map: &HashMap<String, String>,
) -> Vec<String> {
    let slots = usize::try_from(partition_count).unwrap_or(0);
    let mut strategy_table = vec![String::new(); slots];

    for (strategy, spec) in partitions_map {
        match IntervalSet::parse(spec, partition_count) {
            Ok(set) => {
                for bucket in set.expand() {
                    if let Some(slot) = strategy_table.get_mut(bucket as usize) {
                        slot.clone_from(strategy);
                    }
                }
            },
            Err(e) => {
                tracing::warn!(
                    experiment = %name,
                    strategy = %strategy,
                    spec = %spec,
                    error = %e,
                    "Skipping unparsable partition spec"
                );
            },
        }
    }

    strategy_table
}

impl From<ExperimentWire> for Experiment {
    fn from(wire: ExperimentWire) -> Self {
        Self::from_wire(wire)
    }
}
