use abtest_types::{ConfigListData, FetchError, ProjectId};
use async_trait::async_trait;
use std::collections::HashMap;

use crate::experiment::Experiment;

/// Experiments that changed since the requested watermark.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    /// Watermark to send with the next request
    pub watermark: i64,
    /// Project → changed experiments; an empty list means "no changes"
    pub projects: HashMap<ProjectId, Vec<Experiment>>,
}

impl ConfigUpdate {
    pub fn new(watermark: i64) -> Self {
        Self { watermark, projects: HashMap::new() }
    }

    pub fn with_project(mut self, project_id: ProjectId, experiments: Vec<Experiment>) -> Self {
        self.projects.entry(project_id).or_default().extend(experiments);
        self
    }

    /// Total experiments across all projects.
    pub fn changed_experiments(&self) -> usize {
        self.projects.values().map(Vec::len).sum()
    }
}

impl From<ConfigListData> for ConfigUpdate {
    fn from(data: ConfigListData) -> Self {
        let projects = data
            .config_list_map
            .into_iter()
            .map(|(project_id, wires)| {
                (project_id, wires.into_iter().map(Experiment::from_wire).collect())
            })
            .collect();
        Self { watermark: data.time, projects }
    }
}

/// Source of experiment updates.
///
/// Implementations own transport concerns, including per-request timeouts;
/// the engine never cancels an in-flight fetch.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Everything that changed after `watermark` (0 = full sync).
    async fn fetch(&self, watermark: i64) -> Result<ConfigUpdate, FetchError>;

    /// Human-readable name of the remote, used in diagnostics.
    fn endpoint(&self) -> String {
        "remote".to_string()
    }
}
