//! Immutable project → experiment view, the unit of atomic publication.
//!
//! A [`Snapshot`] is never edited once built. Applying a server update
//! produces a brand-new snapshot that shares the untouched experiments with
//! its predecessor through `Arc`, so readers holding the old one keep a
//! complete, consistent view.

use abtest_types::ProjectId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::experiment::Experiment;

/// Experiment name → experiment, for one project.
pub type ExperimentMap = HashMap<String, Arc<Experiment>>;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    projects: HashMap<ProjectId, ExperimentMap>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from per-project experiment lists; later duplicates of a name win.
    pub fn from_projects(projects: HashMap<ProjectId, Vec<Experiment>>) -> Self {
        Self::new().merged(projects)
    }

    pub fn project(&self, project_id: ProjectId) -> Option<&ExperimentMap> {
        self.projects.get(&project_id)
    }

    pub fn experiment(&self, project_id: ProjectId, name: &str) -> Option<&Arc<Experiment>> {
        self.projects.get(&project_id).and_then(|experiments| experiments.get(name))
    }

    pub fn project_ids(&self) -> impl Iterator<Item = ProjectId> + '_ {
        self.projects.keys().copied()
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn experiment_count(&self) -> usize {
        self.projects.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// New snapshot with `changes` applied on top of `self`.
    ///
    /// For every project in `changes`, the listed experiments replace the
    /// local ones of the same name and every other local experiment of that
    /// project is carried forward unchanged, so an update can add or replace
    /// but never delete. Projects absent from `changes` are kept as they are.
    pub fn merged(&self, changes: HashMap<ProjectId, Vec<Experiment>>) -> Self {
        let mut projects = self.projects.clone();
        for (project_id, experiments) in changes {
            let local = projects.entry(project_id).or_default();
            for experiment in experiments {
                local.insert(experiment.name().to_string(), Arc::new(experiment));
            }
        }
        Self { projects }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use abtest_types::ExperimentWire;
    use serde_json::json;

    fn experiment(name: &str, color: &str) -> Experiment {
        let wire: ExperimentWire = serde_json::from_value(json!({
            "exp_id": format!("id-{name}"),
            "name": name,
            "partition_count": 1,
            "config_map": {"A": {"color": color}},
            "partitions_map": {"A": "0"}
        }))
        .unwrap();
        Experiment::from_wire(wire)
    }

    fn color(snapshot: &Snapshot, project_id: ProjectId, name: &str) -> serde_json::Value {
        snapshot.experiment(project_id, name).unwrap().resolve_config("anyone")["color"].clone()
    }

    fn base() -> Snapshot {
        Snapshot::from_projects(HashMap::from([
            (1, vec![experiment("x", "red"), experiment("y", "red")]),
            (2, vec![experiment("z", "red")]),
        ]))
    }

    #[test]
    fn test_empty_list_keeps_project() {
        let merged = base().merged(HashMap::from([(1, vec![])]));

        assert_eq!(merged.project(1).unwrap().len(), 2);
        assert_eq!(color(&merged, 1, "x"), json!("red"));
    }

    #[test]
    fn test_listed_experiment_replaced_others_carried() {
        let merged = base().merged(HashMap::from([(1, vec![experiment("x", "blue")])]));

        assert_eq!(color(&merged, 1, "x"), json!("blue"));
        assert_eq!(color(&merged, 1, "y"), json!("red"));
        assert_eq!(merged.experiment_count(), 3);
    }

    #[test]
    fn test_absent_project_retained() {
        let merged = base().merged(HashMap::from([(3, vec![experiment("w", "green")])]));

        assert_eq!(merged.project_count(), 3);
        assert_eq!(color(&merged, 2, "z"), json!("red"));
        assert_eq!(color(&merged, 3, "w"), json!("green"));
    }

    #[test]
    fn test_merge_leaves_original_untouched() {
        let original = base();
        let merged = original.merged(HashMap::from([(1, vec![experiment("x", "blue")])]));

        assert_eq!(color(&original, 1, "x"), json!("red"));
        assert_eq!(color(&merged, 1, "x"), json!("blue"));
        assert!(Arc::ptr_eq(
            original.experiment(1, "y").unwrap(),
            merged.experiment(1, "y").unwrap()
        ));
    }

    #[test]
    fn test_lookup_misses() {
        let snapshot = base();
        assert!(snapshot.project(9).is_none());
        assert!(snapshot.experiment(1, "nope").is_none());
        assert!(Snapshot::new().is_empty());
    }
}
