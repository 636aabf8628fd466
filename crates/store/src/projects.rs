//! Project aggregate repository.

use opendal::Operator;
use sitecost_core::project::Project;
use sitecost_shared::types::ProjectId;

use super::error::StoreError;
use super::json::{read_json, write_json};

/// Repository for the project aggregate, one JSON object per project
/// under `projects/{project_id}.json`.
#[derive(Clone)]
pub struct ProjectStore {
    operator: Operator,
}

impl ProjectStore {
    /// Creates a store over the given operator.
    #[must_use]
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    fn key(project_id: ProjectId) -> String {
        format!("projects/{project_id}.json")
    }

    /// Fetches a project, `None` when unknown.
    pub async fn get(&self, project_id: ProjectId) -> Result<Option<Project>, StoreError> {
        read_json(&self.operator, &Self::key(project_id)).await
    }

    /// Persists a project.
    pub async fn put(&self, project: &Project) -> Result<(), StoreError> {
        write_json(&self.operator, &Self::key(project.id), project).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory_operator;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_round_trip() {
        let store = ProjectStore::new(memory_operator().unwrap());
        let project =
            Project::bootstrap_from_contract(ProjectId::new(), "Depot", None, dec!(50000));

        store.put(&project).await.unwrap();
        let loaded = store.get(project.id).await.unwrap().unwrap();
        assert_eq!(loaded, project);
    }

    #[tokio::test]
    async fn test_unknown_project_is_none() {
        let store = ProjectStore::new(memory_operator().unwrap());
        assert!(store.get(ProjectId::new()).await.unwrap().is_none());
    }
}
