//! Cost envelope repository.

use std::str::FromStr;

use opendal::Operator;
use sitecost_core::envelope::{CostEnvelope, StoredEnvelopesIndex};
use sitecost_shared::types::ProjectId;
use tracing::debug;

use super::error::StoreError;
use super::json::{read_json, write_json};

const PREFIX: &str = "envelopes/";

/// Repository persisting each project's envelope as one JSON object
/// under `envelopes/{project_id}.json`.
///
/// Reads and writes are whole-envelope; there are no partial updates.
#[derive(Clone)]
pub struct EnvelopeStore {
    operator: Operator,
}

impl EnvelopeStore {
    /// Creates a store over the given operator.
    #[must_use]
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    fn key(project_id: ProjectId) -> String {
        format!("{PREFIX}{project_id}.json")
    }

    /// Fetches one project's envelope, `None` when never persisted.
    pub async fn get_envelope(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<CostEnvelope>, StoreError> {
        read_json(&self.operator, &Self::key(project_id)).await
    }

    /// Persists one project's envelope.
    pub async fn persist_envelope(
        &self,
        project_id: ProjectId,
        envelope: &CostEnvelope,
    ) -> Result<(), StoreError> {
        let key = Self::key(project_id);
        write_json(&self.operator, &key, envelope).await?;
        debug!(%project_id, "envelope persisted");
        Ok(())
    }

    /// Materializes the full project-to-envelope index by listing the
    /// storage prefix.
    pub async fn load_all(&self) -> Result<StoredEnvelopesIndex, StoreError> {
        let mut index = StoredEnvelopesIndex::new();

        let entries = self.operator.list(PREFIX).await?;
        for entry in entries {
            let Some(stem) = entry.name().strip_suffix(".json") else {
                continue;
            };
            let Ok(project_id) = ProjectId::from_str(stem) else {
                continue;
            };
            if let Some(envelope) = self.get_envelope(project_id).await? {
                index.insert(project_id, envelope);
            }
        }

        Ok(index)
    }

    /// Persists every entry of an index.
    pub async fn save_all(&self, index: &StoredEnvelopesIndex) -> Result<(), StoreError> {
        for (project_id, envelope) in index {
            self.persist_envelope(*project_id, envelope).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory_operator;
    use sitecost_core::envelope::DraftLifecycleManager;

    #[tokio::test]
    async fn test_get_missing_envelope_is_none() {
        let store = EnvelopeStore::new(memory_operator().unwrap());
        let loaded = store.get_envelope(ProjectId::new()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_persist_and_reload() {
        let store = EnvelopeStore::new(memory_operator().unwrap());
        let project_id = ProjectId::new();

        let mut envelope = CostEnvelope::default();
        DraftLifecycleManager::ensure_draft(&mut envelope);
        store.persist_envelope(project_id, &envelope).await.unwrap();

        let loaded = store.get_envelope(project_id).await.unwrap().unwrap();
        assert!(loaded.draft.is_some());
        assert!(loaded.official.is_none());
    }

    #[tokio::test]
    async fn test_load_all_materializes_index() {
        let store = EnvelopeStore::new(memory_operator().unwrap());
        let (a, b) = (ProjectId::new(), ProjectId::new());

        store
            .persist_envelope(a, &CostEnvelope::default())
            .await
            .unwrap();
        store
            .persist_envelope(b, &CostEnvelope::default())
            .await
            .unwrap();

        let index = store.load_all().await.unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.contains_key(&a));
        assert!(index.contains_key(&b));
    }

    #[tokio::test]
    async fn test_save_all_round_trip() {
        let store = EnvelopeStore::new(memory_operator().unwrap());
        let project_id = ProjectId::new();

        let mut index = StoredEnvelopesIndex::new();
        index.insert(project_id, CostEnvelope::default());
        store.save_all(&index).await.unwrap();

        assert!(store.get_envelope(project_id).await.unwrap().is_some());
    }
}
