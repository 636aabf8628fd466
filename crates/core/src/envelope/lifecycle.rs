//! Draft and official snapshot lifecycle.

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use super::types::{BoqSnapshot, CostEnvelope, SnapshotStatus};

/// Lifecycle operation errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Promotion requested for an envelope without a draft.
    #[error("envelope has no draft snapshot to promote")]
    NoDraft,
}

/// Draft/official lifecycle manager.
///
/// Three states per project: absent, draft, official. The draft remains
/// editable after promotion; promotion never deletes it.
pub struct DraftLifecycleManager;

impl DraftLifecycleManager {
    /// Returns the envelope's draft, creating an empty one if absent.
    ///
    /// An existing draft is never overwritten.
    pub fn ensure_draft(envelope: &mut CostEnvelope) -> &mut BoqSnapshot {
        envelope.draft.get_or_insert_with(|| {
            info!("creating empty draft snapshot");
            BoqSnapshot::empty_draft()
        })
    }

    /// Deep-clones the draft into the official slot and stamps the
    /// promotion time. The draft is left untouched.
    pub fn promote(envelope: &mut CostEnvelope) -> Result<(), LifecycleError> {
        let draft = envelope.draft.as_ref().ok_or(LifecycleError::NoDraft)?;

        let mut official = draft.clone();
        official.status = SnapshotStatus::Official;

        let now = Utc::now();
        envelope.official = Some(official);
        envelope.meta.last_promotion_at = Some(now);

        info!(promoted_at = %now, "draft promoted to official snapshot");
        Ok(())
    }
}
