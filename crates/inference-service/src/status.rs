//! Status commit
//!
//! Writes the status accumulated during a pass at most once, and only when it
//! differs from what the API server currently holds.

use kube::runtime::events::EventType;
use kube::{Resource, ResourceExt};
use tracing::{debug, info, warn};

use inference_common::crd::InferenceService;
use inference_common::events::{actions, reasons};
use inference_common::Error;

use crate::controller::{InferenceServiceContext, ObjectKey};
use crate::readiness::ReadinessTransition;

/// What a commit did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Status was written
    Written(ReadinessTransition),
    /// Stored status already matched
    Unchanged,
}

/// Commit `desired.status` if it differs from the freshly fetched object.
///
/// The comparison runs against a re-fetch, never the copy read at the start
/// of the pass. No lock is held between the re-fetch and the write: a
/// concurrent writer landing in that window either trips the
/// resourceVersion precondition (409, retried by the dispatcher) or is
/// overwritten, last write wins.
pub async fn commit_status(
    key: &ObjectKey,
    desired: &InferenceService,
    ctx: &InferenceServiceContext,
) -> Result<CommitOutcome, Error> {
    // A missing object on the re-fetch is a failed read, not a no-op.
    let existing = ctx
        .kube
        .get_inference_service(&key.name, &key.namespace)
        .await?
        .ok_or_else(|| Error::not_found(&key.name))?;

    if existing.status == desired.status {
        debug!(service = %key, "status unchanged, skipping write");
        return Ok(CommitOutcome::Unchanged);
    }

    let name = desired.name_any();
    let object_ref = desired.object_ref(&());

    if let Err(e) = ctx.kube.update_status(desired).await {
        warn!(service = %key, error = %e, "failed to update status");
        ctx.events
            .publish(
                &object_ref,
                EventType::Warning,
                reasons::UPDATE_FAILED,
                actions::UPDATE_STATUS,
                Some(format!(
                    "Failed to update status for InferenceService \"{}\": {}",
                    name, e
                )),
            )
            .await;
        return Err(Error::status_update(name, e));
    }

    let transition =
        ReadinessTransition::between(existing.status.as_ref(), desired.status.as_ref());
    match transition {
        ReadinessTransition::BecameReady => {
            info!(service = %key, "InferenceService became ready");
            ctx.events
                .publish(
                    &object_ref,
                    EventType::Normal,
                    reasons::READY,
                    actions::UPDATE_STATUS,
                    Some(format!("InferenceService [{}] is Ready", name)),
                )
                .await;
        }
        ReadinessTransition::BecameNotReady => {
            warn!(service = %key, "InferenceService is no longer ready");
            ctx.events
                .publish(
                    &object_ref,
                    EventType::Warning,
                    reasons::NOT_READY,
                    actions::UPDATE_STATUS,
                    Some(format!("InferenceService [{}] is no longer Ready", name)),
                )
                .await;
        }
        ReadinessTransition::Unchanged => {}
    }

    Ok(CommitOutcome::Written(transition))
}
