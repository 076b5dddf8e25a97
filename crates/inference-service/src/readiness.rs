//! Readiness evaluation
//!
//! Readiness only decides whether to notify; it never gates reconciliation.

use inference_common::crd::InferenceServiceStatus;

/// Whether a status snapshot is Ready.
///
/// True iff the condition set is non-empty and contains a `Ready` condition
/// whose status is exactly `True`. A missing status counts as not ready.
pub fn is_ready(status: Option<&InferenceServiceStatus>) -> bool {
    status
        .filter(|s| !s.conditions.is_empty())
        .and_then(|s| s.ready_condition())
        .map(|c| c.is_true())
        .unwrap_or(false)
}

/// How readiness moved across one status commit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadinessTransition {
    /// Not ready before, ready now
    BecameReady,
    /// Ready before, not ready now
    BecameNotReady,
    /// No flip (both ready or both not ready)
    Unchanged,
}

impl ReadinessTransition {
    /// Compare the pre-pass and post-pass snapshots
    pub fn between(
        existing: Option<&InferenceServiceStatus>,
        desired: Option<&InferenceServiceStatus>,
    ) -> Self {
        match (is_ready(existing), is_ready(desired)) {
            (false, true) => Self::BecameReady,
            (true, false) => Self::BecameNotReady,
            _ => Self::Unchanged,
        }
    }
}
