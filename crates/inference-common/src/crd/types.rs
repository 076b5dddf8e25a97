//! Supporting types for the InferenceService CRD

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Logical component of an InferenceService.
///
/// Ordering of the variants is the reconcile order: the predictor publishes
/// the endpoint the transformer and explainer route to.
#[derive(
    Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// Serves the model; always present
    Predictor,
    /// Pre/post-processing in front of the predictor
    Transformer,
    /// Explanations for predictor outputs
    Explainer,
}

impl ComponentKind {
    /// All kinds, in reconcile order
    pub const ALL: [ComponentKind; 3] = [Self::Predictor, Self::Transformer, Self::Explainer];

    /// Lowercase name used in resource names and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Predictor => "predictor",
            Self::Transformer => "transformer",
            Self::Explainer => "explainer",
        }
    }

    /// Condition type this component reports its readiness under
    pub fn ready_condition(&self) -> &'static str {
        match self {
            Self::Predictor => condition_types::PREDICTOR_READY,
            Self::Transformer => condition_types::TRANSFORMER_READY,
            Self::Explainer => condition_types::EXPLAINER_READY,
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Well-known condition types
pub mod condition_types {
    /// Overall readiness of the InferenceService
    pub const READY: &str = "Ready";
    /// Predictor workload is serving
    pub const PREDICTOR_READY: &str = "PredictorReady";
    /// Transformer workload is serving
    pub const TRANSFORMER_READY: &str = "TransformerReady";
    /// Explainer workload is serving
    pub const EXPLAINER_READY: &str = "ExplainerReady";
    /// External routing is published
    pub const INGRESS_READY: &str = "IngressReady";
}

/// Condition status following Kubernetes conventions
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Kubernetes-style condition for status reporting
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Condition {
    /// Type of condition (e.g., Ready, PredictorReady)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    #[serde(default)]
    pub reason: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,

    /// Last time the condition's status changed
    #[serde(rename = "lastTransitionTime")]
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Create a new condition stamped with the current time
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }

    /// Whether the condition's status is exactly True
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_kinds_sort_in_reconcile_order() {
        let mut kinds = vec![
            ComponentKind::Explainer,
            ComponentKind::Predictor,
            ComponentKind::Transformer,
        ];
        kinds.sort();
        assert_eq!(kinds, ComponentKind::ALL.to_vec());
    }

    #[test]
    fn component_kind_names() {
        assert_eq!(ComponentKind::Predictor.to_string(), "predictor");
        assert_eq!(ComponentKind::Transformer.ready_condition(), "TransformerReady");
        assert_eq!(
            serde_json::to_string(&ComponentKind::Explainer).unwrap(),
            "\"explainer\""
        );
    }

    #[test]
    fn condition_status_defaults_to_unknown() {
        assert_eq!(ConditionStatus::default(), ConditionStatus::Unknown);
        assert!(!Condition::new("Ready", ConditionStatus::Unknown, "", "").is_true());
        assert!(Condition::new("Ready", ConditionStatus::True, "", "").is_true());
    }
}
