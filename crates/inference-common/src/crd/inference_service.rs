//! InferenceService CRD types
//!
//! An `InferenceService` declares a serving topology: a required predictor
//! plus an optional transformer and explainer. Component parameters are
//! opaque to the controller core; component reconcilers interpret them.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{condition_types, ComponentKind, Condition};

// =============================================================================
// Spec
// =============================================================================

/// Per-component settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Minimum number of replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<u32>,

    /// Maximum number of replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replicas: Option<u32>,

    /// Service account the component's pods run as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    /// Component-specific parameters, passed through to the component reconciler
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

/// Desired serving topology
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "serving.kubeflow.org",
    version = "v1beta1",
    kind = "InferenceService",
    plural = "inferenceservices",
    shortname = "isvc",
    namespaced,
    status = "InferenceServiceStatus",
    printcolumn = r#"{"name":"URL","type":"string","jsonPath":".status.url"}"#,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct InferenceServiceSpec {
    /// Model server; always reconciled first
    pub predictor: ComponentSpec,

    /// Optional pre/post-processor in front of the predictor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer: Option<ComponentSpec>,

    /// Optional explainer for predictor outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explainer: Option<ComponentSpec>,
}

impl InferenceServiceSpec {
    /// Spec for the given component, if requested
    pub fn component(&self, kind: ComponentKind) -> Option<&ComponentSpec> {
        match kind {
            ComponentKind::Predictor => Some(&self.predictor),
            ComponentKind::Transformer => self.transformer.as_ref(),
            ComponentKind::Explainer => self.explainer.as_ref(),
        }
    }

    /// Requested components in reconcile order (predictor first)
    pub fn requested_components(&self) -> Vec<ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(|kind| self.component(*kind).is_some())
            .collect()
    }
}

// =============================================================================
// Status
// =============================================================================

/// Observed state of a single component
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    /// Ready replicas of the component's workload
    #[serde(default)]
    pub ready_replicas: i32,

    /// Cluster-internal endpoint published once the component is serving
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Observed state of an InferenceService
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InferenceServiceStatus {
    /// Conditions, including the distinguished `Ready` condition
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// External URL of the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Cluster-internal address traffic enters through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Per-component state
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<ComponentKind, ComponentStatus>,

    /// Generation of the spec this status was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl InferenceServiceStatus {
    /// Look up a condition by type
    pub fn get_condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Insert or replace a condition.
    ///
    /// `lastTransitionTime` is carried over from the existing condition when
    /// the status did not change, so a pass that observes the same state
    /// produces a structurally identical status.
    pub fn set_condition(&mut self, mut condition: Condition) {
        match self.conditions.iter_mut().find(|c| c.type_ == condition.type_) {
            Some(existing) => {
                if existing.status == condition.status {
                    condition.last_transition_time = existing.last_transition_time;
                }
                *existing = condition;
            }
            None => self.conditions.push(condition),
        }
    }

    /// The `Ready` condition, if present
    pub fn ready_condition(&self) -> Option<&Condition> {
        self.get_condition(condition_types::READY)
    }

    /// Published address of a component, if any
    pub fn component_address(&self, kind: ComponentKind) -> Option<&str> {
        self.components
            .get(&kind)
            .and_then(|c| c.address.as_deref())
    }
}

// =============================================================================
// Tests
// =============================================================================
