//! InferenceService controller
//!
//! One reconcile pass fetches the InferenceService, runs the predictor,
//! transformer and explainer reconcilers in that order, runs the ingress
//! reconciler, and commits the accumulated status at most once. Readiness
//! flips observed by the commit are reported as Kubernetes Events.
//!
//! The component and ingress reconcilers shipped here observe workloads and
//! aggregate status; building the workloads themselves is left to whatever
//! implements [`ComponentReconciler`] in a given deployment.

#![deny(missing_docs)]

pub mod components;
pub mod config;
pub mod controller;
pub mod ingress;
pub mod readiness;
pub mod status;
pub mod store;

#[cfg(test)]
mod testing;

pub use components::{ComponentReconciler, ComponentSet};
pub use config::{ControllerConfig, IngressConfig};
pub use controller::{
    error_policy, reconcile, reconcile_key, ErrorBackoff, InferenceServiceContext, ObjectKey,
};
pub use ingress::{IngressReconciler, StatusIngressReconciler};
pub use readiness::{is_ready, ReadinessTransition};
pub use status::{commit_status, CommitOutcome};
pub use store::{InferenceServiceKubeClient, InferenceServiceKubeClientImpl};

pub use inference_common::{Error, Result};
