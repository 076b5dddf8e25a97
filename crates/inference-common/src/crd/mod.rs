//! Custom Resource Definitions for the InferenceService controller

mod inference_service;
mod types;

pub use inference_service::{
    ComponentSpec, ComponentStatus, InferenceService, InferenceServiceSpec,
    InferenceServiceStatus,
};
pub use types::{condition_types, ComponentKind, Condition, ConditionStatus};
