//! In-memory fakes for exercising whole reconcile passes in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::EventType;

use inference_common::crd::{
    Condition, ConditionStatus, InferenceService, InferenceServiceSpec, InferenceServiceStatus,
};
use inference_common::{Error, EventPublisher};

use crate::components::ComponentReconciler;
use crate::controller::ObjectKey;
use crate::ingress::IngressReconciler;
use crate::store::InferenceServiceKubeClient;

pub const NAMESPACE: &str = "models";

pub fn sample_isvc(name: &str, spec: InferenceServiceSpec) -> InferenceService {
    let mut isvc = InferenceService::new(name, spec);
    isvc.metadata.namespace = Some(NAMESPACE.to_string());
    isvc.metadata.resource_version = Some("1".to_string());
    isvc
}

pub fn key(name: &str) -> ObjectKey {
    ObjectKey::new(NAMESPACE, name)
}

/// Status holding only a `Ready` condition
pub fn ready_status(value: ConditionStatus) -> InferenceServiceStatus {
    let mut status = InferenceServiceStatus::default();
    status.set_condition(Condition::new("Ready", value, "Test", ""));
    status
}

pub fn conflict() -> Error {
    Error::from(kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: "the object has been modified".to_string(),
        reason: "Conflict".to_string(),
        code: 409,
    }))
}

// =============================================================================
// Store
// =============================================================================

/// Resource store backed by a map, counting reads and status writes
#[derive(Default)]
pub struct InMemoryStore {
    objects: Mutex<HashMap<ObjectKey, InferenceService>>,
    gets: AtomicUsize,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn with(isvc: InferenceService) -> Arc<Self> {
        let store = Self::default();
        store.insert(isvc);
        Arc::new(store)
    }

    pub fn insert(&self, isvc: InferenceService) {
        let key = ObjectKey::from_object(&isvc).unwrap();
        self.objects.lock().unwrap().insert(key, isvc);
    }

    pub fn remove(&self, key: &ObjectKey) {
        self.objects.lock().unwrap().remove(key);
    }

    pub fn status_of(&self, key: &ObjectKey) -> Option<InferenceServiceStatus> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .and_then(|o| o.status.clone())
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl InferenceServiceKubeClient for InMemoryStore {
    async fn get_inference_service(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<InferenceService>, Error> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(&ObjectKey::new(namespace, name))
            .cloned())
    }

    async fn update_status(&self, isvc: &InferenceService) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(conflict());
        }
        let key = ObjectKey::from_object(isvc)?;
        let mut objects = self.objects.lock().unwrap();
        let stored = objects
            .get_mut(&key)
            .ok_or_else(|| Error::internal("status write for missing object"))?;
        stored.status = isvc.status.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Reconcilers
// =============================================================================

/// Order in which scripted reconcilers ran
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

type Mutation = Box<dyn Fn(&mut InferenceService) + Send + Sync>;

/// Reconciler that records its call, applies a mutation, and optionally fails
pub struct ScriptedReconciler {
    label: &'static str,
    calls: CallLog,
    mutate: Option<Mutation>,
    failure: Option<String>,
}

impl ScriptedReconciler {
    pub fn new(label: &'static str, calls: &CallLog) -> Self {
        Self {
            label,
            calls: calls.clone(),
            mutate: None,
            failure: None,
        }
    }

    pub fn mutating(mut self, f: impl Fn(&mut InferenceService) + Send + Sync + 'static) -> Self {
        self.mutate = Some(Box::new(f));
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    fn run(&self, isvc: &mut InferenceService) -> Result<(), Error> {
        self.calls.lock().unwrap().push(self.label);
        if let Some(message) = &self.failure {
            return Err(Error::internal_with_context(self.label, message.clone()));
        }
        if let Some(mutate) = &self.mutate {
            mutate(isvc);
        }
        Ok(())
    }
}

#[async_trait]
impl ComponentReconciler for ScriptedReconciler {
    async fn reconcile(&self, isvc: &mut InferenceService) -> Result<(), Error> {
        self.run(isvc)
    }
}

#[async_trait]
impl IngressReconciler for ScriptedReconciler {
    async fn reconcile(&self, isvc: &mut InferenceService) -> Result<(), Error> {
        self.run(isvc)
    }
}

/// Mutation setting the `Ready` condition
pub fn set_ready(value: ConditionStatus) -> impl Fn(&mut InferenceService) + Send + Sync {
    move |isvc: &mut InferenceService| {
        isvc.status
            .get_or_insert_with(Default::default)
            .set_condition(Condition::new("Ready", value, "Test", ""));
    }
}

// =============================================================================
// Events
// =============================================================================

#[derive(Clone, Debug)]
pub struct RecordedEvent {
    pub type_: EventType,
    pub reason: String,
    pub action: String,
    pub note: Option<String>,
    pub object: Option<String>,
}

/// Event publisher that keeps everything it is given
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEvents {
    pub fn all(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.all().into_iter().map(|e| e.reason).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingEvents {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        self.events.lock().unwrap().push(RecordedEvent {
            type_,
            reason: reason.to_string(),
            action: action.to_string(),
            note,
            object: resource_ref.name.clone(),
        });
    }
}
