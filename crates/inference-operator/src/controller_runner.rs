//! Controller runner - wires the InferenceService controller to the cluster

use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client};

use inference_common::crd::InferenceService;
use inference_service::{error_policy, reconcile, ControllerConfig, InferenceServiceContext};

/// Watcher timeout (seconds) - must be less than client read_timeout (30s)
/// This forces the API server to close the watch before the client times out,
/// preventing "body read timed out" errors on idle watches.
const WATCH_TIMEOUT_SECS: u32 = 25;

/// Scope the controller's watches to one namespace or the whole cluster
fn scoped_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    <K as kube::Resource>::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

/// Run the InferenceService controller until a shutdown signal arrives
///
/// Deployments owned by an InferenceService retrigger their owner, so
/// component readiness changes are picked up without polling.
pub async fn run_inference_service_controller(
    client: Client,
    config: ControllerConfig,
    watch_namespace: Option<String>,
) {
    let ctx = Arc::new(InferenceServiceContext::from_client(client.clone(), &config));
    let services: Api<InferenceService> = scoped_api(client.clone(), watch_namespace.as_deref());
    let deployments: Api<Deployment> = scoped_api(client, watch_namespace.as_deref());

    tracing::info!("- InferenceService controller");

    Controller::new(
        services,
        WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS),
    )
    .owns(
        deployments,
        WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS),
    )
    .shutdown_on_signal()
    .run(reconcile, error_policy, ctx)
    .for_each(log_reconcile_result("InferenceService"))
    .await;
}

fn log_reconcile_result<T: std::fmt::Debug, E: std::fmt::Debug>(
    controller_name: &'static str,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(action) => tracing::debug!(?action, "{} reconciliation completed", controller_name),
            Err(e) => tracing::error!(error = ?e, "{} reconciliation error", controller_name),
        }
        std::future::ready(())
    }
}
