//! InferenceService operator - runs the InferenceService controller

mod controller_runner;
mod crds;

use std::time::Duration;

use clap::{Parser, Subcommand};
use kube::{Client, CustomResourceExt};

use inference_common::crd::InferenceService;
use inference_common::telemetry::{init_telemetry, TelemetryConfig};
use inference_service::config::{DEFAULT_CLUSTER_DOMAIN, DEFAULT_INGRESS_DOMAIN};
use inference_service::{ControllerConfig, IngressConfig};

/// InferenceService operator - reconciles model serving topologies
#[derive(Parser, Debug)]
#[command(name = "inference-operator", version, about, long_about = None)]
struct Cli {
    /// Generate the CRD manifest and exit
    #[arg(long)]
    crd: bool,

    /// Domain suffix for external InferenceService URLs
    #[arg(long, env = "INGRESS_DOMAIN", default_value = DEFAULT_INGRESS_DOMAIN)]
    ingress_domain: String,

    /// Scheme for external InferenceService URLs
    #[arg(long, env = "INGRESS_URL_SCHEME", default_value = "http", value_parser = ["http", "https"])]
    url_scheme: String,

    /// Cluster DNS domain used in component addresses
    #[arg(long, env = "CLUSTER_DOMAIN", default_value = DEFAULT_CLUSTER_DOMAIN)]
    cluster_domain: String,

    /// Only watch this namespace (all namespaces when unset)
    #[arg(long, env = "WATCH_NAMESPACE")]
    watch_namespace: Option<String>,

    /// First requeue delay after a retryable failure
    #[arg(long, default_value_t = 5)]
    error_requeue_base_secs: u64,

    /// Cap on the requeue delay after repeated failures
    #[arg(long, default_value_t = 300)]
    error_requeue_max_secs: u64,

    /// Human-readable logs instead of JSON
    #[arg(long, env = "LOG_TEXT")]
    log_text: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the controller (default mode)
    Controller,
}

impl Cli {
    fn controller_config(&self) -> anyhow::Result<ControllerConfig> {
        if self.ingress_domain.trim().is_empty() {
            anyhow::bail!("--ingress-domain must not be empty");
        }
        if self.error_requeue_base_secs == 0
            || self.error_requeue_base_secs > self.error_requeue_max_secs
        {
            anyhow::bail!(
                "--error-requeue-base-secs must be between 1 and --error-requeue-max-secs ({})",
                self.error_requeue_max_secs
            );
        }

        Ok(ControllerConfig {
            ingress: IngressConfig {
                domain: self.ingress_domain.clone(),
                url_scheme: self.url_scheme.clone(),
            },
            cluster_domain: self.cluster_domain.clone(),
            error_requeue_base: Duration::from_secs(self.error_requeue_base_secs),
            error_requeue_max: Duration::from_secs(self.error_requeue_max_secs),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!("CRITICAL: failed to install crypto provider: {:?}", e);
        std::process::exit(1);
    }

    let cli = Cli::parse();

    if cli.crd {
        let crd = serde_yaml::to_string(&InferenceService::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    init_telemetry(TelemetryConfig {
        json: !cli.log_text,
        ..Default::default()
    })?;

    let config = cli.controller_config()?;

    match cli.command {
        Some(Commands::Controller) | None => run_controller(config, cli.watch_namespace).await,
    }
}

async fn run_controller(
    config: ControllerConfig,
    watch_namespace: Option<String>,
) -> anyhow::Result<()> {
    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("failed to create Kubernetes client: {}", e))?;

    crds::ensure_crds(&client).await?;

    tracing::info!(
        ingress_domain = %config.ingress.domain,
        namespace = watch_namespace.as_deref().unwrap_or("<all>"),
        "starting InferenceService controller"
    );

    controller_runner::run_inference_service_controller(client, config, watch_namespace).await;

    tracing::info!("controller stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["inference-operator"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_build_a_controller_config() {
        let cli = parse(&[]);
        assert!(!cli.crd);
        assert!(cli.command.is_none());

        let config = cli.controller_config().unwrap();
        assert_eq!(config.ingress, IngressConfig::default());
        assert_eq!(config.cluster_domain, DEFAULT_CLUSTER_DOMAIN);
        assert_eq!(config.error_requeue_base, Duration::from_secs(5));
        assert_eq!(config.error_requeue_max, Duration::from_secs(300));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--ingress-domain",
            "models.acme.io",
            "--url-scheme",
            "https",
            "--watch-namespace",
            "team-a",
            "--error-requeue-base-secs",
            "2",
            "controller",
        ]);

        assert!(matches!(cli.command, Some(Commands::Controller)));
        assert_eq!(cli.watch_namespace.as_deref(), Some("team-a"));
        let config = cli.controller_config().unwrap();
        assert_eq!(
            config.ingress.url_for("sklearn", "team-a"),
            "https://sklearn.team-a.models.acme.io"
        );
        assert_eq!(config.error_requeue_base, Duration::from_secs(2));
    }

    #[test]
    fn unknown_url_scheme_is_rejected() {
        assert!(Cli::try_parse_from(["inference-operator", "--url-scheme", "ftp"]).is_err());
    }

    #[test]
    fn inconsistent_requeue_bounds_are_rejected() {
        let cli = parse(&[
            "--error-requeue-base-secs",
            "600",
            "--error-requeue-max-secs",
            "60",
        ]);
        assert!(cli.controller_config().is_err());

        let cli = parse(&["--ingress-domain", " "]);
        assert!(cli.controller_config().is_err());
    }

    #[test]
    fn crd_flag_renders_yaml() {
        let cli = parse(&["--crd"]);
        assert!(cli.crd);

        let yaml = serde_yaml::to_string(&InferenceService::crd()).unwrap();
        assert!(yaml.contains("inferenceservices.serving.kubeflow.org"));
        assert!(yaml.contains("isvc"));
    }
}
