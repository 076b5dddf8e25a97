//! Controller configuration
//!
//! Plain values; the operator binary fills them from CLI flags and env.

use std::time::Duration;

/// Default external domain for InferenceService URLs
pub const DEFAULT_INGRESS_DOMAIN: &str = "example.com";

/// Default cluster DNS domain used for component addresses
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

/// How the external URL of an InferenceService is formed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngressConfig {
    /// Domain suffix: `{name}.{namespace}.{domain}`
    pub domain: String,
    /// URL scheme, `http` or `https`
    pub url_scheme: String,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_INGRESS_DOMAIN.to_string(),
            url_scheme: "http".to_string(),
        }
    }
}

impl IngressConfig {
    /// External URL for an InferenceService
    pub fn url_for(&self, name: &str, namespace: &str) -> String {
        format!(
            "{}://{}.{}.{}",
            self.url_scheme, name, namespace, self.domain
        )
    }
}

/// Everything the controller context needs beyond its clients
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// External URL settings
    pub ingress: IngressConfig,
    /// Cluster DNS domain for component addresses
    pub cluster_domain: String,
    /// First requeue delay after a retryable failure
    pub error_requeue_base: Duration,
    /// Cap on the requeue delay
    pub error_requeue_max: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            ingress: IngressConfig::default(),
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
            error_requeue_base: Duration::from_secs(5),
            error_requeue_max: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_scheme_name_namespace_and_domain() {
        let config = IngressConfig {
            domain: "models.acme.io".to_string(),
            url_scheme: "https".to_string(),
        };
        assert_eq!(
            config.url_for("sklearn-iris", "team-a"),
            "https://sklearn-iris.team-a.models.acme.io"
        );
    }

    #[test]
    fn defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.ingress.domain, DEFAULT_INGRESS_DOMAIN);
        assert_eq!(config.cluster_domain, "cluster.local");
        assert!(config.error_requeue_base < config.error_requeue_max);
    }
}
