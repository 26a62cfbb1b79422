//! Client for the privileged provisioner service
//!
//! The provisioner configures reverse-proxy routing and TLS for verified
//! custom domains. It runs as a separate, privilege-isolated service on an
//! internal network boundary; this client is the only way the control plane
//! reaches it.

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use hostplane_shared::{ConfigureDomainRequest, RemoveDomainRequest, ScriptResult};

/// The underlying script may take up to its own 180s limit; leave headroom
/// for transport overhead.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(200);

/// Client for the provisioner service endpoints.
#[derive(Clone)]
pub struct ProvisionerClient {
    client: Client,
    base_url: String,
}

impl ProvisionerClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from config, returns None if not configured
    pub fn from_config(provisioner_url: Option<String>) -> Option<Self> {
        match provisioner_url {
            Some(url) if !url.is_empty() => Some(Self::new(url)),
            _ => {
                warn!("Provisioner not configured - custom domains will require manual routing/TLS setup");
                None
            }
        }
    }

    /// Configure routing and TLS for a verified custom domain.
    pub async fn configure(&self, custom_domain: &str, email: &str) -> Result<ScriptResult, String> {
        let request = ConfigureDomainRequest {
            custom_domain: custom_domain.to_string(),
            email: email.to_string(),
        };

        self.post("/configure-custom-domain", &request).await
    }

    /// Tear down routing and TLS configuration for a removed domain.
    pub async fn remove(&self, custom_domain: &str) -> Result<ScriptResult, String> {
        let request = RemoveDomainRequest {
            custom_domain: custom_domain.to_string(),
        };

        self.post("/remove-custom-domain", &request).await
    }

    async fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<ScriptResult, String> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("Provisioner request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Provisioner returned HTTP {status}: {body}"));
        }

        response
            .json::<ScriptResult>()
            .await
            .map_err(|e| format!("Invalid provisioner response: {e}"))
    }
}
