//! Application configuration

use std::env;
use std::time::Duration;

/// Hard ceiling on provisioning attempts per domain. Exceeding it is a
/// terminal failure that requires operator intervention.
pub const MAX_CONFIGURE_RETRIES: i32 = 3;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    /// The platform's own site domain, e.g. "hostplane.io" for
    /// *.hostplane.io routing.
    pub site_domain: String,
    /// Local-development alias base domain, so subdomain-style hosts work
    /// without real DNS (e.g. tenant1.localhost).
    pub local_site_domain: String,
    /// Reserved subdomain that bypasses tenant lookup (API-only context).
    pub api_subdomain: String,
    /// Fixed alias a bare loopback host resolves to in debug mode.
    pub local_subdomain: String,
    pub debug: bool,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Provisioner service (privileged, internal network only)
    pub provisioner_url: Option<String>,
    /// Contact address passed to the certificate authority on configure.
    pub certificate_email: String,

    // DNS verification
    pub dns_query_timeout: Duration,
    pub dns_total_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            site_domain: {
                let domain = env::var("SITE_DOMAIN").map_err(|_| ConfigError::Missing("SITE_DOMAIN"))?;
                if domain.is_empty() || domain.contains('/') || domain.contains(':') {
                    return Err(ConfigError::Invalid(
                        "SITE_DOMAIN must be a bare domain name (no scheme or port)",
                    ));
                }
                domain.to_lowercase()
            },
            local_site_domain: env::var("LOCAL_SITE_DOMAIN")
                .unwrap_or_else(|_| "localhost".to_string())
                .to_lowercase(),
            api_subdomain: env::var("API_SUBDOMAIN")
                .unwrap_or_else(|_| "api".to_string())
                .to_lowercase(),
            local_subdomain: env::var("LOCAL_SUBDOMAIN")
                .unwrap_or_else(|_| "localhost".to_string())
                .to_lowercase(),
            debug: env::var("DEBUG")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),

            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            provisioner_url: env::var("PROVISIONER_URL").ok().filter(|u| !u.is_empty()),
            certificate_email: env::var("CERTIFICATE_EMAIL")
                .unwrap_or_else(|_| "admin@localhost".to_string()),

            dns_query_timeout: Duration::from_secs(
                env::var("DNS_QUERY_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            ),
            dns_total_timeout: Duration::from_secs(
                env::var("DNS_TOTAL_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .unwrap_or(15),
            ),
        })
    }

    /// Base domains a subdomain-style host may end with.
    pub fn base_domains(&self) -> [&str; 2] {
        [self.site_domain.as_str(), self.local_site_domain.as_str()]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure config tests run serially (they modify shared env vars)
    static CONFIG_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn setup_minimal_config() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var("SITE_DOMAIN", "hostplane.io");
    }

    fn cleanup_config() {
        env::remove_var("DATABASE_URL");
        env::remove_var("SITE_DOMAIN");
        env::remove_var("PROVISIONER_URL");
        env::remove_var("DEBUG");
    }

    #[test]
    fn test_config_validation() {
        let _lock = CONFIG_TEST_MUTEX.lock().unwrap();

        // === Missing SITE_DOMAIN ===
        env::set_var("DATABASE_URL", "postgres://test");
        env::remove_var("SITE_DOMAIN");
        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::Missing("SITE_DOMAIN"))));

        // === SITE_DOMAIN with scheme rejected ===
        env::set_var("SITE_DOMAIN", "https://hostplane.io");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));

        // === SITE_DOMAIN with port rejected ===
        env::set_var("SITE_DOMAIN", "hostplane.io:8000");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));

        // === Valid config, defaults applied ===
        setup_minimal_config();
        let config = Config::from_env().unwrap();
        assert_eq!(config.site_domain, "hostplane.io");
        assert_eq!(config.local_site_domain, "localhost");
        assert_eq!(config.api_subdomain, "api");
        assert!(!config.debug);
        assert!(config.provisioner_url.is_none());
        assert_eq!(config.dns_query_timeout, Duration::from_secs(10));
        assert_eq!(config.dns_total_timeout, Duration::from_secs(15));
        assert_eq!(
            config.base_domains(),
            ["hostplane.io", "localhost"]
        );

        // === SITE_DOMAIN lowercased ===
        env::set_var("SITE_DOMAIN", "HostPlane.IO");
        let config = Config::from_env().unwrap();
        assert_eq!(config.site_domain, "hostplane.io");

        // === Empty PROVISIONER_URL treated as unset ===
        setup_minimal_config();
        env::set_var("PROVISIONER_URL", "");
        let config = Config::from_env().unwrap();
        assert!(config.provisioner_url.is_none());

        cleanup_config();
    }
}
