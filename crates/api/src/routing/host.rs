//! Host header parsing and classification
//!
//! Every inbound request carries an effective host that is either
//! subdomain-style (tenant1.hostplane.io) or a candidate custom domain
//! (mycompany.com). Classification is purely syntactic; tenant resolution
//! happens afterwards against the store.

use axum::http::HeaderMap;

/// How a normalized host is classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostClass {
    /// Host ends with a configured base domain and has enough labels to
    /// carry a leading subdomain.
    Subdomain { subdomain: String },
    /// Anything else is a candidate custom domain.
    CustomDomain,
}

/// A normalized host together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedHost {
    pub host: String,
    pub class: HostClass,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("No host could be determined from the request")]
    HostMissing,
}

/// Classifies hosts against the configured base domains.
#[derive(Debug, Clone)]
pub struct HostResolver {
    base_domains: Vec<String>,
    local_subdomain: String,
    debug: bool,
}

impl HostResolver {
    pub fn new(base_domains: Vec<String>, local_subdomain: String, debug: bool) -> Self {
        Self {
            base_domains,
            local_subdomain,
            debug,
        }
    }

    /// Determine the effective host from request headers and classify it.
    ///
    /// `X-Forwarded-Host` takes precedence over `Host` since the service may
    /// sit behind a reverse proxy.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<ClassifiedHost, HostError> {
        let host = host_from_headers(headers).ok_or(HostError::HostMissing)?;
        Ok(self.classify(&host))
    }

    /// Classify an already-normalized host.
    pub fn classify(&self, host: &str) -> ClassifiedHost {
        let host = normalize_host(host);

        // Debug-only escape hatch: a bare loopback host maps to the fixed
        // local alias subdomain so the API is testable without DNS. Never
        // active in production mode.
        if self.debug && is_loopback_host(&host) {
            return ClassifiedHost {
                host,
                class: HostClass::Subdomain {
                    subdomain: self.local_subdomain.clone(),
                },
            };
        }

        if host.split('.').count() >= 3 {
            for base in &self.base_domains {
                if let Some(prefix) = host.strip_suffix(&format!(".{base}")) {
                    // Leading label only; nested labels under the base
                    // domain still resolve by their first label.
                    let subdomain = prefix.split('.').next().unwrap_or(prefix).to_string();
                    return ClassifiedHost {
                        host,
                        class: HostClass::Subdomain { subdomain },
                    };
                }
            }
        }

        ClassifiedHost {
            host,
            class: HostClass::CustomDomain,
        }
    }
}

/// Extract the effective host from request headers, normalized.
pub fn host_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .and_then(|h| h.to_str().ok())?;

    let host = normalize_host(raw);
    if host.is_empty() {
        return None;
    }
    Some(host)
}

/// Normalize a host value: strip the port, lowercase.
pub fn normalize_host(host: &str) -> String {
    let host = host.split(':').next().unwrap_or(host);
    host.trim().to_lowercase()
}

fn is_loopback_host(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1" || host == "::1"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn resolver() -> HostResolver {
        HostResolver::new(
            vec!["platform.io".to_string(), "localhost".to_string()],
            "localhost".to_string(),
            false,
        )
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("Example.COM"), "example.com");
        assert_eq!(normalize_host("example.com:8080"), "example.com");
        assert_eq!(normalize_host("EXAMPLE.COM:443"), "example.com");
    }

    #[test]
    fn test_subdomain_style_hosts() {
        let r = resolver();
        assert_eq!(
            r.classify("tenant1.platform.io").class,
            HostClass::Subdomain {
                subdomain: "tenant1".to_string()
            }
        );
        assert_eq!(
            r.classify("API.platform.io:443").class,
            HostClass::Subdomain {
                subdomain: "api".to_string()
            }
        );
        // Nested labels still resolve by the first label
        assert_eq!(
            r.classify("a.b.platform.io").class,
            HostClass::Subdomain {
                subdomain: "a".to_string()
            }
        );
    }

    #[test]
    fn test_custom_domain_hosts() {
        let r = resolver();
        assert_eq!(r.classify("mycompany.com").class, HostClass::CustomDomain);
        assert_eq!(r.classify("mcp.mycompany.com").class, HostClass::CustomDomain);
        // The bare base domain has too few labels to carry a subdomain
        assert_eq!(r.classify("platform.io").class, HostClass::CustomDomain);
        // Suffix match must be label-aligned
        assert_eq!(r.classify("evilplatform.io").class, HostClass::CustomDomain);
    }

    #[test]
    fn test_debug_loopback_alias() {
        let debug = HostResolver::new(
            vec!["platform.io".to_string()],
            "localhost".to_string(),
            true,
        );
        assert_eq!(
            debug.classify("127.0.0.1:8000").class,
            HostClass::Subdomain {
                subdomain: "localhost".to_string()
            }
        );

        // Must not be reachable outside debug mode
        let prod = resolver();
        assert_eq!(prod.classify("127.0.0.1").class, HostClass::CustomDomain);
    }

    #[test]
    fn test_host_from_headers_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("internal:3000"));
        headers.insert(
            "x-forwarded-host",
            HeaderValue::from_static("Tenant1.Platform.IO:443"),
        );
        assert_eq!(
            host_from_headers(&headers),
            Some("tenant1.platform.io".to_string())
        );

        headers.remove("x-forwarded-host");
        assert_eq!(host_from_headers(&headers), Some("internal".to_string()));

        headers.remove("host");
        assert_eq!(host_from_headers(&headers), None);
    }
}
