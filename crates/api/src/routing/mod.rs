//! Host-based tenant routing
//!
//! Resolves incoming Host headers to tenant projects:
//! - Subdomain-style hosts: tenant1.hostplane.io
//! - Custom domains: mycompany.com (verified ownership required)
//! - The reserved API alias: api.hostplane.io (no tenant attached)

mod host;
mod middleware;
mod resolver;

pub use host::{host_from_headers, normalize_host, ClassifiedHost, HostClass, HostError, HostResolver};
pub use middleware::domain_middleware;
pub use resolver::{DomainContext, DomainKind, ResolveError, TenantLookup};
