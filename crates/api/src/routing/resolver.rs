//! Classified host to tenant resolution
//!
//! Looks up the tenant record behind a classified host. This is the only
//! place a host is turned into a tenant; downstream handlers consume the
//! resulting [`DomainContext`] and never re-derive it from raw headers.

use sqlx::PgPool;

use hostplane_shared::ProjectRecord;

use super::host::{ClassifiedHost, HostClass};
use crate::config::Config;
use crate::subdomain;

/// What kind of host the request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainKind {
    /// The platform's reserved API alias; no tenant attached.
    ApiSubdomain,
    Subdomain,
    CustomDomain,
}

/// Immutable per-request resolution result, attached once by the domain
/// middleware.
#[derive(Debug, Clone)]
pub struct DomainContext {
    pub host: String,
    pub kind: DomainKind,
    pub subdomain: Option<String>,
    pub project: Option<ProjectRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("No tenant found for host: {0}")]
    TenantNotFound(String),
    #[error("Custom domain {0} is not verified")]
    DomainNotVerified(String),
    #[error("Database error: {0}")]
    Database(String),
}

/// Resolves classified hosts to tenant records via the store.
#[derive(Clone)]
pub struct TenantLookup {
    pool: PgPool,
    api_subdomain: String,
    local_subdomain: String,
    debug: bool,
}

impl TenantLookup {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self {
            pool,
            api_subdomain: config.api_subdomain.clone(),
            local_subdomain: config.local_subdomain.clone(),
            debug: config.debug,
        }
    }

    pub async fn resolve(&self, classified: ClassifiedHost) -> Result<DomainContext, ResolveError> {
        match classified.class {
            HostClass::Subdomain { subdomain } => {
                self.resolve_subdomain(classified.host, subdomain).await
            }
            HostClass::CustomDomain => self.resolve_custom_domain(classified.host).await,
        }
    }

    async fn resolve_subdomain(
        &self,
        host: String,
        subdomain: String,
    ) -> Result<DomainContext, ResolveError> {
        // The API alias bypasses tenant lookup entirely
        if subdomain == self.api_subdomain {
            return Ok(DomainContext {
                host,
                kind: DomainKind::ApiSubdomain,
                subdomain: Some(subdomain),
                project: None,
            });
        }

        // The debug local alias behaves like the API alias so local
        // requests work without a seeded tenant
        if self.debug && subdomain == self.local_subdomain {
            return Ok(DomainContext {
                host,
                kind: DomainKind::ApiSubdomain,
                subdomain: Some(subdomain),
                project: None,
            });
        }

        // Reserved or malformed labels can never resolve to a tenant
        if !subdomain::is_valid_subdomain(&subdomain) {
            return Err(ResolveError::TenantNotFound(host));
        }

        let project: Option<ProjectRecord> = sqlx::query_as(
            "SELECT * FROM projects WHERE subdomain = $1 AND is_active = TRUE",
        )
        .bind(&subdomain)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ResolveError::Database(e.to_string()))?;

        match project {
            Some(project) => Ok(DomainContext {
                host,
                kind: DomainKind::Subdomain,
                subdomain: Some(subdomain),
                project: Some(project),
            }),
            None => Err(ResolveError::TenantNotFound(host)),
        }
    }

    async fn resolve_custom_domain(&self, host: String) -> Result<DomainContext, ResolveError> {
        let project: Option<ProjectRecord> = sqlx::query_as(
            "SELECT * FROM projects WHERE custom_domain = $1 AND is_active = TRUE",
        )
        .bind(&host)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ResolveError::Database(e.to_string()))?;

        let project = project.ok_or_else(|| ResolveError::TenantNotFound(host.clone()))?;

        // An unverified match is a distinct rejection, not a generic
        // not-found: the operator needs to know the domain is recognized
        // but not yet trusted.
        if !project.is_verified {
            return Err(ResolveError::DomainNotVerified(host));
        }

        Ok(DomainContext {
            host,
            kind: DomainKind::CustomDomain,
            subdomain: None,
            project: Some(project),
        })
    }
}
