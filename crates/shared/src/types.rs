//! Tenant record types shared across Hostplane services.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// One hosted project: identity plus domain-binding state.
///
/// `subdomain` and `custom_domain` each carry a store-level unique index;
/// the database, not this type, is the final arbiter of uniqueness.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub subdomain: Option<String>,
    pub custom_domain: Option<String>,
    pub domain_verification_token: Option<String>,
    pub domain_verified_at: Option<OffsetDateTime>,
    pub is_verified: bool,
    pub is_configured: bool,
    pub configure_retry_count: i32,
    pub is_active: bool,
    pub ssl_enabled: bool,
    pub ssl_certificate_path: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Where a project sits in the custom-domain lifecycle.
///
/// Exactly one of these holds at any time: no domain attached, a domain
/// attached awaiting DNS proof, or a domain with verified ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainState {
    None,
    Pending,
    Verified,
}

impl ProjectRecord {
    pub fn domain_state(&self) -> DomainState {
        match (&self.custom_domain, self.is_verified) {
            (None, _) => DomainState::None,
            (Some(_), false) => DomainState::Pending,
            (Some(_), true) => DomainState::Verified,
        }
    }
}
