//! Edge gate for static file serving
//!
//! The reverse proxy in front of the static file tier asks this endpoint
//! whether a host should be served: 200 when the host resolves to an active
//! (and, for custom domains, verified) tenant, 403 otherwise.

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiResult;
use crate::routing::HostClass;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DomainCheckParams {
    pub domain: Option<String>,
}

pub async fn domain_check(
    State(state): State<AppState>,
    Query(params): Query<DomainCheckParams>,
) -> ApiResult<StatusCode> {
    let Some(domain) = params.domain.filter(|d| !d.is_empty()) else {
        return Ok(StatusCode::FORBIDDEN);
    };

    info!(%domain, "checking domain for edge serving");

    let classified = state.hosts.classify(&domain);

    let allowed: bool = match classified.class {
        HostClass::Subdomain { subdomain } => {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE subdomain = $1 AND is_active = TRUE)",
            )
            .bind(&subdomain)
            .fetch_one(&state.pool)
            .await?
        }
        HostClass::CustomDomain => {
            // Unverified custom domains never reach the static tier
            sqlx::query_scalar(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM projects
                    WHERE custom_domain = $1 AND is_active = TRUE AND is_verified = TRUE
                )
                "#,
            )
            .bind(&classified.host)
            .fetch_one(&state.pool)
            .await?
        }
    };

    Ok(if allowed {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    })
}
