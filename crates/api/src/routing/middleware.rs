//! Per-request domain resolution middleware
//!
//! The single enforcement point for multi-tenant isolation. Resolves the
//! effective host, looks up the tenant, and attaches the immutable
//! [`DomainContext`] as a request extension. Downstream handlers must use
//! that context; they are never trusted to re-derive the tenant from raw
//! headers.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::resolver::{DomainContext, ResolveError};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn domain_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let classified = match state.hosts.resolve(request.headers()) {
        Ok(classified) => classified,
        Err(_) => return ApiError::NotFound.into_response(),
    };

    debug!(host = %classified.host, "resolving request host");

    let context: DomainContext = match state.tenants.resolve(classified).await {
        Ok(context) => context,
        Err(ResolveError::TenantNotFound(host)) => {
            debug!(%host, "no tenant for host");
            return ApiError::NotFound.into_response();
        }
        Err(ResolveError::DomainNotVerified(host)) => {
            return ApiError::DomainNotVerified(host).into_response();
        }
        Err(ResolveError::Database(msg)) => {
            return ApiError::Database(msg).into_response();
        }
    };

    request.extensions_mut().insert(context);

    next.run(request).await
}
