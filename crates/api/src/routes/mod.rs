//! API routes

pub mod domain_check;
pub mod domains;
pub mod health;
pub mod projects;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::routing::domain_middleware;
use crate::state::AppState;

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Edge gate: queried by the reverse proxy with ?domain=, resolves the
    // candidate host itself instead of the request's own Host header
    let edge_routes = Router::new().route("/domain-check", get(domain_check::domain_check));

    // Tenant-facing API, gated by the domain middleware: every request is
    // resolved to a tenant context (or rejected) exactly once, here
    let api_routes = Router::new()
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/:project_id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/projects/:project_id/custom-domain",
            post(domains::add_custom_domain).delete(domains::remove_domain),
        )
        .route(
            "/projects/:project_id/verify-domain",
            post(domains::verify_domain),
        )
        .route(
            "/projects/:project_id/custom-domain/instructions",
            get(domains::get_domain_instructions),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            domain_middleware,
        ));

    Router::new()
        .merge(health_routes)
        .merge(edge_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::Config;

    // A lazy pool never connects until a query runs, so every assertion
    // here must stay on paths that reject before reaching the store.
    fn test_state() -> AppState {
        let config = Config {
            bind_address: "127.0.0.1:0".to_string(),
            site_domain: "platform.io".to_string(),
            local_site_domain: "localhost".to_string(),
            api_subdomain: "api".to_string(),
            local_subdomain: "localhost".to_string(),
            debug: false,
            database_url: "postgres://unused".to_string(),
            database_max_connections: 1,
            provisioner_url: None,
            certificate_email: "ops@platform.io".to_string(),
            dns_query_timeout: Duration::from_secs(1),
            dns_total_timeout: Duration::from_secs(1),
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://unused")
            .unwrap();
        AppState::new(config, pool)
    }

    #[tokio::test]
    async fn test_liveness_is_served_outside_domain_middleware() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_hostless_api_request_is_rejected() {
        let app = create_router(test_state());

        // No Host and no X-Forwarded-Host: the domain middleware rejects
        // before any handler or store access
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/projects")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/nope")
                    .header("host", "api.platform.io")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
