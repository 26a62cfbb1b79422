//! Project CRUD routes

use axum::{
    extract::{Extension, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use hostplane_shared::ProjectRecord;

use crate::error::{ApiError, ApiResult};
use crate::routing::{DomainContext, DomainKind};
use crate::state::AppState;
use crate::subdomain;

// ============================================================================
// Types
// ============================================================================

/// API shape for a project
#[derive(Debug, Serialize)]
pub struct ProjectOut {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub subdomain: Option<String>,
    pub custom_domain: Option<String>,
    pub is_verified: bool,
    pub is_configured: bool,
    pub ssl_enabled: bool,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<ProjectRecord> for ProjectOut {
    fn from(record: ProjectRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            subdomain: record.subdomain,
            custom_domain: record.custom_domain,
            is_verified: record.is_verified,
            is_configured: record.is_configured,
            ssl_enabled: record.ssl_enabled,
            is_active: record.is_active,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectIn {
    pub title: String,
    pub description: Option<String>,
    /// Optional user-supplied subdomain; auto-generated when absent.
    pub subdomain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subdomain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectListOut {
    pub results: Vec<ProjectOut>,
}

// ============================================================================
// Header overrides
// ============================================================================

/// Explicit tenant override for non-host-based clients.
pub fn subdomain_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-subdomain")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

pub fn custom_domain_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-custom-domain")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

// ============================================================================
// Helpers
// ============================================================================

pub async fn get_project_or_404(pool: &PgPool, project_id: Uuid) -> ApiResult<ProjectRecord> {
    let project: Option<ProjectRecord> = sqlx::query_as("SELECT * FROM projects WHERE id = $1")
        .bind(project_id)
        .fetch_optional(pool)
        .await?;

    project.ok_or(ApiError::NotFound)
}

/// Tenant isolation: a request that arrived on a tenant's host may only
/// touch that tenant's project. Requests on the API alias are unscoped.
fn check_tenant_scope(context: &DomainContext, project: &ProjectRecord) -> ApiResult<()> {
    if let Some(resolved) = &context.project {
        if resolved.id != project.id {
            return Err(ApiError::NotFound);
        }
    }
    Ok(())
}

// ============================================================================
// Route handlers
// ============================================================================

/// List projects, optionally filtered by subdomain or custom domain.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(context): Extension<DomainContext>,
    headers: HeaderMap,
) -> ApiResult<Json<ProjectListOut>> {
    // Explicit header overrides win; otherwise fall back to the host the
    // request was resolved on
    let subdomain_filter = subdomain_from_headers(&headers).or_else(|| match context.kind {
        DomainKind::Subdomain => context.subdomain.clone(),
        _ => None,
    });
    let custom_domain_filter = custom_domain_from_headers(&headers).or_else(|| match context.kind {
        DomainKind::CustomDomain => Some(context.host.clone()),
        _ => None,
    });

    let rows: Vec<ProjectRecord> = if let Some(subdomain) = subdomain_filter {
        sqlx::query_as("SELECT * FROM projects WHERE subdomain = $1 ORDER BY created_at DESC")
            .bind(subdomain)
            .fetch_all(&state.pool)
            .await?
    } else if let Some(custom_domain) = custom_domain_filter {
        sqlx::query_as("SELECT * FROM projects WHERE custom_domain = $1 ORDER BY created_at DESC")
            .bind(custom_domain)
            .fetch_all(&state.pool)
            .await?
    } else {
        sqlx::query_as("SELECT * FROM projects ORDER BY created_at DESC")
            .fetch_all(&state.pool)
            .await?
    };

    Ok(Json(ProjectListOut {
        results: rows.into_iter().map(Into::into).collect(),
    }))
}

/// Create a project with a validated or platform-assigned subdomain.
pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<ProjectIn>,
) -> ApiResult<(StatusCode, Json<ProjectOut>)> {
    let title = body.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation("Title must not be empty".to_string()));
    }

    let subdomain = match body.subdomain {
        Some(requested) => {
            let requested = requested.trim().to_lowercase();
            if !subdomain::is_valid_subdomain(&requested) {
                return Err(ApiError::Validation(format!(
                    "Subdomain '{requested}' is not valid or is reserved"
                )));
            }
            if !subdomain::is_subdomain_available(&state.pool, &requested).await? {
                return Err(ApiError::Conflict(format!(
                    "Subdomain '{requested}' is already taken."
                )));
            }
            requested
        }
        None => subdomain::generate_subdomain(&state.pool).await?,
    };

    // The unique indexes on title and subdomain settle any race the checks
    // above missed; 23505 surfaces as Conflict
    let record: ProjectRecord = sqlx::query_as(
        r#"
        INSERT INTO projects (title, description, subdomain, is_active)
        VALUES ($1, $2, $3, TRUE)
        RETURNING *
        "#,
    )
    .bind(&title)
    .bind(&body.description)
    .bind(&subdomain)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Get a project by id
pub async fn get_project(
    State(state): State<AppState>,
    Extension(context): Extension<DomainContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectOut>> {
    let project = get_project_or_404(&state.pool, project_id).await?;
    check_tenant_scope(&context, &project)?;
    Ok(Json(project.into()))
}

/// Partially update a project
pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<ProjectUpdate>,
) -> ApiResult<Json<ProjectOut>> {
    // Existence check keeps update errors distinct from unknown ids
    let _ = get_project_or_404(&state.pool, project_id).await?;

    if let Some(subdomain) = &body.subdomain {
        if !subdomain::is_valid_subdomain(subdomain) {
            return Err(ApiError::Validation(format!(
                "Subdomain '{subdomain}' is not valid or is reserved"
            )));
        }
    }

    let record: ProjectRecord = sqlx::query_as(
        r#"
        UPDATE projects
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            subdomain = COALESCE($4, subdomain),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(project_id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(&body.subdomain)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(record.into()))
}

/// Delete a project
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(context): Extension<DomainContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = get_project_or_404(&state.pool, project_id).await?;
    check_tenant_scope(&context, &project)?;

    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(project_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }

    Ok(Json(json!({ "detail": "Project deleted successfully" })))
}
