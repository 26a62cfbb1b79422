//! Custom domain routes: attach, verify, remove, instructions

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::{verification_record_name, DomainLifecycle, VerifyOutcome};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::projects::get_project_or_404;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CustomDomainIn {
    pub custom_domain: String,
}

#[derive(Debug, Serialize)]
pub struct DomainVerificationOut {
    pub verification_token: String,
    pub verification_record_name: String,
    pub verification_record_value: String,
    pub instructions: String,
}

const INSTRUCTION_TEMPLATE: &str = "\
Add a TXT record to your DNS:
Name: {record_name}
Value: {token}
";

fn render_instructions(record_name: &str, token: &str) -> String {
    INSTRUCTION_TEMPLATE
        .replace("{record_name}", record_name)
        .replace("{token}", token)
}

// ============================================================================
// Route handlers
// ============================================================================

/// Attach a custom domain and return the DNS challenge to publish.
pub async fn add_custom_domain(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<CustomDomainIn>,
) -> ApiResult<Json<DomainVerificationOut>> {
    let project = get_project_or_404(&state.pool, project_id).await?;

    let lifecycle = DomainLifecycle::new(&state);
    let outcome = lifecycle.attach(&project, &body.custom_domain).await?;

    let instructions = render_instructions(
        &outcome.verification_record_name,
        &outcome.verification_token,
    );

    Ok(Json(DomainVerificationOut {
        verification_record_value: outcome.verification_token.clone(),
        verification_token: outcome.verification_token,
        verification_record_name: outcome.verification_record_name,
        instructions,
    }))
}

/// Run the DNS challenge for the project's pending domain.
pub async fn verify_domain(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = get_project_or_404(&state.pool, project_id).await?;

    let lifecycle = DomainLifecycle::new(&state);

    match lifecycle.verify(&project).await? {
        VerifyOutcome::Verified {
            domain,
            configured,
            message,
        } => Ok(Json(json!({
            "verified": true,
            "domain": domain,
            "message": format!("Domain {domain} has been successfully verified!"),
            "configured": configured,
            "configuration_message": message,
        }))),
        VerifyOutcome::Pending {
            domain,
            verification_token,
            record_name,
        } => Ok(Json(json!({
            "verified": false,
            "domain": domain,
            "message": format!(
                "Domain {domain} verification failed. Please check your DNS records."
            ),
            "verification_token": verification_token,
            "record_name": record_name,
        }))),
    }
}

/// Remove the custom domain. Idempotent: succeeds even when nothing is
/// attached.
pub async fn remove_domain(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = get_project_or_404(&state.pool, project_id).await?;

    let lifecycle = DomainLifecycle::new(&state);

    let detail = match lifecycle.remove(&project).await? {
        Some(domain) => format!("Custom domain {domain} has been removed successfully"),
        None => "No custom domain was attached".to_string(),
    };

    Ok(Json(json!({ "detail": detail })))
}

/// Re-derive verification instructions from the stored token.
pub async fn get_domain_instructions(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = get_project_or_404(&state.pool, project_id).await?;

    let subdomain = project.subdomain.clone().ok_or_else(|| {
        ApiError::BadRequest("No subdomain associated with this project".to_string())
    })?;

    let (domain, token) = match (&project.custom_domain, &project.domain_verification_token) {
        (Some(domain), Some(token)) => (domain.clone(), token.clone()),
        _ => {
            return Err(ApiError::BadRequest(
                "No custom domain or verification token found for this project".to_string(),
            ))
        }
    };

    let record_name = verification_record_name(&domain);
    let platform_host = format!("{subdomain}.{}", state.config.site_domain);

    Ok(Json(json!({
        "project_id": project.id,
        "project_title": project.title,
        "verification_status": project.domain_state(),
        "domain": domain,
        "record_name": record_name,
        "record_value": token,
        "platform_host": platform_host,
        "instructions": render_instructions(&record_name, &token),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_carry_record_and_token() {
        let text = render_instructions("_domain-verification.example.org", "abc123");
        assert!(text.contains("Name: _domain-verification.example.org"));
        assert!(text.contains("Value: abc123"));
        assert!(!text.contains("{record_name}"));
        assert!(!text.contains("{token}"));
    }
}
