//! Custom domain lifecycle: attach, verify, remove
//!
//! State machine per tenant: no domain -> pending (attach) -> verified
//! (verify success); pending or verified -> none (remove). A failed verify
//! leaves the pending state untouched.

use rand::Rng;
use sqlx::PgPool;
use tracing::{error, info, warn};

use hostplane_shared::ProjectRecord;

use super::dns::{verification_record_name, DnsVerifier};
use super::provisioner::ProvisionerClient;
use crate::config::MAX_CONFIGURE_RETRIES;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Result of attaching a domain: what the tenant must publish via DNS.
#[derive(Debug, Clone)]
pub struct AttachOutcome {
    pub domain: String,
    pub verification_token: String,
    pub verification_record_name: String,
}

/// Result of a verification attempt.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    Verified {
        domain: String,
        configured: bool,
        message: String,
    },
    /// DNS did not match; state is unchanged and the caller gets the
    /// expected record back so it can retry after propagation.
    Pending {
        domain: String,
        verification_token: String,
        record_name: String,
    },
}

/// Orchestrates the attach/verify/remove state machine.
#[derive(Clone)]
pub struct DomainLifecycle {
    pool: PgPool,
    dns: DnsVerifier,
    provisioner: Option<ProvisionerClient>,
    certificate_email: String,
}

impl DomainLifecycle {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            dns: state.dns.clone(),
            provisioner: state.provisioner.clone(),
            certificate_email: state.config.certificate_email.clone(),
        }
    }

    /// Attach a custom domain to a project and issue a verification token.
    ///
    /// Resets all verification and provisioning state; the previous token,
    /// if any, stops being authoritative.
    pub async fn attach(&self, project: &ProjectRecord, raw_domain: &str) -> ApiResult<AttachOutcome> {
        let domain = sanitize_custom_domain(raw_domain)
            .ok_or_else(|| ApiError::Validation("Custom domain is not valid".to_string()))?;

        // Advisory pre-check; the unique index catches the race at write time
        let taken_by_other: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE custom_domain = $1 AND id != $2)",
        )
        .bind(&domain)
        .bind(project.id)
        .fetch_one(&self.pool)
        .await?;

        if taken_by_other {
            return Err(ApiError::Conflict(format!(
                "Custom domain '{domain}' is already taken."
            )));
        }

        let token = generate_verification_token();

        sqlx::query(
            r#"
            UPDATE projects
            SET custom_domain = $1,
                domain_verification_token = $2,
                is_verified = FALSE,
                domain_verified_at = NULL,
                is_configured = FALSE,
                configure_retry_count = 0,
                ssl_enabled = FALSE,
                ssl_certificate_path = NULL,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(&domain)
        .bind(&token)
        .bind(project.id)
        .execute(&self.pool)
        .await?;

        info!(project_id = %project.id, %domain, "custom domain attached, verification pending");

        Ok(AttachOutcome {
            verification_record_name: verification_record_name(&domain),
            domain,
            verification_token: token,
        })
    }

    /// Run the DNS challenge for a pending domain; on success mark the
    /// domain verified and trigger provisioning.
    ///
    /// Re-invoking on an already-verified but unconfigured domain is the
    /// explicit client-triggered provisioning retry, bounded by
    /// `MAX_CONFIGURE_RETRIES`.
    pub async fn verify(&self, project: &ProjectRecord) -> ApiResult<VerifyOutcome> {
        let domain = project
            .custom_domain
            .clone()
            .ok_or_else(|| ApiError::BadRequest("No custom domain found for this project".to_string()))?;

        if project.is_verified {
            let (configured, message) = if project.is_configured {
                (true, "Domain configuration is valid.".to_string())
            } else {
                self.try_configure(project, &domain).await?
            };

            return Ok(VerifyOutcome::Verified {
                domain,
                configured,
                message,
            });
        }

        let token = project.domain_verification_token.clone().ok_or_else(|| {
            ApiError::BadRequest("No verification token found for this project".to_string())
        })?;

        let record_name = verification_record_name(&domain);
        let outcome = self.dns.check_txt(&record_name, &token).await;

        if !outcome.is_match() {
            // Timeouts and mismatches read the same to the caller: wait for
            // propagation and retry. Logs carry the distinction.
            info!(project_id = %project.id, %domain, ?outcome, "domain verification pending");
            return Ok(VerifyOutcome::Pending {
                domain,
                verification_token: token,
                record_name,
            });
        }

        sqlx::query(
            r#"
            UPDATE projects
            SET is_verified = TRUE,
                domain_verified_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(project.id)
        .execute(&self.pool)
        .await?;

        info!(project_id = %project.id, %domain, "custom domain verified");

        // Provisioning failure never rolls back verification; it only
        // affects is_configured and the retry counter.
        let (configured, message) = self.try_configure(project, &domain).await?;

        Ok(VerifyOutcome::Verified {
            domain,
            configured,
            message,
        })
    }

    /// Remove the custom domain and tear down its provisioning.
    ///
    /// Idempotent: removing when nothing is attached is a no-op success.
    /// Returns the removed domain, if there was one.
    pub async fn remove(&self, project: &ProjectRecord) -> ApiResult<Option<String>> {
        let Some(domain) = project.custom_domain.clone() else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE projects
            SET custom_domain = NULL,
                domain_verification_token = NULL,
                is_verified = FALSE,
                domain_verified_at = NULL,
                is_configured = FALSE,
                configure_retry_count = 0,
                ssl_enabled = FALSE,
                ssl_certificate_path = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(project.id)
        .execute(&self.pool)
        .await?;

        // Teardown is best-effort: the domain is already released in the
        // store, and the deprovision script tolerates missing config.
        if let Some(provisioner) = &self.provisioner {
            match provisioner.remove(&domain).await {
                Ok(result) if result.is_success() => {
                    info!(project_id = %project.id, %domain, "domain deprovisioned");
                }
                Ok(result) => {
                    warn!(project_id = %project.id, %domain, diagnostic = %result.diagnostic(),
                        "deprovision script failed");
                }
                Err(err) => {
                    error!(project_id = %project.id, %domain, error = %err,
                        "deprovision request failed");
                }
            }
        }

        info!(project_id = %project.id, %domain, "custom domain removed");

        Ok(Some(domain))
    }

    /// One provisioning attempt. Returns (configured, message); errors only
    /// for the hard retry ceiling.
    async fn try_configure(
        &self,
        project: &ProjectRecord,
        domain: &str,
    ) -> ApiResult<(bool, String)> {
        if project.configure_retry_count >= MAX_CONFIGURE_RETRIES {
            return Err(ApiError::RetryExhausted);
        }

        let Some(provisioner) = &self.provisioner else {
            warn!(%domain, "provisioner not configured; domain requires manual routing/TLS setup");
            return Ok((
                false,
                "Domain verified. Routing and TLS require manual provisioning.".to_string(),
            ));
        };

        match provisioner.configure(domain, &self.certificate_email).await {
            Ok(result) if result.is_success() => {
                sqlx::query(
                    r#"
                    UPDATE projects
                    SET is_configured = TRUE,
                        ssl_enabled = TRUE,
                        updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(project.id)
                .execute(&self.pool)
                .await?;

                info!(project_id = %project.id, %domain, "domain provisioned");
                Ok((true, "Domain configuration is valid.".to_string()))
            }
            Ok(result) => {
                self.record_configure_failure(project, domain, &result.diagnostic())
                    .await?;
                Ok((
                    false,
                    format!(
                        "Domain verified, but provisioning failed ({}). Retry verification to provision again.",
                        result.diagnostic()
                    ),
                ))
            }
            Err(err) => {
                self.record_configure_failure(project, domain, &err).await?;
                Ok((
                    false,
                    format!(
                        "Domain verified, but the provisioning service was unreachable: {err}. Retry verification to provision again."
                    ),
                ))
            }
        }
    }

    async fn record_configure_failure(
        &self,
        project: &ProjectRecord,
        domain: &str,
        diagnostic: &str,
    ) -> ApiResult<()> {
        error!(project_id = %project.id, %domain, %diagnostic, "provisioning failed");

        // The counter never exceeds the cap, even under concurrent retries
        sqlx::query(
            r#"
            UPDATE projects
            SET configure_retry_count = LEAST(configure_retry_count + 1, $2),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(project.id)
        .bind(MAX_CONFIGURE_RETRIES)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Normalize and validate a tenant-supplied custom domain.
///
/// Returns the trimmed, lowercased domain, or None when the syntax is
/// invalid: at least two labels, each 1-63 chars of alphanumerics and
/// hyphens with no leading/trailing hyphen, 253 chars total.
pub fn sanitize_custom_domain(raw: &str) -> Option<String> {
    let domain = raw.trim().trim_end_matches('.').to_lowercase();

    if domain.is_empty() || domain.len() > 253 {
        return None;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return None;
    }

    for label in &labels {
        if label.is_empty() || label.len() > 63 {
            return None;
        }
        if label.starts_with('-') || label.ends_with('-') {
            return None;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return None;
        }
    }

    Some(domain)
}

/// Generate a secure verification token
pub fn generate_verification_token() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| {
            let idx = rng.gen_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}
