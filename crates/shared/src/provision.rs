//! Wire contract between the control plane and the provisioner service.
//!
//! The provisioner is a separate, privilege-isolated binary reachable only
//! from the control plane. Success and failure are reported structurally
//! (exit code plus captured streams), never inferred from output text.

use serde::{Deserialize, Serialize};

/// `POST /configure-custom-domain` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureDomainRequest {
    pub custom_domain: String,
    /// Contact address for certificate issuance.
    pub email: String,
}

/// `POST /remove-custom-domain` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveDomainRequest {
    pub custom_domain: String,
}

/// Verbatim result of a provisioning script run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptResult {
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
}

impl ScriptResult {
    pub fn is_success(&self) -> bool {
        self.returncode == 0
    }

    /// Compact one-line diagnostic for logs and error messages.
    pub fn diagnostic(&self) -> String {
        format!(
            "exit={} stdout={:?} stderr={:?}",
            self.returncode,
            self.stdout.trim(),
            self.stderr.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_is_exit_zero_only() {
        let ok = ScriptResult {
            stdout: "configured".to_string(),
            stderr: String::new(),
            returncode: 0,
        };
        let failed = ScriptResult {
            stdout: "configured".to_string(),
            stderr: "nginx: test failed".to_string(),
            returncode: 1,
        };
        assert!(ok.is_success());
        // Output text never overrides the exit status
        assert!(!failed.is_success());
    }

    #[test]
    fn test_diagnostic_includes_streams() {
        let result = ScriptResult {
            stdout: "step 1 done\n".to_string(),
            stderr: "certbot: timeout\n".to_string(),
            returncode: 2,
        };
        let diag = result.diagnostic();
        assert!(diag.contains("exit=2"));
        assert!(diag.contains("certbot: timeout"));
    }
}
