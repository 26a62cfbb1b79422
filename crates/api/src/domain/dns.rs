//! DNS TXT challenge verification
//!
//! Looks up the TXT record at the derived verification name and matches it
//! against the issued token. No retries happen here: DNS propagation is
//! inherently time-delayed, so retry policy belongs to the caller.

use std::time::Duration;

use tracing::{debug, warn};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::TokioAsyncResolver;

/// DNS record name prefix for domain ownership proof
pub const VERIFICATION_RECORD_PREFIX: &str = "_domain-verification";

/// Derive the TXT record name for a domain, e.g.
/// `_domain-verification.example.org`.
pub fn verification_record_name(domain: &str) -> String {
    format!("{VERIFICATION_RECORD_PREFIX}.{domain}")
}

/// Outcome of a TXT challenge lookup.
///
/// Everything except `Matched` reads as "not verified" to the caller; the
/// variants exist so logs can tell a missing record from a timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxtOutcome {
    /// Some TXT value at the name equals the issued token exactly.
    Matched,
    /// TXT data exists but no value equals the token.
    Mismatch,
    /// The name does not exist at all.
    NoRecord,
    /// The name exists but carries no TXT data.
    NoTxtData,
    /// The query timed out.
    Timeout,
    /// Any other resolution failure.
    Failed(String),
}

impl TxtOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, TxtOutcome::Matched)
    }
}

/// TXT lookup with a per-query timeout and an overall deadline.
#[derive(Clone)]
pub struct DnsVerifier {
    resolver: TokioAsyncResolver,
    total_timeout: Duration,
}

impl DnsVerifier {
    pub fn new(query_timeout: Duration, total_timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = query_timeout;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
            total_timeout,
        }
    }

    /// Check whether the TXT record for `record_name` carries `token`.
    pub async fn check_txt(&self, record_name: &str, token: &str) -> TxtOutcome {
        let lookup = tokio::time::timeout(self.total_timeout, self.resolver.txt_lookup(record_name));

        let response = match lookup.await {
            Ok(result) => result,
            Err(_) => {
                warn!(%record_name, "TXT lookup exceeded overall deadline");
                return TxtOutcome::Timeout;
            }
        };

        match response {
            Ok(records) => {
                for record in records.iter() {
                    for data in record.txt_data() {
                        let value = String::from_utf8_lossy(data);
                        if txt_value_matches(&value, token) {
                            debug!(%record_name, "TXT challenge matched");
                            return TxtOutcome::Matched;
                        }
                    }
                }
                debug!(%record_name, "TXT records present but none match");
                TxtOutcome::Mismatch
            }
            Err(err) => match err.kind() {
                ResolveErrorKind::NoRecordsFound { response_code, .. } => {
                    if *response_code == ResponseCode::NXDomain {
                        debug!(%record_name, "verification record name does not exist");
                        TxtOutcome::NoRecord
                    } else {
                        debug!(%record_name, "name exists but carries no TXT data");
                        TxtOutcome::NoTxtData
                    }
                }
                ResolveErrorKind::Timeout => {
                    warn!(%record_name, "TXT query timed out");
                    TxtOutcome::Timeout
                }
                _ => {
                    warn!(%record_name, error = %err, "TXT lookup failed");
                    TxtOutcome::Failed(err.to_string())
                }
            },
        }
    }
}

/// Match rule: strip one layer of surrounding quote characters if present,
/// then require exact string equality. Not a substring and not
/// case-insensitive.
pub fn txt_value_matches(value: &str, token: &str) -> bool {
    let unquoted = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);

    unquoted == token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_name_derivation() {
        assert_eq!(
            verification_record_name("example.org"),
            "_domain-verification.example.org"
        );
    }

    #[test]
    fn test_exact_match() {
        assert!(txt_value_matches("abc123", "abc123"));
        assert!(!txt_value_matches("abc1234", "abc123"));
        assert!(!txt_value_matches("abc12", "abc123"));
    }

    #[test]
    fn test_one_quote_layer_stripped() {
        assert!(txt_value_matches("\"abc123\"", "abc123"));
        // Only one layer comes off
        assert!(!txt_value_matches("\"\"abc123\"\"", "abc123"));
        // Unbalanced quotes are left alone
        assert!(!txt_value_matches("\"abc123", "abc123"));
        assert!(!txt_value_matches("abc123\"", "abc123"));
    }

    #[test]
    fn test_no_substring_or_case_folding() {
        assert!(!txt_value_matches("prefix-abc123", "abc123"));
        assert!(!txt_value_matches("abc123-suffix", "abc123"));
        assert!(!txt_value_matches("ABC123", "abc123"));
    }
}
