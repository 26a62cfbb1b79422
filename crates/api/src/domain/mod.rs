//! Custom domain onboarding
//!
//! Everything between "tenant typed a domain" and "traffic on that domain
//! serves the tenant": the attach/verify/remove lifecycle, the DNS TXT
//! ownership challenge, and the client for the privileged provisioner.

mod dns;
mod lifecycle;
mod provisioner;

pub use dns::{txt_value_matches, verification_record_name, DnsVerifier, TxtOutcome};
pub use lifecycle::{
    generate_verification_token, sanitize_custom_domain, AttachOutcome, DomainLifecycle,
    VerifyOutcome,
};
pub use provisioner::ProvisionerClient;
