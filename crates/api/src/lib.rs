//! Hostplane control-plane API
//!
//! Maps incoming HTTP hosts to tenant projects and manages the custom
//! domain attach/verify/remove lifecycle, including DNS ownership proof
//! and provisioning of routing/TLS via the privileged provisioner service.

pub mod config;
pub mod domain;
pub mod error;
pub mod routes;
pub mod routing;
pub mod state;
pub mod subdomain;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routing::{DomainContext, DomainKind, HostResolver, TenantLookup};
pub use state::AppState;
