//! Hostplane shared types and utilities
//!
//! Types and helpers shared between the control-plane API and the
//! privileged provisioner service.

pub mod db;
pub mod provision;
pub mod types;

pub use db::*;
pub use provision::*;
pub use types::*;
