//! `warehouse-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod roles;
pub mod token;

pub use authorize::{authorize, decide, AuthzError, Decision, Verb};
pub use claims::{validate_claims, TokenClaims, TokenError};
pub use roles::{Role, UnknownRole};
pub use token::TokenService;
