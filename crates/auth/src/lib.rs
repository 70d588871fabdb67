//! `freightdesk-auth`: client-side view of the backend's access model.
//!
//! This crate is intentionally decoupled from HTTP and storage: it decodes
//! what the backend sends (users, roles, permission masks, JWT payloads) and
//! answers access questions against it. The backend remains the authority.

pub mod access;
pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod roles;
pub mod user;

pub use access::{AccessMask, Action};
pub use authorize::{AuthzError, PermissionSet, authorize};
pub use claims::{TokenClaims, TokenError, decode_claims};
pub use permissions::{Permission, PermissionName, ScreenType};
pub use roles::Role;
pub use user::{Credentials, NewUser, UpdatePassword, User};
