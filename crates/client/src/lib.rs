//! `freightdesk-client`
//!
//! **Responsibility:** typed client for the freight back-office REST API.
//!
//! This crate provides:
//! - An HTTP pipeline that attaches the bearer token and unwraps the
//!   `{resultCode, result}` envelope
//! - The session store (login/refresh/logout, expiry bookkeeping, access checks)
//! - One CRUD store per backend resource
//! - A transient notification queue
//!
//! The backend remains the authority: local state only changes after the
//! server confirmed an operation.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod notifications;
pub mod resources;
pub mod session;
pub mod storage;
pub mod transport;

pub use api::{ApiClient, ApiResponse, RequestOptions, ResultCode};
pub use app::AppState;
pub use config::ClientConfig;
pub use error::{ApiError, SessionError};
pub use notifications::{Notification, NotificationKind, Notifications};
pub use resources::{Resource, ResourceStore};
pub use session::{Session, SessionEvent, SessionStatus, SessionStore};
pub use storage::{MemoryStorage, TokenStorage};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};
