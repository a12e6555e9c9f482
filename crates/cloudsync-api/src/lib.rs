//! CloudSync API - MOVEit REST adapter
//!
//! Provides the async adapter between the sync engine and the MOVEit
//! REST API:
//! - Password and refresh-token grants against the token endpoint
//! - Single-flight token lifecycle management
//! - User, folder listing, streamed upload and delete endpoints
//!
//! ## Modules
//!
//! - [`client`] - Unauthenticated HTTP client and endpoint bindings
//! - [`auth`] - [`TokenManager`], the access-token lifecycle
//! - [`transport`] - [`AuthenticatingTransport`], the `IRemoteApi` adapter
//! - `models` - JSON wire types

pub mod auth;
pub mod client;
mod models;
pub mod transport;

pub use auth::{TokenManager, TokenState};
pub use client::MoveItClient;
pub use transport::AuthenticatingTransport;
