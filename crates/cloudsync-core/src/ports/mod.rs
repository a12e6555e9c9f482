//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ITokenEndpoint`] - Credential and refresh-token exchange
//! - [`IRemoteApi`] - Authenticated folder, upload and delete operations
//! - [`IFileSync`] - Upload/delete entry points driven by local file events

pub mod file_sync;
pub mod remote_api;

pub use file_sync::IFileSync;
pub use remote_api::{
    Credentials, FolderItem, FolderPage, IRemoteApi, ITokenEndpoint, TokenGrant, UploadContent,
    UploadedFile, UserDetails,
};
