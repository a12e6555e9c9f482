//! CloudSync Core - Domain types, ports and configuration
//!
//! This crate is the hexagonal core of CloudSync:
//! - **Domain types** - identifier newtypes and error enums shared by every adapter
//! - **Port definitions** - `IRemoteApi`, `ITokenEndpoint` and `IFileSync`
//! - **Configuration** - the typed YAML configuration consumed by the daemon
//!
//! # Architecture
//!
//! Nothing in this crate performs I/O against the remote service. The REST
//! adapter (`cloudsync-api`) implements the remote ports and the sync crate
//! (`cloudsync-sync`) consumes them.

pub mod config;
pub mod domain;
pub mod ports;
