//! Integration tests for cloudsync-api
//!
//! Uses wiremock to simulate the MOVEit REST API and verifies end-to-end
//! behavior of the client, the token manager and the authenticating
//! transport.

mod common;

mod test_files;
mod test_folders;
mod test_token;
mod test_transport;
