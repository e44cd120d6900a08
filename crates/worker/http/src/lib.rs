//! Worker backend speaking to an HTTP bridge in front of the backing store.
//!
//! The bridge exposes three endpoints, all authenticated with a bearer token
//! that selects the session:
//!
//! - `GET /me` returns `{"name": "..."}` for the session.
//! - `GET /messages/{id}` returns the file metadata of a message as JSON.
//! - `GET /files/{remote_file_id}` returns file contents and honors `Range`.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod worker;

pub use bootstrap::HttpBootstrap;
pub use config::HttpWorkerConfig;
pub use error::HttpBridgeError;
pub use worker::HttpWorker;
