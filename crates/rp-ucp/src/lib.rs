//! UCP control-plane client.
//!
//! [`UcpClient`] implements the `rp-register` store traits over HTTP, so a
//! [`rp_register::Registrar`] can register manifests against a live control
//! plane. Long-running upserts are polled to completion.

pub mod client;
pub mod error;
pub mod options;
pub mod poller;
pub mod response;
pub mod url;

pub use client::UcpClient;
pub use error::{Error, Result};
pub use options::{ClientOptions, DEFAULT_API_VERSION, DEFAULT_ENDPOINT, DEFAULT_POLL_INTERVAL};
pub use url::ResourcePath;
