//! Delivery of the payload to OS2rollekatalog.

pub mod client;

use async_trait::async_trait;

use crate::errors::SinkError;
use crate::models::RoleCatalogPayload;

pub use client::RoleCatalogClient;

/// The role catalog's answer to an accepted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkResponse {
    pub status: u16,
    pub body: String,
}

/// Receiver of the complete payload. One call per run; a non-success answer
/// is an error and nothing is retried.
#[async_trait]
pub trait RoleCatalogSink: Send + Sync {
    async fn send(&self, payload: &RoleCatalogPayload) -> Result<SinkResponse, SinkError>;
}
