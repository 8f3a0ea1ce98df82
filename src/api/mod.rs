//! Caption service boundary.
//!
//! The core only talks to the remote service through [`CaptionApi`]; the HTTP
//! implementation lives in [`http`], tests substitute a scripted fake.

#[cfg(test)]
pub(crate) mod fake;
mod http;

use crate::model::{GenerateRequest, GenerateResponse, HistoryRecord};
use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpCaptionClient;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("service returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response body: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CaptionApi: Send + Sync {
    /// `POST /api/generate`
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, ApiError>;

    /// `GET /api/captions`
    async fn list_captions(&self) -> Result<Vec<HistoryRecord>, ApiError>;

    /// `POST /api/captions/{id}/favorite?index={index}`
    async fn favorite(&self, id: &str, index: usize) -> Result<(), ApiError>;
}

/// Connection settings for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
}
