//! Generation lifecycle: compose a request, await the service, commit the outcome.

use crate::api::{ApiError, CaptionApi};
use crate::model::{GenerateRequest, GenerateResponse, GenerationParameters};
use thiserror::Error;

/// Message shown to the user for any failed generation.
pub(crate) const GENERATE_FAILED: &str = "Failed to generate";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("a generation is already in progress")]
pub struct Busy;

/// How a generation settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Success,
    Failed,
}

impl Settlement {
    /// Only a successful generation creates a record server-side.
    pub fn refresh_history(self) -> bool {
        matches!(self, Settlement::Success)
    }
}

/// Owns the pending flag, the current results and the last error.
#[derive(Debug, Default)]
pub struct RequestOrchestrator {
    pending: bool,
    results: Vec<String>,
    error: Option<String>,
}

impl RequestOrchestrator {
    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn results(&self) -> &[String] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Enter Pending and build the wire request. Rejected while a generation is in flight.
    pub fn begin(&mut self, params: &GenerationParameters) -> Result<GenerateRequest, Busy> {
        if self.pending {
            tracing::debug!("generation rejected: already pending");
            return Err(Busy);
        }
        self.pending = true;
        tracing::info!(
            topic = params.topic(),
            tone = %params.tone,
            platform = %params.platform,
            length = %params.length,
            variants = params.variant_count.get(),
            "generation started"
        );
        Ok(params.to_request())
    }

    /// Commit the outcome of the in-flight generation and leave Pending.
    pub fn settle(&mut self, outcome: Result<GenerateResponse, ApiError>) -> Settlement {
        self.pending = false;
        match outcome {
            Ok(resp) => {
                tracing::info!(count = resp.variants.len(), "generation succeeded");
                self.results = resp.variants;
                self.error = None;
                Settlement::Success
            }
            Err(e) => {
                tracing::warn!(error = %e, "generation failed");
                self.error = Some(GENERATE_FAILED.to_string());
                Settlement::Failed
            }
        }
    }

    /// Run one generation to completion: begin, await the service, settle.
    pub async fn generate(
        &mut self,
        api: &dyn CaptionApi,
        params: &GenerationParameters,
    ) -> Result<Settlement, Busy> {
        let req = self.begin(params)?;
        let outcome = api.generate(&req).await;
        Ok(self.settle(outcome))
    }
}
