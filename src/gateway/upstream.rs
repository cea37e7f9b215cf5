//! The AI service on the far side of the trust boundary.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Upstream request failed: {0}")]
    Failed(String),
    #[error("Upstream did not answer within {0:?}")]
    Timeout(Duration),
}

/// Receives redacted prompts only.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Name used in logs and audit metadata.
    fn name(&self) -> &str {
        "upstream"
    }

    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError>;
}

/// Canned responder that echoes the prompt inside a fixed sentence.
/// Placeholders survive the round trip, so the restored reply shows real
/// values again.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedUpstream;

#[async_trait]
impl Upstream for SimulatedUpstream {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        Ok(format!("I have processed the records for {}. The status is confirmed.", prompt))
    }
}
