//! NATS reply producer for assessment results

use crate::types::Assessment;
use anyhow::Result;
use async_nats::{Client, Subject};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Serialize)]
struct ErrorReply {
    error: String,
}

/// Producer for answering assessment requests
#[derive(Clone)]
pub struct ReplyProducer {
    client: Client,
}

impl ReplyProducer {
    /// Create a new reply producer
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Reply to a request with its result, or `{"error": ...}` on failure.
    /// Requests without a reply subject are dropped.
    pub async fn reply(&self, reply_to: Option<Subject>, result: &Result<Assessment>) -> Result<()> {
        let Some(reply_to) = reply_to else {
            warn!("Request has no reply subject, result dropped");
            return Ok(());
        };

        let payload = encode_reply(result)?;
        self.client
            .publish(reply_to.clone(), payload.into())
            .await?;

        debug!(subject = %reply_to, ok = result.is_ok(), "Published reply");
        Ok(())
    }
}

/// JSON body for a reply
pub fn encode_reply(result: &Result<Assessment>) -> Result<Vec<u8>> {
    let payload = match result {
        Ok(assessment) => serde_json::to_vec(assessment)?,
        Err(e) => serde_json::to_vec(&ErrorReply {
            error: format!("{:#}", e),
        })?,
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    // Publishing tests would require a running NATS server
    use super::*;
    use crate::types::{TextAssessment, TextVerdict};

    #[test]
    fn test_encode_success() {
        let result = Ok(Assessment::Text(TextAssessment {
            result: TextVerdict::NotSpam,
            probability: 0.1,
            diagnostics: Vec::new(),
        }));
        let body: serde_json::Value = serde_json::from_slice(&encode_reply(&result).unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "result": "Not Spam" }));
    }

    #[test]
    fn test_encode_error() {
        let result: Result<Assessment> =
            Err(anyhow::anyhow!("missing field `url`").context("Invalid URL request"));
        let body: serde_json::Value = serde_json::from_slice(&encode_reply(&result).unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "error": "Invalid URL request: missing field `url`" })
        );
    }
}
