//! NATS request consumer for the three assessment subjects

use crate::config::NatsConfig;
use crate::types::AssessmentDomain;
use anyhow::{Context, Result};
use async_nats::{Client, Message};
use futures::stream::{self, BoxStream, StreamExt};
use tracing::info;

/// A request message tagged with the domain of the subject it arrived on
#[derive(Debug)]
pub struct DomainRequest {
    pub domain: AssessmentDomain,
    pub message: Message,
}

/// Consumer for assessment requests from NATS
pub struct RequestConsumer {
    client: Client,
    subjects: Vec<(AssessmentDomain, String)>,
}

impl RequestConsumer {
    /// Create a new request consumer
    pub fn new(client: Client, config: &NatsConfig) -> Self {
        Self {
            client,
            subjects: subject_domains(config),
        }
    }

    /// Subscribe to every request subject and merge them into one stream
    pub async fn subscribe(&self) -> Result<BoxStream<'static, DomainRequest>> {
        let mut streams = Vec::with_capacity(self.subjects.len());
        for (domain, subject) in &self.subjects {
            let domain = *domain;
            let subscriber = self
                .client
                .subscribe(subject.clone())
                .await
                .with_context(|| format!("Failed to subscribe to {}", subject))?;
            info!(subject = %subject, domain = %domain, "Subscribed to request subject");
            streams.push(
                subscriber
                    .map(move |message| DomainRequest { domain, message })
                    .boxed(),
            );
        }
        Ok(stream::select_all(streams).boxed())
    }

    /// Get the subscribed subjects
    pub fn subjects(&self) -> &[(AssessmentDomain, String)] {
        &self.subjects
    }
}

/// Request subject for each domain
pub fn subject_domains(config: &NatsConfig) -> Vec<(AssessmentDomain, String)> {
    vec![
        (AssessmentDomain::Url, config.url_subject.clone()),
        (AssessmentDomain::Transaction, config.transaction_subject.clone()),
        (AssessmentDomain::Text, config.text_subject.clone()),
    ]
}
