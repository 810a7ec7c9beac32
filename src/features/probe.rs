//! Network probes for URL trust features
//!
//! Every probe is a boolean check against an external service. Probes run
//! under a bounded timeout and fail closed: a timeout, network error or
//! unusable target resolves to 0 and is reported as a diagnostic, never as
//! an error.

use crate::config::ProbeConfig;
use crate::diagnostics::Diagnostic;
use anyhow::{Context, Result};
use reqwest::Url;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failure of a single probe
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no usable probe target")]
    EmptyTarget,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("dns lookup failed: {0}")]
    Dns(#[from] std::io::Error),
}

/// The external checks a URL assessment depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// `https://<domain>` is reachable and ends on an https URL
    Https,
    /// The domain resolves in DNS
    Dns,
    /// A search engine has the URL indexed
    SearchIndex,
    /// A traffic-ranking service knows the domain
    WebTraffic,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Https => "https",
            ProbeKind::Dns => "dns",
            ProbeKind::SearchIndex => "search_index",
            ProbeKind::WebTraffic => "web_traffic",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability that performs the raw checks. Implementations may fail;
/// [`ProbeRunner`] turns failures into fail-closed values.
pub trait ProbeBackend: Send + Sync {
    fn https_reachable(&self, domain: &str) -> impl Future<Output = Result<bool, ProbeError>> + Send;

    fn dns_resolves(&self, domain: &str) -> impl Future<Output = Result<bool, ProbeError>> + Send;

    fn search_indexed(&self, url: &str) -> impl Future<Output = Result<bool, ProbeError>> + Send;

    fn has_web_traffic(&self, domain: &str) -> impl Future<Output = Result<bool, ProbeError>> + Send;
}

/// Result of running one probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub kind: ProbeKind,
    pub passed: bool,
    pub failure: Option<String>,
}

impl ProbeOutcome {
    /// Feature value: 1.0 when the probe passed, otherwise 0.0
    pub fn value(&self) -> f64 {
        if self.passed {
            1.0
        } else {
            0.0
        }
    }

    pub fn diagnostic(&self) -> Option<Diagnostic> {
        self.failure.as_ref().map(|reason| Diagnostic::ProbeFailed {
            probe: self.kind.to_string(),
            reason: reason.clone(),
        })
    }

    fn failed(kind: ProbeKind, error: ProbeError) -> Self {
        Self {
            kind,
            passed: false,
            failure: Some(error.to_string()),
        }
    }
}

/// Runs probes against a backend with a per-probe timeout.
pub struct ProbeRunner<P> {
    backend: P,
    timeout: Duration,
    enabled: bool,
}

impl<P: ProbeBackend> ProbeRunner<P> {
    pub fn new(backend: P, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            enabled: true,
        }
    }

    /// Runner that never touches the network; every probe resolves to 0.
    pub fn disabled(backend: P) -> Self {
        Self {
            backend,
            timeout: Duration::ZERO,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run one probe. Never fails: errors and timeouts resolve to `passed = false`.
    pub async fn run(&self, kind: ProbeKind, target: &str) -> ProbeOutcome {
        if !self.enabled {
            return ProbeOutcome {
                kind,
                passed: false,
                failure: None,
            };
        }
        if target.is_empty() {
            return ProbeOutcome::failed(kind, ProbeError::EmptyTarget);
        }

        let result = match kind {
            ProbeKind::Https => {
                tokio::time::timeout(self.timeout, self.backend.https_reachable(target)).await
            }
            ProbeKind::Dns => {
                tokio::time::timeout(self.timeout, self.backend.dns_resolves(target)).await
            }
            ProbeKind::SearchIndex => {
                tokio::time::timeout(self.timeout, self.backend.search_indexed(target)).await
            }
            ProbeKind::WebTraffic => {
                tokio::time::timeout(self.timeout, self.backend.has_web_traffic(target)).await
            }
        };

        match result {
            Ok(Ok(passed)) => {
                debug!(probe = %kind, target, passed, "Probe completed");
                ProbeOutcome {
                    kind,
                    passed,
                    failure: None,
                }
            }
            Ok(Err(e)) => ProbeOutcome::failed(kind, e),
            Err(_) => ProbeOutcome::failed(kind, ProbeError::Timeout(self.timeout)),
        }
    }
}

/// Probe backend over HTTP and the system resolver
pub struct HttpProbes {
    client: reqwest::Client,
    search_url: Url,
    traffic_url: Url,
}

impl HttpProbes {
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build probe HTTP client")?;

        Ok(Self {
            client,
            search_url: Url::parse(&config.search_url)
                .with_context(|| format!("Invalid search probe URL {}", config.search_url))?,
            traffic_url: Url::parse(&config.traffic_url)
                .with_context(|| format!("Invalid traffic probe URL {}", config.traffic_url))?,
        })
    }

    async fn fetch_text(&self, url: Url) -> Result<String, ProbeError> {
        let response = self.client.get(url).send().await?;
        Ok(response.text().await?)
    }
}

/// Substitute `value` for `placeholder` inside the query values of
/// `template`. Values are re-encoded, so `&`, `#` or `?` in `value` stay
/// inside their parameter.
pub fn fill_query(template: &Url, placeholder: &str, value: &str) -> Url {
    let pairs: Vec<(String, String)> = template
        .query_pairs()
        .map(|(key, v)| (key.into_owned(), v.replace(placeholder, value)))
        .collect();

    let mut url = template.clone();
    if !pairs.is_empty() {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url
}

impl ProbeBackend for HttpProbes {
    async fn https_reachable(&self, domain: &str) -> Result<bool, ProbeError> {
        let response = self.client.get(format!("https://{domain}")).send().await?;
        Ok(response.url().scheme() == "https")
    }

    async fn dns_resolves(&self, domain: &str) -> Result<bool, ProbeError> {
        let mut addrs = tokio::net::lookup_host((domain, 443)).await?;
        Ok(addrs.next().is_some())
    }

    async fn search_indexed(&self, url: &str) -> Result<bool, ProbeError> {
        let body = self
            .fetch_text(fill_query(&self.search_url, "{url}", url))
            .await?;
        Ok(!body.contains("did not match any documents"))
    }

    async fn has_web_traffic(&self, domain: &str) -> Result<bool, ProbeError> {
        let body = self
            .fetch_text(fill_query(&self.traffic_url, "{domain}", domain))
            .await?;
        Ok(body.contains("RANK"))
    }
}
