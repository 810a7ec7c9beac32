//! URL trust feature extraction
//!
//! Lexical signals are computed from the URL string and its network
//! location; reachability signals come from [`ProbeRunner`] and fail closed.

use super::probe::{ProbeBackend, ProbeKind, ProbeOutcome, ProbeRunner};
use super::{FeatureMap, FeatureValue};
use crate::diagnostics::Diagnostic;
use std::net::IpAddr;

/// Column order of the URL trust classifier
pub const URL_FEATURE_LAYOUT: &[&str] = &[
    "having_IP",
    "URL_Length",
    "Shortening_Service",
    "having_At_Symbol",
    "double_slash_redirecting",
    "Prefix_Suffix",
    "having_Sub_Domain",
    "SSLfinal_State",
    "Domain_registeration_length",
    "Favicon",
    "port",
    "HTTPS_token",
    "Request_URL",
    "URL_of_Anchor",
    "Links_in_tags",
    "SFH",
    "Submitting_to_email",
    "Abnormal_URL",
    "Redirect",
    "on_mouseover",
    "RightClick",
    "popUpWidnow",
    "Iframe",
    "age_of_domain",
    "DNSRecord",
    "web_traffic",
    "Page_Rank",
    "Google_Index",
    "Links_pointing_to_page",
    "Statistical_report",
];

/// Which probe feeds each probe-derived column
const PROBE_COLUMNS: &[(&str, ProbeKind)] = &[
    ("SSLfinal_State", ProbeKind::Https),
    ("Favicon", ProbeKind::Https),
    ("Domain_registeration_length", ProbeKind::Dns),
    ("age_of_domain", ProbeKind::Dns),
    ("DNSRecord", ProbeKind::Dns),
    ("Request_URL", ProbeKind::SearchIndex),
    ("URL_of_Anchor", ProbeKind::SearchIndex),
    ("Links_in_tags", ProbeKind::SearchIndex),
    ("SFH", ProbeKind::SearchIndex),
    ("Submitting_to_email", ProbeKind::SearchIndex),
    ("Abnormal_URL", ProbeKind::SearchIndex),
    ("Google_Index", ProbeKind::SearchIndex),
    ("Links_pointing_to_page", ProbeKind::SearchIndex),
    ("Statistical_report", ProbeKind::SearchIndex),
    ("web_traffic", ProbeKind::WebTraffic),
    ("Page_Rank", ProbeKind::WebTraffic),
];

/// Page-content signals that are not observed; always 0
const UNOBSERVED_COLUMNS: &[&str] = &["on_mouseover", "RightClick", "popUpWidnow", "Iframe"];

pub const DEFAULT_SHORTENERS: &[&str] = &["bit.ly", "goo.gl", "tinyurl.com", "ow.ly", "t.co"];

/// Network location of a URL: the part after `scheme://` (or a leading
/// `//`) up to the first `/`, `?` or `#`. Userinfo and port are kept.
/// Leading control characters and spaces are ignored. Empty when the
/// input has no network location.
pub fn network_location(url: &str) -> &str {
    let url = url.trim_start_matches(|c: char| c <= ' ');
    let rest = if let Some(rest) = url.strip_prefix("//") {
        rest
    } else {
        match url.find("://") {
            Some(idx) if is_scheme(&url[..idx]) => &url[idx + 3..],
            _ => return "",
        }
    };

    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Host part of a network location (no userinfo, no port, no IPv6 brackets)
pub fn host(netloc: &str) -> &str {
    let host_port = netloc.rsplit_once('@').map_or(netloc, |(_, h)| h);

    if let Some(bracketed) = host_port.strip_prefix('[') {
        return bracketed.split(']').next().unwrap_or("");
    }
    host_port.split(':').next().unwrap_or("")
}

/// Extracts the URL trust feature set
pub struct UrlFeatureExtractor<P> {
    probes: ProbeRunner<P>,
    shorteners: Vec<String>,
}

impl<P: ProbeBackend> UrlFeatureExtractor<P> {
    pub fn new(probes: ProbeRunner<P>) -> Self {
        Self::with_shorteners(probes, DEFAULT_SHORTENERS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_shorteners(probes: ProbeRunner<P>, shorteners: Vec<String>) -> Self {
        Self { probes, shorteners }
    }

    /// Signals computed from the URL text alone
    pub fn lexical_features(&self, url: &str) -> FeatureMap {
        let domain = network_location(url);
        let mut features = FeatureMap::new();
        let mut set = |name: &str, value: f64| {
            features.insert(name.to_string(), FeatureValue::Numeric(value));
        };
        let flag = |b: bool| if b { 1.0 } else { 0.0 };

        set("having_IP", flag(host(domain).parse::<IpAddr>().is_ok()));
        set("URL_Length", url.chars().count() as f64);
        set(
            "Shortening_Service",
            flag(self.shorteners.iter().any(|s| url.contains(s.as_str()))),
        );
        set("having_At_Symbol", flag(url.contains('@')));
        let after_scheme: String = url.chars().skip(7).collect();
        set("double_slash_redirecting", flag(after_scheme.contains("//")));
        set("Prefix_Suffix", flag(domain.contains('-')));
        set("having_Sub_Domain", domain.matches('.').count() as f64 - 1.0);
        set("port", flag(domain.contains(':')));
        set("HTTPS_token", flag(domain.contains("https")));
        set("Redirect", flag(url.contains("redirect")));
        for column in UNOBSERVED_COLUMNS {
            set(*column, 0.0);
        }

        features
    }

    /// Full feature set. Each probe runs once, concurrently; failed probes
    /// contribute 0 and a diagnostic.
    /// The URL is used exactly as given; surrounding whitespace counts
    /// toward `URL_Length`.
    pub async fn extract(&self, url: &str) -> (FeatureMap, Vec<Diagnostic>) {
        let domain = network_location(url);
        let mut features = self.lexical_features(url);

        let (https, dns, search, traffic) = tokio::join!(
            self.probes.run(ProbeKind::Https, domain),
            self.probes.run(ProbeKind::Dns, domain),
            self.probes.run(ProbeKind::SearchIndex, url),
            self.probes.run(ProbeKind::WebTraffic, domain),
        );

        for (column, kind) in PROBE_COLUMNS {
            let outcome = match kind {
                ProbeKind::Https => &https,
                ProbeKind::Dns => &dns,
                ProbeKind::SearchIndex => &search,
                ProbeKind::WebTraffic => &traffic,
            };
            features.insert(column.to_string(), FeatureValue::Numeric(outcome.value()));
        }

        let diagnostics = [&https, &dns, &search, &traffic]
            .into_iter()
            .filter_map(ProbeOutcome::diagnostic)
            .collect();

        (features, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::super::probe::testing::StaticProbes;
    use super::*;
    use std::time::Duration;

    fn extractor(probes: StaticProbes) -> UrlFeatureExtractor<StaticProbes> {
        UrlFeatureExtractor::new(ProbeRunner::new(probes, Duration::from_secs(1)))
    }

    fn numeric(features: &FeatureMap, name: &str) -> f64 {
        match features.get(name) {
            Some(FeatureValue::Numeric(v)) => *v,
            other => panic!("{name}: {other:?}"),
        }
    }

    #[test]
    fn test_network_location() {
        assert_eq!(network_location("https://www.example.com/path?q=1"), "www.example.com");
        assert_eq!(network_location("http://user@evil.com:8080/x"), "user@evil.com:8080");
        assert_eq!(network_location("//cdn.example.org/a"), "cdn.example.org");
        assert_eq!(network_location("example.com/login"), "");
        assert_eq!(network_location("not a url"), "");
        assert_eq!(network_location("https://"), "");
    }

    #[test]
    fn test_host() {
        assert_eq!(host("user@evil.com:8080"), "evil.com");
        assert_eq!(host("192.168.0.1:80"), "192.168.0.1");
        assert_eq!(host("[::1]:8443"), "::1");
        assert_eq!(host(""), "");
    }

    #[test]
    fn test_lexical_features() {
        let extractor = extractor(StaticProbes::all(true));
        let url = "http://secure-login.paypal.com.https-verify.example.net/redirect?to=//x";
        let features = extractor.lexical_features(url);

        assert_eq!(numeric(&features, "having_IP"), 0.0);
        assert_eq!(numeric(&features, "URL_Length"), url.len() as f64);
        assert_eq!(numeric(&features, "Prefix_Suffix"), 1.0);
        assert_eq!(numeric(&features, "having_Sub_Domain"), 4.0);
        assert_eq!(numeric(&features, "HTTPS_token"), 1.0);
        assert_eq!(numeric(&features, "Redirect"), 1.0);
        assert_eq!(numeric(&features, "double_slash_redirecting"), 1.0);
        assert_eq!(numeric(&features, "having_At_Symbol"), 0.0);
        assert_eq!(numeric(&features, "port"), 0.0);
    }

    #[test]
    fn test_ip_shortener_and_port() {
        let extractor = extractor(StaticProbes::all(true));

        let ip = extractor.lexical_features("http://10.0.0.7:8080/admin@login");
        assert_eq!(numeric(&ip, "having_IP"), 1.0);
        assert_eq!(numeric(&ip, "port"), 1.0);
        assert_eq!(numeric(&ip, "having_At_Symbol"), 1.0);

        let short = extractor.lexical_features("https://bit.ly/3xYz");
        assert_eq!(numeric(&short, "Shortening_Service"), 1.0);
        assert_eq!(numeric(&short, "having_Sub_Domain"), 0.0);
    }

    #[tokio::test]
    async fn test_extract_covers_layout() {
        let extractor = extractor(StaticProbes::all(true));
        let (features, diagnostics) = extractor.extract("https://www.example.com").await;

        for column in URL_FEATURE_LAYOUT {
            assert!(features.contains_key(*column), "missing {column}");
        }
        assert_eq!(features.len(), URL_FEATURE_LAYOUT.len());
        assert_eq!(numeric(&features, "SSLfinal_State"), 1.0);
        assert_eq!(numeric(&features, "DNSRecord"), 1.0);
        assert_eq!(numeric(&features, "Page_Rank"), 1.0);
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_url_length_counts_raw_input() {
        let extractor = extractor(StaticProbes::all(true));
        let (features, _) = extractor.extract(" http://a.com/ ").await;
        assert_eq!(numeric(&features, "URL_Length"), 15.0);
        assert_eq!(numeric(&features, "having_Sub_Domain"), 0.0);

        let (features, _) = extractor.extract("http://a.com/").await;
        assert_eq!(numeric(&features, "URL_Length"), 13.0);
    }

    #[tokio::test]
    async fn test_probe_failures_fail_closed() {
        let extractor = extractor(StaticProbes::failing());
        let (features, diagnostics) = extractor.extract("https://unreachable.invalid").await;

        for (column, _) in PROBE_COLUMNS {
            assert_eq!(numeric(&features, column), 0.0, "{column}");
        }
        assert_eq!(diagnostics.len(), 4);
    }

    #[tokio::test]
    async fn test_malformed_url_never_fails() {
        let extractor = extractor(StaticProbes::all(true));
        let (features, diagnostics) = extractor.extract("::::not-a-url").await;

        assert_eq!(numeric(&features, "having_Sub_Domain"), -1.0);
        assert_eq!(numeric(&features, "SSLfinal_State"), 0.0);
        assert_eq!(numeric(&features, "Google_Index"), 1.0);
        // https, dns and traffic probes have no domain to check
        assert_eq!(diagnostics.len(), 3);
    }
}
