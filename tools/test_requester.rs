//! Test Request Generator
//!
//! Sends sample URL, transaction and text assessment requests over NATS
//! and logs the replies.

use chrono::{Duration as ChronoDuration, Utc};
use fraudlens_risk::config::AppConfig;
use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Sample request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    transaction_counter: u64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            transaction_counter: 0,
        }
    }

    fn url(&mut self, suspicious: bool) -> Value {
        let url = if suspicious {
            self.random_choice(&[
                "http://192.168.10.4/secure-login@verify",
                "http://bit.ly/claim-prize-now",
                "http://paypal-account-check.example-support.xyz//redirect?to=login",
                "http://free-gift-card.win:8080/redirect",
            ])
        } else {
            self.random_choice(&[
                "https://www.wikipedia.org/",
                "https://github.com/",
                "https://www.rust-lang.org/learn",
                "https://docs.rs/",
            ])
        };
        json!({ "url": url })
    }

    fn transaction(&mut self, suspicious: bool) -> Value {
        self.transaction_counter += 1;
        let date = Utc::now() - ChronoDuration::days(self.rng.gen_range(0..30));

        let (amount, currency, device) = if suspicious {
            (
                self.rng.gen_range(5000.0..90000.0),
                self.random_choice(&["Bitcoin", "JPY", "GBP"]),
                self.random_choice(&["Unregistered", "Unknown"]),
            )
        } else {
            (
                self.rng.gen_range(10.0..2000.0),
                self.random_choice(&["USD", "EUR", "INR"]),
                self.random_choice(&["iOS App", "Android App", "Web Browser"]),
            )
        };

        json!({
            "Transaction_ID": format!("tx_{:012}", self.transaction_counter),
            "Customer_ID": format!("cust_{}", self.rng.gen_range(1..100000)),
            "Transaction_Date": date.format("%d-%m-%Y").to_string(),
            "Transaction_Amount": (amount * 100.0_f64).round() / 100.0,
            "Account_Balance": self.rng.gen_range(100.0..100000.0_f64).round(),
            "Account_Type": self.random_choice(&["Savings", "Checking", "Business"]),
            "Transaction_Type": self.random_choice(&["Transfer", "Debit", "Withdrawal", "Credit"]),
            "Merchant_Category": self.random_choice(&["Groceries", "Electronics", "Travel", "Restaurant"]),
            "Transaction_Device": self.random_choice(&["Mobile", "ATM", "POS", "Desktop"]),
            "Device_Type": device,
            "Transaction_Currency": currency,
        })
    }

    fn text(&mut self, suspicious: bool) -> Value {
        let text = if suspicious {
            self.random_choice(&[
                "WINNER!! You have won a $1000 prize. Call 09061701461 now to claim!",
                "URGENT: your account is suspended, verify at http://bit.ly/x now",
                "Free entry in 2 a weekly competition, text WIN to 80086",
            ])
        } else {
            self.random_choice(&[
                "Are we still meeting for lunch tomorrow?",
                "I'll be home late tonight, don't wait up",
                "Thanks for sending the report, looks good.",
            ])
        };
        json!({ "text": text })
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_requester=info".parse()?),
        )
        .init();

    info!("Starting Test Request Generator");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(30);
    let fraud_rate = parse_rate(args.get(3).map(|s| s.as_str()));
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    let nats = AppConfig::default().nats;
    let subjects = [nats.url_subject, nats.transaction_subject, nats.text_subject];

    info!(
        nats_url = %nats_url,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Sending {} requests...", count);

    let mut failures = 0;

    for i in 0..count {
        let suspicious = rng.gen_bool(fraud_rate);
        let (subject, request) = next_request(&mut generator, i, suspicious, &subjects);
        let payload = serde_json::to_vec(&request)?;

        match client.request(subject.clone(), payload.into()).await {
            Ok(reply) => {
                let body = String::from_utf8_lossy(&reply.payload);
                info!(subject = %subject, suspicious, reply = %body, "Reply received");
            }
            Err(e) => {
                failures += 1;
                warn!(subject = %subject, error = %e, "Request failed");
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!("Completed! Sent {} requests ({} failed)", count, failures);

    Ok(())
}

/// Share of suspicious requests, kept inside [0, 1]
fn parse_rate(arg: Option<&str>) -> f64 {
    let rate: f64 = arg.and_then(|s| s.parse().ok()).unwrap_or(0.3);
    if rate.is_nan() {
        0.3
    } else {
        rate.clamp(0.0, 1.0)
    }
}

/// Round-robin over the three domains
fn next_request(
    generator: &mut RequestGenerator,
    i: u64,
    suspicious: bool,
    subjects: &[String; 3],
) -> (String, Value) {
    match i % 3 {
        0 => (subjects[0].clone(), generator.url(suspicious)),
        1 => (subjects[1].clone(), generator.transaction(suspicious)),
        _ => (subjects[2].clone(), generator.text(suspicious)),
    }
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let nats = AppConfig::default().nats;
    let subjects = [nats.url_subject, nats.transaction_subject, nats.text_subject];
    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let (subject, request) = next_request(&mut generator, i, rng.gen_bool(fraud_rate), &subjects);
        let json = serde_json::to_string_pretty(&request)?;

        if i < 3 || (i + 1) % 10 == 0 {
            info!("Sample request {} on {}:\n{}", i + 1, subject, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate(None), 0.3);
        assert_eq!(parse_rate(Some("0.5")), 0.5);
        assert_eq!(parse_rate(Some("1.5")), 1.0);
        assert_eq!(parse_rate(Some("-2")), 0.0);
        assert_eq!(parse_rate(Some("NaN")), 0.3);
        assert_eq!(parse_rate(Some("lots")), 0.3);
    }
}
