//! Test Transaction Producer
//!
//! Generates synthetic transaction requests and submits them to the pipeline
//! over NATS request/reply, printing each outcome.

use std::time::Duration;

use chrono::Utc;
use fraud_scoring_pipeline::types::{Channel, TransactionKind, TransactionRequest};
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    account_id: Uuid,
}

impl RequestGenerator {
    fn new(account_id: Uuid) -> Self {
        Self {
            rng: rand::thread_rng(),
            account_id,
        }
    }

    /// Small everyday payment.
    fn generate_ordinary(&mut self) -> TransactionRequest {
        let amount = self.rng.gen_range(10.0..200.0);
        TransactionRequest {
            account_id: self.account_id,
            amount: Decimal::from_f64(amount).unwrap_or(Decimal::ONE).round_dp(2),
            kind: TransactionKind::Payment {
                merchant_id: format!("m_{}", self.rng.gen_range(1..500)),
            },
            category: self
                .random_choice(&["Groceries", "Restaurants", "Fuel", "Pharmacy"])
                .to_string(),
            channel: Channel::Pos,
            city: "Local Store".to_string(),
            state: "Hometown".to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Large remote transfer, the shape that tends to score high.
    fn generate_suspicious(&mut self) -> TransactionRequest {
        let amount = self.rng.gen_range(500.0..5000.0);
        TransactionRequest {
            account_id: self.account_id,
            amount: Decimal::from_f64(amount).unwrap_or(Decimal::ONE).round_dp(2),
            kind: TransactionKind::Transfer {
                recipient: format!("acct_{:08x}", self.rng.gen::<u32>()),
            },
            category: self.random_choice(&["Electronics", "Jewelry"]).to_string(),
            channel: Channel::Online,
            city: "Remote".to_string(),
            state: "Unknown".to_string(),
            timestamp: Utc::now(),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    // Args: nats_url subject account_id [count] [suspicious_rate] [delay_ms]
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("nats://localhost:4222");
    let subject = args
        .get(2)
        .map(|s| s.as_str())
        .unwrap_or("transactions.request");
    let account_id: Uuid = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(Uuid::new_v4);
    let count: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(20);
    let suspicious_rate: f64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let delay_ms: u64 = args.get(6).and_then(|s| s.parse().ok()).unwrap_or(200);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        account_id = %account_id,
        count,
        suspicious_rate,
        "Starting test transaction producer"
    );

    let client = async_nats::connect(nats_url).await?;
    let mut generator = RequestGenerator::new(account_id);
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let request = if rng.gen_bool(suspicious_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_ordinary()
        };

        let payload = serde_json::to_vec(&request)?;

        match client.request(subject.to_string(), payload.into()).await {
            Ok(reply) => {
                let body = String::from_utf8_lossy(&reply.payload);
                info!(request = i + 1, amount = %request.amount, reply = %body, "Outcome");
            }
            Err(e) => {
                warn!(request = i + 1, error = %e, "No reply from pipeline");
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
