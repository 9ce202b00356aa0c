//! Fraud-Scoring Pipeline - Main Entry Point
//!
//! Consumes transaction requests from NATS, scores them against account
//! history via the external scoring boundary, applies balance changes for
//! non-fraud outcomes, and broadcasts fraud alerts.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use fraud_scoring_pipeline::{
    broadcaster::{AlertBroadcaster, SubscriberRegistry},
    config::AppConfig,
    coordinator::TransactionCoordinator,
    history::HistoryReader,
    metrics::{MetricsReporter, PipelineMetrics},
    policy::DecisionPolicy,
    producer::AlertPublisher,
    scoring::{NatsScorer, ScoringClient},
    server::PipelineServer,
    storage::MemoryStore,
};
use rust_decimal::Decimal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fraud_scoring_pipeline=info".parse()?),
        )
        .init();

    info!("Starting Fraud-Scoring Pipeline");

    // Load configuration
    let config = AppConfig::load()?;
    info!(
        threshold = config.scoring.threshold,
        timeout_ms = config.scoring.timeout_ms,
        history_window = config.history.window,
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Storage collaborator. The in-memory store stands in for the relational
    // store, which is provisioned outside this service; demo accounts make
    // the reference binary usable with the test producer.
    let store = Arc::new(MemoryStore::new());
    for (name, balance) in [("alice", 1000), ("bob", 5000)] {
        let account = store.add_account(name, Decimal::from(balance));
        info!(username = name, account_id = %account.id, balance = %account.balance, "Demo account provisioned");
    }

    // Alert fan-out: registry shared with the connection layer, one NATS
    // publisher registered as a subscriber.
    let registry = Arc::new(SubscriberRegistry::new(config.pipeline.alert_buffer));
    let (_publisher_id, alert_rx) = registry.register();
    let publisher = AlertPublisher::new(client.clone(), &config.nats.alert_subject);
    info!(subject = %publisher.subject(), "Mirroring fraud alerts to NATS");
    tokio::spawn(publisher.forward(alert_rx));

    // Pipeline components
    let scorer = Arc::new(NatsScorer::new(client.clone(), &config.scoring.subject));
    let scoring = ScoringClient::new(scorer, Duration::from_millis(config.scoring.timeout_ms));
    let history = HistoryReader::new(store.clone(), config.history.window);
    let policy = DecisionPolicy::new(config.scoring.threshold);
    let broadcaster = AlertBroadcaster::new(registry.clone());

    let coordinator = Arc::new(TransactionCoordinator::new(
        store.clone(),
        store.clone(),
        history,
        scoring,
        policy,
        broadcaster,
        metrics.clone(),
    ));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Process transaction requests until the subscription ends
    let server = PipelineServer::new(
        client,
        &config.nats.request_subject,
        coordinator,
        config.pipeline.workers,
    );
    server.run().await?;

    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
