use std::time::{Duration, Instant};

use ratekeeper::{
    models::decision::Decision,
    services::{metrics::Metrics, registry::AccountRegistry, token_bucket::TokenBucket},
    AppState,
};
use tracing::{error, info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let capacity = std::env::var("BUCKET_CAPACITY")
        .unwrap_or_else(|_| "10".to_string())
        .parse::<u64>()
        .expect("BUCKET_CAPACITY must be a non-negative integer");
    let refill_secs = std::env::var("REFILL_INTERVAL_SECS")
        .unwrap_or_else(|_| "5".to_string())
        .parse::<f64>()
        .expect("REFILL_INTERVAL_SECS must be a number of seconds");
    let workers = std::env::var("WORKER_COUNT")
        .unwrap_or_else(|_| "2".to_string())
        .parse::<usize>()
        .expect("WORKER_COUNT must be a positive integer");
    let request_period_ms = std::env::var("REQUEST_PERIOD_MS")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u64>()
        .expect("REQUEST_PERIOD_MS must be a number of milliseconds");
    let simulation_secs = std::env::var("SIMULATION_SECS")
        .unwrap_or_else(|_| "60".to_string())
        .parse::<u64>()
        .expect("SIMULATION_SECS must be a number of seconds");

    info!("Starting ratekeeper simulation");

    let state = AppState {
        registry: AccountRegistry::new(),
        metrics: Metrics::new(),
        start_time: Instant::now(),
    };

    let primary = match TokenBucket::with_refill_secs(capacity, refill_secs) {
        Ok(bucket) => bucket,
        Err(e) => {
            error!("Invalid bucket configuration: {}", e);
            return Err(e.into());
        }
    };
    state
        .registry
        .register("account-1".to_string(), primary)
        .await?;

    // Second tenant runs at a fixed mid rate: 5 tokens, one back every 10s.
    let secondary = TokenBucket::with_refill_secs(5, 10.0)?;
    state
        .registry
        .register("account-2".to_string(), secondary)
        .await?;

    let mut accounts = state.registry.accounts().await;
    accounts.sort();
    for account in &accounts {
        let snapshot = state.registry.peek(account).await?;
        info!(
            "Registered {} with {}/{} tokens",
            account, snapshot.tokens, snapshot.capacity
        );
    }

    let deadline = Instant::now() + Duration::from_secs(simulation_secs);
    let period = Duration::from_millis(request_period_ms);
    info!(
        "Simulating {} workers for {}s, one request per account every {}ms",
        workers, simulation_secs, request_period_ms
    );

    let mut handles = Vec::new();
    for worker_id in 0..workers {
        let state = state.clone();
        let accounts = accounts.clone();
        handles.push(tokio::spawn(async move {
            while Instant::now() < deadline {
                for account in &accounts {
                    let request_id = Uuid::new_v4();
                    match state.registry.try_consume(account).await {
                        Ok(Decision::Admitted { remaining_tokens }) => {
                            state.metrics.increment_admitted();
                            info!(
                                "[worker {}] request {} to {} admitted, {} tokens left",
                                worker_id, request_id, account, remaining_tokens
                            );
                        }
                        Ok(Decision::Rejected { wait, .. }) => {
                            state.metrics.increment_rejected();
                            state
                                .metrics
                                .record_rejection_wait(wait.as_secs_f64())
                                .await;
                            warn!(
                                "[worker {}] request {} to {} rejected, next token in {:.1}s",
                                worker_id,
                                request_id,
                                account,
                                wait.as_secs_f64()
                            );
                        }
                        Err(e) => {
                            error!(
                                "[worker {}] request {} to {} failed: {}",
                                worker_id, request_id, account, e
                            );
                        }
                    }
                }
                tokio::time::sleep(period).await;
            }
        }));
    }

    for handle in handles {
        handle.await?;
    }

    let mut buckets = serde_json::Map::new();
    for account in &accounts {
        let snapshot = state.registry.peek(account).await?;
        buckets.insert(account.clone(), serde_json::to_value(snapshot)?);
    }
    let summary = serde_json::json!({
        "finished_at": chrono::Utc::now().to_rfc3339(),
        "elapsed_seconds": state.start_time.elapsed().as_secs(),
        "totals": state.metrics.get_stats().await,
        "buckets": buckets,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
