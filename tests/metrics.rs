use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use ratekeeper::models::decision::Decision;
use ratekeeper::services::metrics::Metrics;
use ratekeeper::services::registry::AccountRegistry;
use ratekeeper::services::token_bucket::TokenBucket;
use ratekeeper::AppState;

#[tokio::test]
async fn counters_track_increments() {
    let metrics = Metrics::new();

    assert_eq!(metrics.requests_admitted.load(Ordering::Relaxed), 0);
    metrics.increment_admitted();
    metrics.increment_admitted();
    assert_eq!(metrics.requests_admitted.load(Ordering::Relaxed), 2);

    assert_eq!(metrics.requests_rejected.load(Ordering::Relaxed), 0);
    metrics.increment_rejected();
    assert_eq!(metrics.requests_rejected.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn rejection_wait_samples_are_capped() {
    let metrics = Metrics::new();

    for i in 0..1500 {
        metrics.record_rejection_wait(i as f64 * 0.001).await;
    }

    let waits = metrics.rejection_waits.read().await;
    assert!(waits.len() <= 1000);
    // The most recent sample survives the drain.
    assert!((waits.last().unwrap() - 1.499).abs() < 0.001);
}

#[tokio::test]
async fn get_stats_reports_totals_and_average_wait() {
    let metrics = Metrics::new();

    metrics.increment_admitted();
    metrics.increment_rejected();
    metrics.record_rejection_wait(2.0).await;
    metrics.record_rejection_wait(4.0).await;

    let stats = metrics.get_stats().await;
    assert_eq!(stats.get("requests_admitted"), Some(&"1".to_string()));
    assert_eq!(stats.get("requests_rejected"), Some(&"1".to_string()));

    let avg: f64 = stats
        .get("avg_rejection_wait_seconds")
        .expect("average present")
        .parse()
        .expect("average parses");
    assert!((avg - 3.0).abs() < 0.001);
}

#[tokio::test]
async fn get_stats_omits_average_without_samples() {
    let metrics = Metrics::new();
    let stats = metrics.get_stats().await;
    assert!(!stats.contains_key("avg_rejection_wait_seconds"));
}

#[tokio::test]
async fn driver_style_flow_accounts_for_every_request() {
    let state = AppState {
        registry: AccountRegistry::new(),
        metrics: Metrics::new(),
        start_time: Instant::now(),
    };
    state
        .registry
        .register(
            "acct-1".to_string(),
            TokenBucket::new(3, Duration::from_secs(60)).expect("valid config"),
        )
        .await
        .expect("registration succeeds");

    for _ in 0..5 {
        match state.registry.try_consume("acct-1").await.unwrap() {
            Decision::Admitted { .. } => state.metrics.increment_admitted(),
            Decision::Rejected { wait, .. } => {
                state.metrics.increment_rejected();
                state
                    .metrics
                    .record_rejection_wait(wait.as_secs_f64())
                    .await;
            }
        }
    }

    let stats = state.metrics.get_stats().await;
    assert_eq!(stats.get("requests_admitted"), Some(&"3".to_string()));
    assert_eq!(stats.get("requests_rejected"), Some(&"2".to_string()));
    assert!(stats.contains_key("avg_rejection_wait_seconds"));
}
