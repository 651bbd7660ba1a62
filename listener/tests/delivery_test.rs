use std::sync::Arc;
use std::time::{Duration, Instant};

use listener::concurrency::shutdown::{ShutdownResult, create_shutdown_channel};
use listener::conversions::event::OutboundEvent;
use listener::delivery::DeliveryCoordinator;
use listener::metrics::SessionMetrics;
use listener::test_utils::publisher::FlakyPublisher;
use listener_telemetry::init_test_tracing;

const RETRY_DELAY: Duration = Duration::from_millis(20);

fn event() -> OutboundEvent {
    OutboundEvent::new("demo_topic", "{\"id\":\"file\"}")
}

#[tokio::test]
async fn publisher_failing_once_is_retried_after_the_delay() {
    init_test_tracing();

    let metrics = Arc::new(SessionMetrics::new());
    let publisher = FlakyPublisher::new(1);
    let delivery = DeliveryCoordinator::new(publisher.clone(), RETRY_DELAY, metrics.clone());
    let (_shutdown_tx, mut shutdown_rx) = create_shutdown_channel();

    let started = Instant::now();
    let result = delivery.deliver(&event(), &mut shutdown_rx).await;

    assert!(!result.should_shutdown());
    assert!(started.elapsed() >= RETRY_DELAY);
    assert_eq!(publisher.attempts(), 2);
    assert_eq!(publisher.events().await, vec![event()]);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.errors_total, 1);
    assert_eq!(snapshot.messages_total, 1);
}

#[tokio::test]
async fn n_failures_take_n_plus_one_attempts() {
    init_test_tracing();

    for failures in 0..5 {
        let metrics = Arc::new(SessionMetrics::new());
        let publisher = FlakyPublisher::new(failures);
        let delivery =
            DeliveryCoordinator::new(publisher.clone(), Duration::from_millis(1), metrics.clone());
        let (_shutdown_tx, mut shutdown_rx) = create_shutdown_channel();

        let result = delivery.deliver(&event(), &mut shutdown_rx).await;

        assert!(matches!(result, ShutdownResult::Ok(())));
        assert_eq!(publisher.attempts(), failures + 1);
        assert_eq!(publisher.events().await.len(), 1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.errors_total, failures);
        assert_eq!(snapshot.messages_total, 1);
    }
}

#[tokio::test]
async fn shutdown_interrupts_retries() {
    init_test_tracing();

    let metrics = Arc::new(SessionMetrics::new());
    let publisher = FlakyPublisher::new(u64::MAX);
    let delivery =
        DeliveryCoordinator::new(publisher.clone(), Duration::from_secs(3600), metrics.clone());
    let (shutdown_tx, mut shutdown_rx) = create_shutdown_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.shutdown().unwrap();
    });

    let result = delivery.deliver(&event(), &mut shutdown_rx).await;

    assert!(result.should_shutdown());
    assert_eq!(publisher.attempts(), 1);
    assert!(publisher.events().await.is_empty());

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.errors_total, 1);
    assert_eq!(snapshot.messages_total, 0);
}
