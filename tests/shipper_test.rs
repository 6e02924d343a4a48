mod common;

use common::{contents_of, eventually, quiet_config, shipper, RecordingTransport};
use log_shipper::{FlushOutcome, FlushState, LogShipper};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn threshold_triggers_exactly_one_flush_in_order() {
    let transport = RecordingTransport::succeeding();
    let shipper = shipper(quiet_config(5), Arc::clone(&transport));

    for i in 0..4 {
        shipper.log("INFO", None, &format!("line {i}"));
    }
    sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.calls(), 0, "below threshold must not flush");

    shipper.log("INFO", None, "line 4");
    eventually(|| transport.calls() == 1).await;
    sleep(Duration::from_millis(50)).await;

    assert_eq!(transport.calls(), 1);
    assert_eq!(
        transport.contents()[0],
        ["line 0", "line 1", "line 2", "line 3", "line 4"]
    );
    assert_eq!(shipper.buffered(), 0);
}

#[tokio::test]
async fn payload_carries_source_identifier() {
    let transport = RecordingTransport::succeeding();
    let shipper = shipper(quiet_config(1), Arc::clone(&transport));

    shipper.log("ERROR", Some("trace-3"), "Failed to process request\nStack trace: ...");
    eventually(|| transport.calls() == 1).await;

    let payload = &transport.payloads()[0];
    assert_eq!(payload.source, "test-app");
    let fields = payload.logs[0].fields().unwrap();
    assert_eq!(fields.level, "ERROR");
    assert_eq!(fields.trace_id.as_deref(), Some("trace-3"));
    assert_eq!(fields.content, "Failed to process request\nStack trace: ...");
    assert!(!payload.logs[0].as_str().contains('\n'));
}

#[tokio::test]
async fn failing_transport_never_loses_entries() {
    let transport = RecordingTransport::failing();
    let shipper = shipper(quiet_config(100), Arc::clone(&transport));

    for c in ["a", "b", "c"] {
        shipper.log("WARN", None, c);
    }
    shipper.start_auto_flush_every(Duration::from_millis(20));
    eventually(|| transport.calls() >= 3).await;

    // Wait for any attempt still in flight to requeue.
    shipper.stop_auto_flush();
    assert_eq!(shipper.flush_and_wait().await, FlushOutcome::Requeued(3));

    assert_eq!(contents_of(&shipper.pending()), ["a", "b", "c"]);
    for batch in transport.contents() {
        assert_eq!(batch, ["a", "b", "c"]);
    }
    let stats = shipper.stats();
    assert_eq!(stats.delivered, 0);
    assert_eq!(stats.buffered, 3);
    assert!(stats.failed_attempts >= 3);
}

#[tokio::test]
async fn successful_flush_leaves_nothing_behind() {
    let transport = RecordingTransport::succeeding();
    let shipper = shipper(quiet_config(100), Arc::clone(&transport));

    for i in 0..10 {
        shipper.log("INFO", None, &i.to_string());
    }
    assert_eq!(shipper.flush_and_wait().await, FlushOutcome::Delivered(10));
    assert_eq!(shipper.buffered(), 0);
    assert_eq!(shipper.flush_and_wait().await, FlushOutcome::Idle);
    assert_eq!(transport.calls(), 1);

    let stats = shipper.stats();
    assert_eq!(stats.appended, 10);
    assert_eq!(stats.delivered, 10);
}

#[tokio::test]
async fn retried_batch_precedes_newer_entries() {
    let transport = RecordingTransport::failing();
    let shipper = shipper(quiet_config(100), Arc::clone(&transport));

    shipper.log("INFO", None, "A");
    assert_eq!(shipper.flush_and_wait().await, FlushOutcome::Requeued(1));

    transport.set_failing(false);
    shipper.log("INFO", None, "B");
    assert_eq!(shipper.flush_and_wait().await, FlushOutcome::Delivered(2));

    assert_eq!(transport.contents(), vec![vec!["A"], vec!["A", "B"]]);
}

#[tokio::test]
async fn idle_flush_is_a_no_op() {
    let transport = RecordingTransport::succeeding();
    let shipper = shipper(quiet_config(1), Arc::clone(&transport));

    shipper.flush();
    assert_eq!(shipper.flush_and_wait().await, FlushOutcome::Idle);
    sleep(Duration::from_millis(50)).await;

    assert_eq!(transport.calls(), 0);
    assert_eq!(shipper.stats(), Default::default());
    assert_eq!(shipper.state(), FlushState::Idle);
}

#[tokio::test]
async fn explicit_flush_ships_below_threshold() {
    let transport = RecordingTransport::succeeding();
    let shipper = shipper(quiet_config(100), Arc::clone(&transport));

    shipper.log("DEBUG", None, "early");
    shipper.flush();
    eventually(|| transport.calls() == 1).await;
    assert_eq!(transport.contents()[0], ["early"]);
}

#[tokio::test]
async fn auto_flush_ships_accumulated_entries() {
    let transport = RecordingTransport::succeeding();
    let config = quiet_config(100).with_flush_interval(Duration::from_millis(30));
    let shipper = shipper(config, Arc::clone(&transport));

    shipper.log("INFO", None, "x");
    shipper.log("INFO", None, "y");
    eventually(|| transport.calls() == 1).await;
    assert_eq!(transport.contents()[0], ["x", "y"]);
}

#[tokio::test]
async fn close_drains_remainder_and_is_idempotent() {
    let transport = RecordingTransport::succeeding();
    let shipper = shipper(quiet_config(100), Arc::clone(&transport));

    shipper.log("INFO", None, "one");
    shipper.log("INFO", None, "two");
    assert_eq!(shipper.close().await, FlushOutcome::Delivered(2));
    assert_eq!(transport.contents(), vec![vec!["one", "two"]]);

    assert_eq!(shipper.close().await, FlushOutcome::Idle);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn logs_after_close_are_dropped_and_counted() {
    let transport = RecordingTransport::succeeding();
    let shipper = shipper(quiet_config(1), Arc::clone(&transport));
    shipper.close().await;

    for i in 0..50 {
        shipper.log("INFO", None, &format!("late {i}"));
    }
    shipper.start_auto_flush_every(Duration::from_millis(10));
    assert_eq!(shipper.flush_and_wait().await, FlushOutcome::Idle);

    let stats = shipper.stats();
    assert_eq!(stats.buffered, 0);
    assert_eq!(stats.dropped, 50);
    assert_eq!(stats.appended, 50);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn bounded_buffer_drops_oldest_and_counts() {
    let transport = RecordingTransport::failing();
    let config = quiet_config(100).with_capacity(3);
    let shipper = shipper(config, Arc::clone(&transport));

    for c in ["a", "b", "c", "d", "e"] {
        shipper.log("INFO", None, c);
    }
    assert_eq!(contents_of(&shipper.pending()), ["c", "d", "e"]);
    assert_eq!(shipper.stats().dropped, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_lose_and_duplicate_nothing() {
    let transport = RecordingTransport::succeeding();
    let config = quiet_config(7).with_flush_interval(Duration::from_millis(10));
    let shipper = Arc::new(shipper(config, Arc::clone(&transport)));

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let shipper = Arc::clone(&shipper);
            tokio::task::spawn_blocking(move || {
                for i in 0..200 {
                    shipper.log("INFO", None, &format!("{p}-{i}"));
                }
            })
        })
        .collect();
    for p in producers {
        p.await.unwrap();
    }
    shipper.close().await;

    let mut shipped: Vec<String> = transport.contents().into_iter().flatten().collect();
    assert_eq!(shipped.len(), 800);
    shipped.sort();
    shipped.dedup();
    assert_eq!(shipped.len(), 800);
}

#[tokio::test]
async fn builder_coerces_zero_threshold() {
    let transport = RecordingTransport::succeeding();
    let shipper = LogShipper::new("http://unused", "")
        .configure(|c| c.flush_interval = Duration::from_secs(3600))
        .init_with_transport(0, transport.clone())
        .unwrap();

    assert_eq!(shipper.config().batch_threshold, 1);
    assert_eq!(shipper.config().source, "rust-app");

    shipper.log("INFO", None, "immediate");
    eventually(|| transport.calls() == 1).await;
}
