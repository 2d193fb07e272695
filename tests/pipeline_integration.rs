//! End-to-end tests: log lines in, ntfy requests and statistics out.

use std::sync::Arc;
use std::time::Duration;

use interview_notify::analytics::AnalyticsBridge;
use interview_notify::detect::{DetectorConfig, EventDetector};
use interview_notify::monitor::{LinePipeline, Monitor};
use interview_notify::notification::{
    Destination, Dispatcher, NotificationLog, NtfyTransport, RateLimiter,
};
use interview_notify::stats::{InterviewStore, RecordKind};
use interview_notify::watcher::LineHandler;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn detector() -> EventDetector {
    EventDetector::new(DetectorConfig::new("alice", vec!["Gatekeeper".to_string()]))
        .expect("Failed to build detector")
}

fn dispatcher(server: &MockServer) -> Arc<Dispatcher> {
    Arc::new(Dispatcher::new(
        Arc::new(NtfyTransport::new().expect("Failed to build transport")),
        Destination::new(server.uri(), "alice-alerts"),
        RateLimiter::default(),
    ))
}

/// Test that processed lines notify and record statistics.
#[tokio::test]
async fn test_pipeline_notifies_and_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alice-alerts"))
        .and(header("Tags", "warning"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    // The outcome kick names another user, so it must not alert.
    Mock::given(method("POST"))
        .and(path("/alice-alerts"))
        .and(header("Tags", "anger"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(
        InterviewStore::open(temp_dir.path().join("stats/interviews.db"))
            .await
            .expect("Failed to open store"),
    );
    let pipeline = LinePipeline::new(detector(), dispatcher(&server))
        .with_analytics(AnalyticsBridge::new(store.clone()));

    pipeline
        .process(
            "<Gatekeeper> Currently interviewing: bob ::: #red-interview-01 ::: 7 remaining in queue.",
            "#red-invites",
        )
        .await;
    pipeline
        .process(
            "* Gatekeeper kicked bob from the channel (Congratulations! Welcome to the community.)",
            "#red-invites",
        )
        .await;
    // Plain chat does nothing.
    pipeline.process("<carol> hello all", "#red-invites").await;

    let history = store.user_history("bob", 10).await.unwrap();
    let kinds: Vec<RecordKind> = history.iter().map(|r| r.kind).collect();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&RecordKind::Started));
    assert!(kinds.contains(&RecordKind::Passed));

    let stats = store.statistics(1, Some("#red-invites")).await.unwrap();
    assert_eq!(stats.total_interviews, 1);
    assert_eq!(stats.passed, 1);
    assert!((stats.avg_queue_length - 7.0).abs() < f64::EPSILON);

    let trends = store.queue_trends(1, None).await.unwrap();
    assert_eq!(trends.len(), 1);
    assert_eq!(trends[0].queue_length, 7);
}

/// Test the full path from an appended log line to a posted notification.
#[tokio::test]
async fn test_monitor_to_ntfy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alice-alerts"))
        .and(header("Priority", "5"))
        .and(header("Tags", "rotating_light"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let channel_dir = temp_dir.path().join("#red-invites");
    std::fs::create_dir(&channel_dir).unwrap();
    let log = channel_dir.join("2024-05-01.log");
    std::fs::write(&log, "<carol> morning\n").unwrap();
    let notify_log = temp_dir.path().join("notifications.log");

    let dispatcher = Arc::new(
        Dispatcher::new(
            Arc::new(NtfyTransport::new().unwrap()),
            Destination::new(server.uri(), "alice-alerts"),
            RateLimiter::default(),
        )
        .with_log(NotificationLog::new(&notify_log)),
    );
    let handler: Arc<dyn LineHandler> = Arc::new(LinePipeline::new(detector(), dispatcher));
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(
        Monitor::new(vec![channel_dir.clone()], handler)
            .with_intervals(Duration::from_millis(30), Duration::from_millis(10))
            .run(shutdown.clone()),
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new().append(true).open(&log).unwrap();
        writeln!(
            file,
            "<Gatekeeper> Currently interviewing: alice ::: #red-interview-02 ::: 3 remaining in queue."
        )
        .unwrap();
    }

    let mut received = Vec::new();
    for _ in 0..200 {
        received = server.received_requests().await.unwrap_or_default();
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].url.path(), "/alice-alerts");
    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains("Currently interviewing: alice"));

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("Monitor did not stop")
        .expect("Monitor panicked")
        .expect("Monitor failed");

    let content = std::fs::read_to_string(&notify_log).unwrap();
    assert!(content.contains("type=your_interview priority=5"));
}
