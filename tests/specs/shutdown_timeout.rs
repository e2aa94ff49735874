//! A stalled backend during the final sync must
//! not hold up shutdown past `shutdown_timeout` plus slack.

use crate::prelude::*;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn final_sync_is_bounded_by_shutdown_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "session_id": "backend-1",
            "files": {}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sync/chunk"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)).set_body_json(
            serde_json::json!({ "last_synced_line": 1 }),
        ))
        .mount(&server)
        .await;

    let mut config = DaemonConfig::new("ext-stall", &server.uri()).shutdown_timeout_ms(200);
    config.sync_interval_ms = 5_000;
    let mut daemon = Daemon::spawn(config, &["A"]);

    assert!(
        wait_for_async(2_000, || async {
            server
                .received_requests()
                .await
                .unwrap_or_default()
                .iter()
                .any(|r| r.url.path() == "/sync/init")
        })
        .await,
        "expected init before the long sync_interval tick"
    );

    let shutdown_started = Instant::now();
    daemon.request_shutdown();
    let code = daemon.wait_for_exit(Duration::from_secs(3));
    let elapsed = shutdown_started.elapsed();

    assert_eq!(code, Some(0));
    assert!(
        elapsed < Duration::from_millis(1_500),
        "shutdown took {elapsed:?}, expected it to be bounded by the 200ms shutdown_timeout, not the backend's 2s stall"
    );
    assert!(!daemon.state_path("ext-stall").exists());
    assert!(!daemon.inbox_path("ext-stall").exists());
}
