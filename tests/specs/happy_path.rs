//! Happy path. Three transcript lines upload as one
//! chunk, a fourth appended line uploads as a second chunk, then a clean
//! shutdown leaves no state or inbox file behind and sends no session-end.

use crate::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn chunk_requests(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/sync/chunk")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn happy_path_uploads_then_shuts_down_cleanly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "session_id": "backend-1",
            "files": {}
        })))
        .mount(&server)
        .await;
    // First chunk acks lines 1-3, second acks line 4 — the engine only ever
    // advances its tracker forward, so the ack must reflect what was sent.
    Mock::given(method("POST"))
        .and(path("/sync/chunk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "last_synced_line": 3
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sync/chunk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "last_synced_line": 4
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let config = DaemonConfig::new("ext-happy", &server.uri());
    let mut daemon = Daemon::spawn(config, &["A", "B", "C"]);

    assert!(
        wait_for_async(2_000, || async { !chunk_requests(&server).await.is_empty() }).await,
        "expected a chunk upload"
    );

    daemon.append_transcript_line("D");

    assert!(
        wait_for_async(2_000, || async { chunk_requests(&server).await.len() >= 2 }).await,
        "expected a second chunk upload after appending a line"
    );

    let chunks = chunk_requests(&server).await;
    similar_asserts::assert_eq!(chunks[0]["first_line"], serde_json::json!(1));
    similar_asserts::assert_eq!(chunks[0]["lines"], serde_json::json!(["A", "B", "C"]));
    similar_asserts::assert_eq!(chunks[1]["first_line"], serde_json::json!(4));
    similar_asserts::assert_eq!(chunks[1]["lines"], serde_json::json!(["D"]));

    daemon.request_shutdown();
    let code = daemon.wait_for_exit(std::time::Duration::from_secs(5));
    assert_eq!(code, Some(0));

    assert!(!daemon.state_path("ext-happy").exists());
    assert!(!daemon.inbox_path("ext-happy").exists());

    let session_end_sent = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .any(|r| r.url.path().contains("session-end"));
    assert!(!session_end_sent, "no session_end event was enqueued");
}
