//! Authorization rotation. The first init attempt
//! carries a bad key and is rejected; once the config file is rewritten with
//! a good key, the next tick's init succeeds and chunk uploads follow.

use crate::prelude::*;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn bad_key_then_rotated_key_recovers_without_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync/init"))
        .and(header("authorization", "Bearer bad-key"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sync/init"))
        .and(header("authorization", "Bearer good-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "session_id": "backend-1",
            "files": {}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sync/chunk"))
        .and(header("authorization", "Bearer good-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "last_synced_line": 1
        })))
        .mount(&server)
        .await;

    let mut config = DaemonConfig::new("ext-rotate", &server.uri());
    config.api_key = "bad-key".to_string();
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
        "expected at least one rejected init attempt"
    );

    daemon.update_api_key("good-key");

    assert!(
        wait_for_async(2_000, || async {
            server
                .received_requests()
                .await
                .unwrap_or_default()
                .iter()
                .any(|r| r.url.path() == "/sync/chunk")
        })
        .await,
        "expected a chunk upload once the rotated key was picked up"
    );

    daemon.request_shutdown();
    let code = daemon.wait_for_exit(std::time::Duration::from_secs(5));
    assert_eq!(code, Some(0));
}
