//! Three consecutive 404s on chunk upload end the
//! daemon with reason "session deleted", and still clean up its state.

use crate::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn three_consecutive_chunk_404s_end_the_session() {
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
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = DaemonConfig::new("ext-deleted", &server.uri());
    let mut daemon = Daemon::spawn(config, &["A"]);

    let code = daemon.wait_for_exit(std::time::Duration::from_secs(5));
    assert_eq!(code, Some(0), "graceful exit, session deletion is not a crash");
    assert!(!daemon.state_path("ext-deleted").exists());
    assert!(!daemon.inbox_path("ext-deleted").exists());
}
