// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP implementation of the sync transport.

use crate::error::TransportError;
use crate::wire::{ChunkRequest, ChunkResponse, InitRequest, InitResponse, SessionEndRequest};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Request bodies above this size are zstd-compressed before sending.
const COMPRESSION_THRESHOLD_BYTES: usize = 1024;

const ZSTD_LEVEL: i32 = 3;

/// Per-request wall-clock timeouts.
const INIT_TIMEOUT: Duration = Duration::from_secs(15);
const CHUNK_TIMEOUT: Duration = Duration::from_secs(120);
const SESSION_END_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub api_key: String,
}

/// The backend boundary the sync engine talks through. A trait so tests can
/// substitute a fake without standing up a real HTTP server when they only
/// care about engine logic, and so wiremock-backed tests can exercise the
/// real `HttpSyncTransport` against a local mock server.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn init(&self, req: &InitRequest) -> Result<InitResponse, TransportError>;

    async fn send_chunk(&self, req: &ChunkRequest) -> Result<ChunkResponse, TransportError>;

    async fn send_session_end(
        &self,
        session_id: &str,
        req: &SessionEndRequest<'_>,
    ) -> Result<(), TransportError>;
}

pub struct HttpSyncTransport {
    config: HttpConfig,
    client: reqwest::Client,
}

impl HttpSyncTransport {
    pub fn new(config: HttpConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<Response, TransportError> {
        let json_bytes = serde_json::to_vec(body)
            .map_err(|e| TransportError::BadRequest(format!("failed to serialize request: {e}")))?;

        let mut request = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.api_key)
            .timeout(timeout);

        request = if json_bytes.len() > COMPRESSION_THRESHOLD_BYTES {
            let compressed = zstd::encode_all(json_bytes.as_slice(), ZSTD_LEVEL)
                .map_err(|e| TransportError::Transient(format!("compression failed: {e}")))?;
            request
                .header("Content-Encoding", "zstd")
                .header("Content-Type", "application/json")
                .body(compressed)
        } else {
            request
                .header("Content-Type", "application/json")
                .body(json_bytes)
        };

        request.send().await.map_err(classify_send_error)
    }
}

/// Maps a transport-level failure (timeout, DNS, connection refused, ...)
/// into `Transient` — the daemon's tick retries it, it never blocks progress.
fn classify_send_error(error: reqwest::Error) -> TransportError {
    TransportError::Transient(error.to_string())
}

/// Classifies an HTTP response into the typed error taxonomy.
async fn classify_response(response: Response) -> Result<Response, TransportError> {
    match response.status() {
        StatusCode::OK | StatusCode::CREATED => Ok(response),
        StatusCode::UNAUTHORIZED => Err(TransportError::Unauthorized),
        StatusCode::NOT_FOUND => Err(TransportError::SessionNotFound),
        StatusCode::CONFLICT => Err(TransportError::Conflict),
        StatusCode::BAD_REQUEST => {
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::BadRequest(body))
        }
        status if status.is_server_error() => {
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::Transient(format!("{status}: {body}")))
        }
        status => {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "unexpected status from backend, treating as transient");
            Err(TransportError::Transient(format!("{status}: {body}")))
        }
    }
}

async fn decode_json<T: for<'de> serde::Deserialize<'de>>(
    response: Response,
) -> Result<T, TransportError> {
    response
        .json::<T>()
        .await
        .map_err(|e| TransportError::Transient(format!("failed to decode response: {e}")))
}

#[async_trait]
impl SyncTransport for HttpSyncTransport {
    async fn init(&self, req: &InitRequest) -> Result<InitResponse, TransportError> {
        debug!(external_id = %req.external_id, "POST /sync/init");
        let response = self.post_json("/sync/init", req, INIT_TIMEOUT).await?;
        let response = classify_response(response).await?;
        decode_json(response).await
    }

    async fn send_chunk(&self, req: &ChunkRequest) -> Result<ChunkResponse, TransportError> {
        debug!(
            session_id = %req.session_id,
            file = %req.file_name,
            first_line = req.first_line,
            lines = req.lines.len(),
            "POST /sync/chunk"
        );
        let response = self.post_json("/sync/chunk", req, CHUNK_TIMEOUT).await?;
        let response = classify_response(response).await?;
        decode_json(response).await
    }

    async fn send_session_end(
        &self,
        session_id: &str,
        req: &SessionEndRequest<'_>,
    ) -> Result<(), TransportError> {
        debug!(session_id, "POST /sessions/{{id}}/session-end");
        let path = format!("/sessions/{session_id}/session-end");
        let response = self.post_json(&path, req, SESSION_END_TIMEOUT).await?;
        classify_response(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
