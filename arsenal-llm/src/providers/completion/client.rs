//! Completion HTTP client with rate limiting

use super::types::ApiError;
use arsenal_core::{ArsenalResult, ProviderError};
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

const PROVIDER: &str = "completion";

/// Completion API client with rate limiting.
pub struct CompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: Arc<Semaphore>,
    last_request: Arc<Mutex<Option<Instant>>>,
    min_request_interval: Duration,
}

impl CompletionClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_key` - Bearer token for the endpoint
    /// * `requests_per_minute` - Maximum requests per minute
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        let permits = (requests_per_minute as usize).max(1);
        let min_interval_ms = (60_000 / requests_per_minute.max(1) as u64).max(10);

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            rate_limiter: Arc::new(Semaphore::new(permits)),
            last_request: Arc::new(Mutex::new(None)),
            min_request_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Override the endpoint base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Make a JSON API request with automatic rate limiting.
    pub async fn request<Req: Serialize, Res: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> ArsenalResult<Res> {
        let response = self.send(endpoint, body).await?;
        response.json().await.map_err(|e| {
            ProviderError::Decoding {
                provider: PROVIDER.to_string(),
                reason: format!("failed to parse response: {}", e),
            }
            .into()
        })
    }

    /// Make a streaming request; returns the server-sent event stream.
    pub async fn stream_request<Req: Serialize>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> ArsenalResult<SseStream> {
        let response = self.send(endpoint, body).await?;
        Ok(SseStream::new(response))
    }

    /// Rate-limited POST returning the raw response on success status.
    async fn send<Req: Serialize>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> ArsenalResult<reqwest::Response> {
        // Rate limiting: acquire permit.
        let _permit = self.rate_limiter.acquire().await.map_err(|e| {
            ProviderError::RemoteCall {
                provider: PROVIDER.to_string(),
                status: 0,
                message: format!("rate limiter closed: {}", e),
            }
        })?;

        // Enforce minimum interval between requests.
        {
            let mut last = self.last_request.lock().await;
            if let Some(previous) = *last {
                let elapsed = previous.elapsed();
                if elapsed < self.min_request_interval {
                    tokio::time::sleep(self.min_request_interval - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(url = %url, "Completion API request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::RemoteCall {
                provider: PROVIDER.to_string(),
                status: 0,
                message: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = match serde_json::from_str::<ApiError>(&error_text) {
            Ok(api_error) => api_error.error.message,
            Err(_) => error_text,
        };

        tracing::warn!(status = status.as_u16(), message = %message, "Completion API error");

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::RemoteCall {
                provider: PROVIDER.to_string(),
                status: status.as_u16() as i32,
                message: format!("credential rejected: {}", message),
            },
            _ => ProviderError::RemoteCall {
                provider: PROVIDER.to_string(),
                status: status.as_u16() as i32,
                message,
            },
        }
        .into())
    }
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// SERVER-SENT EVENTS
// ============================================================================

/// Buffered reader over a `text/event-stream` response body.
///
/// Yields the payload of each `data:` line; the `[DONE]` sentinel ends the
/// stream.
pub struct SseStream {
    stream: std::pin::Pin<Box<dyn futures_util::Stream<Item = reqwest::Result<Vec<u8>>> + Send>>,
    buffer: Vec<u8>,
    done: bool,
}

impl SseStream {
    fn new(response: reqwest::Response) -> Self {
        Self {
            stream: Box::pin(response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec()))),
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Next `data:` payload, or `None` when the stream has ended.
    pub async fn next_data(&mut self) -> ArsenalResult<Option<String>> {
        if self.done {
            return Ok(None);
        }

        loop {
            if let Some(line) = self.take_line() {
                let line = line.trim();
                if let Some(payload) = line.strip_prefix("data:") {
                    let payload = payload.trim();
                    if payload == "[DONE]" {
                        self.done = true;
                        return Ok(None);
                    }
                    if !payload.is_empty() {
                        return Ok(Some(payload.to_string()));
                    }
                }
                continue;
            }

            match self.stream.next().await {
                Some(Ok(bytes)) => self.buffer.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    return Err(ProviderError::Decoding {
                        provider: PROVIDER.to_string(),
                        reason: format!("stream read failed: {}", e),
                    }
                    .into())
                }
                None => {
                    self.done = true;
                    return Ok(None);
                }
            }
        }
    }

    /// Pop one newline-terminated line from the buffer.
    fn take_line(&mut self) -> Option<String> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=newline).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}
