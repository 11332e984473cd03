//! WebSocket implementation of the push seam.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info};
use tokio::time::{self, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use super::http::truncate_body;
use super::{PushChannel, StatusStream};
use crate::config::{ChannelConfig, ServerConfig};
use crate::error::TransportError;
use crate::model::{JobId, StatusEvent};

/// Text frame written at every keepalive tick.
const KEEPALIVE_FRAME: &str = "ping";

/// Subscribes to per-job status frames over a WebSocket.
///
/// Each text frame is a JSON [`StatusEvent`]. The backend only looks at a
/// job's final status when the client writes to the socket, so a keepalive
/// frame goes out at a fixed interval for as long as the stream is polled.
pub struct WsPushChannel {
    base_url: reqwest::Url,
    path: String,
    connect_timeout: Duration,
    keepalive: Duration,
}

enum Step {
    Keepalive,
    Frame(Option<Result<Message, WsError>>),
}

impl WsPushChannel {
    pub fn new(server: &ServerConfig, channels: &ChannelConfig) -> Result<Self, TransportError> {
        let mut base_url = reqwest::Url::parse(server.base_url.trim()).map_err(|e| {
            TransportError::Network(format!("Invalid base URL '{}': {}", server.base_url, e))
        })?;
        let scheme = if base_url.scheme() == "https" { "wss" } else { "ws" };
        base_url.set_scheme(scheme).map_err(|_| {
            TransportError::Network(format!(
                "Cannot derive a WebSocket URL from '{}'",
                server.base_url
            ))
        })?;

        Ok(Self {
            base_url,
            path: server.paths.push.clone(),
            connect_timeout: server.connect_timeout(),
            keepalive: channels.keepalive(),
        })
    }

    fn url(&self, job_id: &JobId) -> String {
        format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.path.replace("{id}", job_id.as_str())
        )
    }
}

fn handshake_error(err: WsError, job_id: &JobId) -> TransportError {
    match err {
        WsError::Http(response) if response.status() == StatusCode::NOT_FOUND => {
            TransportError::NotFound(job_id.clone())
        }
        WsError::Http(response) => {
            let body = response
                .body()
                .as_deref()
                .map(String::from_utf8_lossy)
                .unwrap_or_default();
            TransportError::Http {
                status: response.status().as_u16(),
                body: truncate_body(&body),
            }
        }
        other => TransportError::Network(other.to_string()),
    }
}

fn decode(payload: &[u8]) -> Result<StatusEvent, TransportError> {
    serde_json::from_slice(payload).map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl PushChannel for WsPushChannel {
    async fn subscribe(&self, job_id: &JobId) -> Result<StatusStream, TransportError> {
        let url = self.url(job_id);
        let (mut socket, _) = time::timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| TransportError::Network(format!("Timed out connecting to {}", url)))?
            .map_err(|e| handshake_error(e, job_id))?;
        info!("Push channel opened for job {}", job_id);

        let period = self.keepalive;
        let id = job_id.clone();
        let stream = async_stream::stream! {
            let mut keepalive = time::interval_at(time::Instant::now() + period, period);
            keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let step = tokio::select! {
                    _ = keepalive.tick() => Step::Keepalive,
                    frame = socket.next() => Step::Frame(frame),
                };
                match step {
                    Step::Keepalive => {
                        if let Err(e) = socket.send(Message::Text(KEEPALIVE_FRAME.to_string())).await {
                            yield Err(TransportError::Network(e.to_string()));
                            break;
                        }
                    }
                    Step::Frame(Some(Ok(Message::Text(text)))) => yield decode(text.as_bytes()),
                    Step::Frame(Some(Ok(Message::Binary(bytes)))) => yield decode(&bytes),
                    Step::Frame(Some(Ok(Message::Close(_)))) | Step::Frame(None) => {
                        debug!("Push channel for job {} closed by the server", id);
                        break;
                    }
                    Step::Frame(Some(Ok(_))) => {}
                    Step::Frame(Some(Err(e))) => {
                        yield Err(TransportError::Network(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(stream.boxed())
    }
}
