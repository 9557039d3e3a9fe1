//! Live event stream with auto-reconnect.
//!
//! Connects to the controller's push channel and fans inbound frames out
//! through a [`tokio::sync::broadcast`] channel. Two framings are
//! supported: Socket.IO (Engine.IO v4 over WebSocket, which is what the
//! controller's relay speaks) and bare JSON text frames. Reconnection uses
//! exponential backoff + jitter.
//!
//! Frames are handed on as raw text. Deciding what a payload *is* belongs
//! to the consumer; this module only strips transport framing.
//!
//! # Example
//!
//! ```rust,ignore
//! use thermo_api::websocket::{ReconnectConfig, StreamHandle, StreamProtocol};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let url = Url::parse("http://localhost:5001")?;
//!
//! let handle = StreamHandle::connect(url, StreamProtocol::SocketIo, ReconnectConfig::default(), cancel)?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(frame) = rx.recv().await {
//!     println!("{}: {}", frame.event.as_deref().unwrap_or("-"), frame.payload);
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Broadcast channel capacity ───────────────────────────────────────

const FRAME_CHANNEL_CAPACITY: usize = 1024;

const SOCKETIO_PATH: &str = "/socket.io/";

// ── Public types ─────────────────────────────────────────────────────

/// Wire framing spoken by the stream endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamProtocol {
    /// Engine.IO v4 / Socket.IO packets (`42["message",{...}]`).
    #[default]
    SocketIo,
    /// One JSON document per text frame.
    Json,
}

/// One inbound message with transport framing removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Socket.IO event name, when the framing carries one.
    pub event: Option<String>,
    /// Raw payload text, normally a JSON object.
    pub payload: String,
}

/// Exponential backoff configuration for stream reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── StreamHandle ─────────────────────────────────────────────────────

/// Handle to a running event stream.
///
/// Call [`shutdown`](Self::shutdown) (or cancel the token passed to
/// [`connect`](Self::connect)) to tear down the background task.
pub struct StreamHandle {
    frame_rx: broadcast::Receiver<Arc<InboundFrame>>,
    cancel: CancellationToken,
}

impl StreamHandle {
    /// Resolve the endpoint and spawn the reconnection loop.
    ///
    /// Returns immediately; the first connection attempt happens in the
    /// background. Must be called from within a tokio runtime.
    pub fn connect(
        url: Url,
        protocol: StreamProtocol,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let endpoint = stream_endpoint(&url, protocol)?;
        let (frame_tx, frame_rx) = broadcast::channel(FRAME_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            stream_loop(endpoint, protocol, frame_tx, reconnect, task_cancel).await;
        });

        Ok(Self { frame_rx, cancel })
    }

    /// Get a new broadcast receiver for the frame stream.
    ///
    /// If a consumer falls behind, it receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<InboundFrame>> {
        self.frame_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Map the configured stream URL onto the WebSocket endpoint.
///
/// `http`/`https` become `ws`/`wss`. For Socket.IO the Engine.IO handshake
/// path and query are filled in unless the URL already names a path.
pub fn stream_endpoint(url: &Url, protocol: StreamProtocol) -> Result<Url, Error> {
    let mut endpoint = url.clone();
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::WebSocketConnect(format!(
                "unsupported stream URL scheme '{other}'"
            )));
        }
    };
    endpoint
        .set_scheme(scheme)
        .map_err(|()| Error::WebSocketConnect(format!("cannot use scheme {scheme} for {url}")))?;

    if protocol == StreamProtocol::SocketIo {
        if endpoint.path() == "/" || endpoint.path().is_empty() {
            endpoint.set_path(SOCKETIO_PATH);
        }
        endpoint
            .query_pairs_mut()
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket");
    }

    Ok(endpoint)
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn stream_loop(
    url: Url,
    protocol: StreamProtocol,
    frame_tx: broadcast::Sender<Arc<InboundFrame>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&url, protocol, &frame_tx, &cancel) => {
                match result {
                    // Clean disconnect: reconnect immediately.
                    Ok(()) => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        tracing::info!("event stream disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "event stream error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "event stream reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt = attempt.saturating_add(1);
                    }
                }
            }
        }
    }

    tracing::debug!("event stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish a single WebSocket connection and read until it drops.
async fn connect_and_read(
    url: &Url,
    protocol: StreamProtocol,
    frame_tx: &broadcast::Sender<Arc<InboundFrame>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, ?protocol, "connecting to event stream");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("event stream connected");

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = write.send(tungstenite::Message::Close(None)).await;
                return Ok(());
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        let reply = match protocol {
                            StreamProtocol::Json => {
                                broadcast_frame(frame_tx, None, text.as_str().to_owned());
                                None
                            }
                            StreamProtocol::SocketIo => handle_engine_packet(text.as_str(), frame_tx)?,
                        };
                        if let Some(reply) = reply {
                            write
                                .send(tungstenite::Message::text(reply.to_owned()))
                                .await
                                .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite queues the pong; it goes out with the next write
                        tracing::trace!("WebSocket ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "WebSocket close frame received"
                            );
                        } else {
                            tracing::info!("WebSocket close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("event stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

fn broadcast_frame(
    frame_tx: &broadcast::Sender<Arc<InboundFrame>>,
    event: Option<String>,
    payload: String,
) {
    // Send errors just mean nobody is subscribed right now.
    let _ = frame_tx.send(Arc::new(InboundFrame { event, payload }));
}

// ── Engine.IO / Socket.IO framing ────────────────────────────────────

/// A decoded Engine.IO packet, with Socket.IO messages unwrapped.
#[derive(Debug, PartialEq, Eq)]
enum EnginePacket {
    /// `0{...}` handshake; we must join the default namespace.
    Open,
    /// `1` server is closing the session.
    Close,
    /// `2` heartbeat; must be answered with `3`.
    Ping,
    /// `40...` namespace joined.
    Connected,
    /// `41` namespace left.
    Disconnected,
    /// `44{...}` namespace join refused.
    ConnectError(String),
    /// `42[...]` event.
    Event {
        name: Option<String>,
        payload: String,
    },
    /// Anything we have no use for (pong, noop, ack, binary).
    Ignored,
}

/// Handle one Engine.IO text packet. Returns the reply to send, if any.
fn handle_engine_packet(
    text: &str,
    frame_tx: &broadcast::Sender<Arc<InboundFrame>>,
) -> Result<Option<&'static str>, Error> {
    match decode_engine_packet(text) {
        EnginePacket::Open => {
            tracing::debug!("Engine.IO handshake received, joining namespace");
            Ok(Some("40"))
        }
        EnginePacket::Ping => Ok(Some("3")),
        EnginePacket::Connected => {
            tracing::debug!("Socket.IO namespace joined");
            Ok(None)
        }
        EnginePacket::Event { name, payload } => {
            tracing::trace!(event = ?name, "Socket.IO event");
            broadcast_frame(frame_tx, name, payload);
            Ok(None)
        }
        EnginePacket::ConnectError(reason) => Err(Error::WebSocketConnect(format!(
            "Socket.IO namespace refused: {reason}"
        ))),
        EnginePacket::Close | EnginePacket::Disconnected => Err(Error::WebSocketClosed {
            code: 1000,
            reason: "Socket.IO session closed by server".into(),
        }),
        EnginePacket::Ignored => Ok(None),
    }
}

fn decode_engine_packet(text: &str) -> EnginePacket {
    let mut chars = text.chars();
    match chars.next() {
        Some('0') => EnginePacket::Open,
        Some('1') => EnginePacket::Close,
        Some('2') => EnginePacket::Ping,
        Some('4') => decode_socketio_packet(chars.as_str()),
        _ => EnginePacket::Ignored,
    }
}

fn decode_socketio_packet(text: &str) -> EnginePacket {
    let mut chars = text.chars();
    let kind = chars.next();
    let rest = skip_namespace(chars.as_str());

    match kind {
        Some('0') => EnginePacket::Connected,
        Some('1') => EnginePacket::Disconnected,
        Some('4') => EnginePacket::ConnectError(rest.to_owned()),
        Some('2') => {
            // Optional ack id precedes the argument array.
            let args = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            match serde_json::from_str::<Vec<serde_json::Value>>(args) {
                Ok(values) => {
                    let mut values = values.into_iter();
                    let name = values
                        .next()
                        .and_then(|v| v.as_str().map(String::from));
                    let payload = values.next().unwrap_or(serde_json::Value::Null).to_string();
                    EnginePacket::Event { name, payload }
                }
                // Hand the raw arguments on; the consumer decides what to
                // do with something it cannot decode.
                Err(_) => EnginePacket::Event {
                    name: None,
                    payload: args.to_owned(),
                },
            }
        }
        _ => EnginePacket::Ignored,
    }
}

/// Strip a `/namespace,` prefix if present.
fn skip_namespace(text: &str) -> &str {
    if text.starts_with('/') {
        text.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        text
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(16)).unwrap_or(16);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
