//! Topic-scoped pub/sub socket clients.
//!
//! [`Subscription`] is the read path: connect to
//! `ws(s)://{host}/ws/subscribe/{topic}`, decode each inbound frame, and
//! hand events to the consumer strictly in wire order. [`Publisher`] is the
//! symmetric write path used by producers.
//!
//! `connect` resolves only once the handshake has succeeded — a caller can
//! never observe a half-initialized connection. After that a background read
//! task forwards decoded events over a channel until the peer closes, a
//! protocol error occurs, or the subscription is closed locally.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use taskline_observability::redact_text;
use taskline_wire::StreamEvent;

use crate::config::ClientConfig;
use crate::decode::decode_frame;
use crate::error::TransportError;

/// Depth of the in-order hand-off channel between the read task and the
/// consumer.
const SIGNAL_CHANNEL_CAPACITY: usize = 256;

/// What the read path delivers: events while the stream is healthy, then at
/// most one `Lost` if the transport fails underneath us.
#[derive(Debug)]
pub enum StreamSignal {
    Event(StreamEvent),
    Lost(TransportError),
}

/// A live subscription to one task's event stream.
///
/// The topic is fixed for the lifetime of the connection; watching a
/// different task means closing this subscription and opening a new one.
pub struct Subscription {
    topic: String,
    signals: mpsc::Receiver<StreamSignal>,
    shutdown: CancellationToken,
}

impl Subscription {
    /// Open a subscription. Resolves after the WebSocket handshake; a
    /// handshake failure is an error, never a dead handle.
    pub async fn connect(config: &ClientConfig, topic: &str) -> Result<Self, TransportError> {
        let url = config.subscribe_url(topic);
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(TransportError::Handshake)?;
        info!(topic, "subscribed to event stream");

        let (tx, signals) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
        let shutdown = CancellationToken::new();
        tokio::spawn(read_loop(ws, topic.to_string(), tx, shutdown.clone()));

        Ok(Self {
            topic: topic.to_string(),
            signals,
            shutdown,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next signal in wire order. Returns `None` once the stream has ended:
    /// after a local [`close`](Self::close), or after the terminal
    /// [`StreamSignal::Lost`] has been delivered.
    ///
    /// Frames still in flight when `close` is called are dropped, including
    /// signals already queued.
    pub async fn next_signal(&mut self) -> Option<StreamSignal> {
        if self.shutdown.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            signal = self.signals.recv() => signal,
        }
    }

    /// Close the subscription. Idempotent; safe to call at any point.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    /// Assemble a subscription around a pre-wired channel. Test seam only.
    #[cfg(test)]
    pub(crate) fn from_parts(
        topic: &str,
        signals: mpsc::Receiver<StreamSignal>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            topic: topic.to_string(),
            signals,
            shutdown,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn read_loop(
    mut ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    topic: String,
    tx: mpsc::Sender<StreamSignal>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!(topic, "subscription closed locally");
                break;
            }
            frame = ws.next() => {
                match frame {
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => {
                        deliver_lost(&tx, &shutdown, TransportError::ClosedByPeer).await;
                        break;
                    }
                    Some(Ok(msg)) => match decode_frame(&msg) {
                        Ok(event) => {
                            if tx.send(StreamSignal::Event(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            // Malformed frame: log, skip, keep streaming.
                            warn!(
                                topic,
                                error = %err,
                                frame = %redacted_payload(&msg),
                                "dropping undecodable frame"
                            );
                        }
                    },
                    Some(Err(err)) => {
                        deliver_lost(&tx, &shutdown, TransportError::Protocol(err)).await;
                        break;
                    }
                }
            }
        }
    }

    // Tell the peer we are going away; best-effort on every exit path.
    let _ = ws.close(None).await;
}

async fn deliver_lost(
    tx: &mpsc::Sender<StreamSignal>,
    shutdown: &CancellationToken,
    err: TransportError,
) {
    // A locally closed subscription reports nothing.
    if shutdown.is_cancelled() {
        return;
    }
    let _ = tx.send(StreamSignal::Lost(err)).await;
}

fn redacted_payload(msg: &Message) -> String {
    match msg {
        Message::Text(text) => redact_text(text),
        Message::Binary(bytes) => format!("[binary {} bytes]", bytes.len()),
        other => format!("[{} frame]", frame_kind(other)),
    }
}

fn frame_kind(msg: &Message) -> &'static str {
    match msg {
        Message::Text(_) => "text",
        Message::Binary(_) => "binary",
        Message::Ping(_) => "ping",
        Message::Pong(_) => "pong",
        Message::Close(_) => "close",
        Message::Frame(_) => "raw",
    }
}

// ---------------------------------------------------------------------------
// Connector seam
// ---------------------------------------------------------------------------

/// How the session controller opens subscriptions. A seam so tests can wire
/// in fabricated streams.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError>;
}

/// The real connector: WebSocket per [`ClientConfig`].
pub struct WsConnector {
    config: ClientConfig,
}

impl WsConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    async fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError> {
        Subscription::connect(&self.config, topic).await
    }
}

// ---------------------------------------------------------------------------
// Publisher (write path)
// ---------------------------------------------------------------------------

/// Producer-side client for `ws(s)://{host}/ws/publish/{topic}?key=...`.
///
/// Not used by the read path; carried for producers and for end-to-end
/// tests.
pub struct Publisher {
    topic: String,
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Publisher {
    pub async fn connect(config: &ClientConfig, topic: &str) -> Result<Self, TransportError> {
        let url = config.publish_url(topic);
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(TransportError::Handshake)?;
        info!(topic, "publisher connected");
        Ok(Self {
            topic: topic.to_string(),
            ws,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Send one event as a JSON text frame.
    pub async fn publish(&mut self, event: &StreamEvent) -> Result<(), TransportError> {
        let json = serde_json::to_string(event).map_err(TransportError::Encode)?;
        self.ws
            .send(Message::Text(json))
            .await
            .map_err(TransportError::Send)
    }

    /// Close the connection, sending a close frame best-effort.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
