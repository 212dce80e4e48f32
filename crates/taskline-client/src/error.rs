//! Error taxonomy for the client core.
//!
//! Transport errors terminate a subscription; decode errors never do — a
//! malformed frame is logged and skipped. Gateway errors are surfaced to the
//! embedder after local state has been rolled back.

use thiserror::Error;

/// Failures of the socket transport itself.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The WebSocket handshake did not complete; no connection exists.
    #[error("websocket handshake failed: {0}")]
    Handshake(#[source] tokio_tungstenite::tungstenite::Error),

    /// The peer closed the connection while we considered it open.
    #[error("websocket closed by peer")]
    ClosedByPeer,

    /// A read or protocol error after the connection was open.
    #[error("websocket protocol error: {0}")]
    Protocol(#[source] tokio_tungstenite::tungstenite::Error),

    /// Sending on the publish side failed.
    #[error("websocket send failed: {0}")]
    Send(#[source] tokio_tungstenite::tungstenite::Error),

    /// An outbound event could not be serialized.
    #[error("could not encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Why a single frame could not be turned into a [`taskline_wire::StreamEvent`].
///
/// Each variant is a distinct diagnostic; none of them are fatal to the
/// subscription.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Binary frame whose payload is not UTF-8 text.
    #[error("frame payload is not UTF-8 text")]
    NonTextPayload,

    /// Frame kind the protocol does not carry events in.
    #[error("unsupported frame kind: {0}")]
    UnsupportedFrame(&'static str),

    /// Payload is not a well-formed JSON document.
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// JSON document without a string `type` tag.
    #[error("frame has no event type tag")]
    MissingEventType,

    /// A `type` tag this client does not understand. Forward-compatible:
    /// callers skip the frame.
    #[error("unknown event type `{0}`")]
    UnknownEventType(String),

    /// Known `type` tag but the body does not match its schema.
    #[error("malformed `{event_type}` event: {source}")]
    InvalidShape {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures talking to the HTTP gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway rejected request with status {0}")]
    Status(u16),

    /// Submission succeeded but the stream subscription could not be opened.
    #[error("could not open event stream: {0}")]
    Stream(#[from] TransportError),
}
