//! Client core for Taskline: turn a topic-scoped event stream into
//! consistent plan + transcript state.
//!
//! Data flows one way: transport ([`subscriber`]) → decoder ([`decode`]) →
//! reducer ([`reducer`]) → observable state. Control flows the other way:
//! [`session::TaskSession`] drives the HTTP gateway and the subscription
//! lifecycle from submit/stop commands at the UI boundary.

pub mod config;
pub mod decode;
pub mod error;
pub mod gateway;
pub mod reducer;
pub mod session;
pub mod subscriber;

pub use config::ClientConfig;
pub use error::{DecodeError, GatewayError, TransportError};
pub use gateway::{HttpGateway, TaskGateway};
pub use reducer::{reduce, StreamState};
pub use session::{SessionPhase, SessionSnapshot, SubmitOutcome, TaskSession};
pub use subscriber::{Publisher, StreamConnector, StreamSignal, Subscription, WsConnector};
