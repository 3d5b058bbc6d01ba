//! Bridge exposing a realtime pub/sub channels client to a foreign host
//! context.
//!
//! The host drives the bridge through a narrow, serializable method-call
//! surface (`init`, `connect`, `subscribe`, `trigger`, ...) and receives
//! push notifications for connection state, channel events, presence
//! membership, and errors. Restricted channels resolve their signed grant
//! through a blocking round trip into the host (`onAuthorizer`).
//!
//! The underlying client and the host transport are collaborators behind
//! traits in [`client`] and [`host`]; this crate owns only the
//! subscription/event-routing core and the authorization bridge.

pub mod bridge;
pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod models;
pub mod services;

pub use bridge::ChannelsBridge;
pub use client::{AuthMethod, ChannelAuthorizer, ClientFactory, ClientObserver, PubSubClient};
pub use config::ConnectionOptions;
pub use error::{BridgeError, BridgeResult};
pub use host::{CallReply, HostBinding, HostChannel, HostMailbox, HostReply};
pub use models::{ChannelKind, ConnectionState, ConnectionStateChange, Member, NormalizedEvent};
pub use services::{AuthorizerBridge, ChannelRegistry, Dispatcher, SubscriptionService};
