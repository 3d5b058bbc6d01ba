//! Boundary traits for the underlying pub/sub client.
//!
//! The bridge does not own transport, reconnection, or the wire protocol;
//! a client library implements these traits and drives the bridge through
//! the [`ClientObserver`] hook it receives at connect/subscribe time.

use std::sync::Arc;

use crate::config::ConnectionOptions;
use crate::error::BridgeResult;
use crate::models::{ConnectionStateChange, Member};

/// How restricted-channel subscriptions obtain their signed grant.
#[derive(Clone)]
pub enum AuthMethod {
    /// No authorizer configured; restricted subscriptions will fail.
    None,
    /// The client library's own HTTP authorizer against this endpoint.
    HttpEndpoint(String),
    /// The bridge-provided callback authorizer.
    Callback(Arc<dyn ChannelAuthorizer>),
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::None => f.write_str("None"),
            AuthMethod::HttpEndpoint(url) => f.debug_tuple("HttpEndpoint").field(url).finish(),
            AuthMethod::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// Produces a signed grant for one restricted-channel subscription.
///
/// Invoked by the client on its own I/O/callback thread; the call may block
/// that thread until the grant is resolved. `None` means no grant.
pub trait ChannelAuthorizer: Send + Sync {
    fn authorize(&self, channel_name: &str, socket_id: &str) -> Option<String>;
}

/// Observer the client invokes for every protocol and lifecycle callback.
///
/// This is a first-class hook: the client delivers raw channel messages to
/// `on_message` in addition to its typed callbacks, so the bridge can
/// classify and forward them uniformly. Calls arrive on the client's own
/// threads; implementations must be thread-safe and must not assume any
/// particular delivery context.
pub trait ClientObserver: Send + Sync {
    fn on_connection_state_change(&self, change: ConnectionStateChange);

    /// A whole wire message for a subscribed channel, tagged with its
    /// event name. Includes the reserved subscription-confirmation event.
    fn on_message(&self, event_name: &str, whole_message: &str);

    /// Authorization or subscription failure for a restricted channel.
    /// The channel's handle is no longer live after this fires.
    fn on_authentication_failure(&self, channel_name: &str, message: &str, error: &str);

    /// Payload decryption failure on a private-encrypted channel.
    fn on_decryption_failure(&self, event: &str, reason: &str);

    fn on_member_added(&self, channel_name: &str, member: &Member);
    fn on_member_removed(&self, channel_name: &str, member: &Member);

    /// Generic client/protocol error.
    fn on_error(&self, message: &str, code: Option<&str>, error: Option<&str>);
}

/// A live channel subscription handle, exclusively owned by the registry.
pub trait LiveChannel: Send + Sync {
    fn name(&self) -> &str;

    /// Send a client-originated event. Only the private family supports
    /// this; other kinds must return an error rather than silently no-op.
    fn trigger(&self, event_name: &str, data: &str) -> BridgeResult<()>;
}

/// The underlying pub/sub client, specified at its boundary only.
pub trait PubSubClient: Send + Sync {
    /// Begin connecting; state changes and errors flow to the observer.
    fn connect(&self, observer: Arc<dyn ClientObserver>);

    fn disconnect(&self);

    /// Current session identifier, absent until connected.
    fn socket_id(&self) -> Option<String>;

    fn subscribe_public(
        &self,
        channel_name: &str,
        observer: Arc<dyn ClientObserver>,
    ) -> BridgeResult<Arc<dyn LiveChannel>>;

    fn subscribe_private(
        &self,
        channel_name: &str,
        observer: Arc<dyn ClientObserver>,
        authorizer: Arc<dyn ChannelAuthorizer>,
    ) -> BridgeResult<Arc<dyn LiveChannel>>;

    fn subscribe_private_encrypted(
        &self,
        channel_name: &str,
        observer: Arc<dyn ClientObserver>,
        authorizer: Arc<dyn ChannelAuthorizer>,
    ) -> BridgeResult<Arc<dyn LiveChannel>>;

    fn subscribe_presence(
        &self,
        channel_name: &str,
        observer: Arc<dyn ClientObserver>,
        authorizer: Arc<dyn ChannelAuthorizer>,
    ) -> BridgeResult<Arc<dyn LiveChannel>>;

    /// Tear down the live subscription. Tolerates unknown names.
    fn unsubscribe(&self, channel_name: &str);
}

/// Builds the concrete client at `init` time.
pub trait ClientFactory: Send + Sync {
    fn create(
        &self,
        api_key: &str,
        options: &ConnectionOptions,
        auth: AuthMethod,
    ) -> BridgeResult<Arc<dyn PubSubClient>>;
}
