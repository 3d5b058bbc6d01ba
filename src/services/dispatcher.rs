//! Dispatcher: fans underlying-client callbacks out to the host as push
//! notifications, one well-known method name per category.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, warn};

use crate::client::ClientObserver;
use crate::host::HostBinding;
use crate::models::{ConnectionStateChange, Member, NormalizedEvent};
use crate::services::registry::ChannelRegistry;

/// Receives every client callback and forwards it through the host
/// binding. The binding's transport is responsible for delivering on the
/// host's serialized context; callbacks here arrive on the client's own
/// I/O threads.
pub struct Dispatcher {
    host: Arc<HostBinding>,
    registry: Arc<ChannelRegistry>,
}

impl Dispatcher {
    pub fn new(host: Arc<HostBinding>, registry: Arc<ChannelRegistry>) -> Self {
        Self { host, registry }
    }
}

impl ClientObserver for Dispatcher {
    fn on_connection_state_change(&self, change: ConnectionStateChange) {
        debug!(
            previous = change.previous_state.as_str(),
            current = change.current_state.as_str(),
            "connection state change"
        );
        self.host.notify(
            "onConnectionStateChange",
            json!({
                "previousState": change.previous_state.as_str(),
                "currentState": change.current_state.as_str(),
            }),
        );
    }

    fn on_message(&self, event_name: &str, whole_message: &str) {
        let event = NormalizedEvent::from_wire(event_name, whole_message);
        let kind = self
            .registry
            .lookup(&event.channel_name)
            .map(|entry| entry.kind);
        debug!(
            channel = %event.channel_name,
            event = %event.event_name,
            kind = ?kind,
            "inbound event"
        );

        if event.is_subscription_succeeded() {
            self.host.notify(
                "onSubscriptionSucceeded",
                json!({
                    "channelName": event.channel_name,
                    "data": event.data,
                }),
            );
        } else {
            self.host.notify(
                "onEvent",
                json!({
                    "channelName": event.channel_name,
                    "eventName": event.event_name,
                    "userId": event.user_id,
                    "data": event.data,
                }),
            );
        }
    }

    fn on_authentication_failure(&self, channel_name: &str, message: &str, error: &str) {
        warn!(channel = %channel_name, message = %message, error = %error, "subscription authorization failed");
        // The client rejected the subscription; its handle must not stay
        // registered.
        self.registry.remove(channel_name);
        self.host.notify(
            "onSubscriptionError",
            json!({
                "message": message,
                "error": error,
            }),
        );
    }

    fn on_decryption_failure(&self, event: &str, reason: &str) {
        warn!(event = %event, reason = %reason, "decryption failure");
        self.host.notify(
            "onDecryptionFailure",
            json!({
                "event": event,
                "reason": reason,
            }),
        );
    }

    fn on_member_added(&self, channel_name: &str, member: &Member) {
        self.host.notify(
            "onMemberAdded",
            json!({
                "channelName": channel_name,
                "user": member,
            }),
        );
    }

    fn on_member_removed(&self, channel_name: &str, member: &Member) {
        self.host.notify(
            "onMemberRemoved",
            json!({
                "channelName": channel_name,
                "user": member,
            }),
        );
    }

    fn on_error(&self, message: &str, code: Option<&str>, error: Option<&str>) {
        error!(message = %message, code = ?code, "client error");
        self.host.notify(
            "onError",
            json!({
                "message": message,
                "code": code,
                "error": error,
            }),
        );
    }
}
