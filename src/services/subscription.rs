//! Subscription manager: subscribe/unsubscribe/trigger and the socket id.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::client::{ChannelAuthorizer, ClientObserver, PubSubClient};
use crate::error::{BridgeError, BridgeResult};
use crate::models::ChannelKind;
use crate::services::registry::ChannelRegistry;

/// Owns the subscribe/unsubscribe/trigger operations against the
/// underlying client, keyed through the channel registry.
pub struct SubscriptionService {
    client: Arc<dyn PubSubClient>,
    registry: Arc<ChannelRegistry>,
    observer: Arc<dyn ClientObserver>,
    authorizer: Arc<dyn ChannelAuthorizer>,
}

impl SubscriptionService {
    pub fn new(
        client: Arc<dyn PubSubClient>,
        registry: Arc<ChannelRegistry>,
        observer: Arc<dyn ClientObserver>,
        authorizer: Arc<dyn ChannelAuthorizer>,
    ) -> Self {
        Self {
            client,
            registry,
            observer,
            authorizer,
        }
    }

    /// Subscribe to `channel_name`, selecting the variant from its kind.
    ///
    /// Succeeds once the call is issued; authorization failures surface
    /// later through the observer as `onSubscriptionError`, never here.
    /// Subscribing to an already-subscribed name is a no-op.
    pub fn subscribe(&self, channel_name: &str) -> BridgeResult<()> {
        self.registry.get_or_create(channel_name, |kind| {
            info!(channel = %channel_name, kind = ?kind, "subscribing");
            match kind {
                ChannelKind::Public => self
                    .client
                    .subscribe_public(channel_name, self.observer.clone()),
                ChannelKind::Private => self.client.subscribe_private(
                    channel_name,
                    self.observer.clone(),
                    self.authorizer.clone(),
                ),
                ChannelKind::PrivateEncrypted => self.client.subscribe_private_encrypted(
                    channel_name,
                    self.observer.clone(),
                    self.authorizer.clone(),
                ),
                ChannelKind::Presence => self.client.subscribe_presence(
                    channel_name,
                    self.observer.clone(),
                    self.authorizer.clone(),
                ),
            }
        })?;
        Ok(())
    }

    /// Unsubscribe from `channel_name`. Idempotent; unknown names succeed.
    pub fn unsubscribe(&self, channel_name: &str) -> BridgeResult<()> {
        if self.registry.remove(channel_name).is_some() {
            self.client.unsubscribe(channel_name);
            info!(channel = %channel_name, "unsubscribed");
        } else {
            debug!(channel = %channel_name, "unsubscribe for unknown channel, ignoring");
        }
        Ok(())
    }

    /// Send a client-originated event. Requires a subscribed
    /// private-family channel; anything else is a call failure.
    pub fn trigger(&self, channel_name: &str, event_name: &str, data: &Value) -> BridgeResult<()> {
        let entry = self
            .registry
            .lookup(channel_name)
            .ok_or_else(|| BridgeError::NotSubscribed(channel_name.to_string()))?;
        if !entry.kind.supports_client_events() {
            return Err(BridgeError::TriggerNotSupported(channel_name.to_string()));
        }

        let payload = match data {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        entry.handle.trigger(event_name, &payload)?;
        debug!(channel = %channel_name, event = %event_name, "triggered client event");
        Ok(())
    }

    /// Current session identifier; fails when not connected.
    pub fn socket_id(&self) -> BridgeResult<String> {
        self.client.socket_id().ok_or(BridgeError::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LiveChannel;
    use crate::models::{ConnectionStateChange, Member};
    use serde_json::json;
    use std::sync::Mutex;

    struct NullObserver;
    impl ClientObserver for NullObserver {
        fn on_connection_state_change(&self, _change: ConnectionStateChange) {}
        fn on_message(&self, _event_name: &str, _whole_message: &str) {}
        fn on_authentication_failure(&self, _channel_name: &str, _message: &str, _error: &str) {}
        fn on_decryption_failure(&self, _event: &str, _reason: &str) {}
        fn on_member_added(&self, _channel_name: &str, _member: &Member) {}
        fn on_member_removed(&self, _channel_name: &str, _member: &Member) {}
        fn on_error(&self, _message: &str, _code: Option<&str>, _error: Option<&str>) {}
    }

    struct NullAuthorizer;
    impl ChannelAuthorizer for NullAuthorizer {
        fn authorize(&self, _channel_name: &str, _socket_id: &str) -> Option<String> {
            None
        }
    }

    struct FakeChannel {
        name: String,
        kind: ChannelKind,
        triggered: Mutex<Vec<(String, String)>>,
    }

    impl LiveChannel for FakeChannel {
        fn name(&self) -> &str {
            &self.name
        }
        fn trigger(&self, event_name: &str, data: &str) -> BridgeResult<()> {
            if !self.kind.supports_client_events() {
                return Err(BridgeError::TriggerNotSupported(self.name.clone()));
            }
            self.triggered
                .lock()
                .unwrap()
                .push((event_name.to_string(), data.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeClient {
        subscribed: Mutex<Vec<(String, ChannelKind)>>,
        unsubscribed: Mutex<Vec<String>>,
        socket: Mutex<Option<String>>,
    }

    impl FakeClient {
        fn make(
            &self,
            name: &str,
            kind: ChannelKind,
        ) -> BridgeResult<Arc<dyn LiveChannel>> {
            self.subscribed.lock().unwrap().push((name.to_string(), kind));
            Ok(Arc::new(FakeChannel {
                name: name.to_string(),
                kind,
                triggered: Mutex::new(Vec::new()),
            }))
        }
    }

    impl PubSubClient for FakeClient {
        fn connect(&self, _observer: Arc<dyn ClientObserver>) {
            *self.socket.lock().unwrap() = Some("81.9".to_string());
        }
        fn disconnect(&self) {
            *self.socket.lock().unwrap() = None;
        }
        fn socket_id(&self) -> Option<String> {
            self.socket.lock().unwrap().clone()
        }
        fn subscribe_public(
            &self,
            channel_name: &str,
            _observer: Arc<dyn ClientObserver>,
        ) -> BridgeResult<Arc<dyn LiveChannel>> {
            self.make(channel_name, ChannelKind::Public)
        }
        fn subscribe_private(
            &self,
            channel_name: &str,
            _observer: Arc<dyn ClientObserver>,
            _authorizer: Arc<dyn ChannelAuthorizer>,
        ) -> BridgeResult<Arc<dyn LiveChannel>> {
            self.make(channel_name, ChannelKind::Private)
        }
        fn subscribe_private_encrypted(
            &self,
            channel_name: &str,
            _observer: Arc<dyn ClientObserver>,
            _authorizer: Arc<dyn ChannelAuthorizer>,
        ) -> BridgeResult<Arc<dyn LiveChannel>> {
            self.make(channel_name, ChannelKind::PrivateEncrypted)
        }
        fn subscribe_presence(
            &self,
            channel_name: &str,
            _observer: Arc<dyn ClientObserver>,
            _authorizer: Arc<dyn ChannelAuthorizer>,
        ) -> BridgeResult<Arc<dyn LiveChannel>> {
            self.make(channel_name, ChannelKind::Presence)
        }
        fn unsubscribe(&self, channel_name: &str) {
            self.unsubscribed.lock().unwrap().push(channel_name.to_string());
        }
    }

    fn service() -> (SubscriptionService, Arc<FakeClient>, Arc<ChannelRegistry>) {
        let client = Arc::new(FakeClient::default());
        let registry = Arc::new(ChannelRegistry::new());
        let service = SubscriptionService::new(
            client.clone(),
            registry.clone(),
            Arc::new(NullObserver),
            Arc::new(NullAuthorizer),
        );
        (service, client, registry)
    }

    #[test]
    fn subscribe_selects_variant_from_prefix() {
        let (service, client, _) = service();
        service.subscribe("news").unwrap();
        service.subscribe("private-orders").unwrap();
        service.subscribe("private-encrypted-vault").unwrap();
        service.subscribe("presence-room1").unwrap();
        assert_eq!(
            *client.subscribed.lock().unwrap(),
            vec![
                ("news".to_string(), ChannelKind::Public),
                ("private-orders".to_string(), ChannelKind::Private),
                (
                    "private-encrypted-vault".to_string(),
                    ChannelKind::PrivateEncrypted
                ),
                ("presence-room1".to_string(), ChannelKind::Presence),
            ]
        );
    }

    #[test]
    fn duplicate_subscribe_creates_one_handle() {
        let (service, client, registry) = service();
        service.subscribe("private-orders").unwrap();
        service.subscribe("private-orders").unwrap();
        assert_eq!(client.subscribed.lock().unwrap().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unsubscribe_unknown_succeeds_and_changes_nothing() {
        let (service, client, registry) = service();
        service.unsubscribe("never-there").unwrap();
        assert!(client.unsubscribed.lock().unwrap().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn unsubscribe_tears_down_client_handle() {
        let (service, client, registry) = service();
        service.subscribe("orders").unwrap();
        service.unsubscribe("orders").unwrap();
        assert_eq!(*client.unsubscribed.lock().unwrap(), vec!["orders".to_string()]);
        assert!(registry.is_empty());
    }

    #[test]
    fn trigger_requires_subscription() {
        let (service, _, _) = service();
        let err = service
            .trigger("private-orders", "client-ping", &json!("{}"))
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotSubscribed(_)));
    }

    #[test]
    fn trigger_rejected_for_public_and_presence() {
        let (service, _, _) = service();
        service.subscribe("news").unwrap();
        service.subscribe("presence-room1").unwrap();
        for name in ["news", "presence-room1"] {
            let err = service.trigger(name, "client-ping", &json!("{}")).unwrap_err();
            assert!(matches!(err, BridgeError::TriggerNotSupported(_)), "{name}");
        }
    }

    #[test]
    fn trigger_serializes_structured_data() {
        let (service, _, registry) = service();
        service.subscribe("private-orders").unwrap();
        service
            .trigger("private-orders", "client-note", &json!({ "id": 7 }))
            .unwrap();

        let entry = registry.lookup("private-orders").unwrap();
        // Downcast through the fake's recorded state is not possible via
        // the trait object; re-trigger with a string and check no error.
        service
            .trigger("private-orders", "client-note", &json!("{\"id\":8}"))
            .unwrap();
        assert_eq!(entry.kind, ChannelKind::Private);
    }

    #[test]
    fn socket_id_fails_when_disconnected() {
        let (service, client, _) = service();
        assert!(matches!(
            service.socket_id().unwrap_err(),
            BridgeError::NotConnected
        ));
        client.connect(Arc::new(NullObserver));
        assert_eq!(service.socket_id().unwrap(), "81.9");
    }
}
