//! Authorization bridge: a synchronous authorizer backed by one blocking
//! round trip into the host context.

use std::sync::mpsc;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::client::ChannelAuthorizer;
use crate::host::{HostBinding, HostReply};
use crate::services::registry::ChannelRegistry;

/// Answers the underlying client's authorizer callback by asking the host
/// for a signed grant.
///
/// The client invokes [`ChannelAuthorizer::authorize`] on its own I/O
/// thread; that thread blocks on a fresh single-slot channel until the
/// host answers with exactly one of success, error, or not-implemented.
/// The host's serialized context is only entered to deliver the request
/// and, later, the reply.
pub struct AuthorizerBridge {
    host: Arc<HostBinding>,
    registry: Arc<ChannelRegistry>,
}

impl AuthorizerBridge {
    pub fn new(host: Arc<HostBinding>, registry: Arc<ChannelRegistry>) -> Self {
        Self { host, registry }
    }

    fn grant_from_reply(reply: HostReply) -> Option<String> {
        match reply {
            // A string grant is forwarded verbatim; a structured value is
            // re-encoded to its JSON text.
            HostReply::Success(Some(Value::String(grant))) => Some(grant),
            HostReply::Success(Some(value)) => Some(value.to_string()),
            HostReply::Success(None) => None,
            HostReply::Error { code, message } => {
                warn!(code = %code, message = %message, "host authorizer returned error");
                None
            }
            HostReply::NotImplemented => {
                warn!("host authorizer not implemented");
                None
            }
        }
    }
}

impl ChannelAuthorizer for AuthorizerBridge {
    fn authorize(&self, channel_name: &str, socket_id: &str) -> Option<String> {
        // Fresh single-release slot per request, never reused.
        let (tx, rx) = mpsc::sync_channel::<Option<String>>(1);

        let ticket = self.registry.begin_authorization(channel_name);
        let payload = json!({
            "channelName": channel_name,
            "socketId": socket_id,
        });
        let delivered = self.host.invoke(
            "onAuthorizer",
            payload,
            Box::new(move |reply| {
                let _ = tx.send(Self::grant_from_reply(reply));
            }),
        );
        if !delivered {
            // No host attached: fail fast, no blocking.
            self.registry.finish_authorization(channel_name, ticket);
            return None;
        }

        debug!(channel = %channel_name, socket_id = %socket_id, "awaiting host grant");
        // Blocks the client's callback thread until the host answers. A
        // reply sink dropped unanswered unblocks with the absence signal.
        let grant = rx.recv().ok().flatten();

        let applicable = self.registry.finish_authorization(channel_name, ticket);
        if grant.is_some() && !applicable {
            // The subscription was torn down while the round trip was in
            // flight; the stale grant must not be applied.
            warn!(channel = %channel_name, "discarding grant for unsubscribed channel");
            return None;
        }
        grant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostChannel, ReplyFn};
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    /// Host that answers every invocation with a canned reply, after an
    /// optional hop to another thread to mimic the host event loop.
    struct CannedHost {
        reply: HostReply,
        requests: Mutex<Vec<(String, Value)>>,
    }

    impl CannedHost {
        fn new(reply: HostReply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    impl HostChannel for CannedHost {
        fn notify(&self, _method: &str, _payload: Value) {}

        fn invoke(&self, method: &str, payload: Value, reply: ReplyFn) {
            self.requests
                .lock()
                .unwrap()
                .push((method.to_string(), payload));
            let answer = self.reply.clone();
            thread::spawn(move || reply(answer));
        }
    }

    fn bridge_with(reply: HostReply) -> (AuthorizerBridge, Arc<CannedHost>, Arc<ChannelRegistry>) {
        let host = CannedHost::new(reply);
        let binding = Arc::new(HostBinding::new());
        binding.attach(host.clone());
        let registry = Arc::new(ChannelRegistry::new());
        (
            AuthorizerBridge::new(binding, registry.clone()),
            host,
            registry,
        )
    }

    #[test]
    fn success_string_returns_grant_verbatim() {
        let (bridge, host, _) = bridge_with(HostReply::Success(Some(json!("abc123"))));
        let grant = bridge.authorize("private-orders", "81.9");
        assert_eq!(grant.as_deref(), Some("abc123"));

        let requests = host.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "onAuthorizer");
        assert_eq!(
            requests[0].1,
            json!({ "channelName": "private-orders", "socketId": "81.9" })
        );
    }

    #[test]
    fn structured_success_is_reencoded() {
        let (bridge, _, _) = bridge_with(HostReply::Success(Some(
            json!({ "auth": "key:sig", "shared_secret": "s" }),
        )));
        let grant = bridge.authorize("private-encrypted-x", "81.9").unwrap();
        let parsed: Value = serde_json::from_str(&grant).unwrap();
        assert_eq!(parsed["auth"], json!("key:sig"));
    }

    #[test]
    fn error_reply_yields_absence() {
        let (bridge, _, _) = bridge_with(HostReply::Error {
            code: "auth".to_string(),
            message: "denied".to_string(),
        });
        assert_eq!(bridge.authorize("private-orders", "81.9"), None);
    }

    #[test]
    fn not_implemented_yields_absence() {
        let (bridge, _, _) = bridge_with(HostReply::NotImplemented);
        assert_eq!(bridge.authorize("private-orders", "81.9"), None);
    }

    #[test]
    fn detached_host_fails_fast_without_blocking() {
        let binding = Arc::new(HostBinding::new());
        let registry = Arc::new(ChannelRegistry::new());
        let bridge = AuthorizerBridge::new(binding, registry);

        let start = std::time::Instant::now();
        assert_eq!(bridge.authorize("private-orders", "81.9"), None);
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn dropped_reply_unblocks_with_absence() {
        struct DroppingHost;
        impl HostChannel for DroppingHost {
            fn notify(&self, _method: &str, _payload: Value) {}
            fn invoke(&self, _method: &str, _payload: Value, reply: ReplyFn) {
                drop(reply);
            }
        }
        let binding = Arc::new(HostBinding::new());
        binding.attach(Arc::new(DroppingHost));
        let bridge = AuthorizerBridge::new(binding, Arc::new(ChannelRegistry::new()));
        assert_eq!(bridge.authorize("private-orders", "81.9"), None);
    }

    #[test]
    fn grant_resolved_after_unsubscribe_is_discarded() {
        struct UnsubscribingHost {
            registry: Arc<ChannelRegistry>,
        }
        impl HostChannel for UnsubscribingHost {
            fn notify(&self, _method: &str, _payload: Value) {}
            fn invoke(&self, _method: &str, _payload: Value, reply: ReplyFn) {
                // Simulate an unsubscribe racing the in-flight round trip.
                self.registry
                    .get_or_create("private-orders", |_| {
                        Ok(Arc::new(NoopChannel) as Arc<dyn crate::client::LiveChannel>)
                    })
                    .unwrap();
                self.registry.remove("private-orders");
                reply(HostReply::Success(Some(json!("stale-grant"))));
            }
        }
        struct NoopChannel;
        impl crate::client::LiveChannel for NoopChannel {
            fn name(&self) -> &str {
                "private-orders"
            }
            fn trigger(&self, _event_name: &str, _data: &str) -> crate::error::BridgeResult<()> {
                Ok(())
            }
        }

        let registry = Arc::new(ChannelRegistry::new());
        let binding = Arc::new(HostBinding::new());
        binding.attach(Arc::new(UnsubscribingHost {
            registry: registry.clone(),
        }));
        let bridge = AuthorizerBridge::new(binding, registry);
        assert_eq!(bridge.authorize("private-orders", "81.9"), None);
    }

    #[test]
    fn repeated_round_trips_retain_no_per_channel_state() {
        let (bridge, _, registry) = bridge_with(HostReply::Success(Some(json!("grant"))));
        for i in 0..50 {
            let name = format!("private-user-{i}");
            assert_eq!(bridge.authorize(&name, "81.9").as_deref(), Some("grant"));
        }
        // Every round trip closed out its book-keeping entry.
        assert!(registry.is_empty());
        assert_eq!(registry.pending_authorization_count(), 0);
    }

    #[test]
    fn blocked_worker_unblocks_exactly_once() {
        let (bridge, _, _) = bridge_with(HostReply::Success(Some(json!("grant"))));
        let bridge = Arc::new(bridge);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let bridge = bridge.clone();
                thread::spawn(move || bridge.authorize(&format!("private-{i}"), "81.9"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().as_deref(), Some("grant"));
        }
    }
}
