//! The bridge itself: owns the client context and dispatches inbound host
//! calls.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tracing::info;

use crate::client::{AuthMethod, ClientFactory, PubSubClient};
use crate::config::InitArgs;
use crate::error::{BridgeError, BridgeResult, ERROR_CODE};
use crate::host::{CallReply, HostBinding, HostChannel};
use crate::services::{AuthorizerBridge, ChannelRegistry, Dispatcher, SubscriptionService};

/// Everything created by `init` and destroyed by `teardown`. Owned
/// explicitly so independent bridges can coexist; there is no process-wide
/// client state.
struct BridgeContext {
    client: Arc<dyn PubSubClient>,
    dispatcher: Arc<Dispatcher>,
    subscriptions: SubscriptionService,
}

/// Exposes the pub/sub client to a host context over a narrow method-call
/// surface plus push notifications.
///
/// Inbound calls arrive on the host's serialized context; none of them
/// block for unbounded time. The only blocking path in the crate is the
/// authorization round trip, which blocks the client's own callback
/// thread (see [`AuthorizerBridge`]).
pub struct ChannelsBridge {
    factory: Arc<dyn ClientFactory>,
    host: Arc<HostBinding>,
    context: Mutex<Option<BridgeContext>>,
}

impl ChannelsBridge {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            host: Arc::new(HostBinding::new()),
            context: Mutex::new(None),
        }
    }

    /// Attach the host transport. Until attached, notifications are
    /// dropped and authorization requests fail fast.
    pub fn attach_host(&self, channel: Arc<dyn HostChannel>) {
        self.host.attach(channel);
    }

    pub fn detach_host(&self) {
        self.host.detach();
    }

    /// Destroy the client context. Disconnects first; a later `init` may
    /// rebuild the bridge from scratch.
    pub fn teardown(&self) {
        let mut guard = self.context.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(context) = guard.take() {
            context.client.disconnect();
            info!("bridge context destroyed");
        }
    }

    /// Dispatch one inbound host call. Unknown methods answer
    /// `NotImplemented`; errors carry the fixed bridge error code.
    pub fn handle_call(&self, method: &str, args: &Value) -> CallReply {
        let outcome = match method {
            "init" => self.init(args),
            "connect" => self.connect(),
            "disconnect" => self.disconnect(),
            "subscribe" => self.subscribe(args),
            "unsubscribe" => self.unsubscribe(args),
            "trigger" => self.trigger(args),
            "getSocketId" => return self.socket_id(),
            _ => return CallReply::NotImplemented,
        };
        match outcome {
            Ok(()) => CallReply::Success(Value::Null),
            Err(e) => call_error(e),
        }
    }

    fn init(&self, args: &Value) -> BridgeResult<()> {
        let mut guard = self.context.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_some() {
            return Err(BridgeError::AlreadyInitialized);
        }

        let init: InitArgs = serde_json::from_value(args.clone())?;
        // Validate eagerly so a bad proxy fails init, not connect.
        init.options.proxy_addr()?;

        let registry = Arc::new(ChannelRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(self.host.clone(), registry.clone()));

        // The HTTP endpoint is applied first; an explicit authorizer
        // option overwrites it with the callback bridge.
        let mut auth = AuthMethod::None;
        if let Some(endpoint) = &init.options.auth_endpoint {
            auth = AuthMethod::HttpEndpoint(endpoint.clone());
        }
        let authorizer = Arc::new(AuthorizerBridge::new(self.host.clone(), registry.clone()));
        if init.options.wants_callback_authorizer() {
            auth = AuthMethod::Callback(authorizer.clone());
        }

        let client = self.factory.create(&init.api_key, &init.options, auth)?;
        let subscriptions = SubscriptionService::new(
            client.clone(),
            registry,
            dispatcher.clone(),
            authorizer,
        );

        info!(cluster = ?init.options.cluster, "channels client initialized");
        *guard = Some(BridgeContext {
            client,
            dispatcher,
            subscriptions,
        });
        Ok(())
    }

    fn connect(&self) -> BridgeResult<()> {
        let guard = self.context.lock().unwrap_or_else(|e| e.into_inner());
        let context = guard.as_ref().ok_or(BridgeError::NotInitialized)?;
        context.client.connect(context.dispatcher.clone());
        Ok(())
    }

    fn disconnect(&self) -> BridgeResult<()> {
        let guard = self.context.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(context) = guard.as_ref() {
            context.client.disconnect();
        }
        Ok(())
    }

    fn subscribe(&self, args: &Value) -> BridgeResult<()> {
        let channel_name = require_str(args, "channelName")?;
        self.with_context(|context| context.subscriptions.subscribe(channel_name))
    }

    fn unsubscribe(&self, args: &Value) -> BridgeResult<()> {
        let channel_name = require_str(args, "channelName")?;
        self.with_context(|context| context.subscriptions.unsubscribe(channel_name))
    }

    fn trigger(&self, args: &Value) -> BridgeResult<()> {
        let channel_name = require_str(args, "channelName")?;
        let event_name = require_str(args, "eventName")?;
        let data = args.get("data").cloned().unwrap_or(Value::Null);
        self.with_context(|context| context.subscriptions.trigger(channel_name, event_name, &data))
    }

    fn socket_id(&self) -> CallReply {
        let result = self.with_context(|context| context.subscriptions.socket_id());
        match result {
            Ok(id) => CallReply::Success(json!(id)),
            Err(e) => call_error(e),
        }
    }

    fn with_context<T>(
        &self,
        f: impl FnOnce(&BridgeContext) -> BridgeResult<T>,
    ) -> BridgeResult<T> {
        let guard = self.context.lock().unwrap_or_else(|e| e.into_inner());
        let context = guard.as_ref().ok_or(BridgeError::NotInitialized)?;
        f(context)
    }
}

fn call_error(e: BridgeError) -> CallReply {
    CallReply::Error {
        code: ERROR_CODE.to_string(),
        message: e.to_string(),
    }
}

fn require_str<'a>(args: &'a Value, key: &str) -> BridgeResult<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| BridgeError::InvalidArguments(key.to_string()))
}
