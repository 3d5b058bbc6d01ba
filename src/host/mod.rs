//! The host-context boundary: outbound notifications, method invocations
//! with replies, and the attach/detach lifecycle.

pub mod mailbox;

use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

pub use mailbox::{HostMailbox, HostMessage};

/// A reply from the host to a bridge-initiated method invocation.
/// Exactly one reply is delivered per invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostReply {
    Success(Option<Value>),
    Error { code: String, message: String },
    NotImplemented,
}

/// One-shot reply sink for a bridge-initiated invocation. Dropping it
/// without calling counts as the host abandoning the request.
pub type ReplyFn = Box<dyn FnOnce(HostReply) + Send>;

/// Outcome of an inbound host call into the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum CallReply {
    Success(Value),
    Error { code: String, message: String },
    NotImplemented,
}

/// The cross-context call transport into the host.
///
/// Implementations must deliver both notifications and invocations on the
/// host's own serialized execution context; the bridge calls these methods
/// from arbitrary threads, including the client's I/O thread.
pub trait HostChannel: Send + Sync {
    /// Fire-and-forget push notification.
    fn notify(&self, method: &str, payload: Value);

    /// Invoke a host-side method; the host answers through `reply`.
    fn invoke(&self, method: &str, payload: Value, reply: ReplyFn);
}

/// Tracks whether a host context is currently attached.
///
/// Mirrors a UI-surface lifecycle: the bridge can outlive its host, and
/// outbound traffic while detached is dropped (notifications) or fails
/// fast (invocations).
#[derive(Default)]
pub struct HostBinding {
    channel: RwLock<Option<Arc<dyn HostChannel>>>,
}

impl HostBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, channel: Arc<dyn HostChannel>) {
        *self.channel.write().unwrap_or_else(|e| e.into_inner()) = Some(channel);
        debug!("host context attached");
    }

    pub fn detach(&self) {
        *self.channel.write().unwrap_or_else(|e| e.into_inner()) = None;
        debug!("host context detached");
    }

    pub fn is_attached(&self) -> bool {
        self.channel
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn current(&self) -> Option<Arc<dyn HostChannel>> {
        self.channel
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Push a notification; dropped with a warning when detached.
    pub fn notify(&self, method: &str, payload: Value) {
        match self.current() {
            Some(channel) => channel.notify(method, payload),
            None => warn!(method = %method, "host detached, notification dropped"),
        }
    }

    /// Invoke a host method. Returns `false` without touching `reply`'s
    /// contract when no host is attached, so callers can fail fast
    /// instead of blocking.
    pub fn invoke(&self, method: &str, payload: Value, reply: ReplyFn) -> bool {
        match self.current() {
            Some(channel) => {
                channel.invoke(method, payload, reply);
                true
            }
            None => {
                warn!(method = %method, "host detached, invocation refused");
                false
            }
        }
    }
}
