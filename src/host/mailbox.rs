//! Queue-backed reference implementation of the host transport.
//!
//! The embedder drains the receiver on its own serialized context (its
//! event loop), which is what re-marshals bridge traffic off the client's
//! I/O threads. Sending is non-blocking and thread-safe, so the bridge can
//! enqueue from anywhere.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use super::{HostChannel, ReplyFn};

/// One unit of outbound host traffic.
pub enum HostMessage {
    Notify {
        method: String,
        payload: Value,
    },
    Invoke {
        method: String,
        payload: Value,
        reply: ReplyFn,
    },
}

impl std::fmt::Debug for HostMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostMessage::Notify { method, payload } => f
                .debug_struct("Notify")
                .field("method", method)
                .field("payload", payload)
                .finish(),
            HostMessage::Invoke { method, payload, .. } => f
                .debug_struct("Invoke")
                .field("method", method)
                .field("payload", payload)
                .finish_non_exhaustive(),
        }
    }
}

/// [`HostChannel`] that enqueues messages for a host-side event loop.
pub struct HostMailbox {
    tx: mpsc::UnboundedSender<HostMessage>,
}

impl HostMailbox {
    /// Create a mailbox and the receiver the host loop drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl HostChannel for HostMailbox {
    fn notify(&self, method: &str, payload: Value) {
        let msg = HostMessage::Notify {
            method: method.to_string(),
            payload,
        };
        if self.tx.send(msg).is_err() {
            warn!(method = %method, "host loop gone, notification dropped");
        }
    }

    fn invoke(&self, method: &str, payload: Value, reply: ReplyFn) {
        let msg = HostMessage::Invoke {
            method: method.to_string(),
            payload,
            reply,
        };
        // A closed loop drops `reply`, which unblocks any waiter with the
        // absence signal.
        if self.tx.send(msg).is_err() {
            warn!(method = %method, "host loop gone, invocation dropped");
        }
    }
}
