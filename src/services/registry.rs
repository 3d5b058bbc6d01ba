//! Channel registry: one live handle per channel name.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::client::LiveChannel;
use crate::error::BridgeResult;
use crate::models::ChannelKind;

/// A registered subscription: the kind resolved once at subscribe time
/// plus the live handle from the underlying client.
#[derive(Clone)]
pub struct RegisteredChannel {
    pub kind: ChannelKind,
    pub handle: Arc<dyn LiveChannel>,
}

/// Book-keeping for authorization round trips currently in flight for one
/// name. The entry exists only while at least one round trip is pending;
/// `epoch` is bumped when the name is unsubscribed so a grant resolved
/// against an older epoch is discarded.
#[derive(Default)]
struct PendingAuth {
    count: u32,
    epoch: u64,
}

#[derive(Default)]
struct RegistryState {
    channels: HashMap<String, RegisteredChannel>,
    pending_auth: HashMap<String, PendingAuth>,
}

/// Ticket for one in-flight authorization round trip. Pass it back to
/// [`ChannelRegistry::finish_authorization`] to learn whether the grant is
/// still applicable.
#[derive(Debug, Clone, Copy)]
pub struct AuthTicket {
    epoch: u64,
}

/// Maps channel name to live handle. Mutated only by the subscription
/// manager; read concurrently by the dispatcher. The lock is coarse and
/// never held across a blocking authorization wait.
#[derive(Default)]
pub struct ChannelRegistry {
    state: RwLock<RegistryState>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a channel name by its prefix.
    pub fn resolve_kind(name: &str) -> ChannelKind {
        ChannelKind::from_name(name)
    }

    /// Return the existing handle for `name`, or create and register one
    /// via `factory`. Re-subscribing to a registered name is a no-op.
    ///
    /// The lock is held across the factory call so a concurrent subscribe
    /// for the same name cannot create a second live handle. The factory
    /// must issue the subscription without blocking; the authorization
    /// round trip happens later on the client's own thread.
    pub fn get_or_create<F>(&self, name: &str, factory: F) -> BridgeResult<RegisteredChannel>
    where
        F: FnOnce(ChannelKind) -> BridgeResult<Arc<dyn LiveChannel>>,
    {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = state.channels.get(name) {
            debug!(channel = %name, "already subscribed");
            return Ok(existing.clone());
        }

        let kind = Self::resolve_kind(name);
        let handle = factory(kind)?;
        let registered = RegisteredChannel { kind, handle };
        state.channels.insert(name.to_string(), registered.clone());
        Ok(registered)
    }

    /// Unregister `name`. Tolerates names that were never registered.
    /// Returns the removed entry so the caller can tear it down. Any
    /// authorization round trip still in flight for `name` is invalidated.
    pub fn remove(&self, name: &str) -> Option<RegisteredChannel> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if let Some(pending) = state.pending_auth.get_mut(name) {
            pending.epoch += 1;
        }
        let removed = state.channels.remove(name);
        if removed.is_some() {
            debug!(channel = %name, "unregistered");
        }
        removed
    }

    pub fn lookup(&self, name: &str) -> Option<RegisteredChannel> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .channels
            .get(name)
            .cloned()
    }

    /// Record the start of an authorization round trip for `name`.
    /// Every ticket must be passed to `finish_authorization` exactly once.
    pub fn begin_authorization(&self, name: &str) -> AuthTicket {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let pending = state.pending_auth.entry(name.to_string()).or_default();
        pending.count += 1;
        AuthTicket {
            epoch: pending.epoch,
        }
    }

    /// Close out one authorization round trip. Returns whether a grant
    /// resolved by this round trip is still applicable, i.e. the name was
    /// not unsubscribed while the trip was in flight. The book-keeping
    /// entry is dropped when the last pending trip for the name finishes.
    pub fn finish_authorization(&self, name: &str, ticket: AuthTicket) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        match state.pending_auth.get_mut(name) {
            Some(pending) => {
                let applicable = pending.epoch == ticket.epoch;
                pending.count = pending.count.saturating_sub(1);
                if pending.count == 0 {
                    state.pending_auth.remove(name);
                }
                applicable
            }
            None => true,
        }
    }

    /// Number of names with an authorization round trip in flight.
    pub(crate) fn pending_authorization_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .pending_auth
            .len()
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .channels
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
