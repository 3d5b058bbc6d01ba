//! Channel kinds and naming conventions.

use serde::{Deserialize, Serialize};

/// Channel kind, derived once from the name prefix and carried explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Public channel: no authorization required.
    Public,
    /// Private channel: requires a signed grant to subscribe.
    Private,
    /// Private channel with end-to-end encrypted payloads.
    PrivateEncrypted,
    /// Presence channel: authorization plus member join/leave tracking.
    Presence,
}

impl ChannelKind {
    /// Derive channel kind from the name prefix.
    ///
    /// `private-encrypted-` must be tested before `private-` because every
    /// encrypted channel name also matches the shorter prefix.
    pub fn from_name(name: &str) -> Self {
        if name.starts_with("private-encrypted-") {
            ChannelKind::PrivateEncrypted
        } else if name.starts_with("private-") {
            ChannelKind::Private
        } else if name.starts_with("presence-") {
            ChannelKind::Presence
        } else {
            ChannelKind::Public
        }
    }

    /// Kinds that accept client-originated trigger events.
    pub fn supports_client_events(&self) -> bool {
        matches!(self, ChannelKind::Private | ChannelKind::PrivateEncrypted)
    }
}
