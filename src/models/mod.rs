//! Data model: channel kinds, normalized events, presence members.

pub mod channel;
pub mod event;
pub mod presence;

pub use channel::ChannelKind;
pub use event::{ConnectionState, ConnectionStateChange, NormalizedEvent};
pub use presence::Member;
