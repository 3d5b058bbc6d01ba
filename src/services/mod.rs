//! Core services: registry, authorization bridge, subscriptions, dispatch.

pub mod authorizer;
pub mod dispatcher;
pub mod registry;
pub mod subscription;

pub use authorizer::AuthorizerBridge;
pub use dispatcher::Dispatcher;
pub use registry::{ChannelRegistry, RegisteredChannel};
pub use subscription::SubscriptionService;
