//! Notification delivery for finished builds.
//!
//! Two channels, each attempted exactly once per invocation:
//! - Chat webhook (primary): colored attachment POSTed as JSON
//! - Pub/sub topic (secondary): plain-text summary plus full build dump
//!
//! A topic failure is only ever logged and reported as a warning.

pub mod chat;
pub mod dispatcher;
pub mod topic;

pub use chat::ChatWebhookClient;
pub use dispatcher::Dispatcher;
pub use topic::{HttpTopicPublisher, PublishError, TopicPublisher};
