//! BuildRelay — reacts to a build completion event by waiting for the
//! build's final status and announcing it on chat and a pub/sub topic.

pub mod relay;

pub use relay::{InvocationOutcome, Relay};
