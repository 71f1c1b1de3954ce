pub mod poller;
pub mod provider;

pub use poller::{PollPolicy, StatusPoller};
pub use provider::{BuildStatusProvider, HttpBuildStatusProvider};
