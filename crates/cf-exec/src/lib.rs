pub mod executor;

#[cfg(any(test, feature = "test-util"))]
pub mod testutil;

pub use executor::{CommandOutput, DistributedExecutor, HostExecutor, LocalHostExecutor};

#[cfg(any(test, feature = "test-util"))]
pub use testutil::RecordingExecutor;
