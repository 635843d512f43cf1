use std::path::PathBuf;
use std::time::Duration;

/// Which set of kernel primitives the net-client backend speaks.
///
/// Chosen once per process; see SPEC_FULL.md 4.B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    LinuxBridge,
    Ovs,
}

impl Default for Backend {
    fn default() -> Self {
        Self::LinuxBridge
    }
}

/// Explicit, constructor-supplied configuration for the fabric core. Never
/// read from ambient globals or environment variables directly — callers
/// that want env-driven config build one of these from `std::env` at their
/// own edge and pass it in.
#[derive(Debug, Clone)]
pub struct FabricConfig {
    pub backend: Backend,
    /// Path used as the kernel atomic-edit sandbox file during filter commits.
    pub atomic_file: PathBuf,
    /// Target spacing between filter-commit worker ticks (~300ms per spec).
    pub tick_period: Duration,
    /// Short id mixed into bridge/veth names to disambiguate sessions.
    pub session_short_id: String,
}

impl FabricConfig {
    pub fn new(session_short_id: impl Into<String>) -> Self {
        Self {
            backend: Backend::default(),
            atomic_file: PathBuf::from("/var/run/cf-fabric.atomic"),
            tick_period: Duration::from_millis(300),
            session_short_id: session_short_id.into(),
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_atomic_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.atomic_file = path.into();
        self
    }

    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_linux_bridge_and_300ms_tick() {
        let cfg = FabricConfig::new("abc123");
        assert_eq!(cfg.backend, Backend::LinuxBridge);
        assert_eq!(cfg.tick_period, Duration::from_millis(300));
        assert_eq!(cfg.session_short_id, "abc123");
    }

    #[test]
    fn builder_overrides_take_effect() {
        let cfg = FabricConfig::new("abc123")
            .with_backend(Backend::Ovs)
            .with_tick_period(Duration::from_millis(50));
        assert_eq!(cfg.backend, Backend::Ovs);
        assert_eq!(cfg.tick_period, Duration::from_millis(50));
    }
}
