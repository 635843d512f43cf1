use cf_core::{Interface, InterfaceIndex, NetworkId, Result};
use cf_net::NetClient;

use crate::gretap::GreTap;

/// A GRE tunnel between two daemon instances: identical to a GRE-tap bridge
/// except for its ACCEPT policy, matching the original, which subclasses
/// `GreTapBridge` purely to override the policy (SPEC_FULL.md 4.G
/// "Tunnel").
pub struct Tunnel {
    inner: GreTap,
}

impl Tunnel {
    pub fn new(id: NetworkId, bridge_name: impl Into<String>, session_id: u32, net: NetClient) -> Self {
        Self { inner: GreTap::new(id, bridge_name, session_id, net) }
    }

    pub async fn startup(&mut self) -> Result<()> {
        self.inner.startup().await
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown().await
    }

    pub async fn addrconfig(&mut self, remoteip: &str) -> Result<InterfaceIndex> {
        self.inner.addrconfig(remoteip).await
    }

    pub async fn attach(&mut self, iface: Interface) -> Result<InterfaceIndex> {
        self.inner.attach(iface).await
    }

    pub async fn detach(&mut self, idx: InterfaceIndex) -> Result<Interface> {
        self.inner.detach(idx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{Backend, Policy};
    use cf_exec::RecordingExecutor;
    use std::sync::Arc;

    #[tokio::test]
    async fn tunnel_uses_accept_policy() {
        let exec = Arc::new(RecordingExecutor::new());
        let net = NetClient::new(Backend::LinuxBridge, exec);
        let tunnel = Tunnel::new(NetworkId(4), "b.4.sess", 1, net);
        assert_eq!(tunnel.inner.bridge.base.policy, Policy::Accept);
    }
}
