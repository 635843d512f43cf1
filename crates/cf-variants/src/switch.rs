use cf_core::{Interface, InterfaceIndex, NetworkId, Policy, Result};
use cf_net::{BridgeNetwork, NetClient};

/// A plain learning bridge: ACCEPT policy, MAC learning left on
/// (SPEC_FULL.md 4.G "Switch").
pub struct Switch {
    pub bridge: BridgeNetwork,
}

impl Switch {
    pub fn new(id: NetworkId, bridge_name: impl Into<String>, net: NetClient) -> Self {
        Self {
            bridge: BridgeNetwork::new(id, bridge_name, Policy::Accept, net),
        }
    }

    pub async fn startup(&mut self) -> Result<()> {
        self.bridge.startup().await
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.bridge.shutdown().await
    }

    pub async fn attach(&mut self, iface: Interface) -> Result<InterfaceIndex> {
        self.bridge.attach(iface).await
    }

    pub async fn detach(&mut self, idx: InterfaceIndex) -> Result<Interface> {
        self.bridge.detach(idx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::Backend;
    use cf_exec::RecordingExecutor;
    use std::sync::Arc;

    #[tokio::test]
    async fn switch_startup_uses_accept_policy() {
        let exec = Arc::new(RecordingExecutor::new());
        let net = NetClient::new(Backend::LinuxBridge, exec);
        let mut switch = Switch::new(NetworkId(1), "b.1.sess", net);
        switch.startup().await.unwrap();
        assert_eq!(switch.bridge.base.policy, Policy::Accept);
    }
}
