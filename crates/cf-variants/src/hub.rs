use cf_core::{Interface, InterfaceIndex, NetworkId, Policy, Result};
use cf_net::{BridgeNetwork, NetClient};

/// A bridge with MAC learning disabled, so every frame forwards to every
/// port (SPEC_FULL.md 4.G "Hub").
pub struct Hub {
    pub bridge: BridgeNetwork,
}

impl Hub {
    pub fn new(id: NetworkId, bridge_name: impl Into<String>, net: NetClient) -> Self {
        Self {
            bridge: BridgeNetwork::new(id, bridge_name, Policy::Accept, net),
        }
    }

    pub async fn startup(&mut self) -> Result<()> {
        self.bridge.startup().await?;
        self.bridge.net.disable_mac_learning(&self.bridge.base.bridge_name).await
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
    async fn startup_disables_mac_learning() {
        let exec = Arc::new(RecordingExecutor::new());
        let net = NetClient::new(Backend::LinuxBridge, exec.clone());
        let mut hub = Hub::new(NetworkId(1), "b.1.sess", net);
        hub.startup().await.unwrap();
        let invocations = exec.invocations();
        assert!(invocations.iter().any(|argv| argv.contains(&"ageing_time".to_string())));
    }
}
