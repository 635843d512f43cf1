use cf_core::{FabricError, Interface, InterfaceIndex, NetworkId, Policy, Result};
use cf_net::{BridgeNetwork, NetClient};

/// A bridge with a single GRE tap device carrying traffic to a remote host
/// (SPEC_FULL.md 4.G "GRE-tap bridge"). The tap is configured once; a
/// second `addrconfig` call is rejected rather than silently replacing the
/// device, matching the original's one-shot semantics.
pub struct GreTap {
    pub bridge: BridgeNetwork,
    grekey: u32,
    ttl: u8,
    localip: Option<String>,
    remoteip: Option<String>,
    tap_name: Option<String>,
    tap_index: Option<InterfaceIndex>,
}

impl GreTap {
    /// `session_id` and the network's own id combine into the default GRE
    /// key (`session_id ^ id`), matching the original's `key` default.
    pub fn new(id: NetworkId, bridge_name: impl Into<String>, session_id: u32, net: NetClient) -> Self {
        Self {
            bridge: BridgeNetwork::new(id, bridge_name, Policy::Accept, net),
            grekey: session_id ^ id.0,
            ttl: 255,
            localip: None,
            remoteip: None,
            tap_name: None,
            tap_index: None,
        }
    }

    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn startup(&mut self) -> Result<()> {
        self.bridge.startup().await?;
        if let Some(remoteip) = self.remoteip.clone() {
            self.create_tap(&remoteip).await?;
        }
        Ok(())
    }

    /// Creates the GRE tap toward `remoteip` and attaches it to the
    /// bridge. Fails with `AlreadyConfigured` if a tap already exists
    /// (SPEC_FULL.md 4.G).
    pub async fn addrconfig(&mut self, remoteip: &str) -> Result<InterfaceIndex> {
        if self.tap_name.is_some() {
            return Err(FabricError::AlreadyConfigured(self.bridge.base.bridge_name.clone()));
        }
        self.remoteip = Some(remoteip.to_string());
        self.create_tap(remoteip).await
    }

    async fn create_tap(&mut self, remoteip: &str) -> Result<InterfaceIndex> {
        let tap_name = format!("gt.{}.{}", self.bridge.base.id, self.grekey);
        self.bridge
            .net
            .create_gretap(&tap_name, remoteip, self.localip.as_deref(), self.ttl, self.grekey)
            .await?;
        let idx = self.bridge.attach(Interface::new(&tap_name)).await?;
        self.tap_name = Some(tap_name);
        self.tap_index = Some(idx);
        Ok(idx)
    }

    /// Detaches and destroys the tap before tearing down the bridge itself,
    /// matching the original's shutdown order.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(idx) = self.tap_index.take() {
            let _ = self.bridge.detach(idx).await;
        }
        if let Some(tap_name) = self.tap_name.take() {
            if let Err(err) = self.bridge.net.delete_link(&tap_name).await {
                tracing::warn!(tap = %tap_name, %err, "error deleting gretap device during shutdown");
            }
        }
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

    fn client() -> (NetClient, Arc<RecordingExecutor>) {
        let exec = Arc::new(RecordingExecutor::new());
        (NetClient::new(Backend::LinuxBridge, exec.clone()), exec)
    }

    #[tokio::test]
    async fn addrconfig_creates_tap_and_attaches_it() {
        let (net, exec) = client();
        let mut gt = GreTap::new(NetworkId(3), "b.3.sess", 7, net);
        gt.bridge.startup().await.unwrap();
        let idx = gt.addrconfig("203.0.113.5").await.unwrap();
        assert!(gt.bridge.base.get(idx).is_some());
        let invocations = exec.invocations();
        assert!(invocations.iter().any(|argv| argv.contains(&"gretap".to_string())));
    }

    #[tokio::test]
    async fn second_addrconfig_is_rejected() {
        let (net, _exec) = client();
        let mut gt = GreTap::new(NetworkId(3), "b.3.sess", 7, net);
        gt.bridge.startup().await.unwrap();
        gt.addrconfig("203.0.113.5").await.unwrap();
        let err = gt.addrconfig("203.0.113.6").await.unwrap_err();
        assert!(matches!(err, FabricError::AlreadyConfigured(_)));
    }

    #[tokio::test]
    async fn key_defaults_to_session_xor_id() {
        let (net, _exec) = client();
        let gt = GreTap::new(NetworkId(5), "b.5.sess", 9, net);
        assert_eq!(gt.grekey, 5 ^ 9);
    }

    #[tokio::test]
    async fn default_policy_is_accept() {
        let (net, _exec) = client();
        let gt = GreTap::new(NetworkId(3), "b.3.sess", 7, net);
        assert_eq!(gt.bridge.base.policy, cf_core::Policy::Accept);
    }
}
