use std::collections::HashMap;
use std::sync::Arc;

use cf_core::{Interface, InterfaceIndex, LinkRecord, NetworkId, Policy, Result};
use cf_filter::FilterCommitQueue;
use cf_net::{BridgeNetwork, NetClient};
use tokio::sync::Mutex as AsyncMutex;

/// Callback contract for an external wireless-propagation model: told
/// about interface position changes, and in turn reports which pairs it
/// currently considers linked. The model's own physics are out of scope
/// (SPEC_FULL.md §1 Non-goals); only this boundary is specified.
pub trait WirelessModel: Send + Sync {
    fn position_callback(&self, x: f64, y: f64, z: f64);
    fn link_data(&self) -> Vec<LinkRecord>;
    fn update_config(&self, config: &HashMap<String, String>);
}

/// Callback contract for a mobility model driving interface positions over
/// time (e.g. waypoint playback). Out of scope beyond this boundary.
pub trait MobilityModel: Send + Sync {
    fn update_config(&self, config: &HashMap<String, String>);
}

/// Which model slot a `set_model` call targets, carrying the model itself
/// since the two slots hold different trait objects (SPEC_FULL.md 4.G
/// `set-model(kind, config)`, `kind` ∈ {wireless, mobility}).
pub enum ModelHandle {
    Wireless(Arc<dyn WirelessModel>),
    Mobility(Arc<dyn MobilityModel>),
}

/// A wireless LAN bridge: MAC learning disabled, DROP policy (link state is
/// explicit per pair), registered with the filter-commit queue, optionally
/// driven by a wireless and/or mobility model (SPEC_FULL.md 4.G "Wireless
/// LAN").
pub struct Wlan {
    pub bridge: Arc<AsyncMutex<BridgeNetwork>>,
    id: NetworkId,
    queue: Arc<FilterCommitQueue>,
    model: Option<Arc<dyn WirelessModel>>,
    mobility: Option<Arc<dyn MobilityModel>>,
}

impl Wlan {
    pub fn new(id: NetworkId, bridge_name: impl Into<String>, net: NetClient, queue: Arc<FilterCommitQueue>) -> Self {
        Self {
            bridge: Arc::new(AsyncMutex::new(BridgeNetwork::new(id, bridge_name, Policy::Drop, net))),
            id,
            queue,
            model: None,
            mobility: None,
        }
    }

    pub async fn startup(&mut self) -> Result<()> {
        let bridge_name = {
            let mut bridge = self.bridge.lock().await;
            bridge.startup().await?;
            bridge.base.bridge_name.clone()
        };
        {
            let bridge = self.bridge.lock().await;
            bridge.net.disable_mac_learning(&bridge_name).await?;
        }
        self.queue.register(self.id, self.bridge.clone()).await;
        self.queue.mark_dirty(self.id).await;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.queue.unregister(self.id).await;
        self.bridge.lock().await.shutdown().await
    }

    pub async fn attach(&mut self, mut iface: Interface) -> Result<InterfaceIndex> {
        if let Some(model) = &self.model {
            let model = model.clone();
            iface.position_hook = Some(Arc::new(move |x, y, z| {
                model.position_callback(x, y, z);
            }));
        }
        self.bridge.lock().await.attach(iface).await
    }

    pub async fn detach(&mut self, idx: InterfaceIndex) -> Result<Interface> {
        self.bridge.lock().await.detach(idx).await
    }

    pub async fn link(&mut self, a: InterfaceIndex, b: InterfaceIndex) -> Result<bool> {
        let changed = self.bridge.lock().await.base.link(a, b)?;
        if changed {
            self.queue.mark_dirty(self.id).await;
        }
        Ok(changed)
    }

    pub async fn unlink(&mut self, a: InterfaceIndex, b: InterfaceIndex) -> Result<bool> {
        let changed = self.bridge.lock().await.base.unlink(a, b)?;
        if changed {
            self.queue.mark_dirty(self.id).await;
        }
        Ok(changed)
    }

    /// `kind` selects which model slot `config` configures: "wireless"
    /// replaces the propagation model, "mobility" replaces the mobility
    /// model (SPEC_FULL.md 4.G `set_model`). `kind` and `model` must agree
    /// on which slot is being set; a mismatch is logged and ignored.
    pub fn set_model(&mut self, kind: &str, model: ModelHandle, config: &HashMap<String, String>) {
        match (kind, model) {
            ("wireless", ModelHandle::Wireless(model)) => {
                model.update_config(config);
                self.model = Some(model);
            }
            ("mobility", ModelHandle::Mobility(mobility)) => {
                mobility.update_config(config);
                self.mobility = Some(mobility);
            }
            (kind, _) => tracing::warn!(kind, "model kind does not match handle, ignored"),
        }
    }

    pub async fn all_link_data(&self) -> Vec<LinkRecord> {
        let mut links = self.bridge.lock().await.base.all_link_data();
        if let Some(model) = &self.model {
            links.extend(model.link_data());
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::Backend;
    use cf_exec::RecordingExecutor;
    use std::time::Duration;

    fn queue() -> Arc<FilterCommitQueue> {
        Arc::new(FilterCommitQueue::new("/tmp/wlan-test.atomic", Duration::from_millis(10)))
    }

    #[tokio::test]
    async fn startup_registers_and_disables_mac_learning() {
        let exec = Arc::new(RecordingExecutor::new());
        let net = NetClient::new(Backend::LinuxBridge, exec.clone());
        let q = queue();
        let mut wlan = Wlan::new(NetworkId(9), "b.9.sess", net, q.clone());
        wlan.startup().await.unwrap();
        assert!(q.is_registered(NetworkId(9)).await);
        let invocations = exec.invocations();
        assert!(invocations.iter().any(|argv| argv.contains(&"ageing_time".to_string())));
        wlan.shutdown().await.unwrap();
        assert!(!q.is_registered(NetworkId(9)).await);
    }

    #[tokio::test]
    async fn link_and_unlink_within_a_window_coalesce_to_one_commit() {
        let exec = Arc::new(RecordingExecutor::new());
        let net = NetClient::new(Backend::LinuxBridge, exec.clone());
        let q = queue();
        let mut wlan = Wlan::new(NetworkId(10), "b.10.sess", net, q.clone());
        wlan.startup().await.unwrap();
        let a = wlan.attach(Interface::new("veth0")).await.unwrap();
        let b = wlan.attach(Interface::new("veth1")).await.unwrap();

        wlan.link(a, b).await.unwrap();
        wlan.unlink(a, b).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        let links = wlan.all_link_data().await;
        assert!(links.is_empty());
        wlan.shutdown().await.unwrap();
    }

    struct FakeWirelessModel;
    impl WirelessModel for FakeWirelessModel {
        fn position_callback(&self, _x: f64, _y: f64, _z: f64) {}
        fn link_data(&self) -> Vec<LinkRecord> {
            Vec::new()
        }
        fn update_config(&self, _config: &HashMap<String, String>) {}
    }

    struct FakeMobilityModel {
        configured: std::sync::atomic::AtomicBool,
    }
    impl MobilityModel for FakeMobilityModel {
        fn update_config(&self, _config: &HashMap<String, String>) {
            self.configured.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn set_model_wireless_installs_the_propagation_model() {
        let exec = Arc::new(RecordingExecutor::new());
        let net = NetClient::new(Backend::LinuxBridge, exec);
        let mut wlan = Wlan::new(NetworkId(11), "b.11.sess", net, queue());
        wlan.set_model("wireless", ModelHandle::Wireless(Arc::new(FakeWirelessModel)), &HashMap::new());
        assert!(wlan.model.is_some());
    }

    #[tokio::test]
    async fn set_model_mobility_installs_the_mobility_model() {
        let exec = Arc::new(RecordingExecutor::new());
        let net = NetClient::new(Backend::LinuxBridge, exec);
        let mut wlan = Wlan::new(NetworkId(12), "b.12.sess", net, queue());
        let mobility = Arc::new(FakeMobilityModel { configured: std::sync::atomic::AtomicBool::new(false) });
        wlan.set_model("mobility", ModelHandle::Mobility(mobility.clone()), &HashMap::new());
        assert!(wlan.mobility.is_some());
        assert!(mobility.configured.load(std::sync::atomic::Ordering::SeqCst));
    }
}
