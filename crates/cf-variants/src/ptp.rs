use cf_core::{FabricError, Interface, InterfaceIndex, LinkRecord, NetworkId, Policy, Result};
use cf_net::{BridgeNetwork, NetClient};

const PTP_CAPACITY: usize = 2;

/// A point-to-point link between exactly two interfaces. No node message is
/// generated for it (it is described entirely by its one link record);
/// `all_link_data` additionally emits a second, swapped-endpoint record
/// when the two sides' shaping parameters differ (SPEC_FULL.md 4.G
/// "Point-to-point").
pub struct Ptp {
    pub bridge: BridgeNetwork,
}

impl Ptp {
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
        if self.bridge.base.len() >= PTP_CAPACITY {
            return Err(FabricError::CapacityExceeded {
                network: self.bridge.base.bridge_name.clone(),
                limit: PTP_CAPACITY,
            });
        }
        self.bridge.attach(iface).await
    }

    pub async fn detach(&mut self, idx: InterfaceIndex) -> Result<Interface> {
        self.bridge.detach(idx).await
    }

    /// Empty unless exactly two interfaces are attached.
    pub fn all_link_data(&self) -> Vec<LinkRecord> {
        let ifaces: Vec<_> = self.bridge.base.iter().collect();
        if ifaces.len() != PTP_CAPACITY {
            return Vec::new();
        }
        let (&idx1, if1) = ifaces[0];
        let (&idx2, if2) = ifaces[1];
        let unidirectional = if1.params != if2.params;

        let mut links = vec![LinkRecord {
            a: idx1,
            b: idx2,
            unidirectional,
        }];
        if unidirectional {
            links.push(LinkRecord {
                a: idx2,
                b: idx1,
                unidirectional: true,
            });
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{Backend, ParamKind, ParamValue};
    use cf_exec::RecordingExecutor;
    use std::sync::Arc;

    fn client() -> NetClient {
        NetClient::new(Backend::LinuxBridge, Arc::new(RecordingExecutor::new()))
    }

    #[tokio::test]
    async fn third_attach_fails_with_capacity_exceeded() {
        let mut ptp = Ptp::new(NetworkId(1), "b.1.sess", client());
        ptp.startup().await.unwrap();
        ptp.attach(Interface::new("a")).await.unwrap();
        ptp.attach(Interface::new("b")).await.unwrap();
        let err = ptp.attach(Interface::new("c")).await.unwrap_err();
        assert!(matches!(err, FabricError::CapacityExceeded { .. }));
    }

    #[tokio::test]
    async fn all_link_data_has_one_record_with_both_endpoints() {
        let mut ptp = Ptp::new(NetworkId(1), "b.1.sess", client());
        ptp.startup().await.unwrap();
        ptp.attach(Interface::new("a")).await.unwrap();
        ptp.attach(Interface::new("b")).await.unwrap();
        let links = ptp.all_link_data();
        assert_eq!(links.len(), 1);
        assert!(!links[0].unidirectional);
    }

    #[tokio::test]
    async fn differing_params_yield_a_second_swapped_record() {
        let mut ptp = Ptp::new(NetworkId(1), "b.1.sess", client());
        ptp.startup().await.unwrap();
        let a = ptp.attach(Interface::new("a")).await.unwrap();
        ptp.attach(Interface::new("b")).await.unwrap();
        ptp.bridge.base.get_mut(a).unwrap().set_param(ParamKind::Delay, ParamValue::Int(50));
        let links = ptp.all_link_data();
        assert_eq!(links.len(), 2);
        assert!(links.iter().all(|l| l.unidirectional));
    }
}
