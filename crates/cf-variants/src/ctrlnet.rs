use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use cf_core::{FabricError, Interface, InterfaceIndex, NetworkId, Policy, Result};
use cf_exec::HostExecutor;
use cf_net::{BridgeNetwork, NetClient};
use ipnet::IpNet;

/// The control-network address pool: four pre-allocated entries, each a
/// space-separated list of five `/24` prefixes, matching the original's
/// `DEFAULT_PREFIX_LIST` layout (see DESIGN.md's reconciliation note on why
/// this is kept as 4 entries of 5 prefixes rather than flattened to 4).
pub const DEFAULT_PREFIX_LIST: [&str; 4] = [
    "172.16.0.0/24 172.16.1.0/24 172.16.2.0/24 172.16.3.0/24 172.16.4.0/24",
    "172.17.0.0/24 172.17.1.0/24 172.17.2.0/24 172.17.3.0/24 172.17.4.0/24",
    "172.18.0.0/24 172.18.1.0/24 172.18.2.0/24 172.18.3.0/24 172.18.4.0/24",
    "172.19.0.0/24 172.19.1.0/24 172.19.2.0/24 172.19.3.0/24 172.19.4.0/24",
];

const CTRLIF_IDX_BASE: u32 = 99;

fn prefix_for_session(session_index: usize) -> &'static str {
    DEFAULT_PREFIX_LIST[session_index % DEFAULT_PREFIX_LIST.len()]
}

fn address_for_hostid(prefixes: &str, hostid: i64) -> Result<IpNet> {
    let first = prefixes
        .split_whitespace()
        .next()
        .ok_or_else(|| FabricError::inconsistent("empty control-net prefix list entry"))?;
    let (net, plen) = first
        .split_once('/')
        .ok_or_else(|| FabricError::inconsistent("malformed control-net prefix"))?;
    let net: Ipv4Addr = net.parse().map_err(|_| FabricError::inconsistent("malformed control-net prefix address"))?;
    let plen: u8 = plen.parse().map_err(|_| FabricError::inconsistent("malformed control-net prefix length"))?;

    // hostid of -2 addresses the second-to-last host in the block, matching
    // the original's convention for the daemon's own control address.
    let host_count = 1u32 << (32 - plen as u32);
    let offset = if hostid < 0 {
        host_count as i64 + hostid
    } else {
        hostid
    };
    let addr = u32::from(net) + offset as u32;
    IpNet::new(IpAddr::V4(Ipv4Addr::from(addr)), plen).map_err(|_| FabricError::inconsistent("invalid control-net prefix length"))
}

/// The daemon's own control bridge (SPEC_FULL.md 4.G "Control network"):
/// carries no inter-node traffic filtering (`all_link_data` is always
/// empty), refuses to start up if a same-id bridge already exists, and
/// optionally runs an updown script and attaches a server-facing interface.
pub struct CtrlNet {
    pub bridge: BridgeNetwork,
    prefixes: &'static str,
    hostid: Option<i64>,
    updown_script: Option<String>,
    serverintf: Option<String>,
    serverintf_index: Option<InterfaceIndex>,
    host_executor: Arc<dyn HostExecutor>,
    servers: Vec<(String, Arc<dyn HostExecutor>)>,
}

impl CtrlNet {
    pub fn new(id: NetworkId, bridge_name: impl Into<String>, session_index: usize, net: NetClient, host_executor: Arc<dyn HostExecutor>) -> Self {
        Self {
            bridge: BridgeNetwork::new(id, bridge_name, Policy::Accept, net),
            prefixes: prefix_for_session(session_index),
            hostid: None,
            updown_script: None,
            serverintf: None,
            serverintf_index: None,
            host_executor,
            servers: Vec::new(),
        }
    }

    pub fn with_hostid(mut self, hostid: i64) -> Self {
        self.hostid = Some(hostid);
        self
    }

    pub fn with_updown_script(mut self, script: impl Into<String>) -> Self {
        self.updown_script = Some(script.into());
        self
    }

    pub fn with_serverintf(mut self, ifname: impl Into<String>) -> Self {
        self.serverintf = Some(ifname.into());
        self
    }

    /// Distributed-session remote servers, each assigned a control address
    /// at the prefix index one below the previous assignment (matching the
    /// original's `CtrlNet.add_addresses` loop over `session.distributed.servers`).
    pub fn with_servers(mut self, servers: Vec<(String, Arc<dyn HostExecutor>)>) -> Self {
        self.servers = servers;
        self
    }

    pub async fn startup(&mut self) -> Result<()> {
        let id_prefix = format!("b.{}.", self.bridge.base.id);
        if self.bridge.net.existing_bridges(&id_prefix).await? {
            return Err(FabricError::Conflict(format!("control bridge {} already exists", self.bridge.base.bridge_name)));
        }

        self.bridge.startup().await?;

        let mut index = self.hostid.unwrap_or(-2);
        let addr = address_for_hostid(self.prefixes, index)?;
        self.bridge.net.create_address(&self.bridge.base.bridge_name, &addr.to_string()).await?;

        for (_name, executor) in &self.servers {
            index -= 1;
            let addr = address_for_hostid(self.prefixes, index)?;
            let remote_net = NetClient::new(self.bridge.net.backend(), executor.clone());
            remote_net.create_address(&self.bridge.base.bridge_name, &addr.to_string()).await?;
        }

        if let Some(script) = self.updown_script.clone() {
            let argv = vec![script, self.bridge.base.bridge_name.clone(), "startup".to_string()];
            self.host_executor.run(&argv, None).await?;
        }

        if let Some(ifname) = self.serverintf.clone() {
            let idx = InterfaceIndex(CTRLIF_IDX_BASE);
            self.bridge.base.attach_at(idx, Interface::new(&ifname))?;
            self.bridge.net.set_interface_master(&self.bridge.base.bridge_name, &ifname).await?;
            self.serverintf_index = Some(idx);
        }

        Ok(())
    }

    /// Best-effort teardown: detaching the server interface and running the
    /// shutdown half of the updown script are both logged, not propagated,
    /// matching the original's exception-swallowing shutdown.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(idx) = self.serverintf_index.take() {
            if let Err(err) = self.bridge.detach(idx).await {
                tracing::warn!(%err, "error detaching server interface during control-net shutdown");
            }
        }

        if let Some(script) = self.updown_script.clone() {
            let argv = vec![script, self.bridge.base.bridge_name.clone(), "shutdown".to_string()];
            if let Err(err) = self.host_executor.run(&argv, None).await {
                tracing::warn!(%err, "error running updown shutdown script");
            }
        }

        self.bridge.shutdown().await
    }

    /// Always empty: the control network carries no per-pair filtering.
    pub fn all_link_data(&self) -> Vec<cf_core::LinkRecord> {
        Vec::new()
    }
}
