use std::sync::Arc;

use ipnet::IpNet;

use crate::ids::{InterfaceIndex, NetworkId};

/// The shaping/adjacency-relevant parameters of a link endpoint, cached so
/// that repeated `set_param` calls with unchanged values are no-ops (see
/// SPEC_FULL.md 4.E "linkconfig", step 3).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinkParams {
    pub bandwidth: i64,
    pub delay: i64,
    pub jitter: i64,
    pub loss: f32,
    pub duplicate: f32,
    pub has_tbf: bool,
    pub has_netem: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bandwidth,
    Delay,
    Jitter,
    Loss,
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f32),
}

/// Invoked whenever an interface's 3D position changes; bound by a wireless
/// model when one is attached to the owning network (SPEC_FULL.md 4.G).
pub type PositionHook = Arc<dyn Fn(f64, f64, f64) + Send + Sync>;

/// A single virtual interface: a veth half, a GRE tap, or a node-side tap.
#[derive(Clone)]
pub struct Interface {
    pub name: String,
    pub mac: Option<String>,
    pub mtu: u32,
    pub addresses: Vec<IpNet>,
    pub network: Option<NetworkId>,
    pub network_index: Option<InterfaceIndex>,
    /// Set when this interface is the remote half of a bridge-to-bridge
    /// veth link created by `linknet`.
    pub peer_network: Option<NetworkId>,
    pub params: LinkParams,
    pub position_hook: Option<PositionHook>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mac: None,
            mtu: 1500,
            addresses: Vec::new(),
            network: None,
            network_index: None,
            peer_network: None,
            params: LinkParams::default(),
            position_hook: None,
        }
    }

    pub fn get_param(&self, kind: ParamKind) -> ParamValue {
        match kind {
            ParamKind::Bandwidth => ParamValue::Int(self.params.bandwidth),
            ParamKind::Delay => ParamValue::Int(self.params.delay),
            ParamKind::Jitter => ParamValue::Int(self.params.jitter),
            ParamKind::Loss => ParamValue::Float(self.params.loss),
            ParamKind::Duplicate => ParamValue::Float(self.params.duplicate),
        }
    }

    /// Returns true iff the value changed, updating the cache atomically
    /// either way.
    pub fn set_param(&mut self, kind: ParamKind, value: ParamValue) -> bool {
        match (kind, value) {
            (ParamKind::Bandwidth, ParamValue::Int(v)) => {
                let changed = self.params.bandwidth != v;
                self.params.bandwidth = v;
                changed
            }
            (ParamKind::Delay, ParamValue::Int(v)) => {
                let changed = self.params.delay != v;
                self.params.delay = v;
                changed
            }
            (ParamKind::Jitter, ParamValue::Int(v)) => {
                let changed = self.params.jitter != v;
                self.params.jitter = v;
                changed
            }
            (ParamKind::Loss, ParamValue::Float(v)) => {
                let changed = self.params.loss != v;
                self.params.loss = v;
                changed
            }
            (ParamKind::Duplicate, ParamValue::Float(v)) => {
                let changed = self.params.duplicate != v;
                self.params.duplicate = v;
                changed
            }
            _ => false,
        }
    }

    pub fn set_position(&self, x: f64, y: f64, z: f64) {
        if let Some(hook) = &self.position_hook {
            hook(x, y, z);
        }
    }
}

impl std::fmt::Debug for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interface")
            .field("name", &self.name)
            .field("mac", &self.mac)
            .field("addresses", &self.addresses)
            .field("network", &self.network)
            .field("network_index", &self.network_index)
            .field("peer_network", &self.peer_network)
            .field("params", &self.params)
            .finish()
    }
}
