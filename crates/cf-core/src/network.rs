use std::collections::BTreeMap;

use crate::error::{FabricError, Result};
use crate::ids::{InterfaceIndex, NetworkId};
use crate::interface::Interface;
use crate::policy::Policy;

/// Canonical (low, high) ordering for an adjacency key so `(a, b)` and
/// `(b, a)` address the same entry.
fn adjacency_key(a: InterfaceIndex, b: InterfaceIndex) -> (InterfaceIndex, InterfaceIndex) {
    if a.0 <= b.0 { (a, b) } else { (b, a) }
}

/// One directed-or-undirected link record as reported by `all_link_data`.
#[derive(Debug, Clone)]
pub struct LinkRecord {
    pub a: InterfaceIndex,
    pub b: InterfaceIndex,
    pub unidirectional: bool,
}

/// The pure, in-memory half of a network (SPEC_FULL.md 4.D): attached
/// interfaces, the pairwise adjacency map, and policy. No kernel calls live
/// here; those belong to the bridge-network wrapper that owns a `NetClient`.
#[derive(Debug)]
pub struct NetworkBase {
    pub id: NetworkId,
    pub bridge_name: String,
    pub up: bool,
    pub policy: Policy,
    pub has_filter_chain: bool,
    interfaces: BTreeMap<InterfaceIndex, Interface>,
    next_index: u32,
    adjacency: BTreeMap<(InterfaceIndex, InterfaceIndex), bool>,
}

impl NetworkBase {
    pub fn new(id: NetworkId, bridge_name: impl Into<String>, policy: Policy) -> Self {
        Self {
            id,
            bridge_name: bridge_name.into(),
            up: false,
            policy,
            has_filter_chain: false,
            interfaces: BTreeMap::new(),
            next_index: 0,
            adjacency: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    pub fn attach(&mut self, mut iface: Interface) -> Result<InterfaceIndex> {
        if iface.network.is_some() {
            return Err(FabricError::inconsistent(format!(
                "interface {} is already attached to a network",
                iface.name
            )));
        }
        let idx = InterfaceIndex(self.next_index);
        self.next_index += 1;
        iface.network = Some(self.id);
        iface.network_index = Some(idx);
        self.interfaces.insert(idx, iface);
        Ok(idx)
    }

    /// Attach at a caller-chosen index (used by `linknet` to seed the
    /// remote half of a veth pair at the peer's next free index, and by
    /// control networks, which index from a host/server base).
    pub fn attach_at(&mut self, idx: InterfaceIndex, mut iface: Interface) -> Result<()> {
        if self.interfaces.contains_key(&idx) {
            return Err(FabricError::inconsistent(format!(
                "index {idx} already occupied on network {}",
                self.id
            )));
        }
        iface.network = Some(self.id);
        iface.network_index = Some(idx);
        self.interfaces.insert(idx, iface);
        if idx.0 >= self.next_index {
            self.next_index = idx.0 + 1;
        }
        Ok(())
    }

    pub fn next_free_index(&self) -> InterfaceIndex {
        InterfaceIndex(self.next_index)
    }

    pub fn detach(&mut self, idx: InterfaceIndex) -> Result<Interface> {
        let iface = self
            .interfaces
            .remove(&idx)
            .ok_or_else(|| FabricError::InterfaceNotFound(idx.to_string()))?;
        self.adjacency.retain(|&(a, b), _| a != idx && b != idx);
        Ok(iface)
    }

    pub fn get(&self, idx: InterfaceIndex) -> Option<&Interface> {
        self.interfaces.get(&idx)
    }

    pub fn get_mut(&mut self, idx: InterfaceIndex) -> Option<&mut Interface> {
        self.interfaces.get_mut(&idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InterfaceIndex, &Interface)> {
        self.interfaces.iter()
    }

    fn require_attached(&self, idx: InterfaceIndex) -> Result<()> {
        if self.interfaces.contains_key(&idx) {
            Ok(())
        } else {
            Err(FabricError::inconsistent(format!(
                "interface index {idx} is not attached to network {}",
                self.id
            )))
        }
    }

    /// Returns the adjacency state for `(a, b)`, populating it with the
    /// policy default on first access.
    pub fn linked(&mut self, a: InterfaceIndex, b: InterfaceIndex) -> Result<bool> {
        self.require_attached(a)?;
        self.require_attached(b)?;
        let key = adjacency_key(a, b);
        let default = self.policy.default_linked();
        Ok(*self.adjacency.entry(key).or_insert(default))
    }

    /// Sets adjacency to `value`. Returns `true` iff the entry changed —
    /// callers that drive the filter-commit queue use this to decide
    /// whether to mark the network dirty.
    fn set_linked(&mut self, a: InterfaceIndex, b: InterfaceIndex, value: bool) -> Result<bool> {
        self.require_attached(a)?;
        self.require_attached(b)?;
        let key = adjacency_key(a, b);
        let default = self.policy.default_linked();
        let prev = *self.adjacency.get(&key).unwrap_or(&default);
        self.adjacency.insert(key, value);
        Ok(prev != value)
    }

    pub fn link(&mut self, a: InterfaceIndex, b: InterfaceIndex) -> Result<bool> {
        self.set_linked(a, b, true)
    }

    pub fn unlink(&mut self, a: InterfaceIndex, b: InterfaceIndex) -> Result<bool> {
        self.set_linked(a, b, false)
    }

    /// All (pair, linked) entries explicitly recorded in the adjacency map.
    /// Used by the filter-chain builder; does not include pairs that have
    /// never been queried (those implicitly follow the policy default).
    pub fn adjacency_entries(&self) -> impl Iterator<Item = (InterfaceIndex, InterfaceIndex, bool)> + '_ {
        self.adjacency.iter().map(|(&(a, b), &linked)| (a, b, linked))
    }

    /// Base link-data: one record per pair recorded as linked. Variants
    /// (point-to-point, WLAN) wrap this with their own rules.
    pub fn all_link_data(&self) -> Vec<LinkRecord> {
        self.adjacency
            .iter()
            .filter(|&(_, &linked)| linked)
            .map(|(&(a, b), _)| LinkRecord {
                a,
                b,
                unidirectional: false,
            })
            .collect()
    }
}
