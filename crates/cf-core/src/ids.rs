/// Identifies a network within a session, stable for its lifetime. A
/// `NetworkId` the filter-commit queue no longer has registered is treated
/// as stale and dropped (SPEC_FULL.md's `is_alive`, resolving the §9 Open
/// Question) — see `cf_filter::FilterCommitQueue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkId(pub u32);

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A per-network, insertion-ordered interface index (SPEC_FULL.md §3:
/// "a mapping from per-network interface index -> Interface").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceIndex(pub u32);

impl std::fmt::Display for InterfaceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
