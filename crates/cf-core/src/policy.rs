/// Default disposition for a pair of interfaces with no explicit adjacency
/// entry (SPEC_FULL.md §3, §4.D `linked`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Accept,
    Drop,
}

impl Policy {
    /// The adjacency default: under ACCEPT everything is linked unless
    /// explicitly unlinked; under DROP nothing is linked unless explicitly
    /// linked.
    pub fn default_linked(self) -> bool {
        matches!(self, Policy::Accept)
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::Accept => write!(f, "accept"),
            Policy::Drop => write!(f, "drop"),
        }
    }
}
