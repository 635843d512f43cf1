pub mod config;
pub mod error;
pub mod ids;
pub mod interface;
pub mod naming;
pub mod network;
pub mod policy;

pub use config::{Backend, FabricConfig};
pub use error::{FabricError, Result};
pub use ids::{InterfaceIndex, NetworkId};
pub use interface::{Interface, LinkParams, ParamKind, ParamValue};
pub use ipnet::IpNet;
pub use network::{LinkRecord, NetworkBase};
pub use policy::Policy;
