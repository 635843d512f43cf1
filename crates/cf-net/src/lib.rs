pub mod bridge;
pub mod linux_bridge;
pub mod netclient;
pub mod ovs;

pub use bridge::{BridgeNetwork, LinkUpdate};
pub use netclient::NetClient;
