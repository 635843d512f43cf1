pub mod ctrlnet;
pub mod gretap;
pub mod hub;
pub mod ptp;
pub mod switch;
pub mod tunnel;
pub mod wlan;

pub use ctrlnet::CtrlNet;
pub use gretap::GreTap;
pub use hub::Hub;
pub use ptp::Ptp;
pub use switch::Switch;
pub use tunnel::Tunnel;
pub use wlan::{ModelHandle, MobilityModel, Wlan, WirelessModel};
