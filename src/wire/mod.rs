pub mod arp;
pub mod checksum;
pub mod errors;
pub mod ethernet;
pub mod ip_flags;
pub mod ipv4;

// -- Re-export structs for more concise usage

pub use arp::{ArpMessage, ArpOpcode};
pub use errors::WireError;
pub use ethernet::{EtherType, EthernetAddress, EthernetFrame, EthernetHeader};
pub use ip_flags::IpFlags;
pub use ipv4::{Ipv4Datagram, Ipv4Header};
