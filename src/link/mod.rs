pub mod arp_table;
pub mod interface;

// -- Re-export structs for more concise usage

pub use arp_table::ArpTable;
pub use interface::{NetworkInterface, OutputPort};
