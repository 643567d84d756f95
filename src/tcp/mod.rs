pub mod config;
pub mod messages;
pub mod receiver;
pub mod retransmitter;
pub mod sender;
pub mod wrap32;

// -- Re-export structs for more concise usage

pub use config::TcpConfig;
pub use messages::{TcpFlags, TcpReceiverMessage, TcpSenderMessage};
pub use receiver::TcpReceiver;
pub use retransmitter::Retransmitter;
pub use sender::TcpSender;
pub use wrap32::Wrap32;
