//! DHCPv4 protocol implementation
//!
//! This module contains the DHCPv4-specific implementation including:
//! - The options TLV codec
//! - Typed option values
//! - Packet layout and message construction

pub mod message;
pub mod options;
pub mod opts;
pub mod packet;

pub use message::{build_dhcp_discover, build_dhcp_request, MAX_MESSAGE_SIZE};
pub use options::{OptionCode, Options};
pub use opts::{MessageType, OptionValue};
pub use packet::{OpCode, Packet};
