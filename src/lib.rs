//! # dhcp4client - A small DHCPv4 client
//!
//! A DHCPv4 client library for network-boot and provisioning tools. It
//! implements the DHCP options wire format (including RFC 3396 option
//! concatenation) and drives the Discover-Offer-Request-Ack handshake and
//! lease renewal over UDP.
//!
//! ## Features
//!
//! - Deterministic options codec with long-option splitting
//! - Concurrent send/read with transaction ID matching
//! - Per-attempt timeouts, retransmission and cancellation
//! - Injectable transport for embedding and testing
//!
//! ## Example
//!
//! ```rust,no_run
//! use dhcp4client::{ClientConfig, DhcpClient, Lease, Link};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let link = Link::from_sysfs("eth0")?;
//!     let mut client = DhcpClient::new(ClientConfig::new(link)).await?;
//!     let ack = client.request().await?;
//!     println!("Obtained lease: {:?}", Lease::from_packet(&ack));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod link;
pub mod network;
pub mod retry;
pub mod v4;

pub use client::{DhcpClient, Lease, State};
pub use config::{Args, ClientConfig, CLIENT_PORT, SERVER_PORT};
pub use dispatch::{ClientPacket, Dispatcher};
pub use error::{ClientError, DhcpError};
pub use link::Link;
pub use network::PacketConn;
pub use retry::RetryPolicy;
pub use v4::{MessageType, OptionCode, Options, Packet};
