use crate::link::Link;
use clap::Parser;
use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    time::Duration,
};

/// Port DHCP clients listen on.
pub const CLIENT_PORT: u16 = 68;
/// Port DHCP servers and relay agents listen on.
pub const SERVER_PORT: u16 = 67;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The network interface to bind to (e.g., 'eth0', 'lo')
    #[arg(short, long)]
    pub interface: String,

    /// Seconds to wait for a response before retransmitting
    #[arg(short, long, default_value_t = 10)]
    pub timeout: u64,

    /// Number of retransmissions per handshake step; negative retries forever
    #[arg(short, long, default_value_t = 3, allow_negative_numbers = true)]
    pub retry: i32,

    /// Renew the lease once right after it was obtained
    #[arg(long)]
    pub renew: bool,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub link: Link,
    pub client_port: u16,
    pub server_port: u16,
    pub broadcast_address: Ipv4Addr,
    /// How long each attempt waits for a response.
    pub timeout: Duration,
    /// Retransmissions after the first attempt; negative means unbounded.
    pub retry: i32,
}

impl ClientConfig {
    pub fn new(link: Link) -> Self {
        Self {
            link,
            client_port: CLIENT_PORT,
            server_port: SERVER_PORT,
            broadcast_address: Ipv4Addr::BROADCAST,
            timeout: Duration::from_secs(10),
            retry: 3,
        }
    }

    pub fn from_args(args: &Args, link: Link) -> Self {
        Self::new(link)
            .with_timeout(Duration::from_secs(args.timeout))
            .with_retry(args.retry)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: i32) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_client_port(mut self, port: u16) -> Self {
        self.client_port = port;
        self
    }

    pub fn with_server_port(mut self, port: u16) -> Self {
        self.server_port = port;
        self
    }

    /// All link-local DHCP servers and relay agents.
    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.broadcast_address, self.server_port))
    }
}
