//! DHCP client implementation
//!
//! This module contains the handshake orchestration:
//! - Discover/Request packet construction
//! - State tracking across the Discover-Offer-Request-Ack exchange
//! - Lease renewal and lease extraction

use crate::{
    config::ClientConfig,
    dispatch::{ClientPacket, Dispatcher},
    error::{ClientError, DhcpError},
    link::Link,
    network::PacketConn,
    retry::RetryPolicy,
    v4::{self, opts, MessageType, OptionCode, Packet},
};
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tokio::{
    net::UdpSocket,
    sync::{mpsc, oneshot},
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    Selecting,
    Requesting,
    Bound,
    Renewing,
}

/// Lease parameters granted by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub offered_ip: Ipv4Addr,
    pub subnet_mask: Option<Ipv4Addr>,
    pub routers: Option<Vec<Ipv4Addr>>,
    pub dns_servers: Option<Vec<Ipv4Addr>>,
    pub lease_duration: Option<Duration>,
    pub server_identifier: Option<Ipv4Addr>,
}

impl Lease {
    /// Extracts the lease parameters carried by an Ack.
    pub fn from_packet(ack: &Packet) -> Self {
        let options = &ack.options;
        Self {
            offered_ip: ack.yiaddr,
            subnet_mask: opts::get_ip(options, OptionCode::SUBNET_MASK).ok(),
            routers: opts::get_ips(options, OptionCode::ROUTER).ok(),
            dns_servers: opts::get_ips(options, OptionCode::DOMAIN_NAME_SERVER).ok(),
            lease_duration: opts::get_u32(options, OptionCode::IP_ADDRESS_LEASE_TIME)
                .ok()
                .map(|secs| Duration::from_secs(secs.into())),
            server_identifier: opts::get_server_identifier(options).ok(),
        }
    }
}

/// A DHCPv4 client for one link.
///
/// It only supports the Discover-Offer-Request-Ack handshake and the
/// Request-Ack renewal.
pub struct DhcpClient<C = UdpSocket> {
    config: ClientConfig,
    dispatcher: Dispatcher<C>,
    state: State,
}

impl DhcpClient<UdpSocket> {
    /// Binds a UDP socket to the configured link on the client port.
    pub async fn new(config: ClientConfig) -> Result<Self, DhcpError> {
        let socket = crate::network::new_tokio_socket_bound_to_device(
            config.link.name(),
            config.client_port,
        )?;
        Ok(Self::with_conn(config, socket))
    }
}

impl<C: PacketConn> DhcpClient<C> {
    /// Creates a client on an already constructed connection.
    pub fn with_conn(config: ClientConfig, conn: C) -> Self {
        let retry = RetryPolicy::new(config.retry, config.timeout);
        let dispatcher = Dispatcher::new(Arc::new(conn), config.link.clone(), retry);
        Self {
            config,
            dispatcher,
            state: State::Init,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn link(&self) -> &Link {
        &self.config.link
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Completes the 4-way Discover-Offer-Request-Ack handshake.
    ///
    /// Returns the server's reply to the Request, which is an Ack or a Nak.
    pub async fn request(&mut self) -> Result<Packet, ClientError> {
        self.state = State::Selecting;
        let offer = match self.send_and_read_one(self.discover_packet()).await {
            Ok(offer) => offer,
            Err(e) => {
                self.state = State::Init;
                return Err(e);
            }
        };
        tracing::info!(
            "Received offer of {} from {}",
            offer.yiaddr,
            offer.siaddr
        );

        self.state = State::Requesting;
        let request = self.request_packet(&offer);
        self.finish(request).await
    }

    /// Sends a renewal request for `ack` and waits for the server's reply.
    pub async fn renew(&mut self, ack: &Packet) -> Result<Packet, ClientError> {
        self.state = State::Renewing;
        let request = self.request_packet(ack);
        self.finish(request).await
    }

    async fn finish(&mut self, request: Packet) -> Result<Packet, ClientError> {
        let reply = match self.send_and_read_first(request, is_ack_or_nak).await {
            Ok(reply) => reply,
            Err(e) => {
                self.state = State::Init;
                return Err(e);
            }
        };

        if let Ok(MessageType::Ack) = opts::get_message_type(&reply.options) {
            tracing::info!("Bound to {} on {}", reply.yiaddr, self.link().name());
            self.state = State::Bound;
        } else {
            tracing::warn!("Received DHCP NAK, lease must be restarted");
            self.state = State::Init;
        }
        Ok(reply)
    }

    /// Sends one packet and returns the first response returned by any server.
    pub async fn send_and_read_one(&self, packet: Packet) -> Result<Packet, ClientError> {
        self.send_and_read_first(packet, |_| true).await
    }

    /// Returns the first response for which `accept` holds, skipping the rest.
    async fn send_and_read_first(
        &self,
        packet: Packet,
        accept: impl Fn(&Packet) -> bool,
    ) -> Result<Packet, ClientError> {
        let token = CancellationToken::new();
        let _guard = token.clone().drop_guard();

        let (mut responses, errors) =
            self.send_and_read(token.clone(), self.config.server_addr(), packet);

        let mut response = None;
        while let Some(ClientPacket { packet, .. }) = responses.recv().await {
            if accept(&packet) {
                response = Some(packet);
                break;
            }
            tracing::debug!(
                "Ignoring {:?} reply from {}",
                opts::get_message_type(&packet.options).ok(),
                packet.siaddr
            );
        }
        if response.is_some() {
            // We only want the first one; stop the reader now.
            token.cancel();
        }

        let error = errors.await.ok();
        match (response, error) {
            (Some(packet), _) => Ok(packet),
            (None, Some(e)) => Err(e),
            (None, None) => Err(ClientError::new(self.link().clone(), DhcpError::NoResponse)),
        }
    }

    /// Broadcasts a DHCP packet and spawns a task reading response packets.
    ///
    /// See [`Dispatcher::send_and_read`]. Callers must cancel `token` when
    /// they have the packet they are looking for, and must not send another
    /// packet before the task has finished.
    pub fn send_and_read(
        &self,
        token: CancellationToken,
        dest: SocketAddr,
        packet: Packet,
    ) -> (mpsc::Receiver<ClientPacket>, oneshot::Receiver<ClientError>) {
        self.dispatcher.send_and_read(token, dest, packet)
    }

    /// A Discover packet for this client with a fresh transaction ID.
    pub fn discover_packet(&self) -> Packet {
        v4::build_dhcp_discover(self.link().hardware_addr(), rand::random())
    }

    /// A Request packet for the given offer or ack.
    pub fn request_packet(&self, offer: &Packet) -> Packet {
        v4::build_dhcp_request(self.link().hardware_addr(), offer)
    }
}

fn is_ack_or_nak(reply: &Packet) -> bool {
    matches!(
        opts::get_message_type(&reply.options),
        Ok(MessageType::Ack | MessageType::Nak)
    )
}
