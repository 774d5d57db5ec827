#![allow(dead_code)]

use bytes::Bytes;
use dhcp4client::{
    v4::{opts, OpCode},
    ClientConfig, Link, MessageType, OptionCode, Packet, PacketConn,
};
use std::{
    future::Future,
    io,
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};
use tokio::sync::{mpsc, Mutex};

pub const MAC: [u8; 6] = [0x00, 0x0c, 0x29, 0xa8, 0x92, 0xf4];
pub const SERVER_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
pub const OFFERED_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);

pub fn link() -> Link {
    Link::new("test0", Bytes::from_static(&MAC))
}

pub fn config(timeout: Duration, retry: i32) -> ClientConfig {
    ClientConfig::new(link())
        .with_timeout(timeout)
        .with_retry(retry)
}

/// In-memory datagram connection. Whatever the client sends shows up on
/// [`Peer::sent`]; whatever is pushed on [`Peer::inbound`] is read back.
pub struct MemoryConn {
    inbound: Mutex<mpsc::UnboundedReceiver<io::Result<Vec<u8>>>>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    write_error: Option<io::ErrorKind>,
}

pub struct Peer {
    pub inbound: mpsc::UnboundedSender<io::Result<Vec<u8>>>,
    pub sent: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Peer {
    pub fn push(&self, packet: &Packet) {
        let wire = packet.marshal_binary().unwrap().to_vec();
        self.inbound.send(Ok(wire)).unwrap();
    }

    pub fn push_raw(&self, data: &[u8]) {
        self.inbound.send(Ok(data.to_vec())).unwrap();
    }

    pub fn push_error(&self, kind: io::ErrorKind) {
        self.inbound.send(Err(io::Error::from(kind))).unwrap();
    }

    /// Number of datagrams the client has written so far.
    pub fn sent_count(&mut self) -> usize {
        let mut n = 0;
        while self.sent.try_recv().is_ok() {
            n += 1;
        }
        n
    }
}

pub fn pair() -> (MemoryConn, Peer) {
    pair_with(None)
}

pub fn pair_with(write_error: Option<io::ErrorKind>) -> (MemoryConn, Peer) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let conn = MemoryConn {
        inbound: Mutex::new(inbound_rx),
        outbound: outbound_tx,
        write_error,
    };
    let peer = Peer {
        inbound: inbound_tx,
        sent: outbound_rx,
    };
    (conn, peer)
}

impl PacketConn for MemoryConn {
    fn send_to(
        &self,
        buf: &[u8],
        _target: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send {
        let result = match self.write_error {
            Some(kind) => Err(io::Error::from(kind)),
            None => self
                .outbound
                .send(buf.to_vec())
                .map(|()| buf.len())
                .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe)),
        };
        std::future::ready(result)
    }

    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send {
        async move {
            let mut inbound = self.inbound.lock().await;
            match inbound.recv().await {
                Some(Ok(data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    Ok((n, SocketAddr::from((SERVER_IP, 67))))
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::from(io::ErrorKind::ConnectionAborted)),
            }
        }
    }
}

/// A server reply to `request`.
pub fn reply(request: &Packet, message_type: MessageType) -> Packet {
    let mut reply = Packet::new(OpCode::BootReply);
    reply.transaction_id = request.transaction_id;
    reply.chaddr = request.chaddr.clone();
    reply.yiaddr = OFFERED_IP;
    reply.siaddr = SERVER_IP;
    reply
        .options
        .add(OptionCode::DHCP_MESSAGE_TYPE, &message_type);
    reply
        .options
        .add(OptionCode::SERVER_IDENTIFIER, &SERVER_IP);
    reply
        .options
        .add(OptionCode::SUBNET_MASK, &Ipv4Addr::new(255, 255, 255, 0));
    reply.options.add(OptionCode::ROUTER, &[SERVER_IP][..]);
    reply
        .options
        .add(OptionCode::IP_ADDRESS_LEASE_TIME, &3600u32);
    reply
}

/// Answers Discover with an Offer and Request with `answer`. A reply with a
/// foreign transaction ID and a garbage datagram precede every real reply.
/// Every client packet is forwarded on the returned channel.
pub fn spawn_responder(
    mut peer: Peer,
    answer: MessageType,
) -> mpsc::UnboundedReceiver<Packet> {
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(wire) = peer.sent.recv().await {
            let request = Packet::unmarshal_binary(&wire).unwrap();
            let message_type = match opts::get_message_type(&request.options).unwrap() {
                MessageType::Discover => MessageType::Offer,
                MessageType::Request => answer,
                other => panic!("unexpected client message {other}"),
            };

            let mut foreign = reply(&request, message_type);
            foreign.transaction_id = request.transaction_id.wrapping_add(1);
            foreign.yiaddr = Ipv4Addr::new(10, 9, 9, 9);
            peer.push(&foreign);
            peer.push_raw(&[0xde, 0xad]);
            peer.push(&reply(&request, message_type));

            if seen_tx.send(request).is_err() {
                break;
            }
        }
    });
    seen_rx
}
