//! Concurrent send-and-read of a single DHCP message.
//!
//! A dispatch spawns one task that writes the encoded packet, then reads
//! datagrams until the attempt deadline, forwarding every decodable reply
//! whose transaction ID matches. The [`RetryPolicy`] repeats the whole
//! write/read attempt when nothing matched in time.

use crate::{
    error::{ClientError, DhcpError},
    link::Link,
    network::PacketConn,
    retry::RetryPolicy,
    v4::{Packet, MAX_MESSAGE_SIZE},
};
use std::{io, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        oneshot,
    },
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

/// Capacity of the match stream, so a burst of replies does not stall reading.
pub const RESPONSE_QUEUE_DEPTH: usize = 10;

/// Granularity at which a pending read re-checks cancellation and the deadline.
pub const READ_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A DHCP packet and the link it was received on.
#[derive(Debug, Clone)]
pub struct ClientPacket {
    pub link: Link,
    pub packet: Packet,
}

/// Sends packets on a connection and collects the matching replies.
pub struct Dispatcher<C> {
    conn: Arc<C>,
    link: Link,
    retry: RetryPolicy,
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            link: self.link.clone(),
            retry: self.retry,
        }
    }
}

impl<C: PacketConn> Dispatcher<C> {
    pub fn new(conn: Arc<C>, link: Link, retry: RetryPolicy) -> Self {
        Self { conn, link, retry }
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Sends `packet` to `dest` and spawns a task reading the responses.
    ///
    /// Replies carrying the packet's transaction ID arrive on the returned
    /// stream, which is closed when the task ends. At most one error is sent
    /// on the second channel; it is closed without a value on success.
    ///
    /// Cancel `token` once the wanted reply has arrived, otherwise the task
    /// keeps reading until its retries time out. The connection must not be
    /// used by a second dispatch until this one has finished, or its replies
    /// may be read by the wrong task.
    pub fn send_and_read(
        &self,
        token: CancellationToken,
        dest: SocketAddr,
        packet: Packet,
    ) -> (mpsc::Receiver<ClientPacket>, oneshot::Receiver<ClientError>) {
        let (out, responses) = mpsc::channel(RESPONSE_QUEUE_DEPTH);
        let (err_tx, err_rx) = oneshot::channel();
        tokio::spawn(self.clone().dispatch(token, dest, packet, out, err_tx));
        (responses, err_rx)
    }

    async fn dispatch(
        self,
        token: CancellationToken,
        dest: SocketAddr,
        packet: Packet,
        out: mpsc::Sender<ClientPacket>,
        err_tx: oneshot::Sender<ClientError>,
    ) {
        let result = self.run(&token, dest, &packet, &out).await;
        drop(out);

        if let Err(e) = result {
            tracing::debug!("Dispatch on {} failed: {}", self.link.name(), e);
            let _ = err_tx.send(ClientError::new(self.link.clone(), e));
        }
    }

    async fn run(
        &self,
        token: &CancellationToken,
        dest: SocketAddr,
        packet: &Packet,
        out: &mpsc::Sender<ClientPacket>,
    ) -> Result<(), DhcpError> {
        let encoded = packet.marshal_binary()?;
        let wire: &[u8] = &encoded;
        let xid = packet.transaction_id;

        self.retry
            .run(move || self.attempt(token, dest, wire, xid, out))
            .await
    }

    /// One write followed by a read loop bounded by the attempt timeout.
    async fn attempt(
        &self,
        token: &CancellationToken,
        dest: SocketAddr,
        wire: &[u8],
        xid: u32,
        out: &mpsc::Sender<ClientPacket>,
    ) -> Result<(), DhcpError> {
        self.conn
            .send_to(wire, dest)
            .await
            .map_err(DhcpError::Write)?;
        tracing::debug!(
            "Sent {} bytes to {} (xid {:#010x})",
            wire.len(),
            dest,
            xid
        );

        let deadline = Instant::now() + self.retry.timeout();
        let mut matched = 0usize;
        let mut buf = vec![0u8; MAX_MESSAGE_SIZE as usize];

        loop {
            let read = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    return if matched > 0 { Ok(()) } else { Err(DhcpError::Canceled) };
                }
                _ = time::sleep_until(deadline) => {
                    return if matched > 0 { Ok(()) } else { Err(DhcpError::DeadlineExceeded) };
                }
                read = time::timeout(READ_POLL_INTERVAL, self.conn.recv_from(&mut buf)) => read,
            };

            let (n, from) = match read {
                Err(_elapsed) => continue,
                Ok(Err(e)) if is_timeout(&e) => continue,
                Ok(Err(e)) => return Err(DhcpError::Read(e)),
                Ok(Ok(received)) => received,
            };

            let packet = match Packet::unmarshal_binary(&buf[..n]) {
                Ok(packet) => packet,
                Err(e) => {
                    tracing::debug!("Dropping {} bytes from {}: {}", n, from, e);
                    continue;
                }
            };

            if packet.transaction_id != xid {
                tracing::debug!(
                    "XID mismatch from {}: got {:#010x}, want {:#010x}",
                    from,
                    packet.transaction_id,
                    xid
                );
                continue;
            }

            matched += 1;
            tracing::debug!("Matched response #{} from {}", matched, from);

            let response = ClientPacket {
                link: self.link.clone(),
                packet,
            };

            // Never let a slow consumer stall the read loop when there is room.
            let response = match out.try_send(response) {
                Ok(()) => continue,
                Err(TrySendError::Closed(_)) => return Ok(()),
                Err(TrySendError::Full(response)) => response,
            };

            // Only the caller's token bounds delivery; the attempt timeout
            // applies to reading.
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(DhcpError::Canceled),
                sent = out.send(response) => {
                    if sent.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}
