use super::{
    opts::{self, MessageType},
    OpCode, OptionCode, Packet,
};
use bytes::Bytes;

/// Largest DHCP message we advertise and read.
pub const MAX_MESSAGE_SIZE: u16 = 1500;

/// Constructs a DHCP Discover message.
pub fn build_dhcp_discover(mac_addr: &Bytes, xid: u32) -> Packet {
    let mut packet = Packet::new(OpCode::BootRequest);
    packet.transaction_id = xid;
    packet.chaddr = mac_addr.clone();
    packet.broadcast = true;

    // DHCP Message Type (53) - DHCPDISCOVER (1)
    packet
        .options
        .add(OptionCode::DHCP_MESSAGE_TYPE, &MessageType::Discover);
    packet
        .options
        .add(OptionCode::MAXIMUM_DHCP_MESSAGE_SIZE, &MAX_MESSAGE_SIZE);
    packet
}

/// Constructs a DHCP Request message answering `offer`.
///
/// `offer` is either the Offer selected during the handshake or the Ack of
/// the lease being renewed. Its transaction ID and addresses are carried over.
pub fn build_dhcp_request(mac_addr: &Bytes, offer: &Packet) -> Packet {
    let mut packet = Packet::new(OpCode::BootRequest);
    packet.chaddr = mac_addr.clone();
    packet.transaction_id = offer.transaction_id;
    packet.ciaddr = offer.ciaddr;
    packet.siaddr = offer.siaddr;
    packet.broadcast = true;

    // DHCP Message Type - REQUEST (3)
    packet
        .options
        .add(OptionCode::DHCP_MESSAGE_TYPE, &MessageType::Request);
    packet
        .options
        .add(OptionCode::MAXIMUM_DHCP_MESSAGE_SIZE, &MAX_MESSAGE_SIZE);

    // Requested IP Address (Option 50)
    packet
        .options
        .add(OptionCode::REQUESTED_IP_ADDRESS, &offer.yiaddr);

    // Server Identifier (Option 54), only echoed when the server sent one.
    if let Ok(server_id) = opts::get_server_identifier(&offer.options) {
        packet
            .options
            .add(OptionCode::SERVER_IDENTIFIER, &server_id);
    }
    packet
}
