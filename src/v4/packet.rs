//! BOOTP/DHCP message layout (RFC 2131 §2).
//!
//! ```text
//! op (1) | htype (1) | hlen (1) | hops (1)
//! xid (4)
//! secs (2) | flags (2)
//! ciaddr (4) | yiaddr (4) | siaddr (4) | giaddr (4)
//! chaddr (16) | sname (64) | file (128)
//! magic cookie (4) | options (variable)
//! ```

use super::options::{OptionCode, Options};
use crate::error::DhcpError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::net::Ipv4Addr;

const MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];
const CHADDR_LEN: usize = 16;
const SNAME_LEN: usize = 64;
const FILE_LEN: usize = 128;
const HEADER_LEN: usize = 236;
const MIN_PACKET_LEN: usize = HEADER_LEN + MAGIC_COOKIE.len();
/// BOOTP relay agents expect at least 300 bytes.
const MIN_WIRE_LEN: usize = 300;
const BROADCAST_FLAG: u16 = 0x8000;
const HTYPE_ETHERNET: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    BootRequest = 1,
    BootReply = 2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub op: OpCode,
    pub htype: u8,
    pub hops: u8,
    pub transaction_id: u32,
    pub secs: u16,
    pub broadcast: bool,
    pub ciaddr: Ipv4Addr,
    pub yiaddr: Ipv4Addr,
    pub siaddr: Ipv4Addr,
    pub giaddr: Ipv4Addr,
    pub chaddr: Bytes,
    pub sname: Bytes,
    pub file: Bytes,
    pub options: Options,
}

impl Packet {
    pub fn new(op: OpCode) -> Self {
        Self {
            op,
            htype: HTYPE_ETHERNET,
            hops: 0,
            transaction_id: 0,
            secs: 0,
            broadcast: false,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr: Bytes::new(),
            sname: Bytes::new(),
            file: Bytes::new(),
            options: Options::new(),
        }
    }

    pub fn marshal_binary(&self) -> Result<Bytes, DhcpError> {
        check_len("chaddr", &self.chaddr, CHADDR_LEN)?;
        check_len("sname", &self.sname, SNAME_LEN)?;
        check_len("file", &self.file, FILE_LEN)?;

        let mut buf = BytesMut::with_capacity(MIN_PACKET_LEN + self.options.encoded_len() + 1);
        buf.put_u8(self.op as u8);
        buf.put_u8(self.htype);
        buf.put_u8(self.chaddr.len() as u8);
        buf.put_u8(self.hops);
        buf.put_u32(self.transaction_id);
        buf.put_u16(self.secs);
        buf.put_u16(if self.broadcast { BROADCAST_FLAG } else { 0 });
        for addr in [self.ciaddr, self.yiaddr, self.siaddr, self.giaddr] {
            buf.put_slice(&addr.octets());
        }
        put_padded(&mut buf, &self.chaddr, CHADDR_LEN);
        put_padded(&mut buf, &self.sname, SNAME_LEN);
        put_padded(&mut buf, &self.file, FILE_LEN);
        buf.put_slice(&MAGIC_COOKIE);

        self.options.encode(&mut buf);
        if !self.options.contains(OptionCode::END) {
            buf.put_u8(OptionCode::END.0);
        }
        if buf.len() < MIN_WIRE_LEN {
            buf.resize(MIN_WIRE_LEN, 0);
        }
        Ok(buf.freeze())
    }

    pub fn unmarshal_binary(data: &[u8]) -> Result<Self, DhcpError> {
        if data.len() < MIN_PACKET_LEN {
            return Err(DhcpError::InvalidPacket(format!(
                "packet too short: {} bytes (minimum {})",
                data.len(),
                MIN_PACKET_LEN
            )));
        }

        let mut buf = data;
        let op = match buf.get_u8() {
            1 => OpCode::BootRequest,
            2 => OpCode::BootReply,
            other => {
                return Err(DhcpError::InvalidPacket(format!("unknown op code {other}")));
            }
        };
        let htype = buf.get_u8();
        let hlen = buf.get_u8() as usize;
        if hlen > CHADDR_LEN {
            return Err(DhcpError::InvalidPacket(format!(
                "hardware address length {hlen} exceeds {CHADDR_LEN}"
            )));
        }
        let hops = buf.get_u8();
        let transaction_id = buf.get_u32();
        let secs = buf.get_u16();
        let broadcast = buf.get_u16() & BROADCAST_FLAG != 0;
        let ciaddr = Ipv4Addr::from(buf.get_u32());
        let yiaddr = Ipv4Addr::from(buf.get_u32());
        let siaddr = Ipv4Addr::from(buf.get_u32());
        let giaddr = Ipv4Addr::from(buf.get_u32());
        let chaddr = Bytes::copy_from_slice(&buf[..hlen]);
        buf.advance(CHADDR_LEN);
        let sname = null_terminated(&buf[..SNAME_LEN]);
        buf.advance(SNAME_LEN);
        let file = null_terminated(&buf[..FILE_LEN]);
        buf.advance(FILE_LEN);

        if buf[..MAGIC_COOKIE.len()] != MAGIC_COOKIE {
            return Err(DhcpError::InvalidPacket("invalid magic cookie".to_string()));
        }
        buf.advance(MAGIC_COOKIE.len());

        let options = Options::decode(options_area(buf))?;

        Ok(Self {
            op,
            htype,
            hops,
            transaction_id,
            secs,
            broadcast,
            ciaddr,
            yiaddr,
            siaddr,
            giaddr,
            chaddr,
            sname,
            file,
            options,
        })
    }
}

fn check_len(field: &str, value: &[u8], max: usize) -> Result<(), DhcpError> {
    if value.len() > max {
        return Err(DhcpError::Encoding(format!(
            "{field} is {} bytes, at most {max} allowed",
            value.len()
        )));
    }
    Ok(())
}

fn put_padded(buf: &mut BytesMut, value: &[u8], len: usize) {
    buf.put_slice(value);
    buf.put_bytes(0, len - value.len());
}

fn null_terminated(field: &[u8]) -> Bytes {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    Bytes::copy_from_slice(&field[..end])
}

/// Cuts the options region at the End option, dropping the End marker and
/// any Pad bytes after the last record.
///
/// Without an End option, trailing Pad bytes are still dropped when the
/// records are well formed; otherwise the whole region is returned so that
/// the codec can report the malformed data.
fn options_area(buf: &[u8]) -> &[u8] {
    let mut i = 0;
    let mut last = 0;
    while i < buf.len() {
        match OptionCode(buf[i]) {
            OptionCode::PAD => i += 1,
            OptionCode::END => return &buf[..last],
            _ => {
                let Some(&length) = buf.get(i + 1) else {
                    break;
                };
                i += 2 + length as usize;
                last = i.min(buf.len());
            }
        }
    }
    if i == buf.len() {
        &buf[..last]
    } else {
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Packet {
        let mut packet = Packet::new(OpCode::BootReply);
        packet.transaction_id = 0xdead_beef;
        packet.broadcast = true;
        packet.yiaddr = Ipv4Addr::new(10, 0, 0, 5);
        packet.siaddr = Ipv4Addr::new(10, 0, 0, 1);
        packet.chaddr = Bytes::from_static(&[0x00, 0x0c, 0x29, 0xa8, 0x92, 0xf4]);
        packet.sname = Bytes::from_static(b"server");
        packet.options.add_raw(OptionCode::DHCP_MESSAGE_TYPE, &[2]);
        packet.options.add_raw(OptionCode::SERVER_IDENTIFIER, &[10, 0, 0, 1]);
        packet
    }

    #[test]
    fn test_round_trip() {
        let packet = sample();
        let wire = packet.marshal_binary().unwrap();
        assert_eq!(wire.len(), MIN_WIRE_LEN);
        assert_eq!(&wire[4..8], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&wire[10..12], &[0x80, 0x00]);

        assert_eq!(Packet::unmarshal_binary(&wire).unwrap(), packet);
    }

    #[test]
    fn test_end_and_padding_are_not_options() {
        let wire = sample().marshal_binary().unwrap();
        let decoded = Packet::unmarshal_binary(&wire).unwrap();
        assert!(!decoded.options.contains(OptionCode::END));
        assert!(!decoded.options.contains(OptionCode::PAD));
    }

    #[test]
    fn test_rejects_short_packet() {
        let err = Packet::unmarshal_binary(&[2; 100]).unwrap_err();
        assert!(matches!(err, DhcpError::InvalidPacket(_)));
    }

    #[test]
    fn test_rejects_bad_cookie() {
        let mut wire = sample().marshal_binary().unwrap().to_vec();
        wire[HEADER_LEN] = 0;
        let err = Packet::unmarshal_binary(&wire).unwrap_err();
        assert!(matches!(err, DhcpError::InvalidPacket(_)));
    }

    #[test]
    fn test_rejects_truncated_options() {
        let mut wire = sample().marshal_binary().unwrap()[..MIN_PACKET_LEN].to_vec();
        wire.extend_from_slice(&[54, 4, 10, 0]);
        let err = Packet::unmarshal_binary(&wire).unwrap_err();
        assert!(matches!(err, DhcpError::InvalidOptions));
    }

    #[test]
    fn test_oversized_chaddr_fails_to_encode() {
        let mut packet = sample();
        packet.chaddr = Bytes::from(vec![1u8; 17]);
        let err = packet.marshal_binary().unwrap_err();
        assert!(matches!(err, DhcpError::Encoding(_)));
    }

    #[test]
    fn test_options_area() {
        assert_eq!(options_area(&[53, 1, 1, 255, 0, 0, 0]), &[53, 1, 1]);
        assert_eq!(options_area(&[53, 1, 1, 0, 0, 255]), &[53, 1, 1]);
        assert_eq!(options_area(&[0, 53, 1, 1, 255]), &[0, 53, 1, 1]);
        assert_eq!(options_area(&[255]), &[] as &[u8]);
        assert_eq!(options_area(&[53, 1, 1, 7]), &[53, 1, 1, 7]);
        assert_eq!(options_area(&[53, 1, 2, 0, 0, 0]), &[53, 1, 2]);
        assert_eq!(options_area(&[54, 4, 10, 0]), &[54, 4, 10, 0]);
    }

    #[test]
    fn test_trailing_pad_without_end() {
        let mut wire = sample().marshal_binary().unwrap()[..MIN_PACKET_LEN].to_vec();
        wire.extend_from_slice(&[53, 1, 2, 0, 0, 0]);

        let decoded = Packet::unmarshal_binary(&wire).unwrap();
        assert_eq!(decoded.options.get(OptionCode::DHCP_MESSAGE_TYPE).unwrap(), &[2]);
        assert_eq!(decoded.options.len(), 1);
    }
}
