//! Typed option values on top of the raw [`Options`] map.

use super::options::{OptionCode, Options};
use crate::error::DhcpError;
use bytes::BufMut;
use std::{fmt, net::Ipv4Addr};

/// A value that can be stored as option data.
pub trait OptionValue {
    fn put(&self, buf: &mut dyn BufMut);
}

/// DHCP message type (option 53), RFC 2132 §9.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Discover),
            2 => Ok(Self::Offer),
            3 => Ok(Self::Request),
            4 => Ok(Self::Decline),
            5 => Ok(Self::Ack),
            6 => Ok(Self::Nak),
            7 => Ok(Self::Release),
            8 => Ok(Self::Inform),
            other => Err(other),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discover => "DHCPDISCOVER",
            Self::Offer => "DHCPOFFER",
            Self::Request => "DHCPREQUEST",
            Self::Decline => "DHCPDECLINE",
            Self::Ack => "DHCPACK",
            Self::Nak => "DHCPNAK",
            Self::Release => "DHCPRELEASE",
            Self::Inform => "DHCPINFORM",
        };
        f.write_str(name)
    }
}

impl OptionValue for MessageType {
    fn put(&self, buf: &mut dyn BufMut) {
        buf.put_u8(*self as u8);
    }
}

impl OptionValue for u16 {
    fn put(&self, buf: &mut dyn BufMut) {
        buf.put_u16(*self);
    }
}

impl OptionValue for u32 {
    fn put(&self, buf: &mut dyn BufMut) {
        buf.put_u32(*self);
    }
}

impl OptionValue for Ipv4Addr {
    fn put(&self, buf: &mut dyn BufMut) {
        buf.put_slice(&self.octets());
    }
}

impl OptionValue for [Ipv4Addr] {
    fn put(&self, buf: &mut dyn BufMut) {
        for ip in self {
            ip.put(buf);
        }
    }
}

/// Parameter request list (option 55).
impl OptionValue for [OptionCode] {
    fn put(&self, buf: &mut dyn BufMut) {
        for code in self {
            buf.put_u8(code.0);
        }
    }
}

impl OptionValue for str {
    fn put(&self, buf: &mut dyn BufMut) {
        buf.put_slice(self.as_bytes());
    }
}

fn fixed<const N: usize>(options: &Options, code: OptionCode) -> Result<[u8; N], DhcpError> {
    let data = options.get(code)?;
    data.try_into()
        .map_err(|_| DhcpError::InvalidOptionValue {
            code,
            len: data.len(),
        })
}

pub fn get_message_type(options: &Options) -> Result<MessageType, DhcpError> {
    let [value] = fixed::<1>(options, OptionCode::DHCP_MESSAGE_TYPE)?;
    MessageType::try_from(value).map_err(|_| DhcpError::InvalidOptionValue {
        code: OptionCode::DHCP_MESSAGE_TYPE,
        len: 1,
    })
}

pub fn get_u16(options: &Options, code: OptionCode) -> Result<u16, DhcpError> {
    fixed::<2>(options, code).map(u16::from_be_bytes)
}

pub fn get_u32(options: &Options, code: OptionCode) -> Result<u32, DhcpError> {
    fixed::<4>(options, code).map(u32::from_be_bytes)
}

pub fn get_ip(options: &Options, code: OptionCode) -> Result<Ipv4Addr, DhcpError> {
    fixed::<4>(options, code).map(Ipv4Addr::from)
}

pub fn get_ips(options: &Options, code: OptionCode) -> Result<Vec<Ipv4Addr>, DhcpError> {
    let data = options.get(code)?;
    if data.is_empty() || data.len() % 4 != 0 {
        return Err(DhcpError::InvalidOptionValue {
            code,
            len: data.len(),
        });
    }
    Ok(data
        .chunks_exact(4)
        .map(|ip| Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]))
        .collect())
}

pub fn get_server_identifier(options: &Options) -> Result<Ipv4Addr, DhcpError> {
    get_ip(options, OptionCode::SERVER_IDENTIFIER)
}
