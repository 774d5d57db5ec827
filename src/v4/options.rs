//! DHCPv4 options wire codec.
//!
//! Options are a sequence of `code (1) | length (1) | data (length)` records.
//! Pad and End carry neither length nor data. Per RFC 3396 an option may
//! appear several times; its data is the concatenation of all occurrences.

use super::opts::OptionValue;
use crate::error::DhcpError;
use bytes::{Buf, BufMut, BytesMut};
use std::{collections::BTreeMap, fmt};

/// A DHCPv4 option code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptionCode(pub u8);

impl OptionCode {
    pub const PAD: Self = Self(0);
    pub const SUBNET_MASK: Self = Self(1);
    pub const ROUTER: Self = Self(3);
    pub const DOMAIN_NAME_SERVER: Self = Self(6);
    pub const HOST_NAME: Self = Self(12);
    pub const DOMAIN_NAME: Self = Self(15);
    pub const REQUESTED_IP_ADDRESS: Self = Self(50);
    pub const IP_ADDRESS_LEASE_TIME: Self = Self(51);
    pub const OPTION_OVERLOAD: Self = Self(52);
    pub const DHCP_MESSAGE_TYPE: Self = Self(53);
    pub const SERVER_IDENTIFIER: Self = Self(54);
    pub const PARAMETER_REQUEST_LIST: Self = Self(55);
    pub const MAXIMUM_DHCP_MESSAGE_SIZE: Self = Self(57);
    pub const RENEWAL_TIME_VALUE: Self = Self(58);
    pub const REBINDING_TIME_VALUE: Self = Self(59);
    pub const CLIENT_IDENTIFIER: Self = Self(61);
    pub const END: Self = Self(255);

    /// Pad and End never carry a length or data on the wire.
    pub fn is_zero_length(self) -> bool {
        self == Self::PAD || self == Self::END
    }
}

impl From<u8> for OptionCode {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl fmt::Display for OptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Option codes mapped to their (reassembled) data.
///
/// Iteration and encoding are in ascending code order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeMap<OptionCode, Vec<u8>>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to whatever is already stored under `code`.
    ///
    /// Pad and End always hold an empty value; data given for them is dropped.
    pub fn add_raw(&mut self, code: OptionCode, value: &[u8]) {
        let data = self.0.entry(code).or_default();
        if !code.is_zero_length() {
            data.extend_from_slice(value);
        }
    }

    /// Appends the wire form of a typed value under `code`.
    pub fn add<V: OptionValue + ?Sized>(&mut self, code: OptionCode, value: &V) {
        let mut buf = BytesMut::new();
        value.put(&mut buf);
        self.add_raw(code, &buf);
    }

    /// Returns the data stored for `code`.
    ///
    /// Options that are present with no data (e.g. Pad) yield an empty slice.
    pub fn get(&self, code: OptionCode) -> Result<&[u8], DhcpError> {
        self.0
            .get(&code)
            .map(Vec::as_slice)
            .ok_or(DhcpError::OptionNotPresent(code))
    }

    pub fn contains(&self, code: OptionCode) -> bool {
        self.0.contains_key(&code)
    }

    pub fn remove(&mut self, code: OptionCode) -> Option<Vec<u8>> {
        self.0.remove(&code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionCode, &[u8])> {
        self.0.iter().map(|(code, data)| (*code, data.as_slice()))
    }

    /// Parses an options byte stream.
    ///
    /// A declared length of zero on a regular option is skipped without
    /// recording the code. Truncated data or a trailing lone byte fails with
    /// [`DhcpError::InvalidOptions`].
    pub fn decode(mut buf: &[u8]) -> Result<Self, DhcpError> {
        let mut options = Self::new();

        while buf.remaining() >= 2 {
            let code = OptionCode(buf.get_u8());
            if code.is_zero_length() {
                options.add_raw(code, &[]);
                continue;
            }

            let length = buf.get_u8() as usize;
            if length == 0 {
                continue;
            }
            if buf.remaining() < length {
                return Err(DhcpError::InvalidOptions);
            }

            // RFC 3396: concatenate repeated occurrences.
            options.add_raw(code, &buf[..length]);
            buf.advance(length);
        }

        if buf.has_remaining() {
            return Err(DhcpError::InvalidOptions);
        }
        Ok(options)
    }

    /// Writes all options in ascending code order.
    ///
    /// Values longer than 255 bytes are split over several records with the
    /// same code.
    pub fn encode(&self, out: &mut impl BufMut) {
        for (code, data) in &self.0 {
            out.put_u8(code.0);
            if code.is_zero_length() {
                continue;
            }

            if data.is_empty() {
                out.put_u8(0);
                continue;
            }

            for (i, chunk) in data.chunks(u8::MAX as usize).enumerate() {
                if i > 0 {
                    out.put_u8(code.0);
                }
                out.put_u8(chunk.len() as u8);
                out.put_slice(chunk);
            }
        }
    }

    /// Number of bytes [`Options::encode`] will write.
    pub fn encoded_len(&self) -> usize {
        self.0
            .iter()
            .map(|(code, data)| {
                if code.is_zero_length() {
                    1
                } else if data.is_empty() {
                    2
                } else {
                    data.len() + 2 * data.len().div_ceil(u8::MAX as usize)
                }
            })
            .sum()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out);
        out
    }
}
