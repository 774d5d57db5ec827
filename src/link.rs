//! Network link identity: the interface name and its hardware address.

use crate::error::DhcpError;
use bytes::{BufMut, Bytes, BytesMut};
use std::path::Path;

/// A network interface the client sends and receives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    name: String,
    hardware_addr: Bytes,
}

impl Link {
    pub fn new(name: impl Into<String>, hardware_addr: Bytes) -> Self {
        Self {
            name: name.into(),
            hardware_addr,
        }
    }

    /// Reads the hardware address of `name` from `/sys/class/net/<name>/address`.
    pub fn from_sysfs(name: &str) -> Result<Self, DhcpError> {
        let path = format!("/sys/class/net/{name}/address");
        Self::from_address_file(name, path)
    }

    /// Reads a colon-separated hardware address from `path`.
    pub fn from_address_file(name: &str, path: impl AsRef<Path>) -> Result<Self, DhcpError> {
        let mac_str = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            tracing::debug!("Failed to read {}: {}", path.as_ref().display(), e);
            DhcpError::InterfaceInvalid(name.to_string())
        })?;
        let hardware_addr = parse_mac_address(mac_str.trim())?;
        if hardware_addr.is_empty() {
            return Err(DhcpError::InterfaceInvalid(name.to_string()));
        }
        Ok(Self::new(name, hardware_addr))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hardware_addr(&self) -> &Bytes {
        &self.hardware_addr
    }
}

/// Parses a MAC address string (e.g., "0a:1b:2c:3d:4e:5f") into a `Bytes` object.
pub fn parse_mac_address(mac_str: &str) -> Result<Bytes, DhcpError> {
    let mut bytes = BytesMut::new();
    for byte_str in mac_str.split(':') {
        if !byte_str.is_empty() {
            let byte = u8::from_str_radix(byte_str, 16)
                .map_err(|e| DhcpError::MacParse(format!("{mac_str:?}: {e}")))?;
            bytes.put_u8(byte);
        }
    }
    Ok(bytes.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_parse_mac_address() {
        let mac = parse_mac_address("00:0c:29:a8:92:f4").unwrap();
        assert_eq!(&mac[..], &[0x00, 0x0c, 0x29, 0xa8, 0x92, 0xf4]);
    }

    #[test]
    fn test_parse_mac_address_rejects_garbage() {
        let err = parse_mac_address("00:zz:29").unwrap_err();
        assert!(matches!(err, DhcpError::MacParse(_)));
    }

    #[test]
    fn test_link_from_address_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0a:1b:2c:3d:4e:5f").unwrap();

        let link = Link::from_address_file("eth0", file.path()).unwrap();
        assert_eq!(link.name(), "eth0");
        assert_eq!(
            link.hardware_addr(),
            &Bytes::from_static(&[0x0a, 0x1b, 0x2c, 0x3d, 0x4e, 0x5f])
        );
    }

    #[test]
    fn test_link_missing_interface() {
        let err = Link::from_address_file("nope0", "/nonexistent/nope0/address").unwrap_err();
        assert!(matches!(err, DhcpError::InterfaceInvalid(name) if name == "nope0"));
    }
}
