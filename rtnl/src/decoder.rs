use crate::error::{Error, Result};
use crate::message::{AttributeTable, InterfaceInfo, NetlinkHeader};

/// The decoded view of a `GETLINK`/`NEWLINK` reply: one `InterfaceInfo`
/// header plus the attribute run that followed it in the datagram.
#[derive(Debug, Clone)]
pub struct InterfaceDescriptor {
    pub header: InterfaceInfo,
    pub attributes: AttributeTable,
}

impl InterfaceDescriptor {
    pub fn name(&self) -> Option<String> {
        self.attributes.get_string(libc::IFLA_IFNAME)
    }

    pub fn mtu(&self) -> Option<u32> {
        self.attributes.get_u32(libc::IFLA_MTU)
    }

    pub fn master_index(&self) -> Option<i32> {
        self.attributes.get_i32(libc::IFLA_MASTER)
    }

    pub fn link_kind(&self) -> Option<String> {
        let linkinfo = self.attributes.get(libc::IFLA_LINKINFO)?;
        AttributeTable::parse(linkinfo).get_string(libc::IFLA_INFO_KIND)
    }

    pub fn is_up(&self) -> bool {
        self.header.flags & libc::IFF_UP as u32 != 0
    }
}

/// Parses a single received rtnetlink datagram into a header plus attribute
/// table, validating `NLMSG_OK`-style bounds along the way.
pub struct Decoder;

impl Decoder {
    /// Decodes the netlink-header-stripped payload of a `NEWLINK`/`GETLINK`
    /// reply (i.e. `buf` starts at the `ifinfomsg`, as handed back by
    /// [`crate::client::RtnetlinkClient`]).
    pub fn decode_link(buf: &[u8]) -> Result<InterfaceDescriptor> {
        if buf.len() < InterfaceInfo::SIZE {
            return Err(Error::ProtocolError("truncated ifinfomsg".into()));
        }

        let header = InterfaceInfo::from_bytes(buf)
            .ok_or_else(|| Error::ProtocolError("malformed ifinfomsg".into()))?;
        let attributes = AttributeTable::parse(&buf[InterfaceInfo::SIZE..]);

        Ok(InterfaceDescriptor { header, attributes })
    }

    /// Validates `NLMSG_OK` for a datagram of `recvd` bytes starting with
    /// `header`, and classifies it as an error/ack/other reply.
    pub fn classify(header: &NetlinkHeader, recvd: usize) -> Result<Classification> {
        if recvd < 16 || (header.nlmsg_len as usize) < 16 || header.nlmsg_len as usize > recvd {
            return Err(Error::ProtocolError(format!(
                "malformed netlink header: len={}, recvd={recvd}",
                header.nlmsg_len
            )));
        }

        if header.is_error() {
            return Ok(Classification::ErrorOrAck);
        }

        Ok(Classification::Other)
    }

    /// Reads the embedded `errno` out of an `NLMSG_ERROR` payload. Returns
    /// `0` for the ACK case.
    pub fn error_code(payload: &[u8]) -> Result<i32> {
        if payload.len() < 4 {
            return Err(Error::ProtocolError("truncated NLMSG_ERROR payload".into()));
        }
        Ok(i32::from_ne_bytes(payload[0..4].try_into().unwrap()))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Classification {
    ErrorOrAck,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;

    #[test]
    fn decodes_name_and_flags() {
        let mut enc = Encoder::new();
        let mut header = InterfaceInfo::new(libc::AF_UNSPEC);
        header.flags = libc::IFF_UP as u32;
        enc.append_header(&header.to_bytes()).unwrap();
        enc.append_attribute(libc::IFLA_IFNAME, b"lo\0").unwrap();

        let desc = Decoder::decode_link(enc.finalize()).unwrap();
        assert_eq!(desc.name().unwrap(), "lo");
        assert!(desc.is_up());
    }

    #[test]
    fn rejects_short_buffer() {
        let err = Decoder::decode_link(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, Error::ProtocolError(_)));
    }

    #[test]
    fn classify_rejects_length_below_header_size() {
        let header = NetlinkHeader::new(0, 0, 0, 0);
        let err = Decoder::classify(&header, 8).unwrap_err();
        assert!(matches!(err, Error::ProtocolError(_)));
    }
}
