use crate::consts::{align_of, PAGE_SIZE, RTATTR_HDRLEN, RTA_ALIGNTO};
use crate::error::{Error, Result};

/// A write cursor over an owned, fixed-capacity buffer. Every completed
/// append leaves the cursor 4-byte aligned; an append that would exceed
/// capacity is rejected outright rather than reallocating or truncating.
pub struct Encoder {
    buf: Vec<u8>,
    cap: usize,
    written: usize,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_capacity(PAGE_SIZE)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: vec![0u8; cap],
            cap,
            written: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    fn remaining(&self) -> usize {
        self.cap - self.written
    }

    /// Appends a fixed family header (`InterfaceInfo`/`AddressInfo`). Must
    /// be the first thing written to this encoder.
    pub fn append_header(&mut self, bytes: &[u8]) -> Result<()> {
        let aligned = align_of(bytes.len(), 4);
        if aligned > self.remaining() {
            return Err(Error::Overflow {
                capacity: self.cap,
                attempted: self.written + aligned,
            });
        }

        self.buf[self.written..self.written + bytes.len()].copy_from_slice(bytes);
        self.written += aligned;
        Ok(())
    }

    /// Appends a TLV attribute: `len` (header+payload, unpadded), `type`,
    /// payload, then zero padding out to the next 4-byte boundary.
    pub fn append_attribute(&mut self, attr_type: u16, payload: &[u8]) -> Result<()> {
        let total = RTATTR_HDRLEN + payload.len();
        let slot = align_of(total, RTA_ALIGNTO);

        if slot > self.remaining() {
            return Err(Error::Overflow {
                capacity: self.cap,
                attempted: self.written + slot,
            });
        }

        let rta_len = total as u16;
        let at = self.written;
        self.buf[at..at + 2].copy_from_slice(&rta_len.to_ne_bytes());
        self.buf[at + 2..at + 4].copy_from_slice(&attr_type.to_ne_bytes());
        self.buf[at + 4..at + total].copy_from_slice(payload);
        // the remainder of the slot was zeroed at construction time.

        self.written += slot;
        Ok(())
    }

    /// Appends a nested attribute whose payload is itself the finalized
    /// output of another encoder (or a hand-built TLV run, e.g.
    /// `IFLA_LINKINFO { IFLA_INFO_KIND, IFLA_INFO_DATA { ... } }`).
    pub fn append_nested(&mut self, attr_type: u16, nested: &[u8]) -> Result<()> {
        self.append_attribute(attr_type, nested)
    }

    pub fn finalize(&self) -> &[u8] {
        &self.buf[..self.written]
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{AttributeTable, InterfaceInfo};

    #[test]
    fn header_then_attributes_stay_aligned() {
        let mut enc = Encoder::new();
        let header = InterfaceInfo::new(libc::AF_UNSPEC);
        enc.append_header(&header.to_bytes()).unwrap();
        enc.append_attribute(libc::IFLA_IFNAME, b"tveth0\0").unwrap();

        assert_eq!(enc.len() % 4, 0);
        assert_eq!(enc.len(), InterfaceInfo::SIZE + 12);
    }

    #[test]
    fn exact_fit_succeeds_one_byte_more_overflows() {
        let mut enc = Encoder::with_capacity(8);
        enc.append_attribute(1, &[0; 4]).unwrap();
        assert_eq!(enc.len(), 8);

        let mut enc = Encoder::with_capacity(8);
        let err = enc.append_attribute(1, &[0; 5]).unwrap_err();
        assert!(matches!(err, Error::Overflow { .. }));
    }

    #[test]
    fn round_trip_recovers_appended_attributes() {
        let mut enc = Encoder::new();
        let header = InterfaceInfo::new(libc::AF_UNSPEC);
        enc.append_header(&header.to_bytes()).unwrap();
        enc.append_attribute(libc::IFLA_IFNAME, b"foo\0").unwrap();
        enc.append_attribute(libc::IFLA_MTU, &1500u32.to_ne_bytes())
            .unwrap();

        let buf = enc.finalize();
        let parsed_header = InterfaceInfo::from_bytes(buf).unwrap();
        assert_eq!(parsed_header.family, libc::AF_UNSPEC as u8);

        let table = AttributeTable::parse(&buf[InterfaceInfo::SIZE..]);
        assert_eq!(table.get_string(libc::IFLA_IFNAME).unwrap(), "foo");
        assert_eq!(table.get_u32(libc::IFLA_MTU).unwrap(), 1500);
    }

    #[test]
    fn nested_linkinfo_round_trips() {
        let mut peer_info = Encoder::with_capacity(256);
        let peer_header = InterfaceInfo::new(libc::AF_UNSPEC);
        peer_info.append_header(&peer_header.to_bytes()).unwrap();
        peer_info
            .append_attribute(libc::IFLA_IFNAME, b"tveth1\0")
            .unwrap();

        let mut link_info = Encoder::with_capacity(256);
        link_info
            .append_attribute(libc::IFLA_INFO_KIND, b"veth")
            .unwrap();

        let mut info_data = Encoder::with_capacity(256);
        info_data
            .append_attribute(crate::consts::VETH_INFO_PEER, peer_info.finalize())
            .unwrap();
        link_info
            .append_attribute(libc::IFLA_INFO_DATA, info_data.finalize())
            .unwrap();

        let mut req = Encoder::new();
        req.append_header(&InterfaceInfo::new(libc::AF_UNSPEC).to_bytes())
            .unwrap();
        req.append_attribute(libc::IFLA_IFNAME, b"tveth0\0").unwrap();
        req.append_nested(libc::IFLA_LINKINFO, link_info.finalize())
            .unwrap();

        let table = AttributeTable::parse(&req.finalize()[InterfaceInfo::SIZE..]);
        let link_info_bytes = table.get(libc::IFLA_LINKINFO).unwrap();
        let link_info_table = AttributeTable::parse(link_info_bytes);
        assert_eq!(
            link_info_table.get_string(libc::IFLA_INFO_KIND).unwrap(),
            "veth"
        );

        let info_data_bytes = link_info_table.get(libc::IFLA_INFO_DATA).unwrap();
        let info_data_table = AttributeTable::parse(info_data_bytes);
        let peer_bytes = info_data_table
            .get(crate::consts::VETH_INFO_PEER)
            .unwrap();
        let peer_table = AttributeTable::parse(&peer_bytes[InterfaceInfo::SIZE..]);
        assert_eq!(
            peer_table.get_string(libc::IFLA_IFNAME).unwrap(),
            "tveth1"
        );
    }
}
