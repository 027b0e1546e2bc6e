use std::collections::HashMap;

use crate::consts::{align_of, RTATTR_HDRLEN, RTA_ALIGNTO};

/// A decoded TLV: `rta_len` (header + payload, excluding padding),
/// `rta_type`, and the payload bytes. Produced only by decoding — the one
/// encoding path for outgoing TLVs is [`crate::encoder::Encoder::append_attribute`].
#[derive(Debug, Clone)]
pub struct Attribute {
    pub attr_type: u16,
    pub payload: Vec<u8>,
}

impl Attribute {
    fn parse_one(buf: &[u8]) -> Option<(Attribute, usize)> {
        if buf.len() < RTATTR_HDRLEN {
            return None;
        }
        let rta_len = u16::from_ne_bytes(buf[0..2].try_into().ok()?) as usize;
        let attr_type = u16::from_ne_bytes(buf[2..4].try_into().ok()?);

        if rta_len < RTATTR_HDRLEN || rta_len > buf.len() {
            return None;
        }

        let payload = buf[RTATTR_HDRLEN..rta_len].to_vec();
        let advance = align_of(rta_len, RTA_ALIGNTO).min(buf.len());

        Some((Attribute { attr_type, payload }, advance))
    }
}

/// An indexed view over a decoded attribute run: at most one payload per
/// attribute-type id, last occurrence wins.
#[derive(Debug, Default, Clone)]
pub struct AttributeTable(HashMap<u16, Vec<u8>>);

impl AttributeTable {
    pub fn parse(mut buf: &[u8]) -> Self {
        let mut table = HashMap::new();

        while !buf.is_empty() {
            let Some((attr, advance)) = Attribute::parse_one(buf) else {
                break;
            };
            table.insert(attr.attr_type, attr.payload);
            buf = &buf[advance..];
        }

        Self(table)
    }

    pub fn get(&self, attr_type: u16) -> Option<&[u8]> {
        self.0.get(&attr_type).map(Vec::as_slice)
    }

    pub fn get_u8(&self, attr_type: u16) -> Option<u8> {
        self.get(attr_type)?.first().copied()
    }

    pub fn get_u32(&self, attr_type: u16) -> Option<u32> {
        Some(u32::from_ne_bytes(self.get(attr_type)?.try_into().ok()?))
    }

    pub fn get_i32(&self, attr_type: u16) -> Option<i32> {
        Some(i32::from_ne_bytes(self.get(attr_type)?.try_into().ok()?))
    }

    pub fn get_string(&self, attr_type: u16) -> Option<String> {
        let bytes = self.get(attr_type)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    pub fn contains(&self, attr_type: u16) -> bool {
        self.0.contains_key(&attr_type)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;

    #[rustfmt::skip]
    const IFNAME_AND_MTU: [u8; 16] = [
        0x07, 0x00, 0x03, 0x00, b'l', b'o', 0x00, 0x00, // L=7,T=3,V="lo\0" + pad
        0x08, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01, 0x00, // L=8,T=4,V=65536 (MTU)
    ];

    #[test]
    fn parses_name_and_mtu() {
        let table = AttributeTable::parse(&IFNAME_AND_MTU);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get_string(3).unwrap(), "lo");
        assert_eq!(table.get_u32(4).unwrap(), 0x0001_0000);
    }

    #[test]
    fn later_occurrence_overwrites_earlier() {
        let mut enc = Encoder::with_capacity(32);
        enc.append_attribute(1, &1u32.to_ne_bytes()).unwrap();
        enc.append_attribute(1, &2u32.to_ne_bytes()).unwrap();

        let table = AttributeTable::parse(enc.finalize());
        assert_eq!(table.len(), 1);
        assert_eq!(table.get_u32(1).unwrap(), 2);
    }

    #[test]
    fn malformed_tlv_truncates_iteration() {
        let mut enc = Encoder::with_capacity(32);
        enc.append_attribute(1, &[9]).unwrap();
        let mut buf = enc.finalize().to_vec();
        buf.extend_from_slice(&[0xff, 0xff, 0, 0]); // claims len=65535, far past residual

        let table = AttributeTable::parse(&buf);
        assert_eq!(table.len(), 1);
        assert!(table.contains(1));
    }

    #[test]
    fn attribute_round_trips_through_encode_and_parse() {
        let mut enc = Encoder::with_capacity(32);
        enc.append_attribute(3, b"tveth0\0").unwrap();
        let buf = enc.finalize();
        assert_eq!(buf.len() % RTA_ALIGNTO, 0);

        let table = AttributeTable::parse(buf);
        assert_eq!(table.get_string(3).unwrap(), "tveth0");
    }
}
