use serde::{Deserialize, Serialize};

/// `struct ifinfomsg`: the fixed header identifying a link in `NEWLINK`/
/// `DELLINK`/`GETLINK` requests and replies.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub family: u8,
    pub _pad: u8,
    pub dev_type: u16,
    pub index: i32,
    pub flags: u32,
    pub change: u32,
}

impl InterfaceInfo {
    pub const SIZE: usize = 16;

    pub fn new(family: i32) -> Self {
        Self {
            family: family as u8,
            ..Default::default()
        }
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(&bincode::serialize(&self).expect("fixed-size header serializes"));
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE {
            return None;
        }
        bincode::deserialize(buf).ok()
    }
}

/// `struct ifaddrmsg`: the fixed header for `NEWADDR`/`DELADDR`/`GETADDR`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AddressInfo {
    pub family: u8,
    pub prefix_len: u8,
    pub flags: u8,
    pub scope: u8,
    pub index: i32,
}

impl AddressInfo {
    pub const SIZE: usize = 8;

    pub fn new(family: i32) -> Self {
        Self {
            family: family as u8,
            ..Default::default()
        }
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(&bincode::serialize(&self).expect("fixed-size header serializes"));
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE {
            return None;
        }
        bincode::deserialize(buf).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_info_round_trips() {
        let info = InterfaceInfo {
            family: 0,
            _pad: 0,
            dev_type: 772,
            index: 1,
            flags: 0x49,
            change: 0,
        };
        let bytes = info.to_bytes();
        let back = InterfaceInfo::from_bytes(&bytes).unwrap();
        assert_eq!(back.index, 1);
        assert_eq!(back.flags, 0x49);
        assert_eq!(back.dev_type, 772);
    }

    #[test]
    fn address_info_round_trips() {
        let info = AddressInfo {
            family: libc::AF_INET as u8,
            prefix_len: 24,
            flags: 0,
            scope: 0,
            index: 3,
        };
        let bytes = info.to_bytes();
        let back = AddressInfo::from_bytes(&bytes).unwrap();
        assert_eq!(back.prefix_len, 24);
        assert_eq!(back.index, 3);
    }
}
