use serde::{Deserialize, Serialize};

use crate::consts::NLMSG_HDRLEN;

/// The 16-byte netlink datagram header, bit-exact with the kernel's
/// `struct nlmsghdr`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NetlinkHeader {
    pub nlmsg_len: u32,
    pub nlmsg_type: u16,
    pub nlmsg_flags: u16,
    pub nlmsg_seq: u32,
    pub nlmsg_pid: u32,
}

impl NetlinkHeader {
    pub fn new(msg_type: u16, flags: u16, seq: u32, pid: u32) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: seq,
            nlmsg_pid: pid,
        }
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < NLMSG_HDRLEN {
            return None;
        }
        bincode::deserialize(buf).ok()
    }

    pub fn to_bytes(self) -> [u8; NLMSG_HDRLEN] {
        let mut out = [0u8; NLMSG_HDRLEN];
        out.copy_from_slice(&bincode::serialize(&self).expect("fixed-size header serializes"));
        out
    }

    pub const fn is_multi(&self) -> bool {
        self.nlmsg_flags & libc::NLM_F_MULTI as u16 != 0
    }

    pub const fn is_error(&self) -> bool {
        self.nlmsg_type == libc::NLMSG_ERROR as u16
    }

    pub const fn is_done(&self) -> bool {
        self.nlmsg_type == libc::NLMSG_DONE as u16
    }
}

/// A complete netlink datagram: header plus the family payload that follows
/// it, already stripped of any trailing alignment padding.
pub struct NetlinkFrame {
    pub header: NetlinkHeader,
    pub payload: Vec<u8>,
}

impl NetlinkFrame {
    /// Splits `buf` into every complete frame it contains. `buf` holds one
    /// `recvfrom` datagram, which may carry several `NLM_F_MULTI` messages
    /// back to back.
    pub fn parse_all(mut buf: &[u8]) -> Vec<NetlinkFrame> {
        let mut frames = Vec::new();

        while buf.len() >= NLMSG_HDRLEN {
            let Some(header) = NetlinkHeader::from_bytes(buf) else {
                break;
            };
            if (header.nlmsg_len as usize) < NLMSG_HDRLEN || header.nlmsg_len as usize > buf.len()
            {
                break;
            }

            let payload = buf[NLMSG_HDRLEN..header.nlmsg_len as usize].to_vec();
            let advance =
                crate::consts::align_of(header.nlmsg_len as usize, crate::consts::NLMSG_ALIGNTO)
                    .min(buf.len());

            frames.push(NetlinkFrame { header, payload });
            buf = &buf[advance..];
        }

        frames
    }
}
