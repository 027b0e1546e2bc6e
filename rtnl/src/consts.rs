//! Wire-format constants not already exposed by the `libc` crate.

/// Netlink messages and their trailing payload are padded to this boundary.
pub const NLMSG_ALIGNTO: usize = 4;
/// Size of `struct nlmsghdr`.
pub const NLMSG_HDRLEN: usize = 16;

/// Attribute TLVs are padded to this boundary, same as `NLMSG_ALIGNTO` but
/// named separately since the two alignments are conceptually distinct in
/// `rtnetlink(7)`.
pub const RTA_ALIGNTO: usize = 4;
/// Size of the `len`/`type` pair at the front of an attribute TLV.
pub const RTATTR_HDRLEN: usize = 4;

/// Source port id used by the kernel when replying to rtnetlink requests.
pub const PID_KERNEL: u32 = 0;

/// One page: the default capacity for an encoder buffer and a `recv` datagram.
pub const PAGE_SIZE: usize = 4096;

/// `IFLA_INFO_DATA { VETH_INFO_PEER { ... } }` nests the peer's header and
/// name under this attribute id. Not exposed by `libc`.
pub const VETH_INFO_PEER: u16 = 1;

/// `IFLA_INFO_DATA` bridge sub-attributes (`IFLA_BR_*` in the kernel headers,
/// not exposed by `libc`).
pub const IFLA_BR_AGEING_TIME: u16 = 0x4;
pub const IFLA_BR_VLAN_FILTERING: u16 = 0x7;
pub const IFLA_BR_MCAST_SNOOPING: u16 = 0x17;

/// Rounds `len` up to the next multiple of `align_to`, which must be a power
/// of two.
pub fn align_of(len: usize, align_to: usize) -> usize {
    (len + align_to - 1) & !(align_to - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_up_to_boundary() {
        assert_eq!(align_of(0, 4), 0);
        assert_eq!(align_of(1, 4), 4);
        assert_eq!(align_of(4, 4), 4);
        assert_eq!(align_of(5, 4), 8);
    }
}
