use std::net::Ipv4Addr;
use std::os::fd::RawFd;
use std::str::FromStr;

use derive_builder::Builder;

use crate::client::RtnetlinkClient;
use crate::consts::{IFLA_BR_AGEING_TIME, IFLA_BR_MCAST_SNOOPING, IFLA_BR_VLAN_FILTERING};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::message::{AddressInfo, InterfaceDescriptor, InterfaceInfo};

const IFNAMSIZ: usize = libc::IFNAMSIZ;
const CHANGE_ALL: u32 = 0xFFFF_FFFF;

/// Either endpoint of a name-or-index lookup, as accepted by [`LinkOps::get_info`]
/// and everywhere else a caller may know one but not the other.
#[derive(Debug, Clone)]
pub enum LinkSelector {
    Name(String),
    Index(i32),
}

impl From<&str> for LinkSelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for LinkSelector {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<i32> for LinkSelector {
    fn from(index: i32) -> Self {
        Self::Index(index)
    }
}

/// Target of `set_namespace`: the kernel accepts either a pid owning the
/// destination namespace or an already-open fd referring to it directly
/// (e.g. a bind-mount under `/var/run/netns`).
#[derive(Debug, Clone, Copy)]
pub enum Namespace {
    Pid(i32),
    Fd(RawFd),
}

/// Optional fields threaded into `create_veth`/`create_bridge` beyond the
/// name(s). A value of `None` means "don't set"; the kernel then applies
/// its own default.
#[derive(Debug, Clone, Default, Builder)]
#[builder(default, setter(strip_option, into))]
pub struct CreateOptions {
    pub mtu: Option<u32>,
    pub tx_queue_len: Option<u32>,
    pub num_tx_queues: Option<u32>,
    pub num_rx_queues: Option<u32>,
}

/// `IFLA_INFO_DATA` knobs specific to a bridge. `hello_time` is deliberately
/// not exposed; the kernel treats it as informational once STP takes over.
#[derive(Debug, Clone, Default, Builder)]
#[builder(default, setter(strip_option, into))]
pub struct BridgeOptions {
    pub ageing_time: Option<u32>,
    pub vlan_filtering: Option<bool>,
    pub multicast_snooping: Option<bool>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("interface name is empty".into()));
    }
    if name.len() >= IFNAMSIZ {
        return Err(Error::InvalidArgument(format!(
            "interface name {name:?} is not shorter than IFNAMSIZ ({IFNAMSIZ})"
        )));
    }
    Ok(())
}

fn name_attr(name: &str) -> Vec<u8> {
    let mut bytes = name.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// High-level rtnetlink operations. Every method opens its own
/// [`RtnetlinkClient`] connection, performs one request/reply exchange (or
/// dump), and lets the connection drop — there is no persistent handle to
/// hold across calls.
pub struct LinkOps;

impl LinkOps {
    pub fn create_bridge(name: &str) -> Result<()> {
        Self::create_bridge_with_options(name, &BridgeOptions::default(), &CreateOptions::default())
    }

    pub fn create_bridge_with_options(
        name: &str,
        bridge_opts: &BridgeOptions,
        create_opts: &CreateOptions,
    ) -> Result<()> {
        validate_name(name)?;

        let mut info_data = Encoder::with_capacity(256);
        if let Some(ageing_time) = bridge_opts.ageing_time {
            info_data.append_attribute(IFLA_BR_AGEING_TIME, &ageing_time.to_ne_bytes())?;
        }
        if let Some(vlan_filtering) = bridge_opts.vlan_filtering {
            info_data.append_attribute(IFLA_BR_VLAN_FILTERING, &[vlan_filtering as u8])?;
        }
        if let Some(multicast_snooping) = bridge_opts.multicast_snooping {
            info_data.append_attribute(IFLA_BR_MCAST_SNOOPING, &[multicast_snooping as u8])?;
        }

        let mut link_info = Encoder::with_capacity(256);
        link_info.append_attribute(libc::IFLA_INFO_KIND, b"bridge")?;
        if !info_data.is_empty() {
            link_info.append_nested(libc::IFLA_INFO_DATA, info_data.finalize())?;
        }

        let mut req = Encoder::new();
        let mut header = InterfaceInfo::new(libc::AF_UNSPEC);
        header.change = CHANGE_ALL;
        header.flags |= libc::IFF_MULTICAST as u32;
        req.append_header(&header.to_bytes())?;
        req.append_attribute(libc::IFLA_IFNAME, &name_attr(name))?;
        Self::append_create_options(&mut req, create_opts)?;
        req.append_nested(libc::IFLA_LINKINFO, link_info.finalize())?;

        let mut client = RtnetlinkClient::connect()?;
        client.simple_request(
            req.finalize(),
            libc::RTM_NEWLINK as u16,
            libc::NLM_F_CREATE as u16 | libc::NLM_F_EXCL as u16,
        )
    }

    pub fn create_veth(name: &str, peer_name: &str) -> Result<()> {
        Self::create_veth_with_options(name, peer_name, &CreateOptions::default())
    }

    pub fn create_veth_with_options(
        name: &str,
        peer_name: &str,
        create_opts: &CreateOptions,
    ) -> Result<()> {
        validate_name(name)?;
        validate_name(peer_name)?;

        let mut peer = Encoder::with_capacity(256);
        peer.append_header(&InterfaceInfo::new(libc::AF_UNSPEC).to_bytes())?;
        peer.append_attribute(libc::IFLA_IFNAME, &name_attr(peer_name))?;

        let mut info_data = Encoder::with_capacity(256);
        info_data.append_attribute(crate::consts::VETH_INFO_PEER, peer.finalize())?;

        let mut link_info = Encoder::with_capacity(256);
        link_info.append_attribute(libc::IFLA_INFO_KIND, b"veth")?;
        link_info.append_nested(libc::IFLA_INFO_DATA, info_data.finalize())?;

        let mut req = Encoder::new();
        let mut header = InterfaceInfo::new(libc::AF_UNSPEC);
        header.change = CHANGE_ALL;
        header.flags |= libc::IFF_MULTICAST as u32;
        req.append_header(&header.to_bytes())?;
        req.append_attribute(libc::IFLA_IFNAME, &name_attr(name))?;
        Self::append_create_options(&mut req, create_opts)?;
        req.append_nested(libc::IFLA_LINKINFO, link_info.finalize())?;

        let mut client = RtnetlinkClient::connect()?;
        client.simple_request(
            req.finalize(),
            libc::RTM_NEWLINK as u16,
            libc::NLM_F_CREATE as u16 | libc::NLM_F_EXCL as u16,
        )
    }

    fn append_create_options(req: &mut Encoder, opts: &CreateOptions) -> Result<()> {
        if let Some(mtu) = opts.mtu {
            req.append_attribute(libc::IFLA_MTU, &mtu.to_ne_bytes())?;
        }
        if let Some(tx_queue_len) = opts.tx_queue_len {
            req.append_attribute(libc::IFLA_TXQLEN, &tx_queue_len.to_ne_bytes())?;
        }
        if let Some(num_tx_queues) = opts.num_tx_queues {
            req.append_attribute(libc::IFLA_NUM_TX_QUEUES, &num_tx_queues.to_ne_bytes())?;
        }
        if let Some(num_rx_queues) = opts.num_rx_queues {
            req.append_attribute(libc::IFLA_NUM_RX_QUEUES, &num_rx_queues.to_ne_bytes())?;
        }
        Ok(())
    }

    pub fn delete(name: &str) -> Result<()> {
        let index = Self::resolve_index(name)?;

        let mut req = Encoder::new();
        let mut header = InterfaceInfo::new(libc::AF_UNSPEC);
        header.index = index;
        header.change = CHANGE_ALL;
        req.append_header(&header.to_bytes())?;

        let mut client = RtnetlinkClient::connect()?;
        client.simple_request(req.finalize(), libc::RTM_DELLINK as u16, 0)
    }

    pub fn set_flags(name: &str, set_mask: u32, clear_mask: u32) -> Result<()> {
        let current = Self::get_info(LinkSelector::from(name))?;
        let flags = (current.header.flags | set_mask) & !clear_mask;

        let mut req = Encoder::new();
        let mut header = InterfaceInfo::new(libc::AF_UNSPEC);
        header.index = current.header.index;
        header.flags = flags;
        header.change = CHANGE_ALL;
        req.append_header(&header.to_bytes())?;

        let mut client = RtnetlinkClient::connect()?;
        client.simple_request(req.finalize(), libc::RTM_NEWLINK as u16, 0)
    }

    pub fn up(name: &str) -> Result<()> {
        Self::set_flags(name, libc::IFF_UP as u32, 0)
    }

    pub fn down(name: &str) -> Result<()> {
        Self::set_flags(name, 0, libc::IFF_UP as u32)
    }

    pub fn is_up(name: &str) -> Result<bool> {
        let current = Self::get_info(LinkSelector::from(name))?;
        Ok(current.is_up())
    }

    /// Fetches the current `ifinfomsg`, re-encodes it as the header, and
    /// appends `(attr_id, payload)` as the single attribute of a `NEWLINK`
    /// request.
    pub fn set_attribute(index: i32, attr_id: u16, payload: &[u8]) -> Result<()> {
        let mut req = Encoder::new();
        let mut header = InterfaceInfo::new(libc::AF_UNSPEC);
        header.index = index;
        header.change = CHANGE_ALL;
        req.append_header(&header.to_bytes())?;
        req.append_attribute(attr_id, payload)?;

        let mut client = RtnetlinkClient::connect()?;
        client.simple_request(req.finalize(), libc::RTM_NEWLINK as u16, 0)
    }

    pub fn rename(old: &str, new: &str) -> Result<()> {
        validate_name(new)?;
        let index = Self::resolve_index(old)?;
        Self::set_attribute(index, libc::IFLA_IFNAME, &name_attr(new))
    }

    pub fn set_master(iface: &str, bridge: &str) -> Result<()> {
        let iface_index = Self::resolve_index(iface)?;
        let bridge_index = Self::resolve_index(bridge)?;
        Self::set_attribute(iface_index, libc::IFLA_MASTER, &bridge_index.to_ne_bytes())
    }

    pub fn unset_master(iface: &str) -> Result<()> {
        let iface_index = Self::resolve_index(iface)?;
        Self::set_attribute(iface_index, libc::IFLA_MASTER, &0i32.to_ne_bytes())
    }

    pub fn set_namespace(iface: &str, ns: Namespace) -> Result<()> {
        let index = Self::resolve_index(iface)?;
        match ns {
            Namespace::Pid(pid) => Self::set_attribute(index, libc::IFLA_NET_NS_PID, &pid.to_ne_bytes()),
            Namespace::Fd(fd) => {
                Self::set_attribute(index, libc::IFLA_NET_NS_FD, &(fd as i32).to_ne_bytes())
            }
        }
    }

    pub fn move_to_namespace(iface: &str, pid: i32) -> Result<()> {
        Self::set_namespace(iface, Namespace::Pid(pid))
    }

    pub fn add_ipv4(name: &str, addr_text: &str, prefix: u8) -> Result<()> {
        if prefix > 32 {
            return Err(Error::InvalidArgument(format!(
                "prefix {prefix} exceeds 32 bits for an IPv4 address"
            )));
        }

        let addr = Ipv4Addr::from_str(addr_text)
            .map_err(|_| Error::InvalidArgument(format!("not a dotted-quad IPv4 address: {addr_text:?}")))?;
        let index = Self::resolve_index(name)?;

        let addr_int: u32 = addr.into();
        let netmask_int: u32 = if prefix == 0 {
            0
        } else {
            u32::MAX << (32 - prefix)
        };
        let bcast_int = addr_int | !netmask_int;
        let bcast = Ipv4Addr::from(bcast_int);

        let mut req = Encoder::new();
        let mut header = AddressInfo::new(libc::AF_INET);
        header.prefix_len = prefix;
        header.index = index;
        req.append_header(&header.to_bytes())?;
        req.append_attribute(libc::IFA_ADDRESS, &addr.octets())?;
        req.append_attribute(libc::IFA_LOCAL, &addr.octets())?;
        req.append_attribute(libc::IFA_BROADCAST, &bcast.octets())?;

        let mut client = RtnetlinkClient::connect()?;
        client.simple_request(
            req.finalize(),
            libc::RTM_NEWADDR as u16,
            libc::NLM_F_CREATE as u16 | libc::NLM_F_EXCL as u16,
        )
    }

    pub fn get_info(selector: impl Into<LinkSelector>) -> Result<InterfaceDescriptor> {
        let mut req = Encoder::new();
        let mut header = InterfaceInfo::new(libc::AF_UNSPEC);

        let name_attr_bytes = match selector.into() {
            LinkSelector::Index(index) => {
                header.index = index;
                None
            }
            LinkSelector::Name(name) => {
                validate_name(&name)?;
                Some(name_attr(&name))
            }
        };

        req.append_header(&header.to_bytes())?;
        if let Some(bytes) = &name_attr_bytes {
            req.append_attribute(libc::IFLA_IFNAME, bytes)?;
        }

        let mut client = RtnetlinkClient::connect()?;
        let payload = client.request_reply(req.finalize(), libc::RTM_GETLINK as u16, 0)?;
        Decoder::decode_link(&payload)
    }

    fn resolve_index(name: &str) -> Result<i32> {
        validate_name(name)?;
        let descriptor = Self::get_info(LinkSelector::from(name)).map_err(|_| Error::ResolveFailed {
            name: name.to_string(),
        })?;
        Ok(descriptor.header.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert!(matches!(
            validate_name(""),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_name_at_ifnamsiz_limit() {
        let name = "a".repeat(IFNAMSIZ);
        assert!(matches!(
            validate_name(&name),
            Err(Error::InvalidArgument(_))
        ));
        let name = "a".repeat(IFNAMSIZ - 1);
        assert!(validate_name(&name).is_ok());
    }

    #[test]
    fn broadcast_matches_corrected_formula() {
        let addr: u32 = Ipv4Addr::new(192, 168, 1, 10).into();
        let prefix = 24u8;
        let netmask: u32 = u32::MAX << (32 - prefix);
        let bcast = Ipv4Addr::from(addr | !netmask);
        assert_eq!(bcast, Ipv4Addr::new(192, 168, 1, 255));
    }

    #[test]
    fn broadcast_at_prefix_zero_does_not_shift_by_32() {
        let addr: u32 = Ipv4Addr::new(10, 0, 0, 1).into();
        let netmask: u32 = 0;
        let bcast = Ipv4Addr::from(addr | !netmask);
        assert_eq!(bcast, Ipv4Addr::new(255, 255, 255, 255));
    }

    #[test]
    fn create_options_builder_defaults_to_unset() {
        let opts = CreateOptionsBuilder::default().build().unwrap();
        assert!(opts.mtu.is_none());
    }

    #[test]
    fn create_veth_and_delete() {
        crate::test_setup!();

        LinkOps::create_veth("tveth0", "tveth1").unwrap();

        let info = LinkOps::get_info(LinkSelector::from("tveth0")).unwrap();
        assert_eq!(info.name().unwrap(), "tveth0");
        let peer = LinkOps::get_info(LinkSelector::from("tveth1")).unwrap();
        assert_eq!(peer.name().unwrap(), "tveth1");

        LinkOps::delete("tveth0").unwrap();
        assert!(matches!(
            LinkOps::get_info(LinkSelector::from("tveth1")),
            Err(Error::ResolveFailed { .. })
        ));
    }

    #[test]
    fn up_down_transition() {
        crate::test_setup!();

        LinkOps::create_veth("tveth0", "tveth1").unwrap();
        assert!(!LinkOps::is_up("tveth0").unwrap());

        LinkOps::up("tveth0").unwrap();
        assert!(LinkOps::is_up("tveth0").unwrap());
        assert!(!LinkOps::is_up("tveth1").unwrap());

        LinkOps::down("tveth0").unwrap();
        assert!(!LinkOps::is_up("tveth0").unwrap());

        LinkOps::delete("tveth0").unwrap();
    }

    #[test]
    fn rename_then_old_name_unresolvable() {
        crate::test_setup!();

        LinkOps::create_veth("tveth0", "tveth1").unwrap();
        LinkOps::rename("tveth1", "newname").unwrap();

        let renamed = LinkOps::get_info(LinkSelector::from("newname")).unwrap();
        assert_eq!(renamed.name().unwrap(), "newname");
        assert!(matches!(
            LinkOps::get_info(LinkSelector::from("tveth1")),
            Err(Error::ResolveFailed { .. })
        ));

        LinkOps::delete("tveth0").unwrap();
    }

    #[test]
    fn bridge_master_attachment() {
        crate::test_setup!();

        LinkOps::create_bridge("tbridge").unwrap();
        LinkOps::create_veth("tveth0", "tveth1").unwrap();
        LinkOps::set_master("tveth0", "tbridge").unwrap();

        let bridge_index = LinkOps::get_info(LinkSelector::from("tbridge"))
            .unwrap()
            .header
            .index;
        let attached = LinkOps::get_info(LinkSelector::from("tveth0")).unwrap();
        assert_eq!(attached.master_index().unwrap(), bridge_index);

        LinkOps::delete("tveth0").unwrap();
        LinkOps::delete("tbridge").unwrap();
    }

    #[test]
    fn duplicate_bridge_create_fails_eexist() {
        crate::test_setup!();

        LinkOps::create_bridge("tbridge").unwrap();
        let err = LinkOps::create_bridge("tbridge").unwrap_err();
        assert!(matches!(err, Error::KernelRefused { errno } if errno == libc::EEXIST));

        LinkOps::delete("tbridge").unwrap();
    }
}
