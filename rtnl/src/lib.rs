//! Synchronous rtnetlink client: create veth pairs and bridges, attach
//! interfaces to a bridge, rename, bring links up/down, assign IPv4
//! addresses, delete, and query — all over a hand-rolled encoder/decoder
//! on top of raw `AF_NETLINK` sockets.

pub mod buffer;
pub mod client;
pub mod consts;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod link;
pub mod message;
pub mod socket;

pub use buffer::ByteBuffer;
pub use client::RtnetlinkClient;
pub use consts::align_of;
pub use decoder::{Classification, Decoder, InterfaceDescriptor};
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use link::{BridgeOptions, BridgeOptionsBuilder, CreateOptions, CreateOptionsBuilder, LinkOps, LinkSelector, Namespace};
pub use message::{AddressInfo, Attribute, AttributeTable, InterfaceInfo, NetlinkFrame, NetlinkHeader};
pub use socket::NetlinkSocket;

/// Gates a test on `CAP_NET_ADMIN` and moves it into a private network
/// namespace, so live-kernel tests don't disturb the host's interfaces and
/// don't fail outright in unprivileged CI.
#[macro_export]
macro_rules! test_setup {
    () => {
        if !nix::unistd::getuid().is_root() {
            eprintln!("test skipped, requires root (CAP_NET_ADMIN)");
            return;
        }
        nix::sched::unshare(nix::sched::CloneFlags::CLONE_NEWNET).expect("unshare(CLONE_NEWNET)");
    };
}
