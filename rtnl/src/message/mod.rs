pub mod attribute;
pub mod family;
pub mod header;

pub use attribute::{Attribute, AttributeTable};
pub use family::{AddressInfo, InterfaceInfo};
pub use header::{NetlinkFrame, NetlinkHeader};
