use rtnl::LinkOps;

use super::{require_arg, Command};

/// `rtnlctl address <name> <addr>/<prefix>`.
pub struct AddressCommand {
    name: String,
    addr: String,
    prefix: u8,
}

impl AddressCommand {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let name = require_arg(args, 0, "name")?.to_string();
        let cidr = require_arg(args, 1, "addr/prefix")?;
        let (addr, prefix) = cidr
            .split_once('/')
            .ok_or_else(|| anyhow::anyhow!("expected addr/prefix, got {cidr:?}"))?;
        Ok(Self {
            name,
            addr: addr.to_string(),
            prefix: prefix.parse()?,
        })
    }
}

impl Command for AddressCommand {
    fn run(&self) -> anyhow::Result<()> {
        LinkOps::add_ipv4(&self.name, &self.addr, self.prefix)?;
        tracing::info!(name = %self.name, addr = %self.addr, prefix = self.prefix, "assigned address");
        Ok(())
    }
}
