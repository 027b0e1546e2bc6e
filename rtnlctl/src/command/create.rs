use rtnl::LinkOps;

use super::{require_arg, Command};

/// `rtnlctl veth <basename>` creates `<basename>_0`/`<basename>_1`.
pub struct VethCommand {
    name: String,
    peer_name: String,
}

impl VethCommand {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let basename = require_arg(args, 0, "basename")?;
        Ok(Self {
            name: format!("{basename}_0"),
            peer_name: format!("{basename}_1"),
        })
    }
}

impl Command for VethCommand {
    fn run(&self) -> anyhow::Result<()> {
        LinkOps::create_veth(&self.name, &self.peer_name)?;
        tracing::info!(name = %self.name, peer = %self.peer_name, "created veth pair");
        Ok(())
    }
}

pub struct BridgeCommand {
    name: String,
}

impl BridgeCommand {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            name: require_arg(args, 0, "name")?.to_string(),
        })
    }
}

impl Command for BridgeCommand {
    fn run(&self) -> anyhow::Result<()> {
        LinkOps::create_bridge(&self.name)?;
        tracing::info!(name = %self.name, "created bridge");
        Ok(())
    }
}
