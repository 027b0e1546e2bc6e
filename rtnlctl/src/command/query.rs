use rtnl::LinkOps;

use super::{require_arg, Command};

pub struct StatusCommand {
    name: String,
}

impl StatusCommand {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            name: require_arg(args, 0, "name")?.to_string(),
        })
    }
}

impl Command for StatusCommand {
    fn run(&self) -> anyhow::Result<()> {
        let info = LinkOps::get_info(self.name.as_str())?;
        println!(
            "{}: {} mtu={} master={}",
            info.name().unwrap_or_else(|| self.name.clone()),
            if info.is_up() { "UP" } else { "DOWN" },
            info.mtu().map_or("?".to_string(), |m| m.to_string()),
            info.master_index().map_or("-".to_string(), |i| i.to_string()),
        );
        Ok(())
    }
}
