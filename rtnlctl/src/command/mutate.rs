use rtnl::{LinkOps, Namespace};

use super::{require_arg, Command};

pub struct UpCommand {
    name: String,
}

impl UpCommand {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            name: require_arg(args, 0, "name")?.to_string(),
        })
    }
}

impl Command for UpCommand {
    fn run(&self) -> anyhow::Result<()> {
        LinkOps::up(&self.name)?;
        tracing::info!(name = %self.name, "link up");
        Ok(())
    }
}

pub struct DownCommand {
    name: String,
}

impl DownCommand {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            name: require_arg(args, 0, "name")?.to_string(),
        })
    }
}

impl Command for DownCommand {
    fn run(&self) -> anyhow::Result<()> {
        LinkOps::down(&self.name)?;
        tracing::info!(name = %self.name, "link down");
        Ok(())
    }
}

pub struct DeleteCommand {
    name: String,
}

impl DeleteCommand {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            name: require_arg(args, 0, "name")?.to_string(),
        })
    }
}

impl Command for DeleteCommand {
    fn run(&self) -> anyhow::Result<()> {
        LinkOps::delete(&self.name)?;
        tracing::info!(name = %self.name, "deleted link");
        Ok(())
    }
}

pub struct RenameCommand {
    old: String,
    new: String,
}

impl RenameCommand {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            old: require_arg(args, 0, "old name")?.to_string(),
            new: require_arg(args, 1, "new name")?.to_string(),
        })
    }
}

impl Command for RenameCommand {
    fn run(&self) -> anyhow::Result<()> {
        LinkOps::rename(&self.old, &self.new)?;
        tracing::info!(old = %self.old, new = %self.new, "renamed link");
        Ok(())
    }
}

/// `rtnlctl master <iface> <bridge>` attaches; `rtnlctl master <iface> -`
/// clears the master.
pub struct MasterCommand {
    iface: String,
    bridge: Option<String>,
}

impl MasterCommand {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let iface = require_arg(args, 0, "interface")?.to_string();
        let bridge = match require_arg(args, 1, "bridge (or '-' to clear)")? {
            "-" => None,
            name => Some(name.to_string()),
        };
        Ok(Self { iface, bridge })
    }
}

impl Command for MasterCommand {
    fn run(&self) -> anyhow::Result<()> {
        match &self.bridge {
            Some(bridge) => {
                LinkOps::set_master(&self.iface, bridge)?;
                tracing::info!(iface = %self.iface, bridge = %bridge, "attached to bridge");
            }
            None => {
                LinkOps::unset_master(&self.iface)?;
                tracing::info!(iface = %self.iface, "cleared master");
            }
        }
        Ok(())
    }
}

pub struct NsCommand {
    iface: String,
    pid: i32,
}

impl NsCommand {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let iface = require_arg(args, 0, "interface")?.to_string();
        let pid = require_arg(args, 1, "pid")?.parse()?;
        Ok(Self { iface, pid })
    }
}

impl Command for NsCommand {
    fn run(&self) -> anyhow::Result<()> {
        LinkOps::set_namespace(&self.iface, Namespace::Pid(self.pid))?;
        tracing::info!(iface = %self.iface, pid = self.pid, "moved to namespace");
        Ok(())
    }
}
