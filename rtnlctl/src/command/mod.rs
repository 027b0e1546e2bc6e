mod address;
mod create;
mod mutate;
mod query;

use self::address::AddressCommand;
use self::create::{BridgeCommand, VethCommand};
use self::mutate::{DeleteCommand, DownCommand, MasterCommand, NsCommand, RenameCommand, UpCommand};
use self::query::StatusCommand;

pub trait Command {
    fn run(&self) -> anyhow::Result<()>;
}

/// Builds the command for `verb`, consuming the remaining argv. Mirrors
/// the one-verb-one-struct dispatch shape, just synchronous and backed by
/// `rtnl::LinkOps` instead of shelling out to `ip`.
pub fn command_from(verb: &str, args: &[String]) -> anyhow::Result<Box<dyn Command>> {
    match verb {
        "up" => Ok(Box::new(UpCommand::parse(args)?)),
        "down" => Ok(Box::new(DownCommand::parse(args)?)),
        "veth" => Ok(Box::new(VethCommand::parse(args)?)),
        "bridge" => Ok(Box::new(BridgeCommand::parse(args)?)),
        "address" => Ok(Box::new(AddressCommand::parse(args)?)),
        "delete" => Ok(Box::new(DeleteCommand::parse(args)?)),
        "status" => Ok(Box::new(StatusCommand::parse(args)?)),
        "rename" => Ok(Box::new(RenameCommand::parse(args)?)),
        "master" => Ok(Box::new(MasterCommand::parse(args)?)),
        "ns" => Ok(Box::new(NsCommand::parse(args)?)),
        other => anyhow::bail!("unknown command: {other}"),
    }
}

fn require_arg<'a>(args: &'a [String], index: usize, what: &str) -> anyhow::Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing argument: {what}"))
}
