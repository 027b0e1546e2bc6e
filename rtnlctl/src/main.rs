mod command;

use std::env;
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(verb) = args.get(1) else {
        eprintln!("usage: rtnlctl <up|down|veth|bridge|address|delete|status|rename|master|ns> [args...]");
        return ExitCode::FAILURE;
    };

    let result = command::command_from(verb, &args[2..]).and_then(|cmd| cmd.run());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}
