use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

use pool_janitor::command::{Reply, LEAK_REPORT};
use pool_janitor::config::{load_config, ProbeConfig};
use pool_janitor::observability::logging;
use pool_janitor::probe::{ping, Locality, ProbeTarget, TcpDispatcher};

#[derive(Parser)]
#[command(name = "janitor-cli")]
#[command(about = "Operational CLI for pool-janitor services", long_about = None)]
struct Cli {
    /// Host running the service
    #[arg(long, global = true, default_value = "localhost")]
    host: String,

    /// Command port of the service
    #[arg(short, long, global = true, default_value_t = 9999)]
    port: u16,

    /// Round-trip timeout in seconds (overrides the config file)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Service config file to take probe settings from
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the service answers its readiness command
    Ping {
        /// Probe as a remote host (remote-list) instead of locally (local-list)
        #[arg(long)]
        remote: bool,
    },
    /// List pools hosted by the service
    List {
        #[arg(long)]
        remote: bool,
    },
    /// Show handles still checked out from recording pools
    Leaks,
}

fn locality(remote: bool) -> Locality {
    if remote {
        Locality::Remote
    } else {
        Locality::Local
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init("pool_janitor=warn");

    let probe = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config.probe,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => ProbeConfig::default(),
    };
    let dispatcher = match cli.timeout_secs {
        Some(secs) => TcpDispatcher::new(Duration::from_secs(secs)),
        None => TcpDispatcher::from_config(&probe),
    };

    match cli.command {
        Commands::Ping { remote } => {
            let target = ProbeTarget::new(cli.host, cli.port, locality(remote));
            match ping(&dispatcher, &target).await {
                Ok(()) => {
                    println!("OK");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::List { remote } => {
            let target = ProbeTarget::new(cli.host, cli.port, locality(remote));
            let command = target.locality.readiness_command();
            query(&dispatcher, &target, command).await
        }
        Commands::Leaks => {
            let target = ProbeTarget::local(cli.host, cli.port);
            query(&dispatcher, &target, LEAK_REPORT).await
        }
    }
}

async fn query(dispatcher: &TcpDispatcher, target: &ProbeTarget, command: &str) -> ExitCode {
    match dispatcher.send(target, command).await {
        Ok(Reply::Ok(payload)) => match print_payload(&payload) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: unreadable reply from {target}: {e}");
                ExitCode::FAILURE
            }
        },
        Ok(Reply::Unknown(cmd)) => {
            eprintln!("Error: {target} does not serve '{cmd}'");
            ExitCode::FAILURE
        }
        Ok(Reply::Err(message)) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: unable to reach {target}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_payload(payload: &str) -> Result<(), serde_json::Error> {
    let json: Value = serde_json::from_str(payload)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
