use clap::{App, AppSettings, Arg};
use kvd::server::ServerError;
use kvd::{KvStore, Server, ServerConfig};
use log::{error, info};
use std::process::exit;

fn main() {
    env_logger::init();

    let defaults = ServerConfig::default();
    let default_threads = defaults.threads.to_string();

    let matches = App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .arg(
            Arg::with_name("addr")
                .long("addr")
                .takes_value(true)
                .help("specify the address to listen on")
                .default_value(&defaults.addr),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .takes_value(true)
                .help("number of worker threads serving requests")
                .default_value(&default_threads),
        )
        .get_matches();

    // clap provides defaults for both arguments.
    let addr = matches.value_of("addr").unwrap_or_default();
    let threads = match matches.value_of("threads").unwrap_or_default().parse() {
        Ok(threads) if threads > 0 => threads,
        _ => {
            eprintln!("--threads expects a positive number");
            exit(2);
        }
    };

    let config = ServerConfig {
        addr: addr.to_owned(),
        threads,
        ..ServerConfig::default()
    };
    info!("Using {} worker threads.", config.threads);

    if let Err(e) = run(config) {
        error!("{}", e);
        eprintln!("kvd-server: {}", e);
        exit(1);
    }
}

fn run(config: ServerConfig) -> Result<(), ServerError> {
    Server::new(KvStore::new(), config).listen()
}
