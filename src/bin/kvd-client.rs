use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use kvd::client::{parse_pair, Client, ClientError, DEFAULT_URL};
use std::process::exit;

fn main() {
    env_logger::init();

    let matches = App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("url")
                .long("url")
                .takes_value(true)
                .global(true)
                .help("base URL of the kvd server")
                .default_value(DEFAULT_URL),
        )
        .subcommand(
            SubCommand::with_name("set")
                .about("set keys to the given values")
                .arg(Arg::with_name("PAIR").required(true).multiple(true).help("KEY=VALUE")),
        )
        .subcommand(
            SubCommand::with_name("get")
                .about("get values of the given keys")
                .arg(Arg::with_name("KEY").required(true).multiple(true)),
        )
        .subcommand(
            SubCommand::with_name("rm")
                .about("remove the given keys")
                .arg(Arg::with_name("KEY").required(true).multiple(true)),
        )
        .subcommand(SubCommand::with_name("metrics").about("show server metrics"))
        .subcommand(SubCommand::with_name("status").about("show server status"))
        .get_matches();

    if let Err(e) = run(&matches) {
        match e {
            ClientError::Status { body, .. } => eprintln!("{}", body),
            e => eprintln!("{}", e),
        }
        exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), ClientError> {
    let url = matches.value_of("url").unwrap_or(DEFAULT_URL);
    let client = Client::new(url)?;

    match matches.subcommand() {
        ("set", Some(matches)) => {
            let records = values(matches, "PAIR")
                .iter()
                .map(|arg| parse_pair(arg))
                .collect::<Result<Vec<_>, _>>()?;

            match records.as_slice() {
                [record] => client.set(&record.key, &record.value),
                _ => client.bulk_set(&records),
            }
        }
        ("get", Some(matches)) => {
            let keys = values(matches, "KEY");

            match keys.as_slice() {
                [key] => println!("{}", client.get(key)?),
                _ => {
                    for record in client.bulk_get(&keys)? {
                        println!("{}: {}", record.key, record.value);
                    }
                }
            }

            Ok(())
        }
        ("rm", Some(matches)) => {
            let keys = values(matches, "KEY");

            match keys.as_slice() {
                [key] => client.delete(key).map(|_| ()),
                _ => client.bulk_delete(&keys),
            }
        }
        ("metrics", Some(_)) => {
            let metrics = client.metrics()?;

            println!("Keys Stored: {}", metrics.keys_stored);
            println!("Value Bytes Stored: {}", metrics.value_bytes_stored);
            println!("Set Operations: {}", metrics.set_ops);
            println!("Get Operations: {}", metrics.get_ops);
            println!("Delete Operations: {}", metrics.del_ops);

            Ok(())
        }
        ("status", Some(_)) => {
            let status = client.status()?;

            println!("{} ({}) version {} at {}", status.status, status.message, status.version, status.ts);

            Ok(())
        }
        _ => unreachable!(),
    }
}

fn values(matches: &ArgMatches, name: &str) -> Vec<String> {
    matches
        .values_of(name)
        .map(|values| values.map(str::to_owned).collect())
        .unwrap_or_default()
}
