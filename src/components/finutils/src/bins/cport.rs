//!
//! # Cryptoport CLI tool
//!
//! cport, a command line tool for a cryptoport ledger.
//!
//! ## Usage
//!
//! ```shell
//! cport [OPTIONS] [SUBCOMMAND]
//!
//! - insert '<JSON entry>' [--wait=<secs>]
//! - list
//! - rollups
//! - rollups-by-coin
//! - genkey
//! ```
//!
//! Options fall back to `CRYPTOPORT_URL`, `CRYPTOPORT_KEYFILE` and
//! `CRYPTOPORT_WAIT`, then to an optional `--config` file.
//!

use {
    clap::{arg, crate_authors, crate_version, Command},
    config::{default_keyfile, ClientConfig},
    finutils::CryptoportClient,
    globutils::{
        ecdsa::{SecpPair, Signer},
        logging::init_logging,
    },
    ledger::data_model::HoldingEntry,
    ruc::*,
    serde::Serialize,
    std::{fmt, path::PathBuf, time::Duration},
};

fn main() {
    if let Err(e) = run() {
        tip_fail(e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = Command::new("cport")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Track a crypto portfolio on a cryptoport ledger")
        .subcommand_required(true)
        .args([
            arg!(--url <URL> "REST API of the ledger, default http://127.0.0.1:8008"),
            arg!(--keyfile <PATH> "file holding a hex private key"),
            arg!(--config <PATH> "TOML or JSON client config"),
            arg!(-v --verbose "debug logs"),
        ])
        .subcommand(
            Command::new("insert")
                .about("Append a portfolio entry")
                .args([
                    arg!(<ENTRY> "the entry, as JSON"),
                    arg!(--wait <SECS> "seconds to wait for the commit"),
                ]),
        )
        .subcommand(Command::new("list").about("Show all entries"))
        .subcommand(Command::new("rollups").about("Totals per symbol and type"))
        .subcommand(Command::new("rollups-by-coin").about("Net position per symbol"))
        .subcommand(Command::new("genkey").about("Generate a random private key"))
        .get_matches();

    init_logging(matches.get_flag("verbose").then_some(""));

    if matches.subcommand_name() == Some("genkey") {
        let kp = SecpPair::generate();
        println!("\x1b[31;01mPrivate Key:\x1b[00m {}", kp.secret_hex());
        println!("\x1b[31;01mPublic Key:\x1b[00m {}", kp.public_key_hex());
        return Ok(());
    }

    let mut cfg = ClientConfig::load(
        matches
            .get_one::<String>("config")
            .map(PathBuf::from)
            .as_deref(),
    )
    .c(d!())?;
    if let Some(url) = matches.get_one::<String>("url") {
        cfg.url = url.to_owned();
    }
    if let Some(keyfile) = matches.get_one::<String>("keyfile") {
        cfg.keyfile = Some(PathBuf::from(keyfile));
    }
    if cfg.keyfile.is_none() {
        cfg.keyfile = default_keyfile().ok().filter(|p| p.exists());
    }

    let client = CryptoportClient::new(&cfg).c(d!())?;

    match matches.subcommand() {
        Some(("insert", m)) => {
            let entry = m
                .get_one::<String>("ENTRY")
                .c(d!())
                .and_then(|s| serde_json::from_str::<HoldingEntry>(s).c(d!("invalid entry")))?;
            let wait = match m.get_one::<String>("wait") {
                Some(s) => s
                    .parse::<u64>()
                    .c(d!("wait must be a number of seconds"))
                    .map(|s| Some(Duration::from_secs(s)))?,
                None => cfg.effective_wait(),
            };
            let resp = client.insert(&entry, wait).c(d!())?;
            println!("{resp}");
        }
        Some(("list", _)) => print_json(&client.list().c(d!())?)?,
        Some(("rollups", _)) => print_json(&client.rollups().c(d!())?)?,
        Some(("rollups-by-coin", _)) => print_json(&client.rollups_by_coin().c(d!())?)?,
        _ => return Err(eg!("unknown subcommand")),
    }

    Ok(())
}

fn print_json<T: Serialize>(v: &T) -> Result<()> {
    serde_json::to_string_pretty(v)
        .c(d!())
        .map(|s| println!("{s}"))
}

fn tip_fail(e: impl fmt::Display) {
    eprintln!("\n\x1b[31;01mFAIL !!!\x1b[00m");
    eprintln!("\n{e}");
}
