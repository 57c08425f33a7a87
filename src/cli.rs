//! Command-line surface: `node <host>[:port] [<known-host>[:port]]`.
//! Parsed with `clap`'s derive API.

use clap::Parser;

use crate::host::Host;

#[derive(Parser, Debug)]
#[command(name = "chord", about = "A Chord DHT ring member")]
pub struct Cli {
    /// This node's own host[:port]. An address-only spec defaults to localhost.
    pub host: Host,

    /// A known peer to join through; omit to start a new ring.
    pub known_peer: Option<Host>,

    /// Optional `rust-ini` config file overriding the tunable constants.
    #[arg(long)]
    pub config: Option<String>,

    /// Increase log verbosity.
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable dev-mode diagnostic RPCs (node summary) for validate_cluster.
    #[arg(long)]
    pub dev_mode: bool,
}
