//! Command-line interface definitions and parsing

use clap::Parser;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL for the bootstrap and send calls
    #[arg(short, long)]
    pub url: String,

    /// Display name sent with the bootstrap call
    #[arg(short, long, default_value = "Guest")]
    pub name: String,

    /// Wire role treated as this client's own echo
    #[arg(long, default_value = "CUSTOMER")]
    pub role: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
