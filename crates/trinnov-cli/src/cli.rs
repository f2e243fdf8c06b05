use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "trinnov-bridge",
    about = "Expose a Trinnov processor as home automation accessories",
    long_about = None,
    version,
)]
pub struct Args {
    /// Host configuration file with a `TrinnovPlatform` entry under `platforms`
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    pub config: PathBuf,

    /// Directory for the accessory cache [default: no cache, accessories live in memory]
    #[arg(short, long, value_name = "DIR")]
    pub storage: Option<PathBuf>,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short = 'D', long)]
    pub debug: bool,
}
