use std::io::{self, BufReader, BufWriter};

use pointcloud_moving_average::protocol;
use pointcloud_moving_average::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

// Reads one request from stdin and writes the smoothed points to stdout.
// Default is the binary protocol; `--json` switches both directions to JSON.
// Logs go to stderr so they never mix with the protocol stream.

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let json = std::env::args().skip(1).any(|arg| arg == "--json");

    if let Err(e) = run(json) {
        error!("point smoothing failed: {e}");
        std::process::exit(1);
    }
}

fn run(json: bool) -> Result<()> {
    let mut reader = BufReader::new(io::stdin().lock());
    let mut writer = BufWriter::new(io::stdout().lock());
    protocol::serve(&mut reader, &mut writer, json)
}
