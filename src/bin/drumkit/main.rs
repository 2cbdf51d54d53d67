//! drumkit - terminal drum machine
//!
//! Run with: cargo run --features cli --bin drumkit
//!
//! Logs go to stderr and are off unless `RUST_LOG` is set, e.g.
//! `RUST_LOG=drumbus=debug cargo run --features cli 2> drumkit.log`.

mod app;
mod ui;

use app::DrumKit;
use drumbus::Instrument;
use tracing_subscriber::EnvFilter;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .with_writer(std::io::stderr)
        .init();

    // A basic groove to start from
    DrumKit::new()
        .bpm(120.0)
        .pattern_length(16)
        .steps(Instrument::Kick, [0, 4, 8, 12])
        .steps(Instrument::Snare, [4, 12])
        .steps(Instrument::OpenHat, [2, 6, 10, 14])
        .run()
}
