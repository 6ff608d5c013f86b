//! Entry point for `serial-link`.
//!
//! Parses CLI arguments and dispatches into either **simulate** or **encode**
//! mode.  All protocol work is delegated to library modules; `main.rs` owns
//! only process setup (logging, argument parsing, output).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use serial_link::simulator::{run_exchange, SimulatorConfig};
use serial_link::{encode_frame, LinkConfig};

/// Checksummed framing with ACK/retransmit over a single-slot serial channel.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Send one payload across a simulated lossy link and report the outcome.
    Simulate {
        /// Payload to send (UTF-8 text).
        #[arg(short, long, default_value = "OLA")]
        payload: String,
        /// Maximum payload length accepted by both ends.
        #[arg(long, default_value_t = 32)]
        capacity: u8,
        /// Ticks to wait for an ACK before retransmitting.
        #[arg(long, default_value_t = 100)]
        ack_wait: u64,
        /// Give up after this many retransmissions (default: never).
        #[arg(long)]
        max_retries: Option<u32>,
        /// Probability that a byte is dropped in transit.
        #[arg(long, default_value_t = 0.0)]
        loss: f64,
        /// Probability that a byte has one bit flipped in transit.
        #[arg(long, default_value_t = 0.0)]
        corrupt: f64,
        /// RNG seed for the fault model.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Stop the scheduler after this many ticks.
        #[arg(long, default_value_t = 100_000)]
        max_ticks: u64,
    },
    /// Print the wire encoding of a payload as hex.
    Encode {
        /// Payload to encode (UTF-8 text).
        payload: String,
        /// Maximum payload length; longer payloads are rejected.
        #[arg(long, default_value_t = 32)]
        capacity: u8,
    },
}

fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    match cli.mode {
        Mode::Simulate {
            payload,
            capacity,
            ack_wait,
            max_retries,
            loss,
            corrupt,
            seed,
            max_ticks,
        } => {
            let link = LinkConfig {
                capacity,
                ack_wait_period: ack_wait,
                max_retries,
            };
            let sim = SimulatorConfig {
                loss_rate: loss,
                corrupt_rate: corrupt,
                seed,
            };
            log::info!("Simulating {:?} with {link:?} over {sim:?}", payload);

            let report = run_exchange(payload.as_bytes(), &link, &sim, max_ticks)
                .context("failed to start exchange")?;

            println!("delivered:  {}", report.delivered);
            println!("retries:    {}", report.retries);
            println!("ticks:      {}", report.ticks);
            println!("accepted:   {}", report.frames.len());
            println!(
                "rejected:   {} checksum, {} end marker, {} oversize",
                report.rx_stats.checksum_failures,
                report.rx_stats.bad_end_markers,
                report.rx_stats.oversize_lengths
            );
            println!(
                "faults:     {} dropped, {} corrupted",
                report.faults.dropped, report.faults.corrupted
            );
            if let Some(err) = report.error {
                println!("error:      {err}");
            }
        }
        Mode::Encode { payload, capacity } => {
            let bytes = encode_frame(payload.as_bytes(), capacity)?;
            let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
            println!("{}", hex.join(" "));
        }
    }

    Ok(())
}
