//! PAYLINK demo tool.
//!
//! Exercises both roles of the QR handshake from a terminal: `show` runs the
//! payee's rotating payload against real one-second ticks, `scan` decodes a
//! captured payload string as the payer would. QR rendering and camera
//! capture are out of scope; the payload travels as a plain string here.

use std::io::Write;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use paylink_crypto::SharedSecret;
use paylink_protocol::{EncoderState, PayloadDecoder, PayloadEncoder, ScanResult};

/// PAYLINK QR handshake demo.
#[derive(Parser, Debug)]
#[command(name = "paylink")]
#[command(version, about, long_about = None)]
struct Args {
    /// Shared secret passphrase (must match on both devices)
    #[arg(long, env = "PAYLINK_SECRET", hide_env_values = true)]
    secret: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PAYLINK_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Display a rotating payment payload for the given account
    Show {
        /// Receiving account identifier
        #[arg(short, long, env = "PAYLINK_ACCOUNT")]
        account: String,
    },
    /// Decode one captured payload string
    Scan {
        /// Armored payload captured from a QR code
        payload: String,
    },
}

fn setup_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    Ok(())
}

/// Run the payee role until Ctrl-C.
async fn show(secret: &SharedSecret, account: &str) -> Result<()> {
    let mut encoder = PayloadEncoder::new(secret);
    encoder.refresh(account, Utc::now());
    print_state(&encoder);

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
    interval.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = interval.tick() => {
                let rotated = {
                    let before = encoder.payload().map(str::to_string);
                    encoder.tick(account, Utc::now());
                    encoder.payload().map(str::to_string) != before
                };
                if rotated {
                    println!();
                    print_state(&encoder);
                } else {
                    print!("\rnext refresh in {:>2}s ", encoder.countdown_secs());
                    std::io::stdout().flush()?;
                }
            }
        }
    }

    // Dropping the interval cancels the scheduled ticks; the encoder itself
    // holds no resources.
    println!();
    info!("encoder stopped");
    Ok(())
}

fn print_state(encoder: &PayloadEncoder) {
    match encoder.state() {
        EncoderState::Live { payload, time_created } => {
            println!("payload (encoded {time_created}):");
            println!("{payload}");
        }
        EncoderState::Unavailable => {
            println!("payload unavailable, waiting...");
        }
    }
}

/// Run the payer role for a single capture.
fn scan(secret: &SharedSecret, payload: &str) -> Result<()> {
    let mut decoder = PayloadDecoder::new(secret);

    match decoder.handle_scan(payload, Utc::now()) {
        Some(ScanResult::Accepted { receiver_account_no }) => {
            println!("accepted: pay to account {receiver_account_no}");
            Ok(())
        }
        Some(ScanResult::RejectedExpired) => bail!("payload expired, ask the payee to refresh"),
        Some(ScanResult::RejectedForeignApp) => bail!("QR code belongs to a different application"),
        Some(ScanResult::RejectedMalformed) => bail!("not a valid payment QR code"),
        // A fresh decoder is always armed
        None => unreachable!("fresh decoder cannot be cooling down"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level)?;

    let secret = SharedSecret::new(args.secret).context("invalid shared secret")?;

    match args.command {
        Command::Show { account } => show(&secret, &account).await,
        Command::Scan { payload } => scan(&secret, &payload),
    }
}
