use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gbn_ftp::receiver::{self, ReceiverConfig};

/// Go-Back-N file receiver: accepts a reliable file transfer over UDP.
#[derive(Parser, Debug)]
#[command(name = "receiver", version, about)]
struct Args {
    /// UDP port to listen on.
    port: u16,
    /// Path of the file to write the received payload to (truncated at open).
    file_path: PathBuf,
    /// Probability, in [0, 1], of simulating loss of an incoming data segment.
    loss_probability: f64,
}

/// SIGINT's conventional shell exit status.
const SIGINT_EXIT_CODE: u8 = 130;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    if !(0.0..=1.0).contains(&args.loss_probability) {
        eprintln!("loss probability must be in [0, 1], got {}", args.loss_probability);
        return ExitCode::FAILURE;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = shutdown.clone();
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_handler = interrupted.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        interrupted_handler.store(true, Ordering::SeqCst);
        shutdown_handler.store(true, Ordering::SeqCst);
    }) {
        eprintln!("failed to install interrupt handler: {e}");
        return ExitCode::FAILURE;
    }

    let config = ReceiverConfig {
        port: args.port,
        sink_path: args.file_path,
        loss_probability: args.loss_probability,
    };

    match receiver::run(config, shutdown) {
        Ok(_) if interrupted.load(Ordering::SeqCst) => ExitCode::from(SIGINT_EXIT_CODE),
        Ok(bytes) => {
            println!("Server closed. {bytes} bytes written.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
