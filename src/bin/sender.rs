use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gbn_ftp::sender::{self, SenderConfig};

/// Go-Back-N file sender: reliably delivers a file to a receiver over UDP.
#[derive(Parser, Debug)]
#[command(name = "sender", version, about)]
struct Args {
    /// Receiver hostname or IP address.
    server_host: String,
    /// Receiver UDP port.
    server_port: u16,
    /// Path of the file to send.
    file_path: PathBuf,
    /// Sliding window size, in segments.
    window_size: usize,
    /// Maximum segment size, in payload bytes.
    mss: usize,
    /// Path to append one JSON statistics line to on completion.
    #[arg(long, default_value = "transfer_stats.jsonl")]
    stats_path: PathBuf,
}

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

    let file = match sender::validate_source_path(&args.file_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let dest = match sender::resolve(&args.server_host, args.server_port) {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let config = SenderConfig {
        server: dest,
        window_size: args.window_size,
        mss: args.mss,
        stats_path: args.stats_path,
    };

    match sender::run(config, BufReader::new(file), &args.server_host, args.server_port) {
        Ok(stats) => {
            println!(
                "Transfer complete: {} segments in {:.3}s, {} timeouts",
                stats.total_segments, stats.elapsed_time, stats.timeout_count
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
