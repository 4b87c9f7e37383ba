//! Go-Back-N server: in-order acceptance with cumulative-ACK emission and a
//! probabilistic artificial loss service.

use std::io::Write;
use std::net::UdpSocket;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::info;

use crate::error::{Error, Result};
use crate::segment::Segment;

const RECV_TIMEOUT: Duration = Duration::from_secs(1);
const IDLE_SHUTDOWN: Duration = Duration::from_secs(30);
const RECV_BUF_LEN: usize = 65535;

pub struct ReceiverConfig {
    pub port: u16,
    pub sink_path: PathBuf,
    pub loss_probability: f64,
}

/// Runs the Go-Back-N receiver until `shutdown` is set (interactive
/// interrupt) or the idle-shutdown heuristic fires.
pub fn run(config: ReceiverConfig, shutdown: Arc<AtomicBool>) -> Result<u64> {
    if !(0.0..=1.0).contains(&config.loss_probability) {
        return Err(Error::InvalidLossProbability(config.loss_probability));
    }

    let socket = UdpSocket::bind(("0.0.0.0", config.port))
        .map_err(|e| Error::Bind(format!("0.0.0.0:{}", config.port), e))?;
    socket
        .set_read_timeout(Some(RECV_TIMEOUT))
        .map_err(Error::SetTimeout)?;

    let mut sink = std::fs::File::create(&config.sink_path)
        .map_err(|e| Error::OpenSink(config.sink_path.clone(), e))?;

    info!("listening on port {}", config.port);

    let mut expected_seq: u32 = 0;
    let mut received_any = false;
    let mut last_packet_at = Instant::now();
    let mut buf = [0u8; RECV_BUF_LEN];
    let mut delivered_bytes: u64 = 0;
    let mut rng = rand::thread_rng();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            sink.flush().map_err(Error::FlushSink)?;
            info!("interrupted, shutting down");
            return Ok(delivered_bytes);
        }

        let (n, peer) = match socket.recv_from(&mut buf) {
            Ok(v) => v,
            Err(e) if is_timeout(&e) => {
                sink.flush().map_err(Error::FlushSink)?;
                if received_any && last_packet_at.elapsed() > IDLE_SHUTDOWN {
                    info!("no data received for {:?}, transfer complete", IDLE_SHUTDOWN);
                    return Ok(delivered_bytes);
                }
                continue;
            }
            Err(e) => return Err(Error::Recv(e)),
        };

        let Some(Segment::Data { seq, checksum: recv_checksum, payload }) =
            Segment::decode(&buf[..n])
        else {
            continue;
        };

        received_any = true;
        last_packet_at = Instant::now();

        // Loss service runs after framing validation but before the
        // sequence/checksum checks, so a dropped packet never influences
        // receiver state.
        let r: f64 = rng.gen_range(0.0..1.0);
        if r <= config.loss_probability {
            info!("Packet loss, sequence number = {}", seq);
            continue;
        }

        let computed = crate::segment::checksum(&payload);
        if seq == expected_seq && computed == recv_checksum {
            sink.write_all(&payload).map_err(Error::WriteSink)?;
            delivered_bytes += payload.len() as u64;

            let ack = Segment::ack(expected_seq).encode();
            socket.send_to(&ack, peer).map_err(Error::Send)?;

            expected_seq += 1;
        }
        // Out-of-sequence or checksum-invalid: silently discarded, no ACK.
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

pub fn validate_sink_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(Error::OpenSink(
                path.to_path_buf(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "parent directory missing"),
            ));
        }
    }
    Ok(())
}
