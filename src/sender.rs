//! Go-Back-N client: sliding-window transmission with cumulative-ACK
//! processing and timeout-driven retransmission.

use std::io::Read;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::segment::Segment;
use crate::stats::{append_record, TransferStats};

const RECV_TIMEOUT: Duration = Duration::from_secs(1);
const ACK_BUF_LEN: usize = 1024;

/// A ring buffer of in-flight segment bytes, indexed by `seq % capacity`.
/// Because the sender never allows more than `window_size` segments
/// outstanding, this is always large enough to hold every key in
/// `[base, next_seq)` without collision.
struct WindowBuffer {
    slots: Vec<Option<Vec<u8>>>,
}

impl WindowBuffer {
    fn new(capacity: usize) -> Self {
        WindowBuffer { slots: vec![None; capacity] }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn insert(&mut self, seq: u32, bytes: Vec<u8>) {
        let idx = (seq as usize) % self.capacity();
        self.slots[idx] = Some(bytes);
    }

    fn get(&self, seq: u32) -> Option<&[u8]> {
        let idx = (seq as usize) % self.capacity();
        self.slots[idx].as_deref()
    }

    fn remove(&mut self, seq: u32) {
        let idx = (seq as usize) % self.capacity();
        self.slots[idx] = None;
    }
}

pub struct SenderConfig {
    pub server: SocketAddr,
    pub window_size: usize,
    pub mss: usize,
    pub stats_path: PathBuf,
}

/// Reads up to `mss` bytes from `reader`, looping until either `mss` bytes
/// have been collected or end-of-stream is reached. Returns a short (or
/// empty) vector only at end-of-stream.
fn read_chunk<R: Read>(reader: &mut R, mss: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; mss];
    let mut filled = 0;
    while filled < mss {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

/// Runs the Go-Back-N sender to completion: reads `source` in `mss`-sized
/// chunks, transmits to `config.server`, and returns once every segment has
/// been cumulatively acknowledged. Appends one statistics record to
/// `config.stats_path` on success.
pub fn run<R: Read>(config: SenderConfig, mut source: R, host: &str, port: u16) -> Result<TransferStats> {
    if config.window_size == 0 {
        return Err(Error::InvalidWindowSize);
    }
    if config.mss == 0 {
        return Err(Error::InvalidMss);
    }

    let socket = UdpSocket::bind("0.0.0.0:0")
        .map_err(|e| Error::Bind("0.0.0.0:0".to_string(), e))?;
    socket
        .set_read_timeout(Some(RECV_TIMEOUT))
        .map_err(Error::SetTimeout)?;

    let start = Instant::now();
    let mut window = WindowBuffer::new(config.window_size);
    let mut base: u32 = 0;
    let mut next_seq: u32 = 0;
    let mut total_segments: Option<u32> = None;
    let mut timeout_count: u64 = 0;
    let mut file_size: u64 = 0;
    let mut read_buf = [0u8; ACK_BUF_LEN];

    loop {
        // Fill: top up the window with new segments while there's room and
        // (as far as we know) more data to read.
        while next_seq < base + config.window_size as u32
            && total_segments.map_or(true, |ts| next_seq < ts)
        {
            let chunk = read_chunk(&mut source, config.mss).map_err(Error::ReadSource)?;
            if chunk.is_empty() {
                total_segments = Some(next_seq);
                break;
            }

            file_size += chunk.len() as u64;
            let seg = Segment::data(next_seq, chunk);
            let bytes = seg.encode();
            socket
                .send_to(&bytes, config.server)
                .map_err(Error::Send)?;
            window.insert(next_seq, bytes);
            next_seq += 1;
        }

        // Termination: every segment (if we know the total) has been acked.
        if total_segments == Some(base) {
            break;
        }

        match socket.recv_from(&mut read_buf) {
            Ok((n, _)) => {
                let Some(Segment::Ack { seq: ack_seq }) = Segment::decode(&read_buf[..n]) else {
                    continue;
                };
                if !is_well_formed_ack(&read_buf[..n]) {
                    continue;
                }
                if ack_seq < base {
                    continue; // stale/duplicate cumulative ACK
                }
                let mut new_base = ack_seq + 1;
                if let Some(ts) = total_segments {
                    new_base = new_base.min(ts);
                }
                for seq in base..new_base {
                    window.remove(seq);
                }
                base = new_base;
            }
            Err(e) if is_timeout(&e) => {
                timeout_count += 1;
                warn!("Timeout, sequence number = {}", base);
                for seq in base..next_seq {
                    if let Some(bytes) = window.get(seq) {
                        socket.send_to(bytes, config.server).map_err(Error::Send)?;
                    }
                }
            }
            Err(e) => return Err(Error::Recv(e)),
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let total_segments = total_segments.unwrap_or(0);

    info!(
        "Transfer complete: {} segments, {:.3}s, {} timeouts",
        total_segments, elapsed, timeout_count
    );

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let record = TransferStats {
        window_size: config.window_size,
        mss: config.mss,
        file_size,
        total_segments,
        elapsed_time: elapsed,
        timeout_count,
        server: format!("{}:{}", host, port),
        timestamp,
    };

    append_record(&config.stats_path, &record)?;

    Ok(record)
}

/// An ACK must have a zero checksum field; `Segment::decode` already
/// guarantees the type, so only the checksum field needs rechecking here.
fn is_well_formed_ack(bytes: &[u8]) -> bool {
    bytes.len() >= crate::segment::HEADER_LEN && bytes[4] == 0 && bytes[5] == 0
}

/// Resolves `host:port` to a single `SocketAddr`. Fatal on resolution
/// failure or an empty address list.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let target = format!("{host}:{port}");
    let mut addrs = target
        .to_socket_addrs()
        .map_err(|e| Error::Resolve(target.clone(), e))?;
    addrs.next().ok_or(Error::NoAddress(target))
}

pub fn validate_source_path(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|e| Error::OpenSource(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_buffer_tracks_exactly_the_outstanding_range() {
        let mut wb = WindowBuffer::new(4);
        for seq in 0..4u32 {
            wb.insert(seq, vec![seq as u8]);
        }
        for seq in 0..4u32 {
            assert!(wb.get(seq).is_some());
        }
        wb.remove(0);
        wb.remove(1);
        assert!(wb.get(0).is_none());
        assert!(wb.get(1).is_none());
        assert!(wb.get(2).is_some());
        assert!(wb.get(3).is_some());
    }

    #[test]
    fn read_chunk_splits_exact_and_short_last_chunk() {
        let data = b"abcdefg".to_vec();
        let mut cursor = std::io::Cursor::new(data);
        let first = read_chunk(&mut cursor, 3).unwrap();
        assert_eq!(first, b"abc");
        let second = read_chunk(&mut cursor, 3).unwrap();
        assert_eq!(second, b"def");
        let third = read_chunk(&mut cursor, 3).unwrap();
        assert_eq!(third, b"g");
        let fourth = read_chunk(&mut cursor, 3).unwrap();
        assert!(fourth.is_empty());
    }

    #[test]
    fn empty_source_transfers_zero_segments() {
        let dir = tempfile::tempdir().unwrap();
        let stats_path = dir.path().join("stats.jsonl");

        // Bind a throwaway receiver so send_to never errors, then immediately
        // drop it; the sender must not wait on any ACK because there are no
        // segments to acknowledge.
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = receiver.local_addr().unwrap();

        let config = SenderConfig {
            server: addr,
            window_size: 1,
            mss: 500,
            stats_path,
        };

        let record = run(config, std::io::Cursor::new(Vec::new()), "127.0.0.1", addr.port()).unwrap();
        assert_eq!(record.total_segments, 0);
        assert_eq!(record.file_size, 0);
        assert_eq!(record.timeout_count, 0);
    }
}
