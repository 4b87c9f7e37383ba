//! Statistics side-channel. The experiment harness that consumes these
//! records is out of scope; this module only owns the record shape and the
//! single append operation the sender calls once, at completion.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct TransferStats {
    pub window_size: usize,
    pub mss: usize,
    pub file_size: u64,
    pub total_segments: u32,
    pub elapsed_time: f64,
    pub timeout_count: u64,
    pub server: String,
    pub timestamp: u64,
}

/// Appends `record` as one JSON line to `path`, creating the file if needed.
/// A single buffered `write_all` keeps the append atomic at the line level
/// for a single writer; concurrent senders sharing the file are not
/// supported.
pub fn append_record(path: &Path, record: &TransferStats) -> Result<()> {
    let mut line = serde_json::to_string(record).expect("TransferStats is always serializable");
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::Stats(path.to_path_buf(), e))?;

    file.write_all(line.as_bytes())
        .map_err(|e| Error::Stats(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;

    #[test]
    fn append_writes_one_well_formed_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.jsonl");

        let record = TransferStats {
            window_size: 4,
            mss: 1000,
            file_size: 2500,
            total_segments: 3,
            elapsed_time: 0.01,
            timeout_count: 0,
            server: "127.0.0.1:9090".to_string(),
            timestamp: 0,
        };

        append_record(&path, &record).unwrap();
        append_record(&path, &record).unwrap();

        let contents = std::fs::read(&path).unwrap();
        let lines: Vec<_> = contents.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(parsed["window_size"], 4);
        assert_eq!(parsed["server"], "127.0.0.1:9090");
    }
}
