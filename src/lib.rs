//! Go-Back-N ARQ reliable file transfer over UDP: a sender that slices a
//! byte stream into fixed-size segments and drives a sliding window with
//! cumulative-ACK processing and timeout-driven retransmission, and a
//! receiver that accepts strictly in-order segments behind a simulated
//! packet-loss service.

pub mod error;
pub mod receiver;
pub mod segment;
pub mod sender;
pub mod stats;

pub use error::{Error, Result};
