#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind UDP socket on {0}: {1}")]
    Bind(String, std::io::Error),

    #[error("failed to set socket timeout: {0}")]
    SetTimeout(std::io::Error),

    #[error("failed to resolve host {0}: {1}")]
    Resolve(String, std::io::Error),

    #[error("host {0} resolved to no addresses")]
    NoAddress(String),

    #[error("failed to open source file {0:?}: {1}")]
    OpenSource(std::path::PathBuf, std::io::Error),

    #[error("failed to read source file: {0}")]
    ReadSource(std::io::Error),

    #[error("failed to open sink file {0:?}: {1}")]
    OpenSink(std::path::PathBuf, std::io::Error),

    #[error("failed to write sink file: {0}")]
    WriteSink(std::io::Error),

    #[error("failed to flush sink file: {0}")]
    FlushSink(std::io::Error),

    #[error("socket send failed: {0}")]
    Send(std::io::Error),

    #[error("socket receive failed: {0}")]
    Recv(std::io::Error),

    #[error("failed to append statistics record to {0:?}: {1}")]
    Stats(std::path::PathBuf, std::io::Error),

    #[error("loss probability must be in [0, 1], got {0}")]
    InvalidLossProbability(f64),

    #[error("window size must be >= 1")]
    InvalidWindowSize,

    #[error("maximum segment size must be >= 1")]
    InvalidMss,
}

pub type Result<T> = std::result::Result<T, Error>;
