use std::time::Duration;
use structopt::StructOpt;

/// Configuration for decoding producer datagrams.
#[derive(StructOpt, Debug, Clone)]
pub struct DecodeConfig {
    /// Number of seconds between two log lines reporting the same kind of discard.
    ///
    /// Every log site has its own window, so a burst of one kind of bad input does not hide another.
    #[structopt(long = "discard-log-interval", default_value = "30")]
    pub discard_log_interval: u64,

    /// Number of bytes available for decoded messages.
    #[structopt(long = "pool-size", default_value = "67108864")]
    pub pool_size: usize,

    /// Number of discarded datagrams kept for inspection.
    #[structopt(long = "anomaly-sample-size", default_value = "100")]
    pub anomaly_sample_size: usize,
}

impl DecodeConfig {
    pub fn discard_log_window(&self) -> Duration {
        Duration::from_secs(self.discard_log_interval)
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            discard_log_interval: 30,
            pool_size: 64 * 1024 * 1024,
            anomaly_sample_size: 100,
        }
    }
}
