use crate::anomaly_tracker::AnomalyTracker;
use crate::counter::Counter;
use crate::decode_config::DecodeConfig;
use crate::decoders::{DecodeContext, DecoderRegistry};
use crate::dispatcher::AnyPartitionDispatcher;
use crate::log_rate_limiter::LogRateLimiter;
use crate::monotonic_clock::{MonotonicClock, MonotonicClockImpl};
use crate::msg::MsgRef;
use crate::result::Result;
use anyhow::bail;
use bytes::Buf;
use slog::error;
use std::ops::Range;
use std::sync::Arc;

/// Wire-format revision of the versioned part of a datagram.
pub type ApiVersion = i16;

/// API key of messages that may go to any partition of their topic.
pub const API_KEY_ANY_PARTITION: i16 = 256;

/// Size of the header preceding the versioned part: size (i32), API key (i16), API version (i16).
pub const HEADER_SIZE: usize = 8;

/// Datagram received from a producer together with the bounds of its versioned part.
#[derive(Debug, Clone)]
pub struct RawDatagram<'a> {
    bytes: &'a [u8],
    versioned_part: Range<usize>,
}

impl<'a> RawDatagram<'a> {
    /// Wraps `bytes` whose versioned part spans `versioned_part`.
    ///
    /// # Panics
    ///
    /// If the header before `versioned_part` is empty, `versioned_part` is empty or it does not fit in `bytes`.
    pub fn new(bytes: &'a [u8], versioned_part: Range<usize>) -> Self {
        assert!(versioned_part.start > 0, "Datagram header must not be empty");
        assert!(
            versioned_part.end > versioned_part.start,
            "Versioned part of datagram must not be empty"
        );
        assert!(
            versioned_part.end <= bytes.len(),
            "Versioned part {:?} exceeds datagram of {} bytes",
            versioned_part,
            bytes.len()
        );
        RawDatagram { bytes, versioned_part }
    }

    /// Returns the whole datagram.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns the versioned part.
    pub fn versioned_part(&self) -> &'a [u8] {
        &self.bytes[self.versioned_part.clone()]
    }

    pub fn versioned_part_range(&self) -> Range<usize> {
        self.versioned_part.clone()
    }
}

/// Fixed header found at the beginning of every producer datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputDgHeader {
    pub size: i32,
    pub api_key: i16,
    pub api_version: ApiVersion,
}

impl InputDgHeader {
    /// Reads the header of `dg`, checking that the declared size matches and a versioned part follows.
    pub fn parse(dg: &[u8]) -> Result<Self> {
        if dg.len() < HEADER_SIZE {
            bail!("Datagram of {} bytes is too short to contain header", dg.len())
        }
        let mut buffer = dg;
        let header = InputDgHeader {
            size: buffer.get_i32(),
            api_key: buffer.get_i16(),
            api_version: buffer.get_i16(),
        };
        if header.size < 0 || header.size as usize != dg.len() {
            bail!("Declared size {} does not match datagram size {}", header.size, dg.len())
        }
        if dg.len() == HEADER_SIZE {
            bail!("Datagram has no versioned part")
        }
        Ok(header)
    }
}

/// Counters of datagrams rejected before version dispatch.
#[derive(Debug)]
pub struct InputDgCounters {
    pub discard_malformed: Counter,
    pub discard_unsupported_api_key: Counter,
}

impl InputDgCounters {
    fn new() -> Self {
        InputDgCounters {
            discard_malformed: Counter::new("input_agent_discard_malformed_msg"),
            discard_unsupported_api_key: Counter::new("input_agent_discard_unsupported_api_key"),
        }
    }
}

/// Entry point for raw producer datagrams: reads the header and hands the datagram to the reader for its API key.
pub struct InputDgReader {
    any_partition: AnyPartitionDispatcher,
    counters: InputDgCounters,
    malformed_log_limiter: LogRateLimiter,
    unsupported_api_key_log_limiter: LogRateLimiter,
}

impl InputDgReader {
    /// Creates reader with all built-in decoders registered.
    pub fn new(config: &DecodeConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClockImpl::new()))
    }

    /// Same as [`new`](InputDgReader::new) but the discard log windows are measured with `clock`.
    pub fn with_clock(config: &DecodeConfig, clock: Arc<dyn MonotonicClock>) -> Self {
        let registry = DecoderRegistry::with_default_decoders(config, Arc::clone(&clock));
        InputDgReader {
            any_partition: AnyPartitionDispatcher::with_clock(registry, config, Arc::clone(&clock)),
            counters: InputDgCounters::new(),
            malformed_log_limiter: LogRateLimiter::with_clock(config.discard_log_window(), Arc::clone(&clock)),
            unsupported_api_key_log_limiter: LogRateLimiter::with_clock(config.discard_log_window(), clock),
        }
    }

    /// Builds message from `dg`, or returns `None` after recording why it was discarded.
    pub fn build_msg(&self, dg: &[u8], ctx: &DecodeContext, no_log_discard: bool) -> Option<MsgRef> {
        let header = match InputDgHeader::parse(dg) {
            Ok(header) => header,
            Err(e) => {
                ctx.anomaly_tracker.track_malformed_dg_discard(dg);
                self.counters.discard_malformed.increment();
                if !no_log_discard && self.malformed_log_limiter.test() {
                    error!(ctx.logger, "Discarding malformed message: {}", e; "size" => dg.len());
                }
                return None;
            }
        };

        match header.api_key {
            API_KEY_ANY_PARTITION => self.any_partition.build_msg(
                &RawDatagram::new(dg, HEADER_SIZE..dg.len()),
                header.api_version,
                ctx,
                no_log_discard,
            ),
            api_key => {
                ctx.anomaly_tracker.track_unsupported_api_key_discard(dg, api_key);
                self.counters.discard_unsupported_api_key.increment();
                if !no_log_discard && self.unsupported_api_key_log_limiter.test() {
                    error!(ctx.logger, "Discarding message with unsupported API key: {}", api_key);
                }
                None
            }
        }
    }

    pub fn counters(&self) -> &InputDgCounters {
        &self.counters
    }

    /// Returns the dispatcher handling AnyPartition messages.
    pub fn any_partition(&self) -> &AnyPartitionDispatcher {
        &self.any_partition
    }
}
