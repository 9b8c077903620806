use crate::anomaly_tracker::AnomalyTracker;
use crate::counter::Counter;
use crate::decode_config::DecodeConfig;
use crate::decoders::{DecodeContext, DecoderRegistry, MsgDecoder};
use crate::input_dg::{ApiVersion, RawDatagram};
use crate::log_rate_limiter::LogRateLimiter;
use crate::monotonic_clock::{MonotonicClock, MonotonicClockImpl};
use crate::msg::MsgRef;
use slog::error;
use std::sync::Arc;

/// Counters maintained by [`AnyPartitionDispatcher`].
#[derive(Debug)]
pub struct DispatchCounters {
    /// Every datagram handed to the dispatcher, whatever the outcome.
    pub process_any_partition_msg: Counter,
    /// Datagrams discarded because no decoder handles their API version.
    pub discard_unsupported_api_version: Counter,
}

impl DispatchCounters {
    fn new() -> Self {
        DispatchCounters {
            process_any_partition_msg: Counter::new("input_agent_process_any_partition_msg"),
            discard_unsupported_api_version: Counter::new(
                "input_agent_discard_any_partition_msg_unsupported_api_version",
            ),
        }
    }
}

/// Routes AnyPartition datagrams to the decoder of their API version.
///
/// Datagrams of a version with no decoder are discarded: the anomaly tracker is told about them, they are counted,
/// and at most one log line per `discard_log_interval` reports them.
pub struct AnyPartitionDispatcher {
    registry: DecoderRegistry,
    counters: DispatchCounters,
    discard_log_limiter: LogRateLimiter,
}

impl AnyPartitionDispatcher {
    pub fn new(registry: DecoderRegistry, config: &DecodeConfig) -> Self {
        Self::with_clock(registry, config, Arc::new(MonotonicClockImpl::new()))
    }

    pub fn with_clock(registry: DecoderRegistry, config: &DecodeConfig, clock: Arc<dyn MonotonicClock>) -> Self {
        AnyPartitionDispatcher {
            registry,
            counters: DispatchCounters::new(),
            discard_log_limiter: LogRateLimiter::with_clock(config.discard_log_window(), clock),
        }
    }

    /// Builds message from the versioned part of `dg`, written in `api_version` of the wire format.
    ///
    /// Returns exactly what the version's decoder returns. Returns `None` if the version is not supported.
    pub fn build_msg(
        &self,
        dg: &RawDatagram,
        api_version: ApiVersion,
        ctx: &DecodeContext,
        no_log_discard: bool,
    ) -> Option<MsgRef> {
        self.counters.process_any_partition_msg.increment();

        match self.registry.get(api_version) {
            Some(decoder) => decoder.build_msg(dg, ctx, no_log_discard),
            None => {
                self.discard_unsupported_version(dg, api_version, ctx, no_log_discard);
                None
            }
        }
    }

    fn discard_unsupported_version(
        &self,
        dg: &RawDatagram,
        api_version: ApiVersion,
        ctx: &DecodeContext,
        no_log_discard: bool,
    ) {
        ctx.anomaly_tracker
            .track_unsupported_msg_version_discard(dg.bytes(), api_version);
        self.counters.discard_unsupported_api_version.increment();

        if !no_log_discard && self.discard_log_limiter.test() {
            error!(
                ctx.logger,
                "Discarding AnyPartition message with unsupported API version: {}", api_version;
                "api_version" => api_version
            );
        }
    }

    pub fn counters(&self) -> &DispatchCounters {
        &self.counters
    }

    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }
}
