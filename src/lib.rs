//! Decoding of producer datagrams into messages.
//!
//! A datagram starts with a fixed header naming its API key and API version. [`InputDgReader`] reads the header
//! and passes AnyPartition datagrams to [`AnyPartitionDispatcher`], which picks the decoder registered for the
//! API version in [`DecoderRegistry`].
//!
//! Datagrams that cannot be decoded never produce an error. They are reported to the [`AnomalyTracker`], counted,
//! and logged through a [`LogRateLimiter`] so that a producer sending garbage at full speed yields at most one log
//! line per window and log site.
//!
//! ```no_run
//! use input_dg::{AnomalyRecorder, DecodeConfig, DecodeContext, InputDgReader, MsgStateCounter, Pool};
//!
//! let config = DecodeConfig::default();
//! let reader = InputDgReader::new(&config);
//! let pool = Pool::new(config.pool_size);
//! let anomaly_tracker = AnomalyRecorder::new(config.anomaly_sample_size);
//! let msg_state_tracker = MsgStateCounter::new();
//! let logger = slog::Logger::root(slog::Discard, slog::o!());
//! let ctx = DecodeContext {
//!     pool: &pool,
//!     anomaly_tracker: &anomaly_tracker,
//!     msg_state_tracker: &msg_state_tracker,
//!     logger: &logger,
//! };
//!
//! let datagram: Vec<u8> = vec![];
//! if let Some(msg) = reader.build_msg(&datagram, &ctx, false) {
//!     println!("{:?}", msg);
//! }
//! ```

mod anomaly_tracker;
mod counter;
mod decode_config;
mod decoders;
mod dispatcher;
mod input_dg;
mod log_rate_limiter;
mod monotonic_clock;
mod msg;
mod msg_state_tracker;
mod pool;
mod result;
mod ututils;

pub use crate::anomaly_tracker::{AnomalyClass, AnomalyKind, AnomalyRecord, AnomalyRecorder, AnomalyTracker};
pub use crate::counter::Counter;
pub use crate::decode_config::DecodeConfig;
pub use crate::decoders::v0::V0Decoder;
pub use crate::decoders::{DecodeContext, DecoderRegistry, MsgDecoder};
pub use crate::dispatcher::{AnyPartitionDispatcher, DispatchCounters};
pub use crate::input_dg::{
    ApiVersion, InputDgCounters, InputDgHeader, InputDgReader, RawDatagram, API_KEY_ANY_PARTITION, HEADER_SIZE,
};
pub use crate::log_rate_limiter::LogRateLimiter;
pub use crate::monotonic_clock::{ManualClock, MonotonicClock, MonotonicClockImpl};
pub use crate::msg::{Msg, MsgRef};
pub use crate::msg_state_tracker::{MsgStateCounter, MsgStateTracker};
pub use crate::pool::{Pool, PoolReservation};
