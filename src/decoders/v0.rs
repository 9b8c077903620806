use crate::anomaly_tracker::AnomalyTracker;
use crate::decode_config::DecodeConfig;
use crate::decoders::{DecodeContext, MsgDecoder};
use crate::input_dg::RawDatagram;
use crate::log_rate_limiter::LogRateLimiter;
use crate::monotonic_clock::{MonotonicClock, MonotonicClockImpl};
use crate::msg::{Msg, MsgRef};
use crate::msg_state_tracker::MsgStateTracker;
use crate::result::Result;
use anyhow::bail;
use bytes::{Buf, Bytes};
use slog::{debug, error};
use std::io::Cursor;
use std::sync::Arc;

/// Decoder of version 0 of the AnyPartition message.
///
/// Layout of the versioned part, all integers big-endian:
///
/// ```text
/// +-------+------------+-------+-----------+----------+-----+------------+-------+
/// | flags | topic size | topic | timestamp | key size | key | value size | value |
/// |  i16  |    i16     |       |    i64    |   i32    |     |    i32     |       |
/// +-------+------------+-------+-----------+----------+-----+------------+-------+
/// ```
pub struct V0Decoder {
    malformed_log_limiter: LogRateLimiter,
    bad_topic_log_limiter: LogRateLimiter,
    no_mem_log_limiter: LogRateLimiter,
}

impl V0Decoder {
    pub fn new(config: &DecodeConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClockImpl::new()))
    }

    pub fn with_clock(config: &DecodeConfig, clock: Arc<dyn MonotonicClock>) -> Self {
        V0Decoder {
            malformed_log_limiter: LogRateLimiter::with_clock(config.discard_log_window(), Arc::clone(&clock)),
            bad_topic_log_limiter: LogRateLimiter::with_clock(config.discard_log_window(), Arc::clone(&clock)),
            no_mem_log_limiter: LogRateLimiter::with_clock(config.discard_log_window(), clock),
        }
    }
}

impl MsgDecoder for V0Decoder {
    fn build_msg(&self, dg: &RawDatagram, ctx: &DecodeContext, no_log_discard: bool) -> Option<MsgRef> {
        V0InputDgReader {
            decoder: self,
            dg,
            buffer: Cursor::new(dg.versioned_part()),
            ctx,
            no_log_discard,
        }
        .build_msg()
    }
}

struct V0Fields<'a> {
    topic: &'a [u8],
    timestamp: i64,
    key: &'a [u8],
    value: &'a [u8],
}

/// Reads a single datagram, created anew for every call.
struct V0InputDgReader<'a> {
    decoder: &'a V0Decoder,
    dg: &'a RawDatagram<'a>,
    buffer: Cursor<&'a [u8]>,
    ctx: &'a DecodeContext<'a>,
    no_log_discard: bool,
}

impl<'a> V0InputDgReader<'a> {
    fn build_msg(mut self) -> Option<MsgRef> {
        let fields = match self.decode_fields() {
            Ok(fields) => fields,
            Err(e) => {
                self.ctx.anomaly_tracker.track_malformed_msg_discard(self.dg.bytes());
                if self.should_log(&self.decoder.malformed_log_limiter) {
                    error!(self.ctx.logger, "Discarding malformed AnyPartition v0 message: {}", e);
                }
                return None;
            }
        };

        let topic = match std::str::from_utf8(fields.topic) {
            Ok(topic) => topic,
            Err(e) => {
                self.ctx.anomaly_tracker.track_bad_topic_discard(self.dg.bytes());
                if self.should_log(&self.decoder.bad_topic_log_limiter) {
                    error!(self.ctx.logger, "Discarding AnyPartition v0 message with invalid topic: {}", e);
                }
                return None;
            }
        };

        let reservation = match self
            .ctx
            .pool
            .try_reserve(Msg::pool_size(topic, fields.key, fields.value))
        {
            Some(reservation) => reservation,
            None => {
                self.ctx.anomaly_tracker.track_no_mem_discard(self.dg.bytes());
                if self.should_log(&self.decoder.no_mem_log_limiter) {
                    error!(
                        self.ctx.logger,
                        "Discarding AnyPartition v0 message due to lack of buffer space";
                        "topic" => topic, "pool_used" => self.ctx.pool.used()
                    );
                }
                return None;
            }
        };

        let msg = Arc::new(Msg::new(
            topic.to_string(),
            fields.timestamp,
            Bytes::copy_from_slice(fields.key),
            Bytes::copy_from_slice(fields.value),
            reservation,
        ));
        self.ctx.msg_state_tracker.msg_enter_new(&msg);
        debug!(self.ctx.logger, "Decoded AnyPartition v0 message"; "msg" => format!("{:?}", msg));
        Some(msg)
    }

    fn should_log(&self, limiter: &LogRateLimiter) -> bool {
        !self.no_log_discard && limiter.test()
    }

    fn decode_fields(&mut self) -> Result<V0Fields<'a>> {
        self.decode_flags()?;
        let topic = self.decode_topic()?;
        let timestamp = self.decode_timestamp()?;
        let key = self.decode_sized_bytes("key")?;
        let value = self.decode_sized_bytes("value")?;
        if self.buffer.has_remaining() {
            bail!("{} unexpected bytes after message value", self.buffer.remaining())
        }
        Ok(V0Fields {
            topic,
            timestamp,
            key,
            value,
        })
    }

    fn decode_flags(&mut self) -> Result<i16> {
        if self.buffer.remaining() < std::mem::size_of::<i16>() {
            bail!("Not enough bytes to decode flags")
        }
        // no flags are defined in this version
        Ok(self.buffer.get_i16())
    }

    fn decode_topic(&mut self) -> Result<&'a [u8]> {
        if self.buffer.remaining() < std::mem::size_of::<i16>() {
            bail!("Not enough bytes to decode topic size")
        }
        let size = self.buffer.get_i16();
        if size <= 0 {
            bail!("Invalid topic size: {}", size)
        }
        self.decode_bytes(size as usize, "topic")
    }

    fn decode_timestamp(&mut self) -> Result<i64> {
        if self.buffer.remaining() < std::mem::size_of::<i64>() {
            bail!("Not enough bytes to decode timestamp")
        }
        Ok(self.buffer.get_i64())
    }

    fn decode_sized_bytes(&mut self, field: &str) -> Result<&'a [u8]> {
        if self.buffer.remaining() < std::mem::size_of::<i32>() {
            bail!("Not enough bytes to decode {} size", field)
        }
        let size = self.buffer.get_i32();
        if size < 0 {
            bail!("Invalid {} size: {}", field, size)
        }
        self.decode_bytes(size as usize, field)
    }

    fn decode_bytes(&mut self, size: usize, field: &str) -> Result<&'a [u8]> {
        if self.buffer.remaining() < size {
            bail!("Not enough bytes to decode {}: need {}, have {}", field, size, self.buffer.remaining())
        }
        let position = self.buffer.position() as usize;
        let data: &'a [u8] = *self.buffer.get_ref();
        let bytes = &data[position..position + size];
        self.buffer.advance(size);
        Ok(bytes)
    }
}
