use crate::anomaly_tracker::AnomalyTracker;
use crate::decode_config::DecodeConfig;
use crate::input_dg::{ApiVersion, RawDatagram};
use crate::monotonic_clock::MonotonicClock;
use crate::msg::MsgRef;
use crate::msg_state_tracker::MsgStateTracker;
use crate::pool::Pool;
use crate::result::Result;
use anyhow::bail;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub mod v0;

/// Collaborators a decoder needs while building a message.
///
/// All of them are borrowed for the duration of a single call.
#[derive(Clone, Copy)]
pub struct DecodeContext<'a> {
    pub pool: &'a Pool,
    pub anomaly_tracker: &'a dyn AnomalyTracker,
    pub msg_state_tracker: &'a dyn MsgStateTracker,
    pub logger: &'a slog::Logger,
}

/// Decodes the versioned part of a datagram written in one revision of the wire format.
pub trait MsgDecoder: Send + Sync {
    /// Builds message from `dg`.
    ///
    /// Returns `None` if the datagram is discarded, in which case the decoder has already reported the reason to
    /// `ctx.anomaly_tracker`. Log lines about the discard are skipped when `no_log_discard` is set.
    fn build_msg(&self, dg: &RawDatagram, ctx: &DecodeContext, no_log_discard: bool) -> Option<MsgRef>;
}

/// Decoders of all supported API versions.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: HashMap<ApiVersion, Box<dyn MsgDecoder>>,
}

impl DecoderRegistry {
    /// Creates registry with no decoders.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates registry with a decoder for every built-in API version.
    pub fn with_default_decoders(config: &DecodeConfig, clock: Arc<dyn MonotonicClock>) -> Self {
        let mut registry = Self::new();
        registry.decoders.insert(0, Box::new(v0::V0Decoder::with_clock(config, clock)));
        registry
    }

    /// Adds `decoder` for `api_version`.
    ///
    /// Fails if a decoder for this version is already registered.
    pub fn register<D>(&mut self, api_version: ApiVersion, decoder: D) -> Result<()>
    where
        D: MsgDecoder + 'static,
    {
        if self.decoders.contains_key(&api_version) {
            bail!("Decoder for API version {} is already registered", api_version)
        }
        self.decoders.insert(api_version, Box::new(decoder));
        Ok(())
    }

    /// Returns decoder for `api_version`, if it is supported.
    pub fn get(&self, api_version: ApiVersion) -> Option<&dyn MsgDecoder> {
        self.decoders.get(&api_version).map(|decoder| &**decoder)
    }

    /// Returns supported API versions in ascending order.
    pub fn supported_versions(&self) -> Vec<ApiVersion> {
        let mut versions = self.decoders.keys().cloned().collect::<Vec<_>>();
        versions.sort();
        versions
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DecoderRegistry {{ versions: {:?} }}", self.supported_versions())
    }
}
