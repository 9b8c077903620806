#![cfg(test)]

use crate::input_dg::{ApiVersion, API_KEY_ANY_PARTITION, HEADER_SIZE};
use bytes::BufMut;
use std::sync::{Arc, Mutex};

/// Builds AnyPartition datagram with `payload` as its versioned part.
pub(crate) fn any_partition_dg(api_version: ApiVersion, payload: &[u8]) -> Vec<u8> {
    let mut dg = Vec::with_capacity(HEADER_SIZE + payload.len());
    dg.put_i32((HEADER_SIZE + payload.len()) as i32);
    dg.put_i16(API_KEY_ANY_PARTITION);
    dg.put_i16(api_version);
    dg.put_slice(payload);
    dg
}

/// Builds versioned part of a V0 AnyPartition message.
pub(crate) fn v0_payload(topic: &str, timestamp: i64, key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.put_i16(0); // flags
    payload.put_i16(topic.len() as i16);
    payload.put_slice(topic.as_bytes());
    payload.put_i64(timestamp);
    payload.put_i32(key.len() as i32);
    payload.put_slice(key);
    payload.put_i32(value.len() as i32);
    payload.put_slice(value);
    payload
}

/// Drain remembering the message of every record logged through it.
#[derive(Clone, Default)]
pub(crate) struct CapturingDrain {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CapturingDrain {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    pub(crate) fn logger(&self) -> slog::Logger {
        slog::Logger::root(self.clone(), slog::o!())
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl slog::Drain for CapturingDrain {
    type Ok = ();
    type Err = slog::Never;

    fn log(&self, record: &slog::Record, _values: &slog::OwnedKVList) -> Result<Self::Ok, Self::Err> {
        self.messages.lock().unwrap().push(record.msg().to_string());
        Ok(())
    }
}
