use bytes::BufMut;
use input_dg::{AnomalyRecorder, DecodeContext, MsgStateCounter, Pool, API_KEY_ANY_PARTITION, HEADER_SIZE};
use std::sync::{Arc, Mutex};

pub fn any_partition_dg(api_version: i16, payload: &[u8]) -> Vec<u8> {
    let mut dg = Vec::with_capacity(HEADER_SIZE + payload.len());
    dg.put_i32((HEADER_SIZE + payload.len()) as i32);
    dg.put_i16(API_KEY_ANY_PARTITION);
    dg.put_i16(api_version);
    dg.put_slice(payload);
    dg
}

pub fn v0_payload(topic: &str, timestamp: i64, key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.put_i16(0);
    payload.put_i16(topic.len() as i16);
    payload.put_slice(topic.as_bytes());
    payload.put_i64(timestamp);
    payload.put_i32(key.len() as i32);
    payload.put_slice(key);
    payload.put_i32(value.len() as i32);
    payload.put_slice(value);
    payload
}

/// Drain counting lines that report discarded datagrams.
#[derive(Clone, Default)]
pub struct CapturingDrain {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CapturingDrain {
    pub fn logger(&self) -> slog::Logger {
        slog::Logger::root(self.clone(), slog::o!())
    }

    pub fn discard_lines(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.starts_with("Discarding"))
            .cloned()
            .collect()
    }
}

impl slog::Drain for CapturingDrain {
    type Ok = ();
    type Err = slog::Never;

    fn log(&self, record: &slog::Record, _values: &slog::OwnedKVList) -> Result<(), slog::Never> {
        self.messages.lock().unwrap().push(record.msg().to_string());
        Ok(())
    }
}

/// Collaborators shared by all workers decoding datagrams.
pub struct Collaborators {
    pub pool: Pool,
    pub anomalies: AnomalyRecorder,
    pub msg_states: MsgStateCounter,
    pub drain: CapturingDrain,
    pub logger: slog::Logger,
}

impl Collaborators {
    pub fn new() -> Self {
        let drain = CapturingDrain::default();
        Collaborators {
            pool: Pool::new(1024 * 1024),
            anomalies: AnomalyRecorder::new(1000),
            msg_states: MsgStateCounter::new(),
            logger: drain.logger(),
            drain,
        }
    }

    pub fn ctx(&self) -> DecodeContext {
        DecodeContext {
            pool: &self.pool,
            anomaly_tracker: &self.anomalies,
            msg_state_tracker: &self.msg_states,
            logger: &self.logger,
        }
    }
}
