use crate::pool::PoolReservation;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a decoded message.
pub type MsgRef = Arc<Msg>;

/// Message decoded from a producer datagram, ready to be routed to its topic.
pub struct Msg {
    topic: String,
    timestamp: i64,
    key: Bytes,
    value: Bytes,
    _reservation: PoolReservation,
}

impl Msg {
    pub(crate) fn new(topic: String, timestamp: i64, key: Bytes, value: Bytes, reservation: PoolReservation) -> Self {
        Msg {
            topic,
            timestamp,
            key,
            value,
            _reservation: reservation,
        }
    }

    /// Number of pool bytes a message with these fields occupies.
    pub(crate) fn pool_size(topic: &str, key: &[u8], value: &[u8]) -> usize {
        topic.len() + key.len() + value.len()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Producer timestamp in milliseconds since the epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }
}

impl fmt::Debug for Msg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Msg {{ topic: {:?}, timestamp: {}, key: {} bytes, value: {} bytes }}",
            self.topic,
            self.timestamp,
            self.key.len(),
            self.value.len()
        )
    }
}
