use crate::input_dg::ApiVersion;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Reason a datagram was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// The datagram header could not be read.
    MalformedDg,
    /// The header names an API key with no reader.
    UnsupportedApiKey(i16),
    /// No decoder is registered for the API version.
    UnsupportedMsgVersion(ApiVersion),
    /// The versioned part is truncated, has invalid sizes or trailing bytes.
    MalformedMsg,
    /// The topic is not valid UTF-8.
    BadTopic,
    /// The message pool could not hold the message.
    NoMem,
}

/// [`AnomalyKind`] without its payload, used as a counting key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnomalyClass {
    MalformedDg,
    UnsupportedApiKey,
    UnsupportedMsgVersion,
    MalformedMsg,
    BadTopic,
    NoMem,
}

impl AnomalyKind {
    pub fn class(&self) -> AnomalyClass {
        match self {
            AnomalyKind::MalformedDg => AnomalyClass::MalformedDg,
            AnomalyKind::UnsupportedApiKey(_) => AnomalyClass::UnsupportedApiKey,
            AnomalyKind::UnsupportedMsgVersion(_) => AnomalyClass::UnsupportedMsgVersion,
            AnomalyKind::MalformedMsg => AnomalyClass::MalformedMsg,
            AnomalyKind::BadTopic => AnomalyClass::BadTopic,
            AnomalyKind::NoMem => AnomalyClass::NoMem,
        }
    }
}

/// Discarded datagram together with the reason it was discarded.
#[derive(Clone, PartialEq)]
pub struct AnomalyRecord {
    pub kind: AnomalyKind,
    /// Entire datagram, header included.
    pub datagram: Bytes,
}

impl fmt::Debug for AnomalyRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AnomalyRecord {{ kind: {:?}, datagram: {} bytes }}", self.kind, self.datagram.len())
    }
}

/// Receives every discarded datagram.
///
/// Only [`track`](AnomalyTracker::track) is required; the other methods build the record for a particular kind.
pub trait AnomalyTracker: Send + Sync {
    fn track(&self, record: AnomalyRecord);

    fn track_malformed_dg_discard(&self, dg: &[u8]) {
        self.track(record(AnomalyKind::MalformedDg, dg));
    }

    fn track_unsupported_api_key_discard(&self, dg: &[u8], api_key: i16) {
        self.track(record(AnomalyKind::UnsupportedApiKey(api_key), dg));
    }

    fn track_unsupported_msg_version_discard(&self, dg: &[u8], api_version: ApiVersion) {
        self.track(record(AnomalyKind::UnsupportedMsgVersion(api_version), dg));
    }

    fn track_malformed_msg_discard(&self, dg: &[u8]) {
        self.track(record(AnomalyKind::MalformedMsg, dg));
    }

    fn track_bad_topic_discard(&self, dg: &[u8]) {
        self.track(record(AnomalyKind::BadTopic, dg));
    }

    fn track_no_mem_discard(&self, dg: &[u8]) {
        self.track(record(AnomalyKind::NoMem, dg));
    }
}

fn record(kind: AnomalyKind, dg: &[u8]) -> AnomalyRecord {
    AnomalyRecord {
        kind,
        datagram: Bytes::copy_from_slice(dg),
    }
}

/// Counts anomalies by class and keeps the first `sample_size` records for inspection.
pub struct AnomalyRecorder {
    sample_size: usize,
    state: Mutex<RecorderState>,
}

#[derive(Default)]
struct RecorderState {
    counts: HashMap<AnomalyClass, u64>,
    samples: Vec<AnomalyRecord>,
}

impl AnomalyRecorder {
    pub fn new(sample_size: usize) -> Self {
        AnomalyRecorder {
            sample_size,
            state: Mutex::new(Default::default()),
        }
    }

    /// Returns how many anomalies of `class` were tracked.
    pub fn count(&self, class: AnomalyClass) -> u64 {
        self.lock().counts.get(&class).cloned().unwrap_or(0)
    }

    /// Returns number of all tracked anomalies.
    pub fn total(&self) -> u64 {
        self.lock().counts.values().sum()
    }

    /// Returns the sampled records, oldest first.
    pub fn samples(&self) -> Vec<AnomalyRecord> {
        self.lock().samples.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<RecorderState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AnomalyTracker for AnomalyRecorder {
    fn track(&self, record: AnomalyRecord) {
        let mut state = self.lock();
        *state.counts.entry(record.kind.class()).or_insert(0) += 1;
        if state.samples.len() < self.sample_size {
            state.samples.push(record);
        }
    }
}

impl fmt::Debug for AnomalyRecorder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AnomalyRecorder {{ counts: {:?} }}", self.lock().counts)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counts_by_class() {
        let recorder = AnomalyRecorder::new(10);
        recorder.track_unsupported_msg_version_discard(&[1, 2, 3], 7);
        recorder.track_unsupported_msg_version_discard(&[1, 2, 3], 8);
        recorder.track_no_mem_discard(&[4]);

        assert_eq!(recorder.count(AnomalyClass::UnsupportedMsgVersion), 2);
        assert_eq!(recorder.count(AnomalyClass::NoMem), 1);
        assert_eq!(recorder.count(AnomalyClass::BadTopic), 0);
        assert_eq!(recorder.total(), 3);
    }

    #[test]
    fn record_keeps_whole_datagram_and_version() {
        let recorder = AnomalyRecorder::new(10);
        recorder.track_unsupported_msg_version_discard(&[0, 0, 0, 9, 1, 0, 0, 99, 5], 99);

        assert_eq!(
            recorder.samples(),
            vec![AnomalyRecord {
                kind: AnomalyKind::UnsupportedMsgVersion(99),
                datagram: Bytes::from_static(&[0, 0, 0, 9, 1, 0, 0, 99, 5]),
            }]
        );
    }

    #[test]
    fn samples_are_capped_but_counts_are_not() {
        let recorder = AnomalyRecorder::new(2);
        for i in 0..5u8 {
            recorder.track_malformed_msg_discard(&[i]);
        }

        let samples = recorder.samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].datagram, Bytes::from_static(&[0]));
        assert_eq!(samples[1].datagram, Bytes::from_static(&[1]));
        assert_eq!(recorder.count(AnomalyClass::MalformedMsg), 5);
    }
}
