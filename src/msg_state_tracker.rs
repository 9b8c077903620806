use crate::msg::Msg;
use std::sync::atomic::{AtomicU64, Ordering};

/// Records lifecycle transitions of decoded messages.
pub trait MsgStateTracker: Send + Sync {
    /// Called once a decoder has built `msg` and is about to hand it to the caller.
    fn msg_enter_new(&self, msg: &Msg);
}

/// Tracker that only counts messages entering the pipeline.
#[derive(Debug, Default)]
pub struct MsgStateCounter {
    new_count: AtomicU64,
}

impl MsgStateCounter {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns number of messages that entered the `new` state.
    pub fn new_count(&self) -> u64 {
        self.new_count.load(Ordering::Relaxed)
    }
}

impl MsgStateTracker for MsgStateCounter {
    fn msg_enter_new(&self, _msg: &Msg) {
        self.new_count.fetch_add(1, Ordering::Relaxed);
    }
}
