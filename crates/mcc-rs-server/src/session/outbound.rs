//! A session's outbound queue.
//!
//! Frames normally go straight to the writer task. While a level transfer
//! is running the queue is held: ordinary sends are parked and only the
//! transfer itself writes through. Releasing the hold flushes the parked
//! frames in order, under the same lock that ordinary sends take, so no
//! frame can slip in between.

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug)]
pub struct Outbound {
    tx: UnboundedSender<Bytes>,
    held: Mutex<Option<Vec<Bytes>>>,
}

impl Outbound {
    pub fn new(tx: UnboundedSender<Bytes>) -> Self {
        Self {
            tx,
            held: Mutex::new(None),
        }
    }

    /// Queue a frame, or park it while the queue is held.
    pub fn send(&self, frame: Bytes) {
        let mut held = self.held.lock();
        match held.as_mut() {
            Some(parked) => parked.push(frame),
            None => {
                // A closed channel means the writer is gone; the frame is moot.
                let _ = self.tx.send(frame);
            }
        }
    }

    /// Queue a frame ahead of anything parked.
    pub fn send_direct(&self, frame: Bytes) {
        let _ = self.tx.send(frame);
    }

    pub fn hold(&self) {
        let mut held = self.held.lock();
        if held.is_none() {
            *held = Some(Vec::new());
        }
    }

    /// Flush parked frames and go back to sending directly.
    pub fn release(&self) {
        let mut held = self.held.lock();
        if let Some(parked) = held.take() {
            for frame in parked {
                let _ = self.tx.send(frame);
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
