//! Observation sources feeding the engine

use crate::core::Observation;
use std::collections::VecDeque;

/// Producer of observation batches (one batch per ranging tick)
pub trait ObservationSource {
    /// Next pending batch, or `None` when nothing is queued
    fn next_batch(&mut self) -> Option<Vec<Observation>>;
}

/// In-memory FIFO of batches, for tests and replays
#[derive(Debug, Clone, Default)]
pub struct QueuedObservationSource {
    queue: VecDeque<Vec<Observation>>,
}

impl QueuedObservationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batch(&mut self, batch: Vec<Observation>) {
        self.queue.push_back(batch);
    }

    pub fn queued_batch_count(&self) -> usize {
        self.queue.len()
    }
}

impl FromIterator<Vec<Observation>> for QueuedObservationSource {
    fn from_iter<T: IntoIterator<Item = Vec<Observation>>>(iter: T) -> Self {
        Self {
            queue: iter.into_iter().collect(),
        }
    }
}

impl ObservationSource for QueuedObservationSource {
    fn next_batch(&mut self) -> Option<Vec<Observation>> {
        self.queue.pop_front()
    }
}
