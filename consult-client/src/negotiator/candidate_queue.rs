use crate::backend::PeerBackend;
use consult_core::IceCandidate;
use std::collections::VecDeque;
use tracing::{debug, warn};

pub const DEFAULT_CANDIDATE_CAPACITY: usize = 256;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    pub failed: usize,
}

/// Remote candidates that arrived before the connection could accept them.
///
/// Bounded: when full the oldest entry is discarded. Draining takes the
/// whole batch under `&mut self`, so nothing can be enqueued mid-drain.
#[derive(Debug)]
pub struct CandidateQueue {
    pending: VecDeque<IceCandidate>,
    capacity: usize,
    dropped: usize,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CANDIDATE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Returns the candidate evicted to make room, if any.
    pub fn enqueue(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        let evicted = if self.pending.len() >= self.capacity {
            self.dropped += 1;
            let oldest = self.pending.pop_front();
            warn!(
                "Candidate queue full ({}), dropping oldest candidate",
                self.capacity
            );
            oldest
        } else {
            None
        };
        self.pending.push_back(candidate);
        evicted
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Removes every queued candidate, oldest first.
    pub fn take(&mut self) -> Vec<IceCandidate> {
        self.pending.drain(..).collect()
    }

    /// Applies every queued candidate to `backend` in arrival order and
    /// leaves the queue empty. A candidate the backend rejects is logged
    /// and not retried.
    pub async fn drain_into(&mut self, backend: &dyn PeerBackend) -> DrainReport {
        let batch = self.take();
        let mut report = DrainReport::default();
        for candidate in batch {
            match backend.add_ice_candidate(&candidate).await {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    warn!("Failed to apply queued ICE candidate: {}", e);
                    report.failed += 1;
                }
            }
        }
        if report.applied + report.failed > 0 {
            debug!(
                "Drained {} queued candidate(s), {} failed",
                report.applied + report.failed,
                report.failed
            );
        }
        report
    }
}

impl Default for CandidateQueue {
    fn default() -> Self {
        Self::new()
    }
}
