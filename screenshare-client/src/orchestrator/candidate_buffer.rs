use screenshare_core::IceCandidate;
use std::collections::VecDeque;

/// Candidates that cannot be applied yet, in receipt order. Once full, later
/// arrivals are refused so the ones already held stay contiguous.
#[derive(Debug, Clone)]
pub struct CandidateBuffer {
    queue: VecDeque<IceCandidate>,
    limit: usize,
}

impl CandidateBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            limit,
        }
    }

    /// Returns false when the candidate was refused.
    pub fn push(&mut self, candidate: IceCandidate) -> bool {
        if self.queue.len() >= self.limit {
            return false;
        }
        self.queue.push_back(candidate);
        true
    }

    pub fn pop(&mut self) -> Option<IceCandidate> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
