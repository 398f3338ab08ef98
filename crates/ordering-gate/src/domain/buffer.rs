//! FIFO holding area for proposals awaiting release.

use parking_lot::Mutex;
use shared_types::Proposal;
use std::collections::VecDeque;

/// What happened to the head of the buffer during a release attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The head proposal was handed to the sink. Carries its height.
    Released(u64),
    /// Nothing was buffered.
    Empty,
    /// The sink refused the proposal; it is back at the head.
    Refused,
}

/// Ordered, thread-safe queue of proposals.
///
/// Unbounded: enqueue never waits and never fails.
#[derive(Debug, Default)]
pub struct ProposalBuffer {
    queue: Mutex<VecDeque<Proposal>>,
}

impl ProposalBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail. Returns the buffered length afterwards.
    pub fn push(&self, proposal: Proposal) -> usize {
        let mut queue = self.queue.lock();
        queue.push_back(proposal);
        queue.len()
    }

    /// Remove the head, if any.
    pub fn try_pop(&self) -> Option<Proposal> {
        self.queue.lock().pop_front()
    }

    /// Pop the head and hand it to `sink` without releasing the lock.
    ///
    /// Two releases can never overtake each other between pop and delivery.
    /// A sink that returns the proposal back puts it at the head again.
    pub fn release_head<F>(&self, sink: F) -> ReleaseOutcome
    where
        F: FnOnce(Proposal) -> Result<(), Proposal>,
    {
        let mut queue = self.queue.lock();
        let Some(proposal) = queue.pop_front() else {
            return ReleaseOutcome::Empty;
        };

        let height = proposal.height;
        match sink(proposal) {
            Ok(()) => ReleaseOutcome::Released(height),
            Err(proposal) => {
                queue.push_front(proposal);
                ReleaseOutcome::Refused
            }
        }
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}
