//! Outbound channel of released proposals.

use shared_types::Proposal;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// Single-consumer stream of proposals released by the gate.
///
/// Proposals arrive in buffer order, at most one per unlock. The stream ends
/// once the gate is dropped and every released proposal has been read.
pub struct ProposalStream {
    receiver: mpsc::UnboundedReceiver<Proposal>,
}

impl ProposalStream {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<Proposal>) -> Self {
        Self { receiver }
    }

    /// Wait for the next released proposal.
    pub async fn recv(&mut self) -> Option<Proposal> {
        self.receiver.recv().await
    }

    /// Take a released proposal if one is waiting.
    pub fn try_recv(&mut self) -> Option<Proposal> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for ProposalStream {
    type Item = Proposal;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
