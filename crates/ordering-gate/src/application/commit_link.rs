//! Revocable subscription from a target to the consensus commit stream.

use parking_lot::RwLock;
use shared_bus::{LedgerEvent, Subscription};
use shared_types::{hash_hex, Commit};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct LinkState {
    closed: bool,
}

/// A live binding between a commit subscription and the object it unlocks.
///
/// Commits are forwarded by a task on the runtime the link was created on.
/// The target is held weakly; the link never keeps it alive. Dispatch holds
/// the read side of the state lock, and [`CommitLink::close`] takes the write
/// side, so once `close` returns no dispatch is running and none will start.
pub struct CommitLink {
    state: Arc<RwLock<LinkState>>,
    task: JoinHandle<()>,
}

impl CommitLink {
    /// Spawn the forwarding task on `runtime`.
    ///
    /// `dispatch` runs once per `BlockCommitted` event for as long as the
    /// target is alive and the link is open.
    pub fn establish<G, F>(
        runtime: &Handle,
        mut commits: Subscription,
        target: Weak<G>,
        dispatch: F,
    ) -> Self
    where
        G: Send + Sync + 'static,
        F: Fn(&G, &Commit) + Send + 'static,
    {
        let state = Arc::new(RwLock::new(LinkState::default()));
        let task_state = Arc::clone(&state);

        let task = runtime.spawn(async move {
            while let Some(event) = commits.recv().await {
                let LedgerEvent::BlockCommitted(commit) = event else {
                    continue;
                };
                let Some(target) = target.upgrade() else {
                    debug!("Commit target dropped, ending commit link");
                    break;
                };

                // Released before `target`, which may hold the last strong
                // reference and close this link from its destructor.
                let state = task_state.read();
                if state.closed {
                    break;
                }
                debug!(
                    height = commit.height,
                    block_hash = %hash_hex(&commit.block_hash),
                    "Dispatching commit"
                );
                dispatch(&target, &commit);
                drop(state);
            }
            debug!("Commit link task finished");
        });

        info!("Commit link established");
        Self { state, task }
    }

    /// Revoke the link. Idempotent.
    ///
    /// Waits for an in-flight dispatch to finish, then stops the forwarding
    /// task. Already-dispatched commits are not undone.
    pub fn close(&self) {
        let mut state = self.state.write();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);

        self.task.abort();
        info!("Commit link closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }
}

impl Drop for CommitLink {
    fn drop(&mut self) {
        self.close();
    }
}
