// solvers/mod.rs - The longest-path solver family

pub mod candidates;
mod search;
pub mod sequential;
mod worker;
pub mod worker_pool;
pub mod worker_pool_binary;

pub use candidates::CandidateSet;
pub use sequential::SequentialSolver;
pub use worker_pool::WorkerPoolSolver;
pub use worker_pool_binary::BinaryWorkerPoolSolver;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::cell::Location;
use crate::error_handling::SolverError;
use crate::maze::Maze;
use crate::snapshot::SerializedCell;

/// Default size of the worker pool used by the threaded variants.
pub const DEFAULT_NUMBER_OF_THREADS: usize = 4;

/// Longest path discovered for one maze: where the search started, the cell
/// at the far end, and the full cell sequence including the endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub from_location: Option<Location>,
    pub to_cell: Option<SerializedCell>,
    pub path: Vec<SerializedCell>,
}

impl Solution {
    /// The zero-length placeholder; any discovered path replaces it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of cells on the path.
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Takes the candidate as the new best only when it is strictly longer;
    /// ties keep the earlier find. Returns whether the candidate was taken.
    pub fn absorb_if_longer(&mut self, candidate: Solution) -> bool {
        if candidate.path.len() > self.path.len() {
            *self = candidate;
            true
        } else {
            false
        }
    }
}

/// Contract shared by every solver variant. `solve` serializes the maze and
/// returns immediately with a future; the caller awaits its resolution.
pub trait LongestPathSolver: Send + Sync {
    fn solve(&self, maze: &Maze) -> BoxFuture<'static, Result<Solution, SolverError>>;
}

/// Cooperative cancellation handle shared between a caller and a running
/// solve. Cancelling stops dispatch of new work and terminates outstanding
/// workers; the pending solve resolves with [`SolverError::Cancelled`].
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before the re-check so a cancel between the check and the
        // await cannot be missed.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn descriptor(column: usize, row: usize) -> SerializedCell {
        SerializedCell {
            id: Location::new(column, row).id(),
            location: Location::new(column, row),
            number_of_neighbors: 0,
            outer_walls: 0b0001,
            paths: Vec::new(),
        }
    }

    fn solution_of(cells: &[(usize, usize)]) -> Solution {
        let path: Vec<SerializedCell> =
            cells.iter().map(|&(c, r)| descriptor(c, r)).collect();
        Solution {
            from_location: path.first().map(|cell| cell.location),
            to_cell: path.last().cloned(),
            path,
        }
    }

    #[test]
    fn test_absorb_keeps_earlier_solution_on_tie() {
        let mut best = Solution::empty();
        let first = solution_of(&[(0, 0), (1, 0)]);
        let tie = solution_of(&[(2, 2), (2, 3)]);

        assert!(best.absorb_if_longer(first));
        assert!(!best.absorb_if_longer(tie));
        assert_eq!(best.from_location, Some(Location::new(0, 0)));

        let longer = solution_of(&[(0, 0), (1, 0), (2, 0)]);
        assert!(best.absorb_if_longer(longer));
        assert_eq!(best.len(), 3);
    }

    #[tokio::test]
    async fn test_cancel_token_wakes_waiters() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            true
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!token.is_cancelled());
        token.cancel();

        let woke = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(woke);
    }

    #[tokio::test]
    async fn test_cancelled_token_resolves_immediately() {
        let token = CancelToken::new();
        token.cancel();
        token.cancelled().await;
        assert!(token.is_cancelled());
    }
}
