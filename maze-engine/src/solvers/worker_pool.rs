// solvers/worker_pool.rs - Parallel longest-path search over a fixed worker pool

use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use log::debug;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::error_handling::SolverError;
use crate::maze::Maze;
use crate::snapshot::SerializedMaze;
use crate::solvers::candidates::{determine_potential_entry_cells, CandidateSet};
use crate::solvers::worker::{run_worker, TaskMessage, WorkerHandle, WorkerReply};
use crate::solvers::{CancelToken, LongestPathSolver, Solution, DEFAULT_NUMBER_OF_THREADS};

pub(crate) const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest-path solver that partitions the candidate cells across a fixed
/// pool of worker threads. Workers receive the maze once, keep it as session
/// state, and are fed one candidate at a time until the shared set runs dry.
pub struct WorkerPoolSolver {
    threads: usize,
    seed: Option<u64>,
    worker_timeout: Duration,
    cancel: CancelToken,
}

impl WorkerPoolSolver {
    pub fn new() -> Self {
        Self {
            threads: DEFAULT_NUMBER_OF_THREADS,
            seed: None,
            worker_timeout: DEFAULT_WORKER_TIMEOUT,
            cancel: CancelToken::new(),
        }
    }

    /// Sets the worker pool size; values below 1 are clamped to 1.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Pins the per-candidate search randomness for reproducible results.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// How long the coordinator waits for any worker reply before failing
    /// the solve with [`SolverError::WorkerTimeout`].
    pub fn with_worker_timeout(mut self, worker_timeout: Duration) -> Self {
        self.worker_timeout = worker_timeout;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for WorkerPoolSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LongestPathSolver for WorkerPoolSolver {
    fn solve(&self, maze: &Maze) -> BoxFuture<'static, Result<Solution, SolverError>> {
        let snapshot = maze.serialize();
        let threads = self.threads;
        let seed = self.seed;
        let worker_timeout = self.worker_timeout;
        let cancel = self.cancel.clone();

        async move { solve_pooled(snapshot, threads, seed, worker_timeout, cancel).await }.boxed()
    }
}

fn terminate_all(workers: &[WorkerHandle<TaskMessage>]) {
    for worker in workers {
        let _ = worker.send(TaskMessage::Terminate);
    }
}

async fn solve_pooled(
    maze: SerializedMaze,
    threads: usize,
    seed: Option<u64>,
    worker_timeout: Duration,
    cancel: CancelToken,
) -> Result<Solution, SolverError> {
    let overall = Instant::now();

    let mut potential = determine_potential_entry_cells(&maze);
    if potential.is_empty() {
        return Ok(Solution::empty());
    }

    // Reserve the first batch of candidates as worker seeds; the remainder
    // forms the shared set, so the seed cells never have to be deleted from
    // it.
    let worker_count = threads.min(potential.len());
    let remainder = potential.split_off(worker_count);
    let mut candidates = CandidateSet::from_cells(&remainder);

    let (reply_tx, mut replies) = mpsc::unbounded_channel::<WorkerReply<Solution>>();
    let mut workers: Vec<WorkerHandle<TaskMessage>> = Vec::with_capacity(worker_count);

    for (index, seed_cell) in potential.iter().enumerate() {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let reply_tx = reply_tx.clone();
        let thread = std::thread::spawn(move || run_worker(index, seed, task_rx, reply_tx));

        let handle = WorkerHandle::new(task_tx, thread);
        handle.send(TaskMessage::Initial {
            start_cell: seed_cell.location,
            maze: maze.clone(),
        })?;
        workers.push(handle);
    }
    drop(reply_tx);

    debug!(
        "dispatched {} seed cells to the pool, {} candidates remaining",
        worker_count,
        candidates.len()
    );

    let mut best = Solution::empty();
    let mut active = worker_count;

    while active > 0 {
        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                terminate_all(&workers);
                return Err(SolverError::Cancelled);
            }
            received = timeout(worker_timeout, replies.recv()) => match received {
                Err(_) => {
                    terminate_all(&workers);
                    return Err(SolverError::WorkerTimeout {
                        timeout: worker_timeout,
                        active,
                    });
                }
                Ok(None) => return Err(SolverError::ChannelClosed),
                Ok(Some(reply)) => reply,
            },
        };

        let WorkerReply { index, result } = reply;
        let solution = match result {
            Ok(solution) => solution,
            Err(error) => {
                terminate_all(&workers);
                return Err(error);
            }
        };

        debug!(
            "worker {} found a path of {} cells from {:?}",
            index,
            solution.path.len(),
            solution.from_location
        );

        // Candidates on the discovered path can no longer start a longer
        // one; drop them before deciding whether more work remains.
        candidates.prune(&solution.path);
        best.absorb_if_longer(solution);

        if candidates.is_empty() {
            workers[index].send(TaskMessage::Terminate)?;
            active -= 1;
        } else {
            let start_cell = candidates.shift()?;
            // The maze is not re-sent; the worker kept it from its first
            // task.
            workers[index].send(TaskMessage::Followup { start_cell })?;
        }
    }

    for worker in &mut workers {
        worker.join();
    }

    debug!(
        "worker pool solve finished in {:?}, longest path covers {} cells",
        overall.elapsed(),
        best.path.len()
    );
    Ok(best)
}
