// solvers/worker_pool_binary.rs - Worker pool variant with byte-buffer messaging

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
use crate::solvers::worker::{run_binary_worker, TaskMessage, WorkerHandle, WorkerReply};
use crate::solvers::worker_pool::DEFAULT_WORKER_TIMEOUT;
use crate::solvers::{CancelToken, LongestPathSolver, Solution, DEFAULT_NUMBER_OF_THREADS};

/// Worker-pool solver whose cross-thread messages are UTF-8 JSON encoded
/// into owned byte buffers; the buffers move through the channels by
/// ownership transfer instead of being structurally cloned. Functionally
/// equivalent to [`crate::solvers::WorkerPoolSolver`], it differs only in
/// wire encoding and in how the seed candidates are drawn: evenly spaced
/// across the candidate list rather than taken from the front.
pub struct BinaryWorkerPoolSolver {
    threads: usize,
    seed: Option<u64>,
    worker_timeout: Duration,
    cancel: CancelToken,
}

impl BinaryWorkerPoolSolver {
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

    pub fn with_worker_timeout(mut self, worker_timeout: Duration) -> Self {
        self.worker_timeout = worker_timeout;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for BinaryWorkerPoolSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LongestPathSolver for BinaryWorkerPoolSolver {
    fn solve(&self, maze: &Maze) -> BoxFuture<'static, Result<Solution, SolverError>> {
        let snapshot = maze.serialize();
        let threads = self.threads;
        let seed = self.seed;
        let worker_timeout = self.worker_timeout;
        let cancel = self.cancel.clone();

        async move { solve_binary(snapshot, threads, seed, worker_timeout, cancel).await }.boxed()
    }
}

fn encode(task: &TaskMessage) -> Result<Vec<u8>, SolverError> {
    serde_json::to_vec(task).map_err(SolverError::Encoding)
}

fn terminate_all(workers: &[WorkerHandle<Vec<u8>>]) {
    if let Ok(buffer) = encode(&TaskMessage::Terminate) {
        for worker in workers {
            let _ = worker.send(buffer.clone());
        }
    }
}

/// Draws `count` seed cells evenly spaced across the candidate list, so the
/// initial batch covers the whole boundary instead of one corner.
fn split_off_seed_cells(
    potential: &mut Vec<crate::snapshot::SerializedCell>,
    count: usize,
) -> Vec<crate::snapshot::SerializedCell> {
    let mut seeds = Vec::with_capacity(count);
    if count == 1 {
        seeds.push(potential.remove(0));
        return seeds;
    }

    let step = (potential.len() - 1) / (count - 1);
    for index in (0..count).rev() {
        seeds.push(potential.remove(index * step));
    }
    // Removal ran from the back of the list, so restore ascending order.
    seeds.reverse();
    seeds
}

async fn solve_binary(
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

    let worker_count = threads.min(potential.len());
    let seeds = split_off_seed_cells(&mut potential, worker_count);
    let mut candidates = CandidateSet::from_cells(&potential);

    let (reply_tx, mut replies) = mpsc::unbounded_channel::<WorkerReply<Vec<u8>>>();
    let mut workers: Vec<WorkerHandle<Vec<u8>>> = Vec::with_capacity(worker_count);

    for (index, seed_cell) in seeds.iter().enumerate() {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let reply_tx = reply_tx.clone();
        let thread = std::thread::spawn(move || run_binary_worker(index, seed, task_rx, reply_tx));

        let handle = WorkerHandle::new(task_tx, thread);
        handle.send(encode(&TaskMessage::Initial {
            start_cell: seed_cell.location,
            maze: maze.clone(),
        })?)?;
        workers.push(handle);
    }
    drop(reply_tx);

    debug!(
        "dispatched {} evenly spaced seed cells, {} candidates remaining",
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
        let buffer = match result {
            Ok(buffer) => buffer,
            Err(error) => {
                terminate_all(&workers);
                return Err(error);
            }
        };
        let solution: Solution = serde_json::from_slice(&buffer)?;

        debug!(
            "binary worker {} found a path of {} cells from {:?}",
            index,
            solution.path.len(),
            solution.from_location
        );

        // This variant checks for remaining work before pruning.
        if candidates.is_empty() {
            workers[index].send(encode(&TaskMessage::Terminate)?)?;
            active -= 1;
            best.absorb_if_longer(solution);
            continue;
        }

        candidates.prune(&solution.path);
        best.absorb_if_longer(solution);

        // Pruning may have emptied the set between the check above and the
        // dispatch below; an empty shift terminates the worker instead.
        match candidates.shift() {
            Ok(start_cell) => {
                workers[index].send(encode(&TaskMessage::Followup { start_cell })?)?;
            }
            Err(SolverError::EmptyCandidateSet) => {
                workers[index].send(encode(&TaskMessage::Terminate)?)?;
                active -= 1;
            }
            Err(error) => return Err(error),
        }
    }

    for worker in &mut workers {
        worker.join();
    }

    debug!(
        "binary worker pool solve finished in {:?}, longest path covers {} cells",
        overall.elapsed(),
        best.path.len()
    );
    Ok(best)
}
