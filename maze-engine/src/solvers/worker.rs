// solvers/worker.rs - Worker-side task handling and per-worker session state

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::cell::Location;
use crate::error_handling::SolverError;
use crate::snapshot::SerializedMaze;
use crate::solvers::search::{longest_path_from, rng_for_start};
use crate::solvers::Solution;

/// Task sent from the coordinator to a worker. The maze snapshot travels
/// only with the first task; follow-up tasks rely on the session state the
/// worker retained, which is why the variants are explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub(crate) enum TaskMessage {
    #[serde(rename_all = "camelCase")]
    Initial {
        start_cell: Location,
        maze: SerializedMaze,
    },
    #[serde(rename_all = "camelCase")]
    Followup { start_cell: Location },
    Terminate,
}

/// Reply from a worker, tagged with the worker's index so the coordinator
/// knows where to dispatch the next candidate.
#[derive(Debug)]
pub(crate) struct WorkerReply<T> {
    pub index: usize,
    pub result: Result<T, SolverError>,
}

/// Coordinator-side handle to one worker thread: the task channel in, and
/// the join handle for the terminate barrier.
pub(crate) struct WorkerHandle<T> {
    tasks: mpsc::UnboundedSender<T>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl<T> WorkerHandle<T> {
    pub(crate) fn new(tasks: mpsc::UnboundedSender<T>, thread: std::thread::JoinHandle<()>) -> Self {
        Self {
            tasks,
            thread: Some(thread),
        }
    }

    pub(crate) fn send(&self, task: T) -> Result<(), SolverError> {
        self.tasks.send(task).map_err(|_| SolverError::ChannelClosed)
    }

    /// Joins the worker thread; call only after it was told to terminate.
    pub(crate) fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Worker loop for the structured-message variant. Runs on a dedicated OS
/// thread; the maze snapshot received with the first task is retained for
/// the thread's lifetime.
pub(crate) fn run_worker(
    index: usize,
    seed: Option<u64>,
    mut tasks: mpsc::UnboundedReceiver<TaskMessage>,
    replies: mpsc::UnboundedSender<WorkerReply<Solution>>,
) {
    debug!("worker {} started", index);
    let mut session: Option<SerializedMaze> = None;

    while let Some(task) = tasks.blocking_recv() {
        let start_cell = match task {
            TaskMessage::Initial { start_cell, maze } => {
                session = Some(maze);
                start_cell
            }
            TaskMessage::Followup { start_cell } => start_cell,
            TaskMessage::Terminate => break,
        };

        let result = match session.as_ref() {
            Some(maze) => {
                let mut rng = rng_for_start(seed, start_cell);
                Ok(longest_path_from(maze, start_cell, &mut rng))
            }
            None => Err(SolverError::MissingSnapshot { index }),
        };

        if replies.send(WorkerReply { index, result }).is_err() {
            // Coordinator is gone; nothing left to work for.
            break;
        }
    }
    debug!("worker {} shutting down", index);
}

/// Worker loop for the byte-buffer variant. Identical protocol, but every
/// message is UTF-8 JSON in an owned buffer whose ownership moves through
/// the channel.
pub(crate) fn run_binary_worker(
    index: usize,
    seed: Option<u64>,
    mut tasks: mpsc::UnboundedReceiver<Vec<u8>>,
    replies: mpsc::UnboundedSender<WorkerReply<Vec<u8>>>,
) {
    debug!("binary worker {} started", index);
    let mut session: Option<SerializedMaze> = None;

    while let Some(buffer) = tasks.blocking_recv() {
        let task = match serde_json::from_slice::<TaskMessage>(&buffer) {
            Ok(task) => task,
            Err(error) => {
                let _ = replies.send(WorkerReply {
                    index,
                    result: Err(SolverError::Encoding(error)),
                });
                continue;
            }
        };

        let start_cell = match task {
            TaskMessage::Initial { start_cell, maze } => {
                session = Some(maze);
                start_cell
            }
            TaskMessage::Followup { start_cell } => start_cell,
            TaskMessage::Terminate => break,
        };

        let result = match session.as_ref() {
            Some(maze) => {
                let mut rng = rng_for_start(seed, start_cell);
                let solution = longest_path_from(maze, start_cell, &mut rng);
                serde_json::to_vec(&solution).map_err(SolverError::Encoding)
            }
            None => Err(SolverError::MissingSnapshot { index }),
        };

        if replies.send(WorkerReply { index, result }).is_err() {
            break;
        }
    }
    debug!("binary worker {} shutting down", index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::Maze;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snapshot(columns: usize, rows: usize, seed: u64) -> SerializedMaze {
        let mut maze = Maze::new(columns, rows);
        let mut rng = StdRng::seed_from_u64(seed);
        maze.generate_with_rng(&mut rng).unwrap();
        maze.serialize()
    }

    #[test]
    fn test_task_message_wire_format() {
        let task = TaskMessage::Followup {
            start_cell: Location::new(3, 1),
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["type"], "followup");
        assert_eq!(json["startCell"]["column"], 3);

        let initial = TaskMessage::Initial {
            start_cell: Location::new(0, 0),
            maze: snapshot(2, 2, 1),
        };
        let json = serde_json::to_value(&initial).unwrap();
        assert_eq!(json["type"], "initial");
        assert_eq!(json["maze"][0][0]["id"], "0_0");
    }

    #[test]
    fn test_worker_retains_maze_across_follow_ups() {
        let maze = snapshot(6, 6, 5);
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (reply_tx, mut replies) = mpsc::unbounded_channel();

        let thread = std::thread::spawn(move || run_worker(0, Some(9), task_rx, reply_tx));

        task_tx
            .send(TaskMessage::Initial {
                start_cell: Location::new(0, 0),
                maze,
            })
            .unwrap();
        task_tx
            .send(TaskMessage::Followup {
                start_cell: Location::new(5, 5),
            })
            .unwrap();
        task_tx.send(TaskMessage::Terminate).unwrap();

        let first = replies.blocking_recv().unwrap();
        let second = replies.blocking_recv().unwrap();
        assert!(replies.blocking_recv().is_none());

        let first = first.result.unwrap();
        let second = second.result.unwrap();
        assert_eq!(first.from_location, Some(Location::new(0, 0)));
        assert_eq!(second.from_location, Some(Location::new(5, 5)));
        assert!(!second.path.is_empty());

        thread.join().unwrap();
    }

    #[test]
    fn test_follow_up_before_initial_reports_missing_snapshot() {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (reply_tx, mut replies) = mpsc::unbounded_channel();

        let thread = std::thread::spawn(move || run_worker(2, None, task_rx, reply_tx));

        task_tx
            .send(TaskMessage::Followup {
                start_cell: Location::new(0, 0),
            })
            .unwrap();
        task_tx.send(TaskMessage::Terminate).unwrap();

        let reply = replies.blocking_recv().unwrap();
        assert_eq!(reply.index, 2);
        assert!(matches!(
            reply.result,
            Err(SolverError::MissingSnapshot { index: 2 })
        ));

        thread.join().unwrap();
    }

    #[test]
    fn test_binary_worker_round_trips_json_buffers() {
        let maze = snapshot(4, 4, 3);
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (reply_tx, mut replies) = mpsc::unbounded_channel();

        let thread = std::thread::spawn(move || run_binary_worker(0, Some(4), task_rx, reply_tx));

        let initial = serde_json::to_vec(&TaskMessage::Initial {
            start_cell: Location::new(0, 0),
            maze,
        })
        .unwrap();
        task_tx.send(initial).unwrap();
        task_tx
            .send(serde_json::to_vec(&TaskMessage::Terminate).unwrap())
            .unwrap();

        let reply = replies.blocking_recv().unwrap();
        let solution: Solution = serde_json::from_slice(&reply.result.unwrap()).unwrap();
        assert_eq!(solution.from_location, Some(Location::new(0, 0)));
        assert!(!solution.path.is_empty());

        thread.join().unwrap();
    }

    #[test]
    fn test_binary_worker_reports_undecodable_buffers() {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (reply_tx, mut replies) = mpsc::unbounded_channel();

        let thread = std::thread::spawn(move || run_binary_worker(1, None, task_rx, reply_tx));

        task_tx.send(b"not json".to_vec()).unwrap();
        drop(task_tx);

        let reply = replies.blocking_recv().unwrap();
        assert!(matches!(reply.result, Err(SolverError::Encoding(_))));

        thread.join().unwrap();
    }
}
