// main.rs - Maze generation and longest-path solving from the command line

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use maze_engine::{
    BinaryWorkerPoolSolver, LongestPathSolver, Maze, SequentialSolver, Solution,
    WorkerPoolSolver, DEFAULT_NUMBER_OF_THREADS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SolverKind {
    /// Walk every candidate on a single thread
    Sequential,
    /// Partition candidates across a worker pool
    Threaded,
    /// Worker pool with JSON byte-buffer messaging
    ThreadedBinary,
}

/// CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of maze columns
    #[arg(short, long, default_value = "50")]
    columns: usize,

    /// Number of maze rows
    #[arg(short, long, default_value = "50")]
    rows: usize,

    /// Solver variant used to find the entry and exit
    #[arg(short, long, value_enum, default_value = "threaded")]
    solver: SolverKind,

    /// Worker threads for the pooled variants; 0 uses the machine's logical
    /// CPU count
    #[arg(short, long, default_value_t = DEFAULT_NUMBER_OF_THREADS)]
    threads: usize,

    /// RNG seed for a reproducible maze and search
    #[arg(long)]
    seed: Option<u64>,

    /// Print the generated maze as ASCII
    #[arg(long)]
    ascii: bool,

    /// Time all solver variants over the same maze instead of solving once
    #[arg(long)]
    benchmark: bool,

    /// Solve attempts per variant in benchmark mode
    #[arg(long, default_value = "10")]
    attempts: usize,

    /// Worker reply timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,
}

impl Args {
    fn thread_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    fn build_solver(&self, kind: SolverKind) -> Box<dyn LongestPathSolver> {
        match kind {
            SolverKind::Sequential => {
                let mut solver = SequentialSolver::new();
                if let Some(seed) = self.seed {
                    solver = solver.with_seed(seed);
                }
                Box::new(solver)
            }
            SolverKind::Threaded => {
                let mut solver = WorkerPoolSolver::new()
                    .with_threads(self.thread_count())
                    .with_worker_timeout(self.worker_timeout());
                if let Some(seed) = self.seed {
                    solver = solver.with_seed(seed);
                }
                Box::new(solver)
            }
            SolverKind::ThreadedBinary => {
                let mut solver = BinaryWorkerPoolSolver::new()
                    .with_threads(self.thread_count())
                    .with_worker_timeout(self.worker_timeout());
                if let Some(seed) = self.seed {
                    solver = solver.with_seed(seed);
                }
                Box::new(solver)
            }
        }
    }
}

fn generate(args: &Args) -> Result<Maze> {
    let mut maze = Maze::new(args.columns, args.rows);
    match args.seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            maze.generate_with_rng(&mut rng)?;
        }
        None => maze.generate()?,
    }
    Ok(maze)
}

async fn run_once(args: &Args) -> Result<()> {
    let mut maze = generate(args)?;
    let solver = args.build_solver(args.solver);

    let started = Instant::now();
    let solution = maze.find_entry_and_exit(solver.as_ref()).await?;
    let elapsed = started.elapsed();

    if args.ascii {
        print!("{}", maze.render_ascii());
    }

    let config = maze.configuration();
    println!(
        "{}x{} maze solved with {:?} in {:?}",
        config.columns, config.rows, args.solver, elapsed
    );
    println!(
        "entry {:?}, exit {:?}, longest path covers {} cells",
        config.entry_cell,
        config.exit_cell,
        solution.path.len()
    );
    Ok(())
}

struct BenchmarkRow {
    kind: SolverKind,
    min: Duration,
    max: Duration,
    total: Duration,
    longest: usize,
}

async fn run_benchmark(args: &Args) -> Result<()> {
    let maze = generate(args)?;
    info!(
        "benchmarking {} attempts per variant on a {}x{} maze with {} threads",
        args.attempts,
        args.columns,
        args.rows,
        args.thread_count()
    );

    let kinds = [
        SolverKind::Sequential,
        SolverKind::Threaded,
        SolverKind::ThreadedBinary,
    ];

    let mut rows = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let solver = args.build_solver(kind);
        let mut row = BenchmarkRow {
            kind,
            min: Duration::MAX,
            max: Duration::ZERO,
            total: Duration::ZERO,
            longest: 0,
        };

        for _ in 0..args.attempts {
            let started = Instant::now();
            let solution: Solution = solver.solve(&maze).await?;
            let elapsed = started.elapsed();

            row.min = row.min.min(elapsed);
            row.max = row.max.max(elapsed);
            row.total += elapsed;
            row.longest = row.longest.max(solution.path.len());
        }
        rows.push(row);
    }

    println!(
        "{:<16} {:>10} {:>10} {:>10} {:>14}",
        "solver", "min", "avg", "max", "longest path"
    );
    for row in rows {
        println!(
            "{:<16} {:>10.2?} {:>10.2?} {:>10.2?} {:>14}",
            format!("{:?}", row.kind),
            row.min,
            row.total / args.attempts.max(1) as u32,
            row.max,
            row.longest
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.benchmark {
        run_benchmark(&args).await
    } else {
        run_once(&args).await
    }
}
