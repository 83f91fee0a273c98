// benches/solvers.rs - Solver family comparison over one pinned maze

use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use maze_engine::{
    BinaryWorkerPoolSolver, LongestPathSolver, Maze, SequentialSolver, WorkerPoolSolver,
};

fn pinned_maze(columns: usize, rows: usize) -> Maze {
    let mut maze = Maze::new(columns, rows);
    let mut rng = StdRng::seed_from_u64(0xA11CE);
    maze.generate_with_rng(&mut rng).expect("maze generation");
    maze
}

fn bench_solvers(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let maze = pinned_maze(50, 50);

    let mut group = c.benchmark_group("longest-path-50x50");
    group.sample_size(20);

    group.bench_function("sequential", |b| {
        let solver = SequentialSolver::new().with_seed(1);
        b.iter(|| runtime.block_on(solver.solve(&maze)).expect("solve"));
    });

    group.bench_function("worker-pool-4", |b| {
        let solver = WorkerPoolSolver::new().with_threads(4).with_seed(1);
        b.iter(|| runtime.block_on(solver.solve(&maze)).expect("solve"));
    });

    group.bench_function("worker-pool-binary-4", |b| {
        let solver = BinaryWorkerPoolSolver::new().with_threads(4).with_seed(1);
        b.iter(|| runtime.block_on(solver.solve(&maze)).expect("solve"));
    });

    group.finish();
}

criterion_group!(benches, bench_solvers);
criterion_main!(benches);
