/// Thread pool setup for the parallel scans.

use anyhow::Result;

/// Worker count when none is requested: half the cores, at least one.
pub fn default_worker_count() -> usize {
    std::cmp::max(1, num_cpus::get() / 2)
}

/// Initialize the global rayon thread pool.
/// Returns the number of workers.
pub fn init_thread_pool(jobs: Option<usize>) -> Result<usize> {
    let workers = jobs.filter(|&n| n > 0).unwrap_or_else(default_worker_count);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    tracing::debug!(workers, cores = num_cpus::get(), "initialized thread pool");

    Ok(workers)
}
