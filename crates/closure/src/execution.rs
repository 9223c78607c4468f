//! Execution strategy for per-cell calculations

// crate modules
use crate::error::{Error, Result};

// external crates
use kdam::{par_tqdm, Bar, BarBuilder, BarExt};
use log::{debug, trace};
use rayon::prelude::*;

/// Environment variable used as the worker pool size hint
pub const THREADS_HINT: &str = "SLURM_CPUS_PER_TASK";

/// How a per-cell function is applied over a mesh
///
/// There is only ever one implementation of any per-cell calculation. This
/// decides whether it is applied in a plain loop or fanned out over a fixed
/// size pool of workers. Results are always returned in cell order, and every
/// cell depends only on its own inputs, so both strategies give bit-for-bit
/// identical output.
///
/// ```rust
/// # use datafoam_closure::Execution;
/// let serial = Execution::Serial.map_cells(4, false, |i| Ok(i * i)).unwrap();
/// let parallel = Execution::Parallel { threads: 2 }
///     .map_cells(4, false, |i| Ok(i * i))
///     .unwrap();
/// assert_eq!(serial, parallel);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Single threaded loop over cells
    #[default]
    Serial,
    /// Fixed size pool of workers
    Parallel { threads: usize },
}

impl Execution {
    /// Pool size from the scheduler hint, serial if absent or invalid
    pub fn from_env() -> Self {
        match std::env::var(THREADS_HINT).ok().and_then(|v| v.parse().ok()) {
            Some(threads) => Self::with_threads(threads),
            None => Self::Serial,
        }
    }

    /// Serial for one thread or fewer, parallel otherwise
    pub fn with_threads(threads: usize) -> Self {
        match threads {
            0 | 1 => Self::Serial,
            n => Self::Parallel { threads: n },
        }
    }

    /// Number of workers used
    pub fn threads(&self) -> usize {
        match self {
            Self::Serial => 1,
            Self::Parallel { threads } => *threads,
        }
    }

    /// Apply `f` to every cell index in `0..n_cells`
    ///
    /// Fails on the first cell to return an error.
    pub fn map_cells<T, F>(&self, n_cells: usize, progress: bool, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync + Send,
    {
        debug!("Processing {n_cells} cells with {} worker(s)", self.threads());

        let results = match self {
            Self::Serial => {
                let mut bar = init_progress_bar(n_cells, progress)?;
                let mut results = Vec::with_capacity(n_cells);
                for i in 0..n_cells {
                    results.push(f(i)?);
                    bar.update(1)?;
                }
                results
            }
            Self::Parallel { threads } => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(*threads)
                    .build()?;
                pool.install(|| {
                    par_tqdm!(
                        (0..n_cells).into_par_iter().map(&f),
                        total = n_cells,
                        disable = !progress,
                        bar_format = "{count}/{total} cells [{rate:.0} cells/s]  "
                    )
                    .collect::<Result<Vec<T>>>()
                })?
            }
        };

        if progress {
            eprintln!();
        }

        trace!("Collected {} results in cell order", results.len());
        Ok(results)
    }
}

/// Initialise the progress bar, if wanted
fn init_progress_bar(total: usize, progress: bool) -> Result<Bar> {
    BarBuilder::default()
        .total(total)
        .unit(" cells")
        .disable(!progress)
        .bar_format("{count}/{total} cells [{rate:.0} cells/s]  ")
        .build()
        .map_err(Error::ProgressBar)
}
