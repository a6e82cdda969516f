#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::error::ReconstructionResult;

#[cfg(not(target_arch = "wasm32"))]
const PARALLEL_THRESHOLD: usize = 2;

/// Maps every item, in parallel when worthwhile. Output order matches input
/// order regardless of scheduling.
pub fn map_indexed<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> R + Sync + Send,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        if items.len() >= PARALLEL_THRESHOLD {
            return items
                .par_iter()
                .enumerate()
                .map(|(idx, item)| f(idx, item))
                .collect();
        }
    }

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| f(idx, item))
        .collect()
}

pub fn map_indexed_in_pool<T, R, F>(
    items: &[T],
    threads: Option<usize>,
    f: F,
) -> ReconstructionResult<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> R + Sync + Send,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Some(threads) = threads {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads.max(1))
                .build()
                .map_err(|err| crate::error::ReconstructionError::ThreadPool(err.to_string()))?;
            return Ok(pool.install(|| map_indexed(items, f)));
        }
    }
    #[cfg(target_arch = "wasm32")]
    let _ = threads;

    Ok(map_indexed(items, f))
}
