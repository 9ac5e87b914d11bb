use rayon::prelude::*;
use thiserror::Error;

use ricegrid_image::Image;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how independent work items are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool.
    #[default]
    Parallel,

    /// Run sequentially on the current thread.
    ///
    /// Useful for small jobs, debugging, or when the caller already owns the threads.
    Serial,

    /// Run on a local thread pool bounded to `n` threads.
    ///
    /// The pool is built for the call and dropped afterwards.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Consume `items` and apply `op` to each of them with this strategy.
    ///
    /// `items` is anything that iterates both sequentially and in parallel, such as a
    /// `Vec` or an index range, so work can be generated lazily. Items are processed in
    /// order when running serially, in any order otherwise.
    ///
    /// # Errors
    ///
    /// Fails only when a [`ExecutionStrategy::Fixed`] pool cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use ricegrid_imgproc::parallel::ExecutionStrategy;
    ///
    /// let total = AtomicUsize::new(0);
    /// ExecutionStrategy::Fixed(2)
    ///     .for_each(vec![1, 2, 3], |x| {
    ///         total.fetch_add(x, Ordering::Relaxed);
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(total.into_inner(), 6);
    /// ```
    pub fn for_each<I, T, F>(&self, items: I, op: F) -> Result<(), ParallelError>
    where
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T> + Send,
        T: Send,
        F: Fn(T) + Sync + Send,
    {
        match *self {
            ExecutionStrategy::Serial => {
                items.into_iter().for_each(op);
            }
            ExecutionStrategy::Parallel => {
                items.into_par_iter().for_each(op);
            }
            ExecutionStrategy::Fixed(n) => {
                if n == 0 {
                    return Err(ParallelError::InvalidThreadCount(n));
                }
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?;

                pool.install(|| {
                    items.into_par_iter().for_each(op);
                });
            }
        }
        Ok(())
    }
}

/// Apply a function to each pixel in the image in parallel.
pub fn par_iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    let cols = src.cols();
    if cols == 0 {
        return;
    }

    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .chunks_exact(C1)
                .zip(dst_chunk.chunks_exact_mut(C2))
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each destination pixel together with its `(x, y)` position.
///
/// Rows are distributed over the global Rayon thread pool, every pixel is visited
/// exactly once so the output does not depend on scheduling.
pub fn par_iter_rows_indexed<const C: usize>(
    dst: &mut Image<f32, C>,
    f: impl Fn(usize, usize, &mut [f32]) + Send + Sync,
) {
    let cols = dst.cols();
    if cols == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .enumerate()
        .for_each(|(y, dst_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .enumerate()
                .for_each(|(x, dst_pixel)| {
                    f(x, y, dst_pixel);
                });
        });
}
