use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use log::{debug, warn};

use ricegrid_image::Image;
use ricegrid_imgproc::{
    crop::crop_image,
    normalize::{cast_u8, normalize_min_max_u8},
    parallel::ExecutionStrategy,
};
use ricegrid_io::write_image;

use crate::{
    error::CropError,
    grid::{Cell, GridLayout},
    job::{CancelToken, CropSummary, Progress},
    patch::{patch_grid, DatedNaming, PatchKey, PatchNaming, PatchRect, DEFAULT_DATE},
    rectify::RectifiedImage,
};

/// Owned callback receiving a [`Progress`] report after every cell.
pub type ProgressFn = dyn Fn(Progress) + Send + Sync;

#[derive(Default)]
struct Counters {
    written: AtomicUsize,
    failed: AtomicUsize,
    visited: AtomicUsize,
    skipped: AtomicUsize,
}

/// Cuts the cells of a [`GridLayout`] out of a rectified image and writes their patches.
///
/// Cells are independent: each one is cropped, normalized to 8 bits and tiled on its
/// own, so they can be processed in any order by the chosen [`ExecutionStrategy`].
/// File names only depend on the cluster and patch numbers, which keeps the output
/// identical whatever the scheduling.
pub struct Slicer<'a, const C: usize> {
    rectified: &'a RectifiedImage<C>,
    layout: &'a GridLayout,
    patch_size: usize,
    output_dir: &'a Path,
    naming: &'a dyn PatchNaming,
    date: &'a str,
    cancel: Option<&'a CancelToken>,
    progress: Option<&'a (dyn Fn(Progress) + Send + Sync + 'a)>,
}

impl<'a, const C: usize> Slicer<'a, C> {
    /// Create a slicer writing `patch_size` patches into `output_dir`.
    ///
    /// Uses [`DatedNaming`] with the default date until configured otherwise.
    pub fn new(
        rectified: &'a RectifiedImage<C>,
        layout: &'a GridLayout,
        patch_size: usize,
        output_dir: &'a Path,
    ) -> Self {
        Self {
            rectified,
            layout,
            patch_size,
            output_dir,
            naming: &DatedNaming,
            date: DEFAULT_DATE,
            cancel: None,
            progress: None,
        }
    }

    /// Set the naming strategy.
    pub fn naming(mut self, naming: &'a dyn PatchNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Set the date tag passed to the naming strategy.
    pub fn date(mut self, date: &'a str) -> Self {
        self.date = date;
        self
    }

    /// Stop before the next cell once `token` is cancelled.
    pub fn cancel_token(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Report progress after every cell.
    pub fn progress(mut self, progress: &'a (dyn Fn(Progress) + Send + Sync + 'a)) -> Self {
        self.progress = Some(progress);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|token| token.is_cancelled())
    }

    /// Process every cell of the layout.
    ///
    /// Patches that fail to encode or write are logged and counted in
    /// [`CropSummary::patches_failed`].
    ///
    /// # Errors
    ///
    /// Returns [`CropError::Cancelled`] if the job was cancelled before all cells were
    /// visited, or the first buffer error raised while processing a cell.
    pub fn run(&self, strategy: ExecutionStrategy) -> Result<CropSummary, CropError> {
        let cells_total = self.layout.num_cells();

        let counters = Counters::default();
        let aborted = AtomicBool::new(false);
        let first_error = Mutex::new(None);

        strategy.for_each(0..cells_total, |index| {
            if aborted.load(Ordering::Relaxed) || self.is_cancelled() {
                return;
            }

            let cell = self.layout.cell(index);

            if cell.is_empty() {
                debug!("cell {} is outside the rectified image", cell.cluster_number);
                counters.skipped.fetch_add(1, Ordering::Relaxed);
            } else {
                match self.slice_cell(&cell) {
                    Ok((written, failed)) => {
                        counters.written.fetch_add(written, Ordering::Relaxed);
                        counters.failed.fetch_add(failed, Ordering::Relaxed);
                    }
                    Err(err) => {
                        aborted.store(true, Ordering::Relaxed);
                        if let Ok(mut slot) = first_error.lock() {
                            slot.get_or_insert(err);
                        }
                        return;
                    }
                }
            }

            let cells_done = counters.visited.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(progress) = self.progress {
                progress(Progress {
                    cells_done,
                    cells_total,
                    patches_written: counters.written.load(Ordering::Relaxed),
                });
            }
        })?;

        if let Some(err) = first_error.into_inner().ok().flatten() {
            return Err(err);
        }

        let summary = CropSummary {
            patches_written: counters.written.into_inner(),
            patches_failed: counters.failed.into_inner(),
            cells_visited: counters.visited.into_inner(),
            cells_skipped: counters.skipped.into_inner(),
            output_dir: self.output_dir.to_path_buf(),
        };

        if summary.cells_visited < cells_total && self.is_cancelled() {
            return Err(CropError::Cancelled {
                patches_written: summary.patches_written,
            });
        }

        Ok(summary)
    }

    /// Write the patches of one cell, returning `(written, failed)`.
    fn slice_cell(&self, cell: &Cell) -> Result<(usize, usize), CropError> {
        let mut region = Image::<f32, C>::from_size_val(cell.size(), 0.0)?;
        crop_image(&self.rectified.image, &mut region, cell.x, cell.y)?;

        let mut region_u8 = Image::<u8, C>::from_size_val(cell.size(), 0)?;
        if self.rectified.format.is_u8() {
            cast_u8(&region, &mut region_u8)?;
        } else {
            normalize_min_max_u8(&region, &mut region_u8)?;
        }

        let (mut written, mut failed) = (0, 0);
        for patch in patch_grid(cell.width, cell.height, self.patch_size) {
            let key = PatchKey {
                date: self.date,
                cluster_number: cell.cluster_number,
                patch_number: patch.number,
            };
            let file_path = self.output_dir.join(self.naming.file_name(&key));

            match write_patch(&region_u8, &patch, &file_path) {
                Ok(()) => written += 1,
                Err(err) => {
                    warn!("skipping patch {}: {err}", file_path.display());
                    failed += 1;
                }
            }
        }

        debug!(
            "cell {} ({}, {}) {}x{}: {} patches",
            cell.cluster_number, cell.x, cell.y, cell.width, cell.height, written
        );

        Ok((written, failed))
    }
}

fn write_patch<const C: usize>(
    region: &Image<u8, C>,
    patch: &PatchRect,
    file_path: &Path,
) -> Result<(), CropError> {
    let mut tile = Image::<u8, C>::from_size_val([patch.size, patch.size].into(), 0)?;
    crop_image(region, &mut tile, patch.x, patch.y)?;
    write_image(file_path, &tile).map_err(CropError::from_write)
}
