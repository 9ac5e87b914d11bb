use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use log::{error, info};
use serde::{Deserialize, Serialize};

use ricegrid_image::{Image, PixelFormat};
use ricegrid_imgproc::parallel::ExecutionStrategy;
use ricegrid_io::{read_image_any, AnyImage};

use crate::{
    error::CropError,
    geometry::{Point2, PreviewGeometry},
    grid::{GridConfig, GridLayout},
    patch::{DatedNaming, PatchNaming, DEFAULT_DATE},
    rectify::RectifyPlan,
    slicer::{ProgressFn, Slicer},
};

/// A crop job as sent by the user interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRequest {
    /// Source image.
    pub path: PathBuf,
    /// Output directory, `<source dir>/output` when unset or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_path: Option<PathBuf>,
    /// Date tag for file names, `00000000` when unset or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_date: Option<String>,
    /// Reference points in preview space.
    pub clicks: [Point2; 3],
    /// Size of the preview the points were picked on.
    pub preview_size: PreviewGeometry,
    /// Grid layout.
    pub config: GridConfig,
}

impl CropRequest {
    /// Directory the patches are written to.
    pub fn output_dir(&self) -> PathBuf {
        match &self.save_path {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => self
                .path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join("output"),
        }
    }

    /// Date tag passed to the naming strategy.
    pub fn date(&self) -> &str {
        match self.custom_date.as_deref() {
            Some(date) if !date.is_empty() => date,
            _ => DEFAULT_DATE,
        }
    }
}

/// Cooperative cancellation flag shared between a job and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the job stops before its next cell.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress of a running job, reported after every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Cells processed so far.
    pub cells_done: usize,
    /// Cells in the grid.
    pub cells_total: usize,
    /// Patches written so far.
    pub patches_written: usize,
}

/// Outcome of a successful job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CropSummary {
    /// Patches written to disk.
    pub patches_written: usize,
    /// Patches that could not be encoded or written.
    pub patches_failed: usize,
    /// Cells processed.
    pub cells_visited: usize,
    /// Cells that fell outside the rectified image.
    pub cells_skipped: usize,
    /// Directory holding the patches.
    pub output_dir: PathBuf,
}

/// A configured crop job.
///
/// # Example
///
/// ```no_run
/// use ricegrid::{CancelToken, ClusterNaming, CropJob, CropRequest, ExecutionStrategy};
///
/// # fn request() -> CropRequest { unimplemented!() }
/// let token = CancelToken::new();
/// let job = CropJob::new(request())
///     .with_naming(ClusterNaming)
///     .with_strategy(ExecutionStrategy::Fixed(4))
///     .with_cancel_token(token.clone())
///     .with_progress(|p| println!("{}/{}", p.cells_done, p.cells_total));
///
/// let summary = job.run();
/// ```
pub struct CropJob {
    request: CropRequest,
    naming: Box<dyn PatchNaming>,
    strategy: ExecutionStrategy,
    cancel: Option<CancelToken>,
    progress: Option<Box<ProgressFn>>,
}

impl CropJob {
    /// Create a job with the default naming and the global thread pool.
    pub fn new(request: CropRequest) -> Self {
        Self {
            request,
            naming: Box::new(DatedNaming),
            strategy: ExecutionStrategy::default(),
            cancel: None,
            progress: None,
        }
    }

    /// Use another naming strategy.
    pub fn with_naming(mut self, naming: impl PatchNaming + 'static) -> Self {
        self.naming = Box::new(naming);
        self
    }

    /// Choose how cells are scheduled.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Make the job cancellable.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Receive a report after every cell.
    pub fn with_progress(mut self, progress: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// The request this job runs.
    pub fn request(&self) -> &CropRequest {
        &self.request
    }

    /// Run the job.
    ///
    /// Configuration and geometry are validated before the output directory is
    /// created, so a rejected job leaves the file system untouched.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; see [`CropError::kind`].
    pub fn run(&self) -> Result<CropSummary, CropError> {
        let request = &self.request;
        info!("crop job for {}", request.path.display());

        request.config.validate()?;
        request.preview_size.validate()?;

        let source = read_image_any(&request.path).map_err(CropError::ImageLoad)?;
        info!(
            "source {} {} x{}",
            source.size(),
            source.pixel_format(),
            source.num_channels()
        );

        let plan = RectifyPlan::new(source.size(), &request.clicks, request.preview_size)?;
        let layout = GridLayout::compute(&request.config, plan.size(), plan.scale())?;

        let output_dir = request.output_dir();
        std::fs::create_dir_all(&output_dir)?;

        let format = source.pixel_format();
        let summary = match source {
            AnyImage::Gray8(img) => self.slice(img.cast()?, format, &plan, &layout, &output_dir),
            AnyImage::Rgb8(img) => self.slice(img.cast()?, format, &plan, &layout, &output_dir),
            AnyImage::Rgba8(img) => self.slice(img.cast()?, format, &plan, &layout, &output_dir),
            AnyImage::Gray16(img) => self.slice(img.cast()?, format, &plan, &layout, &output_dir),
            AnyImage::Rgb16(img) => self.slice(img.cast()?, format, &plan, &layout, &output_dir),
            AnyImage::Rgba16(img) => self.slice(img.cast()?, format, &plan, &layout, &output_dir),
            AnyImage::Rgb32F(img) => self.slice(img, format, &plan, &layout, &output_dir),
            AnyImage::Rgba32F(img) => self.slice(img, format, &plan, &layout, &output_dir),
        }?;

        info!(
            "wrote {} patches ({} failed) from {} cells to {}",
            summary.patches_written,
            summary.patches_failed,
            summary.cells_visited,
            summary.output_dir.display()
        );

        Ok(summary)
    }

    fn slice<const C: usize>(
        &self,
        image: Image<f32, C>,
        format: PixelFormat,
        plan: &RectifyPlan,
        layout: &GridLayout,
        output_dir: &Path,
    ) -> Result<CropSummary, CropError> {
        let rectified = plan.warp(&image, format)?;
        drop(image);

        let mut slicer = Slicer::new(
            &rectified,
            layout,
            self.request.config.patch_size as usize,
            output_dir,
        )
        .naming(self.naming.as_ref())
        .date(self.request.date());

        if let Some(token) = &self.cancel {
            slicer = slicer.cancel_token(token);
        }
        if let Some(progress) = &self.progress {
            slicer = slicer.progress(progress.as_ref());
        }

        slicer.run(self.strategy)
    }
}

/// Status field of a [`CropResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropStatus {
    /// The job completed.
    Success,
    /// The job failed.
    Error,
}

/// Response returned to the user interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropResponse {
    /// `"success"` or `"error"`.
    pub status: CropStatus,
    /// Human readable outcome.
    pub message: String,
}

impl CropResponse {
    /// Whether the job completed.
    pub fn is_success(&self) -> bool {
        self.status == CropStatus::Success
    }
}

impl From<Result<CropSummary, CropError>> for CropResponse {
    fn from(result: Result<CropSummary, CropError>) -> Self {
        match result {
            Ok(summary) => {
                let mut message = format!(
                    "Done! {} patches saved to '{}'.",
                    summary.patches_written,
                    summary.output_dir.display()
                );
                if summary.patches_failed > 0 {
                    message.push_str(&format!(" {} patches failed.", summary.patches_failed));
                }
                CropResponse {
                    status: CropStatus::Success,
                    message,
                }
            }
            Err(err) => CropResponse {
                status: CropStatus::Error,
                message: err.to_string(),
            },
        }
    }
}

/// Run a crop job with default settings and convert its outcome into a response.
pub fn process_crop(request: CropRequest) -> CropResponse {
    let result = CropJob::new(request).run();
    if let Err(err) = &result {
        error!("crop job failed ({}): {err}", err.kind());
    }
    result.into()
}

/// Parse a JSON request and run it, reporting malformed input as an error response.
pub fn process_crop_json(json: &str) -> CropResponse {
    match serde_json::from_str::<CropRequest>(json) {
        Ok(request) => process_crop(request),
        Err(err) => CropResponse::from(Err(CropError::Config(format!(
            "malformed request: {err}"
        )))),
    }
}
