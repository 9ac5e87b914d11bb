#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! A crop job takes three reference points clicked on a downscaled preview of a scan,
//! de-skews the full resolution image with an affine warp and slices the rectified
//! area into a grid of groups, cells and fixed-size patches written to disk.
//!
//! ```no_run
//! use ricegrid::{CropJob, CropRequest};
//!
//! let request: CropRequest = serde_json::from_str(r#"{
//!     "path": "plate.tif",
//!     "clicks": [{"x": 10, "y": 10}, {"x": 900, "y": 12}, {"x": 8, "y": 600}],
//!     "preview_size": {"w": 1024, "h": 768},
//!     "config": {"rows": 6, "cols": 4, "groups": 1, "margin": 0}
//! }"#).unwrap();
//!
//! let summary = CropJob::new(request).run().unwrap();
//! println!("{} patches in {}", summary.patches_written, summary.output_dir.display());
//! ```

/// Error types of the crop pipeline.
pub mod error;

/// Points and preview geometry in preview pixel space.
pub mod geometry;

/// Grid configuration and cell layout.
pub mod grid;

/// Crop job entry point and its request and response types.
pub mod job;

/// Patch tiling and file naming strategies.
pub mod patch;

/// Persistent grid presets.
pub mod preset;

/// Downscaled previews of source images.
pub mod preview;

/// Three point affine rectification.
pub mod rectify;

/// Per cell extraction, normalization and patch writing.
pub mod slicer;

pub use crate::error::{CropError, ErrorKind};
pub use crate::geometry::{Point2, PreviewGeometry};
pub use crate::grid::{Cell, GridConfig, GridLayout, GroupDirection};
pub use crate::job::{
    process_crop, process_crop_json, CancelToken, CropJob, CropRequest, CropResponse, CropStatus,
    CropSummary, Progress,
};
pub use crate::patch::{ClusterNaming, DatedNaming, PatchKey, PatchNaming};
pub use crate::rectify::{rectify, RectifiedImage, RectifyPlan};

pub use ricegrid_imgproc::parallel::ExecutionStrategy;
