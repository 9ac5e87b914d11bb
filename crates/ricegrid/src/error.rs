use ricegrid_image::ImageError;
use ricegrid_imgproc::parallel::ParallelError;
use ricegrid_io::IoError;

/// Category of a [`CropError`].
///
/// `Encode` and `Io` failures of single patches are recoverable: they are logged and
/// counted while the job continues. Every other kind aborts the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source image is missing, unreadable or corrupt.
    ImageLoad,
    /// Degenerate reference points or a grid that does not fit the rectified area.
    Geometry,
    /// Invalid counts, sizes or preview dimensions.
    Config,
    /// A patch could not be encoded.
    Encode,
    /// A file or directory could not be written.
    Io,
    /// The job was cancelled by the caller.
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ErrorKind::ImageLoad => "image load",
            ErrorKind::Geometry => "geometry",
            ErrorKind::Config => "config",
            ErrorKind::Encode => "encode",
            ErrorKind::Io => "io",
            ErrorKind::Cancelled => "cancelled",
        };
        write!(f, "{name}")
    }
}

/// An error type for crop jobs.
#[derive(thiserror::Error, Debug)]
pub enum CropError {
    /// The source image could not be read.
    #[error("Failed to load the source image. {0}")]
    ImageLoad(#[source] IoError),

    /// The reference points or the grid produce an unusable geometry.
    #[error("Invalid geometry: {0}")]
    Geometry(String),

    /// The job configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A patch could not be encoded.
    #[error("Failed to encode patch. {0}")]
    Encode(#[source] IoError),

    /// A file system operation failed.
    #[error("Failed to write output. {0}")]
    Io(#[from] std::io::Error),

    /// An image buffer operation failed.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The worker pool could not be set up.
    #[error(transparent)]
    Parallel(#[from] ParallelError),

    /// The job was cancelled between two cells.
    #[error("Job cancelled after writing {patches_written} patches")]
    Cancelled {
        /// Number of patches on disk when the job stopped.
        patches_written: usize,
    },
}

impl CropError {
    /// The taxonomy category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CropError::ImageLoad(_) => ErrorKind::ImageLoad,
            CropError::Geometry(_) | CropError::Image(_) => ErrorKind::Geometry,
            CropError::Config(_) | CropError::Parallel(_) => ErrorKind::Config,
            CropError::Encode(_) => ErrorKind::Encode,
            CropError::Io(_) => ErrorKind::Io,
            CropError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Whether the job can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Encode | ErrorKind::Io)
    }

    /// Classify an error raised while writing a single patch.
    pub(crate) fn from_write(err: IoError) -> Self {
        match err {
            IoError::FileError(e) => CropError::Io(e),
            other => CropError::Encode(other),
        }
    }
}
