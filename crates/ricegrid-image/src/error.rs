/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when two images are expected to share a size.
    #[error("Invalid image size: ({0}, {1}) vs ({2}, {3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when a pixel value cannot be represented in the target type.
    #[error("Failed to cast pixel data to {0}")]
    CastError(String),

    /// Error when the pixel coordinates are out of bounds.
    #[error("Pixel ({0}, {1}) is out of bounds for an image of size ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when an operation needs at least one pixel.
    #[error("Image data is empty")]
    EmptyImage,

    /// Error when a rectangular region does not fit inside the image.
    #[error("Region at ({0}, {1}) with size {2}x{3} exceeds the image bounds")]
    RegionOutOfBounds(usize, usize, usize, usize),

    /// Error when the resampler rejects the buffers.
    #[error("Failed to resize the image: {0}")]
    ResizeError(String),
}
