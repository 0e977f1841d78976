use std::{error, fmt, io};

use serde_json::Error as SerdeError;

/// Error type for map loading and rendering.
#[derive(Debug)]
pub enum Error {
    /// Only orthogonal and hexagonal maps have a rendering engine
    UnsupportedOrientation,
    /// Only the right-down render order is supported
    UnsupportedRenderOrder,
    /// A layer or group index is out of range
    OutOfBounds,
    /// Unsupported file format (non-JSON)
    UnsupportedFormat(String),
    /// A layer's data length does not match width * height
    InvalidLayerSize(String),
    /// JSON parse error
    Parse(SerdeError),
    /// File I/O error
    Io(io::Error),
    /// Image decode or encode error
    Image(image::ImageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedOrientation => write!(f, "Unsupported map orientation"),
            Error::UnsupportedRenderOrder => write!(f, "Unsupported render order"),
            Error::OutOfBounds => write!(f, "Layer index out of bounds"),
            Error::UnsupportedFormat(path) => write!(f, "Unsupported file format: {}", path),
            Error::InvalidLayerSize(name) => write!(
                f,
                "Invalid layer size for layer '{}': data length does not match map dimensions",
                name
            ),
            Error::Parse(err) => write!(f, "Failed to parse JSON: {}", err),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Image(err) => write!(f, "Image error: {}", err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<SerdeError> for Error {
    fn from(err: SerdeError) -> Self {
        Error::Parse(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err)
    }
}

impl error::Error for Error {}
