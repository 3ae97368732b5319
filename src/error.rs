//! Error types for volume loading and configuration.

use thiserror::Error;

/// Errors that can occur while loading a voxel volume.
#[derive(Error, Debug)]
pub enum VolumeError {
    /// I/O error while reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source is not in the expected format.
    #[error("invalid volume format: {message}")]
    InvalidFormat {
        /// Description of the format error.
        message: String,
    },

    /// The source is a recognised variant that this loader can't decode.
    #[error("unsupported volume format: {format}")]
    Unsupported {
        /// Name of the variant.
        format: String,
    },

    /// The sample data ended early.
    #[error("volume data truncated: expected {expected} bytes, got {got}")]
    Truncated {
        /// Number of bytes the header promised.
        expected: usize,
        /// Number of bytes actually present.
        got: usize,
    },

    /// Dimensions are zero or too large to allocate.
    #[error("invalid volume dimensions: {x}x{y}x{z}")]
    InvalidDimensions {
        /// Width.
        x: u32,
        /// Height.
        y: u32,
        /// Depth.
        z: u32,
    },
}

impl VolumeError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        VolumeError::InvalidFormat {
            message: message.into(),
        }
    }
}

/// Errors that can occur while reading a [`MarchConfig`](crate::MarchConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error while reading the config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds an unusable value.
    #[error("invalid configuration: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

/// Result type alias for volume operations.
pub type Result<T> = std::result::Result<T, VolumeError>;

#[test]
fn error_display() {
    let err = VolumeError::Truncated { expected: 64, got: 10 };
    let text = err.to_string();
    assert!(text.contains("64"));
    assert!(text.contains("10"));

    let err = VolumeError::InvalidDimensions { x: 0, y: 4, z: 4 };
    assert_eq!(err.to_string(), "invalid volume dimensions: 0x4x4");

    let err = VolumeError::format("bad magic");
    assert_eq!(err.to_string(), "invalid volume format: bad magic");
}

#[test]
fn io_error_converts() {
    fn open_missing() -> Result<()> {
        std::fs::File::open("/definitely/not/a/volume.pvm")?;
        Ok(())
    }

    assert!(matches!(open_missing(), Err(VolumeError::Io(_))));
}
