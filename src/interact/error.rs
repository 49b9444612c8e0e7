use thiserror::Error;

/// Errors that can occur while loading tables, images and building figures
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Table read/cast error from polars
    #[error("Table error: {0}")]
    Table(#[from] polars::error::PolarsError),

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A column referenced by the viewer is not in the table
    #[error("Column '{0}' not found in table")]
    MissingColumn(String),

    /// Row index beyond the table height
    #[error("Row {row} out of range (table has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    /// A path cell is null
    #[error("No image path in column '{column}' for row {row}")]
    MissingPath { column: String, row: usize },

    /// Channel dictionary with more than three entries
    #[error("Expected up to 3 channels got {0}")]
    TooManyChannels(usize),

    /// Channel dictionary with keys other than red/green/blue
    #[error("Unexpected channel name(s): {0:?}")]
    UnexpectedChannelName(Vec<String>),

    /// Channels of one sample have different dimensions
    #[error("Channel '{label}' is {got:?}, expected {expected:?}")]
    ShapeMismatch {
        label: String,
        expected: (u32, u32),
        got: (u32, u32),
    },

    /// Composite requested without any channel
    #[error("No channels to display")]
    NoChannels,

    /// Configuration error (bad config file, invalid override)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Type alias for Results using ViewerError
pub type Result<T> = std::result::Result<T, ViewerError>;
