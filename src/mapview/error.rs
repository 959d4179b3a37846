use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapViewError>;

#[derive(Error, Debug)]
pub enum MapViewError {
    #[error("failed to read map file: {0}")]
    Io(#[from] io::Error),

    #[error("malformed map file: {0}")]
    Csv(#[from] csv::Error),

    /// A field that does not parse as an integer. Rows and columns are zero-based.
    #[error("cell at row {row}, column {column} is not an integer: {value:?}")]
    InvalidCell {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("map file contains no cells")]
    EmptyGrid,

    #[error("scale must be at least 1, got {0}")]
    InvalidScale(u32),

    #[error("{width}x{height} grid at scale {scale} exceeds the maximum image size")]
    ImageTooLarge {
        width: usize,
        height: usize,
        scale: u32,
    },

    #[error("grid is {found_width}x{found_height}, display expects {expected_width}x{expected_height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        found_width: u32,
        found_height: u32,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("window error: {0}")]
    Window(String),
}
