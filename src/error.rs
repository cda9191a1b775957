pub type Result<T> = std::result::Result<T, SmoothError>;

#[derive(Debug, thiserror::Error)]
pub enum SmoothError {
    #[error("Invalid radius: {0} (must be finite and >= 0)")]
    InvalidRadius(f64),

    /// A radius query came back empty for an indexed point. The index always
    /// returns the query point itself, so this is a bug, not bad input.
    #[error("Empty neighborhood: centroid of zero points")]
    EmptyNeighborhood,

    #[error("Non-finite coordinate at point {index}")]
    NonFiniteCoordinate { index: usize },

    #[error("Buffer length {0} is not divisible by 3")]
    InvalidBufferLength(usize),

    #[error("Point count {0} does not fit the u32 wire header")]
    PointCountOverflow(usize),

    #[error("Smoothing cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
