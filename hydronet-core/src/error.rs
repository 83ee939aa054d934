use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid locations")]
    InvalidLocations,
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Split offset {offset} is outside branch geometry of length {length}")]
    InvalidSplitOffset { offset: f64, length: f64 },
    #[error("Locations on different branches cannot be compared")]
    Comparison,
    #[error("Unknown branch")]
    UnknownBranch,
    #[error("Unknown node")]
    UnknownNode,
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}

impl From<geojson::Error> for Error {
    fn from(err: geojson::Error) -> Self {
        Error::GeoJsonError(err.to_string())
    }
}
