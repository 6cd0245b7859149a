use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the ingestion pipeline.
///
/// Every variant is terminal for the operation that raised it: readers and
/// exporters abort immediately and hand back no partial result.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Source file could not be opened (or an output file created).
    #[error("failed to open {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the file did not complete.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// ECEF input too close to the geodetic singularity for the closed-form
    /// conversion to be valid.
    #[error("ecef point {index} is too close to the geodetic singularity")]
    NumericRange { index: usize },

    /// No IMU scale profile reproduced ~1 g static gravity.
    #[error("accelerometer scale does not match gravity")]
    SensorCalibration,

    /// Export slice bounds are inverted or run past the end of the series.
    #[error("invalid export range [{start}, {end}) for {len} samples")]
    Range {
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Validate a half-open export range `[start, end)` against a series length.
pub(crate) fn check_range(start: usize, end: usize, len: usize) -> Result<(), IngestError> {
    if start >= end || end > len {
        return Err(IngestError::Range { start, end, len });
    }
    Ok(())
}
