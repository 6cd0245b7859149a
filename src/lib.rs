//! Navigation-sensor log ingestion and quality assessment.
//!
//! Parses GNSS position logs and raw binary IMU logs into immutable
//! in-memory datasets: ECEF fixes are converted to geodetic coordinates
//! with a closed-form solver, the IMU scale profile is auto-detected
//! against static gravity, and both streams share a median-interval
//! sampling-quality report. A preprocessing stage for inertial-GNSS
//! fusion; the fusion itself lives elsewhere.

pub mod error;
pub mod geodetic;
pub mod gnss;
pub mod imu;
pub mod report;
pub mod stats;

pub use error::IngestError;
pub use gnss::{load_gnss, FixQuality, GnssDataset, PositionFix};
pub use imu::{load_imu, ImuDataset, ImuModel, InertialSample};
pub use report::SeriesQualityReport;
pub use stats::{timing_stats, TimingStats};
