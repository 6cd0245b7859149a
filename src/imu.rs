use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{check_range, IngestError};
use crate::report::SeriesQualityReport;
use crate::stats::timing_stats;

/// Bytes per raw log record: eight little-endian 32-bit words.
const RECORD_BYTES: usize = 32;
const RECORD_WORDS: usize = 8;

/// Samples averaged for the static gravity check.
const GRAVITY_WINDOW: usize = 10;
/// Accepted deviation of the averaged magnitude from 1 g.
const GRAVITY_TOLERANCE: f64 = 0.05;

/// Supported IMU hardware profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImuModel {
    Adis16495,
    Adis16490,
}

/// Raw-LSB to physical-unit conversion constants for one profile.
#[derive(Clone, Copy, Debug)]
pub struct ScaleFactors {
    /// rad/s per LSB.
    pub gyro: f64,
    /// g per LSB.
    pub accel: f64,
}

impl ImuModel {
    /// Auto-detection candidates, tried in this order.
    pub const DETECTION_ORDER: [ImuModel; 2] = [ImuModel::Adis16495, ImuModel::Adis16490];

    pub fn id(&self) -> u32 {
        match self {
            ImuModel::Adis16495 => 16495,
            ImuModel::Adis16490 => 16490,
        }
    }

    pub fn from_id(id: u32) -> Option<ImuModel> {
        match id {
            16495 => Some(ImuModel::Adis16495),
            16490 => Some(ImuModel::Adis16490),
            _ => None,
        }
    }

    /// Per-model scale factors. Supporting a new device means one more
    /// variant, one arm here, and a `DETECTION_ORDER` entry.
    pub fn scale(&self) -> ScaleFactors {
        match self {
            ImuModel::Adis16495 => ScaleFactors {
                gyro: 6.25e-3 / (1 << 16) as f64,
                accel: 2.5e-4 / (1 << 16) as f64,
            },
            ImuModel::Adis16490 => ScaleFactors {
                gyro: 5e-3 / (1 << 16) as f64,
                accel: 5e-4 / (1 << 16) as f64,
            },
        }
    }
}

/// One decoded inertial sample in physical units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InertialSample {
    /// Seconds (from the 64-bit nanosecond counter).
    pub timestamp: f64,
    /// Specific force, g.
    pub accel: Vector3<f64>,
    /// Angular rate, rad/s.
    pub gyro: Vector3<f64>,
}

/// Immutable IMU series plus the resolved hardware model, produced by
/// [`load_imu`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImuDataset {
    samples: Vec<InertialSample>,
    model: ImuModel,
}

/// One undecoded 32-byte log record.
///
/// Words 0:1 hold the low:high halves of a 64-bit nanosecond timestamp,
/// words 2..4 the signed raw gyro X/Y/Z, words 5..7 the signed raw
/// accelerometer X/Y/Z.
#[derive(Clone, Copy, Debug)]
struct RawRecord {
    words: [u32; RECORD_WORDS],
}

impl RawRecord {
    fn from_bytes(chunk: &[u8]) -> RawRecord {
        let mut words = [0u32; RECORD_WORDS];
        for (word, le) in words.iter_mut().zip(chunk.chunks_exact(4)) {
            *word = u32::from_le_bytes([le[0], le[1], le[2], le[3]]);
        }
        RawRecord { words }
    }

    fn timestamp_s(&self) -> f64 {
        let ns = ((self.words[1] as u64) << 32) | self.words[0] as u64;
        ns as f64 / 1e9
    }

    fn gyro(&self, scale: &ScaleFactors) -> Vector3<f64> {
        Vector3::new(
            self.words[2] as i32 as f64 * scale.gyro,
            self.words[3] as i32 as f64 * scale.gyro,
            self.words[4] as i32 as f64 * scale.gyro,
        )
    }

    fn accel(&self, scale: &ScaleFactors) -> Vector3<f64> {
        Vector3::new(
            self.words[5] as i32 as f64 * scale.accel,
            self.words[6] as i32 as f64 * scale.accel,
            self.words[7] as i32 as f64 * scale.accel,
        )
    }
}

/// Load a raw binary IMU log and resolve its hardware model.
///
/// `hint` pins the resolution to a single model; `None` tries the
/// candidates in [`ImuModel::DETECTION_ORDER`]. A pinned model that fails
/// the gravity check is terminal — the search never falls through to the
/// other candidates. Trailing bytes short of a full 32-byte record are
/// dropped. Samples repeating the immediately preceding timestamp are
/// removed before the dataset is returned.
pub fn load_imu<P: AsRef<Path>>(
    path: P,
    hint: Option<ImuModel>,
) -> Result<ImuDataset, IngestError> {
    let path = path.as_ref();
    log::info!("loading IMU data from {}", path.display());

    let mut file = File::open(path).map_err(|source| IngestError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    let records: Vec<RawRecord> = bytes
        .chunks_exact(RECORD_BYTES)
        .map(RawRecord::from_bytes)
        .collect();

    let candidates: Vec<ImuModel> = match hint {
        Some(model) => vec![model],
        None => ImuModel::DETECTION_ORDER.to_vec(),
    };

    let mut resolved = None;
    for model in candidates {
        if let Some(samples) = try_resolve(model, &records) {
            resolved = Some((model, samples));
            break;
        }
    }
    let (model, mut samples) = resolved.ok_or(IngestError::SensorCalibration)?;

    dedup_consecutive_timestamps(&mut samples);
    log::info!("resolved IMU model {}, {} samples", model.id(), samples.len());

    Ok(ImuDataset { samples, model })
}

/// Scale a raw series under one model profile and accept it iff the static
/// gravity check passes: the accelerometer magnitude averaged over the
/// first [`GRAVITY_WINDOW`] samples must land within
/// [`GRAVITY_TOLERANCE`] of 1 g.
fn try_resolve(model: ImuModel, records: &[RawRecord]) -> Option<Vec<InertialSample>> {
    let scale = model.scale();
    let samples: Vec<InertialSample> = records
        .iter()
        .map(|r| InertialSample {
            timestamp: r.timestamp_s(),
            accel: r.accel(&scale),
            gyro: r.gyro(&scale),
        })
        .collect();

    let window = samples.len().min(GRAVITY_WINDOW);
    // An empty series averages to NaN and fails the check below.
    let g0 = samples[..window].iter().map(|s| s.accel.norm()).sum::<f64>() / window as f64;
    if (g0 - 1.0).abs() < GRAVITY_TOLERANCE {
        Some(samples)
    } else {
        log::debug!(
            "model {} rejected: static gravity averaged {:.3} g",
            model.id(),
            g0
        );
        None
    }
}

/// Drop samples repeating the immediately preceding timestamp. The first
/// occurrence wins; non-adjacent repeats are untouched.
fn dedup_consecutive_timestamps(samples: &mut Vec<InertialSample>) {
    samples.dedup_by(|next, prev| next.timestamp == prev.timestamp);
}

impl ImuDataset {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[InertialSample] {
        &self.samples
    }

    pub fn model(&self) -> ImuModel {
        self.model
    }

    /// Sampling-quality summary, carrying the resolved model id.
    pub fn quality_report(&self) -> SeriesQualityReport {
        let times: Vec<f64> = self.samples.iter().map(|s| s.timestamp).collect();
        SeriesQualityReport {
            sample_count: self.samples.len(),
            timing: timing_stats(&times),
            fix_ratio: None,
            imu_model: Some(self.model.id()),
        }
    }

    /// Write the slice `[start, end)` as tab-separated text: header
    /// `TimeStamp\tAccX\tAccY\tAccZ\tGx\tGy\tGz`, floats at 9 decimals.
    /// Invalid bounds fail with [`IngestError::Range`] before any file is
    /// created.
    pub fn export_tsv<P: AsRef<Path>>(
        &self,
        path: P,
        start: usize,
        end: usize,
    ) -> Result<(), IngestError> {
        check_range(start, end, self.samples.len())?;
        let path = path.as_ref();
        log::info!("writing IMU data to {}", path.display());
        self.write_tsv(path, start, end)
            .map_err(|source| IngestError::FileOpen {
                path: path.to_path_buf(),
                source,
            })
    }

    fn write_tsv(&self, path: &Path, start: usize, end: usize) -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "TimeStamp\tAccX\tAccY\tAccZ\tGx\tGy\tGz")?;
        for s in &self.samples[start..end] {
            writeln!(
                out,
                "{:.9}\t{:.9}\t{:.9}\t{:.9}\t{:.9}\t{:.9}\t{:.9}",
                s.timestamp, s.accel.x, s.accel.y, s.accel.z, s.gyro.x, s.gyro.y, s.gyro.z
            )?;
        }
        out.flush()
    }
}
