use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{check_range, IngestError};
use crate::geodetic::lla_from_ecef;
use crate::report::SeriesQualityReport;
use crate::stats::timing_stats;

/// GNSS solution quality flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixQuality {
    /// Integer-ambiguity-resolved solution (flag 1).
    Fix,
    /// Float-ambiguity solution (flag 2).
    Float,
    /// Anything else; the raw flag is kept so exports reproduce it.
    Other(i32),
}

impl FixQuality {
    pub fn from_flag(flag: i32) -> Self {
        match flag {
            1 => FixQuality::Fix,
            2 => FixQuality::Float,
            other => FixQuality::Other(other),
        }
    }

    pub fn flag(&self) -> i32 {
        match self {
            FixQuality::Fix => 1,
            FixQuality::Float => 2,
            FixQuality::Other(flag) => *flag,
        }
    }
}

/// One parsed GNSS fix: GPS time, ECEF position, the derived geodetic
/// position, and the solution quality. Immutable after construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Seconds on the GPS time scale.
    pub time: f64,
    /// ECEF position, meters.
    pub ecef: Vector3<f64>,
    /// Geodetic latitude, degrees.
    pub lat: f64,
    /// Geodetic longitude, degrees.
    pub lon: f64,
    /// Altitude above the reference ellipsoid, meters.
    pub alt: f64,
    pub fix: FixQuality,
}

/// Immutable GNSS series produced by [`load_gnss`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GnssDataset {
    fixes: Vec<PositionFix>,
}

/// Load a whitespace-delimited GNSS position log.
///
/// Blank lines and `%`-prefixed comment lines are skipped. Each remaining
/// line carries a textual timestamp label (discarded) followed by
/// `time x y z fixFlag`; extra trailing fields are ignored. Lines with
/// missing or non-numeric fields are silently dropped — a tolerance policy
/// for malformed trailing lines, not an error.
///
/// ECEF positions are converted to geodetic in one batch after parsing; a
/// conversion failure aborts the whole load with no partial dataset.
pub fn load_gnss<P: AsRef<Path>>(path: P) -> Result<GnssDataset, IngestError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IngestError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    log::info!("loading GNSS data from {}", path.display());

    let mut times: Vec<f64> = Vec::new();
    let mut ecef: Vec<Vector3<f64>> = Vec::new();
    let mut flags: Vec<i32> = Vec::new();
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line.map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        // First column is a textual timestamp label (e.g. "GPST"), ignored.
        if tokens.next().is_none() {
            continue;
        }
        match parse_fields(&mut tokens) {
            Some((time, x, y, z, flag)) => {
                times.push(time);
                ecef.push(Vector3::new(x, y, z));
                flags.push(flag);
            }
            None => skipped += 1,
        }
    }

    let lla = lla_from_ecef(&ecef)?;

    let fixes: Vec<PositionFix> = times
        .iter()
        .zip(&ecef)
        .zip(&lla)
        .zip(&flags)
        .map(|(((&time, &ecef), &(lat, lon, alt)), &flag)| PositionFix {
            time,
            ecef,
            lat,
            lon,
            alt,
            fix: FixQuality::from_flag(flag),
        })
        .collect();

    if skipped > 0 {
        log::debug!("skipped {skipped} malformed lines in {}", path.display());
    }
    log::info!("loaded {} GNSS fixes", fixes.len());

    Ok(GnssDataset { fixes })
}

fn parse_fields(tokens: &mut std::str::SplitWhitespace<'_>) -> Option<(f64, f64, f64, f64, i32)> {
    let time = tokens.next()?.parse().ok()?;
    let x = tokens.next()?.parse().ok()?;
    let y = tokens.next()?.parse().ok()?;
    let z = tokens.next()?.parse().ok()?;
    let flag = tokens.next()?.parse().ok()?;
    Some((time, x, y, z, flag))
}

impl GnssDataset {
    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn fixes(&self) -> &[PositionFix] {
        &self.fixes
    }

    /// Sampling-quality summary; `fix_ratio` is the fraction of fixes with
    /// flag 1.
    pub fn quality_report(&self) -> SeriesQualityReport {
        let times: Vec<f64> = self.fixes.iter().map(|f| f.time).collect();
        let fix_ratio = if self.fixes.is_empty() {
            0.0
        } else {
            let fixed = self.fixes.iter().filter(|f| f.fix == FixQuality::Fix).count();
            fixed as f64 / self.fixes.len() as f64
        };
        SeriesQualityReport {
            sample_count: self.fixes.len(),
            timing: timing_stats(&times),
            fix_ratio: Some(fix_ratio),
            imu_model: None,
        }
    }

    /// Write the slice `[start, end)` as tab-separated text: header
    /// `Time\tX\tY\tZ\tLat\tLon\tAlt\tFix`, floats at 12 decimals, fix as
    /// integer. Invalid bounds fail with [`IngestError::Range`] before any
    /// file is created.
    pub fn export_tsv<P: AsRef<Path>>(
        &self,
        path: P,
        start: usize,
        end: usize,
    ) -> Result<(), IngestError> {
        check_range(start, end, self.fixes.len())?;
        let path = path.as_ref();
        log::info!("writing GNSS data to {}", path.display());
        self.write_tsv(path, start, end)
            .map_err(|source| IngestError::FileOpen {
                path: path.to_path_buf(),
                source,
            })
    }

    fn write_tsv(&self, path: &Path, start: usize, end: usize) -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "Time\tX\tY\tZ\tLat\tLon\tAlt\tFix")?;
        for fix in &self.fixes[start..end] {
            writeln!(
                out,
                "{:.12}\t{:.12}\t{:.12}\t{:.12}\t{:.12}\t{:.12}\t{:.12}\t{}",
                fix.time,
                fix.ecef.x,
                fix.ecef.y,
                fix.ecef.z,
                fix.lat,
                fix.lon,
                fix.alt,
                fix.fix.flag()
            )?;
        }
        out.flush()
    }
}
