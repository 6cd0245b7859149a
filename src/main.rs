use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;

use navlog_rs::{load_gnss, load_imu, ImuModel};

#[derive(Parser, Debug)]
#[command(name = "navlog")]
#[command(about = "Ingest GNSS/IMU logs, report sampling quality, export slices", long_about = None)]
struct Args {
    /// GNSS position log (whitespace-delimited text)
    #[arg(long)]
    gnss: Option<PathBuf>,

    /// IMU log (raw binary, 32 bytes per sample)
    #[arg(long)]
    imu: Option<PathBuf>,

    /// IMU model id (16490 or 16495); omit to auto-detect
    #[arg(long)]
    imu_model: Option<u32>,

    /// Write a GNSS TSV slice here
    #[arg(long)]
    export_gnss: Option<PathBuf>,

    /// Write an IMU TSV slice here
    #[arg(long)]
    export_imu: Option<PathBuf>,

    /// First exported sample index (inclusive)
    #[arg(long, default_value = "0")]
    start: usize,

    /// Last exported sample index (exclusive; 0 = series length)
    #[arg(long, default_value = "0")]
    end: usize,

    /// Print reports as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.gnss.is_none() && args.imu.is_none() {
        bail!("Provide --gnss and/or --imu");
    }

    if let Some(path) = args.gnss.as_ref() {
        println!("[{}] Loading GNSS log {}", ts_now(), path.display());
        let dataset = load_gnss(path).with_context(|| format!("loading {}", path.display()))?;
        let report = dataset.quality_report();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", report.render("GNSS"));
        }
        if let Some(out) = args.export_gnss.as_ref() {
            let end = if args.end == 0 { dataset.len() } else { args.end };
            dataset
                .export_tsv(out, args.start, end)
                .with_context(|| format!("exporting {}", out.display()))?;
            println!(
                "[{}] Wrote {} GNSS rows to {}",
                ts_now(),
                end - args.start,
                out.display()
            );
        }
    }

    if let Some(path) = args.imu.as_ref() {
        let hint = match args.imu_model {
            Some(id) => Some(
                ImuModel::from_id(id).with_context(|| format!("unsupported IMU model id {id}"))?,
            ),
            None => None,
        };
        println!("[{}] Loading IMU log {}", ts_now(), path.display());
        let dataset = load_imu(path, hint).with_context(|| format!("loading {}", path.display()))?;
        let report = dataset.quality_report();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", report.render("IMU"));
        }
        if let Some(out) = args.export_imu.as_ref() {
            let end = if args.end == 0 { dataset.len() } else { args.end };
            dataset
                .export_tsv(out, args.start, end)
                .with_context(|| format!("exporting {}", out.display()))?;
            println!(
                "[{}] Wrote {} IMU rows to {}",
                ts_now(),
                end - args.start,
                out.display()
            );
        }
    }

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
