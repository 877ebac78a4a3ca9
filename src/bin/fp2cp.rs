//! Simulate compact-pol products from a quad-pol acquisition.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use compactsar::core::AlosCalibrationConstants;
use compactsar::{Acquisition, CompactPolMode, FeatureSet, Pipeline, ProcessingConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fp2cp", version, about = "Fully-polarimetric to compact-polarimetric SAR simulator")]
struct Cli {
    #[command(subcommand)]
    sensor: SensorCommand,
}

#[derive(Subcommand, Debug)]
enum SensorCommand {
    /// Four I/Q GeoTIFFs calibrated with a gain/offset LUT
    Radarsat2 {
        #[arg(long)]
        hh: PathBuf,
        #[arg(long)]
        hv: PathBuf,
        #[arg(long)]
        vh: PathBuf,
        #[arg(long)]
        vv: PathBuf,

        /// Calibration LUT XML (offset + per-column gains)
        #[arg(long)]
        lut: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Multi-band ALOS-PALSAR volume calibrated with a constant factor
    AlosPalsar {
        /// VOL-ALPSRP*.1__A volume file
        #[arg(long)]
        volume: PathBuf,

        /// Calibration constant CF in dB
        #[arg(long, default_value_t = -83.0, allow_hyphen_values = true)]
        cf: f64,

        /// Calibration constant offset in dB
        #[arg(long, default_value_t = 32.0, allow_hyphen_values = true)]
        cf_offset: f64,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    /// Right-circular hybrid
    Rhv,
    /// Left-circular hybrid
    Lhv,
    /// Pi/4
    Pi4,
}

impl From<ModeArg> for CompactPolMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Rhv => CompactPolMode::RightHybrid,
            ModeArg::Lhv => CompactPolMode::LeftHybrid,
            ModeArg::Pi4 => CompactPolMode::QuarterPi,
        }
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Compact-pol mode to simulate
    #[arg(long, value_enum)]
    mode: ModeArg,

    /// Write the scattering vector (S2_<mode>)
    #[arg(long, default_value_t = false)]
    scattering: bool,

    /// Write the covariance matrix (C2_<mode>)
    #[arg(long, default_value_t = false)]
    covariance: bool,

    /// Directory receiving the output folders
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

impl OutputArgs {
    fn config(&self) -> compactsar::SarResult<ProcessingConfig> {
        let features = FeatureSet::from_flags(self.scattering, self.covariance)?;
        Ok(ProcessingConfig::new(self.mode.into(), features, &self.output_dir))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    // Selection is validated before any raster is touched
    let (acquisition, config) = match cli.sensor {
        SensorCommand::Radarsat2 { hh, hv, vh, vv, lut, output } => {
            let config = output.config()?;
            let acquisition = Acquisition::radarsat2(&[hh, hv, vh, vv], &lut)
                .context("reading RADARSAT-2 acquisition")?;
            (acquisition, config)
        }
        SensorCommand::AlosPalsar { volume, cf, cf_offset, output } => {
            let mut config = output.config()?;
            config.alos = AlosCalibrationConstants { cf_db: cf, cf_offset_db: cf_offset };
            let acquisition = Acquisition::alos_palsar(&volume, &config.alos)
                .context("reading ALOS-PALSAR acquisition")?;
            (acquisition, config)
        }
    };

    let report = Pipeline::new(config).run(&acquisition).context("compact-pol simulation")?;
    for path in &report.written {
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use compactsar::Feature;

    fn output_of(args: &[&str]) -> OutputArgs {
        match Cli::try_parse_from(args.iter().copied()).unwrap().sensor {
            SensorCommand::Radarsat2 { output, .. } => output,
            SensorCommand::AlosPalsar { output, .. } => output,
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_feature_is_a_selection_error() {
        let output = output_of(&["fp2cp", "alos-palsar", "--volume", "/nonexistent/VOL", "--mode", "rhv"]);
        let err = output.config().unwrap_err();
        assert_eq!(err.kind(), "selection");
    }

    #[test]
    fn test_mode_is_required() {
        let err = Cli::try_parse_from(["fp2cp", "alos-palsar", "--volume", "v", "--scattering"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_radarsat2_arguments() {
        let output = output_of(&[
            "fp2cp", "radarsat2", "--hh", "hh.tif", "--hv", "hv.tif", "--vh", "vh.tif", "--vv", "vv.tif",
            "--lut", "lutSigma.xml", "--mode", "pi4", "--covariance", "--output-dir", "out",
        ]);
        let config = output.config().unwrap();
        assert_eq!(config.mode, CompactPolMode::QuarterPi);
        assert!(config.features.contains(Feature::Covariance));
        assert!(!config.features.contains(Feature::Scattering));
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_alos_constants_accept_negative_values() {
        let cli = Cli::try_parse_from([
            "fp2cp", "alos-palsar", "--volume", "v", "--cf", "-80.5", "--mode", "lhv", "--scattering",
        ])
        .unwrap();
        match cli.sensor {
            SensorCommand::AlosPalsar { cf, cf_offset, .. } => {
                assert_eq!(cf, -80.5);
                assert_eq!(cf_offset, 32.0);
            }
            other => panic!("unexpected subcommand {:?}", other),
        }
    }
}
