use crate::{
    env::Env,
    stats::Summary,
    tasks::experiments::plot::{ChartKind, ImageFormat, Point, Series},
};
use anyhow::Result;
use clap::{Args, Subcommand};
use csv::Writer;
use log::{error, info};
use serde::Serialize;
use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

pub mod adhoc_multihop;
pub mod color;
pub mod he_wifi;
pub mod plot;

/// Column names shared by the ns-3 result files.
pub const RNG_RUN: &str = "RngRun";
pub const THROUGHPUT: &str = "Throughput";

/// Supported experiments. Each reads the CSV that the matching ns-3 scenario
/// appends to after every run.
#[derive(Debug, Subcommand)]
pub enum Experiment {
    /// Per-flow and aggregate throughput vs. offered load in an ad-hoc
    /// multi-hop network
    AdhocMultihop {
        #[command(subcommand)]
        sub_command: ExperimentSubCommand,
    },
    /// Aggregate throughput of an IEEE 802.11ax network vs. number of
    /// transmitting stations
    HeWifiPerformance {
        #[command(subcommand)]
        sub_command: ExperimentSubCommand,
    },
}

impl Experiment {
    pub const ADHOC_MULTIHOP_NAME: &'static str = "adhoc-multihop";
    pub const HE_WIFI_PERFORMANCE_NAME: &'static str = "he-wifi-performance";

    pub fn name(&self) -> &'static str {
        match self {
            Experiment::AdhocMultihop { .. } => Self::ADHOC_MULTIHOP_NAME,
            Experiment::HeWifiPerformance { .. } => Self::HE_WIFI_PERFORMANCE_NAME,
        }
    }

    fn sub_command(&self) -> &ExperimentSubCommand {
        match self {
            Experiment::AdhocMultihop { sub_command }
            | Experiment::HeWifiPerformance { sub_command } => sub_command,
        }
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Subcommand)]
pub enum ExperimentSubCommand {
    /// Plot
    Plot(PlotArgs),
    /// Print the per-run aggregate with its 95% confidence interval
    Summary(SummaryArgs),
}

#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Results file to read [default: <results dir>/<experiment>.csv]
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// Directory to write plots to [default: <results dir>]
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
    pub format: ImageFormat,
    #[arg(long, value_enum, default_value_t = ChartKind::Line)]
    pub kind: ChartKind,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Results file to read [default: <results dir>/<experiment>.csv]
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// Also write the summary to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

pub fn data_file(exp_name: &str, data: Option<&Path>) -> Result<PathBuf> {
    match data {
        Some(path) => Ok(path.to_path_buf()),
        None => Env::data_file(exp_name),
    }
}

pub fn plot_path(exp_name: &str, args: &PlotArgs, suffix: Option<&str>) -> Result<PathBuf> {
    let mut path = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => Env::results_root()?,
    };
    let stem = match suffix {
        Some(suffix) => format!("{exp_name}-{suffix}"),
        None => exp_name.to_string(),
    };
    path.push(format!("{stem}.{}", args.format.extension()));
    Ok(path)
}

/// Line series of run-aggregate means, with the confidence half-width as
/// error when `with_errors` is set.
pub fn summary_series(
    label: &str,
    summaries: &[Summary],
    with_errors: bool,
) -> Result<Series> {
    let points = summaries
        .iter()
        .map(|s| {
            let x = s.x.as_f64().ok_or_else(|| {
                let reason = format!("non-numeric independent variable (x={})", s.x);
                error!("{reason}");
                anyhow::anyhow!(reason)
            })?;
            Ok(Point {
                x,
                y: s.mean,
                err: if with_errors { s.half_width } else { None },
            })
        })
        .collect::<Result<Vec<Point>>>()?;

    Ok(Series::new(label, points))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SummaryRecord {
    x: String,
    mean: f64,
    std: Option<f64>,
    count: usize,
    ci95: Option<f64>,
}

impl From<&Summary> for SummaryRecord {
    fn from(s: &Summary) -> Self {
        Self {
            x: s.x.to_string(),
            mean: s.mean,
            std: Some(s.std).filter(|x| x.is_finite()),
            count: s.count,
            ci95: s.half_width,
        }
    }
}

pub fn print_summary(independent: &str, summaries: &[Summary]) {
    println!(
        "{independent:>12} {:>12} {:>12} {:>6} {:>12}",
        "mean", "std", "runs", "ci95"
    );
    for s in summaries {
        let fmt_opt = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{v:.3}"));
        println!(
            "{:>12} {:>12.3} {:>12} {:>6} {:>12}",
            s.x.to_string(),
            s.mean,
            fmt_opt(Some(s.std).filter(|x| x.is_finite())),
            s.count,
            fmt_opt(s.half_width)
        );
    }
}

/// Write summaries as CSV, leaving undefined values empty.
pub fn write_summary_csv(path: &Path, summaries: &[Summary]) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        let reason = format!("error creating summary file (path={}, error={e:?})", path.display());
        error!("{reason}");
        anyhow::anyhow!(reason)
    })?;

    let mut writer = Writer::from_writer(file);
    for summary in summaries {
        writer.serialize(SummaryRecord::from(summary))?;
    }
    writer.flush()?;

    info!("write_summary_csv(): wrote summary to: {}", path.display());
    Ok(())
}

pub fn run(exp: &Experiment) -> Result<()> {
    match (exp, exp.sub_command()) {
        (Experiment::AdhocMultihop { .. }, ExperimentSubCommand::Plot(args)) => {
            adhoc_multihop::plot(args)?;
        }
        (Experiment::AdhocMultihop { .. }, ExperimentSubCommand::Summary(args)) => {
            adhoc_multihop::summary(args)?;
        }
        (Experiment::HeWifiPerformance { .. }, ExperimentSubCommand::Plot(args)) => {
            he_wifi::plot(args)?;
        }
        (Experiment::HeWifiPerformance { .. }, ExperimentSubCommand::Summary(args)) => {
            he_wifi::summary(args)?;
        }
    }

    Ok(())
}
