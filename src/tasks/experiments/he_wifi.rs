use crate::{
    stats::{self, Summary},
    table::{Schema, Table},
    tasks::experiments::{
        self, Experiment, PlotArgs, RNG_RUN, SummaryArgs, THROUGHPUT,
        plot::{self, ChartSpec},
    },
};
use anyhow::Result;
use log::info;
use std::path::{Path, PathBuf};

pub const N_WIFI: &str = "nWifi";

pub const SCHEMA: Schema = Schema {
    name: Experiment::HE_WIFI_PERFORMANCE_NAME,
    columns: &[N_WIFI, RNG_RUN, THROUGHPUT],
    numeric: &[N_WIFI, RNG_RUN, THROUGHPUT],
};

const TITLE: &str = "IEEE 802.11ax Performance";
const X_DESC: &str = "Number of transmitting Wi-Fi stations";
const Y_DESC: &str = "Network throughput [Mb/s]";

/// The y-axis is fixed so that plots of different runs stay comparable.
pub const Y_RANGE: (f64, f64) = (0.0, 140.0);

pub fn load(path: &Path) -> Result<Table> {
    Ok(Table::load_with_schema(path, &SCHEMA)?)
}

/// Network throughput (sum over stations) per station count, averaged over
/// runs.
pub fn aggregate_summary(table: &Table) -> Result<Vec<Summary>> {
    Ok(stats::summarize_runs(
        table,
        N_WIFI,
        RNG_RUN,
        THROUGHPUT,
        stats::ALPHA,
    )?)
}

pub fn chart_spec(args: &PlotArgs) -> ChartSpec {
    ChartSpec::new(TITLE, X_DESC, Y_DESC)
        .kind(args.kind)
        .markers(true)
        .legend(false)
        .y_range(Y_RANGE.0, Y_RANGE.1)
}

pub fn plot(args: &PlotArgs) -> Result<PathBuf> {
    let name = Experiment::HE_WIFI_PERFORMANCE_NAME;
    let data = experiments::data_file(name, args.data.as_deref())?;
    let table = load(&data)?;
    info!(
        "plot(): loaded results (path={}, rows={})",
        data.display(),
        table.len()
    );

    let series = experiments::summary_series(THROUGHPUT, &aggregate_summary(&table)?, false)?;
    let plot_path = experiments::plot_path(name, args, None)?;
    plot::render(&chart_spec(args), &[series], &plot_path)?;

    Ok(plot_path)
}

pub fn summary(args: &SummaryArgs) -> Result<Vec<Summary>> {
    let data = experiments::data_file(Experiment::HE_WIFI_PERFORMANCE_NAME, args.data.as_deref())?;
    let summaries = aggregate_summary(&load(&data)?)?;

    experiments::print_summary(N_WIFI, &summaries);
    if let Some(csv) = &args.csv {
        experiments::write_summary_csv(csv, &summaries)?;
    }

    Ok(summaries)
}
