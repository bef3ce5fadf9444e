use crate::{
    aggregate::{self, Reducer},
    stats::{self, Summary},
    table::{Schema, Table},
    tasks::experiments::{
        self, Experiment, PlotArgs, RNG_RUN, SummaryArgs, THROUGHPUT,
        plot::{self, ChartSpec, Point, Series},
    },
};
use anyhow::Result;
use log::{error, info};
use std::path::{Path, PathBuf};

pub const TIMESTAMP: &str = "Timestamp";
pub const DELAY: &str = "Delay";
pub const OFFERED_LOAD: &str = "OfferedLoad";
pub const FLOW: &str = "Flow";

pub const SCHEMA: Schema = Schema {
    name: Experiment::ADHOC_MULTIHOP_NAME,
    columns: &[TIMESTAMP, DELAY, OFFERED_LOAD, FLOW, THROUGHPUT, RNG_RUN],
    numeric: &[OFFERED_LOAD, THROUGHPUT, RNG_RUN],
};

/// Columns the analysis has no use for.
const DROPPED_COLUMNS: &[&str] = &[TIMESTAMP, DELAY];

const FLOWS_TITLE: &str = "All flows";
const AGGREGATE_TITLE: &str = "Aggregate network throughput";
const X_DESC: &str = "Per-flow offered load [Mb/s]";
const Y_DESC: &str = "Throughput [Mb/s]";

/// Load the results file and drop the columns that are not analysed.
pub fn load(path: &Path) -> Result<Table> {
    let table = Table::load_with_schema(path, &SCHEMA)?;
    Ok(table.drop_columns(DROPPED_COLUMNS)?)
}

/// Mean throughput of every flow at each offered load, one series per flow.
pub fn flow_series(table: &Table) -> Result<Vec<Series>> {
    let means = aggregate::group_reduce(table, &[OFFERED_LOAD, FLOW], THROUGHPUT, Reducer::Mean)?;

    let mut series = Vec::new();
    for (flow, points) in means.unstack(FLOW)? {
        let points = points
            .into_iter()
            .map(|(load, thr)| {
                let x = load.as_f64().ok_or_else(|| {
                    let reason = format!("non-numeric offered load (value={load})");
                    error!("{reason}");
                    anyhow::anyhow!(reason)
                })?;
                Ok(Point::new(x, thr))
            })
            .collect::<Result<Vec<Point>>>()?;
        series.push(Series::new(flow.to_string(), points));
    }

    Ok(series)
}

/// Network throughput (sum over flows) per offered load, averaged over runs.
pub fn aggregate_summary(table: &Table) -> Result<Vec<Summary>> {
    Ok(stats::summarize_runs(
        table,
        OFFERED_LOAD,
        RNG_RUN,
        THROUGHPUT,
        stats::ALPHA,
    )?)
}

/// Render the per-flow and the aggregate chart. Returns the written paths.
pub fn plot(args: &PlotArgs) -> Result<Vec<PathBuf>> {
    let name = Experiment::ADHOC_MULTIHOP_NAME;
    let data = experiments::data_file(name, args.data.as_deref())?;
    let table = load(&data)?;
    info!(
        "plot(): loaded results (path={}, rows={})",
        data.display(),
        table.len()
    );

    let flows_path = experiments::plot_path(name, args, Some("flows"))?;
    let flows_spec = ChartSpec::new(FLOWS_TITLE, X_DESC, Y_DESC).kind(args.kind);
    plot::render(&flows_spec, &flow_series(&table)?, &flows_path)?;

    let aggregate_path = experiments::plot_path(name, args, Some("aggregate"))?;
    let aggregate_spec = ChartSpec::new(AGGREGATE_TITLE, X_DESC, Y_DESC).kind(args.kind);
    let aggregate = experiments::summary_series(THROUGHPUT, &aggregate_summary(&table)?, true)?;
    plot::render(&aggregate_spec, &[aggregate], &aggregate_path)?;

    Ok(vec![flows_path, aggregate_path])
}

pub fn summary(args: &SummaryArgs) -> Result<Vec<Summary>> {
    let data = experiments::data_file(Experiment::ADHOC_MULTIHOP_NAME, args.data.as_deref())?;
    let summaries = aggregate_summary(&load(&data)?)?;

    experiments::print_summary(OFFERED_LOAD, &summaries);
    if let Some(csv) = &args.csv {
        experiments::write_summary_csv(csv, &summaries)?;
    }

    Ok(summaries)
}
