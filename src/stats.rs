//! Student-t confidence intervals over per-run aggregates.

use crate::{
    aggregate::{self, Reducer},
    error::{AnalysisError, Result},
    table::{Table, Value},
};
use log::{error, warn};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance level used for all plotted intervals (95% confidence).
pub const ALPHA: f64 = 0.05;

/// Quantile `p` of the Student-t distribution with `df` degrees of freedom.
/// `None` when `df` is not positive.
pub fn t_quantile(p: f64, df: f64) -> Option<f64> {
    if df <= 0.0 {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some(dist.inverse_cdf(p))
}

/// Half-width of the `1 - alpha` confidence interval of a mean estimated
/// from `n` samples with sample standard deviation `std`:
///
/// `h = std / sqrt(n) * t(1 - alpha / 2, n - 1)`
///
/// Returns `Ok(None)` when the interval is undefined, i.e. fewer than two
/// samples or a non-finite standard deviation.
pub fn confidence_half_width(std: f64, n: usize, alpha: f64) -> Result<Option<f64>> {
    if !(alpha > 0.0 && alpha < 1.0) {
        error!("confidence_half_width(): invalid significance level (alpha={alpha})");
        return Err(AnalysisError::InvalidAlpha(alpha));
    }

    if n < 2 || !std.is_finite() || std < 0.0 {
        return Ok(None);
    }

    let n_f = n as f64;
    Ok(t_quantile(1.0 - alpha / 2.0, n_f - 1.0).map(|t| std / n_f.sqrt() * t))
}

/// Mean, spread and confidence interval of the per-run totals at one value of
/// the independent variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub x: Value,
    pub mean: f64,
    pub std: f64,
    pub count: usize,
    pub half_width: Option<f64>,
}

/// Two-stage aggregation: sum `value_column` over the flows of each run, then
/// summarise those totals across runs for every value of `independent`.
///
/// Summing first keeps flow-to-flow variation out of the run-to-run interval.
pub fn summarize_runs(
    table: &Table,
    independent: &str,
    run: &str,
    value_column: &str,
    alpha: f64,
) -> Result<Vec<Summary>> {
    let totals = aggregate::run_totals(table, independent, run, value_column)?;
    let groups = aggregate::group_by(&totals, &[independent])?;

    let mut summaries = Vec::with_capacity(groups.len());
    for (mut key, samples) in groups.samples(value_column)? {
        let x = key.remove(0);
        let std = Reducer::Std.apply(&samples);
        let half_width = confidence_half_width(std, samples.len(), alpha)?;
        if half_width.is_none() {
            warn!(
                "summarize_runs(): not enough runs for a confidence interval ({independent}={x}, runs={})",
                samples.len()
            );
        }

        summaries.push(Summary {
            x,
            mean: Reducer::Mean.apply(&samples),
            std,
            count: samples.len(),
            half_width,
        });
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_t_quantile() {
        assert!(close(t_quantile(0.975, 1.0).unwrap(), 12.706));
        assert!(close(t_quantile(0.975, 4.0).unwrap(), 2.776));
        assert!(close(t_quantile(0.975, 9.0).unwrap(), 2.262));
        assert!(t_quantile(0.975, 0.0).is_none());
    }

    #[test]
    fn test_half_width() {
        // s = 2, n = 5: 2 / sqrt(5) * 2.776
        let h = confidence_half_width(2.0, 5, ALPHA).unwrap().unwrap();
        assert!(close(h, 2.483));
    }

    #[test]
    fn test_half_width_zero_std() {
        assert_eq!(confidence_half_width(0.0, 2, ALPHA).unwrap(), Some(0.0));
    }

    #[test]
    fn test_half_width_single_sample() {
        assert_eq!(confidence_half_width(1.0, 1, ALPHA).unwrap(), None);
        assert_eq!(confidence_half_width(1.0, 0, ALPHA).unwrap(), None);
        assert_eq!(confidence_half_width(f64::NAN, 3, ALPHA).unwrap(), None);
    }

    #[test]
    fn test_half_width_invalid_alpha() {
        assert!(confidence_half_width(1.0, 5, 0.0).is_err());
        assert!(confidence_half_width(1.0, 5, 1.5).is_err());
    }

    #[test]
    fn test_half_width_non_increasing_in_n() {
        let mut prev = f64::INFINITY;
        for n in 2..60 {
            let h = confidence_half_width(3.5, n, ALPHA).unwrap().unwrap();
            assert!(h >= 0.0);
            assert!(h <= prev + 1e-12, "n={n}: {h} > {prev}");
            prev = h;
        }
    }

    #[test]
    fn test_half_width_linear_in_std() {
        for n in [2, 3, 10, 30] {
            let base = confidence_half_width(1.0, n, ALPHA).unwrap().unwrap();
            for s in [0.5, 2.0, 7.25] {
                let h = confidence_half_width(s, n, ALPHA).unwrap().unwrap();
                assert!((h - s * base).abs() < 1e-9 * h.max(1.0));
            }
        }
    }

    #[test]
    fn test_summarize_runs_equal_totals() {
        let rows = [
            (10.0, "A", 1.0, 5.0),
            (10.0, "B", 1.0, 3.0),
            (10.0, "A", 2.0, 6.0),
            (10.0, "B", 2.0, 2.0),
        ];
        let table = Table::new(
            vec![
                "OfferedLoad".into(),
                "Flow".into(),
                "RngRun".into(),
                "Throughput".into(),
            ],
            rows.iter()
                .map(|(load, flow, run, thr)| {
                    vec![
                        Value::Number(*load),
                        Value::from(*flow),
                        Value::Number(*run),
                        Value::Number(*thr),
                    ]
                })
                .collect(),
        )
        .unwrap();

        let summaries =
            summarize_runs(&table, "OfferedLoad", "RngRun", "Throughput", ALPHA).unwrap();

        assert_eq!(
            summaries,
            vec![Summary {
                x: Value::Number(10.0),
                mean: 8.0,
                std: 0.0,
                count: 2,
                half_width: Some(0.0),
            }]
        );
    }

    #[test]
    fn test_summarize_runs_single_run() {
        let table = Table::new(
            vec!["nWifi".into(), "RngRun".into(), "Throughput".into()],
            vec![
                vec![Value::Number(1.0), Value::Number(1.0), Value::Number(10.0)],
                vec![Value::Number(2.0), Value::Number(1.0), Value::Number(18.0)],
                vec![Value::Number(2.0), Value::Number(2.0), Value::Number(22.0)],
            ],
        )
        .unwrap();

        let summaries = summarize_runs(&table, "nWifi", "RngRun", "Throughput", ALPHA).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].count, 1);
        assert!(summaries[0].half_width.is_none());
        assert_eq!(summaries[1].mean, 20.0);
        assert!(summaries[1].half_width.unwrap() > 0.0);
    }
}
