use anyhow::Result;
use log::error;
use std::{env, path::PathBuf};

pub struct Env {}

impl Env {
    /// Overrides the directory that holds experiment results and plots.
    pub const RESULTS_DIR_VAR: &'static str = "NETFRA_RESULTS_DIR";

    pub fn results_root() -> Result<PathBuf> {
        match env::var_os(Self::RESULTS_DIR_VAR) {
            Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
            _ => env::current_dir().map_err(|e| {
                let reason = format!("error getting current directory (error={e:?})");
                error!("{reason}");
                anyhow::anyhow!(reason)
            }),
        }
    }

    /// Default results file for an experiment, e.g. `adhoc-multihop.csv`.
    pub fn data_file(exp_name: &str) -> Result<PathBuf> {
        let mut path = Self::results_root()?;
        path.push(format!("{exp_name}.csv"));
        Ok(path)
    }
}
