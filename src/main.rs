use clap::Parser;
use env_logger::Builder;
use netfra_plot::tasks::experiments::{self, Experiment};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    // The experiment whose results to process
    #[clap(subcommand)]
    experiment: Experiment,
}

fn main() -> anyhow::Result<()> {
    // Initialize the logger.
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    let mut builder = Builder::from_env(env);
    builder.init();

    let cli = Cli::parse();
    experiments::run(&cli.experiment)?;

    Ok(())
}
