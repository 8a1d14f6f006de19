use clap::Parser;
use psse2grg_cli::{run, Cli, Psse2GrgConfig};
use std::io;
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Psse2GrgConfig::for_cli(&cli)?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level(&cli)?)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = config.options(&cli);
    let stdout = io::stdout();
    run(&cli, &options, &mut stdout.lock())
}
