pub mod cli;
pub mod config;

use std::io::Write;

use anyhow::{bail, Context, Result};
use psse2grg_core::TranslationOptions;
use psse2grg_io::{grg_file_to_raw, raw_file_to_grg, round_trip_file, Format};
use tracing::info;

pub use cli::{build_cli_command, Cli};
pub use config::{load_config, Psse2GrgConfig};

/// Run one translation and write its result to `out`.
pub fn run(cli: &Cli, options: &TranslationOptions, out: &mut impl Write) -> Result<()> {
    let format = Format::detect(&cli.file)?;
    info!("reading {} as {}", cli.file.display(), format.friendly_name());

    match format {
        Format::Raw if cli.idempotent => {
            let report = round_trip_file(&cli.file, options)?;
            if !report.identical {
                info!(differences = report.diff_count, "round trip changed the case");
            }
            writeln!(out, "idempotent test: {}", report.identical)?;
        }
        Format::Raw => {
            let grg = raw_file_to_grg(&cli.file, options)?;
            let json = grg.value.to_json_pretty().context("serializing GRG document")?;
            writeln!(out, "{json}")?;
        }
        Format::Grg if cli.idempotent => {
            bail!(
                "the idempotent test starts from a RAW case, got {}",
                cli.file.display()
            );
        }
        Format::Grg => {
            let case = grg_file_to_raw(&cli.file, options)?;
            out.write_all(case.value.to_raw().as_bytes())?;
        }
    }
    out.flush()?;
    Ok(())
}
