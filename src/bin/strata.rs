#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use std::io::{IsTerminal, Write};

use strata::cli::args::CliArgs;
use strata::cli::driver;

fn main() -> Result<()> {
    // Only installs a subscriber when STRATA_LOG or RUST_LOG is set.
    strata::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let color = !args.no_color && std::io::stderr().is_terminal();
    let output = driver::execute(&args, color)?;

    if !output.stdout.is_empty() {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(output.stdout.as_bytes())?;
        stdout.flush()?;
    }
    if !output.stderr.is_empty() {
        eprint!("{}", output.stderr);
    }
    if output.exit_code != driver::EXIT_SUCCESS {
        std::process::exit(output.exit_code);
    }
    Ok(())
}
