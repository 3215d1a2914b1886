use anyhow::Result;
use clap::Parser;

use samvidhan_explorer::cli::{run, Cli};
use samvidhan_explorer::logging::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_logging(config.log_format, "warn");
    run(cli, config)
}
