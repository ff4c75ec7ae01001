use clap::Parser;
use eyre::Result;

use ligolw_print_tables::{Cli, run_cli};

fn main() -> Result<()> {
    let _guard = env_tracing_logger::init();
    let cli = Cli::parse();
    run_cli(cli)
}
