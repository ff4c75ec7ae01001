use clap::Parser;
use eyre::Result;

use ligolw_segment_query::{Cli, is_connection_error, run_cli};

fn main() -> Result<()> {
    let _guard = env_tracing_logger::init();
    let cli = Cli::parse();
    match run_cli(cli) {
        Err(e) if is_connection_error(&e) => {
            eprintln!("Error connecting to segment source: {e}");
            std::process::exit(-1);
        }
        other => other,
    }
}
