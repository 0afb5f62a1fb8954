use anyhow::Result;
use clap::Parser;
use tracing::error;

use hitmap::pipeline::print_summary;
use hitmap::utils::setup_logging;
use hitmap::{Args, PipelineConfig};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let config = PipelineConfig::from_args(&args)?;

    match hitmap::run(&args.input, &args.output, &config) {
        Ok(summary) => {
            if args.summary {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            error!(action = "fail", component = "pipeline", error = %e, "Pipeline failed");
            std::process::exit(1);
        }
    }
}
