use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use driver_generate::generate_directory;
use tracing::info;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Directory holding the `configure_*.json` documents.
    #[arg(long, default_value = ".")]
    pub configuration_directory: PathBuf,
    /// Ensemble root; defaults to the configuration directory.
    #[arg(long)]
    pub output_directory: Option<PathBuf>,
    /// Keep files that already exist instead of overwriting them.
    #[arg(long)]
    pub skip_existing: bool,
    /// Print the generation report as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &GenerateArgs) -> Result<(), Box<dyn Error>> {
    let report = generate_directory(
        &args.configuration_directory,
        args.output_directory.as_deref(),
        !args.skip_existing,
    )?;
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        for path in report.dangling() {
            info!(path = %path.display(), "restart link waits for coldstart output");
        }
        println!("{}: {}", report.root.display(), report.summary());
    }
    Ok(())
}
