use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use driver_generate::{check_completion, CompletionStatus};
use tracing::warn;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Ensemble root or single run directory.
    #[arg(default_value = ".")]
    pub directory: PathBuf,
    /// Print the statuses as JSON.
    #[arg(long)]
    pub json: bool,
    /// List the problems found for every run.
    #[arg(long)]
    pub problems: bool,
}

pub fn run(args: &CheckArgs) -> Result<(), Box<dyn Error>> {
    let completions = check_completion(&args.directory)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&completions)?);
        return Ok(());
    }
    for completion in &completions {
        println!("{}: {}", completion.name, completion);
        if args.problems {
            for (file, problems) in &completion.problems {
                for problem in problems {
                    println!("    {file}: {problem}");
                }
            }
        }
    }
    let failed = completions
        .iter()
        .filter(|completion| {
            matches!(
                completion.status,
                CompletionStatus::Failed | CompletionStatus::Error
            )
        })
        .count();
    if failed > 0 {
        warn!(failed, "runs reported errors");
    }
    Ok(())
}
