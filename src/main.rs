use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

use wayparam::utils::{setup_logging, validate_args};
use wayparam::{load_domains, print_summary, run_harvest, Args, HarvestConfig, WaybackClient};

fn prompt_for_input() -> Result<PathBuf> {
    print!("Enter the input file path with domain list: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read input path")?;
    Ok(PathBuf::from(line.trim()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    let input = match &args.input {
        Some(path) => path.clone(),
        None => prompt_for_input()?,
    };

    let domains = match load_domains(&input) {
        Ok(domains) => domains,
        Err(e) => {
            println!("Error: {:#}", e);
            return Ok(());
        }
    };
    if domains.is_empty() {
        println!("Error: No domains found in {}", input.display());
        return Ok(());
    }
    println!("Loaded {} domains from {}", domains.len(), input.display());

    let config = HarvestConfig::from_args(&args);
    let source = Arc::new(WaybackClient::new(&config).context("Failed to set up archive client")?);

    match run_harvest(source, domains, &config).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            error!(action = "abort", component = "harvest", error = %e, "Harvest aborted");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
