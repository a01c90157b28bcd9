use anyhow::Result;
use clap::Parser;
use corpus_prep::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
