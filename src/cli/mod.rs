// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, loads the YAML config, installs
// the log subscriber and hands off to the application layer.
// This is the only layer that prints to stdout.
//
//   corpus-prep clean    --config cfg.yaml [--force]
//   corpus-prep tokenize --config cfg.yaml [--force-reclean] [--refit]
//   corpus-prep encode   --config cfg.yaml --text "..."

pub mod commands;

use anyhow::{Context, Result};
use burn::backend::NdArray;
use clap::Parser;
use commands::{CleanArgs, Commands, EncodeArgs, TokenizeArgs};

use crate::application::{cleaner::Cleaner, tokenizer::DataTokenizer};
use crate::config::{load_config, PipelineConfig};
use crate::error::PrepError;
use crate::telemetry::init_logging;

type Backend = NdArray;

#[derive(Parser, Debug)]
#[command(
    name = "corpus-prep",
    version,
    about = "Clean, split and tokenize a labelled text corpus into padded tensor batches."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let path   = self.command.config_path().clone();
        let config = load_config(&path)
            .with_context(|| format!("Failed to load configuration '{}'", path.display()))?;
        init_logging(&config.logging)?;

        match self.command {
            Commands::Clean(args)    => run_clean(config, args),
            Commands::Tokenize(args) => run_tokenize(config, args),
            Commands::Encode(args)   => run_encode(config, args),
        }
    }
}

fn cleaner(config: &PipelineConfig) -> Result<Cleaner> {
    let span = tracing::info_span!("cleaner");
    Cleaner::new(config.cleaner.clone(), span).context("Failed to set up the cleaner")
}

fn run_clean(config: PipelineConfig, args: CleanArgs) -> Result<()> {
    let data = cleaner(&config)?
        .get_clean_data(args.force)
        .context("Cleaning failed")?;

    println!(
        "Clean data in '{}': {} train, {} val, {} test",
        config.cleaner.clean_data_dir.display(),
        data.train.len(),
        data.val.len(),
        data.test.len()
    );
    if let Some(encoder) = &data.label_encoder {
        println!("Classes: {}", encoder.classes().join(", "));
    }
    Ok(())
}

fn run_tokenize(config: PipelineConfig, args: TokenizeArgs) -> Result<()> {
    let data = cleaner(&config)?
        .get_clean_data(args.force_reclean)
        .context("Cleaning failed")?;

    let device = Default::default();
    let span   = tracing::info_span!("tokenizer");

    let saved = if args.refit {
        None
    } else {
        match DataTokenizer::load(config.tokenizer.clone(), span.clone()) {
            Ok(tok) => Some(tok),
            Err(PrepError::MissingArtifact { .. }) => None,
            Err(e) => return Err(e).context("Failed to load the saved tokenizer"),
        }
    };

    let (train_batches, val_batches) = match saved {
        Some(tok) => {
            tracing::info!("Reusing saved tokenizer; pass --refit to rebuild it");
            let train = tok.transform(&data.train).context("Transforming train failed")?;
            let val   = tok.transform(&data.val).context("Transforming val failed")?;
            (
                tok.batch::<Backend>(train, true, &device),
                tok.batch::<Backend>(val, false, &device),
            )
        }
        None => {
            let mut tok = DataTokenizer::new(config.tokenizer.clone(), span);
            let batches = tok
                .fit_and_transform::<Backend>(&data.train, &data.val, &device)
                .context("Fitting the tokenizer failed")?;
            tok.save().context("Saving the tokenizer failed")?;
            println!("Vocabulary size: {}", tok.vocabulary()?.len());
            batches
        }
    };

    for (name, batches) in [("train", &train_batches), ("val", &val_batches)] {
        let shape = batches
            .first()
            .map(|b| format!("{:?}", b.inputs.dims()))
            .unwrap_or_else(|| "-".to_string());
        println!("{name}: {} batches, first input shape {shape}", batches.len());
    }
    Ok(())
}

fn run_encode(config: PipelineConfig, args: EncodeArgs) -> Result<()> {
    let tok = DataTokenizer::load(config.tokenizer, tracing::info_span!("tokenizer"))
        .context("Failed to load the saved tokenizer; run `corpus-prep tokenize` first")?;

    let ids            = tok.tokenize(&args.text)?;
    let (padded, mask) = tok.pad(&ids);

    println!("ids:     {padded:?}");
    println!("mask:    {mask:?}");
    println!("decoded: {}", tok.detokenize(&padded)?);
    Ok(())
}
