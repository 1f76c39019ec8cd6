// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — builds and trains the model a request JSON describes
//   2. `generate` — loads a transformer checkpoint and extends a prompt
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "dynamic-model",
    version = "0.1.0",
    about = "Build neural networks from layer descriptors, train them, and sample text."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case. Nothing is computed here.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Generate(args) => run_generate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training from request: {}", args.request.display());

    let outcome = TrainUseCase::new(args.into()).execute()?;

    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    if let Some(sample) = outcome.sample {
        println!("\n{}", sample);
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    use crate::application::generate_use_case::GenerateUseCase;

    let text = GenerateUseCase::new(args.into()).execute()?;
    println!("{}", text);
    Ok(())
}
