// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `generate`, and all
// their configurable flags.
//
// The model itself (layers, loss, optimizer, epochs, batch size)
// is described by the request JSON, not by flags. Flags only say
// where files live, which device to use and how to sample.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{generate_use_case::GenerateConfig, train_use_case::TrainConfig};
use crate::ml::{backend::DeviceKind, generator::SamplingOptions};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model described by a request JSON file
    Train(TrainArgs),

    /// Extend a prompt with a trained transformer checkpoint
    Generate(GenerateArgs),
}

/// Compute device; mirrors `DeviceKind` without leaking clap into Layer 5.
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum DeviceArg {
    #[default]
    Cpu,
    Wgpu,
}

impl From<DeviceArg> for DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Cpu  => DeviceKind::Cpu,
            DeviceArg::Wgpu => DeviceKind::Wgpu,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Path to the request JSON ({type, input, layers, loss, optimizer, epoch, batch_size})
    #[arg(long)]
    pub request: PathBuf,

    /// Directory holding the CSV datasets and text corpora
    #[arg(long, default_value = "datasets")]
    pub data_dir: PathBuf,

    /// Directory to save weights, the request copy and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,

    /// Seeds weight init and sampling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// After training a transformer, extend this prompt
    #[arg(long)]
    pub prompt: Option<String>,

    /// Number of words to generate after the prompt
    #[arg(long, default_value_t = 100)]
    pub generate_length: usize,

    /// Softmax temperature; lower is more conservative
    #[arg(long, default_value_t = 0.5)]
    pub temperature: f64,

    /// Only sample among the k most probable words
    #[arg(long)]
    pub top_k: Option<usize>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            request_path:   a.request,
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            device:         a.device.into(),
            seed:           a.seed,
            prompt:         a.prompt,
            sampling:       SamplingOptions {
                length:      a.generate_length,
                temperature: a.temperature,
                top_k:       a.top_k,
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Words to start from; every word must be in the corpus vocabulary
    #[arg(long)]
    pub prompt: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Directory holding the corpus the model was trained on
    #[arg(long, default_value = "datasets")]
    pub data_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,

    #[arg(long, default_value_t = 100)]
    pub length: usize,

    #[arg(long, default_value_t = 1.0)]
    pub temperature: f64,

    #[arg(long)]
    pub top_k: Option<usize>,

    /// Omit for a different sample on every run
    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<GenerateArgs> for GenerateConfig {
    fn from(a: GenerateArgs) -> Self {
        GenerateConfig {
            checkpoint_dir: a.checkpoint_dir,
            data_dir:       a.data_dir,
            device:         a.device.into(),
            prompt:         a.prompt,
            sampling:       SamplingOptions {
                length:      a.length,
                temperature: a.temperature,
                top_k:       a.top_k,
            },
            seed:           a.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Cli;
    use super::*;
    use clap::Parser;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["dynamic-model", "train", "--request", "req.json"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert_eq!(cfg.request_path, PathBuf::from("req.json"));
        assert_eq!(cfg.data_dir, PathBuf::from("datasets"));
        assert_eq!(cfg.device, DeviceKind::Cpu);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.sampling.temperature, 0.5);
        assert!(cfg.prompt.is_none());
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::try_parse_from([
            "dynamic-model", "generate",
            "--prompt", "once upon",
            "--device", "wgpu",
            "--length", "20",
            "--top-k", "5",
            "--seed", "9",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else { panic!("expected generate") };
        let cfg: GenerateConfig = args.into();

        assert_eq!(cfg.prompt, "once upon");
        assert_eq!(cfg.device, DeviceKind::Wgpu);
        assert_eq!(cfg.sampling, SamplingOptions { length: 20, temperature: 1.0, top_k: Some(5) });
        assert_eq!(cfg.seed, Some(9));
    }

    #[test]
    fn test_train_requires_request() {
        assert!(Cli::try_parse_from(["dynamic-model", "train"]).is_err());
    }
}
