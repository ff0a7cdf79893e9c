//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for chorus
#[derive(Parser, Debug)]
#[command(name = "chorus")]
#[command(author, version, about = "Ask several language models at once, under a conversation mode")]
#[command(long_about = r#"
chorus sends one prompt to several OpenAI-compatible models and prints the
resulting conversation.

Modes decide who answers and what each model sees:
  isolated                  every model answers independently
  discuss                   models see each other's replies
  round_robin               models answer one after another
  debate                    models argue assigned stances
  expert_panel              models answer from assigned domains
  consensus_building        models work toward a shared position
  collaborative_refinement  draft, refine, then merge
A YAML phase script (--dsl) replaces the fixed modes.

Configuration files are loaded from (in priority order):
1. CHORUS_* environment variables
2. --config <path>     Explicit config file
3. ./chorus.toml       Project-level config
4. ~/.config/chorus/config.toml   Global config

Example:
  chorus "What's the best way to handle errors in Rust?"
  chorus -m gpt -m local --mode debate "Tabs or spaces?"
  chorus --dsl review.yaml "Review this API design"
"#)]
pub struct Cli {
    /// The prompt to send
    pub prompt: String,

    /// Models to ask (repeatable; defaults to every configured model)
    #[arg(short, long, value_name = "ID")]
    pub model: Vec<String>,

    /// Conversation mode
    #[arg(long, value_name = "NAME", conflicts_with = "dsl")]
    pub mode: Option<String>,

    /// YAML phase script to run instead of a fixed mode
    #[arg(long, value_name = "FILE")]
    pub dsl: Option<PathBuf>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Write diagnostics to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress live progress
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the conversation as JSON
    #[arg(long)]
    pub json: bool,
}
