//! Clap derive structures for the `hairdresser` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hairdresser -- stacked head metadata from a TOML manifest
#[derive(Debug, Parser)]
#[command(
    name = "hairdresser",
    version,
    about = "Render and inspect stacked <head> metadata overrides",
    long_about = "Applies the overrides of a head manifest in order (later ones win),\n\
        optionally restores some of them, and prints the resulting markup\n\
        or the active element table.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Head manifest to load (defaults to the platform config file)
    #[arg(long, short = 'm', env = "HAIRDRESSER_MANIFEST", global = true)]
    pub manifest: Option<PathBuf>,

    /// Output format (defaults to the manifest's `defaults.output`)
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output (defaults to the manifest's `defaults.color`)
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one selector per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the head markup produced by the manifest
    #[command(alias = "r")]
    Render(StackArgs),

    /// List the active element for every selector
    #[command(alias = "ls")]
    Inspect(StackArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments shared by every command that builds the override stack.
#[derive(Debug, Args)]
pub struct StackArgs {
    /// Restore the named override after applying the manifest (repeatable)
    #[arg(long = "restore", value_name = "NAME")]
    pub restore: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
