//! Command handlers and the override stack they share.

pub mod inspect;
pub mod render;

use clap::ValueEnum;
use tracing::debug;

use hairdresser_config::{AppliedOverride, Config, apply_all};
use hairdresser_core::{Hairdresser, OverrideId};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat, StackArgs};
use crate::error::CliError;

// ── Settings ────────────────────────────────────────────────────────

/// Output settings: CLI flags first, manifest defaults second.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub output: OutputFormat,
    pub color: ColorMode,
    pub quiet: bool,
}

impl Settings {
    pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<Self, CliError> {
        let output = match global.output {
            Some(output) => output,
            None => parse_default("defaults.output", &config.defaults.output)?,
        };
        let color = match global.color {
            Some(color) => color,
            None => parse_default("defaults.color", &config.defaults.color)?,
        };
        Ok(Self {
            output,
            color,
            quiet: global.quiet,
        })
    }
}

fn parse_default<T: ValueEnum>(field: &str, value: &str) -> Result<T, CliError> {
    T::from_str(value, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

// ── Stack ───────────────────────────────────────────────────────────

/// A hairdresser with the manifest applied and the requested overrides restored.
pub struct Stack {
    pub hairdresser: Hairdresser,
    pub applied: Vec<AppliedOverride>,
}

impl Stack {
    pub fn build(config: &Config, args: &StackArgs) -> Result<Self, CliError> {
        let hairdresser = Hairdresser::new();
        let applied = apply_all(&hairdresser, config)?;
        let stack = Self {
            hairdresser,
            applied,
        };

        for name in &args.restore {
            let target = stack
                .applied
                .iter()
                .find(|applied| applied.name == *name)
                .ok_or_else(|| CliError::OverrideNotFound {
                    name: name.clone(),
                    available: stack.available(),
                })?;
            target.handle.restore()?;
            debug!(name = %name, "override restored");
        }
        Ok(stack)
    }

    /// Manifest name of an applied override.
    pub fn override_name(&self, id: OverrideId) -> Option<&str> {
        self.applied
            .iter()
            .find(|applied| applied.handle.id() == id)
            .map(|applied| applied.name.as_str())
    }

    fn available(&self) -> String {
        if self.applied.is_empty() {
            return "(none)".into();
        }
        self.applied
            .iter()
            .map(|applied| applied.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
