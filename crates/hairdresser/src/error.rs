//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` and `HeadError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use hairdresser_config::ConfigError;
use hairdresser_core::HeadError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const RENDER: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Manifest ─────────────────────────────────────────────────────

    #[error("Manifest not found at {path}")]
    #[diagnostic(
        code(hairdresser::no_manifest),
        help(
            "Pass an existing file with --manifest, or set HAIRDRESSER_MANIFEST.\n\
             Without either, the default location is: {default_path}"
        )
    )]
    ManifestNotFound { path: String, default_path: String },

    #[error(transparent)]
    #[diagnostic(code(hairdresser::config))]
    Config(Box<figment::Error>),

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hairdresser::validation))]
    Validation { field: String, reason: String },

    // ── Overrides ────────────────────────────────────────────────────

    #[error("Override '{name}' not found in the manifest")]
    #[diagnostic(
        code(hairdresser::override_not_found),
        help("Available overrides: {available}")
    )]
    OverrideNotFound { name: String, available: String },

    #[error("Override '{name}' could not be applied")]
    #[diagnostic(
        code(hairdresser::apply_failed),
        help("Check the override's title and tag values in the manifest.")
    )]
    Apply {
        name: String,
        #[source]
        source: HeadError,
    },

    #[error("Rendering failed")]
    #[diagnostic(code(hairdresser::render_failed))]
    Render(#[source] HeadError),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error("Could not serialize output: {0}")]
    #[diagnostic(code(hairdresser::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not serialize output: {0}")]
    #[diagnostic(code(hairdresser::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl From<HeadError> for CliError {
    fn from(err: HeadError) -> Self {
        Self::Render(err)
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ManifestNotFound { .. } | Self::OverrideNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Apply { .. } | Self::Render(_) => exit_code::RENDER,
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ──────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NotFound { path } => CliError::ManifestNotFound {
                path: path.display().to_string(),
                default_path: hairdresser_config::config_path().display().to_string(),
            },
            ConfigError::Figment(err) => CliError::Config(err),
            ConfigError::Apply { name, source } => CliError::Apply { name, source },
        }
    }
}
