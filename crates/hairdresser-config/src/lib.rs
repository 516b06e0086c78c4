//! Head manifests for hairdresser.
//!
//! A manifest is a TOML file listing overrides in stacking order, plus
//! output defaults for the CLI. Loading goes through figment (built-in
//! defaults, then the file, then `HAIRDRESSER_*` environment variables);
//! [`apply_all`] turns the result into live overrides on a
//! [`Hairdresser`].

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use hairdresser_core::{ControllerOptions, Hairdresser, HeadError, Override};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("manifest not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to apply override '{name}': {source}")]
    Apply {
        name: String,
        #[source]
        source: HeadError,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level manifest.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// CLI output defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Overrides in stacking order; later entries win.
    #[serde(default)]
    pub overrides: Vec<OverrideSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// One override: an optional title plus any number of tags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OverrideSpec {
    /// Name used by `--restore` and in inspect output.
    pub name: String,

    pub title: Option<String>,

    #[serde(default)]
    pub tags: Vec<TagSpec>,
}

/// A non-title element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagSpec {
    /// Element name, e.g. "meta" or "link".
    pub tag: String,

    /// Matching attributes; together with `tag` they form the selector.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,

    /// Rendered attributes.
    #[serde(default)]
    pub values: BTreeMap<String, String>,

    /// Emit a closing tag in markup output.
    #[serde(default)]
    pub close: bool,
}

impl Config {
    /// Reject manifests that would apply ambiguously.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for spec in &self.overrides {
            if spec.name.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: "overrides.name".into(),
                    reason: "must not be empty".into(),
                });
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::Validation {
                    field: "overrides.name".into(),
                    reason: format!("duplicate override '{}'", spec.name),
                });
            }
            for tag in &spec.tags {
                if tag.tag.trim().is_empty() {
                    return Err(ConfigError::Validation {
                        field: format!("overrides.{}.tags.tag", spec.name),
                        reason: "must not be empty".into(),
                    });
                }
                if tag.tag.eq_ignore_ascii_case("title") {
                    return Err(ConfigError::Validation {
                        field: format!("overrides.{}.tags.tag", spec.name),
                        reason: "use the override's `title` field for <title>".into(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&OverrideSpec> {
        self.overrides.iter().find(|spec| spec.name == name)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default manifest path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "hairdresser", "hairdresser").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hairdresser");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HAIRDRESSER_").split("_"))
}

/// Load and validate the manifest at the default path.
///
/// A missing file yields the built-in defaults.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();
    let config: Config = figment_for(&path).extract()?;
    config.validate()?;
    Ok(config)
}

/// Load and validate an explicitly named manifest. The file must exist.
pub fn load_manifest(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let config: Config = figment_for(path).extract()?;
    config.validate()?;
    debug!(path = %path.display(), overrides = config.overrides.len(), "manifest loaded");
    Ok(config)
}

// ── Application ─────────────────────────────────────────────────────

/// A manifest override pushed onto a hairdresser.
#[derive(Debug)]
pub struct AppliedOverride {
    pub name: String,
    pub handle: Override,
}

/// Push one override: title first, then tags in manifest order.
pub fn apply(hairdresser: &Hairdresser, spec: &OverrideSpec) -> Result<Override, ConfigError> {
    let wrap = |source| ConfigError::Apply {
        name: spec.name.clone(),
        source,
    };

    let handle = hairdresser.new_override();
    if let Some(title) = &spec.title {
        handle.title(title.as_str()).map_err(wrap)?;
    }
    for tag in &spec.tags {
        handle
            .tag_with(
                &tag.tag,
                tag.attrs.clone(),
                tag.values.clone(),
                ControllerOptions::new().close(tag.close),
            )
            .map_err(wrap)?;
    }
    Ok(handle)
}

/// Push every override of `config`, in order.
pub fn apply_all(
    hairdresser: &Hairdresser,
    config: &Config,
) -> Result<Vec<AppliedOverride>, ConfigError> {
    config
        .overrides
        .iter()
        .map(|spec| {
            Ok(AppliedOverride {
                name: spec.name.clone(),
                handle: apply(hairdresser, spec)?,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn spec(name: &str) -> OverrideSpec {
        OverrideSpec {
            name: name.into(),
            title: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn defaults_are_table_and_auto() {
        let config = Config::default();
        assert_eq!(config.defaults.output, "table");
        assert_eq!(config.defaults.color, "auto");
        assert!(config.overrides.is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let config = Config {
            overrides: vec![spec("a"), spec("a")],
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid overrides.name: duplicate override 'a'"
        );
    }

    #[test]
    fn title_tags_are_rejected() {
        let mut site = spec("site");
        site.tags.push(TagSpec {
            tag: "TITLE".into(),
            attrs: BTreeMap::new(),
            values: BTreeMap::new(),
            close: false,
        });
        let config = Config {
            overrides: vec![site],
            ..Config::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Validation { .. }
        ));
    }

    #[test]
    fn apply_adds_title_then_tags() {
        let hairdresser = Hairdresser::new();
        let mut site = spec("site");
        site.title = Some("Example".into());
        site.tags.push(TagSpec {
            tag: "meta".into(),
            attrs: BTreeMap::from([("name".into(), "description".into())]),
            values: BTreeMap::from([("content".into(), "An example".into())]),
            close: false,
        });

        let handle = apply(&hairdresser, &site).unwrap();
        let ids: Vec<_> = handle
            .controllers()
            .iter()
            .map(|c| c.selector().to_owned())
            .collect();
        assert_eq!(ids, ["title", "meta[name='description']"]);
    }

    #[test]
    fn config_path_ends_with_config_toml() {
        assert!(config_path().ends_with("config.toml"));
    }
}
