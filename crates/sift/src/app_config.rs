//! 🔧 App configuration: `SIFT_*` environment variables, optionally layered under a TOML file.
//!
//! Every section has a default, so a mapper needs no config at all. Reducers need a
//! `[store.backend]`, because there is no sensible default for "where do I write".
//!
//! ```toml
//! [input.File]
//! file_name = "part-00000"
//!
//! [mapper]
//! escape_mode = "first_occurrence"
//!
//! [store.backend.Http]
//! endpoint = "https://attributes.internal.example"
//! credentials = { File = { path = "/etc/sift/credentials.toml" } }
//! ```
//!
//! Nested env keys use `__`: `SIFT_RETRY__MAX_RETRIES=3`. Figment lowercases env
//! keys, so every externally tagged variant also answers to its lowercase name:
//! `SIFT_STORE__BACKEND__HTTP__ENDPOINT=...` picks the Http store.

use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::retry::RetryConfig;
use crate::store::StoreBackendConfig;
use crate::transforms::EscapeMode;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub mapper: MapperConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FileConfig {
    pub file_name: String,
}

/// 🚰 Where pages come from. The streaming harness always means stdin.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub enum InputConfig {
    #[default]
    #[serde(alias = "stdin")]
    Stdin,
    #[serde(alias = "file")]
    File(FileConfig),
}

/// 🖨️ Where mapper lines go. Ignored by reducers, they write to the store.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub enum OutputConfig {
    #[default]
    #[serde(alias = "stdout")]
    Stdout,
    #[serde(alias = "file")]
    File(FileConfig),
}

/// 🗺️ Knobs for the extractors and the projector.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct MapperConfig {
    /// substring an id must contain for `map names` / `reduce names` to keep the line
    #[serde(default = "default_guid_marker")]
    pub name_marker: String,
    /// prefix a token must start with for `map guids` to tally it
    #[serde(default = "default_guid_marker")]
    pub guid_prefix: String,
    #[serde(default)]
    pub escape_mode: EscapeMode,
}

fn default_guid_marker() -> String {
    "/guid/".to_string()
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            name_marker: default_guid_marker(),
            guid_prefix: default_guid_marker(),
            escape_mode: EscapeMode::default(),
        }
    }
}

/// 🗄️ Where reducers persist, and what they call things.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_domain")]
    pub domain: String,
    /// the `Name` written alongside every count, until someone knows better
    #[serde(default = "default_placeholder_name")]
    pub placeholder_name: String,
    #[serde(default)]
    pub backend: Option<StoreBackendConfig>,
}

fn default_domain() -> String {
    "FreeBase_Names_Guide".to_string()
}

fn default_placeholder_name() -> String {
    "empty".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            placeholder_name: default_placeholder_name(),
            backend: None,
        }
    }
}

/// 🚀 Load the config from env vars (`SIFT_*`) and, if given, a TOML file. The file wins.
///
/// No file means env only. A file path that does not exist is an error rather than
/// a silent fall back to defaults, which figment would otherwise happily do.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!("🔧 loading configuration from {:?}", config_file_name);

    let config = Figment::new().merge(Env::prefixed("SIFT_").split("__"));

    let config = match config_file_name {
        Some(file_name) => {
            let exists = file_name.try_exists().with_context(|| {
                format!("💀 Could not check whether '{}' exists", file_name.display())
            })?;
            if !exists {
                anyhow::bail!(
                    "💀 The config file '{}' is not there. We looked under the couch. Behind the fridge. Nothing.",
                    file_name.display()
                );
            }
            config.merge(Toml::file(file_name))
        }
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from '{}' and the SIFT_* environment variables",
            path.display()
        ),
        None => "💀 Failed to parse configuration from the SIFT_* environment variables".to_string(),
    };

    config.extract().context(context_msg)
}
