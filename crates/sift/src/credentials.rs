//! 🔑 Credentials for the attribute store, resolved once at startup.
//!
//! The reducer does not care where keys come from. It asks a [`CredentialsProvider`]
//! and gets an access key and a secret back. The config decides whether that means
//! "they're right here in the TOML" or "go read this other file".

use std::path::Path;

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Format, Toml};
use serde::Deserialize;

/// 🔐 An access key and a secret. The secret never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub access_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// 🔑 Anything that can hand over credentials.
pub trait CredentialsProvider {
    fn credentials(&self) -> Result<Credentials>;
}

/// 🔧 Where the keys live.
#[derive(Deserialize, Clone)]
pub enum CredentialsConfig {
    /// right here, in the config
    #[serde(alias = "inline")]
    Inline {
        access_key: String,
        secret_key: String,
    },
    /// in a TOML file with `access_key` and `secret_key`
    #[serde(alias = "file")]
    File { path: String },
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialsConfig::Inline { access_key, .. } => f
                .debug_struct("Inline")
                .field("access_key", access_key)
                .field("secret_key", &"<redacted>")
                .finish(),
            CredentialsConfig::File { path } => f.debug_struct("File").field("path", path).finish(),
        }
    }
}

impl CredentialsProvider for CredentialsConfig {
    fn credentials(&self) -> Result<Credentials> {
        match self {
            CredentialsConfig::Inline {
                access_key,
                secret_key,
            } => Ok(Credentials::new(access_key.clone(), secret_key.clone())),
            CredentialsConfig::File { path } => read_credentials_file(Path::new(path)),
        }
    }
}

fn read_credentials_file(path: &Path) -> Result<Credentials> {
    // -- figment treats a missing file as an empty one, so check first
    let exists = path.try_exists().with_context(|| {
        format!("💀 Could not even check whether '{}' exists", path.display())
    })?;
    if !exists {
        bail!(
            "💀 The credentials file '{}' is not there. The store will not let us in without it.",
            path.display()
        );
    }
    Figment::new()
        .merge(Toml::file(path))
        .extract()
        .with_context(|| {
            format!(
                "💀 '{}' exists but does not hold an `access_key` and a `secret_key`",
                path.display()
            )
        })
}
