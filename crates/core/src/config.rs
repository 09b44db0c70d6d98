// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static daemon configuration, read once at startup from a TOML file.
//!
//! Mirrors the original service's `ConfigReader`, translated from an INI
//! format to TOML (the teacher workspace's configuration format of choice)
//! and from "catch every exception, return a default" to typed errors for
//! mandatory keys.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing mandatory config key: {0}")]
    MissingKey(&'static str),
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawConfig {
    device: Option<RawDevice>,
    general: Option<RawGeneral>,
    smtp: Option<RawSmtp>,
    nfs: Option<RawNfs>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawDevice {
    drive_serial: Option<String>,
    library: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawGeneral {
    tape_max_size: Option<u64>,
    source_folders: Option<Vec<String>>,
    exclude_folders: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawSmtp {
    host: Option<String>,
    port: Option<u16>,
    from: Option<String>,
    default_recipients: Option<Vec<String>>,
    username: Option<String>,
    password: Option<String>,
    starttls: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawNfs {
    export_options: Option<String>,
    export_target: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub default_recipients: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub starttls: bool,
}

/// Typed accessors over the daemon's static configuration file.
#[derive(Debug, Clone)]
pub struct Config {
    raw: RawConfig,
}

impl Config {
    /// Default path: `/etc/<svc>/<svc>.toml`, overridable with `LTOARC_CONFIG`
    /// (a test/deployment escape hatch, grounded in the teacher's
    /// `OJ_STATE_DIR`-style env override pattern).
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("LTOARC_CONFIG") {
            return PathBuf::from(path);
        }
        PathBuf::from("/etc/ltoarc/ltoarc.toml")
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { raw })
    }

    pub fn drive_serial(&self) -> Result<&str, ConfigError> {
        self.raw
            .device
            .as_ref()
            .and_then(|d| d.drive_serial.as_deref())
            .ok_or(ConfigError::MissingKey("device.drive_serial"))
    }

    pub fn library_path(&self) -> Result<&str, ConfigError> {
        self.raw
            .device
            .as_ref()
            .and_then(|d| d.library.as_deref())
            .ok_or(ConfigError::MissingKey("device.library"))
    }

    pub fn tape_max_size_kb(&self) -> Result<u64, ConfigError> {
        self.raw
            .general
            .as_ref()
            .and_then(|g| g.tape_max_size)
            .ok_or(ConfigError::MissingKey("general.tape_max_size"))
    }

    pub fn source_folders(&self) -> Vec<String> {
        self.raw
            .general
            .as_ref()
            .and_then(|g| g.source_folders.clone())
            .unwrap_or_default()
    }

    pub fn exclude_folders(&self) -> Vec<String> {
        self.raw
            .general
            .as_ref()
            .and_then(|g| g.exclude_folders.clone())
            .unwrap_or_default()
    }

    pub fn nfs_export_options(&self, default: &str) -> String {
        self.raw
            .nfs
            .as_ref()
            .and_then(|n| n.export_options.clone())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn nfs_export_target(&self, default: &str) -> String {
        self.raw
            .nfs
            .as_ref()
            .and_then(|n| n.export_target.clone())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn smtp(&self) -> Result<SmtpSettings, ConfigError> {
        let smtp = self
            .raw
            .smtp
            .as_ref()
            .ok_or(ConfigError::MissingKey("smtp"))?;
        Ok(SmtpSettings {
            host: smtp
                .host
                .clone()
                .ok_or(ConfigError::MissingKey("smtp.host"))?,
            port: smtp.port.unwrap_or(25),
            from: smtp
                .from
                .clone()
                .ok_or(ConfigError::MissingKey("smtp.from"))?,
            default_recipients: smtp.default_recipients.clone().unwrap_or_default(),
            username: smtp.username.clone(),
            password: smtp.password.clone(),
            starttls: smtp.starttls.unwrap_or(false),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
