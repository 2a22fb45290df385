//! Configuration for `NfoDupes`.
//!
//! Handles reading configuration from CLI arguments and the user config file.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use itertools::Itertools;
use serde::Deserialize;

use nfo_dupes::nfo::{
    CommandStyle, DEFAULT_JUNK_PREFIXES, DEFAULT_JUNK_SUFFIXES, DEFAULT_VIDEO_EXTENSIONS, FilenameAligner,
};

use crate::Args;

/// Config from the user config file.
#[derive(Debug, Default, Deserialize)]
pub struct NfoDupesConfig {
    #[serde(default)]
    pub(crate) default_paths: Vec<PathBuf>,
    #[serde(default)]
    pub(crate) paths: Vec<PathBuf>,
    /// Replaces the built-in prefix list when set, even if empty.
    #[serde(default)]
    junk_prefixes: Option<Vec<String>>,
    /// Replaces the built-in suffix list when set, even if empty.
    #[serde(default)]
    junk_suffixes: Option<Vec<String>>,
    #[serde(default)]
    video_extensions: Vec<String>,
    #[serde(default)]
    command_style: Option<CommandStyle>,
    #[serde(default)]
    json: bool,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    nfodupes: NfoDupesConfig,
}

/// Final config created from CLI arguments and user config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) aligner: FilenameAligner,
    pub(crate) json: bool,
    pub(crate) missing: bool,
    pub(crate) style: CommandStyle,
    pub(crate) verbose: bool,
    pub(crate) video_extensions: Vec<String>,
}

impl NfoDupesConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    pub(crate) fn get_user_config() -> Result<Self> {
        let Some(path) = nfo_dupes::config::CONFIG_PATH.as_deref() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.nfodupes)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))
    }
}

impl Config {
    /// Combine command line args with the already loaded user config.
    pub fn from_args_and_user_config(args: Args, user_config: NfoDupesConfig) -> Self {
        let junk_prefixes = user_config
            .junk_prefixes
            .unwrap_or_else(|| DEFAULT_JUNK_PREFIXES.iter().map(|&s| s.to_string()).collect());
        let junk_suffixes = user_config
            .junk_suffixes
            .unwrap_or_else(|| DEFAULT_JUNK_SUFFIXES.iter().map(|&s| s.to_string()).collect());

        // Combine extensions from config and CLI, with defaults if none specified
        let mut video_extensions: Vec<String> = user_config
            .video_extensions
            .into_iter()
            .chain(args.extension)
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .unique()
            .collect();

        if video_extensions.is_empty() {
            video_extensions = DEFAULT_VIDEO_EXTENSIONS.iter().map(|&s| s.to_string()).collect();
        }

        Self {
            aligner: FilenameAligner::new(junk_prefixes, junk_suffixes),
            json: args.json || user_config.json,
            missing: args.missing || user_config.missing,
            style: args.style.or(user_config.command_style).unwrap_or_default(),
            verbose: args.verbose || user_config.verbose,
            video_extensions,
        }
    }
}
