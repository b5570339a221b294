//! Application configuration — TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::parse_usb_id;
use crate::protocol::{DEFAULT_SETTLE_DELAY_MS, DEFAULT_TIMEOUT_MS};
use crate::transfer::Timing;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# dongler configuration. Changes made outside the app may be overwritten.\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Timeout of each control transfer, in milliseconds.
    #[serde(default = "default_transfer_timeout_ms")]
    pub transfer_timeout_ms: u64,

    /// Delay after each control transfer so firmware can apply it, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Preferred dongle as `"vvvv:pppp"`. Empty = first recognised dongle.
    #[serde(default)]
    pub preferred_device: String,

    /// Profile store file. Empty = `profiles.toml` next to the config file.
    #[serde(default)]
    pub profiles_path: String,

    /// Poll period of `watch`, in milliseconds.
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,
}

fn default_transfer_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}
fn default_watch_interval_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Config {
            transfer_timeout_ms: default_transfer_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            preferred_device: String::new(),
            profiles_path: String::new(),
            watch_interval_ms: default_watch_interval_ms(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    TransferTimeout(u64),
    SettleDelay(u64),
    WatchInterval(u64),
    /// `preferred_device` is not a `vvvv:pppp` hex pair.
    PreferredDevice(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TransferTimeout(v) => {
                write!(f, "transfer_timeout_ms must be 1..=5000, got {v}")
            }
            ValidationError::SettleDelay(v) => {
                write!(f, "settle_delay_ms must be at most 2000, got {v}")
            }
            ValidationError::WatchInterval(v) => {
                write!(f, "watch_interval_ms must be 100..=60000, got {v}")
            }
            ValidationError::PreferredDevice(v) => {
                write!(f, "preferred_device must look like \"2fc6:f06a\", got \"{v}\"")
            }
        }
    }
}

/// Write `contents` to `path` via a temp file and rename.
///
/// Rename can fail across filesystems; then the file is written directly.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    std::fs::write(&tmp, contents)?;
    match std::fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            let result = std::fs::write(path, contents);
            let _ = std::fs::remove_file(&tmp);
            result
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dongler"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Profile store path: `profiles_path` if set, else `profiles.toml` in [`Config::dir`].
    pub fn profiles_file(&self) -> Option<PathBuf> {
        let custom = self.profiles_path.trim();
        if custom.is_empty() {
            Self::dir().map(|d| d.join("profiles.toml"))
        } else {
            Some(PathBuf::from(custom))
        }
    }

    /// Save config to an arbitrary path atomically, with a header comment.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        write_atomic(path, &format!("{CONFIG_HEADER}{serialized}"))
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Transfer timing for the repositories.
    pub fn timing(&self) -> Timing {
        Timing::from_millis(self.transfer_timeout_ms, self.settle_delay_ms)
    }

    /// Parsed `preferred_device`. `None` when empty or malformed.
    pub fn preferred_device_ids(&self) -> Option<(u16, u16)> {
        parse_usb_id(&self.preferred_device)
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !(1..=5000).contains(&self.transfer_timeout_ms) {
            errors.push(ValidationError::TransferTimeout(self.transfer_timeout_ms));
        }
        if self.settle_delay_ms > 2000 {
            errors.push(ValidationError::SettleDelay(self.settle_delay_ms));
        }
        if !(100..=60_000).contains(&self.watch_interval_ms) {
            errors.push(ValidationError::WatchInterval(self.watch_interval_ms));
        }
        let preferred = self.preferred_device.trim();
        if !preferred.is_empty() && parse_usb_id(preferred).is_none() {
            errors.push(ValidationError::PreferredDevice(preferred.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
