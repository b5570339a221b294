//! CLI subcommands — device listing, state, settings, profiles, watcher.

mod config_cmd;
mod devices;
mod features;
mod profile;
mod set;
mod status;
mod volume;
mod watch;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Subcommand, ValueEnum};
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use dongler_lib::config::Config;
pub(super) use dongler_lib::controller::DongleController;
pub(super) use dongler_lib::device::{self, AttachedDevice, DeviceError};
pub(super) use dongler_lib::dongle::UsbDongle;
pub(super) use dongler_lib::error::{DonglerError, Result};
pub(super) use dongler_lib::profile::{FileProfileStore, Profile, ProfileStore};

/// Global flags shared by every subcommand.
pub struct Context {
    pub json: bool,
    pub config_path: Option<PathBuf>,
}

impl Context {
    /// The config file in effect: `--config` or the default location.
    pub(super) fn config_file(&self) -> Option<PathBuf> {
        self.config_path.clone().or_else(Config::path)
    }

    /// Load the config, logging parse and validation problems.
    pub(super) fn load_config(&self) -> Config {
        let (config, warnings) = match &self.config_path {
            Some(p) => Config::load_from(p),
            None => Config::load_with_warnings(),
        };
        for w in &warnings {
            log::warn!("[config] {w}");
        }
        if let Err(errors) = config.validate() {
            for e in &errors {
                log::warn!("[config] {e}");
            }
        }
        config
    }

    pub(super) fn controller(&self, config: &Config) -> DongleController {
        DongleController::from_config(Arc::new(device::platform_host()), config)
    }

    pub(super) fn profile_store(&self, config: &Config) -> Result<FileProfileStore> {
        config
            .profiles_file()
            .map(FileProfileStore::new)
            .ok_or_else(|| DonglerError::Config("no config directory for the profile store".into()))
    }
}

/// Resolve the first attached dongle and read its current state.
pub(super) fn attached_state(controller: &DongleController) -> Result<UsbDongle> {
    let dongle = controller.first_attached()?;
    controller.current_state(&dongle)
}

// ── Output helpers ──

const PADDING: usize = 2;

/// Column where values start. Indented keys lose two columns to the
/// `"  "` prefix, so both levels line up on the same value column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_need = top.iter().map(|k| k.len()).max().map_or(0, |w| w + PADDING);
    let indent_need = indent
        .iter()
        .map(|k| k.len())
        .max()
        .map_or(0, |w| w + PADDING + 2);
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<w$}{value}")
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {}", format_kv(key, value, w.saturating_sub(2)));
}

pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    println!("{text}");
    Ok(())
}

// ── JSON output structs ──

#[derive(Debug, Serialize)]
pub(super) struct DongleJson {
    pub model: &'static str,
    pub usb_id: String,
    pub family: String,
    pub volume: String,
    pub features: BTreeMap<&'static str, String>,
}

impl From<&UsbDongle> for DongleJson {
    fn from(dongle: &UsbDongle) -> Self {
        DongleJson {
            model: dongle.model_name(),
            usb_id: dongle.model().usb_id(),
            family: dongle.family().to_string(),
            volume: dongle.display_volume_level(),
            features: dongle.describe().into_iter().collect(),
        }
    }
}

#[derive(Serialize)]
pub(super) struct StatusOutput {
    pub version: &'static str,
    pub device: Option<DongleJson>,
}

/// Print a dongle's state as `key  value` lines or JSON.
pub(super) fn print_dongle(dongle: &UsbDongle, json: bool) -> Result<()> {
    if json {
        return print_json(&DongleJson::from(dongle));
    }
    let features = dongle.describe();
    let keys: Vec<&str> = features.iter().map(|(k, _)| *k).collect();
    let w = kv_width(&["Device:", "Volume:"], &keys);
    kv("Device:", dongle, w);
    kv("Volume:", dongle.display_volume_level(), w);
    println!();
    for (key, value) in &features {
        kv_indent(key, value, w);
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VolumeStep {
    Up,
    Down,
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// List stored profiles
    List {
        /// Only profiles for the attached dongle
        #[arg(long)]
        attached: bool,
    },
    /// Save the attached dongle's current state under NAME
    Save { name: String },
    /// Write a stored profile to the attached dongle
    Apply { id: u32 },
    /// Delete a stored profile
    Delete { id: u32 },
}

#[derive(Subcommand)]
pub enum Command {
    /// List attached USB devices recognised as dongles
    Devices,

    /// Read and show the state of the attached dongle
    Status,

    /// List settable keys and the values they accept
    Features {
        /// Model as a `vvvv:pppp` USB id instead of the attached dongle
        #[arg(long, value_name = "USB_ID")]
        model: Option<String>,
    },

    /// Change one setting, e.g. `set filter min-phase-fast`
    Set { key: String, value: String },

    /// Move the volume one step
    Volume {
        #[arg(value_enum)]
        step: VolumeStep,
    },

    /// Manage stored profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Print state changes until Ctrl+C
    Watch,

    /// Show the effective configuration and file paths
    Config {
        /// Write a default config file first, unless one exists
        #[arg(long)]
        init: bool,
    },
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, ctx: &Context) -> Result<()> {
    match cmd {
        Command::Devices => devices::cmd_devices(ctx),
        Command::Status => status::cmd_status(ctx),
        Command::Features { model } => features::cmd_features(ctx, model.as_deref()),
        Command::Set { key, value } => set::cmd_set(ctx, &key, &value),
        Command::Volume { step } => volume::cmd_volume(ctx, step),
        Command::Profile { action } => profile::cmd_profile(ctx, action),
        Command::Watch => {
            if ctx.json {
                warn_json_unsupported("watch");
            }
            watch::cmd_watch(ctx)
        }
        Command::Config { init } => config_cmd::cmd_config(ctx, init),
    }
}
