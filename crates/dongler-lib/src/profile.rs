//! Profiles — named snapshots of one dongle's feature state, and their stores.
//!
//! A [`Profile`] is model-agnostic: it carries every feature key any model
//! uses, and fields a model does not have stay zero. It converts to and from
//! a flat key/value map ([`Profile::to_flat`], [`Profile::from_flat`]); that
//! map is the only persisted form.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::write_atomic;
use crate::error::{DonglerError, Result};

// ── Keys ──

pub const KEY_ID: &str = "id";
pub const KEY_NAME: &str = "name";
pub const KEY_VENDOR_ID: &str = "vendor_id";
pub const KEY_PRODUCT_ID: &str = "product_id";

pub const KEY_FILTER: &str = "filter";
pub const KEY_GAIN: &str = "gain";
pub const KEY_INDICATOR_STATE: &str = "indicator_state";
pub const KEY_VOLUME_LEVEL: &str = "volume_level";
pub const KEY_CHANNEL_BALANCE: &str = "channel_balance";
pub const KEY_DAC_MODE: &str = "dac_mode";
pub const KEY_HID_MODE: &str = "hid_mode";
pub const KEY_DISPLAY_BRIGHTNESS: &str = "display_brightness";
pub const KEY_DISPLAY_TIMEOUT: &str = "display_timeout";
pub const KEY_DISPLAY_INVERT: &str = "display_invert";
pub const KEY_SPDIF_OUT: &str = "spdif_out";
pub const KEY_VOLUME_MODE: &str = "volume_mode";
pub const KEY_MASTER_CLOCK_DIVIDER: &str = "master_clock_divider";
pub const KEY_HARDWARE_TYPE: &str = "hardware_type";
pub const KEY_SAMPLE_RATE: &str = "sample_rate";
pub const KEY_STANDBY: &str = "standby";
pub const KEY_HARDWARE_MUTE: &str = "hardware_mute";

/// Every feature key, in persisted order.
pub const FEATURE_KEYS: [&str; 17] = [
    KEY_FILTER,
    KEY_GAIN,
    KEY_INDICATOR_STATE,
    KEY_VOLUME_LEVEL,
    KEY_CHANNEL_BALANCE,
    KEY_DAC_MODE,
    KEY_HID_MODE,
    KEY_DISPLAY_BRIGHTNESS,
    KEY_DISPLAY_TIMEOUT,
    KEY_DISPLAY_INVERT,
    KEY_SPDIF_OUT,
    KEY_VOLUME_MODE,
    KEY_MASTER_CLOCK_DIVIDER,
    KEY_HARDWARE_TYPE,
    KEY_SAMPLE_RATE,
    KEY_STANDBY,
    KEY_HARDWARE_MUTE,
];

// ── Flat encoding ──

/// One value of the flat encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlatValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for FlatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatValue::Int(v) => write!(f, "{v}"),
            FlatValue::Text(s) => f.write_str(s),
        }
    }
}

pub type FlatMap = BTreeMap<String, FlatValue>;

/// Integer under `key`, or zero when missing, non-numeric or out of range for `T`.
fn int<T: TryFrom<i64> + Default>(map: &FlatMap, key: &str) -> T {
    match map.get(key) {
        None => T::default(),
        Some(FlatValue::Int(v)) => T::try_from(*v).unwrap_or_else(|_| {
            log::warn!("profile key {key}: {v} out of range, using 0");
            T::default()
        }),
        Some(FlatValue::Text(s)) => {
            log::warn!("profile key {key}: expected a number, got \"{s}\"");
            T::default()
        }
    }
}

// ── Profile ──

/// A named snapshot of one dongle's full feature state.
///
/// Enumerated features hold wire ids; `volume_level` holds the model's stored
/// level and `channel_balance` the signed balance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    /// Store-assigned id; 0 until inserted.
    pub id: u32,
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,

    pub filter: u8,
    pub gain: u8,
    pub indicator_state: u8,
    pub volume_level: u8,
    pub channel_balance: i8,
    pub dac_mode: u8,
    pub hid_mode: u8,
    pub display_brightness: u8,
    pub display_timeout: u8,
    pub display_invert: u8,
    pub spdif_out: u8,
    pub volume_mode: u8,
    pub master_clock_divider: u8,
    pub hardware_type: u8,
    pub sample_rate: u8,
    pub standby: u8,
    pub hardware_mute: u8,
}

impl Profile {
    pub fn new(name: impl Into<String>, vendor_id: u16, product_id: u16) -> Self {
        Profile {
            name: name.into(),
            vendor_id,
            product_id,
            ..Profile::default()
        }
    }

    /// Whether this profile was taken from a device with these ids.
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }

    fn feature_values(&self) -> [i64; 17] {
        [
            self.filter as i64,
            self.gain as i64,
            self.indicator_state as i64,
            self.volume_level as i64,
            self.channel_balance as i64,
            self.dac_mode as i64,
            self.hid_mode as i64,
            self.display_brightness as i64,
            self.display_timeout as i64,
            self.display_invert as i64,
            self.spdif_out as i64,
            self.volume_mode as i64,
            self.master_clock_divider as i64,
            self.hardware_type as i64,
            self.sample_rate as i64,
            self.standby as i64,
            self.hardware_mute as i64,
        ]
    }

    /// Feature keys only (no identity), as a flat map.
    pub fn features_flat(&self) -> FlatMap {
        FEATURE_KEYS
            .iter()
            .zip(self.feature_values())
            .map(|(k, v)| (k.to_string(), FlatValue::Int(v)))
            .collect()
    }

    /// Full flat encoding: identity keys plus every feature key.
    pub fn to_flat(&self) -> FlatMap {
        let mut map = self.features_flat();
        map.insert(KEY_ID.into(), FlatValue::Int(self.id as i64));
        map.insert(KEY_NAME.into(), FlatValue::Text(self.name.clone()));
        map.insert(KEY_VENDOR_ID.into(), FlatValue::Int(self.vendor_id as i64));
        map.insert(KEY_PRODUCT_ID.into(), FlatValue::Int(self.product_id as i64));
        map
    }

    /// Decode a flat map. Unknown keys are ignored; missing keys become zero.
    pub fn from_flat(map: &FlatMap) -> Self {
        let name = match map.get(KEY_NAME) {
            Some(FlatValue::Text(s)) => s.clone(),
            Some(FlatValue::Int(v)) => v.to_string(),
            None => String::new(),
        };
        Profile {
            id: int(map, KEY_ID),
            name,
            vendor_id: int(map, KEY_VENDOR_ID),
            product_id: int(map, KEY_PRODUCT_ID),
            filter: int(map, KEY_FILTER),
            gain: int(map, KEY_GAIN),
            indicator_state: int(map, KEY_INDICATOR_STATE),
            volume_level: int(map, KEY_VOLUME_LEVEL),
            channel_balance: int(map, KEY_CHANNEL_BALANCE),
            dac_mode: int(map, KEY_DAC_MODE),
            hid_mode: int(map, KEY_HID_MODE),
            display_brightness: int(map, KEY_DISPLAY_BRIGHTNESS),
            display_timeout: int(map, KEY_DISPLAY_TIMEOUT),
            display_invert: int(map, KEY_DISPLAY_INVERT),
            spdif_out: int(map, KEY_SPDIF_OUT),
            volume_mode: int(map, KEY_VOLUME_MODE),
            master_clock_divider: int(map, KEY_MASTER_CLOCK_DIVIDER),
            hardware_type: int(map, KEY_HARDWARE_TYPE),
            sample_rate: int(map, KEY_SAMPLE_RATE),
            standby: int(map, KEY_STANDBY),
            hardware_mute: int(map, KEY_HARDWARE_MUTE),
        }
    }
}

// ── Stores ──

/// Keyed store of profiles.
pub trait ProfileStore {
    /// All profiles, in id order.
    fn list(&self) -> Result<Vec<Profile>>;

    /// Profiles taken from devices with these ids.
    fn list_for(&self, vendor_id: u16, product_id: u16) -> Result<Vec<Profile>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|p| p.matches(vendor_id, product_id))
            .collect())
    }

    fn get(&self, id: u32) -> Result<Option<Profile>> {
        Ok(self.list()?.into_iter().find(|p| p.id == id))
    }

    /// Store `profile` under a fresh id (highest existing + 1) and return it.
    fn insert(&mut self, profile: Profile) -> Result<u32>;

    /// Remove a profile. `false` if no profile had that id.
    fn delete(&mut self, id: u32) -> Result<bool>;
}

fn next_id(profiles: &[Profile]) -> Result<u32> {
    let max = profiles.iter().map(|p| p.id).max().unwrap_or(0);
    max.checked_add(1)
        .ok_or_else(|| DonglerError::Profile(format!("no profile id left after {max}")))
}

fn check_name(profile: &Profile) -> Result<()> {
    if profile.name.trim().is_empty() {
        return Err(DonglerError::Profile("profile name must not be empty".into()));
    }
    Ok(())
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: Vec<Profile>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn list(&self) -> Result<Vec<Profile>> {
        Ok(self.profiles.clone())
    }

    fn insert(&mut self, mut profile: Profile) -> Result<u32> {
        check_name(&profile)?;
        profile.id = next_id(&self.profiles)?;
        let id = profile.id;
        self.profiles.push(profile);
        Ok(id)
    }

    fn delete(&mut self, id: u32) -> Result<bool> {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.id != id);
        Ok(self.profiles.len() != before)
    }
}

const PROFILES_HEADER: &str = "# dongler profiles. Managed by dongler-cli.\n\n";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profile: Vec<FlatMap>,
}

/// TOML file store. The file is re-read on every call.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileProfileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Profile>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let file: ProfileFile = toml::from_str(&contents)
            .map_err(|e| DonglerError::Profile(format!("{}: {e}", self.path.display())))?;
        let mut profiles: Vec<Profile> = file.profile.iter().map(Profile::from_flat).collect();
        profiles.sort_by_key(|p| p.id);
        Ok(profiles)
    }

    fn save(&self, profiles: &[Profile]) -> Result<()> {
        let file = ProfileFile {
            profile: profiles.iter().map(Profile::to_flat).collect(),
        };
        let serialized = toml::to_string_pretty(&file)
            .map_err(|e| DonglerError::Profile(format!("serialize: {e}")))?;
        write_atomic(&self.path, &format!("{PROFILES_HEADER}{serialized}"))?;
        Ok(())
    }
}

impl ProfileStore for FileProfileStore {
    fn list(&self) -> Result<Vec<Profile>> {
        self.load()
    }

    fn insert(&mut self, mut profile: Profile) -> Result<u32> {
        check_name(&profile)?;
        let mut profiles = self.load()?;
        profile.id = next_id(&profiles)?;
        let id = profile.id;
        profiles.push(profile);
        self.save(&profiles)?;
        Ok(id)
    }

    fn delete(&mut self, id: u32) -> Result<bool> {
        let mut profiles = self.load()?;
        let before = profiles.len();
        profiles.retain(|p| p.id != id);
        if profiles.len() == before {
            return Ok(false);
        }
        self.save(&profiles)?;
        Ok(true)
    }
}
