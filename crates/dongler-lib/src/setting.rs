//! Settings — one feature change, parsed from a `(key, value)` string pair.
//!
//! Keys are the profile's flat keys (`filter`, `volume_level`, ...); `-` and
//! upper case are accepted. Enumerated values use the feature's kebab-case
//! names, numeric values are decimal display values and are clamped.

use serde::Serialize;

use crate::dongle::{DawnSetting, E1daSetting, Ka5Setting, Ka13Setting, UsbDongle};
use crate::error::{DonglerError, Result};
use crate::feature::{RangedFeature, WireFeature, range_hint};
use crate::models::Family;

/// A settable key and a description of the values it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingInfo {
    pub key: &'static str,
    pub accepted: String,
}

pub(crate) fn enum_info<F: WireFeature>(key: &'static str) -> SettingInfo {
    SettingInfo {
        key,
        accepted: F::names().join(", "),
    }
}

pub(crate) fn range_info<F: RangedFeature>(key: &'static str) -> SettingInfo {
    SettingInfo {
        key,
        accepted: range_hint::<F>(),
    }
}

pub(crate) fn parse_enum<F: WireFeature>(key: &str, value: &str) -> Result<F> {
    F::from_name(value).ok_or_else(|| {
        DonglerError::Setting(format!(
            "{key}: unknown value \"{}\", expected one of: {}",
            value.trim(),
            F::names().join(", ")
        ))
    })
}

pub(crate) fn parse_range<F: RangedFeature>(key: &str, value: &str) -> Result<F> {
    crate::feature::parse_ranged(value).ok_or_else(|| {
        DonglerError::Setting(format!(
            "{key}: expected a number in {}, got \"{}\"",
            range_hint::<F>(),
            value.trim()
        ))
    })
}

pub(crate) fn unknown_key(key: &str, known: &[SettingInfo]) -> DonglerError {
    let keys: Vec<&str> = known.iter().map(|k| k.key).collect();
    DonglerError::Setting(format!(
        "unknown key \"{key}\", expected one of: {}",
        keys.join(", ")
    ))
}

/// `Volume-Level` → `volume_level`.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('-', "_")
}

/// One feature change for a specific family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Dawn(DawnSetting),
    Ka5(Ka5Setting),
    Ka13(Ka13Setting),
    E1da(E1daSetting),
}

impl Setting {
    /// Parse `key`/`value` for the model of `dongle`.
    pub fn parse(dongle: &UsbDongle, key: &str, value: &str) -> Result<Self> {
        let key = normalize_key(key);
        Ok(match dongle.family() {
            Family::MoondropDawn => Setting::Dawn(DawnSetting::parse(&key, value)?),
            Family::FiioKa5 => Setting::Ka5(Ka5Setting::parse(&key, value)?),
            Family::FiioKa13 => Setting::Ka13(Ka13Setting::parse(&key, value)?),
            Family::E1da9038 => Setting::E1da(E1daSetting::parse(&key, value)?),
        })
    }

    /// Settable keys for a family, in menu order.
    pub fn keys_for(family: Family) -> Vec<SettingInfo> {
        match family {
            Family::MoondropDawn => DawnSetting::keys(),
            Family::FiioKa5 => Ka5Setting::keys(),
            Family::FiioKa13 => Ka13Setting::keys(),
            Family::E1da9038 => E1daSetting::keys(),
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Setting::Dawn(_) => Family::MoondropDawn,
            Setting::Ka5(_) => Family::FiioKa5,
            Setting::Ka13(_) => Family::FiioKa13,
            Setting::E1da(_) => Family::E1da9038,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::moondrop::Filter;

    fn dawn() -> UsbDongle {
        UsbDongle::detect(0x2FC6, 0xF06B).unwrap()
    }

    #[test]
    fn normalize_key_accepts_dashes_and_case() {
        assert_eq!(normalize_key(" Volume-Level "), "volume_level");
    }

    #[test]
    fn parse_dispatches_on_family() {
        let s = Setting::parse(&dawn(), "FILTER", "min-phase-fast").unwrap();
        assert_eq!(s, Setting::Dawn(DawnSetting::Filter(Filter::MinPhaseFast)));
        assert_eq!(s.family(), Family::MoondropDawn);

        let e1da = UsbDongle::detect(0x262A, 0x9038).unwrap();
        let s = Setting::parse(&e1da, "standby", "enabled").unwrap();
        assert_eq!(s.family(), Family::E1da9038);
    }

    #[test]
    fn unknown_key_lists_keys() {
        let err = Setting::parse(&dawn(), "dac_mode", "class-h").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown key \"dac_mode\""));
        assert!(msg.contains("filter, gain, indicator_state, volume_level"));
    }

    #[test]
    fn bad_number_mentions_range() {
        let err = Setting::parse(&dawn(), "volume_level", "loud").unwrap_err();
        assert!(err.to_string().contains("0..=60 (step 1)"));
    }

    #[test]
    fn keys_for_every_family() {
        assert_eq!(Setting::keys_for(Family::MoondropDawn).len(), 4);
        assert_eq!(Setting::keys_for(Family::FiioKa5).len(), 10);
        assert_eq!(Setting::keys_for(Family::FiioKa13).len(), 5);
        assert_eq!(Setting::keys_for(Family::E1da9038).len(), 7);
    }

    #[test]
    fn enum_info_lists_names() {
        let info = Setting::keys_for(Family::E1da9038);
        assert_eq!(info[5].key, "standby");
        assert_eq!(info[5].accepted, "disabled, enabled");
    }
}
