//! Moondrop Dawn family descriptor (Dawn 3.5/4.4/Pro, Moonriver 2 Ti).

use super::{FeatureSet, VolumeControl};
use crate::error::Result;
use crate::feature::moondrop::{Filter, Gain, IndicatorState, VolumeLevel};
use crate::feature::{RangedFeature, WireFeature};
use crate::models::Family;
use crate::profile::{KEY_FILTER, KEY_GAIN, KEY_INDICATOR_STATE, KEY_VOLUME_LEVEL, Profile};
use crate::setting::{SettingInfo, enum_info, parse_enum, parse_range, range_info, unknown_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DawnFeatures {
    pub filter: Filter,
    pub gain: Gain,
    pub indicator_state: IndicatorState,
    pub volume_level: VolumeLevel,
}

impl VolumeControl for DawnFeatures {
    fn display_volume(&self) -> String {
        format!("{}%", self.volume_level.percent())
    }

    fn volume_up(self) -> Self {
        DawnFeatures {
            volume_level: self.volume_level.up(),
            ..self
        }
    }

    fn volume_down(self) -> Self {
        DawnFeatures {
            volume_level: self.volume_level.down(),
            ..self
        }
    }
}

impl FeatureSet for DawnFeatures {
    const FAMILY: Family = Family::MoondropDawn;

    fn write_profile(&self, profile: &mut Profile) {
        profile.filter = self.filter.id();
        profile.gain = self.gain.id();
        profile.indicator_state = self.indicator_state.id();
        profile.volume_level = self.volume_level.step();
    }

    fn from_profile(profile: &Profile) -> Self {
        DawnFeatures {
            filter: Filter::from_wire_or_default(profile.filter),
            gain: Gain::from_wire_or_default(profile.gain),
            indicator_state: IndicatorState::from_wire_or_default(profile.indicator_state),
            volume_level: VolumeLevel::from_display_value(profile.volume_level),
        }
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_FILTER, self.filter.name().to_string()),
            (KEY_GAIN, self.gain.name().to_string()),
            (KEY_INDICATOR_STATE, self.indicator_state.name().to_string()),
            (KEY_VOLUME_LEVEL, self.volume_level.step().to_string()),
        ]
    }
}

/// One settable Dawn feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DawnSetting {
    Filter(Filter),
    Gain(Gain),
    IndicatorState(IndicatorState),
    VolumeLevel(VolumeLevel),
}

impl DawnSetting {
    /// Parse a normalized key and its value.
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        Ok(match key {
            KEY_FILTER => DawnSetting::Filter(parse_enum(key, value)?),
            KEY_GAIN => DawnSetting::Gain(parse_enum(key, value)?),
            KEY_INDICATOR_STATE => DawnSetting::IndicatorState(parse_enum(key, value)?),
            KEY_VOLUME_LEVEL => DawnSetting::VolumeLevel(parse_range(key, value)?),
            _ => return Err(unknown_key(key, &Self::keys())),
        })
    }

    pub fn keys() -> Vec<SettingInfo> {
        vec![
            enum_info::<Filter>(KEY_FILTER),
            enum_info::<Gain>(KEY_GAIN),
            enum_info::<IndicatorState>(KEY_INDICATOR_STATE),
            range_info::<VolumeLevel>(KEY_VOLUME_LEVEL),
        ]
    }
}

impl DawnFeatures {
    pub fn apply(self, setting: DawnSetting) -> Self {
        match setting {
            DawnSetting::Filter(filter) => DawnFeatures { filter, ..self },
            DawnSetting::Gain(gain) => DawnFeatures { gain, ..self },
            DawnSetting::IndicatorState(indicator_state) => DawnFeatures {
                indicator_state,
                ..self
            },
            DawnSetting::VolumeLevel(volume_level) => DawnFeatures {
                volume_level,
                ..self
            },
        }
    }
}
