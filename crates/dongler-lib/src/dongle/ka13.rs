//! FiiO KA13 descriptor.

use super::{FeatureSet, VolumeControl};
use crate::error::Result;
use crate::feature::fiio::{Filter, Gain, IndicatorState, Ka13VolumeLevel, SpdifOut};
use crate::feature::{RangedFeature, WireFeature};
use crate::models::Family;
use crate::profile::{
    KEY_FILTER, KEY_GAIN, KEY_INDICATOR_STATE, KEY_SPDIF_OUT, KEY_VOLUME_LEVEL, Profile,
};
use crate::setting::{SettingInfo, enum_info, parse_enum, parse_range, range_info, unknown_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ka13Features {
    pub filter: Filter,
    /// High gain is the KA13's "desktop mode".
    pub gain: Gain,
    pub indicator_state: IndicatorState,
    pub spdif_out: SpdifOut,
    pub volume_level: Ka13VolumeLevel,
}

impl VolumeControl for Ka13Features {
    fn display_volume(&self) -> String {
        format!("{}%", self.volume_level.percent())
    }

    fn volume_up(self) -> Self {
        Ka13Features {
            volume_level: self.volume_level.up(),
            ..self
        }
    }

    fn volume_down(self) -> Self {
        Ka13Features {
            volume_level: self.volume_level.down(),
            ..self
        }
    }
}

impl FeatureSet for Ka13Features {
    const FAMILY: Family = Family::FiioKa13;

    fn write_profile(&self, profile: &mut Profile) {
        profile.filter = self.filter.id();
        profile.gain = self.gain.id();
        profile.indicator_state = self.indicator_state.id();
        profile.spdif_out = self.spdif_out.id();
        profile.volume_level = self.volume_level.display_value();
    }

    fn from_profile(profile: &Profile) -> Self {
        Ka13Features {
            filter: Filter::from_wire_or_default(profile.filter),
            gain: Gain::from_wire_or_default(profile.gain),
            indicator_state: IndicatorState::find_by_id_or_default(profile.indicator_state),
            spdif_out: SpdifOut::from_wire_or_default(profile.spdif_out),
            volume_level: Ka13VolumeLevel::from_display_value(profile.volume_level),
        }
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_FILTER, self.filter.name().to_string()),
            (KEY_GAIN, self.gain.name().to_string()),
            (KEY_INDICATOR_STATE, self.indicator_state.name().to_string()),
            (KEY_SPDIF_OUT, self.spdif_out.name().to_string()),
            (KEY_VOLUME_LEVEL, self.volume_level.display_value().to_string()),
        ]
    }
}

/// One settable KA13 feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ka13Setting {
    Filter(Filter),
    Gain(Gain),
    IndicatorState(IndicatorState),
    SpdifOut(SpdifOut),
    VolumeLevel(Ka13VolumeLevel),
}

impl Ka13Setting {
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        Ok(match key {
            KEY_FILTER => Ka13Setting::Filter(parse_enum(key, value)?),
            KEY_GAIN => Ka13Setting::Gain(parse_enum(key, value)?),
            KEY_INDICATOR_STATE => Ka13Setting::IndicatorState(parse_enum(key, value)?),
            KEY_SPDIF_OUT => Ka13Setting::SpdifOut(parse_enum(key, value)?),
            KEY_VOLUME_LEVEL => Ka13Setting::VolumeLevel(parse_range(key, value)?),
            _ => return Err(unknown_key(key, &Self::keys())),
        })
    }

    pub fn keys() -> Vec<SettingInfo> {
        vec![
            enum_info::<Filter>(KEY_FILTER),
            enum_info::<Gain>(KEY_GAIN),
            enum_info::<IndicatorState>(KEY_INDICATOR_STATE),
            enum_info::<SpdifOut>(KEY_SPDIF_OUT),
            range_info::<Ka13VolumeLevel>(KEY_VOLUME_LEVEL),
        ]
    }
}

impl Ka13Features {
    pub fn apply(self, setting: Ka13Setting) -> Self {
        match setting {
            Ka13Setting::Filter(filter) => Ka13Features { filter, ..self },
            Ka13Setting::Gain(gain) => Ka13Features { gain, ..self },
            Ka13Setting::IndicatorState(indicator_state) => Ka13Features {
                indicator_state,
                ..self
            },
            Ka13Setting::SpdifOut(spdif_out) => Ka13Features { spdif_out, ..self },
            Ka13Setting::VolumeLevel(volume_level) => Ka13Features {
                volume_level,
                ..self
            },
        }
    }
}
