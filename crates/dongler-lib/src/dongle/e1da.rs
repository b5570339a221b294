//! E1DA #9038SG3 descriptor.

use super::{FeatureSet, VolumeControl};
use crate::error::Result;
use crate::feature::e1da::{
    Filter, HardwareMute, HardwareType, MasterClockDivider, SampleRate, Standby, VolumeLevel,
};
use crate::feature::{RangedFeature, WireFeature};
use crate::models::Family;
use crate::profile::{
    KEY_FILTER, KEY_HARDWARE_MUTE, KEY_HARDWARE_TYPE, KEY_MASTER_CLOCK_DIVIDER, KEY_SAMPLE_RATE,
    KEY_STANDBY, KEY_VOLUME_LEVEL, Profile,
};
use crate::setting::{SettingInfo, enum_info, parse_enum, parse_range, range_info, unknown_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct E1daFeatures {
    pub filter: Filter,
    pub volume_level: VolumeLevel,
    pub master_clock_divider: MasterClockDivider,
    pub hardware_type: HardwareType,
    pub sample_rate: SampleRate,
    pub standby: Standby,
    pub hardware_mute: HardwareMute,
}

impl VolumeControl for E1daFeatures {
    fn display_volume(&self) -> String {
        self.volume_level.to_string()
    }

    fn volume_up(self) -> Self {
        E1daFeatures {
            volume_level: self.volume_level.up(),
            ..self
        }
    }

    fn volume_down(self) -> Self {
        E1daFeatures {
            volume_level: self.volume_level.down(),
            ..self
        }
    }
}

impl FeatureSet for E1daFeatures {
    const FAMILY: Family = Family::E1da9038;

    fn write_profile(&self, profile: &mut Profile) {
        profile.filter = self.filter.id();
        profile.volume_level = self.volume_level.payload();
        profile.master_clock_divider = self.master_clock_divider.id();
        profile.hardware_type = self.hardware_type.id();
        profile.sample_rate = self.sample_rate.id();
        profile.standby = self.standby.id();
        profile.hardware_mute = self.hardware_mute.id();
    }

    fn from_profile(profile: &Profile) -> Self {
        E1daFeatures {
            filter: Filter::from_wire_or_default(profile.filter),
            volume_level: VolumeLevel::from_payload(profile.volume_level),
            master_clock_divider: MasterClockDivider::from_wire_or_default(
                profile.master_clock_divider,
            ),
            hardware_type: HardwareType::from_wire_or_default(profile.hardware_type),
            sample_rate: SampleRate::from_wire_or_default(profile.sample_rate),
            standby: Standby::from_wire_or_default(profile.standby),
            hardware_mute: HardwareMute::from_wire_or_default(profile.hardware_mute),
        }
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_FILTER, self.filter.name().to_string()),
            (KEY_VOLUME_LEVEL, self.volume_level.display_value().to_string()),
            (
                KEY_MASTER_CLOCK_DIVIDER,
                self.master_clock_divider.name().to_string(),
            ),
            (KEY_HARDWARE_TYPE, self.hardware_type.name().to_string()),
            (KEY_SAMPLE_RATE, self.sample_rate.name().to_string()),
            (KEY_STANDBY, self.standby.name().to_string()),
            (KEY_HARDWARE_MUTE, self.hardware_mute.name().to_string()),
        ]
    }
}

/// One settable E1DA feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum E1daSetting {
    Filter(Filter),
    VolumeLevel(VolumeLevel),
    MasterClockDivider(MasterClockDivider),
    HardwareType(HardwareType),
    SampleRate(SampleRate),
    Standby(Standby),
    HardwareMute(HardwareMute),
}

impl E1daSetting {
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        Ok(match key {
            KEY_FILTER => E1daSetting::Filter(parse_enum(key, value)?),
            // Accepts dB, e.g. "-20.5".
            KEY_VOLUME_LEVEL => E1daSetting::VolumeLevel(parse_range(key, value)?),
            KEY_MASTER_CLOCK_DIVIDER => E1daSetting::MasterClockDivider(parse_enum(key, value)?),
            KEY_HARDWARE_TYPE => E1daSetting::HardwareType(parse_enum(key, value)?),
            KEY_SAMPLE_RATE => E1daSetting::SampleRate(parse_enum(key, value)?),
            KEY_STANDBY => E1daSetting::Standby(parse_enum(key, value)?),
            KEY_HARDWARE_MUTE => E1daSetting::HardwareMute(parse_enum(key, value)?),
            _ => return Err(unknown_key(key, &Self::keys())),
        })
    }

    pub fn keys() -> Vec<SettingInfo> {
        vec![
            enum_info::<Filter>(KEY_FILTER),
            range_info::<VolumeLevel>(KEY_VOLUME_LEVEL),
            enum_info::<MasterClockDivider>(KEY_MASTER_CLOCK_DIVIDER),
            enum_info::<HardwareType>(KEY_HARDWARE_TYPE),
            enum_info::<SampleRate>(KEY_SAMPLE_RATE),
            enum_info::<Standby>(KEY_STANDBY),
            enum_info::<HardwareMute>(KEY_HARDWARE_MUTE),
        ]
    }
}

impl E1daFeatures {
    pub fn apply(self, setting: E1daSetting) -> Self {
        match setting {
            E1daSetting::Filter(filter) => E1daFeatures { filter, ..self },
            E1daSetting::VolumeLevel(volume_level) => E1daFeatures {
                volume_level,
                ..self
            },
            E1daSetting::MasterClockDivider(master_clock_divider) => E1daFeatures {
                master_clock_divider,
                ..self
            },
            E1daSetting::HardwareType(hardware_type) => E1daFeatures {
                hardware_type,
                ..self
            },
            E1daSetting::SampleRate(sample_rate) => E1daFeatures {
                sample_rate,
                ..self
            },
            E1daSetting::Standby(standby) => E1daFeatures { standby, ..self },
            E1daSetting::HardwareMute(hardware_mute) => E1daFeatures {
                hardware_mute,
                ..self
            },
        }
    }
}
