//! FiiO KA5 descriptor.

use super::{FeatureSet, VolumeControl};
use crate::error::{DonglerError, Result};
use crate::feature::fiio::{
    ChannelBalance, DacMode, DisplayBrightness, DisplayInvert, DisplayTimeout, Filter, Gain,
    HidMode, Ka5VolumeLevel, VolumeMode,
};
use crate::feature::{DisplayNumber, RangedFeature, WireFeature, parse_clamped};
use crate::models::Family;
use crate::profile::{
    KEY_CHANNEL_BALANCE, KEY_DAC_MODE, KEY_DISPLAY_BRIGHTNESS, KEY_DISPLAY_INVERT,
    KEY_DISPLAY_TIMEOUT, KEY_FILTER, KEY_GAIN, KEY_HID_MODE, KEY_VOLUME_LEVEL, KEY_VOLUME_MODE,
    Profile,
};
use crate::setting::{SettingInfo, enum_info, parse_enum, parse_range, range_info, unknown_key};

/// KA5 features. The volume mode travels inside `volume_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ka5Features {
    pub filter: Filter,
    pub gain: Gain,
    pub dac_mode: DacMode,
    pub hid_mode: HidMode,
    pub channel_balance: ChannelBalance,
    pub display_brightness: DisplayBrightness,
    pub display_timeout: DisplayTimeout,
    pub display_invert: DisplayInvert,
    pub volume_level: Ka5VolumeLevel,
}

impl Ka5Features {
    pub fn volume_mode(&self) -> VolumeMode {
        self.volume_level.mode()
    }
}

impl VolumeControl for Ka5Features {
    fn display_volume(&self) -> String {
        self.volume_level.to_string()
    }

    fn volume_up(self) -> Self {
        Ka5Features {
            volume_level: self.volume_level.up(),
            ..self
        }
    }

    fn volume_down(self) -> Self {
        Ka5Features {
            volume_level: self.volume_level.down(),
            ..self
        }
    }
}

impl FeatureSet for Ka5Features {
    const FAMILY: Family = Family::FiioKa5;

    fn write_profile(&self, profile: &mut Profile) {
        profile.filter = self.filter.id();
        profile.gain = self.gain.id();
        profile.dac_mode = self.dac_mode.id();
        profile.hid_mode = self.hid_mode.id();
        profile.channel_balance = self.channel_balance.display_value();
        profile.display_brightness = self.display_brightness.display_value();
        profile.display_timeout = self.display_timeout.display_value();
        profile.display_invert = self.display_invert.id();
        profile.volume_mode = self.volume_mode().id();
        profile.volume_level = self.volume_level.level();
    }

    fn from_profile(profile: &Profile) -> Self {
        let mode = VolumeMode::from_wire_or_default(profile.volume_mode);
        Ka5Features {
            filter: Filter::from_wire_or_default(profile.filter),
            gain: Gain::from_wire_or_default(profile.gain),
            dac_mode: DacMode::from_wire_or_default(profile.dac_mode),
            hid_mode: HidMode::from_wire_or_default(profile.hid_mode),
            channel_balance: ChannelBalance::from_display_value(profile.channel_balance),
            display_brightness: DisplayBrightness::from_display_value(profile.display_brightness),
            display_timeout: DisplayTimeout::from_display_value(profile.display_timeout),
            display_invert: DisplayInvert::from_wire_or_default(profile.display_invert),
            volume_level: Ka5VolumeLevel::new(profile.volume_level, mode),
        }
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_FILTER, self.filter.name().to_string()),
            (KEY_GAIN, self.gain.name().to_string()),
            (KEY_DAC_MODE, self.dac_mode.name().to_string()),
            (KEY_HID_MODE, self.hid_mode.name().to_string()),
            (KEY_CHANNEL_BALANCE, self.channel_balance.display_value().to_string()),
            (
                KEY_DISPLAY_BRIGHTNESS,
                self.display_brightness.display_value().to_string(),
            ),
            (KEY_DISPLAY_TIMEOUT, self.display_timeout.display_value().to_string()),
            (KEY_DISPLAY_INVERT, self.display_invert.name().to_string()),
            (KEY_VOLUME_MODE, self.volume_mode().name().to_string()),
            (KEY_VOLUME_LEVEL, self.volume_level.level().to_string()),
        ]
    }
}

/// One settable KA5 feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ka5Setting {
    Filter(Filter),
    Gain(Gain),
    DacMode(DacMode),
    HidMode(HidMode),
    ChannelBalance(ChannelBalance),
    DisplayBrightness(DisplayBrightness),
    DisplayTimeout(DisplayTimeout),
    DisplayInvert(DisplayInvert),
    VolumeMode(VolumeMode),
    /// Raw level in the device's current mode (clamped on apply).
    VolumeLevel(u8),
}

impl Ka5Setting {
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        Ok(match key {
            KEY_FILTER => Ka5Setting::Filter(parse_enum(key, value)?),
            KEY_GAIN => Ka5Setting::Gain(parse_enum(key, value)?),
            KEY_DAC_MODE => Ka5Setting::DacMode(parse_enum(key, value)?),
            KEY_HID_MODE => Ka5Setting::HidMode(parse_enum(key, value)?),
            KEY_CHANNEL_BALANCE => Ka5Setting::ChannelBalance(parse_range(key, value)?),
            KEY_DISPLAY_BRIGHTNESS => Ka5Setting::DisplayBrightness(parse_range(key, value)?),
            KEY_DISPLAY_TIMEOUT => Ka5Setting::DisplayTimeout(parse_range(key, value)?),
            KEY_DISPLAY_INVERT => Ka5Setting::DisplayInvert(parse_enum(key, value)?),
            KEY_VOLUME_MODE => Ka5Setting::VolumeMode(parse_enum(key, value)?),
            KEY_VOLUME_LEVEL => {
                let max = VolumeMode::A.max_level();
                let level = parse_clamped(value, 0.0, f64::from(max)).ok_or_else(|| {
                    DonglerError::Setting(format!(
                        "{key}: expected a number in 0..={max}, got \"{}\"",
                        value.trim()
                    ))
                })?;
                Ka5Setting::VolumeLevel(u8::from_clamped(level))
            }
            _ => return Err(unknown_key(key, &Self::keys())),
        })
    }

    pub fn keys() -> Vec<SettingInfo> {
        vec![
            enum_info::<Filter>(KEY_FILTER),
            enum_info::<Gain>(KEY_GAIN),
            enum_info::<DacMode>(KEY_DAC_MODE),
            enum_info::<HidMode>(KEY_HID_MODE),
            range_info::<ChannelBalance>(KEY_CHANNEL_BALANCE),
            range_info::<DisplayBrightness>(KEY_DISPLAY_BRIGHTNESS),
            range_info::<DisplayTimeout>(KEY_DISPLAY_TIMEOUT),
            enum_info::<DisplayInvert>(KEY_DISPLAY_INVERT),
            enum_info::<VolumeMode>(KEY_VOLUME_MODE),
            SettingInfo {
                key: KEY_VOLUME_LEVEL,
                accepted: format!(
                    "0..={} (mode a), 0..={} (mode b)",
                    VolumeMode::A.max_level(),
                    VolumeMode::B.max_level()
                ),
            },
        ]
    }
}

impl Ka5Features {
    /// Changing the volume mode rescales the level into the new mode.
    pub fn apply(self, setting: Ka5Setting) -> Self {
        match setting {
            Ka5Setting::Filter(filter) => Ka5Features { filter, ..self },
            Ka5Setting::Gain(gain) => Ka5Features { gain, ..self },
            Ka5Setting::DacMode(dac_mode) => Ka5Features { dac_mode, ..self },
            Ka5Setting::HidMode(hid_mode) => Ka5Features { hid_mode, ..self },
            Ka5Setting::ChannelBalance(channel_balance) => Ka5Features {
                channel_balance,
                ..self
            },
            Ka5Setting::DisplayBrightness(display_brightness) => Ka5Features {
                display_brightness,
                ..self
            },
            Ka5Setting::DisplayTimeout(display_timeout) => Ka5Features {
                display_timeout,
                ..self
            },
            Ka5Setting::DisplayInvert(display_invert) => Ka5Features {
                display_invert,
                ..self
            },
            Ka5Setting::VolumeMode(mode) => Ka5Features {
                volume_level: self.volume_level.with_mode(mode),
                ..self
            },
            Ka5Setting::VolumeLevel(level) => Ka5Features {
                volume_level: Ka5VolumeLevel::new(level, self.volume_mode()),
                ..self
            },
        }
    }
}
