//! E1DA #9038SG3 features.

use std::fmt;

use super::{RangedFeature, WireFeature, clamp};

/// ES9038 digital filter preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Filter {
    #[default]
    FastRollOffLinearPhase = 0,
    SlowRollOffLinearPhase = 1,
    FastRollOffMinimumPhase = 2,
    SlowRollOffMinimumPhase = 3,
    ApodizingFastRollOffLinearPhase = 5,
    HybridFastRollOffMinimumPhase = 6,
    BrickWall = 7,
}

impl WireFeature for Filter {
    const ALL: &'static [Self] = &[
        Filter::FastRollOffLinearPhase,
        Filter::SlowRollOffLinearPhase,
        Filter::FastRollOffMinimumPhase,
        Filter::SlowRollOffMinimumPhase,
        Filter::ApodizingFastRollOffLinearPhase,
        Filter::HybridFastRollOffMinimumPhase,
        Filter::BrickWall,
    ];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            Filter::FastRollOffLinearPhase => "fast-roll-off-linear-phase",
            Filter::SlowRollOffLinearPhase => "slow-roll-off-linear-phase",
            Filter::FastRollOffMinimumPhase => "fast-roll-off-minimum-phase",
            Filter::SlowRollOffMinimumPhase => "slow-roll-off-minimum-phase",
            Filter::ApodizingFastRollOffLinearPhase => "apodizing-fast-roll-off-linear-phase",
            Filter::HybridFastRollOffMinimumPhase => "hybrid-fast-roll-off-minimum-phase",
            Filter::BrickWall => "brick-wall",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Filter::FastRollOffLinearPhase => "Fast roll-off, linear phase",
            Filter::SlowRollOffLinearPhase => "Slow roll-off, linear phase",
            Filter::FastRollOffMinimumPhase => "Fast roll-off, minimum phase",
            Filter::SlowRollOffMinimumPhase => "Slow roll-off, minimum phase",
            Filter::ApodizingFastRollOffLinearPhase => "Apodizing fast roll-off, linear phase",
            Filter::HybridFastRollOffMinimumPhase => "Hybrid fast roll-off, minimum phase",
            Filter::BrickWall => "Brick wall",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MasterClockDivider {
    #[default]
    Div1 = 0,
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
}

impl WireFeature for MasterClockDivider {
    const ALL: &'static [Self] = &[
        MasterClockDivider::Div1,
        MasterClockDivider::Div2,
        MasterClockDivider::Div4,
        MasterClockDivider::Div8,
    ];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            MasterClockDivider::Div1 => "div1",
            MasterClockDivider::Div2 => "div2",
            MasterClockDivider::Div4 => "div4",
            MasterClockDivider::Div8 => "div8",
        }
    }

    fn label(self) -> &'static str {
        match self {
            MasterClockDivider::Div1 => "MCLK / 1",
            MasterClockDivider::Div2 => "MCLK / 2",
            MasterClockDivider::Div4 => "MCLK / 4",
            MasterClockDivider::Div8 => "MCLK / 8",
        }
    }
}

/// Output hardware variant the firmware should drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum HardwareType {
    #[default]
    Sg3 = 0,
    Sg3Headphone = 1,
    Sg3LineOut = 2,
}

impl WireFeature for HardwareType {
    const ALL: &'static [Self] = &[
        HardwareType::Sg3,
        HardwareType::Sg3Headphone,
        HardwareType::Sg3LineOut,
    ];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            HardwareType::Sg3 => "sg3",
            HardwareType::Sg3Headphone => "sg3-headphone",
            HardwareType::Sg3LineOut => "sg3-line-out",
        }
    }

    fn label(self) -> &'static str {
        match self {
            HardwareType::Sg3 => "SG3",
            HardwareType::Sg3Headphone => "SG3 headphone",
            HardwareType::Sg3LineOut => "SG3 line out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SampleRate {
    Hz44100 = 0,
    #[default]
    Hz48000 = 1,
    Hz88200 = 2,
    Hz96000 = 3,
    Hz176400 = 4,
    Hz192000 = 5,
    Hz352800 = 6,
    Hz384000 = 7,
}

impl SampleRate {
    pub fn hertz(self) -> u32 {
        match self {
            SampleRate::Hz44100 => 44_100,
            SampleRate::Hz48000 => 48_000,
            SampleRate::Hz88200 => 88_200,
            SampleRate::Hz96000 => 96_000,
            SampleRate::Hz176400 => 176_400,
            SampleRate::Hz192000 => 192_000,
            SampleRate::Hz352800 => 352_800,
            SampleRate::Hz384000 => 384_000,
        }
    }
}

impl WireFeature for SampleRate {
    const ALL: &'static [Self] = &[
        SampleRate::Hz44100,
        SampleRate::Hz48000,
        SampleRate::Hz88200,
        SampleRate::Hz96000,
        SampleRate::Hz176400,
        SampleRate::Hz192000,
        SampleRate::Hz352800,
        SampleRate::Hz384000,
    ];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            SampleRate::Hz44100 => "44.1k",
            SampleRate::Hz48000 => "48k",
            SampleRate::Hz88200 => "88.2k",
            SampleRate::Hz96000 => "96k",
            SampleRate::Hz176400 => "176.4k",
            SampleRate::Hz192000 => "192k",
            SampleRate::Hz352800 => "352.8k",
            SampleRate::Hz384000 => "384k",
        }
    }

    fn label(self) -> &'static str {
        match self {
            SampleRate::Hz44100 => "44.1 kHz",
            SampleRate::Hz48000 => "48 kHz",
            SampleRate::Hz88200 => "88.2 kHz",
            SampleRate::Hz96000 => "96 kHz",
            SampleRate::Hz176400 => "176.4 kHz",
            SampleRate::Hz192000 => "192 kHz",
            SampleRate::Hz352800 => "352.8 kHz",
            SampleRate::Hz384000 => "384 kHz",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Standby {
    #[default]
    Disabled = 0,
    Enabled = 1,
}

impl WireFeature for Standby {
    const ALL: &'static [Self] = &[Standby::Disabled, Standby::Enabled];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            Standby::Disabled => "disabled",
            Standby::Enabled => "enabled",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Standby::Disabled => "Off",
            Standby::Enabled => "On",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum HardwareMute {
    #[default]
    Disabled = 0,
    Enabled = 1,
}

impl WireFeature for HardwareMute {
    const ALL: &'static [Self] = &[HardwareMute::Disabled, HardwareMute::Enabled];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            HardwareMute::Disabled => "disabled",
            HardwareMute::Enabled => "enabled",
        }
    }

    fn label(self) -> &'static str {
        match self {
            HardwareMute::Disabled => "Unmuted",
            HardwareMute::Enabled => "Muted",
        }
    }
}

// ── Volume ──

/// Attenuation in half-dB units: payload `n` is `-n / 2` dB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeLevel {
    payload: u8,
}

impl Default for VolumeLevel {
    fn default() -> Self {
        // -20 dB
        VolumeLevel { payload: 40 }
    }
}

impl VolumeLevel {
    pub fn from_payload(payload: u8) -> Self {
        VolumeLevel { payload }
    }

    pub fn payload(self) -> u8 {
        self.payload
    }

    /// Half a dB louder.
    pub fn up(self) -> Self {
        Self::from_payload(self.payload.saturating_sub(1))
    }

    /// Half a dB quieter.
    pub fn down(self) -> Self {
        Self::from_payload(self.payload.saturating_add(1))
    }
}

impl fmt::Display for VolumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} dB", self.display_value())
    }
}

impl RangedFeature for VolumeLevel {
    type Value = f32;

    const MIN: f32 = -127.5;
    const MAX: f32 = 0.0;
    const STEP: f32 = 0.5;

    fn from_display_value(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        let db = clamp(value, Self::MIN, Self::MAX);
        VolumeLevel {
            payload: (-db * 2.0).round() as u8,
        }
    }

    fn display_value(self) -> f32 {
        -(self.payload as f32) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_skips_id_4() {
        assert_eq!(Filter::from_wire(4), None);
        assert_eq!(Filter::from_wire_or_default(4), Filter::FastRollOffLinearPhase);
        assert_eq!(Filter::from_wire(5), Some(Filter::ApodizingFastRollOffLinearPhase));
        assert_eq!(Filter::BrickWall.id(), 7);
    }

    #[test]
    fn enum_ids_round_trip() {
        for &v in MasterClockDivider::ALL {
            assert_eq!(MasterClockDivider::from_wire_or_default(v.id()), v);
        }
        for &v in HardwareType::ALL {
            assert_eq!(HardwareType::from_wire_or_default(v.id()), v);
        }
        for &v in SampleRate::ALL {
            assert_eq!(SampleRate::from_wire_or_default(v.id()), v);
        }
    }

    #[test]
    fn sample_rate_default_is_48k() {
        assert_eq!(SampleRate::default(), SampleRate::Hz48000);
        assert_eq!(SampleRate::from_wire_or_default(0x20), SampleRate::Hz48000);
        assert_eq!(SampleRate::from_name("96K"), Some(SampleRate::Hz96000));
        assert_eq!(SampleRate::Hz352800.hertz(), 352_800);
    }

    #[test]
    fn volume_payload_to_db() {
        assert_eq!(VolumeLevel::from_payload(0).display_value(), 0.0);
        assert_eq!(VolumeLevel::from_payload(10).display_value(), -5.0);
        assert_eq!(VolumeLevel::from_payload(255).display_value(), -127.5);
    }

    #[test]
    fn volume_clamps_to_min_db() {
        let v = VolumeLevel::from_display_value(-130.0);
        assert_eq!(v.display_value(), -127.5);
        assert_eq!(v.payload(), 255);
        assert_eq!(VolumeLevel::from_display_value(3.0).display_value(), 0.0);
    }

    #[test]
    fn volume_nan_is_default_not_full_scale() {
        let v = VolumeLevel::from_display_value(f32::NAN);
        assert_eq!(v, VolumeLevel::default());
        assert_eq!(v.payload(), 40);
    }

    #[test]
    fn volume_every_half_db_round_trips() {
        for payload in 0..=u8::MAX {
            let db = VolumeLevel::from_payload(payload).display_value();
            assert_eq!(VolumeLevel::from_display_value(db).payload(), payload);
        }
    }

    #[test]
    fn volume_default_is_minus_20_db() {
        assert_eq!(VolumeLevel::default().display_value(), -20.0);
        assert_eq!(VolumeLevel::default().to_string(), "-20.0 dB");
    }

    #[test]
    fn volume_steps_half_db() {
        let v = VolumeLevel::default();
        assert_eq!(v.up().display_value(), -19.5);
        assert_eq!(v.down().display_value(), -20.5);
        assert_eq!(VolumeLevel::from_payload(0).up().payload(), 0);
        assert_eq!(VolumeLevel::from_payload(255).down().payload(), 255);
    }
}
