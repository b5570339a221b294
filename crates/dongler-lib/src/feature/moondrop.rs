//! Moondrop Dawn family features.

use super::{RangedFeature, WireFeature, clamp};

/// Digital reconstruction filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Filter {
    #[default]
    FastRollOffLinearPhase = 0x00,
    SlowRollOffLinearPhase = 0x20,
    MinPhaseFast = 0x40,
    MinPhaseSlow = 0x60,
    NonOversampling = 0x80,
}

impl WireFeature for Filter {
    const ALL: &'static [Self] = &[
        Filter::FastRollOffLinearPhase,
        Filter::SlowRollOffLinearPhase,
        Filter::MinPhaseFast,
        Filter::MinPhaseSlow,
        Filter::NonOversampling,
    ];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            Filter::FastRollOffLinearPhase => "fast-roll-off-linear-phase",
            Filter::SlowRollOffLinearPhase => "slow-roll-off-linear-phase",
            Filter::MinPhaseFast => "min-phase-fast",
            Filter::MinPhaseSlow => "min-phase-slow",
            Filter::NonOversampling => "non-oversampling",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Filter::FastRollOffLinearPhase => "Fast roll-off, linear phase",
            Filter::SlowRollOffLinearPhase => "Slow roll-off, linear phase",
            Filter::MinPhaseFast => "Fast roll-off, minimum phase",
            Filter::MinPhaseSlow => "Slow roll-off, minimum phase",
            Filter::NonOversampling => "Non-oversampling",
        }
    }
}

/// Output gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Gain {
    #[default]
    Low = 0x00,
    High = 0x01,
}

impl WireFeature for Gain {
    const ALL: &'static [Self] = &[Gain::Low, Gain::High];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            Gain::Low => "low",
            Gain::High => "high",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Gain::Low => "Low",
            Gain::High => "High",
        }
    }
}

/// Status LED behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum IndicatorState {
    #[default]
    Enabled = 0x00,
    /// Off until the next power cycle.
    DisabledTemporarily = 0x01,
    Disabled = 0x02,
}

impl WireFeature for IndicatorState {
    const ALL: &'static [Self] = &[
        IndicatorState::Enabled,
        IndicatorState::DisabledTemporarily,
        IndicatorState::Disabled,
    ];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            IndicatorState::Enabled => "enabled",
            IndicatorState::DisabledTemporarily => "disabled-temporarily",
            IndicatorState::Disabled => "disabled",
        }
    }

    fn label(self) -> &'static str {
        match self {
            IndicatorState::Enabled => "Enabled",
            IndicatorState::DisabledTemporarily => "Disabled until power cycle",
            IndicatorState::Disabled => "Disabled",
        }
    }
}

// ── Volume ──

/// Highest normalized volume step.
pub const VOLUME_MAX_STEP: u8 = 60;

/// Raw attenuation byte for each normalized step (index = step).
///
/// Steps 60..=31 are 2 raw units apart, steps 30..=1 are 4 apart, and step 0
/// is the hardware mute code.
pub const VOLUME_TABLE: [u8; VOLUME_MAX_STEP as usize + 1] = [
    0xFF, 0xB2, 0xAE, 0xAA, 0xA6, 0xA2, 0x9E, 0x9A, 0x96, 0x92, //
    0x8E, 0x8A, 0x86, 0x82, 0x7E, 0x7A, 0x76, 0x72, 0x6E, 0x6A, //
    0x66, 0x62, 0x5E, 0x5A, 0x56, 0x52, 0x4E, 0x4A, 0x46, 0x42, //
    0x3E, 0x3A, 0x38, 0x36, 0x34, 0x32, 0x30, 0x2E, 0x2C, 0x2A, //
    0x28, 0x26, 0x24, 0x22, 0x20, 0x1E, 0x1C, 0x1A, 0x18, 0x16, //
    0x14, 0x12, 0x10, 0x0E, 0x0C, 0x0A, 0x08, 0x06, 0x04, 0x02, //
    0x00,
];

/// Raw codes outside [`VOLUME_TABLE`] that firmware also reports, with their step.
const VOLUME_ALIASES: [(u8, u8); 1] = [(0xFE, 0)];

/// Normalized step for a raw volume byte. `None` if the byte is not in the table.
pub fn step_for_raw(raw: u8) -> Option<u8> {
    VOLUME_TABLE
        .iter()
        .position(|&r| r == raw)
        .map(|i| i as u8)
        .or_else(|| {
            VOLUME_ALIASES
                .iter()
                .find(|&&(r, _)| r == raw)
                .map(|&(_, step)| step)
        })
}

/// Raw volume byte for a normalized step. `None` above [`VOLUME_MAX_STEP`].
pub fn raw_for_step(step: u8) -> Option<u8> {
    VOLUME_TABLE.get(step as usize).copied()
}

/// Volume as a normalized step on the Dawn's non-linear taper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeLevel {
    step: u8,
}

impl Default for VolumeLevel {
    fn default() -> Self {
        VolumeLevel { step: 30 }
    }
}

impl VolumeLevel {
    /// Decode a raw byte; `None` on a table miss.
    pub fn from_raw(raw: u8) -> Option<Self> {
        step_for_raw(raw).map(|step| VolumeLevel { step })
    }

    /// Decode a raw byte, falling back to the default step on a table miss.
    ///
    /// A miss means the firmware and table disagree; it is logged, not hidden.
    pub fn from_raw_or_default(raw: u8) -> Self {
        Self::from_raw(raw).unwrap_or_else(|| {
            log::warn!("volume byte 0x{raw:02X} not in Dawn volume table, assuming default");
            Self::default()
        })
    }

    pub fn step(self) -> u8 {
        self.step
    }

    /// Raw byte sent to the device.
    pub fn raw(self) -> u8 {
        VOLUME_TABLE[self.step as usize]
    }

    /// Position in the range as a rounded percentage.
    pub fn percent(self) -> u8 {
        ((self.step as u32 * 100 + VOLUME_MAX_STEP as u32 / 2) / VOLUME_MAX_STEP as u32) as u8
    }

    pub fn up(self) -> Self {
        Self::from_display_value(self.step.saturating_add(1))
    }

    pub fn down(self) -> Self {
        Self::from_display_value(self.step.saturating_sub(1))
    }
}

impl RangedFeature for VolumeLevel {
    type Value = u8;

    const MIN: u8 = 0;
    const MAX: u8 = VOLUME_MAX_STEP;
    const STEP: u8 = 1;

    fn from_display_value(value: u8) -> Self {
        VolumeLevel {
            step: clamp(value, Self::MIN, Self::MAX),
        }
    }

    fn display_value(self) -> u8 {
        self.step
    }
}
