//! FiiO KA5 / KA13 features.

use std::fmt;

use super::{RangedFeature, WireFeature, clamp};

/// Digital reconstruction filter (shared by KA5 and KA13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Filter {
    #[default]
    FastRollOffLowLatency = 0,
    FastRollOffPhaseCompensated = 1,
    SlowRollOffLowLatency = 2,
    SlowRollOffPhaseCompensated = 3,
    NonOversampling = 4,
}

impl WireFeature for Filter {
    const ALL: &'static [Self] = &[
        Filter::FastRollOffLowLatency,
        Filter::FastRollOffPhaseCompensated,
        Filter::SlowRollOffLowLatency,
        Filter::SlowRollOffPhaseCompensated,
        Filter::NonOversampling,
    ];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            Filter::FastRollOffLowLatency => "fast-roll-off-low-latency",
            Filter::FastRollOffPhaseCompensated => "fast-roll-off-phase-compensated",
            Filter::SlowRollOffLowLatency => "slow-roll-off-low-latency",
            Filter::SlowRollOffPhaseCompensated => "slow-roll-off-phase-compensated",
            Filter::NonOversampling => "non-oversampling",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Filter::FastRollOffLowLatency => "Fast roll-off, low latency",
            Filter::FastRollOffPhaseCompensated => "Fast roll-off, phase compensated",
            Filter::SlowRollOffLowLatency => "Slow roll-off, low latency",
            Filter::SlowRollOffPhaseCompensated => "Slow roll-off, phase compensated",
            Filter::NonOversampling => "Non-oversampling",
        }
    }
}

/// Output gain. High is labelled "desktop mode" on the KA13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Gain {
    #[default]
    Low = 0,
    High = 1,
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

/// KA13 status LED behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum IndicatorState {
    #[default]
    Enabled = 0,
    DisabledTemporarily = 1,
    Disabled = 2,
}

impl IndicatorState {
    /// Decode an id, defaulting to [`IndicatorState::Enabled`].
    pub fn find_by_id_or_default(id: u8) -> Self {
        Self::from_wire_or_default(id)
    }
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

/// KA13 coaxial S/PDIF output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SpdifOut {
    #[default]
    Disabled = 0,
    Enabled = 1,
}

impl WireFeature for SpdifOut {
    const ALL: &'static [Self] = &[SpdifOut::Disabled, SpdifOut::Enabled];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            SpdifOut::Disabled => "disabled",
            SpdifOut::Enabled => "enabled",
        }
    }

    fn label(self) -> &'static str {
        match self {
            SpdifOut::Disabled => "Off",
            SpdifOut::Enabled => "On",
        }
    }
}

/// KA5 output stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DacMode {
    #[default]
    ClassH = 0,
    ClassAb = 1,
}

impl WireFeature for DacMode {
    const ALL: &'static [Self] = &[DacMode::ClassH, DacMode::ClassAb];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            DacMode::ClassH => "class-h",
            DacMode::ClassAb => "class-ab",
        }
    }

    fn label(self) -> &'static str {
        match self {
            DacMode::ClassH => "Class H",
            DacMode::ClassAb => "Class AB",
        }
    }
}

/// KA5 HID button mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum HidMode {
    #[default]
    A = 0,
    B = 1,
}

impl WireFeature for HidMode {
    const ALL: &'static [Self] = &[HidMode::A, HidMode::B];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            HidMode::A => "a",
            HidMode::B => "b",
        }
    }

    fn label(self) -> &'static str {
        match self {
            HidMode::A => "Mode A",
            HidMode::B => "Mode B",
        }
    }
}

/// KA5 display orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DisplayInvert {
    #[default]
    Disabled = 0,
    Enabled = 1,
}

impl WireFeature for DisplayInvert {
    const ALL: &'static [Self] = &[DisplayInvert::Disabled, DisplayInvert::Enabled];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            DisplayInvert::Disabled => "disabled",
            DisplayInvert::Enabled => "enabled",
        }
    }

    fn label(self) -> &'static str {
        match self {
            DisplayInvert::Disabled => "Normal",
            DisplayInvert::Enabled => "Inverted",
        }
    }
}

/// KA5 volume resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum VolumeMode {
    /// 120 steps.
    #[default]
    A = 0,
    /// 60 steps.
    B = 1,
}

impl VolumeMode {
    pub fn max_level(self) -> u8 {
        match self {
            VolumeMode::A => 120,
            VolumeMode::B => 60,
        }
    }
}

impl WireFeature for VolumeMode {
    const ALL: &'static [Self] = &[VolumeMode::A, VolumeMode::B];

    fn id(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            VolumeMode::A => "a",
            VolumeMode::B => "b",
        }
    }

    fn label(self) -> &'static str {
        match self {
            VolumeMode::A => "A (120 steps)",
            VolumeMode::B => "B (60 steps)",
        }
    }
}

// ── Ranged ──

/// KA5 left/right balance. Negative attenuates the right channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelBalance {
    value: i8,
}

const BALANCE_SIDE_CENTRE: u8 = 0;
const BALANCE_SIDE_LEFT: u8 = 1;
const BALANCE_SIDE_RIGHT: u8 = 2;

impl ChannelBalance {
    /// Wire pair `[side, magnitude]`.
    pub fn payload(self) -> [u8; 2] {
        match self.value {
            0 => [BALANCE_SIDE_CENTRE, 0],
            v if v < 0 => [BALANCE_SIDE_LEFT, v.unsigned_abs()],
            v => [BALANCE_SIDE_RIGHT, v as u8],
        }
    }

    /// Decode `[side, magnitude]`. An unknown side decodes to centre.
    pub fn from_payload(side: u8, magnitude: u8) -> Self {
        let magnitude = magnitude.min(Self::MAX as u8) as i8;
        match side {
            BALANCE_SIDE_CENTRE => Self::default(),
            BALANCE_SIDE_LEFT => ChannelBalance { value: -magnitude },
            BALANCE_SIDE_RIGHT => ChannelBalance { value: magnitude },
            other => {
                log::warn!("unknown balance side 0x{other:02X}, assuming centre");
                Self::default()
            }
        }
    }
}

impl fmt::Display for ChannelBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            0 => write!(f, "centre"),
            v if v < 0 => write!(f, "L{}", v.unsigned_abs()),
            v => write!(f, "R{v}"),
        }
    }
}

impl RangedFeature for ChannelBalance {
    type Value = i8;

    const MIN: i8 = -12;
    const MAX: i8 = 12;
    const STEP: i8 = 1;

    fn from_display_value(value: i8) -> Self {
        ChannelBalance {
            value: clamp(value, Self::MIN, Self::MAX),
        }
    }

    fn display_value(self) -> i8 {
        self.value
    }
}

/// KA5 display brightness level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayBrightness {
    level: u8,
}

impl Default for DisplayBrightness {
    fn default() -> Self {
        DisplayBrightness { level: 3 }
    }
}

impl DisplayBrightness {
    pub fn payload(self) -> u8 {
        self.level
    }

    pub fn from_payload(raw: u8) -> Self {
        Self::from_display_value(raw)
    }
}

impl RangedFeature for DisplayBrightness {
    type Value = u8;

    const MIN: u8 = 1;
    const MAX: u8 = 5;
    const STEP: u8 = 1;

    fn from_display_value(value: u8) -> Self {
        DisplayBrightness {
            level: clamp(value, Self::MIN, Self::MAX),
        }
    }

    fn display_value(self) -> u8 {
        self.level
    }
}

/// KA5 display timeout in seconds (0 = always on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTimeout {
    seconds: u8,
}

impl Default for DisplayTimeout {
    fn default() -> Self {
        DisplayTimeout { seconds: 30 }
    }
}

impl DisplayTimeout {
    pub fn payload(self) -> u8 {
        self.seconds
    }

    pub fn from_payload(raw: u8) -> Self {
        Self::from_display_value(raw)
    }
}

impl RangedFeature for DisplayTimeout {
    type Value = u8;

    const MIN: u8 = 0;
    const MAX: u8 = 60;
    const STEP: u8 = 5;

    /// Clamps, then rounds to the nearest multiple of [`Self::STEP`].
    fn from_display_value(value: u8) -> Self {
        let clamped = clamp(value, Self::MIN, Self::MAX);
        DisplayTimeout {
            seconds: (clamped + Self::STEP / 2) / Self::STEP * Self::STEP,
        }
    }

    fn display_value(self) -> u8 {
        self.seconds
    }
}

// ── KA13 volume ──

pub const KA13_VOLUME_MAX: u8 = 60;

/// First level served by the high volume range.
const KA13_HIGH_RANGE_BASE: u8 = 31;

/// Sub-range that must be selected before a KA13 volume value is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VolumeRange {
    Low = 0,
    High = 1,
}

impl VolumeRange {
    fn base(self) -> u8 {
        match self {
            VolumeRange::Low => 0,
            VolumeRange::High => KA13_HIGH_RANGE_BASE,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// KA13 volume level, 0..=60.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ka13VolumeLevel {
    level: u8,
}

impl Default for Ka13VolumeLevel {
    fn default() -> Self {
        Ka13VolumeLevel { level: 30 }
    }
}

impl Ka13VolumeLevel {
    pub fn range(self) -> VolumeRange {
        if self.level >= KA13_HIGH_RANGE_BASE {
            VolumeRange::High
        } else {
            VolumeRange::Low
        }
    }

    /// Value sent after the range selection.
    pub fn offset(self) -> u8 {
        self.level - self.range().base()
    }

    /// Decode a `(range, offset)` response. An unknown range decodes to the default level.
    pub fn from_range_offset(range_id: u8, offset: u8) -> Self {
        let range = match range_id {
            0 => VolumeRange::Low,
            1 => VolumeRange::High,
            other => {
                log::warn!("unknown KA13 volume range 0x{other:02X}, assuming default level");
                return Self::default();
            }
        };
        Self::from_display_value(range.base().saturating_add(offset))
    }

    pub fn percent(self) -> u8 {
        ((self.level as u32 * 100 + KA13_VOLUME_MAX as u32 / 2) / KA13_VOLUME_MAX as u32) as u8
    }

    pub fn up(self) -> Self {
        Self::from_display_value(self.level.saturating_add(1))
    }

    pub fn down(self) -> Self {
        Self::from_display_value(self.level.saturating_sub(1))
    }
}

impl RangedFeature for Ka13VolumeLevel {
    type Value = u8;

    const MIN: u8 = 0;
    const MAX: u8 = KA13_VOLUME_MAX;
    const STEP: u8 = 1;

    fn from_display_value(value: u8) -> Self {
        Ka13VolumeLevel {
            level: clamp(value, Self::MIN, Self::MAX),
        }
    }

    fn display_value(self) -> u8 {
        self.level
    }
}

// ── KA5 volume ──

/// KA5 volume level; its range depends on the active [`VolumeMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ka5VolumeLevel {
    level: u8,
    mode: VolumeMode,
}

impl Default for Ka5VolumeLevel {
    fn default() -> Self {
        Ka5VolumeLevel {
            level: 30,
            mode: VolumeMode::default(),
        }
    }
}

impl Ka5VolumeLevel {
    /// Build from a raw level, clamped to the mode's maximum.
    pub fn new(level: u8, mode: VolumeMode) -> Self {
        Ka5VolumeLevel {
            level: level.min(mode.max_level()),
            mode,
        }
    }

    pub fn level(self) -> u8 {
        self.level
    }

    pub fn mode(self) -> VolumeMode {
        self.mode
    }

    pub fn payload(self) -> u8 {
        self.level
    }

    /// The same loudness expressed in another mode's scale (linear).
    pub fn with_mode(self, mode: VolumeMode) -> Self {
        if mode == self.mode {
            return self;
        }
        let old_max = self.mode.max_level() as u32;
        let new_max = mode.max_level() as u32;
        let level = (self.level as u32 * new_max + old_max / 2) / old_max;
        Self::new(level as u8, mode)
    }

    pub fn up(self) -> Self {
        Self::new(self.level.saturating_add(1), self.mode)
    }

    pub fn down(self) -> Self {
        Self::new(self.level.saturating_sub(1), self.mode)
    }
}

impl fmt::Display for Ka5VolumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.level, self.mode.max_level())
    }
}
