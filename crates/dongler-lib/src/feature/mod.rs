//! Feature values — typed settings with a wire encoding and a display value.
//!
//! Two shapes exist:
//!
//! - [`WireFeature`]: a closed set of variants, each carrying a constant
//!   wire byte (filters, gains, indicator states, ...). Decoding is total:
//!   an unknown byte yields the feature's default variant.
//! - [`RangedFeature`]: a bounded numeric value. Construction from a display
//!   value always clamps into `[MIN, MAX]`.
//!
//! Vendor-specific types live in the submodules.

pub mod e1da;
pub mod fiio;
pub mod moondrop;

/// A feature with a fixed set of variants, each identified by one wire byte.
pub trait WireFeature: Copy + PartialEq + Default + std::fmt::Debug + 'static {
    /// Every variant, in menu order.
    const ALL: &'static [Self];

    /// Wire byte of this variant.
    fn id(self) -> u8;

    /// Stable kebab-case name, accepted back by [`WireFeature::from_name`].
    fn name(self) -> &'static str;

    /// Human-readable label.
    fn label(self) -> &'static str;

    /// Decode a wire byte. `None` for bytes no variant uses.
    fn from_wire(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.id() == id)
    }

    /// Decode a wire byte, falling back to the default variant.
    fn from_wire_or_default(id: u8) -> Self {
        match Self::from_wire(id) {
            Some(v) => v,
            None => {
                log::warn!("unknown wire id 0x{id:02X}, assuming {:?}", Self::default());
                Self::default()
            }
        }
    }

    /// Parse a variant name (case-insensitive, `_` accepted for `-`).
    fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(&wanted))
    }

    /// All variant names, in menu order.
    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|v| v.name()).collect()
    }
}

/// Numeric type a ranged feature is displayed in.
pub trait DisplayNumber: Copy + PartialOrd + std::fmt::Display + Into<f64> {
    /// Convert a finite value already clamped into this type's range.
    fn from_clamped(value: f64) -> Self;
}

impl DisplayNumber for u8 {
    fn from_clamped(value: f64) -> Self {
        value.round() as u8
    }
}

impl DisplayNumber for i8 {
    fn from_clamped(value: f64) -> Self {
        value.round() as i8
    }
}

impl DisplayNumber for f32 {
    fn from_clamped(value: f64) -> Self {
        value as f32
    }
}

/// A bounded numeric feature.
pub trait RangedFeature: Copy + Sized {
    type Value: DisplayNumber;

    const MIN: Self::Value;
    const MAX: Self::Value;
    const STEP: Self::Value;

    /// Build from a display value, clamped into `[MIN, MAX]`.
    fn from_display_value(value: Self::Value) -> Self;

    fn display_value(self) -> Self::Value;
}

/// Clamp `value` into `[min, max]` for any partially ordered type.
pub(crate) fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Parse a decimal number and clamp it into `[min, max]`.
///
/// Out-of-range input of any magnitude is clamped. `None` for text that is
/// not a number, and for NaN and infinities.
pub fn parse_clamped(s: &str, min: f64, max: f64) -> Option<f64> {
    let value = s.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(clamp(value, min, max))
}

/// Parse a ranged feature from its decimal display value (clamped).
pub fn parse_ranged<F: RangedFeature>(s: &str) -> Option<F> {
    parse_clamped(s, F::MIN.into(), F::MAX.into())
        .map(|v| F::from_display_value(F::Value::from_clamped(v)))
}

/// `"min..=max step s"` description of a ranged feature.
pub fn range_hint<F: RangedFeature>() -> String {
    format!("{}..={} (step {})", F::MIN, F::MAX, F::STEP)
}

#[cfg(test)]
mod tests {
    use super::moondrop::{Filter, Gain};
    use super::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(5, 0, 10), 5);
        assert_eq!(clamp(-1, 0, 10), 0);
        assert_eq!(clamp(11, 0, 10), 10);
        assert_eq!(clamp(-130.0f32, -127.5, 0.0), -127.5);
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Filter::from_name("MIN-PHASE-FAST"), Some(Filter::MinPhaseFast));
        assert_eq!(Filter::from_name("min_phase_fast"), Some(Filter::MinPhaseFast));
        assert_eq!(Filter::from_name(" high "), None);
        assert_eq!(Gain::from_name(" high "), Some(Gain::High));
    }

    #[test]
    fn names_follow_all_order() {
        assert_eq!(Gain::names(), vec!["low", "high"]);
    }

    #[test]
    fn from_wire_or_default_falls_back() {
        assert_eq!(Gain::from_wire_or_default(0x01), Gain::High);
        assert_eq!(Gain::from_wire_or_default(0x7F), Gain::Low);
    }

    #[test]
    fn parse_ranged_clamps() {
        use super::moondrop::VolumeLevel;
        let v: VolumeLevel = parse_ranged("75").unwrap();
        assert_eq!(v.display_value(), 60);
        assert!(parse_ranged::<VolumeLevel>("loud").is_none());
    }

    #[test]
    fn parse_ranged_clamps_beyond_storage_type() {
        use super::fiio::ChannelBalance;
        use super::moondrop::VolumeLevel;
        let v: VolumeLevel = parse_ranged("300").unwrap();
        assert_eq!(v.display_value(), 60);
        let v: VolumeLevel = parse_ranged("-5").unwrap();
        assert_eq!(v.display_value(), 0);
        let b: ChannelBalance = parse_ranged("-200").unwrap();
        assert_eq!(b.display_value(), -12);
        let b: ChannelBalance = parse_ranged("1e9").unwrap();
        assert_eq!(b.display_value(), 12);
    }

    #[test]
    fn parse_ranged_rejects_non_finite() {
        use super::e1da::VolumeLevel;
        for text in ["nan", "NaN", "-nan", "inf", "-infinity"] {
            assert!(parse_ranged::<VolumeLevel>(text).is_none(), "{text}");
        }
        let v: VolumeLevel = parse_ranged("-60").unwrap();
        assert_eq!(v.payload(), 120);
    }

    #[test]
    fn range_hint_format() {
        use super::e1da::VolumeLevel;
        assert_eq!(range_hint::<VolumeLevel>(), "-127.5..=0 (step 0.5)");
    }
}
