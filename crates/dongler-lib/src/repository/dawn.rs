use std::sync::Arc;

use super::Channel;
use crate::commands::{
    DAWN_RESPONSE_FILTER_INDEX, DAWN_RESPONSE_GAIN_INDEX, DAWN_RESPONSE_INDICATOR_INDEX,
    DAWN_RESPONSE_VOLUME_INDEX, DawnCommands,
};
use crate::device::{Result, UsbHost};
use crate::dongle::{DawnFeatures, DawnSetting, MoondropDawn};
use crate::feature::WireFeature;
use crate::feature::moondrop::{Filter, Gain, IndicatorState, VolumeLevel};
use crate::transfer::{LinkSession, Timing};

/// Moondrop Dawn family repository.
pub struct DawnRepository {
    commands: &'static DawnCommands,
    channel: Channel,
}

impl DawnRepository {
    pub fn new(host: Arc<dyn UsbHost>, commands: &'static DawnCommands, timing: Timing) -> Self {
        DawnRepository {
            commands,
            channel: Channel::new(host, timing),
        }
    }

    /// Read filter, gain, indicator and volume.
    pub fn get_current_state(&self, dongle: &MoondropDawn) -> Result<MoondropDawn> {
        let c = self.commands;
        let (any, volume) = self.channel.exchange(dongle.model(), |s| {
            let mut any = c.frame.request(&c.get_any);
            s.write_and_read(&mut any)?;
            let mut volume = c.frame.request(&c.get_volume);
            s.write_and_read(&mut volume)?;
            Ok((any, volume))
        })?;

        Ok(dongle.with_features(DawnFeatures {
            filter: Filter::from_wire_or_default(any[DAWN_RESPONSE_FILTER_INDEX]),
            gain: Gain::from_wire_or_default(any[DAWN_RESPONSE_GAIN_INDEX]),
            indicator_state: IndicatorState::from_wire_or_default(
                any[DAWN_RESPONSE_INDICATOR_INDEX],
            ),
            volume_level: VolumeLevel::from_raw_or_default(volume[DAWN_RESPONSE_VOLUME_INDEX]),
        }))
    }

    pub fn set_filter(&self, dongle: &MoondropDawn, filter: Filter) -> Result<MoondropDawn> {
        self.apply(dongle, DawnSetting::Filter(filter))
    }

    pub fn set_gain(&self, dongle: &MoondropDawn, gain: Gain) -> Result<MoondropDawn> {
        self.apply(dongle, DawnSetting::Gain(gain))
    }

    pub fn set_indicator_state(
        &self,
        dongle: &MoondropDawn,
        state: IndicatorState,
    ) -> Result<MoondropDawn> {
        self.apply(dongle, DawnSetting::IndicatorState(state))
    }

    pub fn set_volume_level(
        &self,
        dongle: &MoondropDawn,
        level: VolumeLevel,
    ) -> Result<MoondropDawn> {
        self.apply(dongle, DawnSetting::VolumeLevel(level))
    }

    /// Write one setting and return the descriptor with it applied.
    pub fn apply(&self, dongle: &MoondropDawn, setting: DawnSetting) -> Result<MoondropDawn> {
        self.channel
            .exchange(dongle.model(), |s| self.write_setting(s, setting))?;
        Ok(dongle.with_features(dongle.features().apply(setting)))
    }

    /// Write every feature of `target` in one locked section.
    pub fn set_all(&self, dongle: &MoondropDawn, target: DawnFeatures) -> Result<MoondropDawn> {
        self.channel.exchange(dongle.model(), |s| {
            self.write_setting(s, DawnSetting::Filter(target.filter))?;
            self.write_setting(s, DawnSetting::Gain(target.gain))?;
            self.write_setting(s, DawnSetting::IndicatorState(target.indicator_state))?;
            self.write_setting(s, DawnSetting::VolumeLevel(target.volume_level))
        })?;
        Ok(dongle.with_features(target))
    }

    fn write_setting(&self, session: &mut LinkSession, setting: DawnSetting) -> Result<()> {
        let c = self.commands;
        let (command, value) = match setting {
            DawnSetting::Filter(f) => (&c.set_filter, f.id()),
            DawnSetting::Gain(g) => (&c.set_gain, g.id()),
            DawnSetting::IndicatorState(i) => (&c.set_indicator_state, i.id()),
            DawnSetting::VolumeLevel(v) => (&c.set_volume, v.raw()),
        };
        log::debug!("{} {value:#04x}", command.name);
        session.write(&mut c.frame.payload(command, &[value]))
    }
}
