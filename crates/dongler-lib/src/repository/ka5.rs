use std::sync::Arc;

use super::Channel;
use crate::commands::{Command, Ka5Commands};
use crate::device::{Result, UsbHost};
use crate::dongle::{FiioKa5, Ka5Features, Ka5Setting};
use crate::feature::WireFeature;
use crate::feature::fiio::{
    ChannelBalance, DacMode, DisplayBrightness, DisplayInvert, DisplayTimeout, Filter, Gain,
    HidMode, Ka5VolumeLevel, VolumeMode,
};
use crate::transfer::{LinkSession, Timing};

/// FiiO KA5 repository.
///
/// The volume level is only meaningful together with the volume mode, so the
/// mode is always read before the level, and a mode change is followed by the
/// rescaled level in the same locked section.
pub struct Ka5Repository {
    commands: &'static Ka5Commands,
    channel: Channel,
}

impl Ka5Repository {
    pub fn new(host: Arc<dyn UsbHost>, commands: &'static Ka5Commands, timing: Timing) -> Self {
        Ka5Repository {
            commands,
            channel: Channel::new(host, timing),
        }
    }

    fn read(&self, session: &mut LinkSession, command: &Command) -> Result<Vec<u8>> {
        let mut buf = self.commands.frame.request(command);
        session.write_and_read(&mut buf)?;
        Ok(buf)
    }

    fn read_value(&self, session: &mut LinkSession, command: &Command) -> Result<u8> {
        Ok(self.commands.frame.value(&self.read(session, command)?))
    }

    pub fn get_current_state(&self, dongle: &FiioKa5) -> Result<FiioKa5> {
        let c = self.commands;
        let features = self.channel.exchange(dongle.model(), |s| {
            let filter = self.read_value(s, &c.get_filter)?;
            let gain = self.read_value(s, &c.get_gain)?;
            let dac_mode = self.read_value(s, &c.get_dac_mode)?;
            let hid_mode = self.read_value(s, &c.get_hid_mode)?;
            let (side, magnitude) = c.frame.value_pair(&self.read(s, &c.get_channel_balance)?);
            let brightness = self.read_value(s, &c.get_display_brightness)?;
            let timeout = self.read_value(s, &c.get_display_timeout)?;
            let invert = self.read_value(s, &c.get_display_invert)?;
            let mode = VolumeMode::from_wire_or_default(self.read_value(s, &c.get_volume_mode)?);
            let level = self.read_value(s, &c.get_volume)?;
            if level > mode.max_level() {
                log::warn!(
                    "volume {level} exceeds mode {} maximum, clamping",
                    mode.name()
                );
            }
            Ok(Ka5Features {
                filter: Filter::from_wire_or_default(filter),
                gain: Gain::from_wire_or_default(gain),
                dac_mode: DacMode::from_wire_or_default(dac_mode),
                hid_mode: HidMode::from_wire_or_default(hid_mode),
                channel_balance: ChannelBalance::from_payload(side, magnitude),
                display_brightness: DisplayBrightness::from_payload(brightness),
                display_timeout: DisplayTimeout::from_payload(timeout),
                display_invert: DisplayInvert::from_wire_or_default(invert),
                volume_level: Ka5VolumeLevel::new(level, mode),
            })
        })?;
        Ok(dongle.with_features(features))
    }

    pub fn set_filter(&self, dongle: &FiioKa5, filter: Filter) -> Result<FiioKa5> {
        self.apply(dongle, Ka5Setting::Filter(filter))
    }

    pub fn set_gain(&self, dongle: &FiioKa5, gain: Gain) -> Result<FiioKa5> {
        self.apply(dongle, Ka5Setting::Gain(gain))
    }

    pub fn set_dac_mode(&self, dongle: &FiioKa5, mode: DacMode) -> Result<FiioKa5> {
        self.apply(dongle, Ka5Setting::DacMode(mode))
    }

    pub fn set_hid_mode(&self, dongle: &FiioKa5, mode: HidMode) -> Result<FiioKa5> {
        self.apply(dongle, Ka5Setting::HidMode(mode))
    }

    pub fn set_channel_balance(
        &self,
        dongle: &FiioKa5,
        balance: ChannelBalance,
    ) -> Result<FiioKa5> {
        self.apply(dongle, Ka5Setting::ChannelBalance(balance))
    }

    pub fn set_display_brightness(
        &self,
        dongle: &FiioKa5,
        brightness: DisplayBrightness,
    ) -> Result<FiioKa5> {
        self.apply(dongle, Ka5Setting::DisplayBrightness(brightness))
    }

    pub fn set_display_timeout(
        &self,
        dongle: &FiioKa5,
        timeout: DisplayTimeout,
    ) -> Result<FiioKa5> {
        self.apply(dongle, Ka5Setting::DisplayTimeout(timeout))
    }

    pub fn set_display_invert(&self, dongle: &FiioKa5, invert: DisplayInvert) -> Result<FiioKa5> {
        self.apply(dongle, Ka5Setting::DisplayInvert(invert))
    }

    pub fn set_volume_mode(&self, dongle: &FiioKa5, mode: VolumeMode) -> Result<FiioKa5> {
        self.apply(dongle, Ka5Setting::VolumeMode(mode))
    }

    /// `level` is in the scale of the descriptor's current volume mode.
    pub fn set_volume_level(&self, dongle: &FiioKa5, level: u8) -> Result<FiioKa5> {
        self.apply(dongle, Ka5Setting::VolumeLevel(level))
    }

    pub fn apply(&self, dongle: &FiioKa5, setting: Ka5Setting) -> Result<FiioKa5> {
        let target = dongle.features().apply(setting);
        self.channel.exchange(dongle.model(), |s| match setting {
            Ka5Setting::VolumeMode(_) => {
                self.write_setting(s, setting)?;
                self.write_volume(s, target.volume_level)
            }
            Ka5Setting::VolumeLevel(_) => self.write_volume(s, target.volume_level),
            _ => self.write_setting(s, setting),
        })?;
        Ok(dongle.with_features(target))
    }

    pub fn set_all(&self, dongle: &FiioKa5, target: Ka5Features) -> Result<FiioKa5> {
        self.channel.exchange(dongle.model(), |s| {
            self.write_setting(s, Ka5Setting::Filter(target.filter))?;
            self.write_setting(s, Ka5Setting::Gain(target.gain))?;
            self.write_setting(s, Ka5Setting::DacMode(target.dac_mode))?;
            self.write_setting(s, Ka5Setting::HidMode(target.hid_mode))?;
            self.write_setting(s, Ka5Setting::ChannelBalance(target.channel_balance))?;
            self.write_setting(s, Ka5Setting::DisplayBrightness(target.display_brightness))?;
            self.write_setting(s, Ka5Setting::DisplayTimeout(target.display_timeout))?;
            self.write_setting(s, Ka5Setting::DisplayInvert(target.display_invert))?;
            self.write_setting(s, Ka5Setting::VolumeMode(target.volume_mode()))?;
            self.write_volume(s, target.volume_level)
        })?;
        Ok(dongle.with_features(target))
    }

    fn write(&self, session: &mut LinkSession, command: &Command, value: &[u8]) -> Result<()> {
        log::debug!("{} {}", command.name, crate::protocol::hex(value));
        session.write(&mut self.commands.frame.payload(command, value))
    }

    fn write_volume(&self, session: &mut LinkSession, level: Ka5VolumeLevel) -> Result<()> {
        self.write(session, &self.commands.set_volume, &[level.payload()])
    }

    /// Writes the value carried by `setting` as-is. A bare `VolumeLevel` is
    /// written through [`Self::write_volume`] after clamping.
    fn write_setting(&self, session: &mut LinkSession, setting: Ka5Setting) -> Result<()> {
        let c = self.commands;
        match setting {
            Ka5Setting::Filter(f) => self.write(session, &c.set_filter, &[f.id()]),
            Ka5Setting::Gain(g) => self.write(session, &c.set_gain, &[g.id()]),
            Ka5Setting::DacMode(m) => self.write(session, &c.set_dac_mode, &[m.id()]),
            Ka5Setting::HidMode(m) => self.write(session, &c.set_hid_mode, &[m.id()]),
            Ka5Setting::ChannelBalance(b) => {
                self.write(session, &c.set_channel_balance, &b.payload())
            }
            Ka5Setting::DisplayBrightness(b) => {
                self.write(session, &c.set_display_brightness, &[b.payload()])
            }
            Ka5Setting::DisplayTimeout(t) => {
                self.write(session, &c.set_display_timeout, &[t.payload()])
            }
            Ka5Setting::DisplayInvert(i) => self.write(session, &c.set_display_invert, &[i.id()]),
            Ka5Setting::VolumeMode(m) => self.write(session, &c.set_volume_mode, &[m.id()]),
            Ka5Setting::VolumeLevel(level) => self.write(session, &c.set_volume, &[level]),
        }
    }
}
