use std::sync::Arc;

use super::Channel;
use crate::commands::E1daCommands;
use crate::device::{Result, UsbHost};
use crate::dongle::{E1da9038, E1daFeatures, E1daSetting};
use crate::feature::WireFeature;
use crate::feature::e1da::{
    Filter, HardwareMute, HardwareType, MasterClockDivider, SampleRate, Standby, VolumeLevel,
};
use crate::transfer::{LinkSession, Timing};

/// E1DA #9038SG3 repository. Write-only.
pub struct E1daRepository {
    commands: &'static E1daCommands,
    channel: Channel,
}

impl E1daRepository {
    pub fn new(host: Arc<dyn UsbHost>, commands: &'static E1daCommands, timing: Timing) -> Self {
        E1daRepository {
            commands,
            channel: Channel::new(host, timing),
        }
    }

    /// The firmware offers no read command, so this returns the model's
    /// default state without opening a link.
    pub fn get_current_state(&self, dongle: &E1da9038) -> Result<E1da9038> {
        log::warn!(
            "{} state cannot be read back, reporting defaults",
            dongle.model_name()
        );
        Ok(dongle.with_features(E1daFeatures::default()))
    }

    pub fn set_filter(&self, dongle: &E1da9038, filter: Filter) -> Result<E1da9038> {
        self.apply(dongle, E1daSetting::Filter(filter))
    }

    pub fn set_volume_level(&self, dongle: &E1da9038, level: VolumeLevel) -> Result<E1da9038> {
        self.apply(dongle, E1daSetting::VolumeLevel(level))
    }

    pub fn set_master_clock_divider(
        &self,
        dongle: &E1da9038,
        divider: MasterClockDivider,
    ) -> Result<E1da9038> {
        self.apply(dongle, E1daSetting::MasterClockDivider(divider))
    }

    pub fn set_hardware_type(&self, dongle: &E1da9038, kind: HardwareType) -> Result<E1da9038> {
        self.apply(dongle, E1daSetting::HardwareType(kind))
    }

    pub fn set_sample_rate(&self, dongle: &E1da9038, rate: SampleRate) -> Result<E1da9038> {
        self.apply(dongle, E1daSetting::SampleRate(rate))
    }

    pub fn set_standby(&self, dongle: &E1da9038, standby: Standby) -> Result<E1da9038> {
        self.apply(dongle, E1daSetting::Standby(standby))
    }

    pub fn set_hardware_mute(&self, dongle: &E1da9038, mute: HardwareMute) -> Result<E1da9038> {
        self.apply(dongle, E1daSetting::HardwareMute(mute))
    }

    pub fn apply(&self, dongle: &E1da9038, setting: E1daSetting) -> Result<E1da9038> {
        self.channel
            .exchange(dongle.model(), |s| self.write_setting(s, setting))?;
        Ok(dongle.with_features(dongle.features().apply(setting)))
    }

    /// Sample rate and clock divider go first; volume and mute last.
    pub fn set_all(&self, dongle: &E1da9038, target: E1daFeatures) -> Result<E1da9038> {
        self.channel.exchange(dongle.model(), |s| {
            self.write_setting(s, E1daSetting::SampleRate(target.sample_rate))?;
            self.write_setting(s, E1daSetting::MasterClockDivider(target.master_clock_divider))?;
            self.write_setting(s, E1daSetting::HardwareType(target.hardware_type))?;
            self.write_setting(s, E1daSetting::Filter(target.filter))?;
            self.write_setting(s, E1daSetting::Standby(target.standby))?;
            self.write_setting(s, E1daSetting::VolumeLevel(target.volume_level))?;
            self.write_setting(s, E1daSetting::HardwareMute(target.hardware_mute))
        })?;
        Ok(dongle.with_features(target))
    }

    fn write_setting(&self, session: &mut LinkSession, setting: E1daSetting) -> Result<()> {
        let c = self.commands;
        let (command, value) = match setting {
            E1daSetting::Filter(f) => (&c.set_filter, f.id()),
            E1daSetting::VolumeLevel(v) => (&c.set_volume, v.payload()),
            E1daSetting::MasterClockDivider(d) => (&c.set_master_clock_divider, d.id()),
            E1daSetting::HardwareType(t) => (&c.set_hardware_type, t.id()),
            E1daSetting::SampleRate(r) => (&c.set_sample_rate, r.id()),
            E1daSetting::Standby(s) => (&c.set_standby, s.id()),
            E1daSetting::HardwareMute(m) => (&c.set_hardware_mute, m.id()),
        };
        log::debug!("{} {value:#04x}", command.name);
        session.write(&mut c.frame.payload(command, &[value]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::E1DA;
    use crate::device::mock::MockHost;
    use crate::dongle::Dongle;
    use crate::feature::RangedFeature;
    use crate::models::detect_model;

    fn setup() -> (MockHost, E1daRepository, E1da9038) {
        let host = MockHost::with_dongle(0x262A, 0x9038);
        let repo = E1daRepository::new(Arc::new(host.clone()), &E1DA, Timing::immediate());
        let dongle = Dongle::new(detect_model(0x262A, 0x9038).unwrap()).unwrap();
        (host, repo, dongle)
    }

    #[test]
    fn current_state_is_default_and_never_opens_link() {
        let (host, repo, dongle) = setup();
        let dongle = repo.set_standby(&dongle, Standby::Enabled).unwrap();
        let state = repo.get_current_state(&dongle).unwrap();
        assert_eq!(state.features(), E1daFeatures::default());
        assert_eq!(host.links_opened(), 1);
    }

    #[test]
    fn volume_payload_is_half_db() {
        let (host, repo, dongle) = setup();
        let updated = repo
            .set_volume_level(&dongle, VolumeLevel::from_display_value(-32.5))
            .unwrap();
        assert_eq!(updated.features().volume_level.payload(), 65);
        assert_eq!(host.out_payloads(), vec![vec![0xC7, 0xA5, 0x04, 65, 0, 0, 0]]);
    }

    #[test]
    fn sample_rate_payload() {
        let (host, repo, dongle) = setup();
        repo.set_sample_rate(&dongle, SampleRate::Hz192000).unwrap();
        assert_eq!(host.out_payloads()[0], vec![0xC7, 0xA5, 0x0C, 5, 0, 0, 0]);
    }

    #[test]
    fn set_all_is_one_link_seven_writes() {
        let (host, repo, dongle) = setup();
        let target = E1daFeatures {
            filter: Filter::BrickWall,
            hardware_mute: HardwareMute::Enabled,
            ..E1daFeatures::default()
        };
        let updated = repo.set_all(&dongle, target).unwrap();
        assert_eq!(updated.features(), target);
        let ops: Vec<u8> = host.out_payloads().iter().map(|p| p[2]).collect();
        assert_eq!(ops, vec![0x0C, 0x08, 0x09, 0x01, 0x0A, 0x04, 0x0B]);
        assert_eq!(host.out_payloads()[3][3], 7);
        assert_eq!(host.links_opened(), 1);
    }
}
