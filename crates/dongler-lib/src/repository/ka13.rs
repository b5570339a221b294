use std::sync::Arc;

use super::Channel;
use crate::commands::{Command, Ka13Commands};
use crate::device::{Result, UsbHost};
use crate::dongle::{FiioKa13, Ka13Features, Ka13Setting};
use crate::feature::WireFeature;
use crate::feature::fiio::{Filter, Gain, IndicatorState, Ka13VolumeLevel, SpdifOut};
use crate::transfer::{LinkSession, Timing};

/// FiiO KA13 repository.
pub struct Ka13Repository {
    commands: &'static Ka13Commands,
    channel: Channel,
}

impl Ka13Repository {
    pub fn new(host: Arc<dyn UsbHost>, commands: &'static Ka13Commands, timing: Timing) -> Self {
        Ka13Repository {
            commands,
            channel: Channel::new(host, timing),
        }
    }

    fn read(&self, session: &mut LinkSession, command: &Command) -> Result<Vec<u8>> {
        let mut buf = self.commands.frame.request(command);
        session.write_and_read(&mut buf)?;
        Ok(buf)
    }

    pub fn get_current_state(&self, dongle: &FiioKa13) -> Result<FiioKa13> {
        let c = self.commands;
        let frame = c.frame;
        let features = self.channel.exchange(dongle.model(), |s| {
            let filter = frame.value(&self.read(s, &c.get_filter)?);
            let gain = frame.value(&self.read(s, &c.get_gain)?);
            let indicator = frame.value(&self.read(s, &c.get_indicator_state)?);
            let spdif = frame.value(&self.read(s, &c.get_spdif_out)?);
            let (range, offset) = frame.value_pair(&self.read(s, &c.get_volume)?);
            Ok(Ka13Features {
                filter: Filter::from_wire_or_default(filter),
                gain: Gain::from_wire_or_default(gain),
                indicator_state: IndicatorState::find_by_id_or_default(indicator),
                spdif_out: SpdifOut::from_wire_or_default(spdif),
                volume_level: Ka13VolumeLevel::from_range_offset(range, offset),
            })
        })?;
        Ok(dongle.with_features(features))
    }

    pub fn set_filter(&self, dongle: &FiioKa13, filter: Filter) -> Result<FiioKa13> {
        self.apply(dongle, Ka13Setting::Filter(filter))
    }

    /// High gain is "desktop mode".
    pub fn set_gain(&self, dongle: &FiioKa13, gain: Gain) -> Result<FiioKa13> {
        self.apply(dongle, Ka13Setting::Gain(gain))
    }

    pub fn set_indicator_state(
        &self,
        dongle: &FiioKa13,
        state: IndicatorState,
    ) -> Result<FiioKa13> {
        self.apply(dongle, Ka13Setting::IndicatorState(state))
    }

    pub fn set_spdif_out(&self, dongle: &FiioKa13, spdif: SpdifOut) -> Result<FiioKa13> {
        self.apply(dongle, Ka13Setting::SpdifOut(spdif))
    }

    /// Selects the volume range, then sends the offset within it.
    pub fn set_volume_level(&self, dongle: &FiioKa13, level: Ka13VolumeLevel) -> Result<FiioKa13> {
        self.apply(dongle, Ka13Setting::VolumeLevel(level))
    }

    pub fn apply(&self, dongle: &FiioKa13, setting: Ka13Setting) -> Result<FiioKa13> {
        self.channel
            .exchange(dongle.model(), |s| self.write_setting(s, setting))?;
        Ok(dongle.with_features(dongle.features().apply(setting)))
    }

    pub fn set_all(&self, dongle: &FiioKa13, target: Ka13Features) -> Result<FiioKa13> {
        self.channel.exchange(dongle.model(), |s| {
            self.write_setting(s, Ka13Setting::Filter(target.filter))?;
            self.write_setting(s, Ka13Setting::Gain(target.gain))?;
            self.write_setting(s, Ka13Setting::IndicatorState(target.indicator_state))?;
            self.write_setting(s, Ka13Setting::SpdifOut(target.spdif_out))?;
            self.write_setting(s, Ka13Setting::VolumeLevel(target.volume_level))
        })?;
        Ok(dongle.with_features(target))
    }

    fn write(&self, session: &mut LinkSession, command: &Command, value: u8) -> Result<()> {
        log::debug!("{} {value:#04x}", command.name);
        session.write(&mut self.commands.frame.payload(command, &[value]))
    }

    fn write_setting(&self, session: &mut LinkSession, setting: Ka13Setting) -> Result<()> {
        let c = self.commands;
        match setting {
            Ka13Setting::Filter(f) => self.write(session, &c.set_filter, f.id()),
            Ka13Setting::Gain(g) => self.write(session, &c.set_gain, g.id()),
            Ka13Setting::IndicatorState(i) => self.write(session, &c.set_indicator_state, i.id()),
            Ka13Setting::SpdifOut(o) => self.write(session, &c.set_spdif_out, o.id()),
            Ka13Setting::VolumeLevel(v) => {
                let [select_range, set_volume] = &c.set_volume;
                self.write(session, select_range, v.range().id())?;
                self.write(session, set_volume, v.offset())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::KA13;
    use crate::device::mock::MockHost;
    use crate::dongle::Dongle;
    use crate::feature::RangedFeature;
    use crate::models::detect_model;

    const PREFIX: [u8; 4] = [0xBB, 0x0B, 0x00, 0x00];

    fn response(op: u8, value: &[u8]) -> Vec<u8> {
        let mut r = vec![0u8; 16];
        r[..4].copy_from_slice(&PREFIX);
        r[4] = op;
        r[6..6 + value.len()].copy_from_slice(value);
        r
    }

    fn setup() -> (MockHost, Ka13Repository, FiioKa13) {
        let host = MockHost::with_dongle(0x2972, 0x0081);
        let repo = Ka13Repository::new(Arc::new(host.clone()), &KA13, Timing::immediate());
        let dongle = Dongle::new(detect_model(0x2972, 0x0081).unwrap()).unwrap();
        (host, repo, dongle)
    }

    #[test]
    fn get_current_state_reads_five_values() {
        let (host, repo, dongle) = setup();
        host.add_response(&[0xBB, 0x0B, 0x00, 0x00, 0x11], response(0x11, &[2]));
        host.add_response(&[0xBB, 0x0B, 0x00, 0x00, 0x12], response(0x12, &[1]));
        host.add_response(&[0xBB, 0x0B, 0x00, 0x00, 0x13], response(0x13, &[99]));
        host.add_response(&[0xBB, 0x0B, 0x00, 0x00, 0x14], response(0x14, &[1]));
        host.add_response(&[0xBB, 0x0B, 0x00, 0x00, 0x15], response(0x15, &[1, 9]));

        let f = repo.get_current_state(&dongle).unwrap().features();
        assert_eq!(f.filter, Filter::SlowRollOffLowLatency);
        assert_eq!(f.gain, Gain::High);
        assert_eq!(f.indicator_state, IndicatorState::Enabled);
        assert_eq!(f.spdif_out, SpdifOut::Enabled);
        assert_eq!(f.volume_level.display_value(), 40);
        assert_eq!(host.transfers().len(), 10);
    }

    #[test]
    fn set_volume_selects_range_first() {
        let (host, repo, dongle) = setup();
        let updated = repo
            .set_volume_level(&dongle, Ka13VolumeLevel::from_display_value(45))
            .unwrap();
        assert_eq!(updated.features().volume_level.display_value(), 45);

        let out = host.out_payloads();
        assert_eq!(out.len(), 2);
        assert_eq!(&out[0][4..7], &[0x95, 0x01, 0x01]);
        assert_eq!(&out[1][4..7], &[0x96, 0x01, 14]);
        assert_eq!(host.links_opened(), 1);
    }

    #[test]
    fn low_range_volume() {
        let (host, repo, dongle) = setup();
        repo.set_volume_level(&dongle, Ka13VolumeLevel::from_display_value(12))
            .unwrap();
        let out = host.out_payloads();
        assert_eq!(out[0][6], 0);
        assert_eq!(out[1][6], 12);
    }

    #[test]
    fn failed_range_select_skips_value() {
        let (host, repo, dongle) = setup();
        host.fail_out_transfer(1);
        assert!(
            repo.set_volume_level(&dongle, Ka13VolumeLevel::from_display_value(50))
                .is_err()
        );
        assert!(host.out_payloads().is_empty());
        assert_eq!(host.links_closed(), 1);
    }

    #[test]
    fn set_spdif_payload() {
        let (host, repo, dongle) = setup();
        repo.set_spdif_out(&dongle, SpdifOut::Enabled).unwrap();
        let out = &host.out_payloads()[0];
        assert_eq!(out.len(), 16);
        assert_eq!(&out[..7], &[0xBB, 0x0B, 0x00, 0x00, 0x94, 0x01, 0x01]);
    }

    #[test]
    fn set_all_sends_six_writes() {
        let (host, repo, dongle) = setup();
        let target = Ka13Features {
            gain: Gain::High,
            volume_level: Ka13VolumeLevel::from_display_value(60),
            ..Ka13Features::default()
        };
        repo.set_all(&dongle, target).unwrap();
        let ops: Vec<u8> = host.out_payloads().iter().map(|p| p[4]).collect();
        assert_eq!(ops, vec![0x91, 0x92, 0x93, 0x94, 0x95, 0x96]);
    }
}
