//! Controller — resolves attached dongles and routes every operation to the
//! repository of the dongle's family.
//!
//! One repository per family means one exchange lock per family: two
//! threads talking to a Dawn and a KA13 proceed in parallel, two threads
//! talking to the same family take turns.

use std::sync::Arc;

use crate::commands::{DAWN, E1DA, KA5, KA13};
use crate::config::Config;
use crate::device::{AttachedDevice, DeviceError, UsbHost};
use crate::dongle::{DawnSetting, E1daSetting, Ka5Setting, Ka13Setting, UsbDongle};
use crate::error::{DonglerError, Result};
use crate::profile::Profile;
use crate::repository::{DawnRepository, E1daRepository, Ka5Repository, Ka13Repository};
use crate::setting::Setting;
use crate::transfer::Timing;

pub struct DongleController {
    host: Arc<dyn UsbHost>,
    preferred: Option<(u16, u16)>,
    dawn: DawnRepository,
    ka5: Ka5Repository,
    ka13: Ka13Repository,
    e1da: E1daRepository,
}

impl DongleController {
    pub fn new(host: Arc<dyn UsbHost>, timing: Timing) -> Self {
        DongleController {
            dawn: DawnRepository::new(Arc::clone(&host), &DAWN, timing),
            ka5: Ka5Repository::new(Arc::clone(&host), &KA5, timing),
            ka13: Ka13Repository::new(Arc::clone(&host), &KA13, timing),
            e1da: E1daRepository::new(Arc::clone(&host), &E1DA, timing),
            host,
            preferred: None,
        }
    }

    /// Timing and preferred device taken from `config`.
    pub fn from_config(host: Arc<dyn UsbHost>, config: &Config) -> Self {
        Self::new(host, config.timing()).with_preferred_device(config.preferred_device_ids())
    }

    pub fn with_preferred_device(mut self, ids: Option<(u16, u16)>) -> Self {
        self.preferred = ids;
        self
    }

    /// Attached devices that match a catalogue model, preferred device first.
    pub fn attached_dongles(&self) -> Result<Vec<(AttachedDevice, UsbDongle)>> {
        let mut found: Vec<(AttachedDevice, UsbDongle)> = self
            .host
            .attached()?
            .into_iter()
            .filter_map(|dev| {
                let dongle = UsbDongle::detect(dev.vendor_id, dev.product_id)?;
                Some((dev, dongle))
            })
            .collect();
        if let Some((vid, pid)) = self.preferred {
            // Stable sort keeps enumeration order among the rest.
            found.sort_by_key(|(dev, _)| !(dev.vendor_id == vid && dev.product_id == pid));
        }
        Ok(found)
    }

    /// The first accessible recognised dongle, in its default state.
    ///
    /// Fails with `UnsupportedDongle` when nothing recognised is attached and
    /// with `PermissionDenied` when every recognised device is inaccessible.
    pub fn first_attached(&self) -> Result<UsbDongle> {
        let found = self.attached_dongles()?;
        if let Some((dev, dongle)) = found.iter().find(|(dev, _)| dev.permission_granted) {
            log::info!("using {dongle} at {}", dev.path);
            return Ok(*dongle);
        }
        match found.first() {
            Some((dev, _)) => Err(DeviceError::PermissionDenied(dev.path.clone()).into()),
            None => Err(DeviceError::UnsupportedDongle.into()),
        }
    }

    /// Read the dongle's state. The E1DA reports defaults.
    pub fn current_state(&self, dongle: &UsbDongle) -> Result<UsbDongle> {
        Ok(match dongle {
            UsbDongle::MoondropDawn(d) => UsbDongle::MoondropDawn(self.dawn.get_current_state(d)?),
            UsbDongle::FiioKa5(d) => UsbDongle::FiioKa5(self.ka5.get_current_state(d)?),
            UsbDongle::FiioKa13(d) => UsbDongle::FiioKa13(self.ka13.get_current_state(d)?),
            UsbDongle::E1da9038(d) => UsbDongle::E1da9038(self.e1da.get_current_state(d)?),
        })
    }

    /// Write one setting and return the updated descriptor.
    pub fn apply(&self, dongle: &UsbDongle, setting: Setting) -> Result<UsbDongle> {
        Ok(match (dongle, setting) {
            (UsbDongle::MoondropDawn(d), Setting::Dawn(s)) => {
                UsbDongle::MoondropDawn(self.dawn.apply(d, s)?)
            }
            (UsbDongle::FiioKa5(d), Setting::Ka5(s)) => UsbDongle::FiioKa5(self.ka5.apply(d, s)?),
            (UsbDongle::FiioKa13(d), Setting::Ka13(s)) => {
                UsbDongle::FiioKa13(self.ka13.apply(d, s)?)
            }
            (UsbDongle::E1da9038(d), Setting::E1da(s)) => {
                UsbDongle::E1da9038(self.e1da.apply(d, s)?)
            }
            _ => {
                return Err(DonglerError::Setting(format!(
                    "{} setting does not apply to {}",
                    setting.family(),
                    dongle.model_name()
                )));
            }
        })
    }

    /// Write every feature of `target` to `dongle` in one exchange.
    pub fn set_all(&self, dongle: &UsbDongle, target: &UsbDongle) -> Result<UsbDongle> {
        if dongle.model() != target.model() {
            return Err(DonglerError::Setting(format!(
                "cannot write {} state to {}",
                target.model_name(),
                dongle.model_name()
            )));
        }
        Ok(match (dongle, target) {
            (UsbDongle::MoondropDawn(d), UsbDongle::MoondropDawn(t)) => {
                UsbDongle::MoondropDawn(self.dawn.set_all(d, t.features())?)
            }
            (UsbDongle::FiioKa5(d), UsbDongle::FiioKa5(t)) => {
                UsbDongle::FiioKa5(self.ka5.set_all(d, t.features())?)
            }
            (UsbDongle::FiioKa13(d), UsbDongle::FiioKa13(t)) => {
                UsbDongle::FiioKa13(self.ka13.set_all(d, t.features())?)
            }
            (UsbDongle::E1da9038(d), UsbDongle::E1da9038(t)) => {
                UsbDongle::E1da9038(self.e1da.set_all(d, t.features())?)
            }
            // Same model implies same variant.
            _ => return Err(DeviceError::UnsupportedDongle.into()),
        })
    }

    /// Write a stored profile. Rejects profiles recorded for another model.
    pub fn apply_profile(&self, dongle: &UsbDongle, profile: &Profile) -> Result<UsbDongle> {
        let target = dongle.with_profile(profile)?;
        log::info!("applying profile \"{}\" to {dongle}", profile.name);
        self.set_all(dongle, &target)
    }

    /// One step louder than `dongle`'s volume. Fails for write-only families.
    pub fn volume_up(&self, dongle: &UsbDongle) -> Result<UsbDongle> {
        require_readable(dongle, "relative volume step")?;
        self.apply(dongle, volume_setting(&dongle.volume_up()))
    }

    /// One step quieter than `dongle`'s volume. Fails for write-only families.
    pub fn volume_down(&self, dongle: &UsbDongle) -> Result<UsbDongle> {
        require_readable(dongle, "relative volume step")?;
        self.apply(dongle, volume_setting(&dongle.volume_down()))
    }

    /// Read the dongle and record its state as a profile named `name`.
    pub fn snapshot_profile(&self, dongle: &UsbDongle, name: &str) -> Result<Profile> {
        require_readable(dongle, "saving the current state")?;
        Ok(self.current_state(dongle)?.current_state_as_profile(name))
    }
}

/// Operations relative to the current state need a family that can be read.
fn require_readable(dongle: &UsbDongle, op: &str) -> Result<()> {
    if dongle.family().state_readable() {
        return Ok(());
    }
    Err(DeviceError::Unavailable(format!(
        "{op} on {dongle}: its state cannot be read back"
    ))
    .into())
}

/// The setting that moves a dongle to `target`'s volume.
fn volume_setting(target: &UsbDongle) -> Setting {
    match target {
        UsbDongle::MoondropDawn(d) => {
            Setting::Dawn(DawnSetting::VolumeLevel(d.features().volume_level))
        }
        UsbDongle::FiioKa5(d) => {
            Setting::Ka5(Ka5Setting::VolumeLevel(d.features().volume_level.level()))
        }
        UsbDongle::FiioKa13(d) => {
            Setting::Ka13(Ka13Setting::VolumeLevel(d.features().volume_level))
        }
        UsbDongle::E1da9038(d) => {
            Setting::E1da(E1daSetting::VolumeLevel(d.features().volume_level))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::MockHost;
    use crate::feature::RangedFeature;
    use crate::models::Family;

    fn controller(host: &MockHost) -> DongleController {
        DongleController::new(Arc::new(host.clone()), Timing::immediate())
    }

    #[test]
    fn nothing_attached_is_unsupported() {
        let host = MockHost::new();
        host.attach(0x1234, 0x5678, true);
        let err = controller(&host).first_attached().unwrap_err();
        assert!(matches!(
            err,
            DonglerError::Device(DeviceError::UnsupportedDongle)
        ));
    }

    #[test]
    fn inaccessible_dongle_is_permission_denied() {
        let host = MockHost::new();
        host.attach(0x2FC6, 0xF06A, false);
        let err = controller(&host).first_attached().unwrap_err();
        assert!(matches!(
            err,
            DonglerError::Device(DeviceError::PermissionDenied(_))
        ));
    }

    #[test]
    fn skips_inaccessible_and_unknown_devices() {
        let host = MockHost::new();
        host.attach(0x1234, 0x5678, true);
        host.attach(0x2FC6, 0xF06A, false);
        host.attach(0x2972, 0x0081, true);
        let dongle = controller(&host).first_attached().unwrap();
        assert_eq!(dongle.family(), Family::FiioKa13);
    }

    #[test]
    fn preferred_device_wins() {
        let host = MockHost::new();
        host.attach(0x2FC6, 0xF06A, true);
        host.attach(0x262A, 0x9038, true);
        let c = controller(&host);
        assert_eq!(c.first_attached().unwrap().family(), Family::MoondropDawn);

        let c = c.with_preferred_device(Some((0x262A, 0x9038)));
        assert_eq!(c.first_attached().unwrap().family(), Family::E1da9038);
        assert_eq!(c.attached_dongles().unwrap().len(), 2);
    }

    #[test]
    fn setting_for_other_family_is_rejected() {
        let host = MockHost::with_dongle(0x2FC6, 0xF06A);
        let c = controller(&host);
        let dawn = c.first_attached().unwrap();
        let ka13 = UsbDongle::detect(0x2972, 0x0081).unwrap();
        let setting = Setting::parse(&ka13, "spdif_out", "enabled").unwrap();
        let err = c.apply(&dawn, setting).unwrap_err();
        assert!(matches!(err, DonglerError::Setting(_)));
        assert_eq!(host.links_opened(), 0);
    }

    #[test]
    fn volume_up_writes_one_step() {
        let host = MockHost::with_dongle(0x2972, 0x0081);
        let c = controller(&host);
        let dongle = c.first_attached().unwrap();
        let updated = c.volume_up(&dongle).unwrap();
        assert_eq!(updated.display_volume_level(), "52%");
        let out = host.out_payloads();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1][6], 0);
    }

    #[test]
    fn write_only_dongle_refuses_relative_volume() {
        let host = MockHost::with_dongle(0x262A, 0x9038);
        let c = controller(&host);
        let dongle = c.first_attached().unwrap();
        c.apply(&dongle, Setting::parse(&dongle, "volume_level", "-60").unwrap())
            .unwrap();
        assert_eq!(host.out_payloads().len(), 1);

        let read_back = c.current_state(&dongle).unwrap();
        for result in [c.volume_up(&read_back), c.volume_down(&read_back)] {
            assert!(matches!(
                result,
                Err(DonglerError::Device(DeviceError::Unavailable(_)))
            ));
        }
        assert_eq!(host.out_payloads().len(), 1);
        assert_eq!(host.links_opened(), 1);
    }

    #[test]
    fn snapshot_profile_reads_state() {
        let host = MockHost::with_dongle(0x2FC6, 0xF06A);
        host.add_response(&[0xC0, 0xA5, 0xA3], vec![0xC0, 0xA5, 0xA3, 0x10, 0x01, 0x00, 0]);
        host.add_response(&[0xC0, 0xA5, 0xA2], vec![0xC0, 0xA5, 0xA2, 0, 0x10, 0, 0]);
        let c = controller(&host);
        let dongle = c.first_attached().unwrap();
        let profile = c.snapshot_profile(&dongle, "desk").unwrap();
        assert_eq!(profile.name, "desk");
        assert_eq!(profile.vendor_id, 0x2FC6);
        assert_eq!(host.links_opened(), 1);
    }

    #[test]
    fn snapshot_profile_refused_for_write_only_dongle() {
        let host = MockHost::with_dongle(0x262A, 0x9038);
        let c = controller(&host);
        let dongle = c.first_attached().unwrap();
        let err = c.snapshot_profile(&dongle, "desk").unwrap_err();
        assert!(err.to_string().contains("cannot be read back"));
    }

    #[test]
    fn apply_profile_for_other_model_fails() {
        let host = MockHost::with_dongle(0x2FC6, 0xF06A);
        let c = controller(&host);
        let dongle = c.first_attached().unwrap();
        let profile = Profile::new("desk", 0x2FC6, 0xF06B);
        let err = c.apply_profile(&dongle, &profile).unwrap_err();
        assert!(matches!(err, DonglerError::Profile(_)));
        assert!(host.out_payloads().is_empty());
    }

    #[test]
    fn apply_profile_writes_full_state() {
        let host = MockHost::with_dongle(0x262A, 0x9038);
        let c = controller(&host);
        let dongle = c.first_attached().unwrap();
        let mut profile = dongle.default_state_as_profile();
        profile.volume_level = 10;
        let updated = c.apply_profile(&dongle, &profile).unwrap();
        let UsbDongle::E1da9038(e) = updated else {
            panic!("wrong variant");
        };
        assert_eq!(e.features().volume_level.display_value(), -5.0);
        assert_eq!(host.out_payloads().len(), 7);
    }
}
