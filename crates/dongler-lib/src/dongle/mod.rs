//! Device descriptors — a model identity plus its current feature values.
//!
//! [`Dongle<F>`] pairs a `&'static` [`Model`] with a family's feature set
//! `F`. Identity never changes after construction; features are replaced
//! wholesale through [`Dongle::with_features`], so an older descriptor stays
//! a valid snapshot. Descriptors perform no I/O; the repositories do.

pub mod dawn;
pub mod e1da;
pub mod ka13;
pub mod ka5;

use std::fmt;

use crate::error::{DonglerError, Result};
use crate::models::{Family, Model, detect_model};
use crate::profile::Profile;

pub use dawn::{DawnFeatures, DawnSetting};
pub use e1da::{E1daFeatures, E1daSetting};
pub use ka5::{Ka5Features, Ka5Setting};
pub use ka13::{Ka13Features, Ka13Setting};

/// Name given to profiles built by [`Dongle::default_state_as_profile`].
pub const DEFAULT_PROFILE_NAME: &str = "Default";

/// Models with a user-adjustable volume.
pub trait VolumeControl: Sized {
    /// Volume rendered in the model's own scale (percent, dB or `level/max`).
    fn display_volume(&self) -> String;

    /// One step louder, clamped.
    fn volume_up(self) -> Self;

    /// One step quieter, clamped.
    fn volume_down(self) -> Self;
}

/// The feature values of one family.
pub trait FeatureSet: VolumeControl + Copy + Default + PartialEq + fmt::Debug {
    const FAMILY: Family;

    /// Copy this family's fields into `profile`; other fields are left alone.
    fn write_profile(&self, profile: &mut Profile);

    /// Read this family's fields from `profile`; unknown ids decode to defaults.
    fn from_profile(profile: &Profile) -> Self;

    /// `(key, value)` pairs in menu order, using the names `set` accepts.
    fn describe(&self) -> Vec<(&'static str, String)>;
}

/// A model identity with its current features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dongle<F> {
    model: &'static Model,
    features: F,
}

pub type MoondropDawn = Dongle<DawnFeatures>;
pub type FiioKa5 = Dongle<Ka5Features>;
pub type FiioKa13 = Dongle<Ka13Features>;
pub type E1da9038 = Dongle<E1daFeatures>;

impl<F: FeatureSet> Dongle<F> {
    /// A descriptor in the power-on default state. `None` if `model` is not of `F`'s family.
    pub fn new(model: &'static Model) -> Option<Self> {
        (model.family == F::FAMILY).then(|| Self::with_defaults(model))
    }

    fn with_defaults(model: &'static Model) -> Self {
        Dongle {
            model,
            features: F::default(),
        }
    }

    pub fn model(&self) -> &'static Model {
        self.model
    }

    pub fn vendor_id(&self) -> u16 {
        self.model.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.model.product_id
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name
    }

    pub fn features(&self) -> F {
        self.features
    }

    /// Same identity, new features.
    pub fn with_features(&self, features: F) -> Self {
        Dongle {
            model: self.model,
            features,
        }
    }

    pub fn display_volume_level(&self) -> String {
        self.features.display_volume()
    }

    /// Snapshot the current features as an (unsaved) profile.
    pub fn current_state_as_profile(&self, name: &str) -> Profile {
        let mut profile = Profile::new(name, self.vendor_id(), self.product_id());
        self.features.write_profile(&mut profile);
        profile
    }

    /// The power-on defaults as an (unsaved) profile.
    pub fn default_state_as_profile(&self) -> Profile {
        Self::with_defaults(self.model).current_state_as_profile(DEFAULT_PROFILE_NAME)
    }

    /// The descriptor `profile` describes. Fails if it was taken from another model.
    pub fn with_profile(&self, profile: &Profile) -> Result<Self> {
        if !profile.matches(self.vendor_id(), self.product_id()) {
            return Err(DonglerError::Profile(format!(
                "profile \"{}\" is for {:04x}:{:04x}, device is {}",
                profile.name,
                profile.vendor_id,
                profile.product_id,
                self.model.usb_id()
            )));
        }
        Ok(self.with_features(F::from_profile(profile)))
    }
}

/// Any supported dongle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbDongle {
    MoondropDawn(MoondropDawn),
    FiioKa5(FiioKa5),
    FiioKa13(FiioKa13),
    E1da9038(E1da9038),
}

/// Evaluate `$body` with `$d` bound to the inner descriptor, whatever the variant.
macro_rules! each_dongle {
    ($dongle:expr, $d:ident => $body:expr) => {
        match $dongle {
            UsbDongle::MoondropDawn($d) => $body,
            UsbDongle::FiioKa5($d) => $body,
            UsbDongle::FiioKa13($d) => $body,
            UsbDongle::E1da9038($d) => $body,
        }
    };
}

/// Like [`each_dongle`], re-wrapping the resulting descriptor in its variant.
macro_rules! map_dongle {
    ($dongle:expr, $d:ident => $body:expr) => {
        match $dongle {
            UsbDongle::MoondropDawn($d) => UsbDongle::MoondropDawn($body),
            UsbDongle::FiioKa5($d) => UsbDongle::FiioKa5($body),
            UsbDongle::FiioKa13($d) => UsbDongle::FiioKa13($body),
            UsbDongle::E1da9038($d) => UsbDongle::E1da9038($body),
        }
    };
}

impl UsbDongle {
    /// Default-state descriptor for a catalogue model.
    pub fn from_model(model: &'static Model) -> Self {
        match model.family {
            Family::MoondropDawn => UsbDongle::MoondropDawn(Dongle::with_defaults(model)),
            Family::FiioKa5 => UsbDongle::FiioKa5(Dongle::with_defaults(model)),
            Family::FiioKa13 => UsbDongle::FiioKa13(Dongle::with_defaults(model)),
            Family::E1da9038 => UsbDongle::E1da9038(Dongle::with_defaults(model)),
        }
    }

    /// Default-state descriptor for the model with these USB ids.
    pub fn detect(vendor_id: u16, product_id: u16) -> Option<Self> {
        detect_model(vendor_id, product_id).map(Self::from_model)
    }

    pub fn model(&self) -> &'static Model {
        each_dongle!(self, d => d.model())
    }

    pub fn family(&self) -> Family {
        self.model().family
    }

    pub fn vendor_id(&self) -> u16 {
        self.model().vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.model().product_id
    }

    pub fn model_name(&self) -> &'static str {
        self.model().name
    }

    pub fn display_volume_level(&self) -> String {
        each_dongle!(self, d => d.display_volume_level())
    }

    pub fn describe(&self) -> Vec<(&'static str, String)> {
        each_dongle!(self, d => d.features().describe())
    }

    /// The descriptor one volume step up. No I/O.
    pub fn volume_up(&self) -> Self {
        map_dongle!(self, d => d.with_features(d.features().volume_up()))
    }

    /// The descriptor one volume step down. No I/O.
    pub fn volume_down(&self) -> Self {
        map_dongle!(self, d => d.with_features(d.features().volume_down()))
    }

    pub fn current_state_as_profile(&self, name: &str) -> Profile {
        each_dongle!(self, d => d.current_state_as_profile(name))
    }

    pub fn default_state_as_profile(&self) -> Profile {
        each_dongle!(self, d => d.default_state_as_profile())
    }

    pub fn with_profile(&self, profile: &Profile) -> Result<Self> {
        Ok(map_dongle!(self, d => d.with_profile(profile)?))
    }
}

impl fmt::Display for UsbDongle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.model_name(), self.model().usb_id())
    }
}
