//! Model catalogue — the dongles this crate knows how to drive.
//!
//! Each entry ties a USB vendor/product id pair to a display name and a
//! [`Family`]. The family selects the command table, the repository and the
//! feature set; models in one family share all three.

use std::fmt;

use crate::protocol::{
    E1DA_9038SG3_PID, E1DA_VID, FIIO_KA5_PID, FIIO_KA13_PID, FIIO_VID, MOONDROP_DAWN_35_PID,
    MOONDROP_DAWN_44_PID, MOONDROP_DAWN_PRO_PID, MOONDROP_MOONRIVER_2_TI_PID, MOONDROP_VID,
};

/// Protocol family. One repository (and one exchange lock) exists per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    MoondropDawn,
    FiioKa5,
    FiioKa13,
    E1da9038,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::MoondropDawn => "Moondrop Dawn",
            Family::FiioKa5 => "FiiO KA5",
            Family::FiioKa13 => "FiiO KA13",
            Family::E1da9038 => "E1DA #9038",
        };
        f.write_str(name)
    }
}

impl Family {
    /// False for write-only families, whose state reads return defaults.
    pub fn state_readable(self) -> bool {
        !matches!(self, Family::E1da9038)
    }
}

/// A supported dongle model.
#[derive(Debug, PartialEq, Eq)]
pub struct Model {
    pub name: &'static str,
    pub vendor_id: u16,
    pub product_id: u16,
    pub family: Family,
}

impl Model {
    /// `"vvvv:pppp"` in lowercase hex.
    pub fn usb_id(&self) -> String {
        format!("{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

pub static MODELS: [Model; 7] = [
    Model {
        name: "Moondrop Dawn 3.5mm",
        vendor_id: MOONDROP_VID,
        product_id: MOONDROP_DAWN_35_PID,
        family: Family::MoondropDawn,
    },
    Model {
        name: "Moondrop Dawn 4.4mm",
        vendor_id: MOONDROP_VID,
        product_id: MOONDROP_DAWN_44_PID,
        family: Family::MoondropDawn,
    },
    Model {
        name: "Moondrop Dawn Pro",
        vendor_id: MOONDROP_VID,
        product_id: MOONDROP_DAWN_PRO_PID,
        family: Family::MoondropDawn,
    },
    Model {
        name: "Moondrop Moonriver 2 Ti",
        vendor_id: MOONDROP_VID,
        product_id: MOONDROP_MOONRIVER_2_TI_PID,
        family: Family::MoondropDawn,
    },
    Model {
        name: "FiiO KA5",
        vendor_id: FIIO_VID,
        product_id: FIIO_KA5_PID,
        family: Family::FiioKa5,
    },
    Model {
        name: "FiiO KA13",
        vendor_id: FIIO_VID,
        product_id: FIIO_KA13_PID,
        family: Family::FiioKa13,
    },
    Model {
        name: "E1DA #9038SG3",
        vendor_id: E1DA_VID,
        product_id: E1DA_9038SG3_PID,
        family: Family::E1da9038,
    },
];

/// Look up a model by its USB ids. `None` for anything not in [`MODELS`].
pub fn detect_model(vendor_id: u16, product_id: u16) -> Option<&'static Model> {
    MODELS
        .iter()
        .find(|m| m.vendor_id == vendor_id && m.product_id == product_id)
}

/// Parse a `"vvvv:pppp"` hex id pair (an optional `0x` prefix on each half is accepted).
pub fn parse_usb_id(s: &str) -> Option<(u16, u16)> {
    let (vendor, product) = s.trim().split_once(':')?;
    let parse = |part: &str| {
        let part = part.trim();
        let digits = part
            .strip_prefix("0x")
            .or_else(|| part.strip_prefix("0X"))
            .unwrap_or(part);
        if digits.is_empty() || digits.len() > 4 {
            return None;
        }
        u16::from_str_radix(digits, 16).ok()
    };
    Some((parse(vendor)?, parse(product)?))
}
