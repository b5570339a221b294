//! Per-model command tables.
//!
//! Every table is a `static` of literal byte prefixes. A request buffer is
//! built by copying the prefix into a zero-padded buffer of the model's
//! [`Frame`] size and, for set commands, writing the value at the frame's
//! fixed value index. Nothing here is computed from device responses.

use crate::protocol::{
    FIIO_PAYLOAD_SIZE, FIIO_PAYLOAD_VALUE_INDEX, SHORT_PAYLOAD_SIZE, SHORT_PAYLOAD_VALUE_INDEX,
};

/// Buffer geometry shared by all commands of one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub size: usize,
    pub value_index: usize,
}

/// 7-byte frame, value at index 3 (Moondrop Dawn family, E1DA).
pub const SHORT_FRAME: Frame = Frame {
    size: SHORT_PAYLOAD_SIZE,
    value_index: SHORT_PAYLOAD_VALUE_INDEX,
};

/// 16-byte frame, value at index 6 (FiiO).
pub const FIIO_FRAME: Frame = Frame {
    size: FIIO_PAYLOAD_SIZE,
    value_index: FIIO_PAYLOAD_VALUE_INDEX,
};

/// One named command prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub name: &'static str,
    pub bytes: &'static [u8],
}

impl Frame {
    /// Zero-padded buffer holding only the command prefix (get commands).
    pub fn request(&self, command: &Command) -> Vec<u8> {
        let mut buf = vec![0u8; self.size];
        buf[..command.bytes.len()].copy_from_slice(command.bytes);
        buf
    }

    /// Zero-padded buffer with `value` written at the value index (set commands).
    pub fn payload(&self, command: &Command, value: &[u8]) -> Vec<u8> {
        let mut buf = self.request(command);
        buf[self.value_index..self.value_index + value.len()].copy_from_slice(value);
        buf
    }

    /// The value byte of a response buffer.
    pub fn value(&self, response: &[u8]) -> u8 {
        response[self.value_index]
    }

    /// The value byte pair of a response buffer.
    pub fn value_pair(&self, response: &[u8]) -> (u8, u8) {
        (
            response[self.value_index],
            response[self.value_index + 1],
        )
    }
}

// ── Moondrop Dawn family ──

#[derive(Debug)]
pub struct DawnCommands {
    pub frame: Frame,
    /// Filter, gain and indicator in one response.
    pub get_any: Command,
    pub get_volume: Command,
    pub set_filter: Command,
    pub set_gain: Command,
    pub set_volume: Command,
    pub set_indicator_state: Command,
}

/// `getAny` response offsets.
pub const DAWN_RESPONSE_FILTER_INDEX: usize = 3;
pub const DAWN_RESPONSE_GAIN_INDEX: usize = 4;
pub const DAWN_RESPONSE_INDICATOR_INDEX: usize = 5;
/// `getVolume` response offset.
pub const DAWN_RESPONSE_VOLUME_INDEX: usize = 4;

pub static DAWN: DawnCommands = DawnCommands {
    frame: SHORT_FRAME,
    get_any: Command {
        name: "getAny",
        bytes: &[0xC0, 0xA5, 0xA3],
    },
    get_volume: Command {
        name: "getVolume",
        bytes: &[0xC0, 0xA5, 0xA2],
    },
    set_filter: Command {
        name: "setFilter",
        bytes: &[0xC0, 0xA5, 0x01],
    },
    set_gain: Command {
        name: "setGain",
        bytes: &[0xC0, 0xA5, 0x02],
    },
    set_volume: Command {
        name: "setVolume",
        bytes: &[0xC0, 0xA5, 0x04],
    },
    set_indicator_state: Command {
        name: "setIndicatorState",
        bytes: &[0xC0, 0xA5, 0x06],
    },
};

// ── FiiO KA13 ──

#[derive(Debug)]
pub struct Ka13Commands {
    pub frame: Frame,
    pub get_filter: Command,
    pub get_gain: Command,
    pub get_indicator_state: Command,
    pub get_spdif_out: Command,
    /// Response carries the range id at the value index and the offset after it.
    pub get_volume: Command,
    pub set_filter: Command,
    pub set_gain: Command,
    pub set_indicator_state: Command,
    pub set_spdif_out: Command,
    /// Sent in order within one locked section: select range, then set offset.
    pub set_volume: [Command; 2],
}

pub static KA13: Ka13Commands = Ka13Commands {
    frame: FIIO_FRAME,
    get_filter: Command {
        name: "getFilter",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x11, 0x00],
    },
    get_gain: Command {
        name: "getGain",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x12, 0x00],
    },
    get_indicator_state: Command {
        name: "getIndicatorState",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x13, 0x00],
    },
    get_spdif_out: Command {
        name: "getSpdifOut",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x14, 0x00],
    },
    get_volume: Command {
        name: "getVolume",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x15, 0x00],
    },
    set_filter: Command {
        name: "setFilter",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x91, 0x01],
    },
    set_gain: Command {
        name: "setGain",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x92, 0x01],
    },
    set_indicator_state: Command {
        name: "setIndicatorState",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x93, 0x01],
    },
    set_spdif_out: Command {
        name: "setSpdifOut",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x94, 0x01],
    },
    set_volume: [
        Command {
            name: "selectVolumeRange",
            bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x95, 0x01],
        },
        Command {
            name: "setVolume",
            bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x96, 0x01],
        },
    ],
};

// ── FiiO KA5 ──

#[derive(Debug)]
pub struct Ka5Commands {
    pub frame: Frame,
    pub get_filter: Command,
    pub get_gain: Command,
    pub get_dac_mode: Command,
    pub get_hid_mode: Command,
    pub get_channel_balance: Command,
    pub get_display_brightness: Command,
    pub get_display_timeout: Command,
    pub get_display_invert: Command,
    pub get_volume_mode: Command,
    pub get_volume: Command,
    pub set_filter: Command,
    pub set_gain: Command,
    pub set_dac_mode: Command,
    pub set_hid_mode: Command,
    /// Value is the `[side, magnitude]` pair.
    pub set_channel_balance: Command,
    pub set_display_brightness: Command,
    pub set_display_timeout: Command,
    pub set_display_invert: Command,
    pub set_volume_mode: Command,
    pub set_volume: Command,
}

pub static KA5: Ka5Commands = Ka5Commands {
    frame: FIIO_FRAME,
    get_filter: Command {
        name: "getFilter",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x21, 0x00],
    },
    get_gain: Command {
        name: "getGain",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x22, 0x00],
    },
    get_dac_mode: Command {
        name: "getDacMode",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x23, 0x00],
    },
    get_hid_mode: Command {
        name: "getHidMode",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x24, 0x00],
    },
    get_channel_balance: Command {
        name: "getChannelBalance",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x25, 0x00],
    },
    get_display_brightness: Command {
        name: "getDisplayBrightness",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x26, 0x00],
    },
    get_display_timeout: Command {
        name: "getDisplayTimeout",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x27, 0x00],
    },
    get_display_invert: Command {
        name: "getDisplayInvert",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x28, 0x00],
    },
    get_volume_mode: Command {
        name: "getVolumeMode",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x29, 0x00],
    },
    get_volume: Command {
        name: "getVolume",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0x2A, 0x00],
    },
    set_filter: Command {
        name: "setFilter",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0xA1, 0x01],
    },
    set_gain: Command {
        name: "setGain",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0xA2, 0x01],
    },
    set_dac_mode: Command {
        name: "setDacMode",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0xA3, 0x01],
    },
    set_hid_mode: Command {
        name: "setHidMode",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0xA4, 0x01],
    },
    set_channel_balance: Command {
        name: "setChannelBalance",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0xA5, 0x02],
    },
    set_display_brightness: Command {
        name: "setDisplayBrightness",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0xA6, 0x01],
    },
    set_display_timeout: Command {
        name: "setDisplayTimeout",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0xA7, 0x01],
    },
    set_display_invert: Command {
        name: "setDisplayInvert",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0xA8, 0x01],
    },
    set_volume_mode: Command {
        name: "setVolumeMode",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0xA9, 0x01],
    },
    set_volume: Command {
        name: "setVolume",
        bytes: &[0xBB, 0x0B, 0x00, 0x00, 0xAA, 0x01],
    },
};

// ── E1DA #9038SG3 ──

/// Write-only: the firmware exposes no read command.
#[derive(Debug)]
pub struct E1daCommands {
    pub frame: Frame,
    pub set_filter: Command,
    pub set_volume: Command,
    pub set_master_clock_divider: Command,
    pub set_hardware_type: Command,
    pub set_standby: Command,
    pub set_hardware_mute: Command,
    pub set_sample_rate: Command,
}

pub static E1DA: E1daCommands = E1daCommands {
    frame: SHORT_FRAME,
    set_filter: Command {
        name: "setFilter",
        bytes: &[0xC7, 0xA5, 0x01],
    },
    set_volume: Command {
        name: "setVolume",
        bytes: &[0xC7, 0xA5, 0x04],
    },
    set_master_clock_divider: Command {
        name: "setMasterClockDivider",
        bytes: &[0xC7, 0xA5, 0x08],
    },
    set_hardware_type: Command {
        name: "setHardwareType",
        bytes: &[0xC7, 0xA5, 0x09],
    },
    set_standby: Command {
        name: "setStandby",
        bytes: &[0xC7, 0xA5, 0x0A],
    },
    set_hardware_mute: Command {
        name: "setHardwareMute",
        bytes: &[0xC7, 0xA5, 0x0B],
    },
    set_sample_rate: Command {
        name: "setSampleRate",
        bytes: &[0xC7, 0xA5, 0x0C],
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dawn_set_filter_payload() {
        let buf = DAWN.frame.payload(&DAWN.set_filter, &[0x40]);
        assert_eq!(buf, vec![0xC0, 0xA5, 0x01, 0x40, 0, 0, 0]);
    }

    #[test]
    fn dawn_get_request_is_zero_padded() {
        let buf = DAWN.frame.request(&DAWN.get_any);
        assert_eq!(buf, vec![0xC0, 0xA5, 0xA3, 0, 0, 0, 0]);
    }

    #[test]
    fn fiio_value_lands_at_index_6() {
        let buf = KA13.frame.payload(&KA13.set_gain, &[1]);
        assert_eq!(buf.len(), 16);
        assert_eq!(&buf[..7], &[0xBB, 0x0B, 0x00, 0x00, 0x92, 0x01, 0x01]);
        assert!(buf[7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn fiio_pair_payload() {
        let buf = KA5.frame.payload(&KA5.set_channel_balance, &[1, 4]);
        assert_eq!(&buf[4..8], &[0xA5, 0x02, 0x01, 0x04]);
        assert_eq!(KA5.frame.value_pair(&buf), (1, 4));
    }

    #[test]
    fn ka13_volume_sequence_order() {
        assert_eq!(KA13.set_volume[0].bytes[4], 0x95);
        assert_eq!(KA13.set_volume[1].bytes[4], 0x96);
    }

    #[test]
    fn prefixes_fit_their_frame() {
        let dawn = [
            &DAWN.get_any,
            &DAWN.get_volume,
            &DAWN.set_filter,
            &DAWN.set_gain,
            &DAWN.set_volume,
            &DAWN.set_indicator_state,
        ];
        for c in dawn {
            assert!(c.bytes.len() <= DAWN.frame.value_index, "{}", c.name);
        }
        let e1da = [
            &E1DA.set_filter,
            &E1DA.set_volume,
            &E1DA.set_master_clock_divider,
            &E1DA.set_hardware_type,
            &E1DA.set_standby,
            &E1DA.set_hardware_mute,
            &E1DA.set_sample_rate,
        ];
        for c in e1da {
            assert!(c.bytes.len() <= E1DA.frame.value_index, "{}", c.name);
            assert_eq!(&c.bytes[..2], &[0xC7, 0xA5]);
        }
    }

    #[test]
    fn ka5_get_set_ops_pair_up() {
        let pairs = [
            (&KA5.get_filter, &KA5.set_filter),
            (&KA5.get_gain, &KA5.set_gain),
            (&KA5.get_dac_mode, &KA5.set_dac_mode),
            (&KA5.get_hid_mode, &KA5.set_hid_mode),
            (&KA5.get_channel_balance, &KA5.set_channel_balance),
            (&KA5.get_display_brightness, &KA5.set_display_brightness),
            (&KA5.get_display_timeout, &KA5.set_display_timeout),
            (&KA5.get_display_invert, &KA5.set_display_invert),
            (&KA5.get_volume_mode, &KA5.set_volume_mode),
            (&KA5.get_volume, &KA5.set_volume),
        ];
        for (get, set) in pairs {
            assert_eq!(get.bytes[4] | 0x80, set.bytes[4], "{}", set.name);
            assert_eq!(get.bytes[5], 0);
            assert_eq!(&get.bytes[..4], &[0xBB, 0x0B, 0x00, 0x00]);
        }
    }
}
