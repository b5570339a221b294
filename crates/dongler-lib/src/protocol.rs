//! Wire constants shared by every supported dongle.
//!
//! All vendor commands travel over the default control endpoint as a
//! write (OUT) followed, for reads, by a read (IN) of the same length.
//! The request fields below are identical across vendors; only the
//! payload layout differs per model.

// ── Control request fields ──

/// `bmRequestType` for vendor writes: host-to-device, vendor, recipient "other".
pub const REQUEST_TYPE_WRITE: u8 = 0x43;

/// `bmRequestType` for vendor reads: device-to-host, vendor, recipient "other".
pub const REQUEST_TYPE_READ: u8 = 0xC3;

/// `bRequest` for vendor writes.
pub const REQUEST_ID_WRITE: u8 = 0xA0;

/// `bRequest` for vendor reads.
pub const REQUEST_ID_READ: u8 = 0xA1;

/// `wValue` — always zero.
pub const REQUEST_VALUE: u16 = 0;

/// `wIndex` for every vendor command.
pub const REQUEST_INDEX: u16 = 0x09A0;

/// Direction bit of `bmRequestType` (set = device-to-host).
pub const REQUEST_DIRECTION_IN: u8 = 0x80;

// ── Timing ──

/// Default per-transfer timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Default settle delay after each transfer, in milliseconds.
///
/// Firmware needs this to apply a command before it accepts the next one.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

// ── Payload layouts ──

/// Buffer size used by the Moondrop Dawn family and the E1DA #9038SG3.
pub const SHORT_PAYLOAD_SIZE: usize = 7;

/// Index of the settable byte in the 7-byte layout.
pub const SHORT_PAYLOAD_VALUE_INDEX: usize = 3;

/// Buffer size used by FiiO dongles.
pub const FIIO_PAYLOAD_SIZE: usize = 16;

/// Index of the settable byte (or first byte of a pair) in the FiiO frame.
pub const FIIO_PAYLOAD_VALUE_INDEX: usize = 6;

// ── USB identifiers ──

pub const MOONDROP_VID: u16 = 0x2FC6;
pub const MOONDROP_DAWN_35_PID: u16 = 0xF06A;
pub const MOONDROP_DAWN_44_PID: u16 = 0xF06B;
pub const MOONDROP_DAWN_PRO_PID: u16 = 0xF06D;
pub const MOONDROP_MOONRIVER_2_TI_PID: u16 = 0xF07E;

pub const FIIO_VID: u16 = 0x2972;
pub const FIIO_KA5_PID: u16 = 0x0047;
pub const FIIO_KA13_PID: u16 = 0x0081;

pub const E1DA_VID: u16 = 0x262A;
pub const E1DA_9038SG3_PID: u16 = 0x9038;

/// Format a byte slice as space-separated hex for log output.
pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
