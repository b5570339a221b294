//! Device access — link/host traits, nusb backend, and an in-memory mock.
//!
//! A [`UsbHost`] enumerates attached devices and opens a [`UsbLink`] to one
//! of them. The link is the only thing the transfer engine talks to: a
//! single `control_transfer` primitive plus `close`.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

// ── Error type ──

/// Device communication errors.
///
/// String payloads follow the convention **"context: details"** where *context*
/// identifies the operation or step (e.g. `"USB open"`, `"control transfer"`)
/// and *details* describes what went wrong.
#[derive(Debug)]
pub enum DeviceError {
    /// No attached device matches a supported vendor/product id.
    UnsupportedDongle,
    /// The device is attached but the host has not granted access to it.
    PermissionDenied(String),
    /// Opening the connection handle failed.
    OpenFailed(String),
    /// The USB stack reported an error for a control transfer.
    TransferFailed(String),
    /// A control transfer moved a different number of bytes than requested.
    Protocol { expected: usize, actual: usize },
    /// The model's command table has no command for the requested operation.
    Unavailable(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::UnsupportedDongle => write!(f, "No supported dongle attached"),
            DeviceError::PermissionDenied(e) => write!(f, "USB permission denied: {e}"),
            DeviceError::OpenFailed(e) => write!(f, "Failed to open device: {e}"),
            DeviceError::TransferFailed(e) => write!(f, "Transfer failed: {e}"),
            DeviceError::Protocol { expected, actual } => write!(
                f,
                "Protocol error: transferred {actual} bytes, expected {expected}"
            ),
            DeviceError::Unavailable(op) => write!(f, "Operation not available: {op}"),
        }
    }
}

impl std::error::Error for DeviceError {}

pub type Result<T> = std::result::Result<T, DeviceError>;

// ── Attached device ──

/// A USB device reported by the host (not yet opened).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachedDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Bus location, e.g. `usb:001/004`.
    pub path: String,
    pub serial: Option<String>,
    pub product: Option<String>,
    /// Whether the current user may open the device node.
    pub permission_granted: bool,
}

// ── Traits ──

/// An open connection to one device.
pub trait UsbLink: Send {
    /// Perform one control transfer. Direction is taken from bit 7 of
    /// `request_type`; for IN transfers `buf` receives the data.
    ///
    /// Returns the number of bytes actually transferred.
    fn control_transfer(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize>;

    /// Release the connection. Further transfers fail.
    fn close(&mut self);
}

/// Device enumeration and connection factory.
pub trait UsbHost: Send + Sync {
    /// All USB devices currently attached.
    fn attached(&self) -> Result<Vec<AttachedDevice>>;

    /// Open a connection to the first attached device with the given ids.
    fn open(&self, vendor_id: u16, product_id: u16) -> Result<Box<dyn UsbLink>>;
}

// ── Linux implementation ──

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;

    use nusb::transfer::{Control, ControlType, Recipient};

    use crate::protocol::REQUEST_DIRECTION_IN;

    /// Host backed by nusb (usbfs).
    #[derive(Debug, Default)]
    pub struct LinuxHost;

    pub struct LinuxLink {
        device: Option<nusb::Device>,
        path: String,
    }

    /// Split a raw `bmRequestType` into nusb's typed fields.
    fn control_for(request_type: u8, request: u8, value: u16, index: u16) -> Control {
        let control_type = match (request_type >> 5) & 0x03 {
            0 => ControlType::Standard,
            1 => ControlType::Class,
            _ => ControlType::Vendor,
        };
        let recipient = match request_type & 0x1F {
            0 => Recipient::Device,
            1 => Recipient::Interface,
            2 => Recipient::Endpoint,
            _ => Recipient::Other,
        };
        Control {
            control_type,
            recipient,
            request,
            value,
            index,
        }
    }

    fn bus_path(bus: u8, address: u8) -> String {
        format!("usb:{bus:03}/{address:03}")
    }

    /// usbfs grants access per device node; check it without opening the device.
    fn node_accessible(bus: u8, address: u8) -> bool {
        let node = format!("/dev/bus/usb/{bus:03}/{address:03}");
        std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(node)
            .is_ok()
    }

    impl UsbLink for LinuxLink {
        fn control_transfer(
            &mut self,
            request_type: u8,
            request: u8,
            value: u16,
            index: u16,
            buf: &mut [u8],
            timeout: Duration,
        ) -> Result<usize> {
            let device = self.device.as_ref().ok_or_else(|| {
                DeviceError::TransferFailed(format!("{}: link already closed", self.path))
            })?;
            let control = control_for(request_type, request, value, index);
            let result = if request_type & REQUEST_DIRECTION_IN != 0 {
                device.control_in_blocking(control, buf, timeout)
            } else {
                device.control_out_blocking(control, buf, timeout)
            };
            result.map_err(|e| {
                DeviceError::TransferFailed(format!("control transfer (bRequest=0x{request:02X}): {e}"))
            })
        }

        fn close(&mut self) {
            if self.device.take().is_some() {
                log::info!("closed {}", self.path);
            }
        }
    }

    impl UsbHost for LinuxHost {
        fn attached(&self) -> Result<Vec<AttachedDevice>> {
            let devices = nusb::list_devices()
                .map_err(|e| DeviceError::OpenFailed(format!("USB enumeration: {e}")))?;
            Ok(devices
                .map(|dev| AttachedDevice {
                    vendor_id: dev.vendor_id(),
                    product_id: dev.product_id(),
                    path: bus_path(dev.bus_number(), dev.device_address()),
                    serial: dev.serial_number().map(|s| s.to_string()),
                    product: dev.product_string().map(|s| s.to_string()),
                    permission_granted: node_accessible(dev.bus_number(), dev.device_address()),
                })
                .collect())
        }

        fn open(&self, vendor_id: u16, product_id: u16) -> Result<Box<dyn UsbLink>> {
            let info = nusb::list_devices()
                .map_err(|e| DeviceError::OpenFailed(format!("USB enumeration: {e}")))?
                .find(|dev| dev.vendor_id() == vendor_id && dev.product_id() == product_id)
                .ok_or(DeviceError::UnsupportedDongle)?;
            let path = bus_path(info.bus_number(), info.device_address());

            let device = info.open().map_err(|e| {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    DeviceError::PermissionDenied(format!("{path}: {e}"))
                } else {
                    DeviceError::OpenFailed(format!("USB open {path}: {e}"))
                }
            })?;
            log::info!("opened {path} [{vendor_id:04x}:{product_id:04x}]");

            Ok(Box::new(LinuxLink {
                device: Some(device),
                path,
            }))
        }
    }

}

#[cfg(target_os = "linux")]
pub use linux_impl::LinuxHost;

// ── Stub host for unsupported platforms ──

/// Placeholder host that never sees a device.
/// Enables compilation and `cargo test` on unsupported hosts.
#[derive(Debug, Default)]
pub struct StubHost;

impl UsbHost for StubHost {
    fn attached(&self) -> Result<Vec<AttachedDevice>> {
        Ok(Vec::new())
    }

    fn open(&self, _vendor_id: u16, _product_id: u16) -> Result<Box<dyn UsbLink>> {
        Err(DeviceError::UnsupportedDongle)
    }
}

/// Concrete host type for the current platform.
#[cfg(target_os = "linux")]
pub type PlatformHost = LinuxHost;
#[cfg(not(target_os = "linux"))]
pub type PlatformHost = StubHost;

/// The platform-appropriate USB host.
pub fn platform_host() -> PlatformHost {
    PlatformHost::default()
}

// ── Mock host for testing ──

/// In-memory mock host for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Condvar, Mutex, MutexGuard};

    use crate::protocol::REQUEST_DIRECTION_IN;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Direction {
        Out,
        In,
    }

    /// One control transfer as seen by the mock.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedTransfer {
        /// Which opened link issued the transfer (1-based, in open order).
        pub link: usize,
        pub direction: Direction,
        pub request_type: u8,
        pub request: u8,
        pub value: u16,
        pub index: u16,
        /// Bytes written (OUT) or returned (IN).
        pub data: Vec<u8>,
    }

    #[derive(Default)]
    struct MockState {
        attached: Vec<AttachedDevice>,
        /// (command prefix, IN response) pairs.
        responses: Vec<(Vec<u8>, Vec<u8>)>,
        transfers: Vec<RecordedTransfer>,
        links_opened: usize,
        links_closed: usize,
        out_count: usize,
        /// 1-based OUT transfer index that fails with a USB error.
        fail_out_at: Option<usize>,
        /// 1-based OUT transfer index that reports a short byte count.
        short_out_at: Option<(usize, usize)>,
        /// Byte count reported by every IN transfer.
        short_in: Option<usize>,
        transfer_delay: Duration,
        in_flight: usize,
        max_in_flight: usize,
        /// Hold transfers until this many are in flight at once, or the
        /// timeout passes. Cleared once met.
        rendezvous: Option<(usize, Duration)>,
    }

    /// Shared mock host. Clones observe the same state.
    #[derive(Clone, Default)]
    pub struct MockHost {
        state: Arc<Mutex<MockState>>,
        arrivals: Arc<Condvar>,
    }

    impl MockHost {
        pub fn new() -> Self {
            Self::default()
        }

        /// A host with one attached, accessible device.
        pub fn with_dongle(vendor_id: u16, product_id: u16) -> Self {
            let host = Self::new();
            host.attach(vendor_id, product_id, true);
            host
        }

        fn state(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }

        pub fn attach(&self, vendor_id: u16, product_id: u16, permission_granted: bool) {
            let mut state = self.state();
            let n = state.attached.len() + 1;
            state.attached.push(AttachedDevice {
                vendor_id,
                product_id,
                path: format!("mock:{n:03}"),
                serial: Some(format!("MOCK{n}")),
                product: None,
                permission_granted,
            });
        }

        /// Serve `response` to IN transfers following an OUT that starts with `prefix`.
        /// The longest matching prefix wins.
        pub fn add_response(&self, prefix: &[u8], response: Vec<u8>) {
            self.state().responses.push((prefix.to_vec(), response));
        }

        /// Make the n-th OUT transfer (1-based, counted across all links) fail.
        pub fn fail_out_transfer(&self, n: usize) {
            self.state().fail_out_at = Some(n);
        }

        /// Make the n-th OUT transfer report `actual` bytes.
        pub fn short_out_transfer(&self, n: usize, actual: usize) {
            self.state().short_out_at = Some((n, actual));
        }

        /// Make every IN transfer report `actual` bytes.
        pub fn short_in_transfers(&self, actual: usize) {
            self.state().short_in = Some(actual);
        }

        /// Sleep this long inside every transfer.
        pub fn set_transfer_delay(&self, delay: Duration) {
            self.state().transfer_delay = delay;
        }

        /// Hold each transfer until `count` transfers are in flight together,
        /// giving up after `timeout`. Applies until first met.
        pub fn rendezvous(&self, count: usize, timeout: Duration) {
            self.state().rendezvous = Some((count, timeout));
        }

        /// Most transfers ever in flight at the same time, across all links.
        pub fn max_in_flight(&self) -> usize {
            self.state().max_in_flight
        }

        pub fn transfers(&self) -> Vec<RecordedTransfer> {
            self.state().transfers.clone()
        }

        /// Bytes of every OUT transfer, in order.
        pub fn out_payloads(&self) -> Vec<Vec<u8>> {
            self.state()
                .transfers
                .iter()
                .filter(|t| t.direction == Direction::Out)
                .map(|t| t.data.clone())
                .collect()
        }

        pub fn links_opened(&self) -> usize {
            self.state().links_opened
        }

        pub fn links_closed(&self) -> usize {
            self.state().links_closed
        }
    }

    impl UsbHost for MockHost {
        fn attached(&self) -> Result<Vec<AttachedDevice>> {
            Ok(self.state().attached.clone())
        }

        fn open(&self, vendor_id: u16, product_id: u16) -> Result<Box<dyn UsbLink>> {
            let mut state = self.state();
            let dev = state
                .attached
                .iter()
                .find(|d| d.vendor_id == vendor_id && d.product_id == product_id)
                .ok_or(DeviceError::UnsupportedDongle)?;
            if !dev.permission_granted {
                return Err(DeviceError::PermissionDenied(dev.path.clone()));
            }
            state.links_opened += 1;
            Ok(Box::new(MockLink {
                id: state.links_opened,
                state: Arc::clone(&self.state),
                arrivals: Arc::clone(&self.arrivals),
                last_out: Vec::new(),
                closed: false,
            }))
        }
    }

    pub struct MockLink {
        id: usize,
        state: Arc<Mutex<MockState>>,
        arrivals: Arc<Condvar>,
        last_out: Vec<u8>,
        closed: bool,
    }

    impl MockLink {
        fn lock(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }

        /// Count this transfer in flight and wait out any rendezvous.
        fn enter(&self) -> Duration {
            let mut state = self.lock();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            self.arrivals.notify_all();
            if let Some((count, timeout)) = state.rendezvous {
                let (guard, _) = self
                    .arrivals
                    .wait_timeout_while(state, timeout, |s| {
                        s.rendezvous.is_some() && s.in_flight < count
                    })
                    .unwrap_or_else(|e| e.into_inner());
                state = guard;
                if state.in_flight >= count {
                    state.rendezvous = None;
                    self.arrivals.notify_all();
                }
            }
            state.transfer_delay
        }

        fn leave(&self) {
            self.lock().in_flight -= 1;
        }

        fn transfer(
            &mut self,
            request_type: u8,
            request: u8,
            value: u16,
            index: u16,
            buf: &mut [u8],
        ) -> Result<usize> {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let direction = if request_type & REQUEST_DIRECTION_IN != 0 {
                Direction::In
            } else {
                Direction::Out
            };

            let reported = match direction {
                Direction::Out => {
                    state.out_count += 1;
                    let n = state.out_count;
                    if state.fail_out_at == Some(n) {
                        return Err(DeviceError::TransferFailed(
                            "mock: injected transfer failure".into(),
                        ));
                    }
                    self.last_out = buf.to_vec();
                    match state.short_out_at {
                        Some((at, actual)) if at == n => actual,
                        _ => buf.len(),
                    }
                }
                Direction::In => {
                    let response = state
                        .responses
                        .iter()
                        .filter(|(prefix, _)| self.last_out.starts_with(prefix))
                        .max_by_key(|(prefix, _)| prefix.len())
                        .map(|(_, response)| response.clone())
                        .ok_or_else(|| {
                            DeviceError::TransferFailed(format!(
                                "mock: no response for {}",
                                crate::protocol::hex(&self.last_out)
                            ))
                        })?;
                    buf.fill(0);
                    let n = response.len().min(buf.len());
                    buf[..n].copy_from_slice(&response[..n]);
                    state.short_in.unwrap_or(buf.len())
                }
            };

            state.transfers.push(RecordedTransfer {
                link: self.id,
                direction,
                request_type,
                request,
                value,
                index,
                data: buf.to_vec(),
            });
            Ok(reported)
        }
    }

    impl UsbLink for MockLink {
        fn control_transfer(
            &mut self,
            request_type: u8,
            request: u8,
            value: u16,
            index: u16,
            buf: &mut [u8],
            _timeout: Duration,
        ) -> Result<usize> {
            if self.closed {
                return Err(DeviceError::TransferFailed("mock: link closed".into()));
            }
            let delay = self.enter();
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            let result = self.transfer(request_type, request, value, index, buf);
            self.leave();
            result
        }

        fn close(&mut self) {
            if !self.closed {
                self.closed = true;
                self.state
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .links_closed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            DeviceError::UnsupportedDongle.to_string(),
            "No supported dongle attached"
        );
        assert_eq!(
            DeviceError::Protocol {
                expected: 7,
                actual: 3
            }
            .to_string(),
            "Protocol error: transferred 3 bytes, expected 7"
        );
        assert_eq!(
            DeviceError::OpenFailed("USB open: busy".into()).to_string(),
            "Failed to open device: USB open: busy"
        );
    }

    #[test]
    fn device_error_is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(DeviceError::UnsupportedDongle);
        assert!(e.to_string().contains("No supported dongle"));
    }

    #[test]
    fn stub_host_sees_nothing() {
        let host = StubHost;
        assert!(host.attached().unwrap().is_empty());
        assert!(matches!(
            host.open(1, 2),
            Err(DeviceError::UnsupportedDongle)
        ));
    }

    #[test]
    fn attached_device_serializes() {
        let dev = AttachedDevice {
            vendor_id: 0x2FC6,
            product_id: 0xF06A,
            path: "usb:001/004".into(),
            serial: None,
            product: Some("Dawn".into()),
            permission_granted: true,
        };
        let json = serde_json::to_value(&dev).unwrap();
        assert_eq!(json["vendor_id"], 0x2FC6);
        assert_eq!(json["path"], "usb:001/004");
        assert!(json["serial"].is_null());
    }

    #[test]
    fn mock_open_unknown_device_fails() {
        let host = MockHost::with_dongle(1, 2);
        assert!(matches!(
            host.open(1, 3),
            Err(DeviceError::UnsupportedDongle)
        ));
        assert_eq!(host.links_opened(), 0);
    }

    #[test]
    fn mock_open_without_permission_fails() {
        let host = MockHost::new();
        host.attach(1, 2, false);
        assert!(matches!(
            host.open(1, 2),
            Err(DeviceError::PermissionDenied(_))
        ));
    }

    #[test]
    fn mock_records_out_and_serves_in() {
        let host = MockHost::with_dongle(1, 2);
        host.add_response(&[0xAA], vec![0xAA, 0x01, 0x02]);
        let mut link = host.open(1, 2).unwrap();
        let timeout = Duration::from_millis(1);

        let mut buf = [0xAA, 0, 0, 0];
        assert_eq!(
            link.control_transfer(0x43, 0xA0, 0, 0x09A0, &mut buf, timeout)
                .unwrap(),
            4
        );
        assert_eq!(
            link.control_transfer(0xC3, 0xA1, 0, 0x09A0, &mut buf, timeout)
                .unwrap(),
            4
        );
        assert_eq!(buf, [0xAA, 0x01, 0x02, 0x00]);

        let transfers = host.transfers();
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].direction, Direction::Out);
        assert_eq!(transfers[0].data, vec![0xAA, 0, 0, 0]);
        assert_eq!(transfers[1].direction, Direction::In);
        assert_eq!(transfers[1].link, 1);
    }

    #[test]
    fn mock_longest_prefix_wins() {
        let host = MockHost::with_dongle(1, 2);
        host.add_response(&[0xAA], vec![1]);
        host.add_response(&[0xAA, 0xBB], vec![2]);
        let mut link = host.open(1, 2).unwrap();
        let timeout = Duration::from_millis(1);
        let mut buf = [0xAA, 0xBB];
        link.control_transfer(0x43, 0xA0, 0, 0, &mut buf, timeout)
            .unwrap();
        link.control_transfer(0xC3, 0xA1, 0, 0, &mut buf, timeout)
            .unwrap();
        assert_eq!(buf, [2, 0]);
    }

    #[test]
    fn mock_in_without_response_fails() {
        let host = MockHost::with_dongle(1, 2);
        let mut link = host.open(1, 2).unwrap();
        let mut buf = [0u8; 4];
        let err = link
            .control_transfer(0xC3, 0xA1, 0, 0, &mut buf, Duration::ZERO)
            .unwrap_err();
        assert!(err.to_string().contains("no response"));
    }

    #[test]
    fn mock_close_counts_once() {
        let host = MockHost::with_dongle(1, 2);
        let mut link = host.open(1, 2).unwrap();
        link.close();
        link.close();
        assert_eq!(host.links_closed(), 1);
        let mut buf = [0u8; 1];
        assert!(
            link.control_transfer(0x43, 0xA0, 0, 0, &mut buf, Duration::ZERO)
                .is_err()
        );
    }

    #[test]
    fn mock_tracks_transfers_in_flight() {
        let host = MockHost::with_dongle(1, 2);
        host.rendezvous(2, Duration::from_secs(5));
        std::thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    let mut link = host.open(1, 2).unwrap();
                    let mut buf = [0u8; 4];
                    link.control_transfer(0x43, 0xA0, 0, 0, &mut buf, Duration::ZERO)
                        .unwrap();
                });
            }
        });
        assert_eq!(host.max_in_flight(), 2);
    }

    #[test]
    fn mock_sequential_transfers_never_overlap() {
        let host = MockHost::with_dongle(1, 2);
        let mut link = host.open(1, 2).unwrap();
        let mut buf = [0u8; 4];
        for _ in 0..3 {
            link.control_transfer(0x43, 0xA0, 0, 0, &mut buf, Duration::ZERO)
                .unwrap();
        }
        assert_eq!(host.max_in_flight(), 1);
    }
}
