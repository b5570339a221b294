//! Transfer engine — vendor write / write+read primitives and the
//! single-flight exchange lock.
//!
//! Every exchange with a dongle follows the same shape:
//!
//! 1. open a link to the device,
//! 2. take the repository's [`ExchangeLock`],
//! 3. run one or more [`control_write`] / [`control_write_and_read`] calls,
//! 4. release the lock and close the link.
//!
//! Steps 2-4 are scoped: the lock guard and the [`LinkSession`] drop on every
//! exit path, including early `?` returns and unwinding panics.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::device::{DeviceError, Result, UsbHost, UsbLink};
use crate::protocol::{
    DEFAULT_SETTLE_DELAY_MS, DEFAULT_TIMEOUT_MS, REQUEST_ID_READ, REQUEST_ID_WRITE, REQUEST_INDEX,
    REQUEST_TYPE_READ, REQUEST_TYPE_WRITE, REQUEST_VALUE, hex,
};

/// Timeout and settle delay applied to every transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub timeout: Duration,
    /// Sleep after each transfer so firmware can apply the command.
    pub settle: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            settle: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
        }
    }
}

impl Timing {
    pub fn from_millis(timeout_ms: u64, settle_ms: u64) -> Self {
        Timing {
            timeout: Duration::from_millis(timeout_ms),
            settle: Duration::from_millis(settle_ms),
        }
    }

    /// No settle delay, short timeout. For tests against the mock host.
    pub fn immediate() -> Self {
        Timing {
            timeout: Duration::from_millis(10),
            settle: Duration::ZERO,
        }
    }

    fn settle(&self) {
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
    }
}

fn check_size(expected: usize, actual: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(DeviceError::Protocol { expected, actual })
    }
}

/// Send `payload` as one vendor OUT transfer, then settle.
///
/// Fails with [`DeviceError::Protocol`] unless exactly `payload.len()` bytes
/// were written.
pub fn control_write(link: &mut dyn UsbLink, payload: &mut [u8], timing: &Timing) -> Result<()> {
    let size = payload.len();
    log::debug!("OUT {}", hex(payload));
    let written = link.control_transfer(
        REQUEST_TYPE_WRITE,
        REQUEST_ID_WRITE,
        REQUEST_VALUE,
        REQUEST_INDEX,
        payload,
        timing.timeout,
    )?;
    check_size(size, written)?;
    timing.settle();
    Ok(())
}

/// Send `buf` as a vendor OUT transfer, then read the response into the
/// same buffer with a vendor IN transfer of equal size.
///
/// The read is not attempted if the write fails or comes up short. On
/// success `buf` holds the device's response.
pub fn control_write_and_read(
    link: &mut dyn UsbLink,
    buf: &mut [u8],
    timing: &Timing,
) -> Result<()> {
    control_write(link, buf, timing)?;

    let size = buf.len();
    let read = link.control_transfer(
        REQUEST_TYPE_READ,
        REQUEST_ID_READ,
        REQUEST_VALUE,
        REQUEST_INDEX,
        buf,
        timing.timeout,
    )?;
    check_size(size, read)?;
    log::debug!("IN  {}", hex(buf));
    timing.settle();
    Ok(())
}

// ── Scoped exchange ──

/// An open link that is closed when dropped.
pub struct LinkSession {
    link: Box<dyn UsbLink>,
    timing: Timing,
}

impl LinkSession {
    pub fn new(link: Box<dyn UsbLink>, timing: Timing) -> Self {
        LinkSession { link, timing }
    }

    pub fn write(&mut self, payload: &mut [u8]) -> Result<()> {
        control_write(self.link.as_mut(), payload, &self.timing)
    }

    pub fn write_and_read(&mut self, buf: &mut [u8]) -> Result<()> {
        control_write_and_read(self.link.as_mut(), buf, &self.timing)
    }
}

impl Drop for LinkSession {
    fn drop(&mut self) {
        self.link.close();
    }
}

/// Serializes every transfer sequence issued through one repository.
#[derive(Debug, Default)]
pub struct ExchangeLock {
    inner: Mutex<()>,
}

impl ExchangeLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a panic in another exchange leaves
        // nothing inconsistent behind.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a link to `(vendor_id, product_id)`, take the lock, and run `f`.
    ///
    /// The lock is released and the link closed before this returns,
    /// whatever `f` does.
    pub fn exchange<T>(
        &self,
        host: &dyn UsbHost,
        timing: Timing,
        vendor_id: u16,
        product_id: u16,
        f: impl FnOnce(&mut LinkSession) -> Result<T>,
    ) -> Result<T> {
        let mut session = LinkSession::new(host.open(vendor_id, product_id)?, timing);
        let _guard = self.acquire();
        f(&mut session)
    }
}
