//! Unified error type for the dongler-lib crate.
//!
//! [`DonglerError`] wraps [`DeviceError`] and the domain-specific error kinds
//! (`Config`, `Profile`, `Setting`). `From` impls let `?` propagate across
//! module boundaries.

use std::fmt;

use crate::device::DeviceError;

/// Unified error type for dongler-lib operations.
#[derive(Debug)]
pub enum DonglerError {
    /// Device communication error (open, permission, control transfer).
    Device(DeviceError),
    /// Standard I/O error (config and profile persistence).
    Io(std::io::Error),
    /// Configuration parse or validation error.
    Config(String),
    /// Profile store or profile/device mismatch.
    Profile(String),
    /// A setting key or value that the model does not accept.
    Setting(String),
}

impl fmt::Display for DonglerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DonglerError::Device(e) => write!(f, "{e}"),
            DonglerError::Io(e) => write!(f, "I/O error: {e}"),
            DonglerError::Config(e) => write!(f, "Config error: {e}"),
            DonglerError::Profile(e) => write!(f, "Profile error: {e}"),
            DonglerError::Setting(e) => write!(f, "Setting error: {e}"),
        }
    }
}

impl std::error::Error for DonglerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DonglerError::Device(e) => Some(e),
            DonglerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DeviceError> for DonglerError {
    fn from(e: DeviceError) -> Self {
        DonglerError::Device(e)
    }
}

impl From<std::io::Error> for DonglerError {
    fn from(e: std::io::Error) -> Self {
        DonglerError::Io(e)
    }
}

/// Crate-level Result alias using [`DonglerError`].
pub type Result<T> = std::result::Result<T, DonglerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_device_error() {
        let e: DonglerError = DeviceError::UnsupportedDongle.into();
        assert!(matches!(
            e,
            DonglerError::Device(DeviceError::UnsupportedDongle)
        ));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: DonglerError = io_err.into();
        assert!(matches!(e, DonglerError::Io(_)));
    }

    #[test]
    fn display_passes_device_error_through() {
        let e = DonglerError::Device(DeviceError::UnsupportedDongle);
        assert_eq!(e.to_string(), "No supported dongle attached");
    }

    #[test]
    fn display_string_variants() {
        assert_eq!(
            DonglerError::Profile("no profile 3".into()).to_string(),
            "Profile error: no profile 3"
        );
        assert_eq!(
            DonglerError::Setting("unknown key: bass".into()).to_string(),
            "Setting error: unknown key: bass"
        );
        assert_eq!(
            DonglerError::Config("bad timeout".into()).to_string(),
            "Config error: bad timeout"
        );
    }

    #[test]
    fn source_chains_device_error() {
        let e = DonglerError::Device(DeviceError::TransferFailed("timeout".into()));
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("timeout"));
    }

    #[test]
    fn source_none_for_string_variants() {
        let e = DonglerError::Setting("test".into());
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn question_mark_propagation_device_to_dongler() {
        fn inner() -> crate::device::Result<()> {
            Err(DeviceError::Protocol {
                expected: 7,
                actual: 0,
            })
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(matches!(
            err,
            DonglerError::Device(DeviceError::Protocol { .. })
        ));
    }
}
