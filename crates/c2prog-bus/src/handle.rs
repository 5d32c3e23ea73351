//! BusHandle - one open C2 bus
//!
//! The handle owns the backend and records the message of the most recent
//! failure, so callers that only see "it failed" can still ask what went
//! wrong.

use c2prog_core::bus::C2Bus;
use c2prog_core::error::{Error, Result};
use std::fmt;

/// An open C2 bus
///
/// The handle is used by one caller at a time and does no locking. The
/// backend's OS resources are released by [`BusHandle::close`] or when the
/// handle is dropped.
pub struct BusHandle {
    /// Scheme the backend was opened with
    name: &'static str,
    /// The backend (type-erased, owned); `None` once closed
    backend: Option<Box<dyn C2Bus + Send>>,
    /// Message of the most recent failure
    last_error: Option<String>,
}

impl BusHandle {
    /// Wrap an already opened backend
    pub fn new(name: &'static str, backend: Box<dyn C2Bus + Send>) -> Self {
        Self {
            name,
            backend: Some(backend),
            last_error: None,
        }
    }

    /// Scheme of the backend (e.g. "fx2")
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether [`close`](Self::close) has not been called yet
    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    /// Message of the most recent failure, if any
    ///
    /// Each new failure replaces the previous message.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Release the backend
    ///
    /// Closing an already closed handle does nothing. Any primitive called
    /// afterwards fails with [`Error::BusClosed`].
    pub fn close(&mut self) {
        if self.backend.take().is_some() {
            log::debug!("Closed {} bus", self.name);
        }
        self.last_error = None;
    }

    fn with_backend<T>(&mut self, op: impl FnOnce(&mut dyn C2Bus) -> Result<T>) -> Result<T> {
        let result = match self.backend.as_mut() {
            Some(backend) => op(&mut **backend),
            None => Err(Error::BusClosed),
        };
        if let Err(e) = &result {
            self.last_error = Some(e.to_string());
        }
        result
    }
}

impl C2Bus for BusHandle {
    fn reset(&mut self) -> Result<()> {
        self.with_backend(|bus| bus.reset())
    }

    fn quick_reset(&mut self) -> Result<()> {
        self.with_backend(|bus| bus.quick_reset())
    }

    fn read_address(&mut self) -> Result<u8> {
        self.with_backend(|bus| bus.read_address())
    }

    fn write_address(&mut self, addr: u8) -> Result<()> {
        self.with_backend(|bus| bus.write_address(addr))
    }

    fn read_data(&mut self, buf: &mut [u8]) -> Result<()> {
        self.with_backend(|bus| bus.read_data(buf))
    }

    fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.with_backend(|bus| bus.write_data(data))
    }
}

impl fmt::Debug for BusHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusHandle")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl Drop for BusHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c2prog_core::ErrorKind;

    /// Fails every data read with a numbered message
    struct FlakyBus {
        failures: usize,
    }

    impl C2Bus for FlakyBus {
        fn reset(&mut self) -> Result<()> {
            Ok(())
        }

        fn quick_reset(&mut self) -> Result<()> {
            Ok(())
        }

        fn read_address(&mut self) -> Result<u8> {
            Ok(0)
        }

        fn write_address(&mut self, _addr: u8) -> Result<()> {
            Ok(())
        }

        fn read_data(&mut self, _buf: &mut [u8]) -> Result<()> {
            self.failures += 1;
            Err(Error::transport("flaky", format!("failure {}", self.failures)))
        }

        fn write_data(&mut self, _data: &[u8]) -> Result<()> {
            Ok(())
        }
    }

    fn flaky() -> BusHandle {
        BusHandle::new("flaky", Box::new(FlakyBus { failures: 0 }))
    }

    #[test]
    fn test_no_error_recorded_initially() {
        let mut bus = flaky();
        bus.reset().unwrap();
        assert_eq!(bus.last_error(), None);
    }

    #[test]
    fn test_last_error_is_replaced() {
        let mut bus = flaky();
        let mut buf = [0u8; 1];
        assert!(bus.read_data(&mut buf).is_err());
        assert_eq!(bus.last_error(), Some("flaky: failure 1"));
        assert!(bus.read_data(&mut buf).is_err());
        assert_eq!(bus.last_error(), Some("flaky: failure 2"));
        // Successful calls leave the message alone
        bus.write_address(0x02).unwrap();
        assert_eq!(bus.last_error(), Some("flaky: failure 2"));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut bus = flaky();
        let mut buf = [0u8; 1];
        let _ = bus.read_data(&mut buf);
        bus.close();
        assert!(!bus.is_open());
        assert_eq!(bus.last_error(), None);
        bus.close();
        assert!(!bus.is_open());
    }

    #[test]
    fn test_use_after_close_fails() {
        let mut bus = flaky();
        bus.close();
        let err = bus.reset().unwrap_err();
        assert!(matches!(err, Error::BusClosed));
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(bus.last_error(), Some("C2 bus is closed"));
    }
}
