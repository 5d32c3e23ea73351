//! Backend registry
//!
//! Opens a backend by scheme and wraps it in a [`BusHandle`]. Only backends
//! enabled at compile time are known.

use crate::handle::BusHandle;
use c2prog_core::error::{Error, Result};

/// Separator between scheme and path in a bus URI
const URI_SEPARATOR: &str = "://";

/// Information about a compiled-in backend
#[derive(Debug, Clone, Copy)]
pub struct BusInfo {
    /// Scheme (used for matching)
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
    /// Syntax of the path part of the URI
    pub path_help: &'static str,
}

/// Get information about all available backends (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_buses() -> Vec<BusInfo> {
    let mut buses = Vec::new();

    #[cfg(feature = "fx2")]
    buses.push(BusInfo {
        name: "fx2",
        description: "Cypress EZ-USB FX2 C2 bridge (VID:04b4 PID:8613)",
        path_help: "[BBB/DDD]  optional 3-digit USB bus and device number, e.g. fx2://001/004",
    });

    #[cfg(feature = "c2drv")]
    buses.push(BusInfo {
        name: "c2drv",
        description: "c2drv Linux kernel driver",
        path_help: "DEVICE  character device of the driver, e.g. c2drv:///dev/c2drv",
    });

    #[cfg(feature = "dummy")]
    buses.push(BusInfo {
        name: "dummy",
        description: "In-memory target emulator for testing",
        path_help: "(ignored), e.g. dummy://",
    });

    buses
}

/// Help text describing the URI of every available backend
pub fn bus_help() -> String {
    let mut help = String::from("C2 bus device URI: <type>://<path>\n\nAvailable bus types:\n");
    for bus in available_buses() {
        help.push_str(&format!("  {:<8} {}\n", bus.name, bus.description));
        help.push_str(&format!("  {:<8}   path: {}\n", "", bus.path_help));
    }
    help
}

/// Split a bus URI into scheme and path
///
/// The path may be empty (`fx2://`).
pub fn parse_bus_uri(uri: &str) -> Result<(&str, &str)> {
    match uri.split_once(URI_SEPARATOR) {
        Some((scheme, path)) if !scheme.is_empty() => Ok((scheme, path)),
        _ => Err(Error::InvalidUri(uri.to_string())),
    }
}

/// Open a bus given as `<type>://<path>`
pub fn open_bus(uri: &str) -> Result<BusHandle> {
    let (scheme, path) = parse_bus_uri(uri)?;
    open(scheme, path)
}

/// Open the backend registered under `scheme`
///
/// The scheme must match exactly. What `path` means is up to the backend.
pub fn open(scheme: &str, path: &str) -> Result<BusHandle> {
    log::debug!("Opening C2 bus '{}' path '{}'", scheme, path);

    match scheme {
        #[cfg(feature = "fx2")]
        "fx2" => open_fx2(path),

        #[cfg(feature = "c2drv")]
        "c2drv" => open_c2drv(path),

        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(path),

        _ => Err(Error::UnknownBusType(scheme.to_string())),
    }
}

#[cfg(feature = "fx2")]
fn open_fx2(path: &str) -> Result<BusHandle> {
    use c2prog_fx2::{Fx2, UsbLocation};

    let location = if path.is_empty() {
        None
    } else {
        Some(UsbLocation::parse(path).map_err(|e| Error::InvalidPath {
            bus: "fx2",
            path: path.to_string(),
            reason: e.to_string(),
        })?)
    };

    log::info!("Opening FX2 C2 bridge...");
    let bus = Fx2::open(location)?;
    Ok(BusHandle::new("fx2", Box::new(bus)))
}

#[cfg(feature = "c2drv")]
fn open_c2drv(path: &str) -> Result<BusHandle> {
    use c2prog_c2drv::C2drv;

    if path.is_empty() {
        return Err(Error::InvalidPath {
            bus: "c2drv",
            path: String::new(),
            reason: "a device path is required".to_string(),
        });
    }

    log::info!("Opening c2drv device {}...", path);
    let bus = C2drv::open(path)?;
    Ok(BusHandle::new("c2drv", Box::new(bus)))
}

#[cfg(feature = "dummy")]
fn open_dummy(_path: &str) -> Result<BusHandle> {
    log::info!("Opening emulated target...");
    let bus = c2prog_dummy::DummyTarget::new_default();
    Ok(BusHandle::new("dummy", Box::new(bus)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use c2prog_core::ErrorKind;

    #[test]
    fn test_parse_bus_uri() {
        assert_eq!(parse_bus_uri("fx2://").unwrap(), ("fx2", ""));
        assert_eq!(parse_bus_uri("fx2://001/004").unwrap(), ("fx2", "001/004"));
        assert_eq!(
            parse_bus_uri("c2drv:///dev/c2drv").unwrap(),
            ("c2drv", "/dev/c2drv")
        );
    }

    #[test]
    fn test_parse_bus_uri_rejects_malformed() {
        for uri in ["fx2", "fx2:/", "://path", ""] {
            let err = parse_bus_uri(uri).unwrap_err();
            assert!(matches!(err, Error::InvalidUri(_)), "{}", uri);
            assert_eq!(err.kind(), ErrorKind::Config);
        }
    }

    #[test]
    fn test_unknown_scheme() {
        let err = open_bus("bogus://x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().starts_with("Unknown C2 bus type"));
    }

    #[test]
    fn test_scheme_is_exact_match() {
        assert!(matches!(
            open("FX2", ""),
            Err(Error::UnknownBusType(ref s)) if s == "FX2"
        ));
    }

    #[test]
    fn test_help_lists_available_buses() {
        let help = bus_help();
        for bus in available_buses() {
            assert!(help.contains(bus.name));
        }
    }

    #[cfg(feature = "fx2")]
    #[test]
    fn test_fx2_bad_location() {
        let err = open_bus("fx2://1/4").unwrap_err();
        assert!(matches!(err, Error::InvalidPath { bus: "fx2", .. }));
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[cfg(feature = "c2drv")]
    #[test]
    fn test_c2drv_requires_path() {
        let err = open_bus("c2drv://").unwrap_err();
        assert!(matches!(err, Error::InvalidPath { bus: "c2drv", .. }));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy() {
        use c2prog_core::target::Target;

        let mut bus = open_bus("dummy://").unwrap();
        assert_eq!(bus.name(), "dummy");
        {
            let mut target = Target::init(&mut bus).unwrap();
            target.pc_set(0x0123).unwrap();
            assert_eq!(target.pc_get().unwrap(), 0x0123);
        }
        bus.close();
        assert!(!bus.is_open());
    }
}
