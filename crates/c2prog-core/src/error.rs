//! Error types for c2prog-core
//!
//! Every fallible operation in the workspace returns [`Error`]. Backends keep
//! their own error enums and convert into [`Error::Transport`] when crossing
//! the [`C2Bus`](crate::bus::C2Bus) boundary, so the message of the failing
//! layer survives all the way up to the CLI.

use crate::space::MemorySpace;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad bus URI, unknown bus type, or use of a closed bus
    Config,
    /// The physical link to the target failed
    Transport,
    /// Program image content was rejected
    ProtocolData,
    /// Address, length or slot number outside the valid range
    Range,
    /// A host-side file could not be opened or read
    Io,
}

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors
    /// No backend is registered under this bus type
    #[error("Unknown C2 bus type '{0}'")]
    UnknownBusType(String),
    /// Bus URI is not of the form `<type>://<path>`
    #[error("C2 bus device uri incorrect format: '{0}' (expected <type>://<path>)")]
    InvalidUri(String),
    /// Backend specific path could not be parsed
    #[error("Invalid {bus} path '{path}': {reason}")]
    InvalidPath {
        /// Bus type
        bus: &'static str,
        /// Path as given
        path: String,
        /// What is wrong with it
        reason: String,
    },
    /// Bus primitive invoked after the handle was closed
    #[error("C2 bus is closed")]
    BusClosed,

    // Transport errors
    /// Backend reported a failure
    #[error("{bus}: {message}")]
    Transport {
        /// Bus type that failed
        bus: &'static str,
        /// Backend error message
        message: String,
    },

    // Range errors
    /// Start address outside the memory space
    #[error(
        "{space} address 0x{addr:x} out of range (0x{:x}-0x{:x})",
        .space.min_address(),
        .space.max_address()
    )]
    AddressOutOfRange {
        /// Memory space accessed
        space: MemorySpace,
        /// Offending address
        addr: u32,
    },
    /// Access runs past the end of the memory space
    #[error("{space} access of {len} bytes at 0x{addr:x} runs past the end of the space")]
    SpanOutOfRange {
        /// Memory space accessed
        space: MemorySpace,
        /// Start address
        addr: u32,
        /// Requested length
        len: usize,
    },
    /// Breakpoint slot outside 0..7
    #[error("Breakpoint number {0} out of range (0-7)")]
    InvalidBreakpoint(u8),

    // Program image errors
    /// One or more lines of an Intel HEX image were rejected
    #[error("{source_name}: {errors} line(s) could not be loaded")]
    HexLoad {
        /// Name of the image (usually its path)
        source_name: String,
        /// Number of rejected lines
        errors: usize,
    },

    // Host I/O errors
    /// File could not be opened
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// Reading a program image failed part way through
    #[error("Reading {source_name} (line {line}): {source}")]
    Read {
        /// Name of the image
        source_name: String,
        /// Line being read when the failure occurred
        line: usize,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Build a transport error from any backend error
    pub fn transport(bus: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            bus,
            message: err.to_string(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownBusType(_)
            | Self::InvalidUri(_)
            | Self::InvalidPath { .. }
            | Self::BusClosed => ErrorKind::Config,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::AddressOutOfRange { .. }
            | Self::SpanOutOfRange { .. }
            | Self::InvalidBreakpoint(_) => ErrorKind::Range,
            Self::HexLoad { .. } => ErrorKind::ProtocolData,
            Self::Open { .. } | Self::Read { .. } => ErrorKind::Io,
        }
    }
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;
