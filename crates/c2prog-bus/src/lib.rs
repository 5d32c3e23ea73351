//! Transport-agnostic C2 bus access
//!
//! This crate hides the differences between the physical C2 interfaces. The
//! CLI opens a bus with a URI such as `fx2://` or `c2drv:///dev/c2drv` and
//! only ever sees a [`BusHandle`], never a backend type.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     CLI (c2prog)                          │
//! │  - Opens a BusHandle by URI, drives it through Target    │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  c2prog-bus (this crate)                  │
//! │  - BusHandle: owns the backend, records the last error   │
//! │  - Registry: opens backends by scheme                     │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │    c2prog-core           │   │  Backend crates          │
//! │  - C2Bus trait           │   │  - fx2, c2drv, dummy     │
//! │  - Target, ihex loader   │   │  - Implement C2Bus       │
//! └──────────────────────────┘   └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use c2prog_bus::open_bus;
//! use c2prog_core::target::Target;
//!
//! let mut bus = open_bus("fx2://")?;
//! let mut target = Target::init(&mut bus)?;
//! println!("PC = 0x{:04x}", target.pc_get()?);
//! bus.close();
//! ```

mod handle;
mod registry;

pub use handle::BusHandle;
pub use registry::{available_buses, bus_help, open, open_bus, parse_bus_uri, BusInfo};
