//! # Debugging toolset for POWER systems
//!
//! `powerdbg` is the addressing and dispatch core of a POWER hardware debug
//! library. It holds the tree of hardware targets built from an expanded
//! topology description, translates addresses between the coordinate spaces
//! of the targets, and routes register accesses to the backend transport of
//! the bus that owns them. Registers flagged as indirect are reached through
//! the PIB's bounded write-then-poll indirect access protocol.
//!
//! The physical transports are not part of this crate. Each bus-kind target
//! is attached to an implementation of [`PibBus`], [`OpbBus`] or [`FsiBus`]
//! by the surrounding tooling; [`testing`] ships in-memory implementations
//! for tests and dry runs.
//!
//! ## Reading a register
//! ```
//! use powerdbg::{testing::MockPib, BusInterface, TargetTree};
//!
//! let topology = powerdbg_topology::from_yaml(
//!     r#"
//! name: root
//! children:
//!   - name: pib
//!     class: pib
//!     children:
//!       - name: core0
//!         class: core
//!         address: 0x20000000
//! "#,
//! )
//! .unwrap();
//!
//! let mut tree = TargetTree::from_topology(&topology);
//! tree.probe_all();
//!
//! // Attach a transport to the PIB. A real caller would attach a kernel or
//! // FSI backed driver here.
//! let mut pib_backend = MockPib::new();
//! pib_backend.set_register(0x2000_0010, 0xBEEF);
//! let pib = tree.require_class("pib")?.targets().next().unwrap();
//! tree.set_bus_interface(pib, BusInterface::Pib(Box::new(pib_backend)));
//!
//! // Read relative to the core; the access is translated up to the PIB.
//! let core = tree.require_class("core")?.targets().next().unwrap();
//! assert_eq!(tree.pib_read(core, 0x10)?, 0xBEEF);
//! # Ok::<(), powerdbg::Error>(())
//! ```
#![warn(missing_docs)]

pub mod bus;
mod error;
pub mod probe;
pub mod registry;
pub mod target;
pub mod testing;

pub use bus::{BusInterface, FsiBus, OpbBus, PibBus};
pub use error::{Error, IndirectTransferError, ModelError};
pub use probe::{Presence, TargetProbe};
pub use registry::{find_compatible_unit, HardwareUnit, TargetTemplate};
pub use target::{Target, TargetClass, TargetId, TargetStatus, TargetTree};
