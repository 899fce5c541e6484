//! In-memory bus backends and probes for tests and dry runs.
//!
//! The mocks double as scriptable fakes: by default they behave like a bank
//! of zero-initialized registers, and a handler closure can be installed to
//! replay arbitrary response sequences or inject failures. Every transaction
//! is recorded in an [`OperationLog`] the test keeps a handle to after the
//! mock has been boxed into the tree.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::bus::{FsiBus, OpbBus, PibBus};
use crate::error::Error;
use crate::probe::{Presence, TargetProbe};

/// One recorded bus transaction. 32-bit bus transactions are recorded with
/// their values widened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// A read at `addr`.
    Read {
        /// Address presented to the backend.
        addr: u64,
    },
    /// A write of `data` at `addr`.
    Write {
        /// Address presented to the backend.
        addr: u64,
        /// Data presented to the backend.
        data: u64,
    },
}

/// Shared, clonable record of the transactions a mock backend performed.
#[derive(Debug, Clone, Default)]
pub struct OperationLog(Rc<RefCell<Vec<Operation>>>);

impl OperationLog {
    fn record(&self, operation: Operation) {
        self.0.borrow_mut().push(operation);
    }

    /// All operations recorded so far, in order.
    pub fn snapshot(&self) -> Vec<Operation> {
        self.0.borrow().clone()
    }

    /// Number of reads recorded so far.
    pub fn reads(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|op| matches!(op, Operation::Read { .. }))
            .count()
    }

    /// Number of writes recorded so far.
    pub fn writes(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|op| matches!(op, Operation::Write { .. }))
            .count()
    }
}

type ReadHandler = Box<dyn FnMut(u64) -> Result<u64, Error>>;
type WriteHandler = Box<dyn FnMut(u64, u64) -> Result<(), Error>>;

/// An in-memory PIB backend.
#[derive(Default)]
pub struct MockPib {
    registers: HashMap<u64, u64>,
    log: OperationLog,
    read_handler: Option<ReadHandler>,
    write_handler: Option<WriteHandler>,
}

impl MockPib {
    /// A mock with all registers reading as zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to this mock's transaction log.
    pub fn log(&self) -> OperationLog {
        self.log.clone()
    }

    /// Preload the register at `addr`.
    pub fn set_register(&mut self, addr: u64, data: u64) {
        self.registers.insert(addr, data);
    }

    /// Route all reads through `handler` instead of the register bank.
    pub fn set_read_handler(&mut self, handler: impl FnMut(u64) -> Result<u64, Error> + 'static) {
        self.read_handler = Some(Box::new(handler));
    }

    /// Route all writes through `handler` instead of the register bank.
    pub fn set_write_handler(
        &mut self,
        handler: impl FnMut(u64, u64) -> Result<(), Error> + 'static,
    ) {
        self.write_handler = Some(Box::new(handler));
    }
}

impl PibBus for MockPib {
    fn read(&mut self, addr: u64) -> Result<u64, Error> {
        self.log.record(Operation::Read { addr });
        match self.read_handler.as_mut() {
            Some(handler) => handler(addr),
            None => Ok(self.registers.get(&addr).copied().unwrap_or(0)),
        }
    }

    fn write(&mut self, addr: u64, data: u64) -> Result<(), Error> {
        self.log.record(Operation::Write { addr, data });
        match self.write_handler.as_mut() {
            Some(handler) => handler(addr, data),
            None => {
                self.registers.insert(addr, data);
                Ok(())
            }
        }
    }
}

/// An in-memory OPB backend.
#[derive(Default)]
pub struct MockOpb {
    registers: HashMap<u32, u32>,
    log: OperationLog,
}

impl MockOpb {
    /// A mock with all registers reading as zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to this mock's transaction log.
    pub fn log(&self) -> OperationLog {
        self.log.clone()
    }

    /// Preload the register at `addr`.
    pub fn set_register(&mut self, addr: u32, data: u32) {
        self.registers.insert(addr, data);
    }
}

impl OpbBus for MockOpb {
    fn read(&mut self, addr: u32) -> Result<u32, Error> {
        self.log.record(Operation::Read {
            addr: u64::from(addr),
        });
        Ok(self.registers.get(&addr).copied().unwrap_or(0))
    }

    fn write(&mut self, addr: u32, data: u32) -> Result<(), Error> {
        self.log.record(Operation::Write {
            addr: u64::from(addr),
            data: u64::from(data),
        });
        self.registers.insert(addr, data);
        Ok(())
    }
}

/// An in-memory FSI backend.
#[derive(Default)]
pub struct MockFsi {
    registers: HashMap<u32, u32>,
    log: OperationLog,
}

impl MockFsi {
    /// A mock with all registers reading as zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to this mock's transaction log.
    pub fn log(&self) -> OperationLog {
        self.log.clone()
    }

    /// Preload the register at `addr`.
    pub fn set_register(&mut self, addr: u32, data: u32) {
        self.registers.insert(addr, data);
    }
}

impl FsiBus for MockFsi {
    fn read(&mut self, addr: u32) -> Result<u32, Error> {
        self.log.record(Operation::Read {
            addr: u64::from(addr),
        });
        Ok(self.registers.get(&addr).copied().unwrap_or(0))
    }

    fn write(&mut self, addr: u32, data: u32) -> Result<(), Error> {
        self.log.record(Operation::Write {
            addr: u64::from(addr),
            data: u64::from(data),
        });
        self.registers.insert(addr, data);
        Ok(())
    }
}

/// A probe hook that always reports the configured presence and counts how
/// often it ran.
pub struct MockProbe {
    presence: Presence,
    calls: Rc<Cell<usize>>,
}

impl MockProbe {
    /// A probe reporting `presence` on every call.
    pub fn new(presence: Presence) -> Self {
        MockProbe {
            presence,
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Handle counting how often the probe ran.
    pub fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }
}

impl TargetProbe for MockProbe {
    fn probe(&mut self) -> Presence {
        self.calls.set(self.calls.get() + 1);
        self.presence
    }
}
