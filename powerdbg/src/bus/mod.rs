//! Bus access dispatch
//!
//! Three bus kinds carry register traffic: the PIB (the processor's
//! register interconnect, 64-bit addresses and data), the OPB (the on-chip
//! peripheral bridge) and FSI (the service interface link), both 32-bit.
//! A read or write names an arbitrary target plus an address relative to it;
//! dispatch translates the pair up to the owning bus-kind target and
//! forwards it to that target's backend.
//!
//! The backends themselves live outside this crate, behind the [`PibBus`],
//! [`OpbBus`] and [`FsiBus`] traits. Dispatch never retries a failed
//! transfer; the only multi-transaction sequence is the PIB's indirect
//! access protocol, entered when bit 0 (MSB0 numbering) of the translated
//! address is set.

pub(crate) mod indirect;

use crate::error::{Error, ModelError};
use crate::target::{TargetId, TargetTree};

const PIB_CLASS: &str = "pib";
const OPB_CLASS: &str = "opb";
const FSI_CLASS: &str = "fsi";

/// Backend transport for a PIB instance.
pub trait PibBus {
    /// Read the 64-bit register at `addr`.
    fn read(&mut self, addr: u64) -> Result<u64, Error>;
    /// Write the 64-bit register at `addr`.
    fn write(&mut self, addr: u64, data: u64) -> Result<(), Error>;
}

/// Backend transport for an OPB bridge instance.
pub trait OpbBus {
    /// Read the 32-bit register at `addr`.
    fn read(&mut self, addr: u32) -> Result<u32, Error>;
    /// Write the 32-bit register at `addr`.
    fn write(&mut self, addr: u32, data: u32) -> Result<(), Error>;
}

/// Backend transport for an FSI slave instance.
pub trait FsiBus {
    /// Read the 32-bit register at `addr`.
    fn read(&mut self, addr: u32) -> Result<u32, Error>;
    /// Write the 32-bit register at `addr`.
    fn write(&mut self, addr: u32, data: u32) -> Result<(), Error>;
}

/// Transport capability attached to a bus-kind target.
pub enum BusInterface {
    /// The target is a PIB instance.
    Pib(Box<dyn PibBus>),
    /// The target is an OPB bridge instance.
    Opb(Box<dyn OpbBus>),
    /// The target is an FSI slave instance.
    Fsi(Box<dyn FsiBus>),
}

impl TargetTree {
    /// Attach a bus backend to a target. Replaces any previous backend.
    pub fn set_bus_interface(&mut self, id: TargetId, bus: BusInterface) {
        self.target_mut(id).bus = Some(bus);
    }

    /// Read a PIB register at `addr`, relative to `target`.
    pub fn pib_read(&mut self, target: TargetId, addr: u64) -> Result<u64, Error> {
        let (pib, addr) = self.translate(target, PIB_CLASS, addr)?;
        let bus = self.pib_interface(pib)?;
        if indirect::is_indirect(addr) {
            indirect::read(bus, addr)
        } else {
            bus.read(addr)
        }
    }

    /// Write a PIB register at `addr`, relative to `target`.
    pub fn pib_write(&mut self, target: TargetId, addr: u64, data: u64) -> Result<(), Error> {
        let (pib, addr) = self.translate(target, PIB_CLASS, addr)?;
        let bus = self.pib_interface(pib)?;
        if indirect::is_indirect(addr) {
            indirect::write(bus, addr, data)
        } else {
            bus.write(addr, data)
        }
    }

    /// Read an OPB register at `addr`, relative to `target`.
    pub fn opb_read(&mut self, target: TargetId, addr: u32) -> Result<u32, Error> {
        let (opb, addr) = self.translate(target, OPB_CLASS, u64::from(addr))?;
        let addr = narrow(addr, OPB_CLASS)?;
        self.opb_interface(opb)?.read(addr)
    }

    /// Write an OPB register at `addr`, relative to `target`.
    pub fn opb_write(&mut self, target: TargetId, addr: u32, data: u32) -> Result<(), Error> {
        let (opb, addr) = self.translate(target, OPB_CLASS, u64::from(addr))?;
        let addr = narrow(addr, OPB_CLASS)?;
        self.opb_interface(opb)?.write(addr, data)
    }

    /// Read an FSI register at `addr`, relative to `target`.
    pub fn fsi_read(&mut self, target: TargetId, addr: u32) -> Result<u32, Error> {
        let (fsi, addr) = self.translate(target, FSI_CLASS, u64::from(addr))?;
        let addr = narrow(addr, FSI_CLASS)?;
        self.fsi_interface(fsi)?.read(addr)
    }

    /// Write an FSI register at `addr`, relative to `target`.
    pub fn fsi_write(&mut self, target: TargetId, addr: u32, data: u32) -> Result<(), Error> {
        let (fsi, addr) = self.translate(target, FSI_CLASS, u64::from(addr))?;
        let addr = narrow(addr, FSI_CLASS)?;
        self.fsi_interface(fsi)?.write(addr, data)
    }

    fn pib_interface(&mut self, id: TargetId) -> Result<&mut dyn PibBus, Error> {
        match self.target_mut(id).bus.as_mut() {
            Some(BusInterface::Pib(bus)) => Ok(bus.as_mut()),
            _ => Err(ModelError::NoBusInterface {
                target: id,
                bus: PIB_CLASS,
            }
            .into()),
        }
    }

    fn opb_interface(&mut self, id: TargetId) -> Result<&mut dyn OpbBus, Error> {
        match self.target_mut(id).bus.as_mut() {
            Some(BusInterface::Opb(bus)) => Ok(bus.as_mut()),
            _ => Err(ModelError::NoBusInterface {
                target: id,
                bus: OPB_CLASS,
            }
            .into()),
        }
    }

    fn fsi_interface(&mut self, id: TargetId) -> Result<&mut dyn FsiBus, Error> {
        match self.target_mut(id).bus.as_mut() {
            Some(BusInterface::Fsi(bus)) => Ok(bus.as_mut()),
            _ => Err(ModelError::NoBusInterface {
                target: id,
                bus: FSI_CLASS,
            }
            .into()),
        }
    }
}

fn narrow(addr: u64, bus: &'static str) -> Result<u32, ModelError> {
    u32::try_from(addr).map_err(|_| ModelError::AddressOutOfRange { address: addr, bus })
}

#[cfg(test)]
mod test {
    use powerdbg_topology::TopologyNode;
    use pretty_assertions::assert_eq;

    use crate::error::ModelError;
    use crate::target::{TargetId, TargetTree};
    use crate::testing::{MockFsi, MockOpb, MockPib, Operation};

    use super::BusInterface;

    fn bus_tree(class: &str, address: u64) -> (TargetTree, TargetId, TargetId) {
        let mut unit = TopologyNode::new("unit0");
        unit.class = Some("core".into());
        unit.address = address;
        let mut bus = TopologyNode::new(class);
        bus.class = Some(class.into());
        bus.children.push(unit);
        let mut root = TopologyNode::new("root");
        root.children.push(bus);

        let tree = TargetTree::from_topology(&root);
        let bus = tree.targets_of_class(class).next().unwrap();
        let unit = tree.targets_of_class("core").next().unwrap();
        (tree, bus, unit)
    }

    #[test]
    fn direct_read_issues_exactly_one_transaction() {
        let (mut tree, pib, core) = bus_tree("pib", 0);
        let mut backend = MockPib::new();
        backend.set_register(0x10, 0xBEEF);
        let log = backend.log();
        tree.set_bus_interface(pib, BusInterface::Pib(Box::new(backend)));

        assert_eq!(tree.pib_read(core, 0x10).unwrap(), 0xBEEF);
        assert_eq!(log.snapshot(), vec![Operation::Read { addr: 0x10 }]);
    }

    #[test]
    fn direct_write_is_forwarded_untouched() {
        let (mut tree, pib, core) = bus_tree("pib", 0x000a_0000);
        let backend = MockPib::new();
        let log = backend.log();
        tree.set_bus_interface(pib, BusInterface::Pib(Box::new(backend)));

        tree.pib_write(core, 0x12, 0x1122).unwrap();

        assert_eq!(
            log.snapshot(),
            vec![Operation::Write {
                addr: 0x000a_0012,
                data: 0x1122,
            }]
        );
    }

    #[test]
    fn opb_access_translates_then_forwards() {
        let (mut tree, opb, unit) = bus_tree("opb", 0x2000);
        let mut backend = MockOpb::new();
        backend.set_register(0x2004, 0x1234_5678);
        let log = backend.log();
        tree.set_bus_interface(opb, BusInterface::Opb(Box::new(backend)));

        assert_eq!(tree.opb_read(unit, 0x4).unwrap(), 0x1234_5678);
        tree.opb_write(unit, 0x8, 1).unwrap();
        assert_eq!(
            log.snapshot(),
            vec![
                Operation::Read { addr: 0x2004 },
                Operation::Write {
                    addr: 0x2008,
                    data: 1,
                },
            ]
        );
    }

    #[test]
    fn fsi_access_translates_then_forwards() {
        let (mut tree, fsi, unit) = bus_tree("fsi", 0x800);
        let mut backend = MockFsi::new();
        backend.set_register(0x834, 0xc0de);
        tree.set_bus_interface(fsi, BusInterface::Fsi(Box::new(backend)));

        assert_eq!(tree.fsi_read(unit, 0x34).unwrap(), 0xc0de);
    }

    #[test]
    fn overflowing_a_narrow_bus_is_a_model_error() {
        let (mut tree, opb, unit) = bus_tree("opb", 0x1_0000_0000);
        tree.set_bus_interface(opb, BusInterface::Opb(Box::new(MockOpb::new())));

        let err = tree.opb_read(unit, 0x4).unwrap_err();

        assert_eq!(
            err.as_model_error(),
            Some(&ModelError::AddressOutOfRange {
                address: 0x1_0000_0004,
                bus: "opb",
            })
        );
    }

    #[test]
    fn missing_backend_is_a_model_error() {
        let (mut tree, pib, core) = bus_tree("pib", 0);

        let err = tree.pib_read(core, 0x10).unwrap_err();

        assert_eq!(
            err.as_model_error(),
            Some(&ModelError::NoBusInterface {
                target: pib,
                bus: "pib",
            })
        );
    }

    #[test]
    fn wrong_backend_kind_is_a_model_error() {
        let (mut tree, pib, core) = bus_tree("pib", 0);
        tree.set_bus_interface(pib, BusInterface::Fsi(Box::new(MockFsi::new())));

        assert!(tree.pib_read(core, 0x10).unwrap_err().as_model_error().is_some());
    }
}
