//! Built-in hardware units
//!
//! The tree-expansion tooling turns topology nodes into concrete targets by
//! matching each node's compatible identifier against this table. The table
//! is fixed at build time; there is no runtime registration.

/// Canonical settings for targets instantiated from a hardware unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetTemplate {
    /// Class the instantiated target belongs to.
    pub class: &'static str,
    /// Compatible identifier the unit answers to.
    pub compatible: &'static str,
}

/// Descriptor pairing a hardware unit with its canonical target template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareUnit {
    /// Short unit name, for diagnostics.
    pub name: &'static str,
    /// Template for targets modeling this unit.
    pub template: TargetTemplate,
}

const fn unit(name: &'static str, class: &'static str, compatible: &'static str) -> HardwareUnit {
    HardwareUnit {
        name,
        template: TargetTemplate { class, compatible },
    }
}

/// Every hardware unit this library knows how to address.
static HARDWARE_UNITS: &[HardwareUnit] = &[
    unit("kernel_fsi", "fsi", "ibm,kernel-fsi"),
    unit("kernel_pib", "pib", "ibm,kernel-pib"),
    unit("fsi2pib", "pib", "ibm,fsi-pib"),
    unit("pib2opb", "opb", "ibm,pib2opb"),
    unit("power9_fsi", "fsi", "ibm,power9-fsi"),
    unit("power9_chiplet", "chiplet", "ibm,power9-chiplet"),
    unit("power9_core", "core", "ibm,power9-core"),
    unit("power9_thread", "thread", "ibm,power9-thread"),
    unit("power9_adu", "adu", "ibm,power9-adu"),
];

/// The hardware unit table, in registration order.
pub fn hardware_units() -> impl Iterator<Item = &'static HardwareUnit> {
    HARDWARE_UNITS.iter()
}

/// Find the first hardware unit whose template answers to `compatible`.
pub fn find_compatible_unit(compatible: &str) -> Option<&'static HardwareUnit> {
    HARDWARE_UNITS
        .iter()
        .find(|unit| unit.template.compatible == compatible)
}
