//! Address translation
//!
//! Accesses are issued relative to some target deep in the tree, but the
//! transaction happens on the nearest ancestor of the bus class being
//! dispatched. Walking up to that ancestor, every intermediate target shifts
//! the address into its parent's coordinate space by adding its own base
//! address.

use crate::error::ModelError;

use super::{TargetId, TargetTree};

impl TargetTree {
    /// Resolve `addr`, relative to `start`, into the address space of the
    /// nearest ancestor (inclusive) of class `class`.
    ///
    /// Returns that ancestor together with the rewritten address. The walk
    /// is O(depth). Running out of parents first means the topology promises
    /// an ancestor it does not have, which is a model inconsistency rather
    /// than a transfer failure.
    pub fn translate(
        &self,
        start: TargetId,
        class: &str,
        mut addr: u64,
    ) -> Result<(TargetId, u64), ModelError> {
        let mut current = start;
        while !self.is_class(current, class) {
            let target = self.target(current);
            addr = addr.wrapping_add(target.address());
            tracing::trace!(
                "translate: {} contributes {:#x}, address now {:#x}",
                target.name(),
                target.address(),
                addr
            );

            current = match target.parent() {
                Some(parent) => parent,
                None => {
                    return Err(ModelError::NoAncestorOfClass {
                        start,
                        class: class.to_string(),
                    })
                }
            };
        }

        Ok((current, addr))
    }
}
