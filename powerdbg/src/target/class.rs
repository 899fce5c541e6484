//! Target classes
//!
//! Classes tag targets with their role in the topology ("pib", "core", …)
//! and are what address translation matches against. The registry lives on
//! the tree, is populated lazily as targets are inserted, and never shrinks.

use crate::error::ModelError;

use super::{TargetId, TargetTree};

/// A named set of targets sharing a role in the topology.
#[derive(Debug)]
pub struct TargetClass {
    name: String,
    targets: Vec<TargetId>,
}

impl TargetClass {
    fn new(name: &str) -> Self {
        TargetClass {
            name: name.to_string(),
            targets: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, id: TargetId) {
        self.targets.push(id);
    }

    /// Name of the class.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Targets currently assigned to this class, in insertion order.
    pub fn targets(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.targets.iter().copied()
    }
}

impl TargetTree {
    /// Finds the given class. Returns `None` if it was never registered.
    pub fn find_class(&self, name: &str) -> Option<&TargetClass> {
        self.classes.iter().find(|class| class.name() == name)
    }

    /// Same as [`TargetTree::find_class`], except that a missing class is a
    /// model inconsistency: callers only require classes the topology schema
    /// guarantees to exist.
    pub fn require_class(&self, name: &str) -> Result<&TargetClass, ModelError> {
        self.find_class(name)
            .ok_or_else(|| ModelError::MissingClass(name.to_string()))
    }

    /// Returns the existing class or registers a new, empty one.
    pub fn get_or_create_class(&mut self, name: &str) -> &mut TargetClass {
        let index = match self.classes.iter().position(|class| class.name() == name) {
            Some(index) => index,
            None => {
                tracing::debug!("allocating target class {name}");
                self.classes.push(TargetClass::new(name));
                self.classes.len() - 1
            }
        };
        &mut self.classes[index]
    }
}
