//! The target tree
//!
//! Every addressable hardware entity of the machine is modeled as a target:
//! a node in a tree mirroring the expanded topology description. Targets own
//! their children; the parent link is a back-reference by [`TargetId`] so a
//! target is reachable both from the root and from any of its descendants.
//!
//! Most operations take the [`TargetTree`] plus a [`TargetId`] rather than a
//! node reference. Ids are cheap to copy, survive mutation of unrelated
//! parts of the tree, and keep ownership of the nodes in one place.

mod class;
mod translate;

pub use class::TargetClass;

use std::fmt;

use powerdbg_topology::{NodeStatus, TopologyNode};

use crate::bus::BusInterface;
use crate::error::ModelError;
use crate::probe::TargetProbe;
use crate::registry;

/// Handle identifying one target within a [`TargetTree`].
///
/// Ids are minted by the tree that owns the target and are only meaningful
/// for that tree. Indexing a tree with an id minted by another tree is a
/// caller bug and may panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(usize);

/// Whether a target is believed to exist on the live machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetStatus {
    /// The target has not been ruled out. Freshly built trees start here
    /// unless the description says otherwise.
    #[default]
    Active,
    /// The target, or an ancestor of it, is confirmed absent or must not be
    /// touched.
    Disabled,
}

/// One node of the target tree.
pub struct Target {
    pub(crate) name: String,
    pub(crate) class: Option<String>,
    pub(crate) compatible: Option<String>,
    pub(crate) status: TargetStatus,
    pub(crate) address: u64,
    pub(crate) parent: Option<TargetId>,
    pub(crate) children: Vec<TargetId>,
    pub(crate) bus: Option<BusInterface>,
    pub(crate) probe: Option<Box<dyn TargetProbe>>,
}

impl Target {
    /// Node name, unique among its siblings.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class this target belongs to, or `None` if the description did not
    /// resolve to a modeled hardware unit.
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Compatible identifier of the hardware unit this target models.
    pub fn compatible(&self) -> Option<&str> {
        self.compatible.as_deref()
    }

    /// Current status of the target.
    pub fn status(&self) -> TargetStatus {
        self.status
    }

    /// Address this target contributes when an access is translated through
    /// it into an ancestor's address space.
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Parent of this target; `None` only for the root.
    pub fn parent(&self) -> Option<TargetId> {
        self.parent
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("compatible", &self.compatible)
            .field("status", &self.status)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// The tree of hardware targets plus its class registry.
///
/// Built once from the expanded topology description and kept for the
/// lifetime of the debug session. Targets are never removed; a target that
/// turns out not to exist is [disabled](TargetStatus::Disabled) in place.
///
/// The tree is not internally synchronized. A caller that shares it between
/// threads must serialize all tree operations and bus transactions
/// externally.
#[derive(Debug)]
pub struct TargetTree {
    targets: Vec<Target>,
    root: TargetId,
    classes: Vec<TargetClass>,
}

impl TargetTree {
    /// Build the target tree from an expanded topology description.
    ///
    /// The description's root node becomes the root target. Nodes without an
    /// explicit class are resolved against the built-in hardware unit table
    /// by their compatible identifier; nodes that resolve to nothing stay in
    /// the tree but are inert. Bus backends and probe hooks are attached
    /// afterwards with [`TargetTree::set_bus_interface`] and
    /// [`TargetTree::set_probe`].
    pub fn from_topology(topology: &TopologyNode) -> Self {
        let mut tree = TargetTree {
            targets: Vec::new(),
            root: TargetId(0),
            classes: Vec::new(),
        };

        let mut stack = vec![(topology, None)];
        while let Some((node, parent)) = stack.pop() {
            let id = tree.insert(node, parent);
            for child in node.children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        tree
    }

    fn insert(&mut self, node: &TopologyNode, parent: Option<TargetId>) -> TargetId {
        let class = node.class.clone().or_else(|| {
            node.compatible
                .as_deref()
                .and_then(registry::find_compatible_unit)
                .map(|unit| unit.template.class.to_string())
        });
        let status = match node.status {
            Some(NodeStatus::Disabled) => TargetStatus::Disabled,
            _ => TargetStatus::Active,
        };

        let id = TargetId(self.targets.len());
        self.targets.push(Target {
            name: node.name.clone(),
            class: class.clone(),
            compatible: node.compatible.clone(),
            status,
            address: node.address,
            parent,
            children: Vec::new(),
            bus: None,
            probe: None,
        });

        if let Some(parent) = parent {
            self.targets[parent.0].children.push(id);
        }
        if let Some(class) = class {
            self.get_or_create_class(&class).add(id);
        }

        id
    }

    /// The root target. It owns the whole tree transitively.
    pub fn root(&self) -> TargetId {
        self.root
    }

    /// Borrow a target.
    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.0]
    }

    pub(crate) fn target_mut(&mut self, id: TargetId) -> &mut Target {
        &mut self.targets[id.0]
    }

    /// Parent of a target; `None` only for the root.
    pub fn parent(&self, id: TargetId) -> Option<TargetId> {
        self.target(id).parent
    }

    /// Parent of a target, where the caller knows one must exist.
    ///
    /// Asking for the parent of the root is a model inconsistency, not a
    /// lookup miss.
    pub fn require_parent(&self, id: TargetId) -> Result<TargetId, ModelError> {
        self.parent(id).ok_or(ModelError::NoParent(id))
    }

    /// Whether the target belongs to the named class. `false` for targets
    /// with no resolved class.
    pub fn is_class(&self, id: TargetId, class: &str) -> bool {
        self.target(id).class() == Some(class)
    }

    /// Slash-separated path of the target from the root.
    pub fn path(&self, id: TargetId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let target = self.target(id);
            if target.parent.is_some() {
                names.push(target.name.as_str());
            }
            current = target.parent;
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// Children of a target, in bus order.
    pub fn children(&self, id: TargetId) -> impl Iterator<Item = TargetId> + '_ {
        self.target(id).children.iter().copied()
    }

    /// All targets in pre-order: every target exactly once, parent before
    /// children.
    pub fn targets(&self) -> Targets<'_> {
        Targets {
            tree: self,
            stack: vec![self.root],
        }
    }

    /// Targets belonging to the named class, in insertion order. Empty if
    /// the class does not exist.
    pub fn targets_of_class<'a>(&'a self, name: &str) -> impl Iterator<Item = TargetId> + 'a {
        self.find_class(name)
            .into_iter()
            .flat_map(|class| class.targets())
    }
}

/// Pre-order iterator over a [`TargetTree`], returned by
/// [`TargetTree::targets`].
pub struct Targets<'a> {
    tree: &'a TargetTree,
    stack: Vec<TargetId>,
}

impl Iterator for Targets<'_> {
    type Item = TargetId;

    fn next(&mut self) -> Option<TargetId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.target(id).children.iter().rev().copied());
        Some(id)
    }
}
