//! Probing live hardware
//!
//! A topology description names every target that might exist; the machine
//! decides which ones actually do. A target that can be checked carries a
//! [`TargetProbe`] hook, attached by the surrounding tooling together with
//! the bus backends. [`TargetTree::probe_all`] runs the hooks over the whole
//! tree and disables the subtrees that could not be confirmed, leaving the
//! rest untouched.

use crate::target::{TargetId, TargetStatus, TargetTree};

/// Result of probing for a piece of hardware.
///
/// `Absent` is ordinary input to the probe pass, not a failure: a dead core
/// or an unpopulated socket is something the tree records, not something it
/// reports to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The hardware responded; the target is real.
    Present,
    /// The hardware could not be confirmed.
    Absent,
}

/// Capability to check whether the hardware a target models is present.
///
/// Implementations own whatever transport access they need; the tree calls
/// them with no further context.
pub trait TargetProbe {
    /// Check the hardware. Called at most once per [`TargetTree::probe_all`]
    /// pass, and never again once the target is disabled.
    fn probe(&mut self) -> Presence;
}

impl TargetTree {
    /// Attach a probe hook to a target. Replaces any previous hook.
    pub fn set_probe(&mut self, id: TargetId, probe: Box<dyn TargetProbe>) {
        self.target_mut(id).probe = Some(probe);
    }

    /// Walk the tree root down, disabling targets which might exist but
    /// don't.
    ///
    /// Every target is visited exactly once, parent before children. A
    /// target with no resolved class is skipped. A target that is already
    /// disabled, or whose probe reports [`Presence::Absent`], is disabled
    /// together with its whole subtree; descendants are not probed once
    /// their ancestor is gone. Disabling is monotonic, so running the pass
    /// twice on an unchanged tree reaches the same state.
    pub fn probe_all(&mut self) {
        let order: Vec<TargetId> = self.targets().collect();
        for id in order {
            self.probe_target(id);
        }
    }

    fn probe_target(&mut self, id: TargetId) {
        if self.target(id).class().is_none() {
            tracing::debug!("probe {}: target not modeled", self.path(id));
            return;
        }

        let disabled = self.target(id).status() == TargetStatus::Disabled;
        let absent = !disabled
            && match self.target_mut(id).probe.as_mut() {
                Some(probe) => probe.probe() == Presence::Absent,
                None => false,
            };

        if disabled || absent {
            tracing::debug!(
                "probe {}: {}",
                self.path(id),
                if absent { "not found" } else { "disabled" }
            );
            self.disable_subtree(id);
        } else {
            tracing::debug!("probe {}: success", self.path(id));
        }
    }

    /// Disable a target and every target below it, replacing any status the
    /// descendants had.
    fn disable_subtree(&mut self, id: TargetId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            self.target_mut(id).status = TargetStatus::Disabled;
            stack.extend(self.children(id));
        }
    }
}

#[cfg(test)]
mod test {
    use powerdbg_topology::{NodeStatus, TopologyNode};
    use pretty_assertions::assert_eq;

    use crate::target::{TargetStatus, TargetTree};
    use crate::testing::MockProbe;

    use super::Presence;

    fn node(name: &str, class: Option<&str>, children: Vec<TopologyNode>) -> TopologyNode {
        let mut node = TopologyNode::new(name);
        node.class = class.map(String::from);
        node.children = children;
        node
    }

    fn statuses(tree: &TargetTree) -> Vec<(String, TargetStatus)> {
        tree.targets()
            .map(|id| (tree.path(id), tree.target(id).status()))
            .collect()
    }

    #[test]
    fn absent_probe_disables_the_whole_subtree() {
        let topology = node(
            "root",
            Some("system"),
            vec![node(
                "core0",
                Some("core"),
                vec![
                    node("thread0", Some("thread"), vec![]),
                    node("thread1", Some("thread"), vec![]),
                ],
            )],
        );
        let mut tree = TargetTree::from_topology(&topology);
        let core = tree.targets_of_class("core").next().unwrap();
        tree.set_probe(core, Box::new(MockProbe::new(Presence::Absent)));

        // The threads insist they are present; the dead parent wins anyway.
        for thread in tree.targets_of_class("thread").collect::<Vec<_>>() {
            tree.set_probe(thread, Box::new(MockProbe::new(Presence::Present)));
        }

        tree.probe_all();

        assert_eq!(
            statuses(&tree),
            vec![
                ("/".to_string(), TargetStatus::Active),
                ("/core0".to_string(), TargetStatus::Disabled),
                ("/core0/thread0".to_string(), TargetStatus::Disabled),
                ("/core0/thread1".to_string(), TargetStatus::Disabled),
            ]
        );
    }

    #[test]
    fn present_targets_are_left_untouched() {
        let topology = node(
            "root",
            Some("system"),
            vec![node("core0", Some("core"), vec![])],
        );
        let mut tree = TargetTree::from_topology(&topology);
        let core = tree.targets_of_class("core").next().unwrap();
        let probe = MockProbe::new(Presence::Present);
        let calls = probe.calls();
        tree.set_probe(core, Box::new(probe));

        tree.probe_all();

        assert_eq!(calls.get(), 1);
        assert_eq!(tree.target(core).status(), TargetStatus::Active);
    }

    #[test]
    fn probing_is_idempotent() {
        let topology = node(
            "root",
            Some("system"),
            vec![
                node("core0", Some("core"), vec![]),
                node("core1", Some("core"), vec![]),
            ],
        );
        let mut tree = TargetTree::from_topology(&topology);
        let cores: Vec<_> = tree.targets_of_class("core").collect();
        tree.set_probe(cores[0], Box::new(MockProbe::new(Presence::Absent)));
        tree.set_probe(cores[1], Box::new(MockProbe::new(Presence::Present)));

        tree.probe_all();
        let first = statuses(&tree);
        tree.probe_all();

        assert_eq!(statuses(&tree), first);
        assert_eq!(tree.target(cores[0]).status(), TargetStatus::Disabled);
        assert_eq!(tree.target(cores[1]).status(), TargetStatus::Active);
    }

    #[test]
    fn disabled_targets_are_not_probed() {
        let mut dead = TopologyNode::new("core0");
        dead.class = Some("core".into());
        dead.status = Some(NodeStatus::Disabled);
        let topology = node("root", Some("system"), vec![dead]);
        let mut tree = TargetTree::from_topology(&topology);
        let core = tree.targets_of_class("core").next().unwrap();
        let probe = MockProbe::new(Presence::Present);
        let calls = probe.calls();
        tree.set_probe(core, Box::new(probe));

        tree.probe_all();

        assert_eq!(calls.get(), 0);
        assert_eq!(tree.target(core).status(), TargetStatus::Disabled);
    }

    #[test]
    fn unmodeled_targets_are_inert() {
        let topology = node(
            "root",
            Some("system"),
            vec![node("mystery", None, vec![])],
        );
        let mut tree = TargetTree::from_topology(&topology);
        let mystery = tree.children(tree.root()).next().unwrap();
        let probe = MockProbe::new(Presence::Absent);
        let calls = probe.calls();
        tree.set_probe(mystery, Box::new(probe));

        tree.probe_all();

        assert_eq!(calls.get(), 0);
        assert_eq!(tree.target(mystery).status(), TargetStatus::Active);
    }
}
