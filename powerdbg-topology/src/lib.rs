//! Hardware topology description schema
//!
//! Debugging a POWER system starts from a description of the hardware
//! topology: which chips sit on which FSI links, which bridges and buses hang
//! off them, and where each unit lives in its parent's address space. This
//! crate contains the schema structs for that description as it is handed to
//! `powerdbg` by the surrounding tooling, after the raw device tree has been
//! expanded.
//!
//! The schema is deliberately small. Each node carries its name, an optional
//! class and compatible identifier, an optional initial status, the address
//! it contributes during address translation, and its children. Everything
//! else about a node (backend transports, probe hooks) is attached at
//! runtime and never serialized.
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

/// An error that occurred while loading a topology description.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// The description is not valid YAML or does not match the schema.
    #[error("failed to parse the topology description")]
    Yaml(#[from] serde_yaml::Error),
}

/// Initial status attribute of a topology node.
///
/// Follows the device tree convention: nodes without a status are treated as
/// okay, and a node marked `disabled` is never probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// The hardware is assumed functional.
    Okay,
    /// The hardware is known absent or must not be touched.
    Disabled,
}

/// One node of the hardware topology description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopologyNode {
    /// Node name, unique among its siblings.
    pub name: String,

    /// Class of the hardware entity this node models (`"pib"`, `"core"`, …).
    ///
    /// Descriptions may omit the class and rely on the consumer resolving it
    /// from the compatible identifier instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    /// Compatible identifier naming the concrete hardware unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatible: Option<String>,

    /// Initial status attribute, if the description carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,

    /// Base address this node contributes when an access is translated
    /// through it into an ancestor's address space.
    #[serde(default)]
    pub address: u64,

    /// Child nodes, in bus order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TopologyNode>,
}

impl TopologyNode {
    /// Create a bare node with the given name and no further attributes.
    pub fn new(name: impl Into<String>) -> Self {
        TopologyNode {
            name: name.into(),
            class: None,
            compatible: None,
            status: None,
            address: 0,
            children: Vec::new(),
        }
    }
}

/// Parse a YAML topology description into its root node.
pub fn from_yaml(yaml: &str) -> Result<TopologyNode, TopologyError> {
    Ok(serde_yaml::from_str(yaml)?)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_minimal_description() {
        let root = from_yaml("name: root").unwrap();

        assert_eq!(root, TopologyNode::new("root"));
    }

    #[test]
    fn parse_nested_description() {
        let yaml = r#"
name: root
children:
  - name: fsi0
    class: fsi
    children:
      - name: pib
        compatible: ibm,fsi-pib
        address: 0x1000
        status: disabled
"#;

        let root = from_yaml(yaml).unwrap();

        assert_eq!(root.children.len(), 1);
        let fsi = &root.children[0];
        assert_eq!(fsi.class.as_deref(), Some("fsi"));

        let pib = &fsi.children[0];
        assert_eq!(pib.compatible.as_deref(), Some("ibm,fsi-pib"));
        assert_eq!(pib.address, 0x1000);
        assert_eq!(pib.status, Some(NodeStatus::Disabled));
        assert!(pib.children.is_empty());
    }

    #[test]
    fn serialization_round_trips() {
        let mut root = TopologyNode::new("root");
        let mut pib = TopologyNode::new("pib");
        pib.class = Some("pib".into());
        pib.address = 0xa0000;
        root.children.push(pib);

        let yaml = serde_yaml::to_string(&root).unwrap();
        let parsed = from_yaml(&yaml).unwrap();

        assert_eq!(parsed, root);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(from_yaml("name: root\nfrequency: 1200").is_err());
    }
}
