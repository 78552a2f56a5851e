//! Node adapter: the read-only view of the authoring tool's node network.
//!
//! `NodeAdapter` is the seam the host implements. `Scene` is the in-memory
//! implementation deserialized from a JSON scene description.

pub mod graph;
pub mod profile;
pub mod types;

use std::collections::HashMap;

pub use graph::SceneGraph;
pub use profile::{JobPlugin, KindProfile, profile};
pub use types::*;

use crate::error::SceneError;

/// Queryable, read-only interface over authoring-tool nodes. Nodes are
/// referenced by path. The core never mutates a node.
pub trait NodeAdapter {
    /// Kind of the node at `path`, or `None` if no such node exists.
    fn kind(&self, path: &str) -> Option<NodeKind>;

    /// Evaluated parameter value, or `None` if the node has no such parameter.
    fn parameter(&self, path: &str, name: &str) -> Option<ParamValue>;

    /// Direct upstream (input) nodes, in input order.
    fn upstream(&self, path: &str) -> Vec<String>;

    /// Direct downstream (output) nodes.
    fn downstream(&self, path: &str) -> Vec<String>;
}

/// In-memory node network.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    index: HashMap<String, usize>,
    outputs: HashMap<String, Vec<String>>,
}

impl Scene {
    pub fn new(nodes: Vec<SceneNode>) -> Result<Self, SceneError> {
        let mut index = HashMap::new();
        let mut outputs: HashMap<String, Vec<String>> = HashMap::new();

        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.path.clone(), i).is_some() {
                return Err(SceneError::DuplicateNode {
                    path: node.path.clone(),
                });
            }
        }

        // Outputs follow declaration order of the consuming nodes.
        for node in &nodes {
            for input in &node.inputs {
                outputs
                    .entry(input.clone())
                    .or_default()
                    .push(node.path.clone());
            }
        }

        Ok(Scene {
            nodes,
            index,
            outputs,
        })
    }

    pub fn node(&self, path: &str) -> Option<&SceneNode> {
        self.index.get(path).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }
}

impl NodeAdapter for Scene {
    fn kind(&self, path: &str) -> Option<NodeKind> {
        self.node(path)
            .map(|n| NodeKind::from_type_name(&n.node_type))
    }

    fn parameter(&self, path: &str, name: &str) -> Option<ParamValue> {
        self.node(path).and_then(|n| n.parms.get(name).cloned())
    }

    fn upstream(&self, path: &str) -> Vec<String> {
        self.node(path).map(|n| n.inputs.clone()).unwrap_or_default()
    }

    fn downstream(&self, path: &str) -> Vec<String> {
        self.outputs.get(path).cloned().unwrap_or_default()
    }
}

/// Deserialize a scene JSON string into a `Scene`.
pub fn parse(json: &str) -> Result<Scene, SceneError> {
    let file = serde_json::from_str::<SceneFile>(json)
        .map_err(|e| SceneError::Parse(e.to_string()))?;
    Scene::new(file.nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scene_with_inputs_and_parms() {
        let json = r#"{
            "nodes": [
                { "path": "/out/geo1", "type": "geometry", "parms": { "f1": 1, "f2": 24.0 } },
                { "path": "/out/mantra1", "type": "ifd", "inputs": ["/out/geo1"],
                  "parms": { "camera": "/obj/cam1", "soho_outputmode": true } }
            ]
        }"#;
        let scene = parse(json).expect("Should parse");
        assert_eq!(scene.kind("/out/mantra1"), Some(NodeKind::Mantra));
        assert_eq!(scene.upstream("/out/mantra1"), vec!["/out/geo1"]);
        assert_eq!(scene.downstream("/out/geo1"), vec!["/out/mantra1"]);
        assert_eq!(
            scene.parameter("/out/geo1", "f2").and_then(|v| v.as_i64()),
            Some(24)
        );
        assert!(scene.parameter("/out/mantra1", "soho_outputmode").unwrap().as_bool());
        assert_eq!(scene.kind("/out/missing"), None);
    }

    #[test]
    fn unsupported_type_maps_to_other() {
        let scene = Scene::new(vec![SceneNode::new("/obj/cam1", "cam")]).unwrap();
        assert_eq!(scene.kind("/obj/cam1"), Some(NodeKind::Other("cam".into())));
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let result = Scene::new(vec![
            SceneNode::new("/out/a", "geometry"),
            SceneNode::new("/out/a", "ifd"),
        ]);
        assert_eq!(
            result.unwrap_err(),
            SceneError::DuplicateNode {
                path: "/out/a".into()
            }
        );
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(parse("not json"), Err(SceneError::Parse(_))));
    }
}
