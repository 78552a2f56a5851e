//! Node kinds, parameter values and the JSON scene description.
//!
//! The scene format is what hosts export when they hand their ROP network to
//! the submitter as data instead of through a live adapter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// NODE KIND
// =============================================================================

/// Kind of render-producing node. Anything the submitter cannot turn into a
/// farm job (cameras, SOPs, unknown ROP types) is `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Mantra,
    Geometry,
    Alembic,
    IfdArchive,
    Comp,
    Channel,
    BakeTexture,
    /// `baketexture::3.0`: bakes through Mantra, so it is submitted like a
    /// Mantra render.
    BakeTextureV3,
    OpenGl,
    Dop,
    Other(String),
}

impl NodeKind {
    pub const SUPPORTED: [NodeKind; 10] = [
        NodeKind::Mantra,
        NodeKind::Geometry,
        NodeKind::Alembic,
        NodeKind::IfdArchive,
        NodeKind::Comp,
        NodeKind::Channel,
        NodeKind::BakeTexture,
        NodeKind::BakeTextureV3,
        NodeKind::OpenGl,
        NodeKind::Dop,
    ];

    /// Map a host node type name onto a kind.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "ifd" => NodeKind::Mantra,
            "geometry" | "rop_geometry" => NodeKind::Geometry,
            "alembic" | "rop_alembic" => NodeKind::Alembic,
            "ifdarchive" => NodeKind::IfdArchive,
            "comp" => NodeKind::Comp,
            "channel" => NodeKind::Channel,
            "baketexture" => NodeKind::BakeTexture,
            "baketexture::3.0" => NodeKind::BakeTextureV3,
            "opengl" => NodeKind::OpenGl,
            "dop" => NodeKind::Dop,
            other => NodeKind::Other(other.to_string()),
        }
    }

    /// Canonical host type name.
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::Mantra => "ifd",
            NodeKind::Geometry => "geometry",
            NodeKind::Alembic => "alembic",
            NodeKind::IfdArchive => "ifdarchive",
            NodeKind::Comp => "comp",
            NodeKind::Channel => "channel",
            NodeKind::BakeTexture => "baketexture",
            NodeKind::BakeTextureV3 => "baketexture::3.0",
            NodeKind::OpenGl => "opengl",
            NodeKind::Dop => "dop",
            NodeKind::Other(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, NodeKind::Other(_))
    }
}

impl From<String> for NodeKind {
    fn from(name: String) -> Self {
        NodeKind::from_type_name(&name)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.type_name().to_string()
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

// =============================================================================
// PARAMETER VALUES
// =============================================================================

/// An evaluated node parameter. Conversions follow the host's lenient
/// `evalAsInt` / `evalAsString` behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ParamValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Bool(b) => Some(i64::from(*b)),
            ParamValue::Int(i) => Some(*i),
            ParamValue::Float(f) => Some(f.round() as i64),
            ParamValue::String(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            ParamValue::String(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_bool(&self) -> bool {
        self.as_i64().is_some_and(|v| v != 0)
    }

    pub fn as_string(&self) -> String {
        match self {
            ParamValue::Bool(b) => i64::from(*b).to_string(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::String(s) => s.clone(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

// =============================================================================
// SCENE DESCRIPTION
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    pub nodes: Vec<SceneNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Upstream node paths, in input order.
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub parms: BTreeMap<String, ParamValue>,
}

impl SceneNode {
    pub fn new(path: &str, node_type: &str) -> Self {
        SceneNode {
            path: path.into(),
            node_type: node_type.into(),
            inputs: Vec::new(),
            parms: BTreeMap::new(),
        }
    }

    pub fn input(mut self, path: &str) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn parm(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.parms.insert(name.into(), value.into());
        self
    }
}
