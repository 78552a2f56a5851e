//! Data-driven rule table: node kind → ordered rule list.

use std::collections::{BTreeMap, HashMap};

use super::rules::{self, RuleFn};
use crate::error::ConfigError;
use crate::scene::NodeKind;

/// Rule table as written in configuration: host type name → rule names.
pub type RuleTable = BTreeMap<String, Vec<String>>;

#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub check: RuleFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

pub const CATALOGUE: [Rule; 11] = [
    Rule { name: "MissingCamera", check: rules::missing_camera },
    Rule { name: "DisabledExport", check: rules::disabled_export },
    Rule { name: "DefaultOutputPath", check: rules::default_output_path },
    Rule { name: "MissingPool", check: rules::missing_pool },
    Rule { name: "CameraBackgroundEnabled", check: rules::camera_background_enabled },
    Rule { name: "MissingOutputPath", check: rules::missing_output_path },
    Rule { name: "MissingSourceTarget", check: rules::missing_source_target },
    Rule { name: "MissingFrameRange", check: rules::missing_frame_range },
    Rule { name: "MalformedFramePath", check: rules::malformed_frame_path },
    Rule { name: "WrongOutputExtension", check: rules::wrong_output_extension },
    Rule { name: "InvalidFrameOverride", check: rules::invalid_frame_override },
];

pub fn rule(name: &str) -> Option<Rule> {
    CATALOGUE.iter().find(|r| r.name == name).copied()
}

const FRAMES: &[&str] = &["MissingFrameRange", "InvalidFrameOverride"];

fn default_rules(kind: &NodeKind) -> Vec<&'static str> {
    let specific: &[&str] = match kind {
        NodeKind::Mantra | NodeKind::BakeTextureV3 => &[
            "DisabledExport",
            "MissingOutputPath",
            "DefaultOutputPath",
            "MalformedFramePath",
            "WrongOutputExtension",
            "MissingPool",
            "MissingCamera",
            "CameraBackgroundEnabled",
        ],
        NodeKind::OpenGl => &["MissingOutputPath", "MissingCamera", "CameraBackgroundEnabled"],
        NodeKind::IfdArchive => &[
            "MissingOutputPath",
            "DefaultOutputPath",
            "MalformedFramePath",
            "WrongOutputExtension",
        ],
        NodeKind::Geometry | NodeKind::Dop => &["MissingSourceTarget", "MissingOutputPath"],
        NodeKind::Alembic => &["MissingOutputPath", "DefaultOutputPath"],
        NodeKind::Comp | NodeKind::Channel | NodeKind::BakeTexture => &["MissingOutputPath"],
        NodeKind::Other(_) => return Vec::new(),
    };
    specific.iter().chain(FRAMES).copied().collect()
}

/// Rules to run per node kind, in order.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: HashMap<NodeKind, Vec<Rule>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        let rules = NodeKind::SUPPORTED
            .into_iter()
            .map(|kind| {
                let list = default_rules(&kind).into_iter().filter_map(rule).collect();
                (kind, list)
            })
            .collect();
        RuleRegistry { rules }
    }
}

impl RuleRegistry {
    /// Default table with the kinds named in `table` replaced.
    pub fn from_table(table: &RuleTable) -> Result<Self, ConfigError> {
        let mut registry = RuleRegistry::default();
        for (type_name, names) in table {
            let kind = NodeKind::from_type_name(type_name);
            if !kind.is_supported() {
                return Err(ConfigError::UnknownKind {
                    kind: type_name.clone(),
                });
            }
            let list = names
                .iter()
                .map(|name| {
                    rule(name).ok_or_else(|| ConfigError::UnknownRule {
                        kind: type_name.clone(),
                        rule: name.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            registry.rules.insert(kind, list);
        }
        Ok(registry)
    }

    pub fn rules_for(&self, kind: &NodeKind) -> &[Rule] {
        self.rules.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }
}
