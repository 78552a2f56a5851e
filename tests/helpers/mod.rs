#![allow(dead_code)]

use submitter::error::ValidationIssue;
use submitter::farm::VirtualFarm;
use submitter::scene::{Scene, SceneNode};
use submitter::validate::RuleRegistry;
use submitter::Submitter;

// =============================================================================
// Node builders (all pass validation as built)
// =============================================================================

pub const CAMERA: &str = "/obj/cam1";
pub const SOP_TARGET: &str = "/obj/geo1/OUT";

pub fn camera() -> SceneNode {
    SceneNode::new(CAMERA, "cam")
}

pub fn sop_target() -> SceneNode {
    SceneNode::new(SOP_TARGET, "null")
}

pub fn geometry(path: &str) -> SceneNode {
    SceneNode::new(path, "geometry")
        .parm("soppath", SOP_TARGET)
        .parm("sopoutput", format!("$HIP/geo/{}.$F4.bgeo.sc", name(path)))
        .parm("trange", "normal")
        .parm("f1", 1)
        .parm("f2", 10)
        .parm("f3", 1)
        .parm("hf_houdini_pool", "sim")
}

pub fn mantra(path: &str) -> SceneNode {
    SceneNode::new(path, "ifd")
        .parm("soho_outputmode", 1)
        .parm("soho_diskfile", format!("$HIP/ifd/{}.$F4.ifd", name(path)))
        .parm("vm_picture", format!("$HIP/render/{}.$F4.exr", name(path)))
        .parm("camera", CAMERA)
        .parm("trange", "normal")
        .parm("f1", 1)
        .parm("f2", 10)
        .parm("f3", 1)
        .parm("hf_houdini_pool", "ifd")
        .parm("hf_mantra_pool", "render")
}

fn name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Scene with the camera and SOP target every builder refers to.
pub fn scene(nodes: Vec<SceneNode>) -> Scene {
    let mut all = vec![camera(), sop_target()];
    all.extend(nodes);
    Scene::new(all).expect("Test scene should be valid")
}

// =============================================================================
// Submitter
// =============================================================================

pub fn submitter(farm: VirtualFarm) -> Submitter {
    Submitter::new(Box::new(farm), RuleRegistry::default())
}

// =============================================================================
// Assertions
// =============================================================================

pub fn codes(issues: &[ValidationIssue]) -> Vec<&str> {
    issues.iter().map(|i| i.code.as_str()).collect()
}

pub fn assert_has_issue(issues: &[ValidationIssue], code: &str) {
    assert!(
        issues.iter().any(|i| i.code == code),
        "Expected issue {}, got: {:?}",
        code,
        issues
    );
}

pub fn assert_no_issues(issues: &[ValidationIssue]) {
    assert!(issues.is_empty(), "Expected no issues, got: {:?}", issues);
}
