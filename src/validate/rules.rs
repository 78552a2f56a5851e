//! Rule catalogue. Each rule inspects one node and appends what it finds.
//!
//! Messages follow the wording artists already know from the farm
//! submitter's error dialog.

use std::sync::LazyLock;

use regex::Regex;

use crate::build::params::{self, Parms};
use crate::chunk::FrameSet;
use crate::error::ValidationIssue;
use crate::scene::{KindProfile, NodeAdapter, NodeKind};

/// Frame token (`$F`, `$F4`, `${F4}`) in the file name, and the extension.
static FRAME_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*[\\/][^\\/]*(\$\{?F[0-9]*\}?)[^\\/]*\.([^\\/.]*)$")
        .expect("frame path pattern is valid")
});

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    pub node: &'a str,
    pub kind: &'a NodeKind,
    pub profile: &'a KindProfile,
    pub adapter: &'a dyn NodeAdapter,
}

impl<'a> RuleContext<'a> {
    pub fn parms(&self) -> Parms<'a> {
        Parms {
            adapter: self.adapter,
            path: self.node,
        }
    }

    fn output(&self) -> String {
        self.parms().string(self.profile.output_parm)
    }

    fn is_default_output(&self, output: &str) -> bool {
        self.profile.default_output == Some(output)
    }

    /// Camera node path, when it names an existing node.
    fn camera(&self) -> Option<String> {
        let parm = self.profile.camera_parm?;
        let camera = self.parms().string(parm);
        (!camera.is_empty() && self.adapter.kind(&camera).is_some()).then_some(camera)
    }

    fn error(&self, code: &str, message: impl Into<String>) -> ValidationIssue {
        ValidationIssue::error(code, message, self.node)
    }

    fn warning(&self, code: &str, message: impl Into<String>) -> ValidationIssue {
        ValidationIssue::warning(code, message, self.node)
    }
}

pub type RuleFn = fn(&RuleContext<'_>, &mut Vec<ValidationIssue>);

// =============================================================================
// CAMERA
// =============================================================================

pub fn missing_camera(ctx: &RuleContext<'_>, issues: &mut Vec<ValidationIssue>) {
    if ctx.profile.camera_parm.is_some() && ctx.camera().is_none() {
        issues.push(ctx.error("R001", "Camera object does not exist"));
    }
}

pub fn camera_background_enabled(ctx: &RuleContext<'_>, issues: &mut Vec<ValidationIssue>) {
    let Some(camera) = ctx.camera() else {
        return;
    };
    let cam = Parms {
        adapter: ctx.adapter,
        path: &camera,
    };
    if cam.flag("vm_bgenable") && !cam.string("vm_background").is_empty() {
        issues.push(ctx.warning("R005", "Camera background image enabled"));
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

pub fn disabled_export(ctx: &RuleContext<'_>, issues: &mut Vec<ValidationIssue>) {
    if let Some(toggle) = ctx.profile.export_toggle {
        if !ctx.parms().flag(toggle) {
            issues.push(ctx.error("R002", "IFD export not enabled"));
        }
    }
}

pub fn default_output_path(ctx: &RuleContext<'_>, issues: &mut Vec<ValidationIssue>) {
    let output = ctx.output();
    if ctx.is_default_output(&output) {
        issues.push(ctx.warning(
            "R003",
            format!("Output path '{}' hasn't been changed from Houdini's default", output),
        ));
    }
}

pub fn missing_output_path(ctx: &RuleContext<'_>, issues: &mut Vec<ValidationIssue>) {
    if ctx.output().trim().is_empty() {
        issues.push(ctx.error("R006", "Missing filename"));
    }
}

pub fn malformed_frame_path(ctx: &RuleContext<'_>, issues: &mut Vec<ValidationIssue>) {
    let output = ctx.output();
    if output.is_empty() || ctx.is_default_output(&output) {
        return;
    }
    if !FRAME_PATH_RE.is_match(&output) {
        issues.push(ctx.warning(
            "R009",
            "Possible malformed output path. Needs to be something like \"filename.$F.ifd\"",
        ));
    }
}

pub fn wrong_output_extension(ctx: &RuleContext<'_>, issues: &mut Vec<ValidationIssue>) {
    let Some(expected) = ctx.profile.output_extension else {
        return;
    };
    let output = ctx.output();
    if output.is_empty() || ctx.is_default_output(&output) {
        return;
    }
    let file_name = output.rsplit(['/', '\\']).next().unwrap_or_default();
    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext);
    if extension != Some(expected) {
        issues.push(ctx.warning(
            "R010",
            format!("Incorrect file extension for output file, expected '.{}'", expected),
        ));
    }
}

// =============================================================================
// FARM
// =============================================================================

pub fn missing_pool(ctx: &RuleContext<'_>, issues: &mut Vec<ValidationIssue>) {
    let parms = ctx.parms();
    for parm in ctx.profile.pool_parms {
        let pool = parms.string(parm);
        if pool.is_empty() || pool == "none" {
            issues.push(ctx.error("R004", format!("No pool specified in '{}'", parm)));
        }
    }
}

pub fn missing_source_target(ctx: &RuleContext<'_>, issues: &mut Vec<ValidationIssue>) {
    let Some(parm) = ctx.profile.source_parm else {
        return;
    };
    let target = ctx.parms().string(parm);
    if target.is_empty() || ctx.adapter.kind(&target).is_none() {
        issues.push(ctx.error("R007", format!("Missing target node in '{}'", parm)));
    }
}

// =============================================================================
// FRAMES
// =============================================================================

/// Overridden frames are checked by `invalid_frame_override` instead.
pub fn missing_frame_range(ctx: &RuleContext<'_>, issues: &mut Vec<ValidationIssue>) {
    let parms = ctx.parms();
    if parms.flag("hf_override_frames") {
        return;
    }
    if parms.string("trange") == "off" {
        issues.push(ctx.error("R008", "No frame range specified"));
    } else if params::frames(&parms).is_none() {
        issues.push(ctx.error(
            "R008",
            "Invalid frame range: 'f1'/'f2' missing or step 'f3' below 1",
        ));
    }
}

pub fn invalid_frame_override(ctx: &RuleContext<'_>, issues: &mut Vec<ValidationIssue>) {
    let parms = ctx.parms();
    if !parms.flag("hf_override_frames") {
        return;
    }
    let frames = parms.string("hf_frames");
    if frames.parse::<FrameSet>().is_err() {
        issues.push(ctx.error(
            "R011",
            format!("Frame override '{}' is not a valid frame range", frames),
        ));
    }
}
