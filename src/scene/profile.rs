//! Per-kind parameter layout: which host parameters hold the output path,
//! camera, pools and so on for each supported node kind.

use serde::{Deserialize, Serialize};

use super::types::NodeKind;

/// Farm plugin that executes a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobPlugin {
    Houdini,
    Mantra,
}

impl JobPlugin {
    pub fn name(&self) -> &'static str {
        match self {
            JobPlugin::Houdini => "Houdini",
            JobPlugin::Mantra => "Mantra",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindProfile {
    /// Parameter holding the file the node writes (IFD path for Mantra).
    pub output_parm: &'static str,
    /// The host's unmodified default for `output_parm`.
    pub default_output: Option<&'static str>,
    pub output_extension: Option<&'static str>,
    /// Final rendered image for two-stage render kinds.
    pub render_output_parm: Option<&'static str>,
    pub camera_parm: Option<&'static str>,
    /// Toggle that must be on for the farm job to produce anything.
    pub export_toggle: Option<&'static str>,
    /// Parameter pointing at the network the node cooks.
    pub source_parm: Option<&'static str>,
    pub pool_parms: &'static [&'static str],
    /// Prefix of the `*_pool`, `*_priority`, ... farm parameters of the main job.
    pub parm_prefix: &'static str,
    pub plugin: JobPlugin,
}

const HOUDINI_POOLS: &[&str] = &["hf_houdini_pool"];

const GEOMETRY_LIKE: KindProfile = KindProfile {
    output_parm: "sopoutput",
    default_output: None,
    output_extension: None,
    render_output_parm: None,
    camera_parm: None,
    export_toggle: None,
    source_parm: None,
    pool_parms: HOUDINI_POOLS,
    parm_prefix: "hf_houdini",
    plugin: JobPlugin::Houdini,
};

const MANTRA: KindProfile = KindProfile {
    output_parm: "soho_diskfile",
    default_output: Some("$HIP/test.ifd"),
    output_extension: Some("ifd"),
    render_output_parm: Some("vm_picture"),
    camera_parm: Some("camera"),
    export_toggle: Some("soho_outputmode"),
    source_parm: None,
    pool_parms: &["hf_houdini_pool", "hf_mantra_pool"],
    parm_prefix: "hf_mantra",
    plugin: JobPlugin::Mantra,
};

const GEOMETRY: KindProfile = KindProfile {
    default_output: Some("$HIP/geo/$HIPNAME.$OS.$F.bgeo.sc"),
    source_parm: Some("soppath"),
    ..GEOMETRY_LIKE
};

const ALEMBIC: KindProfile = KindProfile {
    output_parm: "filename",
    default_output: Some("$HIP/output.abc"),
    ..GEOMETRY_LIKE
};

const IFD_ARCHIVE: KindProfile = KindProfile {
    output_parm: "soho_diskfile",
    default_output: Some("$HIP/test.ifd"),
    output_extension: Some("ifd"),
    ..GEOMETRY_LIKE
};

const COMP: KindProfile = KindProfile {
    output_parm: "copoutput",
    ..GEOMETRY_LIKE
};

const CHANNEL: KindProfile = KindProfile {
    output_parm: "chopoutput",
    ..GEOMETRY_LIKE
};

const BAKE_TEXTURE: KindProfile = KindProfile {
    output_parm: "vm_uvoutputpicture1",
    ..GEOMETRY_LIKE
};

const BAKE_TEXTURE_V3: KindProfile = KindProfile {
    render_output_parm: Some("vm_uvoutputpicture1"),
    ..MANTRA
};

const OPENGL: KindProfile = KindProfile {
    output_parm: "picture",
    camera_parm: Some("camera"),
    ..GEOMETRY_LIKE
};

const DOP: KindProfile = KindProfile {
    output_parm: "dopoutput",
    default_output: Some("$HIP/$OS.$SF.sim"),
    source_parm: Some("doppath"),
    ..GEOMETRY_LIKE
};

/// Parameter layout for a supported kind, `None` for `NodeKind::Other`.
pub fn profile(kind: &NodeKind) -> Option<&'static KindProfile> {
    let profile = match kind {
        NodeKind::Mantra => &MANTRA,
        NodeKind::Geometry => &GEOMETRY,
        NodeKind::Alembic => &ALEMBIC,
        NodeKind::IfdArchive => &IFD_ARCHIVE,
        NodeKind::Comp => &COMP,
        NodeKind::Channel => &CHANNEL,
        NodeKind::BakeTexture => &BAKE_TEXTURE,
        NodeKind::BakeTextureV3 => &BAKE_TEXTURE_V3,
        NodeKind::OpenGl => &OPENGL,
        NodeKind::Dop => &DOP,
        NodeKind::Other(_) => return None,
    };
    Some(profile)
}
