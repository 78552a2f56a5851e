//! Resolve a node's `hf_*` submission parameters into `SubmissionParams`.

use crate::chunk::{ChunkPolicy, FrameRange, FrameSet};
use crate::job::{AdvancedOverrides, FarmSettings, SubmissionParams};
use crate::scene::{JobPlugin, KindProfile, NodeAdapter};

const DEFAULT_PRIORITY: i64 = 50;

/// Read the submission parameters of the node at `path`. Missing parameters
/// fall back to the farm's defaults; nothing here fails; problems surface
/// during validation and chunking.
pub fn resolve(adapter: &dyn NodeAdapter, path: &str, profile: &KindProfile) -> SubmissionParams {
    let parms = Parms { adapter, path };

    let job_name = match parms.string("hf_job_name") {
        name if name.is_empty() => path.to_string(),
        name => name,
    };

    let (output_path, ifd_path) = match profile.render_output_parm {
        Some(render) => (parms.non_empty(render), parms.non_empty(profile.output_parm)),
        None => (parms.non_empty(profile.output_parm), None),
    };

    SubmissionParams {
        job_name,
        comment: parms.string("hf_comment"),
        plugin: profile.plugin,
        frames: frames(&parms),
        farm: farm_settings(&parms, profile.parm_prefix),
        ifd_stage: (profile.plugin == JobPlugin::Mantra).then(|| farm_settings(&parms, "hf_houdini")),
        output_path,
        ifd_path,
        mantra_options: match profile.plugin {
            JobPlugin::Mantra => mantra_options(&parms.string("soho_pipecmd")),
            JobPlugin::Houdini => String::new(),
        },
        extra_dependencies: parms
            .string("hf_houdini_dependencies")
            .split(',')
            .map(str::trim)
            .filter(|dep| !dep.is_empty())
            .map(String::from)
            .collect(),
        submit_scene: parms.flag("hf_submit_scene"),
    }
}

/// The frames the job renders: the `hf_frames` override when enabled,
/// otherwise the node's own `f1`/`f2`/`f3` range.
pub fn frames(parms: &Parms<'_>) -> Option<FrameSet> {
    if parms.flag("hf_override_frames") {
        return parms.string("hf_frames").parse().ok();
    }
    let first = parms.int("f1")?;
    let last = parms.int("f2")?;
    let step = parms.int("f3").unwrap_or(1);
    FrameRange::new(first.min(last), first.max(last), step)
        .ok()
        .map(FrameSet::from)
}

/// Arguments after the program name of a `mantra ...` render command.
/// Other render commands carry no options for the farm's Mantra plugin.
fn mantra_options(command: &str) -> String {
    command
        .trim()
        .strip_prefix("mantra")
        .map(|rest| rest.trim().to_string())
        .unwrap_or_default()
}

fn farm_settings(parms: &Parms<'_>, prefix: &str) -> FarmSettings {
    let key = |suffix: &str| format!("{prefix}_{suffix}");

    let chunk_policy = match parms.string(&key("split_by")).as_str() {
        "chunks" => ChunkPolicy::FixedChunkCount(parms.int(&key("chunks")).unwrap_or(1)),
        "single" | "none" => ChunkPolicy::SingleChunk,
        _ => ChunkPolicy::FramesPerChunk(parms.int(&key("frames")).unwrap_or(1)),
    };

    FarmSettings {
        pool: parms.string(&key("pool")),
        secondary_pool: parms.string(&key("secondary_pool")),
        group: parms.string(&key("group")),
        priority: parms.int(&key("priority")).unwrap_or(DEFAULT_PRIORITY),
        chunk_policy,
        advanced: AdvancedOverrides {
            enable_auto_timeout: parms.flag(&key("enable_auto_timeout")),
            task_timeout_minutes: parms.int(&key("task_timeout")).unwrap_or(0),
            limit_tasks_to_cpus: parms.flag(&key("submit_limit_to_slave_limit")),
            concurrent_tasks: parms.int(&key("concurrent_tasks")).unwrap_or(1),
            machine_limit: parms.int(&key("machine_limit")).unwrap_or(0),
            limit_groups: parms.string(&key("limits")),
            machine_list: parms.string(&key("machine_list")),
            machine_list_is_blacklist: parms.flag(&key("submit_machine_list_is_blacklist")),
        },
    }
}

/// Typed parameter lookups on one node.
pub struct Parms<'a> {
    pub adapter: &'a dyn NodeAdapter,
    pub path: &'a str,
}

impl Parms<'_> {
    /// String value, empty when the parameter is missing.
    pub fn string(&self, name: &str) -> String {
        self.adapter
            .parameter(self.path, name)
            .map(|v| v.as_string())
            .unwrap_or_default()
    }

    pub fn non_empty(&self, name: &str) -> Option<String> {
        Some(self.string(name)).filter(|s| !s.is_empty())
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.adapter.parameter(self.path, name).and_then(|v| v.as_i64())
    }

    pub fn flag(&self, name: &str) -> bool {
        self.adapter
            .parameter(self.path, name)
            .is_some_and(|v| v.as_bool())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeKind, Scene, SceneNode, profile};

    fn resolve_single(node: SceneNode) -> SubmissionParams {
        let path = node.path.clone();
        let kind = NodeKind::from_type_name(&node.node_type);
        let scene = Scene::new(vec![node]).unwrap();
        resolve(&scene, &path, profile(&kind).unwrap())
    }

    #[test]
    fn geometry_params_from_houdini_prefix() {
        let params = resolve_single(
            SceneNode::new("/out/geo", "geometry")
                .parm("hf_job_name", "sim cache")
                .parm("hf_houdini_pool", "sim")
                .parm("hf_houdini_priority", 80)
                .parm("hf_houdini_split_by", "chunks")
                .parm("hf_houdini_chunks", 4)
                .parm("hf_houdini_dependencies", "abc, def,,")
                .parm("sopoutput", "$HIP/geo/out.$F.bgeo")
                .parm("f1", 1.0)
                .parm("f2", 48.0)
                .parm("f3", 1.0),
        );
        assert_eq!(params.job_name, "sim cache");
        assert_eq!(params.plugin, JobPlugin::Houdini);
        assert_eq!(params.farm.pool, "sim");
        assert_eq!(params.farm.priority, 80);
        assert_eq!(params.farm.chunk_policy, ChunkPolicy::FixedChunkCount(4));
        assert_eq!(params.extra_dependencies, vec!["abc", "def"]);
        assert_eq!(params.output_path.as_deref(), Some("$HIP/geo/out.$F.bgeo"));
        assert_eq!(params.frames, Some(FrameRange::new(1, 48, 1).unwrap().into()));
        assert!(params.ifd_stage.is_none());
    }

    #[test]
    fn mantra_has_ifd_stage_and_render_output() {
        let params = resolve_single(
            SceneNode::new("/out/beauty", "ifd")
                .parm("hf_mantra_pool", "render")
                .parm("hf_houdini_pool", "ifd")
                .parm("soho_diskfile", "$HIP/ifd/beauty.$F4.ifd")
                .parm("vm_picture", "$HIP/render/beauty.$F4.exr")
                .parm("f1", 1)
                .parm("f2", 10),
        );
        assert_eq!(params.job_name, "/out/beauty");
        assert_eq!(params.plugin, JobPlugin::Mantra);
        assert_eq!(params.farm.pool, "render");
        assert_eq!(params.farm.chunk_policy, ChunkPolicy::FramesPerChunk(1));
        assert_eq!(params.ifd_stage.unwrap().pool, "ifd");
        assert_eq!(params.output_path.as_deref(), Some("$HIP/render/beauty.$F4.exr"));
        assert_eq!(params.ifd_path.as_deref(), Some("$HIP/ifd/beauty.$F4.ifd"));
    }

    #[test]
    fn frame_override_replaces_node_range() {
        let params = resolve_single(
            SceneNode::new("/out/geo", "geometry")
                .parm("hf_override_frames", 1)
                .parm("hf_frames", "10-20x5")
                .parm("f1", 1)
                .parm("f2", 100),
        );
        assert_eq!(params.frames, Some(FrameRange::new(10, 20, 5).unwrap().into()));
    }

    #[test]
    fn frame_override_accepts_lists() {
        let params = resolve_single(
            SceneNode::new("/out/geo", "geometry")
                .parm("hf_override_frames", 1)
                .parm("hf_frames", "1,5,10-20"),
        );
        assert_eq!(params.frames.map(|f| f.to_string()).as_deref(), Some("1,5,10-20"));
    }

    #[test]
    fn mantra_options_follow_program_name() {
        let params = resolve_single(
            SceneNode::new("/out/beauty", "ifd").parm("soho_pipecmd", "mantra -V 2a -j 8"),
        );
        assert_eq!(params.mantra_options, "-V 2a -j 8");
        assert_eq!(mantra_options("mantra"), "");
        assert_eq!(mantra_options("/opt/hfs/bin/husk -V 2"), "");

        let geometry = resolve_single(
            SceneNode::new("/out/geo", "geometry").parm("soho_pipecmd", "mantra -V 2"),
        );
        assert_eq!(geometry.mantra_options, "");
    }

    #[test]
    fn unresolvable_frames_are_none() {
        let bad_override = resolve_single(
            SceneNode::new("/out/geo", "geometry")
                .parm("hf_override_frames", 1)
                .parm("hf_frames", "every other frame"),
        );
        assert_eq!(bad_override.frames, None);

        let missing = resolve_single(SceneNode::new("/out/geo", "geometry").parm("f1", 1));
        assert_eq!(missing.frames, None);
    }

    #[test]
    fn blacklist_flag_and_advanced_defaults() {
        let params = resolve_single(
            SceneNode::new("/out/geo", "geometry")
                .parm("hf_houdini_machine_list", "node01,node02")
                .parm("hf_houdini_submit_machine_list_is_blacklist", true),
        );
        let advanced = params.farm.advanced;
        assert!(advanced.machine_list_is_blacklist);
        assert_eq!(advanced.machine_list, "node01,node02");
        assert_eq!(advanced.concurrent_tasks, 1);
        assert_eq!(params.farm.priority, DEFAULT_PRIORITY);
    }
}
