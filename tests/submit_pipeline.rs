//! End-to-end tests for the submission orchestrator against the virtual farm.

mod helpers;

use helpers::*;
use submitter::chunk::TaskSpec;
use submitter::config::{FarmBackend, SubmitterConfig};
use submitter::error::{ChunkingError, GraphError, SubmissionError};
use submitter::farm::{FarmJobId, VirtualFarm};
use submitter::scene::JobPlugin;
use submitter::job::{JobId, TraversalMode};
use submitter::report::{SubmissionReport, render_summary};
use submitter::scene::{Scene, SceneNode};
use submitter::submit::{AbortReason, CancelToken, SubmissionState, Submitter};

/// Render S reading geometry G.
fn render_with_geometry() -> Scene {
    scene(vec![geometry("/out/G"), mantra("/out/S").input("/out/G")])
}

fn farm_id(id: &str) -> FarmJobId {
    FarmJobId::from(id)
}

// =============================================================================
// Successful submissions
// =============================================================================

#[test]
fn commits_in_dependency_order() {
    let farm = VirtualFarm::new();
    let log = farm.log();
    let result = submitter(farm).submit(&render_with_geometry(), "/out/S", TraversalMode::NodeAndUpstream, false);

    assert_eq!(result.status, SubmissionState::Committed);
    assert!(result.is_success());
    assert_eq!(log.nodes(), vec!["/out/G", "/out/S"]);

    let entries = log.entries();
    assert!(entries[0].dependencies.is_empty());
    assert_eq!(entries[1].dependencies, vec![farm_id("F1")]);
    assert_eq!(result.farm_job_ids[&JobId(1)], farm_id("F1"));
    assert_eq!(result.farm_job_ids[&JobId(0)], farm_id("F2"));
    assert!(result.not_submitted.is_empty());
}

#[test]
fn committed_jobs_carry_tasks() {
    let scene = scene(vec![
        geometry("/out/G")
            .parm("hf_houdini_split_by", "frames")
            .parm("hf_houdini_frames", 3),
    ]);
    let result = submitter(VirtualFarm::new()).submit(&scene, "/out/G", TraversalMode::SingleNode, false);
    let graph = result.graph.as_ref().unwrap();
    assert_eq!(
        graph.jobs()[0].tasks,
        vec![
            TaskSpec { start: 1, end: 3, step: 1 },
            TaskSpec { start: 4, end: 6, step: 1 },
            TaskSpec { start: 7, end: 9, step: 1 },
            TaskSpec { start: 10, end: 10, step: 1 },
        ]
    );
}

#[test]
fn dry_run_previews_without_farm_calls() {
    let farm = VirtualFarm::new();
    let log = farm.log();
    let result = submitter(farm).submit(&render_with_geometry(), "/out/S", TraversalMode::NodeAndUpstream, true);

    assert_eq!(result.status, SubmissionState::Previewed);
    assert!(log.entries().is_empty());
    assert!(result.farm_job_ids.is_empty());
    let graph = result.graph.as_ref().unwrap();
    assert!(graph.jobs().iter().all(|j| !j.tasks.is_empty()));
}

#[test]
fn frame_list_override_is_chunked_per_run() {
    let scene = scene(vec![
        geometry("/out/G")
            .parm("hf_override_frames", 1)
            .parm("hf_frames", "1,5,10-20")
            .parm("hf_houdini_split_by", "frames")
            .parm("hf_houdini_frames", 10),
    ]);
    let result = submitter(VirtualFarm::new()).submit(&scene, "/out/G", TraversalMode::SingleNode, false);

    assert_eq!(result.status, SubmissionState::Committed, "issues: {:?}", result.issues);
    let job = &result.graph.as_ref().unwrap().jobs()[0];
    assert_eq!(job.params.frames.as_ref().unwrap().to_string(), "1,5,10-20");
    assert_eq!(
        job.tasks,
        vec![
            TaskSpec { start: 1, end: 1, step: 1 },
            TaskSpec { start: 5, end: 5, step: 1 },
            TaskSpec { start: 10, end: 19, step: 1 },
            TaskSpec { start: 20, end: 20, step: 1 },
        ]
    );
}

#[test]
fn bake_texture_v3_is_a_two_stage_render() {
    let scene = scene(vec![
        SceneNode::new("/out/bake", "baketexture::3.0")
            .parm("soho_outputmode", 1)
            .parm("soho_diskfile", "$HIP/ifd/bake.$F4.ifd")
            .parm("vm_uvoutputpicture1", "$HIP/tex/bake.$F4.rat")
            .parm("camera", CAMERA)
            .parm("hf_houdini_pool", "ifd")
            .parm("hf_mantra_pool", "render")
            .parm("f1", 1)
            .parm("f2", 1),
    ]);
    let result = submitter(VirtualFarm::new()).submit(&scene, "/out/bake", TraversalMode::SingleNode, true);

    assert_eq!(result.status, SubmissionState::Previewed, "issues: {:?}", result.issues);
    let params = &result.graph.as_ref().unwrap().jobs()[0].params;
    assert_eq!(params.plugin, JobPlugin::Mantra);
    assert_eq!(params.ifd_stage.as_ref().unwrap().pool, "ifd");
    assert_eq!(params.output_path.as_deref(), Some("$HIP/tex/bake.$F4.rat"));
    assert_eq!(params.ifd_path.as_deref(), Some("$HIP/ifd/bake.$F4.ifd"));
}

#[test]
fn warnings_do_not_block_submission() {
    let scene = scene(vec![
        geometry("/out/G"),
        SceneNode::new("/out/merge", "merge").input("/out/G"),
        mantra("/out/S")
            .input("/out/merge")
            .parm("soho_diskfile", "$HIP/test.ifd"),
    ]);
    let result = submitter(VirtualFarm::new()).submit(&scene, "/out/S", TraversalMode::NodeAndUpstream, false);

    assert_eq!(result.status, SubmissionState::Committed);
    assert_eq!(codes(&result.issues), vec!["G001", "R003"]);
}

// =============================================================================
// Aborts
// =============================================================================

#[test]
fn validation_error_aborts_before_farm() {
    let scene = Scene::new(vec![
        camera().parm("vm_bgenable", 1).parm("vm_background", "plate.jpg"),
        sop_target(),
        mantra("/out/S").parm("hf_mantra_pool", "none"),
    ])
    .unwrap();
    let farm = VirtualFarm::new();
    let log = farm.log();
    let result = submitter(farm).submit(&scene, "/out/S", TraversalMode::SingleNode, false);

    assert_eq!(result.status, SubmissionState::Aborted);
    assert_eq!(result.abort, Some(AbortReason::Validation));
    assert_eq!(codes(&result.issues), vec!["R004", "R005"]);
    assert!(log.entries().is_empty());
}

#[test]
fn missing_ifd_path_aborts_before_farm() {
    let scene = scene(vec![mantra("/out/S").parm("soho_diskfile", "")]);
    let farm = VirtualFarm::new();
    let log = farm.log();
    let result = submitter(farm).submit(&scene, "/out/S", TraversalMode::SingleNode, false);

    assert_eq!(result.status, SubmissionState::Aborted);
    assert_eq!(codes(&result.issues), vec!["R006"]);
    assert!(log.entries().is_empty());
}

#[test]
fn unresolvable_frames_fail_validation_not_chunking() {
    let scene = scene(vec![geometry("/out/G").parm("f3", 0)]);
    let result = submitter(VirtualFarm::new()).submit(&scene, "/out/G", TraversalMode::SingleNode, true);

    assert_eq!(result.status, SubmissionState::Aborted);
    assert_eq!(result.abort, Some(AbortReason::Validation));
    assert_eq!(codes(&result.issues), vec!["R008"]);
}

#[test]
fn chunking_error_aborts_before_farm() {
    let scene = scene(vec![
        geometry("/out/G")
            .parm("hf_houdini_split_by", "chunks")
            .parm("hf_houdini_chunks", 0),
        mantra("/out/S").input("/out/G"),
    ]);
    let farm = VirtualFarm::new();
    let log = farm.log();
    let result = submitter(farm).submit(&scene, "/out/S", TraversalMode::NodeAndUpstream, false);

    assert_eq!(result.status, SubmissionState::Aborted);
    assert_eq!(
        result.abort,
        Some(AbortReason::Chunking {
            node: "/out/G".into(),
            error: ChunkingError::NonPositiveChunkCount { count: 0 },
        })
    );
    assert!(log.entries().is_empty());
}

#[test]
fn graph_error_aborts_with_reason() {
    let result = submitter(VirtualFarm::new()).submit(&render_with_geometry(), "/out/nope", TraversalMode::SingleNode, false);
    assert_eq!(result.status, SubmissionState::Aborted);
    assert_eq!(
        result.abort,
        Some(AbortReason::Graph(GraphError::UnknownNode { node: "/out/nope".into() }))
    );
    assert!(result.graph.is_none());
}

#[test]
fn cancelled_before_submitting() {
    let farm = VirtualFarm::new();
    let log = farm.log();
    let cancel = CancelToken::new();
    cancel.clone().cancel();
    let result = submitter(farm).submit_with_cancel(
        &render_with_geometry(),
        "/out/S",
        TraversalMode::NodeAndUpstream,
        false,
        &cancel,
    );

    assert_eq!(result.status, SubmissionState::Aborted);
    assert_eq!(result.abort, Some(AbortReason::Cancelled));
    assert!(log.entries().is_empty());
}

// =============================================================================
// Partial failures
// =============================================================================

#[test]
fn failed_render_leaves_geometry_committed() {
    let farm = VirtualFarm::new().fail_on("/out/S");
    let log = farm.log();
    let result = submitter(farm).submit(&render_with_geometry(), "/out/S", TraversalMode::NodeAndUpstream, false);

    assert_eq!(result.status, SubmissionState::PartiallyFailed);
    assert_eq!(result.farm_job_ids.get(&JobId(1)), Some(&farm_id("F1")));
    assert_eq!(result.not_submitted, vec![JobId(0)]);
    assert_eq!(result.failures.len(), 1);
    assert!(matches!(result.failures[0].error, SubmissionError::Farm { .. }));
    assert_eq!(log.entries()[1].dependencies, vec![farm_id("F1")]);
}

#[test]
fn dependents_of_failed_job_are_not_sent() {
    let scene = scene(vec![
        geometry("/out/A"),
        geometry("/out/B").input("/out/A"),
        mantra("/out/C").input("/out/B"),
        geometry("/out/X").input("/out/A"),
    ]);
    let farm = VirtualFarm::new().fail_on("/out/B");
    let log = farm.log();
    let result = submitter(farm).submit(&scene, "/out/A", TraversalMode::FullConnectedTree, false);

    assert_eq!(result.status, SubmissionState::PartiallyFailed);
    assert_eq!(log.nodes(), vec!["/out/A", "/out/B", "/out/X"]);

    let graph = result.graph.as_ref().unwrap();
    let c = graph.job_for_node("/out/C").unwrap().id;
    assert!(result.not_submitted.contains(&c));
    assert!(result.failures.iter().any(|f| f.error
        == SubmissionError::DependencyNotSubmitted {
            node: "/out/C".into(),
            dependency: "/out/B".into(),
        }));
    let x = graph.job_for_node("/out/X").unwrap().id;
    assert!(result.farm_job_ids.contains_key(&x));
}

// =============================================================================
// Reports and configuration
// =============================================================================

#[test]
fn summary_lists_farm_ids() {
    let result = submitter(VirtualFarm::new()).submit(&render_with_geometry(), "/out/S", TraversalMode::NodeAndUpstream, false);
    insta::assert_snapshot!(render_summary(&result), @r"
    Status: Committed
    0 /out/S frames 1-10 in 10 tasks -> F2
    1 /out/G frames 1-10 in 10 tasks -> F1
    ");
}

#[test]
fn report_dto_serializes_with_status_tag() {
    let farm = VirtualFarm::new().fail_on("/out/S");
    let result = submitter(farm).submit(&render_with_geometry(), "/out/S", TraversalMode::NodeAndUpstream, false);
    let report = SubmissionReport::from(&result);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["status"], "partiallyFailed");
    assert_eq!(json["failures"][0]["node"], "/out/S");
    assert_eq!(json["jobs"][1]["farm_id"], "F1");
    assert!(json["jobs"][0]["farm_id"].is_null());
}

#[test]
fn submitter_from_virtual_config() {
    let config = SubmitterConfig {
        farm: FarmBackend::Virtual,
        ..Default::default()
    };
    let mut submitter = Submitter::from_config(&config).unwrap();
    let result = submitter.submit(&render_with_geometry(), "/out/S", TraversalMode::NodeAndUpstream, false);
    assert_eq!(result.status, SubmissionState::Committed);
}

#[test]
fn json_scene_fixture_submits() {
    let json = include_str!("fixtures/shot_scene.json");
    let scene = submitter::scene::parse(json).expect("Should parse");
    let result = submitter(VirtualFarm::new()).submit(&scene, "/out/comp", TraversalMode::FullConnectedTree, true);

    assert_eq!(result.status, SubmissionState::Previewed, "issues: {:?}", result.issues);
    let graph = result.graph.as_ref().unwrap();
    let order: Vec<&str> = graph
        .submission_order()
        .into_iter()
        .map(|id| graph.job(id).unwrap().node.as_str())
        .collect();
    assert_eq!(order, vec!["/out/sim", "/out/beauty", "/out/comp"]);
}
