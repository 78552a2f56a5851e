//! Thinkbox Deadline client.
//!
//! Every farm job is a pair of `key=value` files (job info and plugin info)
//! handed to the `deadlinecommand` executable, which prints `JobID=<id>` on
//! success. Mantra nodes become two farm jobs: a Houdini job writing the IFD
//! files and a frame-dependent Mantra job rendering them.
//!
//! Deadline splits frames into tasks itself from a single `ChunkSize`, so
//! uneven `FixedChunkCount` splits can come out with fewer farm tasks than
//! the job's computed `TaskSpec`s.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, error, info, warn};

use super::{FarmClient, FarmJobId};
use crate::chunk::{FrameSet, TaskSpec, compute_tasks_for_set};
use crate::config::{FarmBackend, SubmitterConfig};
use crate::error::{ConfigError, SubmissionError};
use crate::job::{FarmSettings, JobSpec};
use crate::scene::JobPlugin;

/// macOS installs record the Deadline bin directory in this file.
const MAC_PATH_FILE: &str = "/Users/Shared/Thinkbox/DEADLINE_PATH";
const PATH_ENV: &str = "DEADLINE_PATH";
const COMMAND_NAME: &str = if cfg!(windows) { "deadlinecommand.exe" } else { "deadlinecommand" };

static FRAME_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{F(\d*)\}|F(\d*)\b)").expect("frame token pattern is valid")
});

/// Ordered `key=value` entries of a Deadline info file.
pub type InfoFile = BTreeMap<&'static str, String>;

#[derive(Debug)]
pub struct DeadlineClient {
    command: PathBuf,
    temp_dir: PathBuf,
    scene_file: String,
    batch_name: String,
    department: String,
    houdini_version: Option<String>,
    submit_scene: bool,
    /// Keeps info file names unique within a session.
    job_index: usize,
}

impl DeadlineClient {
    pub fn new(command: PathBuf, temp_dir: PathBuf) -> Self {
        DeadlineClient {
            command,
            temp_dir,
            scene_file: String::new(),
            batch_name: String::new(),
            department: "3D".to_string(),
            houdini_version: None,
            submit_scene: false,
            job_index: 0,
        }
    }

    pub fn from_config(config: &SubmitterConfig) -> Result<Self, ConfigError> {
        let FarmBackend::Deadline {
            command,
            temp_dir,
            submit_scene,
        } = &config.farm
        else {
            return Err(ConfigError::FarmUnavailable {
                message: "configuration does not select Deadline".to_string(),
            });
        };

        let command = match command {
            Some(path) => path.clone(),
            None => locate_command()?,
        };
        let temp_dir = temp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("houfarm"));

        Ok(DeadlineClient {
            scene_file: config.scene_file.clone(),
            batch_name: config.batch_name(),
            department: config.department.clone(),
            houdini_version: config.houdini_version.clone(),
            submit_scene: *submit_scene,
            ..DeadlineClient::new(command, temp_dir)
        })
    }

    // =========================================================================
    // INFO FILES
    // =========================================================================

    fn job_info(
        &self,
        job: &JobSpec,
        settings: &FarmSettings,
        plugin: JobPlugin,
        frames: &FrameSet,
        chunk_size: u64,
        dependencies: &[String],
    ) -> InfoFile {
        let suffix = match (job.params.plugin, plugin) {
            (JobPlugin::Mantra, JobPlugin::Houdini) => " (ifd)",
            (JobPlugin::Mantra, JobPlugin::Mantra) => " (mantra)",
            _ => "",
        };
        let advanced = &settings.advanced;

        let mut info = InfoFile::new();
        info.insert("Name", format!("{}{}", job.params.job_name, suffix));
        info.insert("Comment", job.params.comment.clone());
        info.insert("Department", self.department.clone());
        if !self.batch_name.is_empty() {
            info.insert("BatchName", self.batch_name.clone());
        }
        info.insert("Plugin", plugin.name().to_string());
        info.insert("Frames", frames.to_string());
        info.insert("ChunkSize", chunk_size.to_string());
        info.insert("Pool", settings.pool.clone());
        info.insert("SecondaryPool", settings.secondary_pool.clone());
        info.insert("Group", settings.group.clone());
        info.insert("Priority", settings.priority.to_string());
        info.insert("EnableAutoTimeout", flag(advanced.enable_auto_timeout));
        info.insert("TaskTimeoutMinutes", advanced.task_timeout_minutes.to_string());
        info.insert("LimitConcurrentTasksToNumberOfCpus", flag(advanced.limit_tasks_to_cpus));
        info.insert("ConcurrentTasks", advanced.concurrent_tasks.to_string());
        info.insert("MachineLimit", advanced.machine_limit.to_string());
        info.insert("LimitGroups", advanced.limit_groups.clone());
        info.insert("OnJobComplete", "Nothing".to_string());
        let list_key = if advanced.machine_list_is_blacklist { "BlackList" } else { "WhiteList" };
        info.insert(list_key, advanced.machine_list.clone());
        if !dependencies.is_empty() {
            info.insert("JobDependencies", dependencies.join(","));
        }
        info
    }

    fn houdini_plugin_info(&self, job: &JobSpec) -> InfoFile {
        let mut info = InfoFile::new();
        info.insert("SceneFile", self.scene_file.clone());
        info.insert("OutputDriver", job.node.clone());
        info.insert("IgnoreInputs", "1".to_string());
        info.insert("Build", "64bit".to_string());
        if let Some(version) = &self.houdini_version {
            info.insert("Version", version.clone());
        }
        info
    }

    fn mantra_plugin_info(&self, job: &JobSpec, frames: &FrameSet) -> InfoFile {
        let ifd_path = job.params.ifd_path.as_deref().unwrap_or_default();
        let mut info = InfoFile::new();
        info.insert("SceneFile", frame_tokens_to_frame(ifd_path, frames.start()));
        info.insert("Threads", "0".to_string());
        info.insert("CommandLineOptions", job.params.mantra_options.clone());
        if let Some(version) = &self.houdini_version {
            info.insert("Version", version.clone());
        }
        info
    }

    // =========================================================================
    // SUBMISSION
    // =========================================================================

    /// Write both info files and run `deadlinecommand` on them.
    fn send(
        &mut self,
        node: &str,
        plugin: JobPlugin,
        job_info: &InfoFile,
        plugin_info: &InfoFile,
        submit_scene: bool,
    ) -> Result<FarmJobId, SubmissionError> {
        let io_error = |e: std::io::Error| SubmissionError::Io {
            node: node.to_string(),
            message: e.to_string(),
        };

        let index = self.job_index;
        self.job_index += 1;
        fs::create_dir_all(&self.temp_dir).map_err(io_error)?;
        // The command runs from its own directory, so every path it gets is absolute.
        let temp_dir = fs::canonicalize(&self.temp_dir).map_err(io_error)?;
        let stem = plugin.name().to_lowercase();
        let job_file = temp_dir.join(format!("{stem}_submit_info{index}.job"));
        let plugin_file = temp_dir.join(format!("{stem}_plugin_info{index}.job"));

        fs::write(&job_file, render_info_file(job_info)).map_err(io_error)?;
        fs::write(&plugin_file, render_info_file(plugin_info)).map_err(io_error)?;
        debug!(node, job_file = %job_file.display(), "wrote deadline info files");

        let program = resolve_program(&self.command);
        let mut command = Command::new(&program);
        command.arg(&job_file).arg(&plugin_file);
        if submit_scene {
            command.arg(&self.scene_file);
        }
        if let Some(dir) = program.parent().filter(|d| !d.as_os_str().is_empty()) {
            command.current_dir(dir);
        }
        let output = command.output().map_err(io_error)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        match parse_job_id(&stdout) {
            Some(id) => {
                info!(node, plugin = plugin.name(), farm_id = %id, "deadline job created");
                Ok(id)
            }
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let message = if stderr.trim().is_empty() {
                    format!("deadlinecommand returned no JobID ({})", output.status)
                } else {
                    stderr.trim().to_string()
                };
                error!(node, %message, "deadline submission failed");
                Err(SubmissionError::Farm {
                    node: node.to_string(),
                    message,
                })
            }
        }
    }
}

impl FarmClient for DeadlineClient {
    fn name(&self) -> &str {
        "deadline"
    }

    fn submit_job(&mut self, job: &JobSpec, dependencies: &[FarmJobId]) -> Result<FarmJobId, SubmissionError> {
        let farm_error = |message: String| SubmissionError::Farm {
            node: job.node.clone(),
            message,
        };
        let frames = job
            .params
            .frames
            .as_ref()
            .ok_or_else(|| farm_error("job has no frame range".to_string()))?;
        let chunk_size = largest_task(&job.tasks);
        let farm_tasks = frame_tasks(frames, chunk_size);
        if farm_tasks != job.tasks.len() as u64 {
            warn!(
                node = %job.node,
                computed = job.tasks.len(),
                farm_tasks,
                chunk_size,
                "deadline will split the job into a different number of tasks"
            );
        }

        let mut upstream: Vec<String> = dependencies.iter().map(|id| id.0.clone()).collect();
        upstream.extend(job.params.extra_dependencies.iter().cloned());
        let submit_scene = self.submit_scene || job.params.submit_scene;

        // Single-stage kinds
        let Some(ifd_settings) = &job.params.ifd_stage else {
            let mut info = self.job_info(job, &job.params.farm, JobPlugin::Houdini, frames, chunk_size, &upstream);
            if let Some(dir) = job.params.output_path.as_deref().and_then(parent_dir) {
                info.insert("OutputDirectory0", dir);
            }
            let plugin_info = self.houdini_plugin_info(job);
            return self.send(&job.node, JobPlugin::Houdini, &info, &plugin_info, submit_scene);
        };

        // IFD generation
        let ifd_tasks = compute_tasks_for_set(frames, ifd_settings.chunk_policy).map_err(|e| farm_error(e.to_string()))?;
        let ifd_chunk_size = largest_task(&ifd_tasks);
        let mut ifd_info = self.job_info(job, ifd_settings, JobPlugin::Houdini, frames, ifd_chunk_size, &upstream);
        if let Some(dir) = job.params.ifd_path.as_deref().and_then(parent_dir) {
            ifd_info.insert("OutputDirectory0", dir);
        }
        let ifd_plugin_info = self.houdini_plugin_info(job);
        let ifd_id = self.send(&job.node, JobPlugin::Houdini, &ifd_info, &ifd_plugin_info, submit_scene)?;

        // Render
        let mut render_info = self.job_info(
            job,
            &job.params.farm,
            JobPlugin::Mantra,
            frames,
            chunk_size,
            std::slice::from_ref(&ifd_id.0),
        );
        render_info.insert("IsFrameDependent", "true".to_string());
        if let Some(picture) = &job.params.output_path {
            render_info.insert("OutputFilename0", frame_tokens_to_hashes(picture));
        }
        let render_plugin_info = self.mantra_plugin_info(job, frames);
        self.send(&job.node, JobPlugin::Mantra, &render_info, &render_plugin_info, false)
    }
}

/// Find `deadlinecommand` from the Deadline install.
pub fn locate_command() -> Result<PathBuf, ConfigError> {
    locate_command_from(
        Path::new(MAC_PATH_FILE),
        std::env::var_os(PATH_ENV).map(PathBuf::from),
    )
}

fn locate_command_from(path_file: &Path, env_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    let bin_dir = match fs::read_to_string(path_file) {
        Ok(contents) => PathBuf::from(contents.trim()),
        Err(_) => env_dir.ok_or_else(|| ConfigError::FarmUnavailable {
            message: format!(
                "cannot find Deadline installation: set {} or create {}",
                PATH_ENV, MAC_PATH_FILE
            ),
        })?,
    };
    Ok(bin_dir.join(COMMAND_NAME))
}

/// Relative command paths are made absolute so they still resolve once the
/// command runs from its own directory. Bare names are left to `PATH`.
fn resolve_program(command: &Path) -> PathBuf {
    if command.is_absolute() || command.parent().is_none_or(|dir| dir.as_os_str().is_empty()) {
        return command.to_path_buf();
    }
    fs::canonicalize(command).unwrap_or_else(|_| command.to_path_buf())
}

fn largest_task(tasks: &[TaskSpec]) -> u64 {
    tasks.iter().map(TaskSpec::frame_count).max().unwrap_or(1).max(1)
}

/// Tasks Deadline creates for `frames`: consecutive groups of `chunk_size`
/// listed frames, counted across the whole list.
fn frame_tasks(frames: &FrameSet, chunk_size: u64) -> u64 {
    frames.frame_count().div_ceil(chunk_size.max(1))
}

/// The `JobID=` line of `deadlinecommand` output.
pub fn parse_job_id(output: &str) -> Option<FarmJobId> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("JobID="))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(FarmJobId::from)
}

pub fn render_info_file(entries: &InfoFile) -> String {
    entries
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect()
}

/// `$F4` → `####`, the padding syntax Deadline uses for output file names.
pub fn frame_tokens_to_hashes(path: &str) -> String {
    replace_frame_tokens(path, |width| "#".repeat(width))
}

fn frame_tokens_to_frame(path: &str, frame: i64) -> String {
    replace_frame_tokens(path, |width| format!("{:0width$}", frame, width = width))
}

fn replace_frame_tokens(path: &str, with: impl Fn(usize) -> String) -> String {
    FRAME_TOKEN_RE
        .replace_all(path, |caps: &Captures<'_>| {
            let digits = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            with(digits.parse::<usize>().unwrap_or(1).max(1))
        })
        .into_owned()
}

fn parent_dir(path: &str) -> Option<String> {
    Path::new(path)
        .parent()
        .map(|dir| dir.to_string_lossy().into_owned())
        .filter(|dir| !dir.is_empty())
}

fn flag(value: bool) -> String {
    u8::from(value).to_string()
}
