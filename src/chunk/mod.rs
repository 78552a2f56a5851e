//! Chunking calculator: split a job's frame range into farm tasks.

pub mod frames;

use serde::{Deserialize, Serialize};

pub use frames::{FrameRange, FrameSet};

use crate::error::ChunkingError;

/// How a job's frames are grouped into tasks. Values are kept signed so a
/// bad parameter on the node surfaces as a `ChunkingError` instead of being
/// clamped away during parameter resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkPolicy {
    /// Split into this many tasks, as evenly as possible.
    FixedChunkCount(i64),
    /// Tasks of this many frames; the last task takes the remainder.
    FramesPerChunk(i64),
    SingleChunk,
}

/// One farm task: frames `start, start + step, ..., end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl TaskSpec {
    /// Frames in the task. A reversed task is empty; a step below one
    /// counts as one.
    pub fn frame_count(&self) -> u64 {
        if self.end < self.start {
            return 0;
        }
        ((self.end - self.start) / self.step.max(1)) as u64 + 1
    }
}

/// Compute the task list for `range` under `policy`. The tasks partition the
/// range exactly, in frame order, and none is empty.
pub fn compute_tasks(range: &FrameRange, policy: ChunkPolicy) -> Result<Vec<TaskSpec>, ChunkingError> {
    let sizes = chunk_sizes(range.frame_count(), policy)?;

    let mut tasks = Vec::with_capacity(sizes.len());
    let mut offset = 0u64;
    for size in sizes {
        tasks.push(TaskSpec {
            start: range.frame_at(offset),
            end: range.frame_at(offset + size - 1),
            step: range.step(),
        });
        offset += size;
    }
    Ok(tasks)
}

/// Tasks for every run of `frames`, in frame order. The policy applies to
/// each run on its own, so a task never spans a gap in the set.
pub fn compute_tasks_for_set(frames: &FrameSet, policy: ChunkPolicy) -> Result<Vec<TaskSpec>, ChunkingError> {
    let mut tasks = Vec::new();
    for run in frames.runs() {
        tasks.extend(compute_tasks(run, policy)?);
    }
    Ok(tasks)
}

/// Frame counts per task. `total` is at least one.
fn chunk_sizes(total: u64, policy: ChunkPolicy) -> Result<Vec<u64>, ChunkingError> {
    match policy {
        ChunkPolicy::SingleChunk => Ok(vec![total]),
        ChunkPolicy::FixedChunkCount(count) => {
            if count <= 0 {
                return Err(ChunkingError::NonPositiveChunkCount { count });
            }
            let chunks = (count as u64).min(total);
            let base = total / chunks;
            let extra = total % chunks;
            Ok((0..chunks).map(|i| base + u64::from(i < extra)).collect())
        }
        ChunkPolicy::FramesPerChunk(frames) => {
            if frames <= 0 {
                return Err(ChunkingError::NonPositiveChunkSize { frames });
            }
            let size = frames as u64;
            let full = total / size;
            let mut sizes = vec![size; full as usize];
            if total % size != 0 {
                sizes.push(total % size);
            }
            Ok(sizes)
        }
    }
}
