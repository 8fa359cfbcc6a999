use std::collections::HashMap;

use chrono::{DateTime, Utc};
use triage_core::{FinalRecommendation, TaskId, TaskSnapshot, TaskState};

use crate::QueueError;

/// Kết quả ghi khi tác vụ kết thúc.
pub(crate) enum Outcome {
    Succeeded {
        recommendation: FinalRecommendation,
        processing_ms: u64,
    },
    Failed {
        error: String,
        processing_ms: Option<u64>,
    },
}

/// Bảng trạng thái tác vụ. Trạng thái kết thúc chỉ được ghi một lần.
#[derive(Debug, Default)]
pub(crate) struct TaskStore {
    tasks: HashMap<TaskId, TaskSnapshot>,
}

impl TaskStore {
    pub fn insert_submitted(&mut self, id: TaskId) {
        let now = Utc::now();
        self.tasks.insert(
            id,
            TaskSnapshot {
                id,
                state: TaskState::Submitted,
                submitted_at: now,
                updated_at: now,
                result: None,
                error: None,
                processing_ms: None,
            },
        );
    }

    pub fn get(&self, id: TaskId) -> Result<&TaskSnapshot, QueueError> {
        self.tasks.get(&id).ok_or(QueueError::UnknownTask(id))
    }

    pub fn transition(&mut self, id: TaskId, next: TaskState) -> Result<(), QueueError> {
        let task = self.tasks.get_mut(&id).ok_or(QueueError::UnknownTask(id))?;
        if !task.state.can_transition_to(next) {
            return Err(QueueError::IllegalTransition {
                id,
                from: task.state,
                to: next,
            });
        }
        task.state = next;
        task.updated_at = Utc::now();
        Ok(())
    }

    /// Xóa một tác vụ đã kết thúc; tác vụ đang chạy không được xóa.
    pub fn remove_finished(&mut self, id: TaskId) -> Result<TaskSnapshot, QueueError> {
        let state = self.get(id)?.state;
        if !state.is_terminal() {
            return Err(QueueError::StillRunning { id, state });
        }
        self.tasks.remove(&id).ok_or(QueueError::UnknownTask(id))
    }

    /// Xóa mọi tác vụ đã kết thúc trước `cutoff` và trả về mã của chúng.
    pub fn purge_finished_before(&mut self, cutoff: DateTime<Utc>) -> Vec<TaskId> {
        let expired: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|task| task.state.is_terminal() && task.updated_at < cutoff)
            .map(|task| task.id)
            .collect();
        for id in &expired {
            self.tasks.remove(id);
        }
        expired
    }

    pub fn finish(&mut self, id: TaskId, outcome: Outcome) -> Result<(), QueueError> {
        match outcome {
            Outcome::Succeeded {
                recommendation,
                processing_ms,
            } => {
                self.transition(id, TaskState::Succeeded)?;
                let task = self.tasks.get_mut(&id).ok_or(QueueError::UnknownTask(id))?;
                task.result = Some(recommendation);
                task.processing_ms = Some(processing_ms);
            }
            Outcome::Failed {
                error,
                processing_ms,
            } => {
                self.transition(id, TaskState::Failed)?;
                let task = self.tasks.get_mut(&id).ok_or(QueueError::UnknownTask(id))?;
                task.error = Some(error);
                task.processing_ms = processing_ms;
            }
        }
        Ok(())
    }
}
