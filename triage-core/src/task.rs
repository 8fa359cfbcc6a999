use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{FinalRecommendation, UrgencyLevel};

/// Định danh tác vụ triage trả về cho client để poll.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Vòng đời: Submitted -> Queued -> Processing -> {Succeeded, Failed}. Không có trạng thái thử lại.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Submitted,
    Queued,
    Processing,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }

    /// Chuyển trạng thái hợp lệ. Hàng đợi từ chối có thể làm tác vụ thất bại trước khi xử lý.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Submitted, TaskState::Queued)
                | (TaskState::Submitted, TaskState::Failed)
                | (TaskState::Queued, TaskState::Processing)
                | (TaskState::Processing, TaskState::Succeeded)
                | (TaskState::Processing, TaskState::Failed)
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskState::Submitted => "submitted",
            TaskState::Queued => "queued",
            TaskState::Processing => "processing",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Ảnh chụp trạng thái tác vụ trả về khi poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub state: TaskState,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: Option<FinalRecommendation>,
    pub error: Option<String>,
    pub processing_ms: Option<u64>,
}

/// Đánh giá của bác sĩ, lưu tách biệt khỏi khuyến nghị gốc.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicianReview {
    pub approved: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub modified_urgency: Option<UrgencyLevel>,
    #[serde(default)]
    pub override_recommendation: bool,
    pub reviewed_at: DateTime<Utc>,
}

/// Khuyến nghị gốc kèm đánh giá của bác sĩ (nếu có).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewedRecommendation {
    pub task_id: TaskId,
    pub original: FinalRecommendation,
    pub review: Option<ClinicianReview>,
    /// Mức khẩn cấp áp dụng: chỉ dùng mức bác sĩ sửa khi có cờ override.
    pub effective_urgency: UrgencyLevel,
}

impl ReviewedRecommendation {
    pub fn new(
        task_id: TaskId,
        original: FinalRecommendation,
        review: Option<ClinicianReview>,
    ) -> Self {
        let effective_urgency = review
            .as_ref()
            .filter(|review| review.override_recommendation)
            .and_then(|review| review.modified_urgency)
            .unwrap_or(original.urgency_level);
        Self {
            task_id,
            original,
            review,
            effective_urgency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions_are_forward_only() {
        assert!(TaskState::Submitted.can_transition_to(TaskState::Queued));
        assert!(TaskState::Queued.can_transition_to(TaskState::Processing));
        assert!(TaskState::Processing.can_transition_to(TaskState::Succeeded));
        assert!(TaskState::Processing.can_transition_to(TaskState::Failed));

        assert!(!TaskState::Succeeded.can_transition_to(TaskState::Processing));
        assert!(!TaskState::Failed.can_transition_to(TaskState::Queued));
        assert!(!TaskState::Queued.can_transition_to(TaskState::Succeeded));
        assert!(!TaskState::Succeeded.can_transition_to(TaskState::Failed));
    }

    #[test]
    fn terminal_states() {
        assert!(TaskState::Succeeded.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Processing.is_terminal());
    }
}
