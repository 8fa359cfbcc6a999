use std::collections::HashMap;

use triage_core::{ClinicianReview, TaskId};

/// Đánh giá của bác sĩ theo tác vụ. Lưu riêng để khuyến nghị gốc không bao giờ bị sửa.
#[derive(Debug, Default)]
pub(crate) struct ReviewStore {
    reviews: HashMap<TaskId, ClinicianReview>,
}

impl ReviewStore {
    /// Đánh giá mới thay thế đánh giá cũ của cùng tác vụ.
    pub fn record(&mut self, id: TaskId, review: ClinicianReview) -> Option<ClinicianReview> {
        self.reviews.insert(id, review)
    }

    pub fn get(&self, id: TaskId) -> Option<&ClinicianReview> {
        self.reviews.get(&id)
    }

    pub fn remove(&mut self, id: TaskId) -> Option<ClinicianReview> {
        self.reviews.remove(&id)
    }
}
