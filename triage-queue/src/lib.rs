//! Hàng đợi triage trong bộ nhớ: nhận hồ sơ, trả mã tác vụ ngay, một worker tokio
//! chạy pipeline và ghi kết quả một lần; client poll theo mã tác vụ.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use triage_core::{
    ClinicianReview, PatientRecord, ReviewedRecommendation, TaskId, TaskSnapshot, TaskState,
};
use triage_rules::TriagePipeline;

mod review;
mod store;

use review::ReviewStore;
use store::{Outcome, TaskStore};

/// Lỗi của hàng đợi triage.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QueueError {
    #[error("Không tìm thấy tác vụ {0}")]
    UnknownTask(TaskId),
    #[error("Tác vụ {id} không thể chuyển từ {from} sang {to}")]
    IllegalTransition {
        id: TaskId,
        from: TaskState,
        to: TaskState,
    },
    #[error("Tác vụ {id} chưa hoàn tất thành công (trạng thái {state})")]
    NotSucceeded { id: TaskId, state: TaskState },
    #[error("Tác vụ {id} chưa kết thúc (trạng thái {state})")]
    StillRunning { id: TaskId, state: TaskState },
    #[error("Hàng đợi triage đã đóng")]
    Closed,
}

struct Job {
    id: TaskId,
    record: PatientRecord,
}

/// Hàng đợi enqueue-and-poll với một worker duy nhất.
pub struct TriageQueue {
    jobs: mpsc::Sender<Job>,
    tasks: Arc<RwLock<TaskStore>>,
    reviews: RwLock<ReviewStore>,
    worker: JoinHandle<()>,
}

impl TriageQueue {
    /// Khởi động worker. Phải gọi bên trong tokio runtime.
    pub fn start(pipeline: Arc<TriagePipeline>, capacity: usize) -> Self {
        let (jobs, receiver) = mpsc::channel(capacity.max(1));
        let tasks = Arc::new(RwLock::new(TaskStore::default()));
        let worker = tokio::spawn(run_worker(pipeline, Arc::clone(&tasks), receiver));
        tracing::info!(capacity, "triage queue started");
        Self {
            jobs,
            tasks,
            reviews: RwLock::new(ReviewStore::default()),
            worker,
        }
    }

    /// Ghi nhận hồ sơ và trả mã tác vụ; không chờ pipeline chạy xong.
    pub async fn submit(&self, record: PatientRecord) -> Result<TaskId, QueueError> {
        let id = TaskId::new();
        self.tasks.write().await.insert_submitted(id);

        let Ok(permit) = self.jobs.reserve().await else {
            self.tasks.write().await.finish(
                id,
                Outcome::Failed {
                    error: QueueError::Closed.to_string(),
                    processing_ms: None,
                },
            )?;
            tracing::warn!(task = %id, "queue closed, task rejected");
            return Err(QueueError::Closed);
        };

        // Giữ khóa đến khi gửi xong để worker luôn thấy trạng thái Queued.
        let mut tasks = self.tasks.write().await;
        tasks.transition(id, TaskState::Queued)?;
        permit.send(Job { id, record });
        drop(tasks);

        tracing::debug!(task = %id, "task queued");
        Ok(id)
    }

    pub async fn poll(&self, id: TaskId) -> Result<TaskSnapshot, QueueError> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Lưu đánh giá của bác sĩ cho một tác vụ đã thành công.
    pub async fn submit_review(
        &self,
        id: TaskId,
        review: ClinicianReview,
    ) -> Result<(), QueueError> {
        {
            let tasks = self.tasks.read().await;
            let task = tasks.get(id)?;
            if task.state != TaskState::Succeeded {
                return Err(QueueError::NotSucceeded {
                    id,
                    state: task.state,
                });
            }
        }

        tracing::info!(
            task = %id,
            approved = review.approved,
            override_recommendation = review.override_recommendation,
            "clinician review recorded"
        );
        self.reviews.write().await.record(id, review);
        Ok(())
    }

    /// Khuyến nghị gốc (không đổi) cùng đánh giá mới nhất và mức khẩn cấp áp dụng.
    pub async fn reviewed(&self, id: TaskId) -> Result<ReviewedRecommendation, QueueError> {
        let original = {
            let tasks = self.tasks.read().await;
            let task = tasks.get(id)?;
            match (&task.state, &task.result) {
                (TaskState::Succeeded, Some(recommendation)) => recommendation.clone(),
                _ => {
                    return Err(QueueError::NotSucceeded {
                        id,
                        state: task.state,
                    })
                }
            }
        };
        let review = self.reviews.read().await.get(id).cloned();
        Ok(ReviewedRecommendation::new(id, original, review))
    }

    /// Xóa một tác vụ đã kết thúc cùng đánh giá của nó.
    pub async fn forget(&self, id: TaskId) -> Result<TaskSnapshot, QueueError> {
        let mut tasks = self.tasks.write().await;
        let snapshot = tasks.remove_finished(id)?;
        self.reviews.write().await.remove(id);
        drop(tasks);
        tracing::debug!(task = %id, "task forgotten");
        Ok(snapshot)
    }

    /// Xóa các tác vụ kết thúc trước `cutoff`; trả về số tác vụ đã xóa.
    pub async fn purge_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut tasks = self.tasks.write().await;
        let expired = tasks.purge_finished_before(cutoff);
        let mut reviews = self.reviews.write().await;
        for id in &expired {
            reviews.remove(*id);
        }
        if !expired.is_empty() {
            tracing::info!(purged = expired.len(), %cutoff, "purged finished tasks");
        }
        expired.len()
    }

    /// Đóng hàng đợi và chờ worker xử lý nốt các tác vụ đã nhận.
    pub async fn shutdown(self) {
        let Self { jobs, worker, .. } = self;
        drop(jobs);
        if let Err(err) = worker.await {
            tracing::warn!(error = %err, "triage worker ended abnormally");
        }
    }
}

async fn run_worker(
    pipeline: Arc<TriagePipeline>,
    tasks: Arc<RwLock<TaskStore>>,
    mut jobs: mpsc::Receiver<Job>,
) {
    while let Some(Job { id, record }) = jobs.recv().await {
        if let Err(err) = tasks.write().await.transition(id, TaskState::Processing) {
            tracing::warn!(task = %id, error = %err, "skipping task");
            continue;
        }

        let started = Instant::now();
        let runner = Arc::clone(&pipeline);
        let result = tokio::task::spawn_blocking(move || runner.run(&record)).await;
        let processing_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = match result {
            Ok(Ok(recommendation)) => {
                tracing::info!(
                    task = %id,
                    urgency = ?recommendation.urgency_level,
                    processing_ms,
                    "task succeeded"
                );
                Outcome::Succeeded {
                    recommendation,
                    processing_ms,
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(task = %id, error = %err, "task failed");
                Outcome::Failed {
                    error: err.to_string(),
                    processing_ms: Some(processing_ms),
                }
            }
            Err(err) => {
                tracing::warn!(task = %id, error = %err, "pipeline panicked");
                Outcome::Failed {
                    error: format!("Pipeline dừng bất thường: {err}"),
                    processing_ms: Some(processing_ms),
                }
            }
        };

        if let Err(err) = tasks.write().await.finish(id, outcome) {
            tracing::warn!(task = %id, error = %err, "could not record task outcome");
        }
    }
    tracing::debug!("triage worker stopped");
}
