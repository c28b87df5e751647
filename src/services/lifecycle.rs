// src/services/lifecycle.rs

use chrono::{DateTime, Utc};

use crate::{
    error::ExamError,
    models::exam::{ExamStatus, NewExam, SimulatedExam, StatusUpdate},
    repository::ExamStore,
};

/// Sole writer of simulated exams.
///
/// Exam content is fixed once stored; only `status` (and the timestamps that
/// go with it) ever changes afterwards.
pub struct ExamLifecycle<'a> {
    store: &'a dyn ExamStore,
}

impl<'a> ExamLifecycle<'a> {
    pub fn new(store: &'a dyn ExamStore) -> Self {
        Self { store }
    }

    /// Persists an assembled exam, assigning its id and creation time.
    pub async fn create(&self, exam: NewExam) -> Result<SimulatedExam, ExamError> {
        let stored = self.store.insert(exam).await?;
        tracing::info!(
            exam_id = stored.id,
            owner_id = stored.owner_id,
            question_count = stored.question_count,
            "Simulated exam created"
        );
        Ok(stored)
    }

    /// The owner's exams, newest first.
    pub async fn list_exams(&self, owner_id: i64) -> Result<Vec<SimulatedExam>, ExamError> {
        let exams = self.store.list_by_owner(owner_id).await?;
        let now = Utc::now();

        let mut settled = Vec::with_capacity(exams.len());
        for exam in exams {
            settled.push(self.settle_expired(exam, now).await?);
        }
        Ok(settled)
    }

    /// Fetches one exam. Exams owned by someone else are reported as missing.
    pub async fn get_exam(&self, id: i64, owner_id: i64) -> Result<SimulatedExam, ExamError> {
        let exam = self.load_owned(id, owner_id).await?;
        self.settle_expired(exam, Utc::now()).await
    }

    pub async fn count_exams(&self, owner_id: i64) -> Result<i64, ExamError> {
        self.store.count_by_owner(owner_id).await
    }

    /// Moves an exam to `next`, rejecting anything the status machine forbids.
    pub async fn transition(
        &self,
        id: i64,
        owner_id: i64,
        next: ExamStatus,
    ) -> Result<SimulatedExam, ExamError> {
        let exam = self.load_owned(id, owner_id).await?;
        let before = exam.status;
        let exam = self.settle_expired(exam, Utc::now()).await?;
        if exam.status != before && exam.status == next {
            // The time limit already finished it; the request is satisfied.
            return Ok(exam);
        }
        self.apply(exam, next, Utc::now()).await
    }

    async fn load_owned(&self, id: i64, owner_id: i64) -> Result<SimulatedExam, ExamError> {
        match self.store.find(id).await? {
            Some(exam) if exam.owner_id == owner_id => Ok(exam),
            _ => Err(ExamError::NotFound(id)),
        }
    }

    /// Completes an in-progress exam whose time limit has run out.
    async fn settle_expired(
        &self,
        exam: SimulatedExam,
        now: DateTime<Utc>,
    ) -> Result<SimulatedExam, ExamError> {
        if !exam.is_overdue(now) {
            return Ok(exam);
        }

        tracing::info!(exam_id = exam.id, "Time limit elapsed, completing exam");
        match self.apply(exam.clone(), ExamStatus::Completed, now).await {
            Ok(updated) => Ok(updated),
            // Someone else moved it first; report what is stored now.
            Err(ExamError::IllegalTransition { .. }) => self
                .store
                .find(exam.id)
                .await?
                .ok_or(ExamError::NotFound(exam.id)),
            Err(e) => Err(e),
        }
    }

    async fn apply(
        &self,
        mut exam: SimulatedExam,
        next: ExamStatus,
        at: DateTime<Utc>,
    ) -> Result<SimulatedExam, ExamError> {
        let current = exam.status;
        if !current.can_transition_to(next) {
            tracing::warn!(exam_id = exam.id, %current, %next, "Rejected exam status transition");
            return Err(ExamError::IllegalTransition {
                from: current,
                to: next,
            });
        }

        let update = StatusUpdate::new(current, next, at);
        if !self.store.update_status(exam.id, update).await? {
            // The stored status changed between the read and the write.
            return Err(ExamError::IllegalTransition {
                from: current,
                to: next,
            });
        }

        update.apply(&mut exam);
        tracing::info!(exam_id = exam.id, from = %current, to = %next, "Exam status changed");
        Ok(exam)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::question::{FilterSpec, QuestionSnapshot},
        repository::{ExamStore, MemoryStore},
    };
    use chrono::Duration;

    fn snapshot(id: i64) -> QuestionSnapshot {
        QuestionSnapshot {
            id,
            text: format!("Questão {}", id),
            alternatives: vec!["Certo".to_string(), "Errado".to_string()],
            exam_board: "CESPE".to_string(),
            subject: "Direito Penal".to_string(),
            difficulty: "easy".to_string(),
            year: 2022,
            created_at: Utc::now(),
        }
    }

    fn new_exam(owner_id: i64, time_limit: i32) -> NewExam {
        NewExam::pending(
            owner_id,
            &FilterSpec::default(),
            time_limit,
            vec![snapshot(1), snapshot(2)],
        )
    }

    #[tokio::test]
    async fn create_assigns_id_and_keeps_pending() {
        let store = MemoryStore::new();
        let lifecycle = ExamLifecycle::new(&store);

        let exam = lifecycle.create(new_exam(7, 60)).await.unwrap();
        assert_eq!(exam.id, 1);
        assert_eq!(exam.status, ExamStatus::Pending);
        assert_eq!(exam.question_count, 2);
        assert_eq!(exam.questions.len(), 2);
    }

    #[tokio::test]
    async fn list_is_owner_scoped_newest_first() {
        let store = MemoryStore::new();
        let lifecycle = ExamLifecycle::new(&store);

        let first = lifecycle.create(new_exam(1, 60)).await.unwrap();
        lifecycle.create(new_exam(2, 60)).await.unwrap();
        let third = lifecycle.create(new_exam(1, 60)).await.unwrap();

        let exams = lifecycle.list_exams(1).await.unwrap();
        let ids: Vec<i64> = exams.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
        assert!(exams.iter().all(|e| e.owner_id == 1));
        assert!(exams.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(lifecycle.count_exams(1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn full_forward_path_succeeds() {
        let store = MemoryStore::new();
        let lifecycle = ExamLifecycle::new(&store);
        let exam = lifecycle.create(new_exam(1, 60)).await.unwrap();

        let started = lifecycle
            .transition(exam.id, 1, ExamStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(started.status, ExamStatus::InProgress);
        assert!(started.started_at.is_some());

        let done = lifecycle
            .transition(exam.id, 1, ExamStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, ExamStatus::Completed);
        assert!(done.finished_at.is_some());
        assert_eq!(done.started_at, started.started_at);
    }

    #[tokio::test]
    async fn completed_to_pending_is_illegal_and_state_is_unchanged() {
        let store = MemoryStore::new();
        let lifecycle = ExamLifecycle::new(&store);
        let exam = lifecycle.create(new_exam(1, 60)).await.unwrap();
        lifecycle.transition(exam.id, 1, ExamStatus::InProgress).await.unwrap();
        lifecycle.transition(exam.id, 1, ExamStatus::Completed).await.unwrap();

        let err = lifecycle
            .transition(exam.id, 1, ExamStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExamError::IllegalTransition {
                from: ExamStatus::Completed,
                to: ExamStatus::Pending
            }
        ));

        let stored = lifecycle.get_exam(exam.id, 1).await.unwrap();
        assert_eq!(stored.status, ExamStatus::Completed);
    }

    #[tokio::test]
    async fn pending_cannot_skip_to_completed() {
        let store = MemoryStore::new();
        let lifecycle = ExamLifecycle::new(&store);
        let exam = lifecycle.create(new_exam(1, 60)).await.unwrap();

        let err = lifecycle
            .transition(exam.id, 1, ExamStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn cancellation_from_pending() {
        let store = MemoryStore::new();
        let lifecycle = ExamLifecycle::new(&store);
        let exam = lifecycle.create(new_exam(1, 60)).await.unwrap();

        let cancelled = lifecycle
            .transition(exam.id, 1, ExamStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, ExamStatus::Cancelled);
        assert!(cancelled.finished_at.is_some());
    }

    #[tokio::test]
    async fn other_owners_cannot_see_or_move_an_exam() {
        let store = MemoryStore::new();
        let lifecycle = ExamLifecycle::new(&store);
        let exam = lifecycle.create(new_exam(1, 60)).await.unwrap();

        assert!(matches!(
            lifecycle.get_exam(exam.id, 2).await,
            Err(ExamError::NotFound(_))
        ));
        assert!(matches!(
            lifecycle.transition(exam.id, 2, ExamStatus::InProgress).await,
            Err(ExamError::NotFound(_))
        ));
        assert!(matches!(
            lifecycle.get_exam(999, 1).await,
            Err(ExamError::NotFound(999))
        ));
    }

    #[tokio::test]
    async fn overdue_exam_is_completed_on_read() {
        let store = MemoryStore::new();
        let lifecycle = ExamLifecycle::new(&store);
        let exam = lifecycle.create(new_exam(1, 30)).await.unwrap();

        let long_ago = Utc::now() - Duration::minutes(45);
        let update = StatusUpdate::new(ExamStatus::Pending, ExamStatus::InProgress, long_ago);
        assert!(store.update_status(exam.id, update).await.unwrap());

        let read = lifecycle.get_exam(exam.id, 1).await.unwrap();
        assert_eq!(read.status, ExamStatus::Completed);
        assert!(read.finished_at.is_some());

        let listed = lifecycle.list_exams(1).await.unwrap();
        assert_eq!(listed[0].status, ExamStatus::Completed);
    }

    #[tokio::test]
    async fn finishing_after_the_deadline_succeeds() {
        let store = MemoryStore::new();
        let lifecycle = ExamLifecycle::new(&store);
        let exam = lifecycle.create(new_exam(1, 30)).await.unwrap();

        let started = Utc::now() - Duration::minutes(31);
        let update = StatusUpdate::new(ExamStatus::Pending, ExamStatus::InProgress, started);
        assert!(store.update_status(exam.id, update).await.unwrap());

        let done = lifecycle
            .transition(exam.id, 1, ExamStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, ExamStatus::Completed);
        assert!(done.finished_at.is_some());

        // Once settled, a repeated completion is an ordinary illegal move.
        let err = lifecycle
            .transition(exam.id, 1, ExamStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn cancelling_after_the_deadline_is_rejected() {
        let store = MemoryStore::new();
        let lifecycle = ExamLifecycle::new(&store);
        let exam = lifecycle.create(new_exam(1, 30)).await.unwrap();

        let started = Utc::now() - Duration::minutes(31);
        let update = StatusUpdate::new(ExamStatus::Pending, ExamStatus::InProgress, started);
        assert!(store.update_status(exam.id, update).await.unwrap());

        let err = lifecycle
            .transition(exam.id, 1, ExamStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExamError::IllegalTransition {
                from: ExamStatus::Completed,
                to: ExamStatus::Cancelled
            }
        ));
    }

    #[tokio::test]
    async fn stale_status_write_is_rejected() {
        let store = MemoryStore::new();
        let lifecycle = ExamLifecycle::new(&store);
        let exam = lifecycle.create(new_exam(1, 60)).await.unwrap();

        // A second writer already started the exam.
        let update = StatusUpdate::new(ExamStatus::Pending, ExamStatus::InProgress, Utc::now());
        assert!(store.update_status(exam.id, update).await.unwrap());
        assert!(!store.update_status(exam.id, update).await.unwrap());
    }
}
