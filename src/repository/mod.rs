// src/repository/mod.rs

//! Store seams used by the services.
//!
//! `PgStore` backs the server; `MemoryStore` keeps everything in process and
//! is what the tests run against.

use async_trait::async_trait;

use crate::{
    error::ExamError,
    models::{
        exam::{NewExam, SimulatedExam, StatusUpdate},
        question::{FilterSpec, NewQuestion, Question},
        user::{Role, User},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Read access to the question bank, plus the administrative writes.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// All questions matching `filter`, in storage order. No sorting, capping
    /// or shuffling happens here.
    async fn find_questions(&self, filter: &FilterSpec) -> Result<Vec<Question>, ExamError>;

    /// Every question, newest first.
    async fn list_recent(&self) -> Result<Vec<Question>, ExamError>;

    async fn count(&self) -> Result<i64, ExamError>;

    async fn insert(&self, question: NewQuestion) -> Result<Question, ExamError>;

    /// Returns `false` when no row had that id.
    async fn delete(&self, id: i64) -> Result<bool, ExamError>;
}

#[async_trait]
pub trait ExamStore: Send + Sync {
    /// Single atomic insert; assigns `id` and `created_at`.
    async fn insert(&self, exam: NewExam) -> Result<SimulatedExam, ExamError>;

    /// Exams owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<SimulatedExam>, ExamError>;

    async fn find(&self, id: i64) -> Result<Option<SimulatedExam>, ExamError>;

    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, ExamError>;

    /// Applies `update` only if the exam is still in `update.expected`.
    /// Returns `false` when nothing was written.
    async fn update_status(&self, id: i64, update: StatusUpdate) -> Result<bool, ExamError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Every account, newest first.
    async fn list_users(&self) -> Result<Vec<User>, ExamError>;

    /// Returns `false` when no user had that id.
    async fn update_role(&self, id: i64, role: Role) -> Result<bool, ExamError>;
}
